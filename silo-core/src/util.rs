/// Truncate a query for inclusion in log lines and error messages.
pub fn truncate_long(query: &str) -> String {
    const LIMIT: usize = 497;
    let mut end = query.len().min(LIMIT);
    while !query.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = query[..end].trim_end().to_owned();
    if query.len() > LIMIT {
        out.push_str("...");
    }
    out
}

/// Invoke `f` for every value, writing `separator` between the fragments
/// each invocation produced.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}
