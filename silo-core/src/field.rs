use rust_decimal::Decimal;
use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
    ops::{BitOr, BitOrAssign},
};

/// Logical datatype of a field, independent of how a backend stores it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    #[default]
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Decimal,
    String,
    Binary,
    DateTime,
    TimeSpan,
    Enum,
    User,
}

/// Field flag bitset (ID, auto increment, unique, index).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldFlags(u8);

impl FieldFlags {
    pub const NONE: FieldFlags = FieldFlags(0);
    pub const ID: FieldFlags = FieldFlags(1);
    pub const AUTO_INCREMENT: FieldFlags = FieldFlags(2);
    pub const UNIQUE: FieldFlags = FieldFlags(4);
    pub const INDEX: FieldFlags = FieldFlags(8);

    pub fn contains(&self, other: FieldFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FieldFlags {
    type Output = FieldFlags;
    fn bitor(self, rhs: FieldFlags) -> FieldFlags {
        FieldFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldFlags {
    fn bitor_assign(&mut self, rhs: FieldFlags) {
        self.0 |= rhs.0;
    }
}

impl Display for FieldFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut len = 0;
        for (flag, name) in [
            (FieldFlags::ID, "ID"),
            (FieldFlags::AUTO_INCREMENT, "AutoIncrement"),
            (FieldFlags::UNIQUE, "Unique"),
            (FieldFlags::INDEX, "Index"),
        ] {
            if self.contains(flag) {
                if len > 0 {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                len += 1;
            }
        }
        if len == 0 {
            f.write_str("None")?;
        }
        Ok(())
    }
}

/// Timezone discipline of a DateTime field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeKind {
    #[default]
    Unspecified,
    Utc,
    Local,
}

/// Storage representation of a DateTime or TimeSpan field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeType {
    /// Pass the native temporal value through, subject to backend precision.
    #[default]
    Native,
    /// Raw 100 ns tick count stored as a 64 bit integer.
    BigIntTicks,
    /// Integer formatted `yyyyMMddHHmmssfff`, parsed back the same way.
    BigIntHumanReadable,
    /// Ticks divided by ticks-per-second, stored as a fixed point value.
    DecimalSeconds,
    /// Ticks divided by ticks-per-second, stored as a floating point value.
    DoubleSeconds,
    /// Seconds since 1970-01-01T00:00:00Z, stored as a floating point value.
    DoubleEpoch,
}

/// Declared character encoding of a string field at the database.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    Ascii,
    #[default]
    Utf8,
    Utf16,
    Utf32,
}

/// Per-column metadata: identity, datatype, flags and storage details.
///
/// `maximum_length` is semantically overloaded: for string/binary fields it
/// is the maximum byte length (0 = unbounded); for decimal fields it packs
/// `precision.scale` into one value, the integer part being the precision
/// and the fractional part times 100 the scale (e.g. `28.08` is precision
/// 28, scale 8).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Position inside the layout, stable once the layout is built.
    pub index: usize,
    /// Logical field name.
    pub name: Cow<'static, str>,
    /// Physical column name, when it differs from the logical one.
    pub name_at_database: Cow<'static, str>,
    /// Logical datatype.
    pub data_type: DataType,
    /// Datatype actually stored by the backend (dialect rewrite hook).
    pub type_at_database: DataType,
    pub flags: FieldFlags,
    pub maximum_length: f32,
    pub date_time_kind: DateTimeKind,
    pub date_time_type: DateTimeType,
    pub string_encoding: StringEncoding,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<Cow<'static, str>>, data_type: DataType) -> Self {
        let name = name.into();
        FieldDescriptor {
            index: 0,
            name_at_database: name.clone(),
            name,
            data_type,
            type_at_database: data_type,
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_maximum_length(mut self, maximum_length: f32) -> Self {
        self.maximum_length = maximum_length;
        self
    }

    pub fn with_name_at_database(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name_at_database = name.into();
        self
    }

    pub fn with_type_at_database(mut self, data_type: DataType) -> Self {
        self.type_at_database = data_type;
        self
    }

    pub fn with_date_time(mut self, kind: DateTimeKind, date_time_type: DateTimeType) -> Self {
        self.date_time_kind = kind;
        self.date_time_type = date_time_type;
        self
    }

    pub fn with_string_encoding(mut self, encoding: StringEncoding) -> Self {
        self.string_encoding = encoding;
        self
    }

    pub fn is_id(&self) -> bool {
        self.flags.contains(FieldFlags::ID)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.flags.contains(FieldFlags::AUTO_INCREMENT)
    }

    /// Decimal precision encoded in `maximum_length` (0 = dialect default).
    pub fn decimal_precision(&self) -> u8 {
        self.maximum_length.trunc() as u8
    }

    /// Decimal scale encoded in `maximum_length`.
    pub fn decimal_scale(&self) -> u8 {
        ((self.maximum_length - self.maximum_length.trunc()) * 100.0).round() as u8
    }

    /// Largest absolute value the declared precision/scale can hold,
    /// `10^(precision - scale)`. Values with `|v| >= maximum` are rejected
    /// by the codec.
    pub fn decimal_maximum(&self) -> Option<Decimal> {
        let precision = self.decimal_precision();
        if precision == 0 {
            return None;
        }
        let digits = precision.saturating_sub(self.decimal_scale()) as u32;
        Some(Decimal::from(10i64.pow(digits.min(18))))
    }

    /// Structural equality used by layout compatibility checks: two fields
    /// match when name, logical datatype and flags are equal.
    pub fn matches(&self, other: &FieldDescriptor) -> bool {
        self.name == other.name && self.data_type == other.data_type && self.flags == other.flags
    }
}

impl Display for FieldDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:?}, {}]", self.name, self.data_type, self.flags)
    }
}
