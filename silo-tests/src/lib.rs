//! Test support for the Silo workspace: an in-memory backend that speaks
//! the generic dialect's SQL through the abstract driver capability, so the
//! whole stack — search compiler, execution engine, pool, codec — can be
//! exercised end to end without a server.

pub mod memory;
