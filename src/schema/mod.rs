//! Record schema
//!
//! Wire types for incoming sensor records and the fixed, ordered feature table
//! that maps them onto classifier columns.

mod fields;
mod record;

pub use fields::*;
pub use record::*;
