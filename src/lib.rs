//! # bytemold
//!
//! A library for packing and unpacking binary structures using declarative
//! schemas.
//!
//! Describe a structure as an ordered list of fields — fixed primitives,
//! computed values, padding, conditionals, discriminated unions, repetition,
//! nested structures — then run the same schema in both directions over any
//! seekable stream. Field parameters can be deferred expressions evaluated
//! against the values already processed, so length-prefixed and tagged
//! layouts need no hand-written plumbing.
//!
//! ## Example
//!
//! ```
//! use bytemold::expr::Expr;
//! use bytemold::field::Field;
//! use bytemold::schema::Schema;
//! use bytemold::value::{TypeTag, Value};
//!
//! let schema = Schema::build(vec![
//!     Field::built("len", TypeTag::Uint, "B", |ctx| {
//!         Ok(Value::U64(ctx.get_bytes("name")?.len() as u64))
//!     }),
//!     Field::fixed(
//!         "name",
//!         TypeTag::Bytes,
//!         Expr::defer(|ctx| Ok(bytemold::format::Format::Size(
//!             ctx.get_u64("len")? as usize,
//!         ))),
//!     ),
//! ])
//! .unwrap();
//!
//! let record = schema.unpack(&[0x02, b'h', b'i']).unwrap();
//! assert_eq!(record.get_bytes("name"), Some(&b"hi"[..]));
//!
//! let bytes = schema.pack(&record).unwrap();
//! assert_eq!(bytes, vec![0x02, b'h', b'i']);
//! ```

pub mod codec;
pub mod context;
pub mod errors;
pub mod expr;
pub mod field;
pub mod format;
pub mod record;
pub mod schema;
pub mod stream;
pub mod value;
