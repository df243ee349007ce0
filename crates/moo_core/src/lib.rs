//! Core types for the MOO execution core.
//!
//! This crate contains the value layer that everything else builds on:
//! - `Value` - the scripting language's runtime values
//! - `Obj` - reference to an object in the persistent store
//! - `ErrorCode` - the closed set of scripting-level error codes

pub mod error;
pub mod literal;
pub mod obj;
pub mod ops;
pub mod value;

pub use error::ErrorCode;
pub use obj::Obj;
pub use value::{Map, TypeCode, Value};
