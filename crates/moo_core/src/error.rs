//! Scripting-level error codes.

use strum::{EnumIter, EnumString, FromRepr, IntoStaticStr};
use thiserror::Error;

/// Error code carried by every scripting-level error.
///
/// Discriminants follow the LambdaMOO numbering (`E_NONE` = 0 through
/// `E_FLOAT` = 15), with the later extensions appended after them.
/// `Display` yields the human-readable message, `name()` the `E_*` literal.
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Error, FromRepr, IntoStaticStr, EnumString, EnumIter,
)]
pub enum ErrorCode {
    #[error("No error")]
    #[strum(serialize = "E_NONE")]
    None = 0,
    #[error("Type mismatch")]
    #[strum(serialize = "E_TYPE")]
    Type = 1,
    #[error("Division by zero")]
    #[strum(serialize = "E_DIV")]
    Div = 2,
    #[error("Permission denied")]
    #[strum(serialize = "E_PERM")]
    Perm = 3,
    #[error("Property not found")]
    #[strum(serialize = "E_PROPNF")]
    PropNotFound = 4,
    #[error("Verb not found")]
    #[strum(serialize = "E_VERBNF")]
    VerbNotFound = 5,
    #[error("Variable not found")]
    #[strum(serialize = "E_VARNF")]
    VarNotFound = 6,
    #[error("Invalid indirection")]
    #[strum(serialize = "E_INVIND")]
    InvalidIndirection = 7,
    #[error("Recursive move")]
    #[strum(serialize = "E_RECMOVE")]
    RecursiveMove = 8,
    #[error("Too many verb calls")]
    #[strum(serialize = "E_MAXREC")]
    MaxRecursion = 9,
    #[error("Range error")]
    #[strum(serialize = "E_RANGE")]
    Range = 10,
    #[error("Incorrect number of arguments")]
    #[strum(serialize = "E_ARGS")]
    Args = 11,
    #[error("Move refused by destination")]
    #[strum(serialize = "E_NACC")]
    NotAccepted = 12,
    #[error("Invalid argument")]
    #[strum(serialize = "E_INVARG")]
    InvalidArg = 13,
    #[error("Resource limit exceeded")]
    #[strum(serialize = "E_QUOTA")]
    Quota = 14,
    #[error("Floating-point arithmetic error")]
    #[strum(serialize = "E_FLOAT")]
    Float = 15,
    #[error("File system error")]
    #[strum(serialize = "E_FILE")]
    File = 16,
    #[error("Exec error")]
    #[strum(serialize = "E_EXEC")]
    Exec = 17,
    #[error("Interrupted")]
    #[strum(serialize = "E_INTRPT")]
    Interrupted = 18,
}

impl ErrorCode {
    /// The `E_*` literal name.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Numeric value, as `toint(E_DIV)` reports it.
    pub fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn names_round_trip_through_from_str() {
        for code in ErrorCode::iter() {
            assert_eq!(ErrorCode::from_str(code.name()).unwrap(), code);
        }
    }

    #[test]
    fn discriminants_are_dense() {
        for (i, code) in ErrorCode::iter().enumerate() {
            assert_eq!(code.code() as usize, i);
            assert_eq!(ErrorCode::from_repr(i as u8), Some(code));
        }
    }

    #[test]
    fn display_is_the_message() {
        assert_eq!(ErrorCode::Div.to_string(), "Division by zero");
        assert_eq!(ErrorCode::Div.name(), "E_DIV");
        assert_eq!(ErrorCode::MaxRecursion.name(), "E_MAXREC");
    }
}
