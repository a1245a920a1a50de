//! A small JSON value model with an order-preserving object type.
//!
//! The text form is the one jamail writes to its header cache: objects and
//! arrays are spread over lines and indented with tabs, and object members
//! keep the order they were inserted in.
//!
//! ```
//! use jamail_codec::json::Value;
//!
//! let value: Value = r#"{"a": 1, "b": [true, null, "x"]}"#.parse().unwrap();
//! assert_eq!(value.get("a").unwrap().to_int().unwrap(), 1);
//! assert_eq!(value.get("b").unwrap().array().unwrap().len(), 3);
//! ```

mod parser;
mod serialize;
mod value;

use std::fmt;

pub use parser::{Parser, from_chars};
pub use value::{Map, Value};

/// Result type alias for JSON operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The variant a [`Value`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Integer number.
    Int,
    /// Floating point number.
    Float,
    /// String.
    String,
    /// Array.
    Array,
    /// Object.
    Object,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// JSON error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Syntax error in the input text.
    #[error("parse error at {position}: {message}")]
    Parse {
        /// Offset of the offending character, in characters.
        position: usize,
        /// Description of the error.
        message: String,
    },

    /// Accessor used against the wrong variant.
    #[error("expected {expected}, got {got}")]
    Type {
        /// Variant the accessor needs.
        expected: Kind,
        /// Variant the value holds.
        got: Kind,
    },

    /// Number does not fit the requested width.
    #[error("value out of range for {target}")]
    Range {
        /// Name of the target type.
        target: &'static str,
    },
}
