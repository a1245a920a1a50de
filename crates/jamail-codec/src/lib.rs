//! # jamail-codec
//!
//! Text codecs used by jamail's header cache.
//!
//! ## Features
//!
//! - **Charsets**: streaming conversion between bytes in a named charset
//!   and Unicode text ([`charset`])
//! - **JSON**: a tagged value tree with an insertion-ordered object type,
//!   a character-stream parser and a tab-indented serializer ([`json`])
//!
//! ## Quick Start
//!
//! ```
//! use jamail_codec::{charset, json::Value};
//!
//! let mut doc = Value::object();
//! doc.insert("subject", "Ω").unwrap();
//!
//! let bytes = charset::encode(&doc.to_string(), "UTF-8").unwrap();
//! let text = charset::decode(&bytes, "UTF-8").unwrap();
//! let back: Value = text.parse().unwrap();
//! assert_eq!(back, doc);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod charset;
pub mod json;

pub use charset::ConvError;
