//! IMAP response parser.
//!
//! The parser is sans-I/O and works on byte slices. It is split in three
//! layers:
//!
//! - **Cursor**: lexical primitives (atoms, numbers, quoted strings,
//!   literals, `NIL`)
//! - **Grammar**: address lists, envelopes, body structures and the FETCH
//!   attribute lists
//! - **Response**: classification of a response by its first tokens
//!
//! A literal whose announced length runs past the end of the input makes
//! the parser answer [`Parsed::NeedMore`] rather than fail.
//!
//! # Example
//!
//! ```
//! use jamail_imap::parser::{Parsed, Response, ResponseParser, UntaggedResponse};
//!
//! let line = b"* 4 FETCH (BODY[TEXT] {5}\r\nHello)";
//! let Response::Untagged(UntaggedResponse::Fetch { seq, rest }) =
//!     ResponseParser::parse(line).unwrap()
//! else {
//!     panic!("expected FETCH");
//! };
//! assert_eq!(seq, 4);
//! match ResponseParser::parse_fetch_body(rest).unwrap() {
//!     Parsed::Complete(Some(body)) => assert_eq!(&*body, b"Hello"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod cursor;
pub mod grammar;
mod response;

pub use cursor::{Cursor, LexError, LexResult};
pub use response::{Parsed, Response, ResponseParser, UntaggedResponse};
