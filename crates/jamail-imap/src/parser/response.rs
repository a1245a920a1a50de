//! Response classification.

use std::borrow::Cow;

use super::cursor::{Cursor, LexError, LexResult};
use super::grammar::{parse_body_reply, parse_fetch_reply, to_text};
use crate::types::{Envelope, Status};
use crate::Result;

/// Outcome of parsing a response that may end inside a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T> {
    /// The response was complete.
    Complete(T),
    /// A literal runs past the end of the input.
    NeedMore,
}

impl<T> Parsed<T> {
    fn from_lex(result: LexResult<T>) -> Result<Self> {
        match result {
            Ok(value) => Ok(Self::Complete(value)),
            Err(LexError::NeedMore) => Ok(Self::NeedMore),
            Err(err) => Err(err.into()),
        }
    }
}

/// A server response, classified by its first tokens.
#[derive(Debug, Clone)]
pub enum Response<'a> {
    /// `* ...`
    Untagged(UntaggedResponse<'a>),
    /// `<tag> <status> <text>`
    Tagged {
        /// Numeric tag of the completed command.
        tag: u32,
        /// Completion status.
        status: Status,
        /// Human-readable text.
        text: String,
    },
}

/// Untagged response kinds the session distinguishes.
#[derive(Debug, Clone)]
pub enum UntaggedResponse<'a> {
    /// `* OK ...`, `* BYE ...` and the other status responses.
    Status {
        /// Response status.
        status: Status,
        /// Human-readable text.
        text: String,
    },
    /// `* <seq> FETCH (...)`; the cursor sits on the attribute list.
    Fetch {
        /// Message sequence number.
        seq: u32,
        /// Cursor on the attribute list.
        rest: Cursor<'a>,
    },
    /// Anything else; the cursor sits after the first data token.
    Other {
        /// Cursor on the rest of the response.
        rest: Cursor<'a>,
    },
}

/// Parser for server responses.
///
/// Input is one candidate response without its trailing CRLF.
pub struct ResponseParser;

impl ResponseParser {
    /// Classifies a response.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the response starts with neither `*` nor a
    /// numeric tag, or a tagged response lacks a known status.
    pub fn parse(input: &[u8]) -> Result<Response<'_>> {
        let mut cursor = Cursor::new(input);

        if cursor.skip(b'*') {
            if cursor.check_digit() {
                let seq = cursor.parse_number()?;
                let name = cursor.parse_astring()?;
                let untagged = if name.eq_ignore_ascii_case(b"FETCH") {
                    UntaggedResponse::Fetch { seq, rest: cursor }
                } else {
                    UntaggedResponse::Other { rest: cursor }
                };
                return Ok(Response::Untagged(untagged));
            }

            let word = cursor.parse_astring()?;
            let untagged = match Status::parse(word) {
                Some(status) => UntaggedResponse::Status {
                    status,
                    text: rest_text(&mut cursor),
                },
                None => UntaggedResponse::Other { rest: cursor },
            };
            return Ok(Response::Untagged(untagged));
        }

        if !cursor.check_digit() {
            return Err(cursor.error("expected '*' or tag").into());
        }
        let tag = cursor.parse_number()?;
        let word = cursor.parse_astring()?;
        let status = Status::parse(word).ok_or_else(|| cursor.error("expected status"))?;
        Ok(Response::Tagged {
            tag,
            status,
            text: rest_text(&mut cursor),
        })
    }

    /// Parses the attribute list of an untagged FETCH reply into an
    /// envelope stamped with `seq`.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed input.
    pub fn parse_fetch_envelope(seq: u32, mut rest: Cursor<'_>) -> Result<Parsed<Envelope>> {
        Parsed::from_lex(parse_fetch_reply(&mut rest).map(|envelope| Envelope {
            id: seq,
            ..envelope
        }))
    }

    /// Parses the attribute list of a `BODY[TEXT]` reply.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed input.
    pub fn parse_fetch_body(mut rest: Cursor<'_>) -> Result<Parsed<Option<Cow<'_, [u8]>>>> {
        Parsed::from_lex(parse_body_reply(&mut rest))
    }

    /// Steps over the rest of a response, framing any literal in it.
    ///
    /// # Errors
    ///
    /// Never fails for now; literal headers that do not parse are treated
    /// as text.
    pub fn skip(mut rest: Cursor<'_>) -> Result<Parsed<()>> {
        Parsed::from_lex(rest.skip_line())
    }
}

fn rest_text(cursor: &mut Cursor<'_>) -> String {
    cursor.skip_whitespace();
    to_text(cursor.remaining().trim_ascii_end())
}

impl From<LexError> for crate::Error {
    fn from(err: LexError) -> Self {
        match err {
            LexError::NeedMore => Self::Parse {
                position: 0,
                message: "incomplete response".to_string(),
            },
            LexError::Syntax { position, message } => Self::Parse { position, message },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::types::Address;
    use crate::Error;

    #[test]
    fn test_greeting() {
        let response = ResponseParser::parse(b"* OK IMAP4rev1 Service Ready").unwrap();
        match response {
            Response::Untagged(UntaggedResponse::Status { status, text }) => {
                assert_eq!(status, Status::Ok);
                assert_eq!(text, "IMAP4rev1 Service Ready");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bye() {
        let response = ResponseParser::parse(b"* BYE shutting down").unwrap();
        assert!(matches!(
            response,
            Response::Untagged(UntaggedResponse::Status { status: Status::Bye, .. })
        ));
    }

    #[test]
    fn test_tagged() {
        match ResponseParser::parse(b"2 NO [AUTHENTICATIONFAILED] bad").unwrap() {
            Response::Tagged { tag, status, text } => {
                assert_eq!(tag, 2);
                assert_eq!(status, Status::No);
                assert_eq!(text, "[AUTHENTICATIONFAILED] bad");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_tagged_unknown_status() {
        assert!(matches!(
            ResponseParser::parse(b"1 MAYBE"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_not_a_response() {
        assert!(matches!(
            ResponseParser::parse(b"A001 OK done"),
            Err(Error::Parse { .. })
        ));
        assert!(ResponseParser::parse(b"+ go ahead").is_err());
    }

    #[test]
    fn test_other_untagged() {
        for line in [&b"* 3 EXISTS"[..], b"* FLAGS (\\Seen)", b"* CAPABILITY IMAP4rev1"] {
            assert!(matches!(
                ResponseParser::parse(line).unwrap(),
                Response::Untagged(UntaggedResponse::Other { .. })
            ));
        }
    }

    #[test]
    fn test_fetch_envelope() {
        let line = br#"* 1 FETCH (ENVELOPE ("Wed, 1 Jan 2020" "Hi" (("Ann" NIL "ann" "e.com")) NIL NIL (("Bob" NIL "bob" "e.com")) NIL NIL "" "<m1@e.com>"))"#;
        let Response::Untagged(UntaggedResponse::Fetch { seq, rest }) =
            ResponseParser::parse(line).unwrap()
        else {
            panic!("expected FETCH");
        };
        assert_eq!(seq, 1);
        let Parsed::Complete(env) = ResponseParser::parse_fetch_envelope(seq, rest).unwrap()
        else {
            panic!("expected complete");
        };
        assert_eq!(env.id, 1);
        assert_eq!(env.subject, "Hi");
        assert_eq!(env.from, vec![Address::new("Ann", "ann@e.com")]);
        assert_eq!(env.to, vec![Address::new("Bob", "bob@e.com")]);
        assert_eq!(env.message_id, "<m1@e.com>");
    }

    #[test]
    fn test_fetch_needs_more() {
        let line = b"* 7 FETCH (BODY[TEXT] {10}\r\nHello";
        let Response::Untagged(UntaggedResponse::Fetch { rest, .. }) =
            ResponseParser::parse(line).unwrap()
        else {
            panic!("expected FETCH");
        };
        assert_eq!(ResponseParser::parse_fetch_body(rest).unwrap(), Parsed::NeedMore);
    }

    #[test]
    fn test_fetch_body() {
        let line = b"* 7 FETCH (BODY[TEXT] {5}\r\nHello)";
        let Response::Untagged(UntaggedResponse::Fetch { rest, .. }) =
            ResponseParser::parse(line).unwrap()
        else {
            panic!("expected FETCH");
        };
        let Parsed::Complete(Some(body)) = ResponseParser::parse_fetch_body(rest).unwrap() else {
            panic!("expected body");
        };
        assert_eq!(&*body, b"Hello");
    }

    #[test]
    fn test_parse_error_position_is_absolute() {
        let line = b"* 1 FETCH (FOO 1)";
        let Response::Untagged(UntaggedResponse::Fetch { seq, rest }) =
            ResponseParser::parse(line).unwrap()
        else {
            panic!("expected FETCH");
        };
        match ResponseParser::parse_fetch_envelope(seq, rest) {
            Err(Error::Parse { position, .. }) => assert_eq!(position, 14),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_skip() {
        let Response::Untagged(UntaggedResponse::Other { rest }) =
            ResponseParser::parse(b"* LIST () \"/\" {3}").unwrap()
        else {
            panic!("expected other");
        };
        assert_eq!(ResponseParser::skip(rest).unwrap(), Parsed::NeedMore);
    }
}
