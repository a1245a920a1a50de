//! Grammar productions for FETCH replies.
//!
//! Each production works on a [`Cursor`] and leaves it just past the
//! consumed text. A [`LexError::NeedMore`] from any primitive bubbles up
//! unchanged so the caller can retry the whole response later.

use std::borrow::Cow;

use tracing::debug;

use super::cursor::{Cursor, LexResult};
use crate::types::{Address, Envelope};

/// Converts server bytes to text.
///
/// Valid UTF-8 is kept as is; anything else degrades to ASCII with every
/// byte from 128 up replaced by `?`.
#[must_use]
pub fn to_text(bytes: &[u8]) -> String {
    jamail_codec::charset::decode(bytes, "UTF-8").unwrap_or_else(|_| {
        bytes
            .iter()
            .map(|&b| if b.is_ascii() { char::from(b) } else { '?' })
            .collect()
    })
}

fn parse_text(cursor: &mut Cursor<'_>) -> LexResult<String> {
    cursor.parse_string().map(|s| to_text(&s))
}

/// Parses `NIL` or a parenthesised list of addresses.
///
/// Each address is `(name adl mailbox host)`; the source route is read and
/// dropped, and the email becomes `mailbox@host`.
///
/// # Errors
///
/// Returns a syntax error for malformed input.
pub fn parse_address_list(cursor: &mut Cursor<'_>) -> LexResult<Vec<Address>> {
    let mut list = Vec::new();
    if !cursor.skip(b'(') {
        if cursor.parse_astring()? != b"NIL" {
            return Err(cursor.error("expected address list"));
        }
        return Ok(list);
    }

    while !cursor.skip(b')') {
        cursor.expect(b'(')?;
        let name = parse_text(cursor)?;
        let _route = cursor.parse_string()?;
        let mailbox = parse_text(cursor)?;
        let host = parse_text(cursor)?;
        cursor.expect(b')')?;
        list.push(Address {
            name,
            email: format!("{mailbox}@{host}"),
        });
    }
    Ok(list)
}

/// Parses a parenthesised envelope.
///
/// The result carries id 0; the caller fills in the sequence number.
///
/// # Errors
///
/// Returns a syntax error for malformed input.
pub fn parse_envelope(cursor: &mut Cursor<'_>) -> LexResult<Envelope> {
    cursor.expect(b'(')?;
    let date = parse_text(cursor)?;
    let subject = parse_text(cursor)?;
    let from = parse_address_list(cursor)?;
    let sender = parse_address_list(cursor)?;
    let reply_to = parse_address_list(cursor)?;
    let to = parse_address_list(cursor)?;
    let cc = parse_address_list(cursor)?;
    let bcc = parse_address_list(cursor)?;
    let parent_id = parse_text(cursor)?;
    let message_id = parse_text(cursor)?;
    cursor.expect(b')')?;

    Ok(Envelope {
        id: 0,
        date,
        subject,
        from,
        sender,
        reply_to,
        to,
        cc,
        bcc,
        parent_id,
        message_id,
    })
}

/// Validates and discards a body structure.
///
/// # Errors
///
/// Returns a syntax error for malformed input.
pub fn parse_body_struct(cursor: &mut Cursor<'_>) -> LexResult<()> {
    cursor.expect(b'(')?;

    if cursor.check(b'(') {
        // multipart: one or more parts, then the subtype
        while cursor.check(b'(') {
            parse_body_struct(cursor)?;
        }
        cursor.parse_string()?;
        return cursor.expect(b')');
    }

    let media_type = cursor.parse_string()?;
    let media_subtype = cursor.parse_string()?;

    if cursor.skip(b'(') {
        while !cursor.skip(b')') {
            cursor.parse_string()?;
            cursor.parse_string()?;
        }
    } else if cursor.parse_astring()? != b"NIL" {
        return Err(cursor.error("expected body parameter list"));
    }

    let _id = cursor.parse_string()?;
    let _description = cursor.parse_string()?;
    let _encoding = cursor.parse_string()?;
    let _size = cursor.parse_number()?;

    if media_type.eq_ignore_ascii_case(b"TEXT") {
        let _lines = cursor.parse_number()?;
    } else if media_type.eq_ignore_ascii_case(b"MESSAGE")
        && media_subtype.eq_ignore_ascii_case(b"RFC822")
    {
        parse_envelope(cursor)?;
        parse_body_struct(cursor)?;
        let _lines = cursor.parse_number()?;
    }

    cursor.expect(b')')
}

fn skip_flag_list(cursor: &mut Cursor<'_>) -> LexResult<()> {
    cursor.expect(b'(')?;
    while !cursor.skip(b')') {
        cursor.parse_astring()?;
    }
    Ok(())
}

/// Parses the attribute list of an untagged FETCH reply and returns the
/// envelope it carries.
///
/// `INTERNALDATE`, `RFC822.SIZE`, `FLAGS` and `BODY` are validated and
/// dropped. An envelope-less reply yields a default envelope.
///
/// # Errors
///
/// Returns a syntax error for malformed input or an unknown attribute.
pub fn parse_fetch_reply(cursor: &mut Cursor<'_>) -> LexResult<Envelope> {
    cursor.expect(b'(')?;
    let mut envelope = Envelope::default();

    while !cursor.skip(b')') {
        let name = cursor.parse_astring()?;
        match name.to_ascii_uppercase().as_slice() {
            b"INTERNALDATE" => {
                cursor.parse_string()?;
            }
            b"RFC822.SIZE" => {
                cursor.parse_number()?;
            }
            b"FLAGS" => skip_flag_list(cursor)?,
            b"ENVELOPE" => envelope = parse_envelope(cursor)?,
            b"BODY" => parse_body_struct(cursor)?,
            _ => {
                let name = String::from_utf8_lossy(name);
                debug!(%name, "unknown FETCH attribute");
                return Err(cursor.error(format!("unknown FETCH attribute {name}")));
            }
        }
    }
    Ok(envelope)
}

/// Parses the attribute list of a `BODY[TEXT]` FETCH reply and returns the
/// body bytes, if the reply carried any.
///
/// `FLAGS` and `UID` may accompany the body and are skipped. The closing
/// parenthesis may be absent at the end of the input.
///
/// # Errors
///
/// Returns a syntax error for malformed input or an unexpected attribute.
pub fn parse_body_reply<'a>(cursor: &mut Cursor<'a>) -> LexResult<Option<Cow<'a, [u8]>>> {
    cursor.expect(b'(')?;
    let mut body = None;

    while !cursor.at_end() && !cursor.skip(b')') {
        let name = cursor.parse_astring()?;
        match name.to_ascii_uppercase().as_slice() {
            b"BODY" => {
                cursor.expect(b'[')?;
                if !cursor.parse_astring()?.eq_ignore_ascii_case(b"TEXT") {
                    return Err(cursor.error("expected TEXT section"));
                }
                cursor.expect(b']')?;
                body = Some(cursor.parse_string()?);
            }
            b"FLAGS" => skip_flag_list(cursor)?,
            b"UID" => {
                cursor.parse_number()?;
            }
            _ => {
                return Err(cursor.error(format!(
                    "unexpected FETCH attribute {}",
                    String::from_utf8_lossy(name)
                )));
            }
        }
    }
    Ok(body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::parser::cursor::LexError;

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(b"plain"), "plain");
        assert_eq!(to_text("Grüße".as_bytes()), "Grüße");
        assert_eq!(to_text(b"caf\xe9"), "caf?");
    }

    #[test]
    fn test_address_list_nil() {
        let mut c = Cursor::new(b"NIL");
        assert!(parse_address_list(&mut c).unwrap().is_empty());
    }

    #[test]
    fn test_address_list() {
        let mut c = Cursor::new(br#"(("Ann" NIL "ann" "e.com")(NIL NIL "bob" "e.com"))"#);
        let list = parse_address_list(&mut c).unwrap();
        assert_eq!(
            list,
            vec![Address::new("Ann", "ann@e.com"), Address::new("", "bob@e.com")]
        );
        assert!(c.is_eof());
    }

    #[test]
    fn test_address_list_rejects_atom() {
        let mut c = Cursor::new(b"FOO");
        assert!(parse_address_list(&mut c).is_err());
    }

    #[test]
    fn test_envelope() {
        let input = br#"("Wed, 1 Jan 2020" "Hi" (("Ann" NIL "ann" "e.com")) NIL NIL (("Bob" NIL "bob" "e.com")) NIL NIL "" "<m1@e.com>")"#;
        let env = parse_envelope(&mut Cursor::new(input)).unwrap();
        assert_eq!(env.date, "Wed, 1 Jan 2020");
        assert_eq!(env.subject, "Hi");
        assert_eq!(env.from, vec![Address::new("Ann", "ann@e.com")]);
        assert!(env.sender.is_empty());
        assert_eq!(env.to, vec![Address::new("Bob", "bob@e.com")]);
        assert_eq!(env.parent_id, "");
        assert_eq!(env.message_id, "<m1@e.com>");
    }

    #[test]
    fn test_envelope_with_literal_subject() {
        let input = b"(NIL {5}\r\nHello NIL NIL NIL NIL NIL NIL NIL NIL)";
        let env = parse_envelope(&mut Cursor::new(input)).unwrap();
        assert_eq!(env.subject, "Hello");
    }

    #[test]
    fn test_envelope_missing_field() {
        let input = br#"("d" "s" NIL NIL NIL NIL NIL NIL NIL)"#;
        assert!(matches!(
            parse_envelope(&mut Cursor::new(input)),
            Err(LexError::Syntax { .. })
        ));
    }

    #[test]
    fn test_body_struct_text() {
        let input = br#"("TEXT" "PLAIN" ("CHARSET" "UTF-8") NIL NIL "7BIT" 1152 23)"#;
        let mut c = Cursor::new(input);
        parse_body_struct(&mut c).unwrap();
        assert!(c.is_eof());
    }

    #[test]
    fn test_body_struct_lowercase_text() {
        let input = br#"("text" "plain" NIL NIL NIL "7bit" 10 1)"#;
        parse_body_struct(&mut Cursor::new(input)).unwrap();
    }

    #[test]
    fn test_body_struct_multipart() {
        let input = br#"(("TEXT" "PLAIN" ("CHARSET" "US-ASCII") NIL NIL "7BIT" 1152 23)("APPLICATION" "PDF" ("NAME" "a.pdf") NIL NIL "BASE64" 4554) "MIXED")"#;
        let mut c = Cursor::new(input);
        parse_body_struct(&mut c).unwrap();
        assert!(c.is_eof());
    }

    #[test]
    fn test_body_struct_message_rfc822() {
        let input = br#"("MESSAGE" "RFC822" NIL NIL NIL "7BIT" 342 ("d" "inner" NIL NIL NIL NIL NIL NIL NIL NIL) ("TEXT" "PLAIN" NIL NIL NIL "7BIT" 20 2) 12)"#;
        let mut c = Cursor::new(input);
        parse_body_struct(&mut c).unwrap();
        assert!(c.is_eof());
    }

    #[test]
    fn test_body_struct_bad_params() {
        let input = br#"("TEXT" "PLAIN" FOO NIL NIL "7BIT" 1 1)"#;
        assert!(parse_body_struct(&mut Cursor::new(input)).is_err());
    }

    #[test]
    fn test_fetch_reply_full() {
        let input = br#"(FLAGS (\Seen \Answered) INTERNALDATE "01-Jan-2020 10:00:00 +0000" RFC822.SIZE 4321 ENVELOPE ("d" "subj" NIL NIL NIL NIL NIL NIL NIL "<id@x>") BODY ("TEXT" "PLAIN" NIL NIL NIL "7BIT" 10 1))"#;
        let env = parse_fetch_reply(&mut Cursor::new(input)).unwrap();
        assert_eq!(env.subject, "subj");
        assert_eq!(env.message_id, "<id@x>");
    }

    #[test]
    fn test_fetch_reply_unknown_attribute() {
        let input = b"(UID 5)";
        let err = parse_fetch_reply(&mut Cursor::new(input)).unwrap_err();
        assert!(matches!(err, LexError::Syntax { ref message, .. } if message.contains("UID")));
    }

    #[test]
    fn test_fetch_reply_incomplete_literal() {
        let input = b"(ENVELOPE (NIL {10}\r\nabc";
        assert_eq!(parse_fetch_reply(&mut Cursor::new(input)), Err(LexError::NeedMore));
    }

    #[test]
    fn test_body_reply() {
        let mut c = Cursor::new(b"(BODY[TEXT] {5}\r\nHello)");
        assert_eq!(parse_body_reply(&mut c).unwrap().as_deref(), Some(&b"Hello"[..]));
    }

    #[test]
    fn test_body_reply_with_flags_and_no_close() {
        let mut c = Cursor::new(b"(FLAGS (\\Seen) BODY[TEXT] \"hi\"");
        assert_eq!(parse_body_reply(&mut c).unwrap().as_deref(), Some(&b"hi"[..]));
    }

    #[test]
    fn test_body_reply_empty_literal() {
        let mut c = Cursor::new(b"(BODY[TEXT] {0}\r\n)");
        assert_eq!(parse_body_reply(&mut c).unwrap().as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_body_reply_flags_only() {
        let mut c = Cursor::new(b"(FLAGS (\\Seen))");
        assert_eq!(parse_body_reply(&mut c).unwrap(), None);
    }

    #[test]
    fn test_body_reply_wrong_section() {
        let mut c = Cursor::new(b"(BODY[HEADER] {2}\r\nab)");
        assert!(parse_body_reply(&mut c).is_err());
    }
}
