//! Byte cursor with the IMAP lexical primitives.
//!
//! A cursor runs over one candidate response: the bytes of a line up to,
//! but not including, its terminating CRLF, plus any literal continuation
//! the framing has already glued on. When a literal announces more bytes
//! than the candidate holds, the primitives return [`LexError::NeedMore`]
//! instead of a syntax error so that the caller can wait for more input
//! and parse the same response again from the start.

use std::borrow::Cow;

/// Lexical failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// The input ends inside a literal; retry once more bytes arrived.
    #[error("need more input")]
    NeedMore,

    /// The input is malformed.
    #[error("{message} at position {position}")]
    Syntax {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },
}

/// Result type for the lexical primitives.
pub type LexResult<T> = std::result::Result<T, LexError>;

/// Returns true for bytes allowed in an atom.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'(' | b')' | b'{' | b'}' | b'[' | b']')
}

/// Parse position within a candidate response.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the unparsed rest of the input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true if all input has been consumed.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips ASCII whitespace.
    pub fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Returns true if only whitespace is left.
    pub fn at_end(&mut self) -> bool {
        self.skip_whitespace();
        self.is_eof()
    }

    /// Skips whitespace and tells whether the next byte is `token`.
    pub fn check(&mut self, token: u8) -> bool {
        self.skip_whitespace();
        self.peek() == Some(token)
    }

    /// Skips whitespace and consumes `token` if it is next.
    pub fn skip(&mut self, token: u8) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skips whitespace and consumes `token`, failing if it is not next.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the next byte differs.
    pub fn expect(&mut self, token: u8) -> LexResult<()> {
        if self.skip(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", char::from(token))))
        }
    }

    /// Skips whitespace and tells whether a number starts here.
    pub fn check_digit(&mut self) -> bool {
        self.skip_whitespace();
        self.peek().is_some_and(|b| b.is_ascii_digit())
    }

    /// Reads an atom: one or more bytes that are neither whitespace nor
    /// one of `(){}[]`.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if no atom starts here.
    pub fn parse_astring(&mut self) -> LexResult<&'a [u8]> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected atom"));
        }
        Ok(&self.input[start..self.pos])
    }

    /// Reads a decimal number.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if no digits follow or the value overflows.
    pub fn parse_number(&mut self) -> LexResult<u32> {
        self.skip_whitespace();
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(digit) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(digit - b'0')))
                .ok_or_else(|| self.error("number too large"))?;
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected number"));
        }
        Ok(value)
    }

    /// Reads a quoted string, a literal, or `NIL` (as the empty string).
    ///
    /// # Errors
    ///
    /// Returns [`LexError::NeedMore`] if a literal is not complete yet and a
    /// syntax error for anything else that is not a string.
    pub fn parse_string(&mut self) -> LexResult<Cow<'a, [u8]>> {
        if self.skip(b'{') {
            return self.parse_literal().map(Cow::Borrowed);
        }
        if self.skip(b'"') {
            return self.parse_quoted();
        }
        let atom = self.parse_astring()?;
        if atom == b"NIL" {
            Ok(Cow::Borrowed(&[]))
        } else {
            Err(self.error("expected string or NIL"))
        }
    }

    // Called after the opening brace.
    fn parse_literal(&mut self) -> LexResult<&'a [u8]> {
        let length = usize::try_from(self.parse_number()?)
            .map_err(|_| self.error("literal too large"))?;
        self.expect(b'}')?;

        loop {
            match self.advance() {
                // the CRLF is beyond the candidate
                None => return Err(LexError::NeedMore),
                Some(b'\r') => break,
                Some(b) if b.is_ascii_whitespace() => {}
                Some(_) => return Err(self.error("junk before CRLF")),
            }
        }
        match self.advance() {
            Some(b'\n') => {}
            None => return Err(LexError::NeedMore),
            Some(_) => return Err(self.error("expected LF")),
        }

        if self.input.len() - self.pos < length {
            return Err(LexError::NeedMore);
        }
        let data = &self.input[self.pos..self.pos + length];
        self.pos += length;
        Ok(data)
    }

    // Called after the opening quote. Only \" and \\ are escapes.
    fn parse_quoted(&mut self) -> LexResult<Cow<'a, [u8]>> {
        let start = self.pos;
        let mut owned: Option<Vec<u8>> = None;
        loop {
            match self.advance() {
                None => return Err(self.error("unterminated string")),
                Some(b'"') => break,
                Some(b'\\') => {
                    let escaped = match self.advance() {
                        Some(c @ (b'"' | b'\\')) => c,
                        _ => return Err(self.error("invalid escaped char")),
                    };
                    let buf = owned.get_or_insert_with(|| self.input[start..self.pos - 2].to_vec());
                    buf.push(escaped);
                }
                Some(c) => {
                    if let Some(buf) = owned.as_mut() {
                        buf.push(c);
                    }
                }
            }
        }
        Ok(owned.map_or_else(
            || Cow::Borrowed(&self.input[start..self.pos - 1]),
            Cow::Owned,
        ))
    }

    /// Consumes the rest of the input without interpreting it.
    ///
    /// Quoted strings are stepped over as a whole and literals are still
    /// framed, so a literal at the end of the input yields
    /// [`LexError::NeedMore`].
    ///
    /// # Errors
    ///
    /// Returns [`LexError::NeedMore`] for an incomplete literal.
    pub fn skip_line(&mut self) -> LexResult<()> {
        while let Some(b) = self.peek() {
            match b {
                b'"' => {
                    let mut probe = *self;
                    probe.pos += 1;
                    match probe.parse_quoted() {
                        Ok(_) => *self = probe,
                        Err(_) => self.pos = self.input.len(),
                    }
                }
                b'{' => {
                    let mut probe = *self;
                    probe.pos += 1;
                    match probe.parse_literal() {
                        Ok(_) => *self = probe,
                        Err(LexError::NeedMore) => return Err(LexError::NeedMore),
                        // a brace in plain text
                        Err(LexError::Syntax { .. }) => self.pos += 1,
                    }
                }
                _ => self.pos += 1,
            }
        }
        Ok(())
    }

    /// Creates a syntax error at the current position.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> LexError {
        LexError::Syntax {
            position: self.pos,
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_check_skip_expect() {
        let mut c = Cursor::new(b"  ( x");
        assert!(c.check(b'('));
        assert_eq!(c.position(), 2);
        assert!(!c.skip(b')'));
        assert!(c.skip(b'('));
        assert!(c.expect(b'y').is_err());
        assert!(c.expect(b'x').is_ok());
        assert!(c.is_eof());
    }

    #[test]
    fn test_expect_at_end() {
        let mut c = Cursor::new(b"   ");
        let err = c.expect(b')').unwrap_err();
        assert_eq!(
            err,
            LexError::Syntax {
                position: 3,
                message: "expected ')'".to_string()
            }
        );
    }

    #[test]
    fn test_astring_stops_at_specials() {
        let mut c = Cursor::new(b" BODY[TEXT] \\Seen)");
        assert_eq!(c.parse_astring().unwrap(), b"BODY");
        assert!(c.skip(b'['));
        assert_eq!(c.parse_astring().unwrap(), b"TEXT");
        assert!(c.skip(b']'));
        assert_eq!(c.parse_astring().unwrap(), b"\\Seen");
        assert!(c.parse_astring().is_err());
    }

    #[test]
    fn test_astring_rejects_non_atom() {
        let mut c = Cursor::new(b"(abc");
        let err = c.parse_astring().unwrap_err();
        assert!(matches!(err, LexError::Syntax { ref message, .. } if message == "expected atom"));
    }

    #[test]
    fn test_number() {
        let mut c = Cursor::new(b" 4294967295 4294967296");
        assert_eq!(c.parse_number().unwrap(), u32::MAX);
        assert!(c.parse_number().is_err());
        assert!(Cursor::new(b"x").parse_number().is_err());
    }

    #[test]
    fn test_quoted_string() {
        let mut c = Cursor::new(br#""Hello, World!""#);
        let s = c.parse_string().unwrap();
        assert!(matches!(s, Cow::Borrowed(_)));
        assert_eq!(&*s, b"Hello, World!");
    }

    #[test]
    fn test_quoted_string_escapes() {
        let mut c = Cursor::new(br#""a \"quoted\" \\ word""#);
        assert_eq!(&*c.parse_string().unwrap(), br#"a "quoted" \ word"#);
    }

    #[test]
    fn test_quoted_string_bad_escape() {
        let mut c = Cursor::new(br#""a\nb""#);
        assert!(matches!(c.parse_string(), Err(LexError::Syntax { .. })));
    }

    #[test]
    fn test_unterminated_quoted_string() {
        let mut c = Cursor::new(b"\"abc");
        assert!(matches!(c.parse_string(), Err(LexError::Syntax { .. })));
    }

    #[test]
    fn test_nil_is_empty() {
        let mut c = Cursor::new(b"NIL");
        assert!(c.parse_string().unwrap().is_empty());
        assert!(Cursor::new(b"NILS").parse_string().is_err());
    }

    #[test]
    fn test_literal() {
        let mut c = Cursor::new(b"{5}\r\nHello rest");
        assert_eq!(&*c.parse_string().unwrap(), b"Hello");
        assert_eq!(c.remaining(), b" rest");
    }

    #[test]
    fn test_literal_with_space_before_crlf() {
        let mut c = Cursor::new(b"{2} \r\nok");
        assert_eq!(&*c.parse_string().unwrap(), b"ok");
    }

    #[test]
    fn test_empty_literal() {
        let mut c = Cursor::new(b"{0}\r\n");
        assert!(c.parse_string().unwrap().is_empty());
        assert!(c.is_eof());
    }

    #[test]
    fn test_literal_needs_more() {
        assert_eq!(Cursor::new(b"{5}").parse_string(), Err(LexError::NeedMore));
        assert_eq!(Cursor::new(b"{5}\r").parse_string(), Err(LexError::NeedMore));
        assert_eq!(Cursor::new(b"{5}\r\nHel").parse_string(), Err(LexError::NeedMore));
    }

    #[test]
    fn test_literal_junk_before_crlf() {
        assert!(matches!(
            Cursor::new(b"{5}x\r\nHello").parse_string(),
            Err(LexError::Syntax { .. })
        ));
    }

    #[test]
    fn test_skip_line_plain() {
        let mut c = Cursor::new(b"OK [UIDVALIDITY 3] {not a literal} done");
        assert!(c.skip_line().is_ok());
        assert!(c.is_eof());
    }

    #[test]
    fn test_skip_line_literal() {
        let mut c = Cursor::new(b"LIST () \"/\" {3}\r\nabc");
        assert!(c.skip_line().is_ok());
        assert!(c.is_eof());

        assert_eq!(
            Cursor::new(b"LIST () \"/\" {3}").skip_line(),
            Err(LexError::NeedMore)
        );
    }

    #[test]
    fn test_skip_line_ignores_brace_in_quotes() {
        let mut c = Cursor::new(b"OK \"{5}\"");
        assert!(c.skip_line().is_ok());
    }
}
