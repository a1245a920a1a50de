//! Recursive descent parser over a stream of characters.

use std::iter::Peekable;

use super::{Error, Map, Result, Value};

/// Parses JSON text from any character source.
///
/// The parser pulls characters lazily, so a value can be read from a
/// decoder or a file without collecting the whole text first. [`load`]
/// stops right after the first value; [`load_all`] additionally requires
/// the rest of the input to be whitespace.
///
/// [`load`]: Parser::load
/// [`load_all`]: Parser::load_all
#[derive(Debug)]
pub struct Parser<I: Iterator<Item = char>> {
    input: Peekable<I>,
    position: usize,
}

/// Parses exactly one value from a character source.
///
/// # Errors
///
/// Returns a parse error for malformed input or trailing data.
pub fn from_chars<I: IntoIterator<Item = char>>(input: I) -> Result<Value> {
    Parser::new(input.into_iter()).load_all()
}

const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

impl<I: Iterator<Item = char>> Parser<I> {
    /// Creates a parser reading from `input`.
    pub fn new(input: I) -> Self {
        Self {
            input: input.peekable(),
            position: 0,
        }
    }

    /// Number of characters consumed so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Parses the next value, leaving whatever follows it unread.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed input.
    pub fn load(&mut self) -> Result<Value> {
        self.skip_whitespace();
        self.parse_value()
    }

    /// Parses one value and checks that only whitespace follows it.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed input or trailing data.
    pub fn load_all(mut self) -> Result<Value> {
        let value = self.load()?;
        self.skip_whitespace();
        if self.input.peek().is_some() {
            return Err(self.error("trailing data"));
        }
        Ok(value)
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::Parse {
            position: self.position,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.input.next()?;
        self.position += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', got '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', got end of input"))),
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => self.parse_string().map(Value::String),
            Some('-' | '0'..='9') => self.parse_number(),
            Some('n') => self.parse_word("null", Value::Null),
            Some('t') => self.parse_word("true", Value::Bool(true)),
            Some('f') => self.parse_word("false", Value::Bool(false)),
            Some(c) => Err(self.error(format!("unexpected character '{c}'"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_word(&mut self, word: &str, value: Value) -> Result<Value> {
        for expected in word.chars() {
            if self.peek() != Some(expected) {
                return Err(self.error(format!("expected '{word}'")));
            }
            self.bump();
        }
        Ok(value)
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Value::Object(map));
        }
        loop {
            self.skip_whitespace();
            if self.peek() != Some('"') {
                return Err(self.error("expected string key"));
            }
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some('}') => return Ok(Value::Object(map)),
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(Value::Array(items));
        }
        loop {
            self.skip_whitespace();
            items.push(self.parse_value()?);
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some(']') => return Ok(Value::Array(items)),
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => out.push(self.parse_escape()?),
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char> {
        let c = match self.bump() {
            Some('"') => '"',
            Some('\\') => '\\',
            Some('/') => '/',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('u') => {
                let mut code = 0u32;
                for _ in 0..4 {
                    let digit = self
                        .bump()
                        .and_then(|c| c.to_digit(16))
                        .ok_or_else(|| self.error("invalid \\u escape"))?;
                    code = code * 16 + digit;
                }
                // No surrogate pair joining: a lone half is not a scalar value.
                char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
            }
            Some(c) => return Err(self.error(format!("invalid escape '\\{c}'"))),
            None => return Err(self.error("unterminated string")),
        };
        Ok(c)
    }

    fn take_digits(&mut self, text: &mut String) -> Result<()> {
        let start = text.len();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            text.push(c);
            self.bump();
        }
        if text.len() == start {
            return Err(self.error("expected digit"));
        }
        Ok(())
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.position;
        let mut text = String::new();
        let mut is_float = false;
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        self.take_digits(&mut text)?;
        if self.peek() == Some('.') {
            is_float = true;
            text.push('.');
            self.bump();
            self.take_digits(&mut text)?;
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            is_float = true;
            text.push(e);
            self.bump();
            if self.peek() == Some('-') {
                text.push('-');
                self.bump();
            }
            self.take_digits(&mut text)?;
        }

        let out_of_range = || Error::Parse {
            position: start,
            message: format!("number out of range: {text}"),
        };
        if is_float {
            match text.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Value::Float(x)),
                _ => Err(out_of_range()),
            }
        } else {
            text.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| out_of_range())
        }
    }
}
