//! Reader for configuration files that `return` a PHP array literal
//!
//! HumHub writes its runtime configuration as
//!
//! ```php
//! <?php return array (
//!   'name' => 'My Network',
//!   'components' => array ( 'db' => array ( 'dsn' => 'mysql:host=localhost;dbname=humhub' ) ),
//! );
//! ```
//!
//! Only literal values are understood: strings, numbers, booleans, `null` and
//! nested arrays in both `array(...)` and `[...]` notation. Comments are
//! skipped. Anything else is a [`PhpParseError`].

use thiserror::Error;

/// Parse failure with the byte offset where it happened
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("PHP parse error at offset {offset}: {message}")]
pub struct PhpParseError {
    pub offset: usize,
    pub message: String,
}

/// Array key
#[derive(Debug, Clone, PartialEq)]
pub enum PhpKey {
    Int(i64),
    Str(String),
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<(PhpKey, PhpValue)>),
}

impl PhpValue {
    /// Value stored under a string key of an array
    pub fn get(&self, key: &str) -> Option<&PhpValue> {
        match self {
            PhpValue::Array(entries) => entries.iter().find_map(|(k, v)| match k {
                PhpKey::Str(s) if s == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Value at a dotted path such as `components.db.dsn`
    pub fn get_path(&self, path: &str) -> Option<&PhpValue> {
        path.split('.').try_fold(self, |value, key| value.get(key))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhpValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse the value returned by a PHP file
pub fn parse_return(source: &str) -> Result<PhpValue, PhpParseError> {
    let mut parser = Parser::new(source);
    parser.skip_ws();
    parser.eat_keyword("<?php");
    parser.skip_ws();
    if !parser.eat_keyword("return") {
        return Err(parser.error("expected 'return'"));
    }
    let value = parser.value()?;
    parser.skip_ws();
    parser.eat(b';');
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> PhpParseError {
        PhpParseError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), PhpParseError> {
        self.skip_ws();
        if self.eat(byte) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    /// Consumes a case-insensitive keyword not followed by an identifier character
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = self.rest();
        let matches = rest.len() >= keyword.len()
            && rest.is_char_boundary(keyword.len())
            && rest[..keyword.len()].eq_ignore_ascii_case(keyword)
            && !rest[keyword.len()..]
                .bytes()
                .next()
                .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_');
        if matches {
            self.pos += keyword.len();
        }
        matches
    }

    fn skip_ws(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();

            if trimmed.starts_with("//") || trimmed.starts_with('#') {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if let Some(comment) = trimmed.strip_prefix("/*") {
                self.pos += comment.find("*/").map_or(trimmed.len(), |end| end + 4);
            } else {
                break;
            }
        }
    }

    fn value(&mut self) -> Result<PhpValue, PhpParseError> {
        self.skip_ws();
        match self.peek() {
            Some(b'\'') => self.single_quoted().map(PhpValue::Str),
            Some(b'"') => self.double_quoted().map(PhpValue::Str),
            Some(b'[') => {
                self.pos += 1;
                self.array_body(b']')
            }
            Some(b) if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.' => self.number(),
            Some(_) => {
                if self.eat_keyword("array") {
                    self.expect(b'(')?;
                    self.array_body(b')')
                } else if self.eat_keyword("true") {
                    Ok(PhpValue::Bool(true))
                } else if self.eat_keyword("false") {
                    Ok(PhpValue::Bool(false))
                } else if self.eat_keyword("null") {
                    Ok(PhpValue::Null)
                } else {
                    Err(self.error("unsupported expression"))
                }
            }
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn array_body(&mut self, close: u8) -> Result<PhpValue, PhpParseError> {
        let mut entries = Vec::new();
        let mut next_index = 0i64;

        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(PhpValue::Array(entries));
            }

            let first = self.value()?;
            self.skip_ws();
            let (key, value) = if self.rest().starts_with("=>") {
                self.pos += 2;
                let key = match first {
                    PhpValue::Str(s) => PhpKey::Str(s),
                    PhpValue::Int(i) => PhpKey::Int(i),
                    _ => return Err(self.error("unsupported array key")),
                };
                (key, self.value()?)
            } else {
                (PhpKey::Int(next_index), first)
            };
            if let PhpKey::Int(i) = key {
                next_index = i.saturating_add(1);
            }
            entries.push((key, value));

            self.skip_ws();
            if !self.eat(b',') {
                self.skip_ws();
                if self.eat(close) {
                    return Ok(PhpValue::Array(entries));
                }
                return Err(self.error(format!("expected ',' or '{}'", close as char)));
            }
        }
    }

    fn single_quoted(&mut self) -> Result<String, PhpParseError> {
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\'' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, e @ ('\'' | '\\'))) => out.push(e),
                    Some((_, e)) => {
                        out.push('\\');
                        out.push(e);
                    }
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn double_quoted(&mut self) -> Result<String, PhpParseError> {
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, e @ ('"' | '\\' | '$'))) => out.push(e),
                    Some((_, e)) => {
                        out.push('\\');
                        out.push(e);
                    }
                    None => break,
                },
                c => out.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<PhpValue, PhpParseError> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                !(c.is_ascii_digit()
                    || c == '.'
                    || c == 'e'
                    || c == 'E'
                    || ((c == '-' || c == '+') && (i == 0 || rest[..i].ends_with(['e', 'E']))))
            })
            .map_or(rest.len(), |(i, _)| i);
        let text = &rest[..len];

        let value = if let Ok(int) = text.parse::<i64>() {
            PhpValue::Int(int)
        } else if let Ok(float) = text.parse::<f64>() {
            PhpValue::Float(float)
        } else {
            return Err(self.error(format!("invalid number '{text}'")));
        };
        self.pos += len;
        Ok(value)
    }
}
