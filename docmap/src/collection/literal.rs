use crate::collection::{Document, ObjectId};
use crate::common::Value;
use crate::errors::{DocmapError, DocmapResult, ErrorKind};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Recursive-descent parser for the literal document dialect.
///
/// The dialect is relaxed JSON as typed into a database shell:
///
/// - keys may be bare words made of `[A-Za-z0-9_$.-]`, so `$gt` and `a.b`
///   need no quotes
/// - strings use double or single quotes
/// - trailing commas and `//` line comments are allowed
/// - integers become `I32` when they fit and `I64` otherwise; a fraction or
///   exponent makes an `F64`
/// - `ObjectId("..")`, `ISODate("..")` and `Date(millis)` build identity and
///   timestamp values
///
/// Every error message carries the byte offset where parsing failed.
/// Deepest nesting of objects and arrays accepted below the top level.
const MAX_DEPTH: usize = 128;

pub(crate) struct LiteralParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        LiteralParser {
            input,
            pos: 0,
            depth: 0,
        }
    }

    /// Parses the whole input as a single top-level object.
    pub(crate) fn parse_document(&mut self) -> DocmapResult<Document> {
        self.skip_insignificant()?;
        match self.peek() {
            Some('{') => {}
            Some(c) => return Err(self.error(&format!("expected '{{' at top level, found '{}'", c))),
            None => return Err(self.error("empty literal")),
        }

        let doc = self.parse_object()?;
        self.skip_insignificant()?;
        if let Some(c) = self.peek() {
            return Err(self.error(&format!("unexpected trailing character '{}'", c)));
        }
        Ok(doc)
    }

    fn parse_value(&mut self) -> DocmapResult<Value> {
        self.skip_insignificant()?;
        match self.peek() {
            None => Err(self.error("unexpected end of input, expected a value")),
            Some('{') => {
                self.enter()?;
                let doc = self.parse_object();
                self.depth -= 1;
                Ok(Value::Document(doc?))
            }
            Some('[') => {
                self.enter()?;
                let array = self.parse_array();
                self.depth -= 1;
                array
            }
            Some(quote @ ('"' | '\'')) => Ok(Value::String(self.parse_string(quote)?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_ascii_alphabetic() => self.parse_word_value(),
            Some(c) => Err(self.error(&format!("unexpected character '{}'", c))),
        }
    }

    fn enter(&mut self) -> DocmapResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_object(&mut self) -> DocmapResult<Document> {
        self.expect('{')?;
        let mut doc = Document::new();

        loop {
            self.skip_insignificant()?;
            if self.consume('}') {
                return Ok(doc);
            }

            let key_offset = self.pos;
            let key = self.parse_key()?;
            self.skip_insignificant()?;
            self.expect(':')?;
            let value = self.parse_value()?;

            if doc.has(&key) {
                log::error!("Duplicate key '{}' at offset {}", key, key_offset);
                return Err(DocmapError::new(
                    &format!("Duplicate key '{}' at offset {}", key, key_offset),
                    ErrorKind::ParseError,
                ));
            }
            doc.put(&key, value)?;

            self.skip_insignificant()?;
            if self.consume(',') {
                continue;
            }
            if self.consume('}') {
                return Ok(doc);
            }
            return Err(self.unexpected("',' or '}'"));
        }
    }

    fn parse_array(&mut self) -> DocmapResult<Value> {
        self.expect('[')?;
        let mut items = Vec::new();

        loop {
            self.skip_insignificant()?;
            if self.consume(']') {
                return Ok(Value::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_insignificant()?;
            if self.consume(',') {
                continue;
            }
            if self.consume(']') {
                return Ok(Value::Array(items));
            }
            return Err(self.unexpected("',' or ']'"));
        }
    }

    fn parse_key(&mut self) -> DocmapResult<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                let key = self.parse_string(quote)?;
                if key.is_empty() {
                    return Err(self.error("empty key"));
                }
                Ok(key)
            }
            Some(c) if is_bare_key_char(c) => Ok(self.take_while(is_bare_key_char).to_string()),
            Some(_) => Err(self.unexpected("a key")),
            None => Err(self.error("unexpected end of input, expected a key")),
        }
    }

    fn parse_string(&mut self, quote: char) -> DocmapResult<String> {
        self.expect(quote)?;
        let mut out = String::new();

        loop {
            let c = match self.next_char() {
                Some(c) => c,
                None => return Err(self.error("unterminated string")),
            };

            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let escape_offset = self.pos - 1;
            match self.next_char() {
                Some('"') => out.push('"'),
                Some('\'') => out.push('\''),
                Some('\\') => out.push('\\'),
                Some('/') => out.push('/'),
                Some('b') => out.push('\u{0008}'),
                Some('f') => out.push('\u{000C}'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('u') => out.push(self.parse_unicode_escape(escape_offset)?),
                Some(other) => {
                    return Err(self.error_at(
                        escape_offset,
                        &format!("invalid escape sequence '\\{}'", other),
                    ))
                }
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_unicode_escape(&mut self, escape_offset: usize) -> DocmapResult<char> {
        let high = self.read_hex4()?;

        // utf-16 surrogate pair
        if (0xD800..0xDC00).contains(&high) {
            if self.input[self.pos..].starts_with("\\u") {
                self.pos += 2;
                let low = self.read_hex4()?;
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(c) = char::from_u32(code) {
                        return Ok(c);
                    }
                }
            }
            return Err(self.error_at(escape_offset, "invalid unicode surrogate pair"));
        }

        char::from_u32(high)
            .ok_or_else(|| self.error_at(escape_offset, "invalid unicode escape"))
    }

    fn read_hex4(&mut self) -> DocmapResult<u32> {
        let start = self.pos;
        let digits = self.input.get(start..start + 4).unwrap_or("");
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(self.error("expected four hex digits in unicode escape"));
        }
        self.pos += 4;
        u32::from_str_radix(digits, 16)
            .map_err(|e| self.error_at(start, &format!("invalid unicode escape: {}", e)))
    }

    fn parse_number(&mut self) -> DocmapResult<Value> {
        let start = self.pos;
        let text = self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.'));

        let is_decimal = text.contains(['.', 'e', 'E']);
        let digits = text.strip_prefix('+').unwrap_or(text);
        if is_decimal {
            digits
                .parse::<f64>()
                .map(Value::F64)
                .map_err(|e| self.error_at(start, &format!("invalid number '{}': {}", text, e)))
        } else {
            let value = digits
                .parse::<i64>()
                .map_err(|e| self.error_at(start, &format!("invalid number '{}': {}", text, e)))?;
            match i32::try_from(value) {
                Ok(small) => Ok(Value::I32(small)),
                Err(_) => Ok(Value::I64(value)),
            }
        }
    }

    fn parse_word_value(&mut self) -> DocmapResult<Value> {
        let start = self.pos;
        let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');

        match word {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "null" => Ok(Value::Null),
            "ObjectId" => {
                let hex = self.parse_string_argument()?;
                ObjectId::parse_str(&hex).map(Value::ObjectId).map_err(|e| {
                    log::error!("Invalid ObjectId literal at offset {}", start);
                    DocmapError::new_with_cause(
                        &format!("Invalid ObjectId literal '{}' at offset {}", hex, start),
                        ErrorKind::ParseError,
                        e,
                    )
                })
            }
            "ISODate" => {
                let text = self.parse_string_argument()?;
                parse_iso_date(&text)
                    .map(Value::Timestamp)
                    .ok_or_else(|| self.error_at(start, &format!("invalid ISODate '{}'", text)))
            }
            "Date" => {
                self.open_call()?;
                let millis = match self.parse_number()? {
                    Value::I32(i) => i as i64,
                    Value::I64(i) => i,
                    _ => return Err(self.error_at(start, "Date expects integer milliseconds")),
                };
                self.close_call()?;
                Utc.timestamp_millis_opt(millis)
                    .single()
                    .map(Value::Timestamp)
                    .ok_or_else(|| self.error_at(start, &format!("Date({}) is out of range", millis)))
            }
            _ => Err(self.error_at(start, &format!("unknown literal '{}'", word))),
        }
    }

    fn parse_string_argument(&mut self) -> DocmapResult<String> {
        self.open_call()?;
        let text = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.parse_string(quote)?,
            _ => return Err(self.unexpected("a quoted string")),
        };
        self.close_call()?;
        Ok(text)
    }

    fn open_call(&mut self) -> DocmapResult<()> {
        self.skip_insignificant()?;
        self.expect('(')?;
        self.skip_insignificant()
    }

    fn close_call(&mut self) -> DocmapResult<()> {
        self.skip_insignificant()?;
        self.expect(')')
    }

    fn skip_insignificant(&mut self) -> DocmapResult<()> {
        loop {
            self.take_while(char::is_whitespace);
            if self.input[self.pos..].starts_with("//") {
                self.take_while(|c| c != '\n');
            } else {
                return Ok(());
            }
        }
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> &'a str {
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !predicate(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &self.input[start..start + len]
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn next_char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> DocmapResult<()> {
        if self.consume(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", expected)))
        }
    }

    fn unexpected(&self, expected: &str) -> DocmapError {
        match self.peek() {
            Some(c) => self.error(&format!("expected {}, found '{}'", expected, c)),
            None => self.error(&format!("expected {}, found end of input", expected)),
        }
    }

    fn error(&self, message: &str) -> DocmapError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: &str) -> DocmapError {
        log::error!("Literal parse error at offset {}: {}", offset, message);
        DocmapError::new(
            &format!("Literal parse error at offset {}: {}", offset, message),
            ErrorKind::ParseError,
        )
    }
}

fn is_bare_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.' | '-')
}

fn parse_iso_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    // date only, midnight UTC
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
