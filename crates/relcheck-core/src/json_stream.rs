//! Push-based JSON parser.
//!
//! Bytes are fed as they arrive from the network, in chunks of any size, and a
//! syntax error is reported from the `write` call that delivers the offending
//! byte instead of after the whole body has been buffered.

use serde_json::{Map, Number, Value};
use thiserror::Error;

const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JsonErrorReason {
    #[error("unexpected byte 0x{0:02x}")]
    UnexpectedByte(u8),
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid unicode code point")]
    InvalidCodePoint,
    #[error("control character in string")]
    ControlCharacter,
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid number")]
    InvalidNumber,
    #[error("nesting deeper than {MAX_DEPTH} levels")]
    TooDeep,
    #[error("trailing characters after document")]
    TrailingCharacters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{reason} at byte {offset}")]
pub struct JsonStreamError {
    pub offset: usize,
    pub reason: JsonErrorReason,
}

#[derive(Debug)]
enum Frame {
    Array(Vec<Value>),
    Object {
        map: Map<String, Value>,
        key: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    True,
    False,
    Null,
}

impl Literal {
    fn text(self) -> &'static [u8] {
        match self {
            Self::True => b"true",
            Self::False => b"false",
            Self::Null => b"null",
        }
    }

    fn value(self) -> Value {
        match self {
            Self::True => Value::Bool(true),
            Self::False => Value::Bool(false),
            Self::Null => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Value,
    ArrayFirst,
    ObjectFirst,
    ObjectKey,
    Colon,
    AfterValue,
    Done,
    Str,
    Escape,
    Unicode { digits: u8, acc: u32 },
    LowSurrogateBackslash,
    LowSurrogateU,
    Number,
    Literal { literal: Literal, matched: usize },
}

#[derive(Debug)]
pub struct JsonStreamParser {
    state: State,
    stack: Vec<Frame>,
    root: Option<Value>,
    string_is_key: bool,
    string_buf: Vec<u8>,
    high_surrogate: Option<u32>,
    number_buf: String,
    offset: usize,
    failed: Option<JsonStreamError>,
}

impl Default for JsonStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonStreamParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Value,
            stack: Vec::new(),
            root: None,
            string_is_key: false,
            string_buf: Vec::new(),
            high_surrogate: None,
            number_buf: String::new(),
            offset: 0,
            failed: None,
        }
    }

    /// Total number of bytes accepted so far.
    #[must_use]
    pub fn bytes_consumed(&self) -> usize {
        self.offset
    }

    /// Feed the next chunk of the document.
    ///
    /// # Errors
    /// Returns the first syntax error found. Once an error has been returned
    /// every later call returns the same error.
    pub fn write(&mut self, chunk: &[u8]) -> Result<(), JsonStreamError> {
        if let Some(error) = self.failed {
            return Err(error);
        }
        for &byte in chunk {
            if let Err(reason) = self.step(byte) {
                return Err(self.fail(reason));
            }
            self.offset += 1;
        }
        Ok(())
    }

    /// Complete the document and return the parsed value.
    ///
    /// # Errors
    /// Returns an error when an earlier chunk failed or the document is
    /// incomplete.
    pub fn finish(mut self) -> Result<Value, JsonStreamError> {
        if let Some(error) = self.failed {
            return Err(error);
        }
        if self.state == State::Number
            && let Err(reason) = self.end_number()
        {
            return Err(self.fail(reason));
        }
        match (self.state, self.root.take()) {
            (State::Done, Some(value)) => Ok(value),
            _ => Err(self.fail(JsonErrorReason::UnexpectedEnd)),
        }
    }

    fn fail(&mut self, reason: JsonErrorReason) -> JsonStreamError {
        let error = JsonStreamError {
            offset: self.offset,
            reason,
        };
        self.failed = Some(error);
        error
    }

    fn step(&mut self, byte: u8) -> Result<(), JsonErrorReason> {
        match self.state {
            State::Str => self.string_byte(byte),
            State::Escape => self.escape_byte(byte),
            State::Unicode { digits, acc } => self.unicode_byte(byte, digits, acc),
            State::LowSurrogateBackslash => {
                if byte == b'\\' {
                    self.state = State::LowSurrogateU;
                    Ok(())
                } else {
                    Err(JsonErrorReason::InvalidCodePoint)
                }
            }
            State::LowSurrogateU => {
                if byte == b'u' {
                    self.state = State::Unicode { digits: 0, acc: 0 };
                    Ok(())
                } else {
                    Err(JsonErrorReason::InvalidCodePoint)
                }
            }
            State::Number => {
                if matches!(byte, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E') {
                    self.number_buf.push(char::from(byte));
                    Ok(())
                } else {
                    self.end_number()?;
                    self.step(byte)
                }
            }
            State::Literal { literal, matched } => {
                let text = literal.text();
                if text[matched] != byte {
                    return Err(JsonErrorReason::UnexpectedByte(byte));
                }
                if matched + 1 == text.len() {
                    self.emit(literal.value())
                } else {
                    self.state = State::Literal {
                        literal,
                        matched: matched + 1,
                    };
                    Ok(())
                }
            }
            _ if is_whitespace(byte) => Ok(()),
            State::Value => self.begin_value(byte),
            State::ArrayFirst => {
                if byte == b']' {
                    self.close_container(byte)
                } else {
                    self.begin_value(byte)
                }
            }
            State::ObjectFirst | State::ObjectKey => match byte {
                b'"' => {
                    self.begin_string(true);
                    Ok(())
                }
                b'}' if self.state == State::ObjectFirst => self.close_container(byte),
                _ => Err(JsonErrorReason::UnexpectedByte(byte)),
            },
            State::Colon => {
                if byte == b':' {
                    self.state = State::Value;
                    Ok(())
                } else {
                    Err(JsonErrorReason::UnexpectedByte(byte))
                }
            }
            State::AfterValue => match (byte, self.stack.last()) {
                (b',', Some(Frame::Array(_))) => {
                    self.state = State::Value;
                    Ok(())
                }
                (b',', Some(Frame::Object { .. })) => {
                    self.state = State::ObjectKey;
                    Ok(())
                }
                (b']' | b'}', Some(_)) => self.close_container(byte),
                _ => Err(JsonErrorReason::UnexpectedByte(byte)),
            },
            State::Done => Err(JsonErrorReason::TrailingCharacters),
        }
    }

    fn begin_value(&mut self, byte: u8) -> Result<(), JsonErrorReason> {
        match byte {
            b'[' => self.open(Frame::Array(Vec::new()), State::ArrayFirst),
            b'{' => self.open(
                Frame::Object {
                    map: Map::new(),
                    key: None,
                },
                State::ObjectFirst,
            ),
            b'"' => {
                self.begin_string(false);
                Ok(())
            }
            b'-' | b'0'..=b'9' => {
                self.number_buf.clear();
                self.number_buf.push(char::from(byte));
                self.state = State::Number;
                Ok(())
            }
            b't' => self.begin_literal(Literal::True),
            b'f' => self.begin_literal(Literal::False),
            b'n' => self.begin_literal(Literal::Null),
            _ => Err(JsonErrorReason::UnexpectedByte(byte)),
        }
    }

    fn begin_literal(&mut self, literal: Literal) -> Result<(), JsonErrorReason> {
        self.state = State::Literal { literal, matched: 1 };
        Ok(())
    }

    fn begin_string(&mut self, is_key: bool) {
        self.string_is_key = is_key;
        self.string_buf.clear();
        self.high_surrogate = None;
        self.state = State::Str;
    }

    fn open(&mut self, frame: Frame, next: State) -> Result<(), JsonErrorReason> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(JsonErrorReason::TooDeep);
        }
        self.stack.push(frame);
        self.state = next;
        Ok(())
    }

    fn close_container(&mut self, byte: u8) -> Result<(), JsonErrorReason> {
        let value = match (self.stack.pop(), byte) {
            (Some(Frame::Array(items)), b']') => Value::Array(items),
            (Some(Frame::Object { map, key: None }), b'}') => Value::Object(map),
            _ => return Err(JsonErrorReason::UnexpectedByte(byte)),
        };
        self.emit(value)
    }

    fn emit(&mut self, value: Value) -> Result<(), JsonErrorReason> {
        match self.stack.last_mut() {
            None => {
                self.root = Some(value);
                self.state = State::Done;
            }
            Some(Frame::Array(items)) => {
                items.push(value);
                self.state = State::AfterValue;
            }
            Some(Frame::Object { map, key }) => {
                let key = key.take().ok_or(JsonErrorReason::UnexpectedEnd)?;
                map.insert(key, value);
                self.state = State::AfterValue;
            }
        }
        Ok(())
    }

    fn string_byte(&mut self, byte: u8) -> Result<(), JsonErrorReason> {
        match byte {
            b'"' => self.end_string(),
            b'\\' => {
                self.state = State::Escape;
                Ok(())
            }
            0x00..=0x1f => Err(JsonErrorReason::ControlCharacter),
            _ => {
                self.string_buf.push(byte);
                Ok(())
            }
        }
    }

    fn escape_byte(&mut self, byte: u8) -> Result<(), JsonErrorReason> {
        let unescaped = match byte {
            b'"' => b'"',
            b'\\' => b'\\',
            b'/' => b'/',
            b'b' => 0x08,
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'u' => {
                self.state = State::Unicode { digits: 0, acc: 0 };
                return Ok(());
            }
            _ => return Err(JsonErrorReason::InvalidEscape),
        };
        self.string_buf.push(unescaped);
        self.state = State::Str;
        Ok(())
    }

    fn unicode_byte(&mut self, byte: u8, digits: u8, acc: u32) -> Result<(), JsonErrorReason> {
        let digit = char::from(byte)
            .to_digit(16)
            .ok_or(JsonErrorReason::InvalidEscape)?;
        let acc = (acc << 4) | digit;
        if digits < 3 {
            self.state = State::Unicode {
                digits: digits + 1,
                acc,
            };
            return Ok(());
        }

        let code_point = match (self.high_surrogate.take(), acc) {
            (None, 0xD800..=0xDBFF) => {
                self.high_surrogate = Some(acc);
                self.state = State::LowSurrogateBackslash;
                return Ok(());
            }
            (None, 0xDC00..=0xDFFF) => return Err(JsonErrorReason::InvalidCodePoint),
            (None, code_point) => code_point,
            (Some(high), low @ 0xDC00..=0xDFFF) => {
                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
            }
            (Some(_), _) => return Err(JsonErrorReason::InvalidCodePoint),
        };

        let ch = char::from_u32(code_point).ok_or(JsonErrorReason::InvalidCodePoint)?;
        let mut encoded = [0u8; 4];
        self.string_buf
            .extend_from_slice(ch.encode_utf8(&mut encoded).as_bytes());
        self.state = State::Str;
        Ok(())
    }

    fn end_string(&mut self) -> Result<(), JsonErrorReason> {
        let text = String::from_utf8(std::mem::take(&mut self.string_buf))
            .map_err(|_| JsonErrorReason::InvalidUtf8)?;
        if self.string_is_key {
            if let Some(Frame::Object { key, .. }) = self.stack.last_mut() {
                *key = Some(text);
            }
            self.state = State::Colon;
            Ok(())
        } else {
            self.emit(Value::String(text))
        }
    }

    fn end_number(&mut self) -> Result<(), JsonErrorReason> {
        let text = std::mem::take(&mut self.number_buf);
        let number = parse_number(&text).ok_or(JsonErrorReason::InvalidNumber)?;
        self.emit(Value::Number(number))
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

fn parse_number(text: &str) -> Option<Number> {
    if !is_valid_number(text.as_bytes()) {
        return None;
    }
    if let Ok(value) = text.parse::<i64>() {
        return Some(Number::from(value));
    }
    if let Ok(value) = text.parse::<u64>() {
        return Some(Number::from(value));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// `-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`
fn is_valid_number(bytes: &[u8]) -> bool {
    fn digits(bytes: &[u8], mut pos: usize) -> usize {
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    }

    let mut pos = usize::from(bytes.first() == Some(&b'-'));
    match bytes.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => pos = digits(bytes, pos + 1),
        _ => return false,
    }

    if bytes.get(pos) == Some(&b'.') {
        let end = digits(bytes, pos + 1);
        if end == pos + 1 {
            return false;
        }
        pos = end;
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let end = digits(bytes, pos);
        if end == pos {
            return false;
        }
        pos = end;
    }

    pos == bytes.len()
}
