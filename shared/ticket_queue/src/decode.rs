//! Message body decoding
//!
//! Bodies are decoded as JSON first. A single fallback parser can be plugged in
//! for legacy producers that wrote Python dict literals instead of JSON.

use serde::Deserialize;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::ticket::TicketFields;

/// Errors produced while decoding a message body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The body is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The body is valid JSON but not an object
    #[error("payload is not an object")]
    NotAnObject,

    /// The body is not a valid legacy literal
    #[error("invalid literal at byte {position}: {reason}")]
    InvalidLiteral {
        /// Byte offset of the failure
        position: usize,
        /// What the parser expected
        reason: &'static str,
    },
}

/// A parsing strategy for message bodies
pub trait PayloadParser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Parses a body into raw ticket fields
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the body is not in this parser's format
    fn parse(&self, body: &str) -> Result<TicketFields, DecodeError>;
}

/// Which strategy produced a decoded payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// Parsed as JSON, the body can be forwarded byte-for-byte
    Json,
    /// Recovered by the named fallback parser
    Legacy(&'static str),
}

/// Decoded ticket fields and the format they were read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Raw fields, not yet validated
    pub fields: TicketFields,
    /// Format of the original body
    pub format: PayloadFormat,
}

/// Configured fallback for non-JSON bodies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LegacyPayloadFormat {
    /// JSON only
    None,
    /// Python dict literals, e.g. `{'title': 'X'}`
    #[default]
    PythonLiteral,
}

/// JSON object parser
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl PayloadParser for JsonParser {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, body: &str) -> Result<TicketFields, DecodeError> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }

        serde_json::from_value(value).map_err(|e| DecodeError::InvalidJson(e.to_string()))
    }
}

/// Parser for Python dict literals with string keys and string or `None` values
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonLiteralParser;

impl PayloadParser for PythonLiteralParser {
    fn name(&self) -> &'static str {
        "python-literal"
    }

    fn parse(&self, body: &str) -> Result<TicketFields, DecodeError> {
        let mut fields = TicketFields::default();

        for (key, value) in Literal::new(body).dict()? {
            match key.as_str() {
                "title" => fields.title = value,
                "description" => fields.description = value,
                "priority" => fields.priority = value,
                _ => {}
            }
        }

        Ok(fields)
    }
}

/// Decodes message bodies with JSON and an optional fallback parser
pub struct TicketDecoder {
    primary: JsonParser,
    fallback: Option<Box<dyn PayloadParser>>,
}

impl TicketDecoder {
    /// Decoder that only accepts JSON
    #[must_use]
    pub const fn json_only() -> Self {
        Self {
            primary: JsonParser,
            fallback: None,
        }
    }

    /// Decoder that tries `fallback` when JSON parsing fails
    #[must_use]
    pub fn with_fallback(fallback: impl PayloadParser + 'static) -> Self {
        Self {
            primary: JsonParser,
            fallback: Some(Box::new(fallback)),
        }
    }

    /// Decoder for the configured legacy format
    #[must_use]
    pub fn from_format(format: LegacyPayloadFormat) -> Self {
        match format {
            LegacyPayloadFormat::None => Self::json_only(),
            LegacyPayloadFormat::PythonLiteral => Self::with_fallback(PythonLiteralParser),
        }
    }

    /// Decodes a body, trying the fallback parser at most once
    ///
    /// # Errors
    ///
    /// Returns the JSON error if neither parser accepts the body
    pub fn decode(&self, body: &str) -> Result<Decoded, DecodeError> {
        let primary_err = match self.primary.parse(body) {
            Ok(fields) => {
                return Ok(Decoded {
                    fields,
                    format: PayloadFormat::Json,
                })
            }
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_err);
        };

        match fallback.parse(body) {
            Ok(fields) => {
                tracing::debug!(parser = fallback.name(), "Decoded body with fallback parser");
                Ok(Decoded {
                    fields,
                    format: PayloadFormat::Legacy(fallback.name()),
                })
            }
            Err(fallback_err) => {
                tracing::debug!(
                    parser = fallback.name(),
                    error = %fallback_err,
                    "Fallback parser rejected body"
                );
                Err(primary_err)
            }
        }
    }
}

/// Routing key of a body that is about to be forwarded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteKey {
    /// Declared priority label, unvalidated
    pub priority: Option<String>,
    /// Canonical JSON for legacy bodies, `None` when the body is forwarded as is
    pub canonical: Option<String>,
}

impl TicketDecoder {
    /// Reads only the priority label of a body
    ///
    /// JSON objects are not checked beyond `priority`, so a body with odd
    /// `title` or `description` values still routes. Legacy bodies are fully
    /// parsed and re-encoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the body is not an object in a known format or
    /// its `priority` is not a string
    pub fn decode_route(&self, body: &str) -> Result<RouteKey, DecodeError> {
        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(object)) => {
                let priority = match object.get("priority") {
                    None | Some(serde_json::Value::Null) => None,
                    Some(serde_json::Value::String(label)) => Some(label.clone()),
                    Some(_) => {
                        return Err(DecodeError::InvalidJson(
                            "`priority` must be a string".to_string(),
                        ))
                    }
                };
                Ok(RouteKey {
                    priority,
                    canonical: None,
                })
            }
            Ok(_) => Err(DecodeError::NotAnObject),
            Err(_) => {
                let decoded = self.decode(body)?;
                let canonical = serde_json::to_string(&decoded.fields)
                    .map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
                Ok(RouteKey {
                    priority: decoded.fields.priority,
                    canonical: Some(canonical),
                })
            }
        }
    }
}

impl Default for TicketDecoder {
    fn default() -> Self {
        Self::from_format(LegacyPayloadFormat::default())
    }
}

struct Literal<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Literal<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    const fn error(&self, reason: &'static str) -> DecodeError {
        DecodeError::InvalidLiteral {
            position: self.pos,
            reason,
        }
    }

    fn dict(&mut self) -> Result<Vec<(String, Option<String>)>, DecodeError> {
        self.skip_whitespace();
        if self.bump() != Some('{') {
            return Err(self.error("expected '{'"));
        }

        let mut entries = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek() == Some('}') {
                self.bump();
                break;
            }

            let key = self.string()?;
            self.skip_whitespace();
            if self.bump() != Some(':') {
                return Err(self.error("expected ':'"));
            }
            let value = self.value()?;
            entries.push((key, value));

            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some('}') => break,
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }

        self.skip_whitespace();
        if self.peek().is_some() {
            return Err(self.error("trailing characters"));
        }

        Ok(entries)
    }

    fn value(&mut self) -> Result<Option<String>, DecodeError> {
        self.skip_whitespace();
        if self.src[self.pos..].starts_with("None") {
            self.pos += "None".len();
            return Ok(None);
        }
        self.string().map(Some)
    }

    fn string(&mut self) -> Result<String, DecodeError> {
        self.skip_whitespace();
        let mut raw = false;
        while let Some(prefix @ ('u' | 'U' | 'r' | 'R')) = self.peek() {
            raw |= matches!(prefix, 'r' | 'R');
            self.bump();
        }
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted string")),
        };

        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                // Raw strings keep the backslash and never end on an escaped quote
                Some('\\') if raw => {
                    out.push('\\');
                    match self.bump() {
                        None => return Err(self.error("unterminated string")),
                        Some(c) => out.push(c),
                    }
                }
                Some('\\') => match self.bump() {
                    None => return Err(self.error("unterminated string")),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some('x') => out.push(self.hex_escape(2)?),
                    Some('u') => out.push(self.hex_escape(4)?),
                    Some('U') => out.push(self.hex_escape(8)?),
                    // Unknown escapes are kept verbatim
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, DecodeError> {
        let start = self.pos;
        for _ in 0..digits {
            if !self.bump().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Err(self.error("invalid hex escape"));
            }
        }

        u32::from_str_radix(&self.src[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid hex escape"))
    }
}
