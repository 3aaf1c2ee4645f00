use serde::{Deserialize, Serialize};
use serde_json::ser::{CharEscape, Formatter};
use std::io;
use thiserror::Error;

/// Errors surfaced by the runtime client core.
///
/// `UpstreamError` covers transport-level failures (the reason string is
/// `"timeout"` or `"connectionResetByPeer"` for the two recognized kinds,
/// the underlying error's message otherwise) and is the only transient
/// kind; everything else terminates the lifecycle.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unexpected status code: {0}")]
    BadStatusCode(u16),

    #[error("upstream error: {0}")]
    UpstreamError(String),

    #[error("invocation is missing required header: {0}")]
    InvocationMissingHeader(&'static str),

    #[error("response carried no body")]
    NoBody,

    #[error("failed to encode error response: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

// Equality is by tag and content. Encoder errors are opaque, so the
// `JsonEncode` case compares the underlying errors' display strings.
impl PartialEq for RuntimeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::BadStatusCode(a), Self::BadStatusCode(b)) => a == b,
            (Self::UpstreamError(a), Self::UpstreamError(b)) => a == b,
            (Self::InvocationMissingHeader(a), Self::InvocationMissingHeader(b)) => a == b,
            (Self::NoBody, Self::NoBody) => true,
            (Self::JsonEncode(a), Self::JsonEncode(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl Eq for RuntimeError {}

/// Wire classification of a reported failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorType {
    FunctionError,
    InitializationError,
}

/// The body POSTed to the error endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    #[serde(rename = "errorType")]
    pub error_type: ErrorType,
    #[serde(rename = "errorMessage")]
    pub error_message: String,
}

impl ErrorResponse {
    pub fn function_error(message: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::FunctionError,
            error_message: message.into(),
        }
    }

    pub fn initialization_error(message: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::InitializationError,
            error_message: message.into(),
        }
    }

    /// Serializes to the exact wire bytes the Runtime API expects:
    /// `{ "errorType": "<type>", "errorMessage": "<escaped>" }`.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, RuntimeError> {
        let mut buf = Vec::with_capacity(64);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, WireFormatter);
        self.serialize(&mut ser).map_err(RuntimeError::JsonEncode)?;
        Ok(buf)
    }
}

/// Formatter matching the platform's historical error-response shape: a
/// space after `{`, after each `:` and `,`, and before `}`, with control
/// characters outside the short-escape set written as `\u00XX` in
/// uppercase hex. All other code points pass through unescaped.
struct WireFormatter;

impl Formatter for WireFormatter {
    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b"{")
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b" }")
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(if first { b" " } else { b", " })
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let escaped: &[u8] = match char_escape {
            CharEscape::Quote => b"\\\"",
            CharEscape::ReverseSolidus => b"\\\\",
            CharEscape::Solidus => b"/",
            CharEscape::Backspace => b"\\b",
            CharEscape::FormFeed => b"\\f",
            CharEscape::LineFeed => b"\\n",
            CharEscape::CarriageReturn => b"\\r",
            CharEscape::Tab => b"\\t",
            CharEscape::AsciiControl(byte) => {
                const HEX: &[u8; 16] = b"0123456789ABCDEF";
                let buf = [
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[(byte >> 4) as usize],
                    HEX[(byte & 0x0F) as usize],
                ];
                return writer.write_all(&buf);
            }
        };
        writer.write_all(escaped)
    }
}
