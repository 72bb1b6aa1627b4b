//! Error types for tola-morph.
//!
//! Every error is fatal only to the in-flight morph call. Mutations that were
//! already applied stay applied; nothing is rolled back.

use thiserror::Error;

use crate::attr::Tag;

/// Errors that can occur while morphing a live tree.
#[derive(Debug, Error)]
pub enum MorphError {
    /// The source stream yielded an error
    #[error("stream failed: {0}")]
    Stream(String),

    /// The stream closed while a construct was still open
    #[error("stream ended inside {context}")]
    Truncated {
        /// What was left unterminated (e.g. "start tag", "comment")
        context: &'static str,
    },

    /// Incoming markup could not be parsed
    #[error("parse error: {0}")]
    Parse(#[from] ParseErrorKind),

    /// The pass was cancelled through its `CancelToken`
    #[error("morph cancelled")]
    Cancelled,

    /// Custom element names must contain a hyphen
    #[error("invalid custom element name: {0:?}")]
    InvalidCustomElementName(String),
}

/// Unrecoverable markup problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Fragment bytes are not valid UTF-8
    #[error("invalid UTF-8 at byte {offset}")]
    InvalidUtf8 {
        /// Absolute byte offset into the stream
        offset: usize,
    },

    /// End tag without a matching open element
    #[error("unexpected end tag </{0}>")]
    UnexpectedEndTag(Tag),

    /// Element nesting exceeded `MorphConfig::max_depth`
    #[error("nesting deeper than {0} elements")]
    TooDeep(usize),
}

/// Result type alias for morph operations.
pub type MorphResult<T> = Result<T, MorphError>;

/// Boxed error returned by fallible caller hooks.
pub type PredicateError = Box<dyn std::error::Error + Send + Sync>;

impl MorphError {
    /// Create a stream error from any displayable error.
    pub fn stream(err: impl std::fmt::Display) -> Self {
        Self::Stream(err.to_string())
    }

    /// Create a truncation error.
    pub fn truncated(context: &'static str) -> Self {
        Self::Truncated { context }
    }

    /// Whether this error came from the transport side (stream or truncation).
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Self::Stream(_) | Self::Truncated { .. })
    }

    /// Whether this error came from malformed markup.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}
