use std::io;

use serde::{Serialize, Serializer};

use crate::schema::DefinitionKind;

/// Operational failures of the command-line front end.
#[derive(Debug, thiserror::Error)]
pub enum LdifcheckError {
    #[error("{0}")]
    User(String),

    #[error("cannot read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LdifcheckError>;

// ---------------------------------------------------------------------------
// LDIF diagnostics
// ---------------------------------------------------------------------------

/// A recoverable problem found while parsing an LDIF document.
///
/// `line` is the 1-based physical line on which the offending logical line
/// (or entry block) starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LdifError {
    #[error("line {line}: Could not parse line: {content}")]
    UnparsableLine { line: usize, content: String },

    #[error("line {line}: Invalid Base64 value for {attribute}: {content}")]
    InvalidBase64 {
        line: usize,
        attribute: String,
        content: String,
    },

    #[error("line {line}: entry is missing distinguished name (no dn: line)")]
    MissingDn { line: usize },

    #[error("line {line}: duplicate distinguished name ignored: {content}")]
    DuplicateDn { line: usize, content: String },

    #[error("line {line}: Invalid file format: unsupported LDIF version {version}")]
    InvalidVersion { line: usize, version: String },
}

impl LdifError {
    pub fn line(&self) -> usize {
        match self {
            LdifError::UnparsableLine { line, .. }
            | LdifError::InvalidBase64 { line, .. }
            | LdifError::MissingDn { line }
            | LdifError::DuplicateDn { line, .. }
            | LdifError::InvalidVersion { line, .. } => *line,
        }
    }
}

impl Serialize for LdifError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Schema diagnostics
// ---------------------------------------------------------------------------

/// Why a single schema definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaErrorReason {
    #[error("no opening parenthesis")]
    MissingOpenParen,

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("missing OID")]
    MissingOid,

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unknown keyword {0}")]
    UnknownKeyword(String),

    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("{0} requires a quoted string")]
    ExpectedQuoted(String),

    #[error("{0} has an empty list")]
    EmptyList(String),

    #[error("unterminated {0} list")]
    UnterminatedList(String),

    #[error("duplicate {0} clause")]
    DuplicateClause(String),

    #[error("invalid USAGE {0}")]
    InvalidUsage(String),

    #[error("invalid SYNTAX length in {0}")]
    InvalidSyntaxLength(String),

    #[error("invalid Base64 value")]
    InvalidBase64,
}

/// A schema definition line that could not be parsed. The rest of the
/// document is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: malformed {kind} definition ({reason}): {raw}")]
pub struct SchemaError {
    pub line: usize,
    pub kind: DefinitionKind,
    pub reason: SchemaErrorReason,
    pub raw: String,
}

impl Serialize for SchemaError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepted input that strays from RFC 4512.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaWarning {
    #[error(
        "line {line}: attribute type {oid} lists {} superior types ({}); using {}",
        .superiors.len(),
        .superiors.join(", "),
        first_or_empty(.superiors)
    )]
    MultipleSuperiors {
        line: usize,
        oid: String,
        superiors: Vec<String>,
    },
}

fn first_or_empty(values: &[String]) -> &str {
    values.first().map(String::as_str).unwrap_or_default()
}

impl Serialize for SchemaWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
