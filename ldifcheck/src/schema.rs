//! RFC 4512 schema definition parser.
//!
//! Reads the `attributeTypes:` / `objectClasses:` lines of a subschema
//! subentry dump (as printed by `ldapsearch`) and turns each definition
//! into a [`ParsedAttributeType`] or [`ParsedObjectClass`]. Any other line
//! is ignored. A malformed definition becomes a [`SchemaError`] and the
//! next line is parsed as usual.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{SchemaError, SchemaErrorReason, SchemaWarning};
use crate::ldif::decode_base64;
use crate::lines;

type Reason = SchemaErrorReason;

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    AttributeType,
    ObjectClass,
}

impl DefinitionKind {
    pub fn keyword(self) -> &'static str {
        match self {
            DefinitionKind::AttributeType => "attributeTypes",
            DefinitionKind::ObjectClass => "objectClasses",
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectClassKind {
    Abstract,
    #[default]
    Structural,
    Auxiliary,
}

impl fmt::Display for ObjectClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectClassKind::Abstract => "ABSTRACT",
            ObjectClassKind::Structural => "STRUCTURAL",
            ObjectClassKind::Auxiliary => "AUXILIARY",
        })
    }
}

/// `USAGE` of an attribute type. Absent means userApplications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeUsage {
    #[serde(rename = "userApplications")]
    UserApplications,
    #[serde(rename = "directoryOperation")]
    DirectoryOperation,
    #[serde(rename = "distributedOperation")]
    DistributedOperation,
    #[serde(rename = "dSAOperation")]
    DsaOperation,
}

impl AttributeUsage {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "userApplications" => Some(AttributeUsage::UserApplications),
            "directoryOperation" => Some(AttributeUsage::DirectoryOperation),
            "distributedOperation" => Some(AttributeUsage::DistributedOperation),
            "dSAOperation" => Some(AttributeUsage::DsaOperation),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeUsage::UserApplications => "userApplications",
            AttributeUsage::DirectoryOperation => "directoryOperation",
            AttributeUsage::DistributedOperation => "distributedOperation",
            AttributeUsage::DsaOperation => "dSAOperation",
        }
    }
}

impl fmt::Display for AttributeUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `X-` extension clause such as `X-ORIGIN 'RFC 4519'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedAttributeType {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    pub superior: Option<String>,
    pub equality: Option<String>,
    pub ordering: Option<String>,
    pub substr: Option<String>,
    pub syntax: Option<String>,
    /// Upper bound from `SYNTAX oid{len}`.
    pub syntax_length: Option<u32>,
    pub single_value: bool,
    pub collective: bool,
    pub no_user_modification: bool,
    pub usage: Option<AttributeUsage>,
    pub extensions: Vec<Extension>,
    pub raw: String,
}

impl ParsedAttributeType {
    /// First NAME, or the OID when there is none.
    pub fn name(&self) -> &str {
        self.names.first().map(|s| s.as_str()).unwrap_or(&self.oid)
    }
}

impl fmt::Display for ParsedAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedObjectClass {
    pub oid: String,
    pub names: Vec<String>,
    pub description: Option<String>,
    pub obsolete: bool,
    /// `None` when there is no SUP clause.
    pub superior: Option<Vec<String>>,
    pub kind: ObjectClassKind,
    /// `None` when there is no MUST clause.
    pub must: Option<Vec<String>>,
    /// `None` when there is no MAY clause.
    pub may: Option<Vec<String>>,
    pub extensions: Vec<Extension>,
    pub raw: String,
}

impl ParsedObjectClass {
    pub fn name(&self) -> &str {
        self.names.first().map(|s| s.as_str()).unwrap_or(&self.oid)
    }

    pub fn superiors(&self) -> &[String] {
        self.superior.as_deref().unwrap_or_default()
    }

    pub fn must(&self) -> &[String] {
        self.must.as_deref().unwrap_or_default()
    }

    pub fn may(&self) -> &[String] {
        self.may.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for ParsedObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaParseResult {
    pub attribute_types: Vec<ParsedAttributeType>,
    pub object_classes: Vec<ParsedObjectClass>,
    pub errors: Vec<SchemaError>,
    pub warnings: Vec<SchemaWarning>,
}

impl SchemaParseResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Dollar,
    Quoted(String),
    Bare(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
            Token::Dollar => f.write_str("$"),
            Token::Quoted(s) => write!(f, "'{}'", s),
            Token::Bare(s) => f.write_str(s),
        }
    }
}

/// Tokenizer for the body of an RFC 4512 definition (the text between the
/// outer parentheses).
struct SchemaTokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SchemaTokenizer<'a> {
    fn new(input: &'a str) -> Self {
        SchemaTokenizer { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Read the next token. Returns `Ok(None)` at end of input.
    fn next_token(&mut self) -> Result<Option<Token>, Reason> {
        self.skip_whitespace();
        let mut chars = self.rest().char_indices();
        let Some((_, c)) = chars.next() else {
            return Ok(None);
        };
        match c {
            '(' => {
                self.pos += 1;
                Ok(Some(Token::Open))
            }
            ')' => {
                self.pos += 1;
                Ok(Some(Token::Close))
            }
            '$' => {
                self.pos += 1;
                Ok(Some(Token::Dollar))
            }
            '\'' => {
                self.pos += 1;
                self.read_quoted().map(|s| Some(Token::Quoted(s)))
            }
            _ => {
                let rest = self.rest();
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '$'))
                    .unwrap_or(rest.len());
                self.pos += end;
                Ok(Some(Token::Bare(rest[..end].to_string())))
            }
        }
    }

    /// Read the remainder of a quoted string; the opening quote has been
    /// consumed. `\'`, `\27` and `\5C` are unescaped.
    fn read_quoted(&mut self) -> Result<String, Reason> {
        let rest = self.rest();
        let mut out = String::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\'' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => {
                    let tail = &rest[i + 1..];
                    if tail.starts_with('\'') {
                        out.push('\'');
                        chars.next();
                    } else if tail.starts_with("27") {
                        out.push('\'');
                        chars.next();
                        chars.next();
                    } else if tail.starts_with("5C") || tail.starts_with("5c") {
                        out.push('\\');
                        chars.next();
                        chars.next();
                    } else {
                        out.push('\\');
                    }
                }
                _ => out.push(c),
            }
        }
        Err(Reason::UnterminatedString)
    }

    fn peek_token(&mut self) -> Result<Option<Token>, Reason> {
        let saved = self.pos;
        let token = self.next_token();
        self.pos = saved;
        token
    }

    /// A single bare or quoted value.
    fn read_value(&mut self, keyword: &str) -> Result<String, Reason> {
        match self.next_token()? {
            Some(Token::Bare(s)) | Some(Token::Quoted(s)) => Ok(s),
            None | Some(Token::Close) => Err(Reason::MissingValue(keyword.to_string())),
            Some(other) => Err(Reason::UnexpectedToken(other.to_string())),
        }
    }

    /// A single quoted string.
    fn read_quoted_value(&mut self, keyword: &str) -> Result<String, Reason> {
        match self.next_token()? {
            Some(Token::Quoted(s)) => Ok(s),
            None => Err(Reason::MissingValue(keyword.to_string())),
            Some(_) => Err(Reason::ExpectedQuoted(keyword.to_string())),
        }
    }

    /// Either a single value or `( val1 $ val2 ... )`. `$` separators are
    /// optional so that space-separated qdescrs lists are accepted too.
    fn read_list(&mut self, keyword: &str) -> Result<Vec<String>, Reason> {
        if self.peek_token()? != Some(Token::Open) {
            return Ok(vec![self.read_value(keyword)?]);
        }
        self.next_token()?;

        let mut result = Vec::new();
        let mut expect_value = true;
        loop {
            match self.next_token()? {
                Some(Token::Close) if !expect_value || result.is_empty() => break,
                Some(Token::Bare(s)) | Some(Token::Quoted(s)) => {
                    result.push(s);
                    expect_value = false;
                }
                Some(Token::Dollar) if !expect_value => expect_value = true,
                Some(other) => return Err(Reason::UnexpectedToken(other.to_string())),
                None => return Err(Reason::UnterminatedList(keyword.to_string())),
            }
        }

        if result.is_empty() {
            return Err(Reason::EmptyList(keyword.to_string()));
        }
        Ok(result)
    }
}

/// The text between the first `(` of `definition` and its matching `)`.
/// Parentheses inside single-quoted strings are not counted.
fn extract_body(definition: &str) -> Result<&str, Reason> {
    let start = definition.find('(').ok_or(Reason::MissingOpenParen)?;
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;

    for (i, c) in definition[start..].char_indices() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '\'' => in_quote = false,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' => in_quote = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&definition[start + 1..start + i]);
                }
            }
            _ => {}
        }
    }
    Err(Reason::UnbalancedParens)
}

/// Split `1.3.6.1.4.1.1466.115.121.1.15{256}` into OID and length bound.
fn split_syntax(value: &str) -> Result<(String, Option<u32>), Reason> {
    let Some(open) = value.find('{') else {
        return Ok((value.to_string(), None));
    };
    let bound = value[open + 1..]
        .strip_suffix('}')
        .and_then(|n| n.parse::<u32>().ok())
        .ok_or_else(|| Reason::InvalidSyntaxLength(value.to_string()))?;
    Ok((value[..open].to_string(), Some(bound)))
}

fn is_keyword(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_uppercase() || c == '-')
}

/// Read the OID that opens every definition body.
fn read_oid(tok: &mut SchemaTokenizer<'_>) -> Result<String, Reason> {
    match tok.next_token()? {
        Some(Token::Bare(s)) if !is_keyword(&s) => Ok(s),
        _ => Err(Reason::MissingOid),
    }
}

/// Next clause keyword, or `None` at the end of the body.
fn read_keyword(
    tok: &mut SchemaTokenizer<'_>,
    seen: &mut HashSet<String>,
) -> Result<Option<String>, Reason> {
    let keyword = match tok.next_token()? {
        None => return Ok(None),
        Some(Token::Bare(k)) => k,
        Some(other) => return Err(Reason::UnexpectedToken(other.to_string())),
    };
    // The three kind flags share one slot.
    let slot = match keyword.as_str() {
        "ABSTRACT" | "STRUCTURAL" | "AUXILIARY" => "kind".to_string(),
        _ => keyword.clone(),
    };
    if !seen.insert(slot) {
        return Err(Reason::DuplicateClause(keyword));
    }
    Ok(Some(keyword))
}

// ---------------------------------------------------------------------------
// Definition parsers
// ---------------------------------------------------------------------------

/// Parse an attribute type body. Also returns the full SUP list so the
/// caller can note more than one superior.
fn attribute_type_from_definition(
    definition: &str,
) -> Result<(ParsedAttributeType, Vec<String>), Reason> {
    let mut tok = SchemaTokenizer::new(extract_body(definition)?);
    let mut at = ParsedAttributeType {
        oid: read_oid(&mut tok)?,
        raw: definition.to_string(),
        ..Default::default()
    };
    let mut superiors = Vec::new();
    let mut seen = HashSet::new();

    while let Some(keyword) = read_keyword(&mut tok, &mut seen)? {
        match keyword.as_str() {
            "NAME" => at.names = tok.read_list(&keyword)?,
            "DESC" => at.description = Some(tok.read_quoted_value(&keyword)?),
            "OBSOLETE" => at.obsolete = true,
            "SUP" => {
                superiors = tok.read_list(&keyword)?;
                at.superior = superiors.first().cloned();
            }
            "EQUALITY" => at.equality = Some(tok.read_value(&keyword)?),
            "ORDERING" => at.ordering = Some(tok.read_value(&keyword)?),
            "SUBSTR" => at.substr = Some(tok.read_value(&keyword)?),
            "SYNTAX" => {
                let (oid, length) = split_syntax(&tok.read_value(&keyword)?)?;
                at.syntax = Some(oid);
                at.syntax_length = length;
            }
            "SINGLE-VALUE" => at.single_value = true,
            "COLLECTIVE" => at.collective = true,
            "NO-USER-MODIFICATION" => at.no_user_modification = true,
            "USAGE" => {
                let value = tok.read_value(&keyword)?;
                at.usage = Some(
                    AttributeUsage::from_keyword(&value).ok_or(Reason::InvalidUsage(value))?,
                );
            }
            k if k.starts_with("X-") => at.extensions.push(Extension {
                values: tok.read_list(k)?,
                name: keyword,
            }),
            _ => return Err(Reason::UnknownKeyword(keyword)),
        }
    }

    Ok((at, superiors))
}

fn object_class_from_definition(definition: &str) -> Result<ParsedObjectClass, Reason> {
    let mut tok = SchemaTokenizer::new(extract_body(definition)?);
    let mut oc = ParsedObjectClass {
        oid: read_oid(&mut tok)?,
        raw: definition.to_string(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    while let Some(keyword) = read_keyword(&mut tok, &mut seen)? {
        match keyword.as_str() {
            "NAME" => oc.names = tok.read_list(&keyword)?,
            "DESC" => oc.description = Some(tok.read_quoted_value(&keyword)?),
            "OBSOLETE" => oc.obsolete = true,
            "SUP" => oc.superior = Some(tok.read_list(&keyword)?),
            "ABSTRACT" => oc.kind = ObjectClassKind::Abstract,
            "STRUCTURAL" => oc.kind = ObjectClassKind::Structural,
            "AUXILIARY" => oc.kind = ObjectClassKind::Auxiliary,
            "MUST" => oc.must = Some(tok.read_list(&keyword)?),
            "MAY" => oc.may = Some(tok.read_list(&keyword)?),
            k if k.starts_with("X-") => oc.extensions.push(Extension {
                values: tok.read_list(k)?,
                name: keyword,
            }),
            _ => return Err(Reason::UnknownKeyword(keyword)),
        }
    }

    Ok(oc)
}

/// Parse a single RFC 4512 AttributeTypeDescription, e.g.
/// `( 2.5.4.3 NAME 'cn' SUP name )`.
pub fn parse_attribute_type(definition: &str) -> Result<ParsedAttributeType, SchemaErrorReason> {
    attribute_type_from_definition(definition.trim()).map(|(at, _)| at)
}

/// Parse a single RFC 4512 ObjectClassDescription.
pub fn parse_object_class(definition: &str) -> Result<ParsedObjectClass, SchemaErrorReason> {
    object_class_from_definition(definition.trim())
}

// ---------------------------------------------------------------------------
// Document parser
// ---------------------------------------------------------------------------

/// Recognise `attributeTypes: ...` / `objectClasses:: ...` and return the
/// kind, the value text and whether it is base64-encoded.
fn match_definition_line(text: &str) -> Option<(DefinitionKind, &str, bool)> {
    let trimmed = text.trim_start();
    [DefinitionKind::AttributeType, DefinitionKind::ObjectClass]
        .into_iter()
        .find_map(|kind| {
            let rest = trimmed.strip_prefix(kind.keyword())?.trim_start();
            match rest.strip_prefix("::") {
                Some(value) => Some((kind, value, true)),
                None => rest.strip_prefix(':').map(|value| (kind, value, false)),
            }
        })
}

/// Parse a schema dump. Never fails; see [`SchemaParseResult::errors`].
pub fn parse_ldap_schema(text: &str) -> SchemaParseResult {
    let mut result = SchemaParseResult::default();

    for line in lines::read_lines(text) {
        let Some((kind, value, encoded)) = match_definition_line(&line.text) else {
            continue;
        };

        let decoded;
        let definition = if encoded {
            match decode_base64(value) {
                Some(text) => {
                    decoded = text;
                    decoded.trim()
                }
                None => {
                    result.errors.push(SchemaError {
                        line: line.number,
                        kind,
                        reason: Reason::InvalidBase64,
                        raw: value.trim().to_string(),
                    });
                    continue;
                }
            }
        } else {
            value.trim()
        };

        let outcome = match kind {
            DefinitionKind::AttributeType => {
                attribute_type_from_definition(definition).map(|(at, superiors)| {
                    if superiors.len() > 1 {
                        result.warnings.push(SchemaWarning::MultipleSuperiors {
                            line: line.number,
                            oid: at.oid.clone(),
                            superiors,
                        });
                    }
                    result.attribute_types.push(at);
                })
            }
            DefinitionKind::ObjectClass => {
                object_class_from_definition(definition).map(|oc| result.object_classes.push(oc))
            }
        };

        if let Err(reason) = outcome {
            trace!(line = line.number, %kind, %reason, "rejected schema definition");
            result.errors.push(SchemaError {
                line: line.number,
                kind,
                reason,
                raw: definition.to_string(),
            });
        }
    }

    debug!(
        attribute_types = result.attribute_types.len(),
        object_classes = result.object_classes.len(),
        errors = result.errors.len(),
        "parsed schema"
    );
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
