//! LDIF parser.
//!
//! Reads RFC 2849 attrval records from a string. Entries are separated by
//! blank lines; attribute lines are `name[;option]*: value`,
//! `name[;option]*:: base64` or `name[;option]*:< url`. Problems are
//! collected as [`LdifError`]s and parsing carries on with the next line.

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::LdifError;
use crate::lines::{self, Line};

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// All values of one attribute within an entry, merged case-insensitively
/// across options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LdifAttribute {
    /// Lowercased bare name; the merge key.
    #[serde(skip)]
    pub key: String,
    /// Name as first written.
    pub name: String,
    /// Options of the first occurrence.
    pub options: Vec<String>,
    /// Values as text; non-UTF-8 payloads are converted lossily.
    pub values: Vec<String>,
    /// Decoded bytes of each value, parallel to `values`.
    #[serde(skip)]
    pub bytes: Vec<Vec<u8>>,
    /// Source line of each value.
    pub raw_lines: Vec<String>,
}

impl LdifAttribute {
    fn new(name: &str, options: &[&str]) -> Self {
        LdifAttribute {
            key: name.to_ascii_lowercase(),
            name: name.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            values: Vec::new(),
            bytes: Vec::new(),
            raw_lines: Vec::new(),
        }
    }

    fn append_value(&mut self, value: Vec<u8>, raw: &str) {
        self.values.push(String::from_utf8_lossy(&value).into_owned());
        self.bytes.push(value);
        self.raw_lines.push(raw.to_string());
    }

    /// Name with the first occurrence's options, e.g. `cn;lang-en`.
    pub fn descriptor(&self) -> String {
        let mut ad = self.name.clone();
        for option in &self.options {
            ad.push(';');
            ad.push_str(option);
        }
        ad
    }
}

/// An LDAP entry as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LdifEntry {
    pub dn: String,
    /// Attributes in first-seen order.
    pub attributes: Vec<LdifAttribute>,
    /// Unfolded source lines of the entry.
    pub lines: Vec<String>,
}

impl LdifEntry {
    fn new(dn: String, attributes: Vec<LdifAttribute>, lines: Vec<String>) -> Self {
        LdifEntry {
            dn,
            attributes,
            lines,
        }
    }

    /// Case-insensitive lookup by bare attribute name.
    pub fn attribute(&self, name: &str) -> Option<&LdifAttribute> {
        let key = name.to_ascii_lowercase();
        self.attributes.iter().find(|a| a.key == key)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Values of `objectClass`, trimmed, in document order.
    pub fn object_classes(&self) -> Vec<&str> {
        self.attribute("objectclass")
            .map(|a| a.values.iter().map(|v| v.trim()).collect())
            .unwrap_or_default()
    }

    /// The `changetype:` value, if this is a change record.
    pub fn change_type(&self) -> Option<&str> {
        self.attribute("changetype")
            .and_then(|a| a.values.first())
            .map(|v| v.trim())
    }
}

/// Everything recovered from one LDIF document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LdifParseResult {
    pub entries: Vec<LdifEntry>,
    pub errors: Vec<LdifError>,
}

impl LdifParseResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Attribute lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// `name: value`
    Plain,
    /// `name:: base64`
    Base64,
    /// `name:< url`, kept verbatim.
    Url,
}

/// A syntactically valid `name[;option]*:value` line.
#[derive(Debug)]
struct AttrLine<'a> {
    name: &'a str,
    options: Vec<&'a str>,
    encoding: Encoding,
    value: &'a str,
}

fn is_descriptor(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-')
}

/// `2.5.4.3` style attribute type OID.
fn is_numeric_oid(s: &str) -> bool {
    s.split('.')
        .all(|arc| !arc.is_empty() && arc.bytes().all(|c| c.is_ascii_digit()))
}

impl<'a> AttrLine<'a> {
    fn parse(text: &'a str) -> Option<Self> {
        let colon = text.find(':')?;
        let mut parts = text[..colon].split(';');
        let name = parts.next()?;
        if !is_descriptor(name) && !is_numeric_oid(name) {
            return None;
        }
        let options: Vec<&str> = parts.collect();
        if !options.iter().all(|o| is_descriptor(o)) {
            return None;
        }

        let rest = &text[colon + 1..];
        let (encoding, value) = if let Some(b64) = rest.strip_prefix(':') {
            (Encoding::Base64, b64.trim())
        } else if let Some(url) = rest.strip_prefix('<') {
            (Encoding::Url, url.trim())
        } else {
            (Encoding::Plain, rest.strip_prefix(' ').unwrap_or(rest))
        };

        Some(AttrLine {
            name,
            options,
            encoding,
            value,
        })
    }

    /// Decoded value; `None` when a base64 value does not decode.
    fn decode(&self) -> Option<Vec<u8>> {
        match self.encoding {
            Encoding::Plain | Encoding::Url => Some(self.value.as_bytes().to_vec()),
            Encoding::Base64 => decode_base64_bytes(self.value),
        }
    }
}

/// Decode base64 text, ignoring embedded whitespace.
fn decode_base64_bytes(text: &str) -> Option<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    general_purpose::STANDARD.decode(compact).ok()
}

/// Like [`decode_base64_bytes`], converting non-UTF-8 payloads lossily.
pub(crate) fn decode_base64(text: &str) -> Option<String> {
    let bytes = decode_base64_bytes(text)?;
    Some(match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse an LDIF document. Never fails; see [`LdifParseResult::errors`].
pub fn parse_ldif(text: &str) -> LdifParseResult {
    let lines = lines::read_lines(text);
    let mut result = LdifParseResult::default();

    for (i, block) in lines::blocks(&lines).into_iter().enumerate() {
        let block = if i == 0 {
            skip_version(block, &mut result.errors)
        } else {
            block
        };
        if block.is_empty() {
            continue;
        }
        if let Some(entry) = parse_block(block, &mut result.errors) {
            result.entries.push(entry);
        }
    }

    debug!(
        entries = result.entries.len(),
        errors = result.errors.len(),
        "parsed LDIF document"
    );
    result
}

/// Consume a leading `version:` line. Only version 1 exists.
fn skip_version<'b>(block: &'b [Line], errors: &mut Vec<LdifError>) -> &'b [Line] {
    let Some(first) = block.first() else {
        return block;
    };
    match AttrLine::parse(&first.text) {
        Some(line) if line.name.eq_ignore_ascii_case("version") => {
            let version = line.value.trim();
            if version != "1" {
                trace!(line = first.number, version, "unsupported LDIF version");
                errors.push(LdifError::InvalidVersion {
                    line: first.number,
                    version: version.to_string(),
                });
            }
            &block[1..]
        }
        _ => block,
    }
}

/// Parse one blank-line-delimited block. Returns `None` if it has no DN.
fn parse_block(block: &[Line], errors: &mut Vec<LdifError>) -> Option<LdifEntry> {
    let mut dn: Option<String> = None;
    let mut attributes: Vec<LdifAttribute> = Vec::new();
    let mut raw = Vec::with_capacity(block.len());

    for line in block {
        raw.push(line.text.clone());

        // Separator between modify operations.
        if line.text == "-" {
            continue;
        }

        let Some(parsed) = AttrLine::parse(&line.text) else {
            trace!(line = line.number, "could not parse line");
            errors.push(LdifError::UnparsableLine {
                line: line.number,
                content: line.text.clone(),
            });
            continue;
        };

        let Some(value) = parsed.decode() else {
            trace!(line = line.number, attribute = parsed.name, "invalid base64");
            errors.push(LdifError::InvalidBase64 {
                line: line.number,
                attribute: parsed.name.to_string(),
                content: line.text.clone(),
            });
            continue;
        };

        if parsed.name.eq_ignore_ascii_case("dn") {
            if dn.is_some() {
                errors.push(LdifError::DuplicateDn {
                    line: line.number,
                    content: line.text.clone(),
                });
            } else {
                dn = Some(String::from_utf8_lossy(&value).into_owned());
            }
            continue;
        }

        let key = parsed.name.to_ascii_lowercase();
        let idx = match attributes.iter().position(|a| a.key == key) {
            Some(idx) => idx,
            None => {
                attributes.push(LdifAttribute::new(parsed.name, &parsed.options));
                attributes.len() - 1
            }
        };
        attributes[idx].append_value(value, &line.text);
    }

    match dn {
        Some(dn) => Some(LdifEntry::new(dn, attributes, raw)),
        None => {
            let line = block.first().map(|l| l.number).unwrap_or(0);
            trace!(line, "entry without dn");
            errors.push(LdifError::MissingDn { line });
            None
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    fn single(text: &str) -> LdifEntry {
        let result = parse_ldif(text);
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.entries.len(), 1);
        result.entries.into_iter().next().unwrap()
    }

    // ── Group 1: empty input ────────────────────────────────────────────

    #[test]
    fn empty_input() {
        let result = parse_ldif("");
        assert!(result.entries.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn whitespace_only_input() {
        let result = parse_ldif("  \n\n\t\n   ");
        assert!(result.entries.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn comments_only_input() {
        let result = parse_ldif("# nothing here\n# at all\n");
        assert!(result.entries.is_empty());
        assert!(result.errors.is_empty());
    }

    // ── Group 2: simple records ─────────────────────────────────────────

    #[test]
    fn read_simple_entry() {
        let entry = single(
            "dn: cn=foo,dc=example,dc=com\n\
             cn: foo\n\
             sn: bar\n",
        );
        assert_eq!(entry.dn, "cn=foo,dc=example,dc=com");
        assert_eq!(entry.attributes.len(), 2);
        assert_eq!(entry.attribute("cn").unwrap().values, vec!["foo"]);
        assert_eq!(entry.attribute("sn").unwrap().values, vec!["bar"]);
        assert_eq!(entry.lines.len(), 3);
    }

    #[test]
    fn distinct_attribute_count() {
        let entry = single(
            "dn: uid=jdoe,dc=example,dc=com\n\
             objectClass: top\n\
             objectClass: person\n\
             cn: John Doe\n\
             sn: Doe\n\
             mail: jdoe@example.com\n",
        );
        assert_eq!(entry.attributes.len(), 4);
        assert_eq!(entry.object_classes(), vec!["top", "person"]);
    }

    #[test]
    fn multi_valued_attribute_in_order() {
        let entry = single("dn: cn=foo\ncn: foo\nmail: a\ncn: bar\n");
        let cn = entry.attribute("cn").unwrap();
        assert_eq!(cn.values, vec!["foo", "bar"]);
        assert_eq!(cn.raw_lines, vec!["cn: foo", "cn: bar"]);
    }

    #[test]
    fn empty_value() {
        let entry = single("dn: cn=foo\ndescription:\n");
        assert_eq!(entry.attribute("description").unwrap().values, vec![""]);
    }

    #[test]
    fn only_one_space_after_colon_stripped() {
        let entry = single("dn: cn=foo\ndescription:   padded\n");
        assert_eq!(
            entry.attribute("description").unwrap().values,
            vec!["  padded"]
        );
    }

    #[test]
    fn value_without_space_after_colon() {
        let entry = single("dn: cn=foo\ncn:foo\n");
        assert_eq!(entry.attribute("cn").unwrap().values, vec!["foo"]);
    }

    #[test]
    fn sequential_entries() {
        let result = parse_ldif(
            "dn: cn=a,dc=example,dc=com\n\
             cn: a\n\
             \n\
             \n\
             dn: cn=b,dc=example,dc=com\n\
             cn: b\n",
        );
        assert!(result.errors.is_empty());
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].dn, "cn=a,dc=example,dc=com");
        assert_eq!(result.entries[1].dn, "cn=b,dc=example,dc=com");
    }

    #[test]
    fn escaped_comma_in_dn_preserved() {
        let entry = single("dn: cn=Doe\\, John,dc=example,dc=com\ncn: Doe, John\n");
        assert_eq!(entry.dn, "cn=Doe\\, John,dc=example,dc=com");
    }

    #[test]
    fn dn_only_entry() {
        let entry = single("dn: dc=example,dc=com\n");
        assert!(entry.attributes.is_empty());
    }

    // ── Group 3: case-insensitive merge and options ────────────────────

    #[test]
    fn case_insensitive_merge_keeps_first_casing() {
        let entry = single(
            "dn: cn=foo\n\
             givenName: John\n\
             GIVENNAME: A\n\
             GivenName: B\n",
        );
        assert_eq!(entry.attributes.len(), 1);
        let attr = entry.attribute("givenname").unwrap();
        assert_eq!(attr.name, "givenName");
        assert_eq!(attr.values, vec!["John", "A", "B"]);
    }

    #[test]
    fn options_merge_into_bare_name() {
        let entry = single(
            "dn: cn=foo\n\
             cn;lang-en: Foo\n\
             cn: foo\n\
             CN;lang-de;x-alt: Fuu\n",
        );
        assert_eq!(entry.attributes.len(), 1);
        let cn = entry.attribute("CN").unwrap();
        assert_eq!(cn.name, "cn");
        assert_eq!(cn.options, vec!["lang-en"]);
        assert_eq!(cn.values, vec!["Foo", "foo", "Fuu"]);
        assert_eq!(cn.descriptor(), "cn;lang-en");
    }

    #[test]
    fn numeric_oid_attribute_name() {
        let entry = single("dn: cn=foo\n2.5.4.3: x\n2.5.4.3;lang-en: y\n");
        let attr = entry.attribute("2.5.4.3").unwrap();
        assert_eq!(attr.values, vec!["x", "y"]);
        assert_eq!(attr.options, Vec::<String>::new());
    }

    #[test]
    fn malformed_numeric_oid_rejected() {
        let result = parse_ldif("dn: cn=foo\n2..5: x\n2.5.: y\n.2: z\n");
        assert_eq!(result.errors.len(), 3);
        assert!(result.entries[0].attributes.is_empty());
    }

    // ── Group 4: base64 ─────────────────────────────────────────────────

    #[test]
    fn base64_value_decoded() {
        // "Hello, World!"
        let entry = single("dn: cn=foo\ndescription:: SGVsbG8sIFdvcmxkIQ==\n");
        assert_eq!(
            entry.attribute("description").unwrap().values,
            vec!["Hello, World!"]
        );
    }

    #[test]
    fn base64_utf8_value() {
        let encoded = general_purpose::STANDARD.encode("Jürgen Müller");
        let entry = single(&format!("dn: cn=foo\ncn:: {}\n", encoded));
        assert_eq!(entry.attribute("cn").unwrap().values, vec!["Jürgen Müller"]);
    }

    #[test]
    fn base64_dn() {
        let encoded = general_purpose::STANDARD.encode("cn=Müller,dc=example,dc=com");
        let entry = single(&format!("dn:: {}\ncn: x\n", encoded));
        assert_eq!(entry.dn, "cn=Müller,dc=example,dc=com");
    }

    #[test]
    fn folded_base64_value() {
        let entry = single("dn: cn=foo\ndescription:: SGVsbG8s\n IFdvcmxkIQ==\n");
        assert_eq!(
            entry.attribute("description").unwrap().values,
            vec!["Hello, World!"]
        );
    }

    #[test]
    fn binary_value_bytes_kept() {
        let entry = single("dn: cn=foo\njpegPhoto:: /9j/4AAQ\n");
        let photo = entry.attribute("jpegphoto").unwrap();
        assert_eq!(photo.bytes, vec![vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10]]);
        assert_eq!(photo.values.len(), 1);
        assert!(photo.values[0].contains('\u{fffd}'));
    }

    #[test]
    fn text_value_bytes_match_values() {
        let entry = single("dn: cn=foo\ncn: foo\ncn:: YmFy\n");
        let cn = entry.attribute("cn").unwrap();
        assert_eq!(cn.bytes, vec![b"foo".to_vec(), b"bar".to_vec()]);
    }

    #[test]
    fn invalid_base64_reported_entry_kept() {
        let result = parse_ldif("dn: cn=foo\ncn: foo\njpegPhoto:: !!!notbase64\nsn: bar\n");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0],
            LdifError::InvalidBase64 { line: 3, .. }
        ));
        let entry = &result.entries[0];
        assert!(entry.has_attribute("sn"));
        assert!(!entry.has_attribute("jpegPhoto"));
    }

    // ── Group 5: folding and comments ───────────────────────────────────

    #[test]
    fn folded_dn() {
        let entry = single("dn: cn=foo,dc=exam\n ple,dc=com\ncn: foo\n");
        assert_eq!(entry.dn, "cn=foo,dc=example,dc=com");
    }

    #[test]
    fn folded_value_same_as_unfolded() {
        let folded = single("dn: cn=foo\ndescription: a long val\n ue here\n");
        let flat = single("dn: cn=foo\ndescription: a long value here\n");
        assert_eq!(
            folded.attribute("description").unwrap().values,
            flat.attribute("description").unwrap().values
        );
    }

    #[test]
    fn comments_inside_entry_skipped() {
        let entry = single(
            "# leading\n\
             dn: cn=foo\n\
             # inside\n\
             cn: foo\n",
        );
        assert_eq!(entry.attributes.len(), 1);
    }

    #[test]
    fn crlf_line_endings() {
        let entry = single("dn: cn=foo\r\ncn: foo\r\n\r\n");
        assert_eq!(entry.attribute("cn").unwrap().values, vec!["foo"]);
    }

    // ── Group 6: errors ─────────────────────────────────────────────────

    #[test]
    fn missing_dn_block_skipped() {
        let result = parse_ldif("cn: foo\nsn: bar\n");
        assert!(result.entries.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].to_string().contains("distinguished name"));
    }

    #[test]
    fn missing_dn_does_not_hide_other_entries() {
        let result = parse_ldif("dn: cn=a\ncn: a\n\ncn: orphan\n\ndn: cn=b\ncn: b\n");
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.errors, vec![LdifError::MissingDn { line: 4 }]);
    }

    #[test]
    fn line_without_colon() {
        let result = parse_ldif("dn: cn=foo\ncn: foo\nthis is garbage\nsn: bar\n");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.errors.len(), 1);
        let msg = result.errors[0].to_string();
        assert!(msg.contains("Could not parse line"));
        assert!(msg.contains("this is garbage"));
        assert!(result.entries[0].has_attribute("sn"));
    }

    #[test]
    fn invalid_attribute_name() {
        let result = parse_ldif("dn: cn=foo\nbad name: x\ncn_x: y\n");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn duplicate_dn_keeps_first() {
        let result = parse_ldif("dn: cn=a\ndn: cn=b\ncn: a\n");
        assert_eq!(result.entries[0].dn, "cn=a");
        assert!(matches!(
            result.errors[0],
            LdifError::DuplicateDn { line: 2, .. }
        ));
    }

    #[test]
    fn null_byte_passes_through() {
        let entry = single("dn: cn=foo\ncn: a\0b\n");
        assert_eq!(entry.attribute("cn").unwrap().values, vec!["a\0b"]);
    }

    // ── Group 7: version line and change records ────────────────────────

    #[test]
    fn version_line_consumed() {
        let result = parse_ldif("version: 1\n\ndn: cn=foo\ncn: foo\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.entries.len(), 1);
    }

    #[test]
    fn version_line_in_first_block() {
        let entry = single("version: 1\ndn: cn=foo\ncn: foo\n");
        assert!(!entry.has_attribute("version"));
    }

    #[test]
    fn invalid_version_number() {
        let result = parse_ldif("version: 2\ndn: cn=foo\ncn: foo\n");
        assert_eq!(result.entries.len(), 1);
        assert!(matches!(
            result.errors[0],
            LdifError::InvalidVersion { line: 1, .. }
        ));
    }

    #[test]
    fn modify_record() {
        let entry = single(
            "dn: cn=foo,dc=example,dc=com\n\
             changetype: modify\n\
             add: mail\n\
             mail: foo@example.com\n\
             -\n\
             delete: telephoneNumber\n\
             -\n",
        );
        assert_eq!(entry.change_type(), Some("modify"));
        assert_eq!(entry.attribute("mail").unwrap().values, vec!["foo@example.com"]);
        assert_eq!(entry.lines.len(), 7);
    }

    #[test]
    fn url_value_kept_verbatim() {
        let entry = single("dn: cn=foo\njpegPhoto:< file:///tmp/photo.jpg\n");
        assert_eq!(
            entry.attribute("jpegPhoto").unwrap().values,
            vec!["file:///tmp/photo.jpg"]
        );
    }

    // ── Group 8: determinism ────────────────────────────────────────────

    #[test]
    fn parse_is_idempotent() {
        let text = "dn: cn=a\ncn: a\nbogus\n\ncn: x\n";
        assert_eq!(parse_ldif(text), parse_ldif(text));
    }
}
