//! Output formatting.
//!
//! Prints parsed entries back as LDIF (optionally annotated with validation
//! findings), schema summaries and diagnostic lists.

use std::fmt::Display;
use std::io::{self, Write};

use base64::{engine::general_purpose, Engine as _};

use crate::ldif::{LdifEntry, LdifParseResult};
use crate::schema::{ParsedAttributeType, ParsedObjectClass, SchemaParseResult};
use crate::validate::{is_control_attribute, ValidationResult};

/// Column at which base64 output is folded.
const FOLD_WIDTH: usize = 76;

// ---------------------------------------------------------------------------
// LDIF value helpers
// ---------------------------------------------------------------------------

/// Check if the value can be printed as an LDIF SAFE-STRING:
/// no leading space/colon/less-than, no trailing space, no null/CR/LF/non-ASCII bytes.
fn safe_string_p(data: &[u8]) -> bool {
    let (Some(&first), Some(&last)) = (data.first(), data.last()) else {
        return true;
    };
    if first == b' ' || first == b':' || first == b'<' || last == b' ' {
        return false;
    }
    data.iter()
        .all(|&c| c != 0 && c != b'\r' && c != b'\n' && c < 0x80)
}

/// Write `data` as base64, folding with newline + space every 76 characters.
fn print_base64(w: &mut dyn Write, data: &[u8]) -> io::Result<()> {
    let encoded = general_purpose::STANDARD.encode(data);
    for (i, chunk) in encoded.as_bytes().chunks(FOLD_WIDTH).enumerate() {
        if i > 0 {
            w.write_all(b"\n ")?;
        }
        w.write_all(chunk)?;
    }
    Ok(())
}

/// Write an LDIF attribute line: `ad: value\n` or `ad:: base64\n`.
fn print_ldif_line(w: &mut dyn Write, ad: &str, data: &[u8]) -> io::Result<()> {
    w.write_all(ad.as_bytes())?;
    if safe_string_p(data) {
        w.write_all(b": ")?;
        w.write_all(data)?;
    } else {
        w.write_all(b":: ")?;
        print_base64(w, data)?;
    }
    w.write_all(b"\n")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Print an entry in LDIF format, followed by a blank line.
pub fn print_ldif_entry(w: &mut dyn Write, entry: &LdifEntry) -> io::Result<()> {
    print_ldif_line(w, "dn", entry.dn.as_bytes())?;
    for attr in &entry.attributes {
        let ad = attr.descriptor();
        for value in &attr.bytes {
            print_ldif_line(w, &ad, value)?;
        }
    }
    w.write_all(b"\n")?;
    Ok(())
}

/// Print an entry in LDIF format with `# WARNING:` comments for every
/// validation finding that concerns it.
pub fn print_ldif_entry_annotated(
    w: &mut dyn Write,
    entry: &LdifEntry,
    findings: &ValidationResult,
) -> io::Result<()> {
    print_ldif_line(w, "dn", entry.dn.as_bytes())?;

    if findings.missing_structural.iter().any(|dn| *dn == entry.dn) {
        write!(w, "# WARNING: no structural object class\n")?;
    }
    for missing in findings.missing_required.iter().filter(|m| m.dn == entry.dn) {
        for attr in &missing.attributes {
            write!(
                w,
                "# WARNING: required attribute not shown: {} (objectClass {})\n",
                attr, missing.object_class
            )?;
        }
    }
    for class in entry.object_classes() {
        if findings
            .unknown_object_classes
            .contains(&class.to_ascii_lowercase())
        {
            write!(w, "# WARNING: unknown objectClass: {}\n", class)?;
        }
    }

    let disallowed: Vec<&String> = findings
        .disallowed_attributes
        .iter()
        .filter(|d| d.dn == entry.dn)
        .flat_map(|d| d.attributes.iter())
        .collect();

    for attr in &entry.attributes {
        if !is_control_attribute(&attr.key) && findings.unknown_attributes.contains(&attr.key) {
            write!(w, "# WARNING: unknown attributeType: {}\n", attr.name)?;
        } else if disallowed.iter().any(|d| **d == attr.name) {
            write!(w, "# WARNING: {} not allowed by schema\n", attr.name)?;
        }
        let ad = attr.descriptor();
        for value in &attr.bytes {
            print_ldif_line(w, &ad, value)?;
        }
    }
    w.write_all(b"\n")?;
    Ok(())
}

/// Print all entries of `result`, annotated when `findings` is given.
pub fn print_entries(
    w: &mut dyn Write,
    result: &LdifParseResult,
    findings: Option<&ValidationResult>,
) -> io::Result<()> {
    for entry in &result.entries {
        match findings {
            Some(findings) => print_ldif_entry_annotated(w, entry, findings)?,
            None => print_ldif_entry(w, entry)?,
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

fn print_names(w: &mut dyn Write, oid: &str, names: &[String]) -> io::Result<()> {
    write!(w, "{}", oid)?;
    if !names.is_empty() {
        write!(w, " {}", names.join(" | "))?;
    }
    Ok(())
}

/// One summary line for an attribute type.
pub fn print_attribute_type(w: &mut dyn Write, at: &ParsedAttributeType) -> io::Result<()> {
    w.write_all(b"attributeType ")?;
    print_names(w, &at.oid, &at.names)?;

    let mut details: Vec<String> = Vec::new();
    if let Some(sup) = &at.superior {
        details.push(format!("SUP {}", sup));
    }
    if let Some(syntax) = &at.syntax {
        match at.syntax_length {
            Some(len) => details.push(format!("SYNTAX {}{{{}}}", syntax, len)),
            None => details.push(format!("SYNTAX {}", syntax)),
        }
    }
    if at.single_value {
        details.push("SINGLE-VALUE".to_string());
    }
    if at.collective {
        details.push("COLLECTIVE".to_string());
    }
    if at.no_user_modification {
        details.push("NO-USER-MODIFICATION".to_string());
    }
    if let Some(usage) = at.usage {
        details.push(format!("USAGE {}", usage));
    }
    if at.obsolete {
        details.push("OBSOLETE".to_string());
    }
    if !details.is_empty() {
        write!(w, " ({})", details.join(", "))?;
    }
    w.write_all(b"\n")?;
    Ok(())
}

/// Summary line for an object class plus its MUST/MAY lists.
pub fn print_object_class(w: &mut dyn Write, oc: &ParsedObjectClass) -> io::Result<()> {
    write!(w, "objectClass ")?;
    print_names(w, &oc.oid, &oc.names)?;
    write!(w, " {}", oc.kind)?;
    if let Some(sup) = &oc.superior {
        write!(w, " SUP {}", sup.join(" $ "))?;
    }
    w.write_all(b"\n")?;
    if let Some(must) = &oc.must {
        write!(w, "    MUST {}\n", must.join(" $ "))?;
    }
    if let Some(may) = &oc.may {
        write!(w, "    MAY {}\n", may.join(" $ "))?;
    }
    Ok(())
}

pub fn print_schema(w: &mut dyn Write, schema: &SchemaParseResult) -> io::Result<()> {
    for at in &schema.attribute_types {
        print_attribute_type(w, at)?;
    }
    for oc in &schema.object_classes {
        print_object_class(w, oc)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Print each diagnostic on its own line, prefixed with `label: `.
pub fn print_diagnostics<T: Display>(
    w: &mut dyn Write,
    label: &str,
    diagnostics: &[T],
) -> io::Result<()> {
    for d in diagnostics {
        write!(w, "{}: {}\n", label, d)?;
    }
    Ok(())
}

pub fn print_validation(w: &mut dyn Write, result: &ValidationResult) -> io::Result<()> {
    for attr in &result.unknown_attributes {
        write!(w, "unknown attribute: {}\n", attr)?;
    }
    for class in &result.unknown_object_classes {
        write!(w, "unknown objectClass: {}\n", class)?;
    }
    for missing in &result.missing_required {
        write!(
            w,
            "missing required: {}: objectClass {} requires {}\n",
            missing.dn,
            missing.object_class,
            missing.attributes.join(", ")
        )?;
    }
    for dn in &result.missing_structural {
        write!(w, "no structural objectClass: {}\n", dn)?;
    }
    for disallowed in &result.disallowed_attributes {
        write!(
            w,
            "not allowed by schema: {}: {}\n",
            disallowed.dn,
            disallowed.attributes.join(", ")
        )?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
