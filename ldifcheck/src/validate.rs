//! Cross-checks parsed LDIF entries against a schema index.
//!
//! Validation is opt-in: without an index every list is empty. Nothing
//! here fails; findings are returned as data.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::index::SchemaIndex;
use crate::ldif::LdifEntry;

/// LDIF control keywords that are never schema attributes.
pub const CONTROL_ATTRIBUTES: &[&str] = &[
    "dn",
    "changetype",
    "control",
    "newrdn",
    "deleteoldrdn",
    "newsuperior",
    "add",
    "delete",
    "replace",
    "increment",
    "version",
];

pub fn is_control_attribute(name: &str) -> bool {
    CONTROL_ATTRIBUTES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(name))
}

/// MUST attributes of one object class that an entry lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingRequired {
    pub dn: String,
    pub object_class: String,
    pub attributes: Vec<String>,
}

/// Attributes an entry carries that none of its object classes permit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisallowedAttributes {
    pub dn: String,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Lowercased, sorted, deduplicated.
    pub unknown_attributes: Vec<String>,
    /// Lowercased, sorted, deduplicated.
    pub unknown_object_classes: Vec<String>,
    pub missing_required: Vec<MissingRequired>,
    /// DNs of entries without a structural object class.
    pub missing_structural: Vec<String>,
    pub disallowed_attributes: Vec<DisallowedAttributes>,
}

impl ValidationResult {
    pub fn is_clean(&self) -> bool {
        self.unknown_attributes.is_empty()
            && self.unknown_object_classes.is_empty()
            && self.missing_required.is_empty()
            && self.missing_structural.is_empty()
            && self.disallowed_attributes.is_empty()
    }

    /// Total number of findings.
    pub fn len(&self) -> usize {
        self.unknown_attributes.len()
            + self.unknown_object_classes.len()
            + self.missing_required.len()
            + self.missing_structural.len()
            + self.disallowed_attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }
}

/// Validate `entries` against `index`. With no index, nothing is flagged.
pub fn validate(entries: &[LdifEntry], index: Option<&SchemaIndex>) -> ValidationResult {
    let Some(index) = index else {
        return ValidationResult::default();
    };

    let mut unknown_attributes = BTreeSet::new();
    let mut unknown_object_classes = BTreeSet::new();
    let mut result = ValidationResult::default();

    for entry in entries {
        for attr in &entry.attributes {
            if !is_control_attribute(&attr.key) && index.attribute(&attr.key).is_none() {
                unknown_attributes.insert(attr.key.clone());
            }
        }

        let classes = distinct_object_classes(entry);
        for class in &classes {
            if index.object_class(class).is_none() {
                unknown_object_classes.insert(class.to_ascii_lowercase());
            }
        }

        check_required(entry, &classes, index, &mut result.missing_required);
        check_closure(entry, &classes, index, &mut result);
    }

    result.unknown_attributes = unknown_attributes.into_iter().collect();
    result.unknown_object_classes = unknown_object_classes.into_iter().collect();

    debug!(
        entries = entries.len(),
        findings = result.len(),
        "validated entries"
    );
    result
}

/// objectClass values of `entry`, first occurrence of each (case-insensitive).
fn distinct_object_classes(entry: &LdifEntry) -> Vec<&str> {
    let mut seen = HashSet::new();
    entry
        .object_classes()
        .into_iter()
        .filter(|c| !c.is_empty() && seen.insert(c.to_ascii_lowercase()))
        .collect()
}

/// Canonical names of every attribute on `entry`.
fn entry_canonical_attributes(entry: &LdifEntry, index: &SchemaIndex) -> HashSet<String> {
    entry
        .attributes
        .iter()
        .map(|a| index.canonical_attribute(&a.key))
        .collect()
}

fn check_required(
    entry: &LdifEntry,
    classes: &[&str],
    index: &SchemaIndex,
    out: &mut Vec<MissingRequired>,
) {
    let present = entry_canonical_attributes(entry, index);

    for class in classes {
        // Unknown classes are reported separately.
        let Some(oc) = index.object_class(class) else {
            continue;
        };
        let missing: Vec<String> = oc
            .must()
            .iter()
            .filter(|m| !present.contains(&index.canonical_attribute(m)))
            .cloned()
            .collect();
        if !missing.is_empty() {
            out.push(MissingRequired {
                dn: entry.dn.clone(),
                object_class: class.to_string(),
                attributes: missing,
            });
        }
    }
}

/// Structural-class and permitted-attribute checks. Skipped unless every
/// class of the entry (and its superclasses) is known.
fn check_closure(
    entry: &LdifEntry,
    classes: &[&str],
    index: &SchemaIndex,
    result: &mut ValidationResult,
) {
    if classes.is_empty() || entry.change_type().is_some() {
        return;
    }
    let closure = index.closure(classes);
    if !closure.unknown.is_empty() {
        return;
    }

    if closure.structural.is_none() {
        result.missing_structural.push(entry.dn.clone());
    }

    if closure.contains_class("extensibleObject")
        || classes
            .iter()
            .any(|c| c.eq_ignore_ascii_case("extensibleObject"))
    {
        return;
    }

    let disallowed: Vec<String> = entry
        .attributes
        .iter()
        .filter(|a| {
            !is_control_attribute(&a.key)
                && a.key != "objectclass"
                && index.attribute(&a.key).is_some()
                && !closure.allows(&a.key)
        })
        .map(|a| a.name.clone())
        .collect();
    if !disallowed.is_empty() {
        result.disallowed_attributes.push(DisallowedAttributes {
            dn: entry.dn.clone(),
            attributes: disallowed,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ldif::parse_ldif;
    use crate::schema::parse_ldap_schema;

    const SCHEMA: &str = "\
attributeTypes: ( 2.5.4.0 NAME 'objectClass' )
attributeTypes: ( 2.5.4.3 NAME ( 'cn' 'commonName' ) )
attributeTypes: ( 2.5.4.4 NAME ( 'sn' 'surname' ) )
attributeTypes: ( 2.5.4.13 NAME 'description' )
attributeTypes: ( 0.9.2342.19200300.100.1.3 NAME ( 'mail' 'rfc822Mailbox' ) )
attributeTypes: ( 0.9.2342.19200300.100.1.1 NAME ( 'uid' 'userid' ) )
objectClasses: ( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )
objectClasses: ( 2.5.6.6 NAME 'person' SUP top STRUCTURAL MUST ( sn $ cn ) MAY description )
objectClasses: ( 9.9.1 NAME 'mailRecipient' SUP top AUXILIARY MUST mail MAY uid )
objectClasses: ( 1.3.6.1.4.1.1466.101.120.111 NAME 'extensibleObject' SUP top AUXILIARY )
";

    fn index() -> SchemaIndex {
        let schema = parse_ldap_schema(SCHEMA);
        assert!(schema.errors.is_empty(), "{:?}", schema.errors);
        SchemaIndex::build(&schema)
    }

    fn run(ldif: &str) -> ValidationResult {
        let parsed = parse_ldif(ldif);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        validate(&parsed.entries, Some(&index()))
    }

    // -- Group 1: schema-less --

    #[test]
    fn no_schema_no_findings() {
        let parsed = parse_ldif("dn: cn=x\nobjectClass: whatever\nfoo: bar\n");
        let result = validate(&parsed.entries, None);
        assert_eq!(result, ValidationResult::default());
        assert!(result.is_clean());
    }

    #[test]
    fn no_entries_no_findings() {
        let result = validate(&[], Some(&index()));
        assert!(result.is_clean());
    }

    // -- Group 2: unknown attributes and classes --

    #[test]
    fn clean_entry() {
        let result = run("dn: cn=x\nobjectClass: top\nobjectClass: person\ncn: x\nsn: y\n");
        assert!(result.is_clean(), "{:?}", result);
    }

    #[test]
    fn unknown_attribute_lowercased_sorted_dedup() {
        let result = run(
            "dn: cn=a\nobjectClass: person\ncn: a\nsn: a\nZeta: 1\nfooBar: 1\n\n\
             dn: cn=b\nobjectClass: person\ncn: b\nsn: b\nFOOBAR: 2\n",
        );
        assert_eq!(result.unknown_attributes, vec!["foobar", "zeta"]);
    }

    #[test]
    fn control_attributes_never_flagged() {
        let result = run(
            "dn: cn=a\nchangetype: modify\nreplace: description\ndescription: x\n-\n",
        );
        assert!(result.unknown_attributes.is_empty());
    }

    #[test]
    fn aliases_are_known() {
        let result = run("dn: cn=a\nobjectClass: person\ncommonName: a\nSURNAME: b\n");
        assert!(result.is_clean(), "{:?}", result);
    }

    #[test]
    fn unknown_object_classes() {
        let result = run(
            "dn: cn=a\nobjectClass: person\nobjectClass: PosixAccount\ncn: a\nsn: a\n\n\
             dn: cn=b\nobjectClass: posixaccount\nobjectClass: alpha\n",
        );
        assert_eq!(result.unknown_object_classes, vec!["alpha", "posixaccount"]);
        assert!(result.missing_required.is_empty());
    }

    // -- Group 3: missing required --

    #[test]
    fn missing_sn() {
        let result = run("dn: uid=jdoe,dc=example,dc=com\nobjectClass: person\ncn: John Doe\n");
        assert_eq!(
            result.missing_required,
            vec![MissingRequired {
                dn: "uid=jdoe,dc=example,dc=com".to_string(),
                object_class: "person".to_string(),
                attributes: vec!["sn".to_string()],
            }]
        );
    }

    #[test]
    fn numeric_oid_satisfies_must() {
        let result = run("dn: cn=a\nobjectClass: person\n2.5.4.3: a\n2.5.4.4: b\n");
        assert!(result.is_clean(), "{:?}", result);
    }

    #[test]
    fn missing_grouped_per_class() {
        let result = run("dn: cn=a\nobjectClass: person\nobjectClass: mailRecipient\n");
        assert_eq!(result.missing_required.len(), 2);
        assert_eq!(result.missing_required[0].attributes, vec!["sn", "cn"]);
        assert_eq!(result.missing_required[1].object_class, "mailRecipient");
        assert_eq!(result.missing_required[1].attributes, vec!["mail"]);
    }

    #[test]
    fn must_satisfied_through_alias() {
        let result = run(
            "dn: cn=a\nobjectClass: person\nobjectClass: mailRecipient\n\
             commonName: a\nsurname: b\nrfc822Mailbox: a@example.com\n",
        );
        assert!(result.missing_required.is_empty(), "{:?}", result);
    }

    #[test]
    fn must_satisfied_with_options() {
        let result = run("dn: cn=a\nobjectClass: person\ncn;lang-en: a\nsn;x-foo: b\n");
        assert!(result.missing_required.is_empty());
    }

    #[test]
    fn repeated_object_class_reported_once() {
        let result = run("dn: cn=a\nobjectClass: person\nobjectClass: Person\ncn: a\n");
        assert_eq!(result.missing_required.len(), 1);
    }

    #[test]
    fn entry_without_object_classes() {
        let result = run("dn: cn=a\ncn: a\n");
        assert!(result.is_clean());
    }

    // -- Group 4: structural and permitted attributes --

    #[test]
    fn missing_structural_class() {
        let result = run("dn: cn=a\nobjectClass: top\nobjectClass: mailRecipient\nmail: a@b\n");
        assert_eq!(result.missing_structural, vec!["cn=a"]);
    }

    #[test]
    fn disallowed_attribute() {
        let result = run("dn: cn=a\nobjectClass: person\ncn: a\nsn: b\nuid: a\n");
        assert_eq!(
            result.disallowed_attributes,
            vec![DisallowedAttributes {
                dn: "cn=a".to_string(),
                attributes: vec!["uid".to_string()],
            }]
        );
    }

    #[test]
    fn extensible_object_allows_anything() {
        let result = run(
            "dn: cn=a\nobjectClass: person\nobjectClass: extensibleObject\ncn: a\nsn: b\nuid: a\n",
        );
        assert!(result.disallowed_attributes.is_empty());
    }

    #[test]
    fn closure_checks_skipped_with_unknown_class() {
        let result = run("dn: cn=a\nobjectClass: mystery\nuid: a\n");
        assert!(result.missing_structural.is_empty());
        assert!(result.disallowed_attributes.is_empty());
    }

    #[test]
    fn unknown_attribute_not_also_disallowed() {
        let result = run("dn: cn=a\nobjectClass: person\ncn: a\nsn: b\nfoo: x\n");
        assert_eq!(result.unknown_attributes, vec!["foo"]);
        assert!(result.disallowed_attributes.is_empty());
    }

    // -- Group 5: end to end --

    #[test]
    fn end_to_end_scenario() {
        let parsed = parse_ldif(
            "dn: uid=jdoe,dc=example,dc=com\n\
             objectClass: person\n\
             cn: John Doe\n",
        );
        let schema = parse_ldap_schema(
            "objectClasses: ( 2.5.6.6 NAME 'person' STRUCTURAL MUST ( sn $ cn ) )\n\
             attributeTypes: ( 2.5.4.0 NAME 'objectClass' )\n\
             attributeTypes: ( 2.5.4.3 NAME 'cn' )\n\
             attributeTypes: ( 2.5.4.4 NAME 'sn' )\n",
        );
        let index = SchemaIndex::build(&schema);
        let result = validate(&parsed.entries, Some(&index));

        assert_eq!(parsed.entries.len(), 1);
        assert!(result.unknown_attributes.is_empty());
        assert!(result.unknown_object_classes.is_empty());
        assert_eq!(result.missing_required.len(), 1);
        assert_eq!(result.missing_required[0].attributes, vec!["sn"]);
    }

    #[test]
    fn validate_is_idempotent() {
        let parsed = parse_ldif("dn: cn=a\nobjectClass: person\nfoo: 1\n");
        let index = index();
        assert_eq!(
            validate(&parsed.entries, Some(&index)),
            validate(&parsed.entries, Some(&index))
        );
    }
}
