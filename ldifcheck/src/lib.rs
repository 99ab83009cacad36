//! Parsing and validation of LDIF documents against LDAP schema dumps.
//!
//! The three entry points are [`ldif::parse_ldif`], [`schema::parse_ldap_schema`]
//! and [`validate::validate`]. None of them fail on malformed input: every
//! problem becomes a diagnostic in the returned structure.

pub mod error;
pub mod index;
pub mod ldif;
pub mod lines;
pub mod print;
pub mod schema;
pub mod validate;

pub use index::SchemaIndex;
pub use ldif::{parse_ldif, LdifAttribute, LdifEntry, LdifParseResult};
pub use schema::{parse_ldap_schema, ParsedAttributeType, ParsedObjectClass, SchemaParseResult};
pub use validate::{validate, ValidationResult};
