//! Lookup tables over a parsed schema.
//!
//! Every name and OID of an attribute type or object class is indexed in
//! lowercase. When two definitions share a name the first one wins.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::schema::{ObjectClassKind, ParsedAttributeType, ParsedObjectClass, SchemaParseResult};

/// What an attribute name resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRecord {
    /// First NAME of the attribute type (or its OID).
    pub canonical: String,
    /// Every NAME of the attribute type.
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    attribute_map: HashMap<String, AttributeRecord>,
    object_classes: Vec<ParsedObjectClass>,
    object_class_map: HashMap<String, usize>,
}

impl SchemaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(schema: &SchemaParseResult) -> Self {
        let mut index = SchemaIndex::new();
        for at in &schema.attribute_types {
            index.add_attribute_type(at);
        }
        for oc in &schema.object_classes {
            index.add_object_class(oc.clone());
        }
        debug!(
            attribute_keys = index.attribute_map.len(),
            object_class_keys = index.object_class_map.len(),
            "built schema index"
        );
        index
    }

    pub fn add_attribute_type(&mut self, at: &ParsedAttributeType) {
        let record = AttributeRecord {
            canonical: at.name().to_string(),
            aliases: at.names.clone(),
        };
        for key in at.names.iter().chain(std::iter::once(&at.oid)) {
            let key = key.to_ascii_lowercase();
            if self.attribute_map.contains_key(&key) {
                debug!(name = %key, oid = %at.oid, "attribute type name already defined");
                continue;
            }
            self.attribute_map.insert(key, record.clone());
        }
    }

    pub fn add_object_class(&mut self, oc: ParsedObjectClass) {
        let idx = self.object_classes.len();
        for key in oc.names.iter().chain(std::iter::once(&oc.oid)) {
            let key = key.to_ascii_lowercase();
            if self.object_class_map.contains_key(&key) {
                debug!(name = %key, oid = %oc.oid, "object class name already defined");
                continue;
            }
            self.object_class_map.insert(key, idx);
        }
        self.object_classes.push(oc);
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeRecord> {
        self.attribute_map.get(&name.to_ascii_lowercase())
    }

    pub fn object_class(&self, name: &str) -> Option<&ParsedObjectClass> {
        let idx = self.object_class_map.get(&name.to_ascii_lowercase())?;
        self.object_classes.get(*idx)
    }

    /// Lowercased canonical name of `name`; names unknown to the schema map
    /// to themselves.
    pub fn canonical_attribute(&self, name: &str) -> String {
        match self.attribute(name) {
            Some(record) => record.canonical.to_ascii_lowercase(),
            None => name.to_ascii_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attribute_map.is_empty() && self.object_classes.is_empty()
    }

    /// Expand `classes` through their SUP chains.
    pub fn closure<'a, S: AsRef<str>>(&'a self, classes: &[S]) -> ClassClosure<'a> {
        let mut closure = ClassClosure::new(self);
        for name in classes {
            closure.request_class(name.as_ref());
        }
        closure.compute();
        closure
    }
}

// ---------------------------------------------------------------------------
// ClassClosure: combined MUST/MAY of a set of object classes
// ---------------------------------------------------------------------------

pub struct ClassClosure<'a> {
    index: &'a SchemaIndex,
    /// Requested classes followed by every superclass reached.
    pub classes: Vec<&'a ParsedObjectClass>,
    /// Canonical (lowercased) attribute names.
    pub must: Vec<String>,
    pub may: Vec<String>,
    pub structural: Option<&'a ParsedObjectClass>,
    /// Requested or superior class names the index does not know.
    pub unknown: Vec<String>,
}

impl<'a> ClassClosure<'a> {
    fn new(index: &'a SchemaIndex) -> Self {
        ClassClosure {
            index,
            classes: Vec::new(),
            must: Vec::new(),
            may: Vec::new(),
            structural: None,
            unknown: Vec::new(),
        }
    }

    /// Add a class by name. Deduplicates by identity.
    fn request_class(&mut self, name: &str) {
        match self.index.object_class(name) {
            Some(cls) => {
                if !self.classes.iter().any(|c| std::ptr::eq(*c, cls)) {
                    self.classes.push(cls);
                }
            }
            None => {
                if !self.unknown.iter().any(|u| u.eq_ignore_ascii_case(name)) {
                    self.unknown.push(name.to_string());
                }
            }
        }
    }

    fn compute(&mut self) {
        // compute_one may append superclasses while we walk the list.
        let mut i = 0;
        while i < self.classes.len() {
            let cls = self.classes[i];
            self.compute_one(cls);
            i += 1;
        }
    }

    fn compute_one(&mut self, cls: &'a ParsedObjectClass) {
        for sup in cls.superiors() {
            self.request_class(sup);
        }

        if cls.kind == ObjectClassKind::Structural && self.structural.is_none() {
            self.structural = Some(cls);
        }

        for attr in cls.must() {
            let canonical = self.index.canonical_attribute(attr);
            self.may.retain(|m| *m != canonical);
            if !self.must.contains(&canonical) {
                self.must.push(canonical);
            }
        }

        for attr in cls.may() {
            let canonical = self.index.canonical_attribute(attr);
            if !self.must.contains(&canonical) && !self.may.contains(&canonical) {
                self.may.push(canonical);
            }
        }
    }

    /// True when `attribute` (any alias, any case) is in MUST or MAY.
    pub fn allows(&self, attribute: &str) -> bool {
        let canonical = self.index.canonical_attribute(attribute);
        self.must.contains(&canonical) || self.may.contains(&canonical)
    }

    pub fn contains_class(&self, name: &str) -> bool {
        match self.index.object_class(name) {
            Some(target) => self.classes.iter().any(|c| std::ptr::eq(*c, target)),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
