//! unpack::autovalues
//!
//! Scoped recorder/replayer for volatile per-control field values.
//!
//! # Overview
//!
//! Bundles carry machine-managed fields - unique ids, publish counters,
//! template timestamps - that change on every save and would drown real
//! edits in version-control noise. The catalog strips them from the
//! structures being written out and records each one under the path of
//! control names leading to it, in traversal order, so a recomposer can
//! replay them deterministically.
//!
//! # Scope discipline
//!
//! Entering a control pushes its name; every extraction performed while the
//! scope is active is tagged with the current dot-joined path. Pushes and
//! pops must stay balanced on all exit paths.
//!
//! # Invariants
//!
//! - Entries are never overwritten; duplicate paths append in order
//! - Every field removed by extraction appears in exactly one entry

use serde_json::{Map, Value};

/// Which volatile-field set applies to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope {
    /// A control node (also applied to component-definition children).
    Control,
    /// A rule of a control.
    Rule,
}

/// Machine-managed fields stripped from control nodes.
const CONTROL_FIELDS: &[&str] = &["ControlUniqueId", "PublishOrderIndex"];

/// Machine-managed fields stripped from a control's `Template` object,
/// recorded under dotted identifiers (`Template.Version`).
const TEMPLATE_FIELDS: &[&str] = &["Version", "LastModifiedTimestamp"];

/// Machine-managed fields stripped from rules.
const RULE_FIELDS: &[&str] = &["RuleProviderType"];

/// One extraction: the control path it happened under, the owning rule
/// property when the source was a rule, and the captured field values in
/// removal order.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoValueEntry {
    /// Dot-joined control names from the tree root.
    pub control: String,
    /// The rule's `Property`, for rule-scope entries.
    pub property: Option<String>,
    /// Captured field identifier -> value.
    pub fields: Map<String, Value>,
}

/// Scoped catalog of extracted auto values for one decomposition walk.
#[derive(Debug, Default)]
pub struct AutoValueCatalog {
    path: Vec<String>,
    entries: Vec<AutoValueEntry>,
}

impl AutoValueCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a control scope.
    pub fn push(&mut self, name: &str) {
        self.path.push(name.to_string());
    }

    /// Leave the current control scope.
    pub fn pop(&mut self) {
        self.path.pop();
    }

    /// The current dot-joined control path.
    pub fn current_path(&self) -> String {
        self.path.join(".")
    }

    /// Current scope depth; zero outside any control.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Recorded entries, in traversal order.
    pub fn entries(&self) -> &[AutoValueEntry] {
        &self.entries
    }

    /// Remove the scope's volatile fields from `obj` and record them under
    /// the current path. Records nothing when `obj` carries none of them.
    pub fn extract(&mut self, obj: &mut Map<String, Value>, scope: FieldScope) {
        // shift_remove: plain remove would swap-reorder the remaining fields.
        let mut fields = Map::new();
        match scope {
            FieldScope::Control => {
                for key in CONTROL_FIELDS {
                    if let Some(value) = obj.shift_remove(*key) {
                        fields.insert((*key).to_string(), value);
                    }
                }
                if let Some(Value::Object(template)) = obj.get_mut("Template") {
                    for key in TEMPLATE_FIELDS {
                        if let Some(value) = template.shift_remove(*key) {
                            fields.insert(format!("Template.{}", key), value);
                        }
                    }
                }
            }
            FieldScope::Rule => {
                for key in RULE_FIELDS {
                    if let Some(value) = obj.shift_remove(*key) {
                        fields.insert((*key).to_string(), value);
                    }
                }
            }
        }

        if fields.is_empty() {
            return;
        }

        let property = match scope {
            FieldScope::Rule => obj
                .get("Property")
                .and_then(Value::as_str)
                .map(str::to_string),
            FieldScope::Control => None,
        };
        self.entries.push(AutoValueEntry {
            control: self.current_path(),
            property,
            fields,
        });
    }

    /// Scrub a component definition's nested child list.
    ///
    /// These children live inside opaque template metadata, outside the
    /// normal `Children` recursion; they are scrubbed of volatile values
    /// (recursively) but never rendered as files.
    pub fn extract_component_children(&mut self, children: &mut [Value]) {
        for child in children {
            let Value::Object(node) = child else { continue };
            let name = node
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            self.push(&name);
            self.extract(node, FieldScope::Control);
            if let Some(Value::Array(nested)) = node.get_mut("Children") {
                self.extract_component_children(nested);
            }
            self.pop();
        }
    }

    /// Serialize the catalog as an ordered JSON array.
    pub fn serialize(&self) -> serde_json::Result<String> {
        let items: Vec<Value> = self
            .entries
            .iter()
            .map(|entry| {
                let mut obj = Map::new();
                obj.insert("Control".to_string(), Value::String(entry.control.clone()));
                if let Some(property) = &entry.property {
                    obj.insert("Property".to_string(), Value::String(property.clone()));
                }
                for (key, value) in &entry.fields {
                    obj.insert(key.clone(), value.clone());
                }
                Value::Object(obj)
            })
            .collect();
        crate::core::jsonfmt::pretty(&Value::Array(items))
    }
}

/// Reinsert an entry's captured fields into the object they were taken
/// from. Dotted identifiers navigate nested objects, creating them when
/// absent. The inverse of [`AutoValueCatalog::extract`] up to field
/// position.
pub fn replay_into(entry: &AutoValueEntry, obj: &mut Map<String, Value>) {
    for (key, value) in &entry.fields {
        match key.split_once('.') {
            None => {
                obj.insert(key.clone(), value.clone());
            }
            Some((outer, inner)) => {
                let nested = obj
                    .entry(outer.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(nested) = nested {
                    nested.insert(inner.to_string(), value.clone());
                }
            }
        }
    }
}
