//! unpack::walker
//!
//! Depth-first decomposition of a control tree into a directory structure.
//!
//! # Overview
//!
//! Each control becomes a directory holding one code file (its rule bodies
//! rendered as named blocks) and one data file (the residual structure).
//! Children recurse into subdirectories named after them, and their
//! original order is preserved in a `ChildrenOrder` record since filesystem
//! enumeration order is not trustworthy.
//!
//! # Design
//!
//! Decomposition is a pure transform: the source control is never mutated.
//! Each step produces a fresh residual node plus side-channel outputs (code
//! text, catalog entries, child-order records), so the verification pass
//! upstream always sees pristine pre-decomposition state.
//!
//! # Invariants
//!
//! - Output file and directory names derive solely from control names
//! - A `ChildrenOrder` list's length and name set equal the control's children
//! - The residual omits `Children`, rule scripts, and volatile fields

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::{jsonfmt, paths};

use super::autovalues::{AutoValueCatalog, FieldScope};

/// Closing marker of a rendered rule block, followed by the property name.
pub const RULE_CLOSE: &str = "} // End of ";

/// Errors from tree decomposition.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("top-level structure has no TopParent control")]
    MissingTopParent,

    #[error("control under '{0}' has no Name")]
    MissingName(String),

    #[error("failed to serialize residual control: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Positional record preserving a control's original child order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildOrder {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "ChildrenOrder", skip_serializing_if = "Option::is_none")]
    pub children_order: Option<Vec<ChildOrder>>,
}

/// Decompose one top-level control tree into `code_dir`.
///
/// `screen` is the wrapping top-level structure; its `TopParent` control
/// names the subdirectory the tree lands in. The root's data file
/// serializes the wrapping structure with the root control replaced by its
/// residual, so sibling top-level keys survive.
pub fn decompose_screen(
    screen: &Value,
    code_dir: &Path,
    catalog: &mut AutoValueCatalog,
) -> Result<(), WalkError> {
    let shell = screen.as_object().ok_or(WalkError::MissingTopParent)?;
    let top = shell
        .get("TopParent")
        .and_then(Value::as_object)
        .ok_or(WalkError::MissingTopParent)?;
    let name = control_name(top, catalog)?;
    let dir = code_dir.join(&name);
    walk(top, &dir, Some(shell), catalog)?;
    Ok(())
}

/// Decompose one control into `dir`, returning its child-order record
/// (None when it has no children).
fn walk(
    control: &Map<String, Value>,
    dir: &Path,
    root_shell: Option<&Map<String, Value>>,
    catalog: &mut AutoValueCatalog,
) -> Result<Option<Vec<ChildOrder>>, WalkError> {
    let name = control_name(control, catalog)?;
    catalog.push(&name);
    let result = walk_scoped(control, &name, dir, root_shell, catalog);
    catalog.pop();
    result
}

fn walk_scoped(
    control: &Map<String, Value>,
    name: &str,
    dir: &Path,
    root_shell: Option<&Map<String, Value>>,
    catalog: &mut AutoValueCatalog,
) -> Result<Option<Vec<ChildOrder>>, WalkError> {
    // The directory must exist before any write below it.
    fs::create_dir_all(dir)?;

    // Rules render into code blocks; the residual rules lose their scripts.
    let mut code = String::new();
    let residual_rules = match control.get("Rules") {
        Some(Value::Array(rules)) => {
            let mut scrubbed = Vec::with_capacity(rules.len());
            for rule in rules {
                scrubbed.push(render_rule(rule, &mut code, catalog));
            }
            Some(scrubbed)
        }
        _ => None,
    };
    fs::write(paths::code_file(dir, name), code)?;

    // Children recurse in original order into subdirectories named after them.
    let mut orders = Vec::new();
    if let Some(Value::Array(children)) = control.get("Children") {
        for child in children {
            let Some(child_map) = child.as_object() else {
                continue;
            };
            let child_name = control_name(child_map, catalog)?;
            let child_orders = walk(child_map, &dir.join(&child_name), None, catalog)?;
            orders.push(ChildOrder {
                name: child_name,
                children_order: child_orders,
            });
        }
    }
    let orders = if orders.is_empty() { None } else { Some(orders) };

    // Build the residual in source field order: rules scrubbed, Children
    // replaced (in place) by ChildrenOrder when any exist.
    let mut residual = Map::new();
    for (key, value) in control {
        match key.as_str() {
            "Rules" => match &residual_rules {
                Some(rules) => {
                    residual.insert(key.clone(), Value::Array(rules.clone()));
                }
                None => {
                    residual.insert(key.clone(), value.clone());
                }
            },
            "Children" => {
                if let Some(orders) = &orders {
                    residual.insert("ChildrenOrder".to_string(), serde_json::to_value(orders)?);
                }
            }
            _ => {
                residual.insert(key.clone(), value.clone());
            }
        }
    }

    // Component-definition children live inside opaque template metadata;
    // they are scrubbed, never rendered as files.
    if let Some(Value::Array(component_children)) = residual
        .get_mut("Template")
        .and_then(|template| template.get_mut("ComponentDefinitionInfo"))
        .and_then(|info| info.get_mut("Children"))
    {
        catalog.extract_component_children(component_children);
    }

    // The control's own volatile fields go last, after all child entries.
    catalog.extract(&mut residual, FieldScope::Control);

    let data = match root_shell {
        Some(shell) => {
            let mut wrapped = Map::new();
            for (key, value) in shell {
                if key == "TopParent" {
                    wrapped.insert(key.clone(), Value::Object(residual.clone()));
                } else {
                    wrapped.insert(key.clone(), value.clone());
                }
            }
            jsonfmt::pretty(&Value::Object(wrapped))?
        }
        None => jsonfmt::pretty(&Value::Object(residual))?,
    };
    fs::write(paths::data_file(dir, name), data)?;

    Ok(orders)
}

/// Render one rule as a code block and return its residual (script and
/// volatile fields removed).
fn render_rule(rule: &Value, code: &mut String, catalog: &mut AutoValueCatalog) -> Value {
    let Some(rule_map) = rule.as_object() else {
        return rule.clone();
    };
    let mut residual = rule_map.clone();
    catalog.extract(&mut residual, FieldScope::Rule);

    let property = residual
        .get("Property")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let script = match residual.shift_remove("InvariantScript") {
        Some(Value::String(script)) => script,
        _ => String::new(),
    };

    code.push_str(&property);
    code.push_str("(){\n\t");
    // Every script line carries one tab of block indentation.
    code.push_str(&script.replace('\n', "\n\t"));
    code.push('\n');
    code.push_str(RULE_CLOSE);
    code.push_str(&property);
    code.push_str("\n\n");

    Value::Object(residual)
}

fn control_name(
    control: &Map<String, Value>,
    catalog: &AutoValueCatalog,
) -> Result<String, WalkError> {
    control
        .get("Name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WalkError::MissingName(catalog.current_path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decompose(screen: &Value) -> (tempfile::TempDir, std::path::PathBuf, AutoValueCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let code_dir = dir.path().join("Code");
        let mut catalog = AutoValueCatalog::new();
        decompose_screen(screen, &code_dir, &mut catalog).unwrap();
        (dir, code_dir, catalog)
    }

    #[test]
    fn renders_rule_blocks_in_order() {
        let screen = json!({
            "TopParent": {
                "Name": "Screen1",
                "Rules": [
                    {"Property": "OnVisible", "InvariantScript": "Notify(\"Hi\")"},
                    {"Property": "Fill", "InvariantScript": "RGBA(255, 255, 255, 1)"}
                ],
                "Children": []
            }
        });
        let (_dir, code_dir, _catalog) = decompose(&screen);
        let code =
            fs::read_to_string(paths::code_file(&code_dir.join("Screen1"), "Screen1")).unwrap();
        assert_eq!(
            code,
            "OnVisible(){\n\tNotify(\"Hi\")\n} // End of OnVisible\n\n\
             Fill(){\n\tRGBA(255, 255, 255, 1)\n} // End of Fill\n\n"
        );
    }

    #[test]
    fn reindents_multiline_scripts() {
        let screen = json!({
            "TopParent": {
                "Name": "Screen1",
                "Rules": [{"Property": "OnSelect", "InvariantScript": "Set(a, 1);\nSet(b, 2)"}],
                "Children": []
            }
        });
        let (_dir, code_dir, _catalog) = decompose(&screen);
        let code =
            fs::read_to_string(paths::code_file(&code_dir.join("Screen1"), "Screen1")).unwrap();
        assert_eq!(
            code,
            "OnSelect(){\n\tSet(a, 1);\n\tSet(b, 2)\n} // End of OnSelect\n\n"
        );
    }

    #[test]
    fn root_data_file_keeps_shell_and_clears_rules_and_children() {
        let screen = json!({
            "TopParent": {
                "Name": "Screen1",
                "Rules": [{"Property": "OnVisible", "InvariantScript": "Notify(\"Hi\")"}],
                "Children": []
            },
            "ScreenWidth": 640
        });
        let (_dir, code_dir, _catalog) = decompose(&screen);
        let data: Value = serde_json::from_str(
            &fs::read_to_string(paths::data_file(&code_dir.join("Screen1"), "Screen1")).unwrap(),
        )
        .unwrap();
        assert_eq!(
            data,
            json!({
                "TopParent": {
                    "Name": "Screen1",
                    "Rules": [{"Property": "OnVisible"}]
                },
                "ScreenWidth": 640
            })
        );
    }

    #[test]
    fn children_land_in_subdirectories_with_order_records() {
        let screen = json!({
            "TopParent": {
                "Name": "Screen1",
                "Rules": [],
                "Children": [
                    {"Name": "Zeta", "Rules": [], "Children": [
                        {"Name": "Inner", "Rules": [], "Children": []}
                    ]},
                    {"Name": "Alpha", "Rules": [], "Children": []}
                ]
            }
        });
        let (_dir, code_dir, _catalog) = decompose(&screen);
        let root = code_dir.join("Screen1");
        assert!(root.join("Zeta/Inner/Inner.json").exists());
        assert!(root.join("Alpha/Alpha.json").exists());

        let data: Value =
            serde_json::from_str(&fs::read_to_string(paths::data_file(&root, "Screen1")).unwrap())
                .unwrap();
        // Order record preserves source order (Zeta before Alpha), not
        // filesystem order.
        assert_eq!(
            data["TopParent"]["ChildrenOrder"],
            json!([
                {"Name": "Zeta", "ChildrenOrder": [{"Name": "Inner"}]},
                {"Name": "Alpha"}
            ])
        );
        // Child data files drop Children entirely.
        let alpha: Value =
            serde_json::from_str(&fs::read_to_string(root.join("Alpha/Alpha.json")).unwrap())
                .unwrap();
        assert!(alpha.get("ChildrenOrder").is_none());
        assert!(alpha.get("Children").is_none());
    }

    #[test]
    fn volatile_fields_move_to_catalog_in_traversal_order() {
        let screen = json!({
            "TopParent": {
                "Name": "Screen1",
                "ControlUniqueId": "1",
                "Rules": [{"Property": "OnVisible", "InvariantScript": "x", "RuleProviderType": "Unknown"}],
                "Children": [
                    {"Name": "Label1", "ControlUniqueId": "2", "Rules": [], "Children": []}
                ]
            }
        });
        let (_dir, code_dir, catalog) = decompose(&screen);

        let paths_seen: Vec<(&str, Option<&str>)> = catalog
            .entries()
            .iter()
            .map(|entry| (entry.control.as_str(), entry.property.as_deref()))
            .collect();
        // Rule entries first, then the deeper control, then the control itself.
        assert_eq!(
            paths_seen,
            vec![
                ("Screen1", Some("OnVisible")),
                ("Screen1.Label1", None),
                ("Screen1", None)
            ]
        );

        let root: Value = serde_json::from_str(
            &fs::read_to_string(paths::data_file(&code_dir.join("Screen1"), "Screen1")).unwrap(),
        )
        .unwrap();
        assert!(root["TopParent"].get("ControlUniqueId").is_none());
        assert!(root["TopParent"]["Rules"][0].get("RuleProviderType").is_none());
    }

    #[test]
    fn component_definition_children_are_scrubbed_not_rendered() {
        let screen = json!({
            "TopParent": {
                "Name": "Component1",
                "Rules": [],
                "Children": [],
                "Template": {
                    "Id": "c1",
                    "ComponentDefinitionInfo": {
                        "Children": [{"Name": "Inner1", "ControlUniqueId": "9"}]
                    }
                }
            }
        });
        let (_dir, code_dir, catalog) = decompose(&screen);
        let root = code_dir.join("Component1");
        // Not part of the Children recursion: no Inner1 directory.
        assert!(!root.join("Inner1").exists());

        let data: Value =
            serde_json::from_str(&fs::read_to_string(paths::data_file(&root, "Component1")).unwrap())
                .unwrap();
        assert!(data["TopParent"]["Template"]["ComponentDefinitionInfo"]["Children"][0]
            .get("ControlUniqueId")
            .is_none());
        assert!(catalog
            .entries()
            .iter()
            .any(|entry| entry.control == "Component1.Inner1"));
    }

    #[test]
    fn missing_name_unwinds_scope_stack() {
        let screen = json!({
            "TopParent": {
                "Name": "Screen1",
                "Rules": [],
                "Children": [{"Rules": [], "Children": []}]
            }
        });
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = AutoValueCatalog::new();
        let err = decompose_screen(&screen, &dir.path().join("Code"), &mut catalog).unwrap_err();
        assert!(matches!(err, WalkError::MissingName(_)));
        assert_eq!(catalog.depth(), 0);
    }

    #[test]
    fn source_tree_is_not_mutated() {
        let screen = json!({
            "TopParent": {
                "Name": "Screen1",
                "ControlUniqueId": "1",
                "Rules": [{"Property": "Fill", "InvariantScript": "Blue"}],
                "Children": []
            }
        });
        let before = screen.clone();
        let (_dir, _code_dir, _catalog) = decompose(&screen);
        assert_eq!(screen, before);
    }
}
