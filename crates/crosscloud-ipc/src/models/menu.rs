//! Context menu tree returned by `get_context_menu`.
//!
//! The core describes the menu as nested JSON records:
//!
//! ```text
//! {"name": "Share", "enabled": true, "actionId": "share", "checked": false,
//!  "children": [ ...records... ]}
//! ```
//!
//! A record missing any of `name`, `enabled`, `actionId` or `children` is
//! skipped on its own; its siblings are kept. Parsing is depth-bounded so a
//! buggy or hostile core cannot exhaust the shell host's stack.

use crate::config::IpcConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Check mark state of a menu item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckState {
    Checked,
    Unchecked,
    /// No check mark slot is shown at all.
    #[default]
    Undefined,
}

impl CheckState {
    /// Map the optional `checked` field of a menu record. Returns `None`
    /// when the field is present but not a boolean.
    pub fn from_field(field: Option<&Value>) -> Option<Self> {
        match field {
            Some(Value::Bool(true)) => Some(CheckState::Checked),
            Some(Value::Bool(false)) => Some(CheckState::Unchecked),
            None | Some(Value::Null) => Some(CheckState::Undefined),
            Some(_) => None,
        }
    }
}

/// One entry of a context menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub name: String,
    pub enabled: bool,
    /// Passed back to the core through `perform_action` when clicked.
    pub action_id: String,
    pub checked: CheckState,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// Create an enabled item without check mark or children.
    pub fn new(name: impl Into<String>, action_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            action_id: action_id.into(),
            checked: CheckState::Undefined,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Parse a `get_context_menu` result into a menu tree.
///
/// Non-array input yields an empty menu. Levels deeper than `max_depth` are
/// dropped; the item at the last accepted level keeps an empty child list.
pub fn parse_menu(value: &Value, max_depth: usize) -> Vec<MenuItem> {
    parse_level(value, 1, max_depth)
}

fn parse_level(value: &Value, depth: usize, max_depth: usize) -> Vec<MenuItem> {
    let Some(records) = value.as_array() else {
        return Vec::new();
    };

    if depth > max_depth {
        if !records.is_empty() {
            warn!(
                "menu deeper than {} levels, dropping {} items",
                max_depth,
                records.len()
            );
        }
        return Vec::new();
    }

    records
        .iter()
        .filter_map(|record| parse_record(record, depth, max_depth))
        .collect()
}

fn parse_record(record: &Value, depth: usize, max_depth: usize) -> Option<MenuItem> {
    let enabled = record.get("enabled").and_then(Value::as_bool);
    let name = record.get("name").and_then(Value::as_str);
    let action_id = record.get("actionId").and_then(Value::as_str);
    let children = record.get("children").filter(|c| c.is_array());
    let checked = CheckState::from_field(record.get("checked"));

    let (Some(enabled), Some(name), Some(action_id), Some(children), Some(checked)) =
        (enabled, name, action_id, children, checked)
    else {
        debug!("skipped menu item: {}", record);
        return None;
    };

    Some(MenuItem {
        name: name.to_string(),
        enabled,
        action_id: action_id.to_string(),
        checked,
        children: parse_level(children, depth + 1, max_depth),
    })
}

/// Flatten a menu into its leaf items, for hosts without submenus.
///
/// Items with children are replaced by their leaves. At most
/// `IpcConfig::MAX_FLATTEN_DEPTH` nested levels are walked.
pub fn flatten_leaves(items: &[MenuItem]) -> Vec<&MenuItem> {
    let mut leaves = Vec::new();
    collect_leaves(items, 0, IpcConfig::MAX_FLATTEN_DEPTH, &mut leaves);
    leaves
}

fn collect_leaves<'a>(
    items: &'a [MenuItem],
    level: usize,
    max_level: usize,
    out: &mut Vec<&'a MenuItem>,
) {
    if level > max_level {
        return;
    }
    for item in items {
        if item.is_leaf() {
            out.push(item);
        } else {
            collect_leaves(&item.children, level + 1, max_level, out);
        }
    }
}
