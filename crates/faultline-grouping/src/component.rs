//! The grouping component tree: the intermediate representation between
//! strategies and hash derivation, and the thing the "grouping breakdown"
//! UI renders to explain why a hash looks the way it does.

use serde_json::{json, Value};

/// One value inside a component: either a leaf scalar or a nested
/// component.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    Str(String),
    Nested(GroupingComponent),
}

impl From<&str> for ComponentValue {
    fn from(value: &str) -> Self {
        ComponentValue::Str(value.to_string())
    }
}

impl From<String> for ComponentValue {
    fn from(value: String) -> Self {
        ComponentValue::Str(value)
    }
}

impl From<GroupingComponent> for ComponentValue {
    fn from(value: GroupingComponent) -> Self {
        ComponentValue::Nested(value)
    }
}

/// Human-facing labels attached to hierarchical components, used by the
/// surrounding product to build issue titles per level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeLabel {
    pub function: Option<String>,
    pub package: Option<String>,
}

impl TreeLabel {
    pub fn is_empty(&self) -> bool {
        self.function.is_none() && self.package.is_none()
    }
}

/// A labeled tree node. Created fresh per grouping run, never persisted.
///
/// `contributes` decides whether this subtree participates in hash
/// derivation at all; `hint` records the human-readable reason whenever the
/// flag was toggled or is otherwise noteworthy.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingComponent {
    pub id: &'static str,
    pub values: Vec<ComponentValue>,
    pub contributes: bool,
    pub hint: Option<String>,
    pub tree_label: Option<TreeLabel>,
}

impl GroupingComponent {
    /// An empty component. With no values it cannot contribute anything to
    /// a hash even though `contributes` starts out true.
    pub fn new(id: &'static str) -> GroupingComponent {
        GroupingComponent {
            id,
            values: Vec::new(),
            contributes: true,
            hint: None,
            tree_label: None,
        }
    }

    pub fn with_values(
        id: &'static str,
        values: impl IntoIterator<Item = ComponentValue>,
    ) -> GroupingComponent {
        GroupingComponent {
            values: values.into_iter().collect(),
            ..GroupingComponent::new(id)
        }
    }

    /// Marks the component non-contributing, recording why.
    pub fn set_non_contributing(&mut self, hint: impl Into<String>) {
        self.contributes = false;
        self.hint = Some(hint.into());
    }

    pub fn set_hint(&mut self, hint: impl Into<String>) {
        self.hint = Some(hint.into());
    }

    pub fn push(&mut self, value: impl Into<ComponentValue>) {
        self.values.push(value.into());
    }

    /// Direct child components, contributing or not.
    pub fn subcomponents(&self) -> impl Iterator<Item = &GroupingComponent> {
        self.values.iter().filter_map(|value| match value {
            ComponentValue::Nested(component) => Some(component),
            _ => None,
        })
    }

    pub fn subcomponents_mut(&mut self) -> impl Iterator<Item = &mut GroupingComponent> {
        self.values.iter_mut().filter_map(|value| match value {
            ComponentValue::Nested(component) => Some(component),
            _ => None,
        })
    }

    /// Looks for a component with the given id anywhere in the subtree,
    /// including this node.
    pub fn find(&self, id: &str) -> Option<&GroupingComponent> {
        if self.id == id {
            return Some(self);
        }
        self.subcomponents().find_map(|component| component.find(id))
    }

    /// True when a contributing component with the given id exists in this
    /// subtree and carries hashable values, walking contributing nodes
    /// only.
    pub fn has_contributing(&self, id: &str) -> bool {
        if !self.contributes {
            return false;
        }
        if self.id == id && !self.flatten_values().is_empty() {
            return true;
        }
        self.subcomponents()
            .any(|component| component.has_contributing(id))
    }

    /// Depth-first traversal of contributing leaf values in emission order.
    /// Non-contributing nodes are skipped entirely, regardless of what
    /// their children would have contributed.
    pub fn flatten_values(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<String>) {
        if !self.contributes {
            return;
        }
        for value in &self.values {
            match value {
                ComponentValue::Str(s) => out.push(s.clone()),
                ComponentValue::Nested(component) => component.flatten_into(out),
            }
        }
    }

    /// Whether this component would emit at least one token.
    pub fn contributes_to_hash(&self) -> bool {
        self.contributes && !self.flatten_values().is_empty()
    }

    /// A short `id(child, child)` description of the contributing shape,
    /// for debug logging.
    pub fn shallow_description(&self) -> String {
        let children: Vec<&str> = self
            .subcomponents()
            .filter(|component| component.contributes)
            .map(|component| component.id)
            .collect();
        if children.is_empty() {
            self.id.to_string()
        } else {
            format!("{}({})", self.id, children.join(", "))
        }
    }

    /// JSON rendering for the external grouping-breakdown UI.
    pub fn as_json(&self) -> Value {
        let values: Vec<Value> = self
            .values
            .iter()
            .map(|value| match value {
                ComponentValue::Str(s) => json!(s),
                ComponentValue::Nested(component) => component.as_json(),
            })
            .collect();
        json!({
            "id": self.id,
            "contributes": self.contributes,
            "hint": self.hint,
            "values": values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> GroupingComponent {
        let mut frame = GroupingComponent::new("frame");
        frame.push(GroupingComponent::with_values("module", ["app.views".into()]));
        let mut filename = GroupingComponent::with_values("filename", ["views.py".into()]);
        filename.set_non_contributing("module takes precedence");
        frame.push(filename);
        frame.push(GroupingComponent::with_values("function", ["handler".into()]));
        GroupingComponent::with_values("stacktrace", [frame.into()])
    }

    #[test]
    fn test_flatten_skips_non_contributing_subtrees() {
        let tree = sample_tree();
        assert_eq!(tree.flatten_values(), vec!["app.views", "handler"]);
    }

    #[test]
    fn test_non_contributing_parent_hides_contributing_children() {
        let mut tree = sample_tree();
        tree.set_non_contributing("ignored");
        assert!(tree.flatten_values().is_empty());
        assert!(!tree.contributes_to_hash());
    }

    #[test]
    fn test_has_contributing_respects_contributes_flag() {
        let tree = sample_tree();
        assert!(tree.has_contributing("module"));
        assert!(!tree.has_contributing("filename"));
        assert!(tree.has_contributing("stacktrace"));
    }

    #[test]
    fn test_shallow_description_lists_contributing_children() {
        let tree = sample_tree();
        let frame = tree.subcomponents().next().unwrap();
        assert_eq!(frame.shallow_description(), "frame(module, function)");
    }

    #[test]
    fn test_as_json_shape() {
        let tree = sample_tree();
        let json = tree.as_json();
        assert_eq!(json["id"], "stacktrace");
        assert_eq!(json["contributes"], true);
        assert_eq!(json["values"][0]["id"], "frame");
    }
}
