//! Values and node trees returned by the simulator

use serde::{Deserialize, Serialize};

use crate::{SimulatorError, SimulatorResult};

/// A single value read from the simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl SimValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SimValue::Number(n) => Some(*n),
            SimValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            SimValue::Text(_) | SimValue::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SimValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn expect_f64(&self, path: &str) -> SimulatorResult<f64> {
        self.as_f64().ok_or_else(|| {
            SimulatorError::invalid_response(path, format!("expected a number, got {self:?}"))
        })
    }

    pub(crate) fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(SimValue::Null, SimValue::Number),
            serde_json::Value::Bool(b) => SimValue::Bool(*b),
            serde_json::Value::String(s) => SimValue::Text(s.clone()),
            other => SimValue::Text(other.to_string()),
        }
    }
}

impl From<f64> for SimValue {
    fn from(value: f64) -> Self {
        SimValue::Number(value)
    }
}

impl From<&str> for SimValue {
    fn from(value: &str) -> Self {
        SimValue::Text(value.to_string())
    }
}

/// An endpoint exposed by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeEndpoint {
    pub name: String,
    #[serde(default)]
    pub writable: bool,
}

/// A node of the simulator's object tree as returned by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeTree {
    #[serde(default)]
    pub node_path: String,
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub nodes: Vec<NodeTree>,
    #[serde(default)]
    pub endpoints: Vec<NodeEndpoint>,
}

impl NodeTree {
    pub fn child(&self, name: &str) -> Option<&NodeTree> {
        self.nodes.iter().find(|n| n.node_name == name)
    }

    pub fn has_endpoint(&self, name: &str) -> bool {
        self.endpoints.iter().any(|e| e.name == name)
    }

    /// Children that look like controls: nodes exposing an `InputValue` endpoint.
    pub fn controls(&self) -> impl Iterator<Item = &NodeTree> {
        self.nodes.iter().filter(|n| n.has_endpoint("InputValue"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(SimValue::from(0.5).as_f64(), Some(0.5));
        assert_eq!(SimValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(SimValue::from("RVM_FTP_Class66").as_str(), Some("RVM_FTP_Class66"));
        assert_eq!(SimValue::Null.as_f64(), None);
    }

    #[test]
    fn test_expect_f64_error() {
        let err = SimValue::from("x").expect_f64("Throttle.InputValue");
        assert!(matches!(err, Err(SimulatorError::InvalidResponse { .. })));
    }

    #[test]
    fn test_node_tree_deserialize() -> Result<(), serde_json::Error> {
        let tree: NodeTree = serde_json::from_str(
            r#"{
                "NodePath": "CurrentDrivableActor",
                "NodeName": "CurrentDrivableActor",
                "Nodes": [
                    {"NodeName": "Throttle(Lever)", "Endpoints": [{"Name": "InputValue", "Writable": true}]},
                    {"NodeName": "Horn", "Nodes": []}
                ]
            }"#,
        )?;
        assert_eq!(tree.nodes.len(), 2);
        let controls: Vec<_> = tree.controls().map(|n| n.node_name.as_str()).collect();
        assert_eq!(controls, vec!["Throttle(Lever)"]);
        assert!(tree.child("Horn").is_some());
        Ok(())
    }
}
