//! Core types for the branching layout engine

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A 2D point in the layout coordinate system.
///
/// `y` grows downward, away from the roots of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point moved horizontally by `dx`
    pub fn shifted_x(&self, dx: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
        }
    }
}

/// A computed placement that has not been committed to a node yet
pub type TreePosition = Point;

/// A node of the flow graph as owned by the graph store.
///
/// Only `position` is ever rewritten by the engine. Fields the engine does not
/// understand are kept in `extra` so they survive a round trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub position: Point,
    #[serde(default)]
    pub data: NodeData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            position: Point::new(x, y),
            data: NodeData::default(),
            extra: Map::new(),
        }
    }

    /// Set the semantic node type
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.data.node_type = Some(node_type.into());
        self
    }

    /// Attach a branch configuration, making this a conditional node
    pub fn with_condition(mut self, condition: ConditionConfig) -> Self {
        self.data.condition = Some(condition);
        self
    }
}

/// Node payload: semantic type, optional branch configuration, anything else
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionConfig>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Declared return type of a conditional node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    #[default]
    #[serde(alias = "bool")]
    Boolean,
    String,
    #[serde(alias = "int", alias = "number")]
    Integer,
}

impl ReturnType {
    /// String and integer conditionals branch N ways on their case values
    pub fn is_multi_way(self) -> bool {
        matches!(self, ReturnType::String | ReturnType::Integer)
    }
}

/// Branch configuration of a conditional node.
///
/// `cases` is kept as raw JSON: either a list or a string holding a JSON list,
/// exactly as the editor stores it. It is only interpreted when branch
/// descriptors are resolved, and malformed content degrades to no cases.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default)]
    pub return_type: ReturnType,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub cases: Value,
}

impl ConditionConfig {
    /// Plain true/false conditional
    pub fn binary() -> Self {
        Self::default()
    }

    /// N-way conditional over the given case list
    pub fn multi_way(return_type: ReturnType, cases: impl Into<Value>) -> Self {
        Self {
            return_type,
            cases: cases.into(),
        }
    }
}

/// A directed edge; `source_handle` names the branch of the source it leaves from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Edge out of a non-branching node
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            source_handle: None,
            extra: Map::new(),
        }
    }

    /// Edge leaving `source` through the branch named `handle`
    pub fn branch(
        source: impl Into<String>,
        handle: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source_handle: Some(handle.into()),
            ..Self::new(source, target)
        }
    }
}

/// Horizontal extent of a set of node footprints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    /// Right edge of the rightmost footprint (its x plus the node width)
    pub max_x: f64,
}

impl Extent {
    /// Extent of a single footprint starting at `x`
    pub fn of_footprint(x: f64, width: f64) -> Self {
        Self {
            min_x: x,
            max_x: x + width,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Smallest extent containing both
    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
        }
    }

    /// Empty space between two extents, negative when they overlap
    pub fn distance_to(&self, other: &Extent) -> f64 {
        (other.min_x - self.max_x).max(self.min_x - other.max_x)
    }
}

/// One branch of a conditional node, in canonical left-to-right order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDescriptor {
    /// Value matched against an edge's `source_handle`
    pub id: String,
    pub label: String,
    pub index: usize,
}

/// Outcome of a same-row footprint test
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollisionResult {
    pub has_collision: bool,
    pub colliding_node: Option<String>,
    /// Rightward shift needed to clear the worst collision
    pub required_shift: Option<f64>,
}

impl CollisionResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn hit(node: impl Into<String>, required_shift: f64) -> Self {
        Self {
            has_collision: true,
            colliding_node: Some(node.into()),
            required_shift: Some(required_shift),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extent_distance() {
        let a = Extent::of_footprint(0.0, 200.0);
        let b = Extent::of_footprint(250.0, 200.0);
        assert_eq!(a.distance_to(&b), 50.0);
        assert_eq!(b.distance_to(&a), 50.0);
        assert_eq!(a.union(&b).width(), 450.0);
    }

    #[test]
    fn test_extent_overlap_is_negative() {
        let a = Extent::of_footprint(0.0, 200.0);
        let b = Extent::of_footprint(50.0, 200.0);
        assert_eq!(a.distance_to(&b), -150.0);
    }

    #[test]
    fn test_node_wire_format() {
        let node: Node = serde_json::from_value(json!({
            "id": "c1",
            "position": { "x": 10.0, "y": 20.0 },
            "data": {
                "type": "condition",
                "label": "Is adult?",
                "condition": { "returnType": "string", "cases": "[\"a\", \"b\"]" }
            },
            "selected": true
        }))
        .unwrap();

        assert_eq!(node.position, Point::new(10.0, 20.0));
        assert_eq!(node.data.node_type.as_deref(), Some("condition"));
        assert_eq!(node.data.extra["label"], json!("Is adult?"));
        assert_eq!(node.extra["selected"], json!(true));
        let condition = node.data.condition.as_ref().unwrap();
        assert!(condition.return_type.is_multi_way());

        let back = serde_json::to_value(&node).unwrap();
        assert_eq!(back["data"]["label"], json!("Is adult?"));
        assert_eq!(back["selected"], json!(true));
    }

    #[test]
    fn test_edge_wire_format() {
        let edge: Edge = serde_json::from_value(json!({
            "id": "e1",
            "source": "c1",
            "target": "n2",
            "sourceHandle": "true"
        }))
        .unwrap();
        assert_eq!(edge, {
            let mut expected = Edge::branch("c1", "true", "n2");
            expected.id = Some("e1".to_string());
            expected
        });
    }

    #[test]
    fn test_return_type_aliases() {
        let rt: ReturnType = serde_json::from_value(json!("int")).unwrap();
        assert_eq!(rt, ReturnType::Integer);
        assert!(!ReturnType::Boolean.is_multi_way());
    }
}
