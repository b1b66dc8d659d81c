//! Integration tests for the JSON document pipeline

use branch_layout::layout::{ConditionConfig, ReturnType};
use branch_layout::{
    layout_document, layout_json_with_config, BranchEngine, GraphDocument, GraphError,
    LayoutConfig, Node,
};
use serde_json::{json, Value};

const EDITOR_GRAPH: &str = r#"{
    "nodes": [
        {
            "id": "check",
            "type": "custom",
            "position": { "x": 0, "y": 0 },
            "data": {
                "type": "ifElse",
                "label": "Is adult?",
                "condition": { "returnType": "boolean" }
            },
            "selected": true
        },
        { "id": "yes", "position": { "x": 0, "y": 350 }, "data": { "type": "sendEmail" } },
        { "id": "no", "position": { "x": 50, "y": 350 }, "data": { "type": "wait", "minutes": 5 } }
    ],
    "edges": [
        { "id": "e1", "source": "check", "target": "yes", "sourceHandle": "true", "animated": true },
        { "id": "e2", "source": "check", "target": "no", "sourceHandle": "false" }
    ]
}"#;

fn x_of(doc: &Value, index: usize) -> f64 {
    doc["nodes"][index]["position"]["x"]
        .as_f64()
        .expect("x should be a number")
}

#[test]
fn test_positions_change_payloads_survive() {
    let output = layout_json_with_config(EDITOR_GRAPH, &LayoutConfig::default())
        .expect("Should lay out");
    let before: Value = serde_json::from_str(EDITOR_GRAPH).unwrap();
    let after: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(x_of(&after, 1), -135.0);
    assert_eq!(x_of(&after, 2), 185.0);

    assert_eq!(after["edges"], before["edges"]);
    for i in 0..3 {
        assert_eq!(after["nodes"][i]["data"], before["nodes"][i]["data"]);
        assert_eq!(after["nodes"][i]["id"], before["nodes"][i]["id"]);
    }
    assert_eq!(after["nodes"][0]["selected"], json!(true));
    assert_eq!(after["nodes"][0]["type"], json!("custom"));
}

#[test]
fn test_toml_overrides_apply() {
    let config = LayoutConfig::from_str("min_branch_gap = 20.0").expect("Should parse");
    assert_eq!(config.node_width, 200.0);

    let output = layout_json_with_config(EDITOR_GRAPH, &config).expect("Should lay out");
    let after: Value = serde_json::from_str(&output).unwrap();
    // 200 - 50 + 20 = 170, half plus 10 each way
    assert_eq!(x_of(&after, 1), -95.0);
    assert_eq!(x_of(&after, 2), 145.0);
}

#[test]
fn test_invalid_document_reports_location() {
    let source = "{\n  \"nodes\": [\n    { \"id\": 1 }\n  ]\n}";
    let err = GraphDocument::from_json(source).unwrap_err();
    match &err {
        GraphError::Json { line, .. } => assert_eq!(*line, 3),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.format(source, "flow.json").contains("flow.json"));
}

#[test]
fn test_custom_catalog() {
    let config = LayoutConfig::default();
    let by_type = |node: &Node| match node.data.node_type.as_deref() {
        Some("router") => Some(ConditionConfig::multi_way(
            ReturnType::Integer,
            json!([1, 2]),
        )),
        _ => None,
    };
    let engine = BranchEngine::with_catalog(config, by_type);

    let doc = GraphDocument::new(
        vec![
            Node::new("r", 0.0, 0.0).with_type("router"),
            Node::new("stray", 100.0, 350.0),
        ],
        vec![],
    );
    let branches: Vec<String> = engine
        .multi_condition_branches(&doc.nodes[0])
        .into_iter()
        .map(|branch| branch.id)
        .collect();
    assert_eq!(branches, vec!["1", "2", "else"]);

    // Bracket spans -220..420, padded by 180: stray is pushed right
    let report = engine.expand_branches_with_report(&doc.nodes, &doc.edges);
    assert_eq!(report.nodes[1].position.x, 600.0);

    // The payload catalog sees no conditional and leaves stray alone
    let plain = layout_document(&doc, &LayoutConfig::default());
    assert_eq!(plain.nodes[1].position.x, 100.0);
}
