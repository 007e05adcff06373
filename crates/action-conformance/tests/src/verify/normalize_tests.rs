use serde_json::{Value, json};
use tower_lsp::jsonrpc::{Error, Id, Response};

use super::*;

fn response_with_result(result: Value) -> Response {
    Response::from_ok(Id::Number(4), result)
}

#[test]
fn resolves_both_protocol_shapes() {
    let response = response_with_result(json!([
        {
            "title": "Document this",
            "command": "ballerina.action.doc",
            "arguments": [{ "key": "node.line", "value": "4" }]
        },
        {
            "title": "Add return type",
            "edit": {
                "documentChanges": [
                    {
                        "textDocument": { "uri": "file:///srv/main.bal", "version": 1 },
                        "edits": [
                            {
                                "range": {
                                    "start": { "line": 4, "character": 38 },
                                    "end": { "line": 4, "character": 38 }
                                },
                                "newText": " returns error?"
                            }
                        ]
                    }
                ]
            }
        }
    ]));
    let actions = normalize(&response).expect("response normalizes");
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].title, "Document this");
    assert!(actions[0].edit.is_none());
    assert!(actions[0].command.is_some());
    assert_eq!(actions[1].title, "Add return type");
    assert!(actions[1].edit.is_some());
    assert!(actions[1].command.is_none());
}

#[test]
fn skips_entries_that_resolve_to_neither_shape() {
    let response = response_with_result(json!([
        { "not": "an action" },
        { "title": "Create variable", "command": { "title": "Create variable", "command": "CREATE_VAR" } }
    ]));
    let actions = normalize(&response).expect("response normalizes");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].title, "Create variable");
}

#[test]
fn null_result_is_an_empty_offer_list() {
    let response = response_with_result(Value::Null);
    assert_eq!(normalize(&response).expect("response normalizes"), Vec::new());
}

#[test]
fn error_reply_is_malformed() {
    let response = Response::from_error(Id::Number(4), Error::internal_error());
    assert!(matches!(normalize(&response), Err(MalformedResponse::ErrorReply { .. })));
}

#[test]
fn non_array_result_is_malformed() {
    let response = response_with_result(json!({ "result": [] }));
    assert!(matches!(
        normalize(&response),
        Err(MalformedResponse::UnexpectedShape { found: "an object" })
    ));
}

#[test]
fn normalization_is_deterministic() {
    let response = response_with_result(json!([
        { "title": "Add return type", "edit": { "documentChanges": [] } },
        { "title": "Document this", "command": "ballerina.action.doc" }
    ]));
    assert_eq!(
        normalize(&response).expect("first run"),
        normalize(&response).expect("second run")
    );
}

#[test]
fn correlation_id_does_not_affect_the_outcome() {
    let payload = json!([{ "title": "Create function", "command": "CREATE_FUNC" }]);
    let first = Response::from_ok(Id::Number(1), payload.clone());
    let second = Response::from_ok(Id::String("other".to_string()), payload);
    assert_eq!(
        normalize(&first).expect("first response"),
        normalize(&second).expect("second response")
    );
}
