use serde_json::json;

use super::*;

#[test]
fn recognizes_publishes_for_the_requested_document() {
    let uri = Url::parse("file:///srv/main.bal").expect("valid uri");
    let notification = Request::build("textDocument/publishDiagnostics")
        .params(json!({
            "uri": "file:///srv/main.bal",
            "diagnostics": [
                {
                    "range": { "start": { "line": 0, "character": 0 }, "end": { "line": 0, "character": 1 } },
                    "message": "unused import"
                }
            ]
        }))
        .finish();
    let publish = publish_for_uri(&notification, &uri).expect("publish for the document");
    assert_eq!(publish.diagnostics.len(), 1);
    assert_eq!(publish.diagnostics[0].message, "unused import");
}

#[test]
fn ignores_other_documents_and_other_methods() {
    let uri = Url::parse("file:///srv/main.bal").expect("valid uri");
    let other_document = Request::build("textDocument/publishDiagnostics")
        .params(json!({ "uri": "file:///srv/other.bal", "diagnostics": [] }))
        .finish();
    assert!(publish_for_uri(&other_document, &uri).is_none());

    let log_message = Request::build("window/logMessage")
        .params(json!({ "type": 3, "message": "compiled" }))
        .finish();
    assert!(publish_for_uri(&log_message, &uri).is_none());
}

#[test]
fn derives_language_ids_from_extensions() {
    assert_eq!(language_id_for(Path::new("src/service.bal")), "bal");
    assert_eq!(language_id_for(Path::new("query.sql")), "sql");
    assert_eq!(language_id_for(Path::new("Dockerfile")), "plaintext");
}
