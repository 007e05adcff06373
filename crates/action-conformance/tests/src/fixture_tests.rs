use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use super::*;

fn unique_fixture_dir(test_name: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time should be after UNIX_EPOCH")
        .as_nanos();
    std::env::temp_dir().join(format!("action-conformance-{test_name}-{}-{unique}", std::process::id()))
}

fn write_config(
    root: &Path,
    name: &str,
    config: serde_json::Value,
) {
    std::fs::write(root.join("config").join(name), serde_json::to_string(&config).expect("config serializes"))
        .expect("config should be written");
}

#[test]
fn parses_a_full_case_config() {
    let config: CaseConfig = serde_json::from_value(json!({
        "line": 10,
        "character": 5,
        "source": "service.bal",
        "expected": [
            {
                "title": "Add return type",
                "command": {
                    "command": "ADD_RETURN_TYPE",
                    "title": "Add return type",
                    "arguments": [{ "key": "doc.uri", "value": "file:///srv/service.bal" }]
                }
            },
            {
                "title": "Document this",
                "edits": [
                    {
                        "range": { "start": { "line": 9, "character": 0 }, "end": { "line": 9, "character": 0 } },
                        "newText": "# Returns a greeting.\n"
                    }
                ]
            }
        ]
    }))
    .expect("config deserializes");
    assert_eq!(config.cursor(), Position::new(10, 5));
    assert_eq!(config.expected.len(), 2);
    let command = config.expected[0].command.as_ref().expect("expected command");
    assert_eq!(command.command.as_deref(), Some("ADD_RETURN_TYPE"));
    assert_eq!(command.arguments.len(), 1);
    assert!(config.expected[0].edits.is_none());
    assert_eq!(config.expected[1].edits.as_ref().expect("expected edits").len(), 1);
}

#[test]
fn optional_fields_default_to_absent() {
    let config: CaseConfig = serde_json::from_value(json!({
        "line": 0,
        "character": 0,
        "expected": [{ "title": "Create variable" }]
    }))
    .expect("config deserializes");
    assert!(config.source.is_none());
    assert!(config.expected[0].command.is_none());
    assert!(config.expected[0].edits.is_none());
}

#[test]
fn discovery_pairs_configs_with_their_sources() {
    let root = unique_fixture_dir("discovery");
    std::fs::create_dir_all(root.join("config")).expect("config dir");
    std::fs::create_dir_all(root.join("source")).expect("source dir");
    std::fs::write(root.join("source/service.bal"), "service / on ep {\n}\n").expect("source file");
    for name in ["b_case.json", "a_case.json"] {
        write_config(&root, name, json!({ "line": 1, "character": 2, "source": "service.bal", "expected": [] }));
    }
    std::fs::write(root.join("config/notes.txt"), "not a case").expect("stray file");

    let cases = discover_cases(&root).expect("discovery succeeds");
    assert_eq!(cases.len(), 2);
    assert!(cases[0].config.ends_with("a_case.json"));
    assert!(cases[1].config.ends_with("b_case.json"));
    assert!(cases.iter().all(|case| case.source.ends_with("service.bal")));

    std::fs::remove_dir_all(&root).expect("cleanup");
}

#[test]
fn discovery_rejects_configs_without_a_source() {
    let root = unique_fixture_dir("no-source-field");
    std::fs::create_dir_all(root.join("config")).expect("config dir");
    std::fs::create_dir_all(root.join("source")).expect("source dir");
    write_config(&root, "case.json", json!({ "line": 0, "character": 0, "expected": [] }));

    assert!(matches!(discover_cases(&root), Err(FixtureError::MissingSource { .. })));

    std::fs::remove_dir_all(&root).expect("cleanup");
}

#[test]
fn discovery_rejects_missing_source_documents() {
    let root = unique_fixture_dir("missing-source-file");
    std::fs::create_dir_all(root.join("config")).expect("config dir");
    std::fs::create_dir_all(root.join("source")).expect("source dir");
    write_config(&root, "case.json", json!({ "line": 0, "character": 0, "source": "gone.bal", "expected": [] }));

    assert!(matches!(discover_cases(&root), Err(FixtureError::SourceNotFound { .. })));

    std::fs::remove_dir_all(&root).expect("cleanup");
}

#[test]
fn load_reports_unreadable_and_unparsable_configs() {
    let root = unique_fixture_dir("bad-configs");
    std::fs::create_dir_all(&root).expect("root dir");

    assert!(matches!(CaseConfig::load(&root.join("absent.json")), Err(FixtureError::Unreadable { .. })));

    let garbled = root.join("garbled.json");
    std::fs::write(&garbled, "not json at all").expect("garbled file");
    assert!(matches!(CaseConfig::load(&garbled), Err(FixtureError::Parse { .. })));

    std::fs::remove_dir_all(&root).expect("cleanup");
}
