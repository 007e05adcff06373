//! Structural comparison between expected and offered code actions.
//!
//! Comparison is layered: a title gate, an exact ordered edit-list gate, and
//! a command gate whose arguments are matched as a subset. The only fuzzy
//! rule in the whole engine is the file-identity exception for [`DOC_URI_KEY`]
//! arguments, and it stays confined to that key.

use std::{
    fmt::{Display, Formatter},
    path::Path,
};

use serde_json::Value;
use tower_lsp::lsp_types::{
    AnnotatedTextEdit, Command, DocumentChangeOperation, DocumentChanges, OneOf, Position, TextEdit, Url, WorkspaceEdit,
};

use crate::{
    fixture::{ExpectedAction, ExpectedCommand},
    verify::normalize::ActualAction,
};

/// Argument key whose value names the document a command targets.
///
/// Values under this key are location references, not literals: the expected
/// and actual documents may live under different filesystem roots, so only
/// the file-name component takes part in the comparison. No other key gets
/// this treatment.
pub const DOC_URI_KEY: &str = "doc.uri";

/// An expectation no offered action satisfied, with the cursor it was
/// evaluated at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub title: String,
    pub cursor: Position,
}

impl Display for MatchFailure {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "cannot find a matching code action for \"{}\", cursor at {}:{}",
            self.title, self.cursor.line, self.cursor.character
        )
    }
}

/// Find the first offered action satisfying `expected`, if any.
///
/// Order among the actuals cannot change the verdict: at most one structural
/// match is required, so the first satisfying action wins.
pub fn find_match<'a>(
    expected: &ExpectedAction,
    actuals: &'a [ActualAction],
) -> Option<&'a ActualAction> {
    actuals.iter().find(|actual| satisfies(expected, actual))
}

fn satisfies(
    expected: &ExpectedAction,
    actual: &ActualAction,
) -> bool {
    // An action with neither an edit nor a command is an unresolved stub.
    if actual.edit.is_none() && actual.command.is_none() {
        return false;
    }
    if actual.title != expected.title {
        return false;
    }
    if let Some(expected_edits) = &expected.edits {
        if !edits_match(expected_edits, actual.edit.as_ref()) {
            return false;
        }
    }
    if let Some(expected_command) = &expected.command {
        if !command_matches(expected_command, actual.command.as_ref()) {
            return false;
        }
    }
    true
}

/// Exact ordered comparison of the first changed document's edit list.
fn edits_match(
    expected: &[Value],
    edit: Option<&WorkspaceEdit>,
) -> bool {
    let Some(actual) = edit.and_then(first_document_edits) else {
        return false;
    };
    match serde_json::to_value(actual) {
        Ok(Value::Array(actual)) => actual.as_slice() == expected,
        _ => false,
    }
}

fn first_document_edits(edit: &WorkspaceEdit) -> Option<&[OneOf<TextEdit, AnnotatedTextEdit>]> {
    match edit.document_changes.as_ref()? {
        DocumentChanges::Edits(edits) => Some(edits.first()?.edits.as_slice()),
        DocumentChanges::Operations(operations) => match operations.first()? {
            DocumentChangeOperation::Edit(edit) => Some(edit.edits.as_slice()),
            DocumentChangeOperation::Op(_) => None,
        },
    }
}

fn command_matches(
    expected: &ExpectedCommand,
    command: Option<&Command>,
) -> bool {
    let Some(actual) = command else {
        return false;
    };
    // A missing expected field never matches a present actual one.
    if expected.command.as_deref() != Some(actual.command.as_str()) {
        return false;
    }
    if expected.title.as_deref() != Some(actual.title.as_str()) {
        return false;
    }
    let actual_arguments = actual.arguments.as_deref().unwrap_or(&[]);
    expected.arguments.iter().all(|argument| argument_present(argument, actual_arguments))
}

fn argument_present(
    expected: &Value,
    actuals: &[Value],
) -> bool {
    if is_document_identity(expected) {
        let Some(expected_name) = location_value(expected).and_then(file_name_of_location) else {
            return false;
        };
        return actuals.iter().any(|candidate| {
            is_document_identity(candidate)
                && location_value(candidate).and_then(file_name_of_location).is_some_and(|name| name == expected_name)
        });
    }
    actuals.iter().any(|candidate| candidate == expected)
}

fn is_document_identity(argument: &Value) -> bool {
    argument.get("key").and_then(Value::as_str) == Some(DOC_URI_KEY)
}

fn location_value(argument: &Value) -> Option<&str> {
    argument.get("value").and_then(Value::as_str)
}

/// Reduce a location reference to its file-name component.
///
/// Accepts `file:` URIs and schemeless paths; anything else fails to
/// resolve, which fails the identity check for the candidate at hand.
fn file_name_of_location(location: &str) -> Option<String> {
    let path = match Url::parse(location) {
        Ok(url) => url.to_file_path().ok()?,
        Err(_) => Path::new(location).to_path_buf(),
    };
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
#[path = "../../tests/src/verify/matcher_tests.rs"]
mod tests;
