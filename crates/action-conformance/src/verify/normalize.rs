use std::fmt::{Display, Formatter};

use serde_json::Value;
use tower_lsp::{
    jsonrpc::Response,
    lsp_types::{CodeActionOrCommand, Command, WorkspaceEdit},
};

/// One code action offered by the tooling service, reduced to the fields the
/// matcher compares.
///
/// Transient: lives for a single request/response cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualAction {
    pub title: String,
    pub edit: Option<WorkspaceEdit>,
    pub command: Option<Command>,
}

/// Parse a raw code-action response into [`ActualAction`]s.
///
/// The correlation id is discarded before anything is compared, so two
/// responses differing only in their id normalize identically. A null result
/// is an empty offer list. Entries that resolve to neither protocol shape
/// (plain command, rich payload) are skipped rather than treated as errors.
pub fn normalize(response: &Response) -> Result<Vec<ActualAction>, MalformedResponse> {
    if let Some(error) = response.error() {
        return Err(MalformedResponse::ErrorReply {
            message: error.to_string(),
        });
    }
    let payload = response.result().cloned().unwrap_or(Value::Null);
    let entries = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => {
            return Err(MalformedResponse::UnexpectedShape {
                found: json_kind(&other),
            });
        },
    };
    Ok(entries.into_iter().filter_map(resolve_entry).collect())
}

fn resolve_entry(entry: Value) -> Option<ActualAction> {
    match serde_json::from_value::<CodeActionOrCommand>(entry).ok()? {
        CodeActionOrCommand::Command(command) => Some(ActualAction {
            title: command.title.clone(),
            edit: None,
            command: Some(command),
        }),
        CodeActionOrCommand::CodeAction(action) => Some(ActualAction {
            title: action.title,
            edit: action.edit,
            command: action.command,
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The code-action response does not have the shape the fixture demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedResponse {
    /// The service answered the request with a jsonrpc error.
    ErrorReply { message: String },
    /// The result payload is neither an action array nor null.
    UnexpectedShape { found: &'static str },
}

impl Display for MalformedResponse {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::ErrorReply {
                message,
            } => {
                write!(f, "the service rejected the code-action request: {message}")
            },
            Self::UnexpectedShape {
                found,
            } => {
                write!(f, "expected an action array in the response, found {found}")
            },
        }
    }
}

impl std::error::Error for MalformedResponse {}

#[cfg(test)]
#[path = "../../tests/src/verify/normalize_tests.rs"]
mod tests;
