use serde_json::Value;
use tower_lsp::{
    jsonrpc::Request,
    lsp_types::{CodeActionContext, CodeActionParams, Diagnostic, Position, Range, TextDocumentIdentifier, Url},
};

/// Build a `textDocument/codeAction` request for the cursor position.
///
/// The request range is zero-width (start == end == cursor) and the context
/// carries exactly the diagnostics the caller filtered to that cursor.
pub fn code_action_request(
    id: i64,
    uri: &Url,
    cursor: Position,
    diagnostics: Vec<Diagnostic>,
) -> Request {
    let params = CodeActionParams {
        text_document: TextDocumentIdentifier { uri: uri.clone() },
        range: Range { start: cursor, end: cursor },
        context: CodeActionContext { diagnostics, only: None, trigger_kind: None },
        work_done_progress_params: Default::default(),
        partial_result_params: Default::default(),
    };
    Request::build("textDocument/codeAction").params(params_value(&params)).id(id).finish()
}

pub(crate) fn params_value<P: serde::Serialize>(params: &P) -> Value {
    serde_json::to_value(params).expect("LSP message params serialize to JSON")
}

#[cfg(test)]
#[path = "../../tests/src/verify/request_tests.rs"]
mod tests;
