use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use dashmap::DashMap;
use serde_json::{Value, json};
use tower_lsp::{
    jsonrpc::{Request, Response},
    lsp_types::{
        Diagnostic, DidCloseTextDocumentParams, DidOpenTextDocumentParams, Position, PublishDiagnosticsParams,
        TextDocumentIdentifier, TextDocumentItem, Url,
    },
};
use tracing::{debug, info, warn};

use crate::{
    endpoint::{Endpoint, TransportError},
    verify::request::{code_action_request, params_value},
};

/// An initialized protocol session with the tooling service.
///
/// Created once before any test case runs and torn down once after all of
/// them. Individual cases borrow the session, open their document, query,
/// and close the document again, so no case leaks state into the next.
pub struct ToolingSession<E: Endpoint> {
    endpoint: E,

    /// Documents currently open in the service, keyed by their URI.
    open_documents: DashMap<Url, PathBuf>,

    /// Monotonic correlation-id source for requests on this session.
    next_request_id: i64,
}

impl<E: Endpoint> ToolingSession<E> {
    /// Perform the `initialize`/`initialized` handshake over `endpoint`.
    pub async fn initialize(endpoint: E) -> Result<Self, SessionError> {
        let mut session = Self {
            endpoint,
            open_documents: DashMap::new(),
            next_request_id: 0,
        };
        let reply = session.request("initialize", Some(json!({ "capabilities": {} }))).await?;
        if let Some(error) = reply.error() {
            return Err(SessionError::Rejected {
                method: "initialize",
                reason: error.to_string(),
            });
        }
        session.notify("initialized", Some(json!({}))).await?;
        info!("tooling session initialized");
        Ok(session)
    }

    /// Open `path` in the service and return the document's URI.
    pub async fn open_document(
        &mut self,
        path: &Path,
    ) -> Result<Url, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|error| SessionError::UnreadableDocument {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        let absolute = path.canonicalize().map_err(|error| SessionError::UnreadableDocument {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        let uri =
            Url::from_file_path(&absolute).map_err(|()| SessionError::InvalidDocumentPath { path: absolute.clone() })?;
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri: uri.clone(),
                language_id: language_id_for(path),
                version: 1,
                text,
            },
        };
        self.notify("textDocument/didOpen", Some(params_value(&params))).await?;
        self.open_documents.insert(uri.clone(), absolute);
        debug!(%uri, "opened document");
        Ok(uri)
    }

    /// Close a document previously opened through this session.
    pub async fn close_document(
        &mut self,
        uri: &Url,
    ) -> Result<(), SessionError> {
        let params = DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
        };
        self.notify("textDocument/didClose", Some(params_value(&params))).await?;
        if self.open_documents.remove(uri).is_none() {
            warn!(%uri, "closed a document this session never opened");
        }
        debug!(%uri, "closed document");
        Ok(())
    }

    /// Wait for the diagnostics the service publishes for `uri`.
    ///
    /// Publishes for other documents and unrelated notifications are skipped.
    /// The warm-session precondition applies: the service is expected to
    /// publish diagnostics for every document it is asked to open.
    pub async fn wait_for_diagnostics(
        &mut self,
        uri: &Url,
    ) -> Result<Vec<Diagnostic>, SessionError> {
        loop {
            let notification = self.endpoint.next_notification().await?;
            if let Some(publish) = publish_for_uri(&notification, uri) {
                debug!(%uri, count = publish.diagnostics.len(), "received published diagnostics");
                return Ok(publish.diagnostics);
            }
        }
    }

    /// Issue one `textDocument/codeAction` request and return the raw reply.
    pub async fn code_actions(
        &mut self,
        uri: &Url,
        cursor: Position,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<Response, SessionError> {
        let id = self.next_request_id();
        let request = code_action_request(id, uri, cursor, diagnostics);
        let reply = self.endpoint.call(request).await?;
        reply.ok_or(SessionError::MissingReply {
            method: "textDocument/codeAction",
        })
    }

    /// End the session with the `shutdown`/`exit` sequence.
    pub async fn shutdown(mut self) -> Result<(), SessionError> {
        if !self.open_documents.is_empty() {
            warn!(open = self.open_documents.len(), "shutting down with documents still open");
        }
        let reply = self.request("shutdown", None).await?;
        if let Some(error) = reply.error() {
            return Err(SessionError::Rejected {
                method: "shutdown",
                reason: error.to_string(),
            });
        }
        self.notify("exit", None).await?;
        info!("tooling session shut down");
        Ok(())
    }

    async fn request(
        &mut self,
        method: &'static str,
        params: Option<Value>,
    ) -> Result<Response, SessionError> {
        let id = self.next_request_id();
        let mut builder = Request::build(method).id(id);
        if let Some(params) = params {
            builder = builder.params(params);
        }
        let reply = self.endpoint.call(builder.finish()).await?;
        reply.ok_or(SessionError::MissingReply { method })
    }

    async fn notify(
        &mut self,
        method: &'static str,
        params: Option<Value>,
    ) -> Result<(), SessionError> {
        let mut builder = Request::build(method);
        if let Some(params) = params {
            builder = builder.params(params);
        }
        if self.endpoint.call(builder.finish()).await?.is_some() {
            warn!(method, "notification unexpectedly produced a reply");
        }
        Ok(())
    }

    fn next_request_id(&mut self) -> i64 {
        self.next_request_id += 1;
        self.next_request_id
    }
}

fn publish_for_uri(
    notification: &Request,
    uri: &Url,
) -> Option<PublishDiagnosticsParams> {
    if notification.method() != "textDocument/publishDiagnostics" {
        return None;
    }
    let params: PublishDiagnosticsParams = serde_json::from_value(notification.params().cloned()?).ok()?;
    (params.uri == *uri).then_some(params)
}

fn language_id_for(path: &Path) -> String {
    path.extension().and_then(|extension| extension.to_str()).unwrap_or("plaintext").to_string()
}

/// The session could not complete a lifecycle step for the current case.
#[derive(Debug)]
pub enum SessionError {
    Transport(TransportError),
    UnreadableDocument {
        path: PathBuf,
        reason: String,
    },
    InvalidDocumentPath {
        path: PathBuf,
    },
    MissingReply {
        method: &'static str,
    },
    Rejected {
        method: &'static str,
        reason: String,
    },
}

impl From<TransportError> for SessionError {
    fn from(error: TransportError) -> Self {
        Self::Transport(error)
    }
}

impl Display for SessionError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::Transport(error) => write!(f, "{error}"),
            Self::UnreadableDocument {
                path,
                reason,
            } => {
                write!(f, "cannot read document {}: {reason}", path.display())
            },
            Self::InvalidDocumentPath {
                path,
            } => {
                write!(f, "document path {} cannot be expressed as a file URI", path.display())
            },
            Self::MissingReply {
                method,
            } => {
                write!(f, "{method} returned no reply")
            },
            Self::Rejected {
                method,
                reason,
            } => {
                write!(f, "{method} was rejected by the service: {reason}")
            },
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(test)]
#[path = "../tests/src/session_tests.rs"]
mod tests;
