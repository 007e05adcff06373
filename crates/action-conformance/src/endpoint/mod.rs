//! Protocol endpoints the conformance session talks through.
//!
//! The tooling service is a black box: the session only needs to issue one
//! message at a time and observe server-initiated notifications. Two bindings
//! are provided, an in-process [`tower_lsp::LspService`] for embedders and
//! tests, and a child process speaking framed JSON-RPC over stdio.

mod stdio;

pub use stdio::StdioEndpoint;

use std::{
    collections::VecDeque,
    fmt::{Display, Formatter},
};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tower::{Service, ServiceExt};
use tower_lsp::{
    ClientSocket, LanguageServer, LspService,
    jsonrpc::{Request, Response},
};

/// A request/response channel to the tooling service.
///
/// `call` issues exactly one protocol message and, for requests carrying an
/// id, waits for the correlated reply. Server-initiated notifications seen
/// while waiting are buffered for
/// [`next_notification`](Endpoint::next_notification); server-initiated
/// requests are answered with a synthetic null reply so the exchange cannot
/// deadlock on a client feature this harness does not offer.
#[tower_lsp::async_trait]
pub trait Endpoint: Send {
    async fn call(
        &mut self,
        request: Request,
    ) -> Result<Option<Response>, TransportError>;

    /// Wait for the next buffered or incoming server notification.
    async fn next_notification(&mut self) -> Result<Request, TransportError>;
}

/// Endpoint over an in-process [`LspService`].
pub struct InProcessEndpoint<S: LanguageServer> {
    service: LspService<S>,
    socket: ClientSocket,
    pending: VecDeque<Request>,
}

impl<S: LanguageServer> InProcessEndpoint<S> {
    pub fn new(
        service: LspService<S>,
        socket: ClientSocket,
    ) -> Self {
        Self {
            service,
            socket,
            pending: VecDeque::new(),
        }
    }
}

#[tower_lsp::async_trait]
impl<S: LanguageServer> Endpoint for InProcessEndpoint<S> {
    async fn call(
        &mut self,
        request: Request,
    ) -> Result<Option<Response>, TransportError> {
        let Self {
            service,
            socket,
            pending,
        } = self;
        let mut call = Box::pin(async {
            let ready = service.ready().await.map_err(|_| TransportError::ChannelClosed)?;
            ready.call(request).await.map_err(|_| TransportError::ChannelClosed)
        });

        loop {
            tokio::select! {
                outcome = &mut call => return outcome,
                incoming = socket.next() => {
                    let Some(incoming) = incoming else {
                        return Err(TransportError::ChannelClosed);
                    };
                    if let Some(id) = incoming.id().cloned() {
                        socket
                            .send(Response::from_ok(id, Value::Null))
                            .await
                            .map_err(|_| TransportError::ChannelClosed)?;
                    } else {
                        pending.push_back(incoming);
                    }
                }
            }
        }
    }

    async fn next_notification(&mut self) -> Result<Request, TransportError> {
        if let Some(buffered) = self.pending.pop_front() {
            return Ok(buffered);
        }
        loop {
            let Some(incoming) = self.socket.next().await else {
                return Err(TransportError::ChannelClosed);
            };
            if let Some(id) = incoming.id().cloned() {
                self.socket
                    .send(Response::from_ok(id, Value::Null))
                    .await
                    .map_err(|_| TransportError::ChannelClosed)?;
                continue;
            }
            return Ok(incoming);
        }
    }
}

/// The protocol call itself failed, at the process or channel level.
///
/// Fatal to the current test case and never retried: a code-action query is
/// not assumed safe to replay against a possibly-corrupted session.
#[derive(Debug)]
pub enum TransportError {
    /// The tooling server process could not be spawned.
    SpawnFailed {
        command: String,
        reason: String,
    },
    /// The channel to the service closed before the exchange completed.
    ChannelClosed,
    /// The peer violated the framing or JSON-RPC contract.
    Protocol {
        reason: String,
    },
    /// Reading from or writing to the service failed.
    Io {
        reason: String,
    },
}

impl Display for TransportError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::SpawnFailed {
                command,
                reason,
            } => {
                write!(f, "failed to launch {command}: {reason}")
            },
            Self::ChannelClosed => write!(f, "the tooling service channel closed unexpectedly"),
            Self::Protocol {
                reason,
            } => {
                write!(f, "protocol violation: {reason}")
            },
            Self::Io {
                reason,
            } => {
                write!(f, "transport i/o failed: {reason}")
            },
        }
    }
}

impl std::error::Error for TransportError {}
