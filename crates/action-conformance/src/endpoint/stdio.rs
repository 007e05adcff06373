use std::{collections::VecDeque, process::Stdio};

use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, ChildStdout, Command},
};
use tower_lsp::jsonrpc::{Request, Response};
use tracing::debug;

use super::{Endpoint, TransportError};

/// Endpoint over a tooling server spawned as a child process.
///
/// Speaks Content-Length framed JSON-RPC on the child's stdin/stdout, the
/// same wire format `tower_lsp::Server` consumes on the other side. The child
/// is killed if the endpoint is dropped mid-session, so an aborted run never
/// leaks a server process.
pub struct StdioEndpoint {
    _child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    pending: VecDeque<Request>,
}

impl StdioEndpoint {
    pub fn spawn(
        command: &str,
        args: &[String],
    ) -> Result<Self, TransportError> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| TransportError::SpawnFailed {
                command: command.to_string(),
                reason: error.to_string(),
            })?;
        let stdin = child.stdin.take().ok_or_else(|| TransportError::SpawnFailed {
            command: command.to_string(),
            reason: "stdin was not captured".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| TransportError::SpawnFailed {
            command: command.to_string(),
            reason: "stdout was not captured".to_string(),
        })?;
        debug!(command, "spawned tooling server");
        Ok(Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout),
            pending: VecDeque::new(),
        })
    }

    async fn write_frame(
        &mut self,
        payload: &str,
    ) -> Result<(), TransportError> {
        let header = format!("Content-Length: {}\r\n\r\n", payload.len());
        self.stdin.write_all(header.as_bytes()).await.map_err(io_error)?;
        self.stdin.write_all(payload.as_bytes()).await.map_err(io_error)?;
        self.stdin.flush().await.map_err(io_error)
    }

    async fn read_frame(&mut self) -> Result<Value, TransportError> {
        let mut content_length = None;
        loop {
            let mut line = String::new();
            let read = self.stdout.read_line(&mut line).await.map_err(io_error)?;
            if read == 0 {
                return Err(TransportError::ChannelClosed);
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some(value) = line.strip_prefix("Content-Length:") {
                content_length = value.trim().parse::<usize>().ok();
            }
        }
        let length = content_length.ok_or_else(|| TransportError::Protocol {
            reason: "frame carries no Content-Length header".to_string(),
        })?;
        let mut body = vec![0u8; length];
        self.stdout.read_exact(&mut body).await.map_err(io_error)?;
        serde_json::from_slice(&body).map_err(|error| TransportError::Protocol {
            reason: format!("frame body is not valid JSON: {error}"),
        })
    }

    async fn send_json<T: serde::Serialize>(
        &mut self,
        message: &T,
    ) -> Result<(), TransportError> {
        let payload = serde_json::to_string(message).map_err(|error| TransportError::Protocol {
            reason: format!("outbound message failed to serialize: {error}"),
        })?;
        self.write_frame(&payload).await
    }

    /// Handle one inbound frame that is not the reply being waited for.
    ///
    /// Server requests get a synthetic null reply; notifications are handed
    /// back to the caller; stale replies are dropped.
    async fn absorb(
        &mut self,
        frame: Value,
    ) -> Result<Option<Request>, TransportError> {
        if frame.get("method").is_none() {
            return Ok(None);
        }
        let incoming: Request = serde_json::from_value(frame).map_err(|error| TransportError::Protocol {
            reason: format!("malformed server message: {error}"),
        })?;
        if let Some(id) = incoming.id().cloned() {
            self.send_json(&Response::from_ok(id, Value::Null)).await?;
            return Ok(None);
        }
        Ok(Some(incoming))
    }
}

#[tower_lsp::async_trait]
impl Endpoint for StdioEndpoint {
    async fn call(
        &mut self,
        request: Request,
    ) -> Result<Option<Response>, TransportError> {
        let expected_id = request.id().cloned();
        self.send_json(&request).await?;
        let Some(expected_id) = expected_id else {
            // Notifications have no reply to wait for.
            return Ok(None);
        };
        loop {
            let frame = self.read_frame().await?;
            if frame.get("method").is_some() {
                if let Some(notification) = self.absorb(frame).await? {
                    self.pending.push_back(notification);
                }
                continue;
            }
            let response: Response = serde_json::from_value(frame).map_err(|error| TransportError::Protocol {
                reason: format!("malformed reply: {error}"),
            })?;
            if *response.id() == expected_id {
                return Ok(Some(response));
            }
        }
    }

    async fn next_notification(&mut self) -> Result<Request, TransportError> {
        if let Some(buffered) = self.pending.pop_front() {
            return Ok(buffered);
        }
        loop {
            let frame = self.read_frame().await?;
            if let Some(notification) = self.absorb(frame).await? {
                return Ok(notification);
            }
        }
    }
}

fn io_error(error: std::io::Error) -> TransportError {
    TransportError::Io {
        reason: error.to_string(),
    }
}
