//! In-memory transport with queued replies
//!
//! Replies are consumed in the order they were pushed. When a queue is empty
//! the transport answers with a successful default (`s1`, `s2`, ... session
//! ids, empty output with status 0). Every call is recorded.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Notify, oneshot};

use super::{ConnectResponse, ExecOutput, SshTransport};
use crate::error::{TransportError, TransportResult};
use crate::models::{AuthMethod, ConnectionConfig, SessionId};

/// A call received by [`ScriptedTransport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    /// `connect` for `user@host:port`
    Connect {
        /// `user@host:port`
        target: String,
        /// Authentication method of the payload
        method: AuthMethod,
    },
    /// `execute`
    Execute {
        /// Session the command was sent to
        session_id: SessionId,
        /// Command text as received
        command: String,
    },
    /// `disconnect`
    Disconnect {
        /// Session being torn down
        session_id: SessionId,
    },
}

enum ScriptedExec {
    Reply(TransportResult<ExecOutput>),
    Held(oneshot::Receiver<TransportResult<ExecOutput>>),
}

#[derive(Default)]
struct ScriptState {
    connects: VecDeque<TransportResult<ConnectResponse>>,
    executes: VecDeque<ScriptedExec>,
    disconnects: VecDeque<TransportResult<()>>,
    calls: Vec<TransportCall>,
    issued_sessions: u64,
}

/// Completes an execute queued with [`ScriptedTransport::hold_execute`]
#[derive(Debug)]
pub struct ExecRelease {
    sender: oneshot::Sender<TransportResult<ExecOutput>>,
}

impl ExecRelease {
    /// Resolves the held execute with `reply`
    pub fn complete(self, reply: TransportResult<ExecOutput>) {
        if self.sender.send(reply).is_err() {
            tracing::debug!("Held execute was abandoned before completion");
        }
    }
}

/// Programmable [`SshTransport`] for tests and demos
#[derive(Default)]
pub struct ScriptedTransport {
    state: Mutex<ScriptState>,
    execute_started: Notify,
}

impl ScriptedTransport {
    /// Creates a transport with empty queues
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the reply for the next `connect`
    pub fn push_connect(&self, reply: TransportResult<ConnectResponse>) -> &Self {
        self.state().connects.push_back(reply);
        self
    }

    /// Queues the reply for the next `execute`
    pub fn push_execute(&self, reply: TransportResult<ExecOutput>) -> &Self {
        self.state().executes.push_back(ScriptedExec::Reply(reply));
        self
    }

    /// Queues an `execute` that stays pending until released
    #[must_use]
    pub fn hold_execute(&self) -> ExecRelease {
        let (sender, receiver) = oneshot::channel();
        self.state().executes.push_back(ScriptedExec::Held(receiver));
        ExecRelease { sender }
    }

    /// Queues the reply for the next `disconnect`
    pub fn push_disconnect(&self, reply: TransportResult<()>) -> &Self {
        self.state().disconnects.push_back(reply);
        self
    }

    /// Waits until an `execute` call has been received
    pub async fn wait_for_execute(&self) {
        self.execute_started.notified().await;
    }

    /// All calls received so far
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state().calls.clone()
    }

    /// Commands received by `execute`, in order
    #[must_use]
    pub fn executed_commands(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Execute { command, .. } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl SshTransport for ScriptedTransport {
    async fn connect(&self, config: &ConnectionConfig) -> TransportResult<ConnectResponse> {
        let mut state = self.state();
        state.calls.push(TransportCall::Connect {
            target: config.target(),
            method: config.auth().method(),
        });
        if let Some(reply) = state.connects.pop_front() {
            return reply;
        }
        state.issued_sessions += 1;
        Ok(ConnectResponse::connected(
            SessionId::new(format!("s{}", state.issued_sessions)),
            "Successfully connected and authenticated",
        ))
    }

    async fn execute(&self, session_id: &SessionId, command: &str) -> TransportResult<ExecOutput> {
        let scripted = {
            let mut state = self.state();
            state.calls.push(TransportCall::Execute {
                session_id: session_id.clone(),
                command: command.to_string(),
            });
            state.executes.pop_front()
        };
        self.execute_started.notify_one();

        match scripted {
            None => Ok(ExecOutput::new("", "", 0)),
            Some(ScriptedExec::Reply(reply)) => reply,
            Some(ScriptedExec::Held(receiver)) => receiver.await.unwrap_or_else(|_| {
                Err(TransportError::ConnectionLost(
                    "scripted reply was dropped".to_string(),
                ))
            }),
        }
    }

    async fn disconnect(&self, session_id: &SessionId) -> TransportResult<()> {
        let mut state = self.state();
        state.calls.push(TransportCall::Disconnect {
            session_id: session_id.clone(),
        });
        state.disconnects.pop_front().unwrap_or(Ok(()))
    }
}
