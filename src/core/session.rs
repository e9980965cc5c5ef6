//! Conversational query session.
//!
//! Owns the transcript, the pending flag and the latest result. At most one
//! query is in flight: the request runs on a spawned task that only reports
//! its outcome back over a channel, and the owner of the session applies it
//! with [`ConversationSession::settle_next`] or
//! [`ConversationSession::process_settled`]. All state changes therefore
//! happen on the owner's task.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::api::models::{ChatRequest, QueryResult};
use crate::core::backend::QueryBackend;
use crate::core::transcript::{Message, Transcript};
use crate::error::ApiError;

const EVENT_CAPACITY: usize = 64;

type Settlement = Result<QueryResult, ApiError>;

/// State-change notifications for presentation code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    UserTurn,
    PendingChanged(bool),
    AssistantTurn { is_error: bool },
    ResultReplaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyMessage,
    NoConnection,
    /// A query is already in flight
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Dispatched,
    Rejected(RejectReason),
}

impl SubmitOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, SubmitOutcome::Dispatched)
    }
}

pub struct ConversationSession {
    backend: Arc<dyn QueryBackend>,
    transcript: Transcript,
    pending: bool,
    last_result: Option<Arc<QueryResult>>,
    active_connection: Option<String>,
    settled_tx: mpsc::UnboundedSender<Settlement>,
    settled_rx: mpsc::UnboundedReceiver<Settlement>,
    events: broadcast::Sender<SessionEvent>,
}

impl ConversationSession {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            backend,
            transcript: Transcript::new(),
            pending: false,
            last_result: None,
            active_connection: None,
            settled_tx,
            settled_rx,
            events,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Most recent successful result; failures never clear it
    pub fn last_result(&self) -> Option<&Arc<QueryResult>> {
        self.last_result.as_ref()
    }

    pub fn active_connection(&self) -> Option<&str> {
        self.active_connection.as_deref()
    }

    pub fn set_active_connection(&mut self, connection_id: Option<String>) {
        self.active_connection = connection_id.filter(|id| !id.is_empty());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Submit a question against the active connection
    pub fn submit_active(&mut self, text: &str) -> SubmitOutcome {
        let connection_id = self.active_connection.clone();
        self.submit(text, connection_id.as_deref())
    }

    /// Append the user turn and dispatch the query.
    ///
    /// Rejected submissions leave the transcript, the pending flag and the
    /// observers untouched. Must be called inside a tokio runtime.
    pub fn submit(&mut self, text: &str, connection_id: Option<&str>) -> SubmitOutcome {
        if self.pending {
            log::debug!("Submission dropped: a query is already in flight");
            return SubmitOutcome::Rejected(RejectReason::Busy);
        }
        if text.trim().is_empty() {
            log::debug!("Submission dropped: empty message");
            return SubmitOutcome::Rejected(RejectReason::EmptyMessage);
        }
        let Some(connection_id) = connection_id.filter(|id| !id.is_empty()) else {
            log::debug!("Submission dropped: no connection selected");
            return SubmitOutcome::Rejected(RejectReason::NoConnection);
        };

        self.transcript.push(Message::user(text));
        self.notify(SessionEvent::UserTurn);
        self.pending = true;
        self.notify(SessionEvent::PendingChanged(true));

        let request = ChatRequest {
            message: text.to_string(),
            db_connection_id: connection_id.to_string(),
        };
        log::debug!("Dispatching query against connection {}", connection_id);

        let backend = Arc::clone(&self.backend);
        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let outcome = backend.ask(request).await;
            // Receiver lives as long as the session
            let _ = tx.send(outcome);
        });

        SubmitOutcome::Dispatched
    }

    /// Wait for the in-flight query to settle and apply it.
    ///
    /// Returns `false` immediately when nothing is pending.
    pub async fn settle_next(&mut self) -> bool {
        if !self.pending {
            return false;
        }

        match self.settled_rx.recv().await {
            Some(outcome) => {
                self.apply(outcome);
                true
            }
            None => false,
        }
    }

    /// Apply any settled query without waiting. Returns how many were applied.
    pub fn process_settled(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.settled_rx.try_recv() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, outcome: Settlement) {
        match outcome {
            Ok(result) => {
                log::debug!(
                    "Query settled: {} chart(s), sql: {}",
                    result.charts().map_or(0, |c| c.len()),
                    result.sql_query
                );
                self.transcript.push(Message::assistant(
                    result.explanation.clone(),
                    Some(result.sql_query.clone()),
                ));
                self.notify(SessionEvent::AssistantTurn { is_error: false });
                self.last_result = Some(Arc::new(result));
                self.notify(SessionEvent::ResultReplaced);
            }
            Err(error) => {
                log::debug!("Query failed: {}", error);
                self.transcript
                    .push(Message::assistant_error(format!("Error: {}", error.detail())));
                self.notify(SessionEvent::AssistantTurn { is_error: true });
            }
        }

        self.pending = false;
        self.notify(SessionEvent::PendingChanged(false));
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
