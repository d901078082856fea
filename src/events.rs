//! Mutation event reporting.
//!
//! Each engine operation emits exactly one [`MutationEvent`] describing what
//! ran and how it ended. The sink is injected so hosts own the transport;
//! the default forwards to the `log` facade.

use std::time::Duration;

use crate::capability::Action;

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation succeeded
    Ok,
    /// The operation failed; carries the error kind name
    Failed(&'static str),
}

/// One completed mutation attempt.
#[derive(Debug, Clone)]
pub struct MutationEvent {
    /// Which operation ran
    pub action: Action,
    /// Success or the error kind
    pub outcome: Outcome,
    /// Wall-clock duration of the operation
    pub duration: Duration,
    /// Size of the produced file, when one was produced
    pub bytes_out: Option<usize>,
}

/// Receives mutation events.
pub trait EventSink {
    /// Record one event. Implementations must not panic.
    fn record(&self, event: &MutationEvent);
}

/// Default sink backed by the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: &MutationEvent) {
        match &event.outcome {
            Outcome::Ok => log::info!(
                "{} ok in {:?}{}",
                event.action.name(),
                event.duration,
                event
                    .bytes_out
                    .map(|b| format!(", {} bytes out", b))
                    .unwrap_or_default()
            ),
            Outcome::Failed(kind) => log::warn!(
                "{} failed ({}) in {:?}",
                event.action.name(),
                kind,
                event.duration
            ),
        }
    }
}
