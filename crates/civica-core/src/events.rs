//! Domain events emitted by the lifecycle and assignment operations.
//!
//! The core only emits; delivery, formatting, and fan-out to notification
//! or audit consumers live outside this crate.

use crate::types::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    StatusChanged {
        report_id: String,
        from: Status,
        to: Status,
        actor: String,
        at: DateTime<Utc>,
    },
    ReportAssigned {
        report_id: String,
        worker: String,
        assigned_by: String,
        at: DateTime<Utc>,
    },
}

pub trait EventSink {
    fn emit(&mut self, event: DomainEvent);
}

/// Sink that drops everything. For callers that have no downstream consumer.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: DomainEvent) {}
}

/// Collecting sink for tests and batch adapters.
#[derive(Default)]
pub struct MemorySink {
    pub events: Vec<DomainEvent>,
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: DomainEvent) {
        self.events.push(event);
    }
}
