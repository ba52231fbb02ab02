use civica_core::events::{DomainEvent, EventSink};

/// Event sink that forwards domain events to the tracing pipeline. Real
/// notification delivery is a separate consumer; the CLI only logs.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: DomainEvent) {
        match &event {
            DomainEvent::StatusChanged {
                report_id,
                from,
                to,
                actor,
                ..
            } => {
                tracing::info!(%report_id, %from, %to, %actor, "status changed");
            }
            DomainEvent::ReportAssigned {
                report_id,
                worker,
                assigned_by,
                ..
            } => {
                tracing::info!(%report_id, %worker, %assigned_by, "report assigned");
            }
        }
    }
}
