use std::{fmt::Debug, sync::Mutex};

/// Message produced by the data source outside the result sets (prints, warnings) or by an
/// intercepted row read failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleMessage {
    pub is_error: bool,
    pub source: String,
    pub message: String,
}

/// Observational sink for decode diagnostics. Never affects decoding.
pub trait Diagnostics: Send + Sync + Debug {
    /// A row column has no matching member.
    fn unexpected_column(&self, entity: &str, column: &str);
    /// A member has no matching row column.
    fn unresolved_member(&self, entity: &str, member: &str);
    /// A GenSpec row matched no variant and the general shape is abstract.
    fn dropped_row(&self, entity: &str, discriminator: &str);
    fn console_message(&self, message: &ConsoleMessage);
}

/// Default sink, reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn unexpected_column(&self, entity: &str, column: &str) {
        log::debug!("Column `{column}` does not match any member of `{entity}`");
    }
    fn unresolved_member(&self, entity: &str, member: &str) {
        log::debug!("Member `{member}` of `{entity}` has no matching column");
    }
    fn dropped_row(&self, entity: &str, discriminator: &str) {
        log::warn!(
            "Row with discriminator {discriminator} matches no specialization of abstract `{entity}`, skipped"
        );
    }
    fn console_message(&self, message: &ConsoleMessage) {
        if message.is_error {
            log::error!("[{}] {}", message.source, message.message);
        } else {
            log::info!("[{}] {}", message.source, message.message);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    UnexpectedColumn { entity: String, column: String },
    UnresolvedMember { entity: String, member: String },
    DroppedRow { entity: String, discriminator: String },
    Console(ConsoleMessage),
}

/// Sink keeping every event in memory, then forwarding it to the log.
#[derive(Debug, Default)]
pub struct RecordedDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordedDiagnostics {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|v| v.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
    fn push(&self, event: DiagnosticEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(e) => e.into_inner().push(event),
        }
    }
}

impl Diagnostics for RecordedDiagnostics {
    fn unexpected_column(&self, entity: &str, column: &str) {
        LogDiagnostics.unexpected_column(entity, column);
        self.push(DiagnosticEvent::UnexpectedColumn {
            entity: entity.into(),
            column: column.into(),
        });
    }
    fn unresolved_member(&self, entity: &str, member: &str) {
        LogDiagnostics.unresolved_member(entity, member);
        self.push(DiagnosticEvent::UnresolvedMember {
            entity: entity.into(),
            member: member.into(),
        });
    }
    fn dropped_row(&self, entity: &str, discriminator: &str) {
        LogDiagnostics.dropped_row(entity, discriminator);
        self.push(DiagnosticEvent::DroppedRow {
            entity: entity.into(),
            discriminator: discriminator.into(),
        });
    }
    fn console_message(&self, message: &ConsoleMessage) {
        LogDiagnostics.console_message(message);
        self.push(DiagnosticEvent::Console(message.clone()));
    }
}
