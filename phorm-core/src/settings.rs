use crate::{Diagnostics, LogDiagnostics, SecureValueProvider};
use std::sync::Arc;
use time::{PrimitiveDateTime, macros::datetime};

/// Temporal range the data source can represent, outbound values are clamped into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub min: PrimitiveDateTime,
    pub max: PrimitiveDateTime,
}

impl DateRange {
    pub const fn new(min: PrimitiveDateTime, max: PrimitiveDateTime) -> Self {
        Self { min, max }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            min: datetime!(0001-01-01 00:00),
            max: datetime!(9999-12-31 23:59:59.999999999),
        }
    }
}

/// Configuration threaded through every encode and decode call.
#[derive(Debug, Clone)]
pub struct Settings {
    pub date_range: DateRange,
    /// Size of variable length text parameters when none is declared.
    pub default_string_size: usize,
    /// Fail single row reads returning more than one row instead of keeping the first.
    pub strict_result_size: bool,
    /// Turn row read failures into console diagnostics instead of returning them.
    pub intercept_row_errors: bool,
    pub secure_provider: Option<Arc<dyn SecureValueProvider>>,
    pub diagnostics: Arc<dyn Diagnostics>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            date_range: Default::default(),
            default_string_size: 256,
            strict_result_size: true,
            intercept_row_errors: false,
            secure_provider: None,
            diagnostics: Arc::new(LogDiagnostics),
        }
    }
}

impl Settings {
    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = date_range;
        self
    }
    pub fn with_default_string_size(mut self, size: usize) -> Self {
        self.default_string_size = size;
        self
    }
    pub fn with_strict_result_size(mut self, strict: bool) -> Self {
        self.strict_result_size = strict;
        self
    }
    pub fn with_intercept_row_errors(mut self, intercept: bool) -> Self {
        self.intercept_row_errors = intercept;
        self
    }
    pub fn with_secure_provider(mut self, provider: impl SecureValueProvider + 'static) -> Self {
        self.secure_provider = Some(Arc::new(provider));
        self
    }
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
