//! Thread-safe diagnostic accumulator with a stable location sort.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics emitted during compilation.
///
/// The sink is append-only; multiple pipeline stages emit into it via
/// [`emit`](Self::emit). The error count is tracked atomically for fast
/// `has_errors` checks without locking the diagnostic vector. Once
/// elaboration has finished, [`sorted`](Self::sorted) returns the
/// diagnostics in a stable order by source location and then code.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity == Severity::Error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap();
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.clone()
    }

    /// Returns all diagnostics, stably sorted by source location (file,
    /// then offset) and then by code. Emission order breaks remaining ties.
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut all = self.diagnostics();
        all.sort_by_key(|d| {
            (
                d.primary_span.file.as_raw(),
                d.primary_span.start,
                d.code,
            )
        });
        all
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use veris_source::{FileId, Span};

    fn make_error_at(file: u32, offset: u32, number: u16) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::new(Category::Error, number),
            "test error",
            Span::new(FileId::from_raw(file), offset, offset + 1),
        )
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn emit_error_counts() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error_at(0, 0, 100));
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 1),
            "meh",
            Span::DUMMY,
        ));
        assert!(!sink.has_errors());
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn take_all_drains() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error_at(0, 0, 100));
        sink.emit(make_error_at(0, 5, 101));
        assert_eq!(sink.take_all().len(), 2);
        assert!(sink.take_all().is_empty());
        // Error count is NOT reset by take_all (it's an atomic counter)
        assert_eq!(sink.error_count(), 2);
    }

    #[test]
    fn sorted_by_location_then_code() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error_at(1, 0, 100));
        sink.emit(make_error_at(0, 9, 101));
        sink.emit(make_error_at(0, 2, 105));
        sink.emit(make_error_at(0, 2, 101));

        let sorted = sink.sorted();
        let keys: Vec<_> = sorted
            .iter()
            .map(|d| (d.primary_span.file.as_raw(), d.primary_span.start, d.code.number))
            .collect();
        assert_eq!(keys, vec![(0, 2, 101), (0, 2, 105), (0, 9, 101), (1, 0, 100)]);
    }

    #[test]
    fn thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    sink.emit(make_error_at(0, i, 100));
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sink.error_count(), 800);
        assert_eq!(sink.diagnostics().len(), 800);
    }
}
