//! End-to-end pipeline helpers for conformance testing.
//!
//! [`Pipeline`] owns everything with a lifetime (the source database, the
//! interner, the diagnostic sink, and the parsed syntax) so a test can
//! spin up a [`Compilation`] borrowing from it, poke at the elaborated
//! design, and collect diagnostics.

#![warn(missing_docs)]

use veris_common::Interner;
use veris_diagnostics::{Diagnostic, DiagnosticSink};
use veris_elaborate::Compilation;
use veris_parser::{parse_file, ParseOptions, SourceUnit};
use veris_source::{FileId, SourceDb};

/// The parse-stage outputs a compilation borrows from.
pub struct Pipeline {
    /// The source database with all loaded files.
    pub db: SourceDb,
    /// The shared interner.
    pub interner: Interner,
    /// The diagnostic sink shared by all stages.
    pub sink: DiagnosticSink,
    /// The parsed syntax of the main file.
    pub unit: SourceUnit,
    /// The main file's id.
    pub file: FileId,
}

impl Pipeline {
    /// Preprocesses and parses the given source text.
    pub fn new(source: &str) -> Self {
        Self::with_files(source, &[])
    }

    /// Preprocesses and parses source text with additional in-memory
    /// files available for `include` resolution.
    pub fn with_files(source: &str, extra: &[(&str, &str)]) -> Self {
        let mut db = SourceDb::new();
        let file = db.add_source("test.sv", source.to_string());
        for (name, content) in extra {
            db.add_source(*name, content.to_string());
        }
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let unit = parse_file(file, &mut db, &interner, &sink, &ParseOptions::default());
        Self {
            db,
            interner,
            sink,
            unit,
            file,
        }
    }

    /// Builds a compilation over the parsed syntax.
    pub fn compile(&self) -> Compilation<'_> {
        let mut comp = Compilation::new(&self.db, &self.interner, &self.sink);
        comp.add_syntax_tree(&self.unit);
        comp
    }

    /// Runs full elaboration and returns the sorted diagnostics.
    pub fn check(&self) -> Vec<Diagnostic> {
        let mut comp = self.compile();
        comp.get_all_diagnostics()
    }
}

/// Parses and fully elaborates source text, returning the diagnostics.
pub fn full_pipeline(source: &str) -> Vec<Diagnostic> {
    Pipeline::new(source).check()
}

/// Renders diagnostics into one line each for assertion messages.
pub fn render(diags: &[Diagnostic]) -> String {
    diags
        .iter()
        .map(|d| format!("{} {}: {}", d.severity, d.code, d.message))
        .collect::<Vec<_>>()
        .join("\n")
}
