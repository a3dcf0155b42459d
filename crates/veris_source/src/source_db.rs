//! Central database of all source files in a compilation session.

use crate::file_id::FileId;
use crate::resolved_span::ResolvedSpan;
use crate::source_file::SourceFile;
use crate::span::Span;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// The source database, owning all loaded source text, resolving
/// [`FileId`] + byte offsets to line/column coordinates for diagnostics,
/// and resolving `include` paths for the preprocessor.
pub struct SourceDb {
    files: Vec<SourceFile>,
    by_path: HashMap<PathBuf, FileId>,
    include_dirs: Vec<PathBuf>,
}

impl SourceDb {
    /// Creates an empty source database.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            by_path: HashMap::new(),
            include_dirs: Vec::new(),
        }
    }

    /// Adds a directory to the include search path.
    pub fn add_include_dir(&mut self, dir: impl Into<PathBuf>) {
        self.include_dirs.push(dir.into());
    }

    /// Loads a source file from the filesystem and returns its [`FileId`].
    pub fn load_file(&mut self, path: &Path) -> Result<FileId, io::Error> {
        if let Some(&id) = self.by_path.get(path) {
            return Ok(id);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(self.insert(path.to_path_buf(), content))
    }

    /// Adds a source file from an in-memory string (useful for tests).
    ///
    /// The `name` parameter is used as the file path in diagnostics and when
    /// resolving `include` directives against in-memory sources.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        self.insert(name.into(), content)
    }

    fn insert(&mut self, path: PathBuf, content: String) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.by_path.insert(path.clone(), id);
        self.files.push(SourceFile::new(id, path, content));
        id
    }

    /// Resolves an `include` directive to a loaded file.
    ///
    /// Quoted includes (`include "name"`) search relative to the including
    /// file's directory before the include path; bracketed includes
    /// (`include <name>`) search only the include path. Already-loaded
    /// in-memory sources resolve by exact name, so tests and language
    /// servers can register include files without touching the filesystem.
    pub fn resolve_include(&mut self, name: &str, from: FileId, system: bool) -> Option<FileId> {
        if let Some(&id) = self.by_path.get(Path::new(name)) {
            return Some(id);
        }

        let mut candidates = Vec::new();
        if !system && from != FileId::DUMMY {
            if let Some(parent) = self.get_file(from).path.parent() {
                candidates.push(parent.join(name));
            }
        }
        for dir in &self.include_dirs {
            candidates.push(dir.join(name));
        }

        for candidate in candidates {
            if let Some(&id) = self.by_path.get(&candidate) {
                return Some(id);
            }
            if candidate.is_file() {
                if let Ok(id) = self.load_file(&candidate) {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Returns the [`SourceFile`] for the given [`FileId`].
    ///
    /// # Panics
    ///
    /// Panics if the `FileId` is invalid.
    pub fn get_file(&self, id: FileId) -> &SourceFile {
        &self.files[id.as_raw() as usize]
    }

    /// Resolves a [`Span`] to human-readable line/column coordinates.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        let file = self.get_file(span.file);
        let (start_line, start_col) = file.line_col(span.start);
        let (end_line, end_col) = file.line_col(span.end.saturating_sub(1).max(span.start));
        ResolvedSpan {
            file_path: file.path.clone(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Returns the source text corresponding to a [`Span`].
    pub fn snippet(&self, span: Span) -> &str {
        let file = self.get_file(span.file);
        file.snippet(span.start, span.end)
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get() {
        let mut db = SourceDb::new();
        let id = db.add_source("test.sv", "module m; endmodule".to_string());
        assert_eq!(db.get_file(id).content, "module m; endmodule");
    }

    #[test]
    fn resolve_span() {
        let mut db = SourceDb::new();
        let id = db.add_source("test.sv", "abc\ndef\nghi".to_string());
        let resolved = db.resolve_span(Span::new(id, 4, 7));
        assert_eq!(resolved.file_path, PathBuf::from("test.sv"));
        assert_eq!(resolved.start_line, 2);
        assert_eq!(resolved.start_col, 1);
        assert_eq!(resolved.end_line, 2);
        assert_eq!(resolved.end_col, 3);
    }

    #[test]
    fn snippet() {
        let mut db = SourceDb::new();
        let id = db.add_source("test.sv", "wire [7:0] w;".to_string());
        assert_eq!(db.snippet(Span::new(id, 0, 4)), "wire");
    }

    #[test]
    fn multiple_files() {
        let mut db = SourceDb::new();
        let a = db.add_source("a.sv", "file one".to_string());
        let b = db.add_source("b.sv", "file two".to_string());
        assert_ne!(a, b);
        assert_eq!(db.get_file(b).content, "file two");
    }

    #[test]
    fn resolve_include_in_memory() {
        let mut db = SourceDb::new();
        let main = db.add_source("main.sv", "`include \"defs.svh\"".to_string());
        let defs = db.add_source("defs.svh", "`define WIDTH 8".to_string());
        assert_eq!(db.resolve_include("defs.svh", main, false), Some(defs));
        assert_eq!(db.resolve_include("missing.svh", main, false), None);
    }

    #[test]
    fn resolve_include_from_disk() {
        let dir = std::env::temp_dir().join("veris_source_test");
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join("inc.svh");
        std::fs::write(&file_path, "`define FROM_DISK 1").unwrap();

        let mut db = SourceDb::new();
        db.add_include_dir(&dir);
        let main = db.add_source("main.sv", String::new());
        let id = db.resolve_include("inc.svh", main, true).unwrap();
        assert_eq!(db.get_file(id).content, "`define FROM_DISK 1");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_file_deduplicates() {
        let dir = std::env::temp_dir().join("veris_source_dedup");
        std::fs::create_dir_all(&dir).unwrap();
        let file_path = dir.join("top.sv");
        std::fs::write(&file_path, "module top; endmodule").unwrap();

        let mut db = SourceDb::new();
        let a = db.load_file(&file_path).unwrap();
        let b = db.load_file(&file_path).unwrap();
        assert_eq!(a, b);

        std::fs::remove_dir_all(&dir).ok();
    }
}
