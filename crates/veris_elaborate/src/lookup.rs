//! Name lookup: ordered unqualified lookup, import resolution, and
//! hierarchical path resolution.

use crate::arena::SymbolId;
use crate::errors;
use crate::symbols::SymbolKind;
use crate::Compilation;
use veris_common::Ident;
use veris_source::Span;

/// A (scope, declaration-order index) pair answering "what is visible
/// here?" queries.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LookupLocation {
    /// The scope the ordering constraint applies to; `None` disables
    /// ordering checks entirely.
    pub scope: Option<SymbolId>,
    /// Members with a declaration index strictly below this are visible.
    pub index: u32,
}

impl LookupLocation {
    /// A location that bypasses ordering checks; used once elaboration is
    /// complete.
    pub const MAX: LookupLocation = LookupLocation {
        scope: None,
        index: u32::MAX,
    };

    /// The location just before the given index in a scope.
    pub fn at(scope: SymbolId, index: u32) -> Self {
        Self {
            scope: Some(scope),
            index,
        }
    }
}

/// One segment of a hierarchical path: a name plus any constant element
/// selects applied to it (`blocks[2].x`).
#[derive(Clone, Debug)]
pub struct PathSeg {
    /// The segment name.
    pub name: Ident,
    /// The segment's source span.
    pub span: Span,
    /// Evaluated element selects applied to the segment.
    pub selects: Vec<i32>,
}

impl<'a> Compilation<'a> {
    /// The location just after a symbol, for resolving its own
    /// declaration.
    pub fn location_after(&self, sym: SymbolId) -> LookupLocation {
        match self.symbols[sym].parent {
            Some(parent) => LookupLocation::at(parent, self.symbols[sym].index_in_scope + 1),
            None => LookupLocation::MAX,
        }
    }

    /// The lexical parent used for upward unqualified lookup. Instance
    /// bodies continue at the definition's parent rather than the
    /// instantiation site.
    pub(crate) fn lexical_parent(&self, scope: SymbolId) -> Option<SymbolId> {
        match &self.symbols[scope].kind {
            SymbolKind::ModuleInstance { definition, .. }
            | SymbolKind::InterfaceInstance { definition, .. } => {
                self.symbols[*definition].parent
            }
            _ => self.symbols[scope].parent,
        }
    }

    /// Unwraps transparent members and resolves explicit imports to the
    /// imported symbol.
    fn unwrap_found(&mut self, found: SymbolId) -> Option<SymbolId> {
        match &self.symbols[found].kind {
            SymbolKind::TransparentMember { wrapped } => Some(*wrapped),
            SymbolKind::ExplicitImport { package, name } => {
                let (package, name) = (*package, *name);
                let pkg = self.get_package(package)?;
                self.lookup_in_scope(pkg, name)
            }
            _ => Some(found),
        }
    }

    /// Looks up a name directly in one scope (no parent walk, no
    /// ordering).
    pub fn lookup_in_scope(&mut self, scope: SymbolId, name: Ident) -> Option<SymbolId> {
        self.elaborate_scope(scope);
        let found = self.symbols[scope]
            .scope()
            .and_then(|s| s.name_map.get(&name).copied())?;
        self.unwrap_found(found)
    }

    /// Unqualified lookup: search the scope's name map honoring the
    /// location's ordering, then wildcard imports, then the lexical parent
    /// chain. A symbol cannot see itself or later symbols in its own
    /// scope.
    pub fn lookup_unqualified(
        &mut self,
        scope: SymbolId,
        name: Ident,
        location: LookupLocation,
    ) -> Option<SymbolId> {
        let mut current = scope;
        let mut ordering_applies = true;
        loop {
            self.elaborate_scope(current);

            let hit = self.symbols[current]
                .scope()
                .and_then(|s| s.name_map.get(&name).copied());
            if let Some(found) = hit {
                let visible = if ordering_applies && location.scope == Some(current) {
                    self.symbols[found].index_in_scope < location.index
                } else {
                    true
                };
                if visible {
                    return self.unwrap_found(found);
                }
            }

            // Wildcard imports: a unique package match wins.
            let wildcards: Vec<SymbolId> = self.symbols[current]
                .scope()
                .map(|s| s.wildcard_imports.clone())
                .unwrap_or_default();
            let mut candidates: Vec<SymbolId> = Vec::new();
            let mut candidate_span = Span::DUMMY;
            for import in wildcards {
                if ordering_applies
                    && location.scope == Some(current)
                    && self.symbols[import].index_in_scope >= location.index
                {
                    continue;
                }
                let SymbolKind::WildcardImport { package } = self.symbols[import].kind else {
                    continue;
                };
                candidate_span = self.symbols[import].span;
                if let Some(pkg) = self.get_package(package) {
                    if let Some(found) = self.lookup_in_scope(pkg, name) {
                        if !candidates.contains(&found) {
                            candidates.push(found);
                        }
                    }
                }
            }
            match candidates.len() {
                1 => return Some(candidates[0]),
                0 => {}
                _ => {
                    self.sink.emit(errors::error_ambiguous_wildcard_import(
                        self.interner.resolve(name),
                        candidate_span,
                    ));
                    return None;
                }
            }

            current = self.lexical_parent(current)?;
            // Ordering constraints apply only in the scope where the
            // location was captured.
            ordering_applies = false;
        }
    }

    /// Resolves a hierarchical path. The leading segment is first tried as
    /// an unqualified name, then as an upward path through the hierarchy
    /// (matching enclosing instance and definition names).
    pub fn lookup_hierarchical(
        &mut self,
        scope: SymbolId,
        path: &[PathSeg],
        from_root: bool,
    ) -> Option<SymbolId> {
        let (head, rest) = path.split_first()?;

        let mut current = if from_root {
            let root = self.root_symbol();
            self.find_member_symbol(root, head)?
        } else if let Some(found) = self.lookup_unqualified(scope, head.name, LookupLocation::MAX)
        {
            self.apply_selects(found, head)?
        } else {
            self.upward_lookup(scope, head)?
        };

        for seg in rest {
            let inner = self.resolve_into_scope(current)?;
            self.elaborate_scope(inner);
            let found = self.symbols[inner]
                .scope()
                .and_then(|s| s.name_map.get(&seg.name).copied());
            let Some(found) = found else {
                let scope_name = self.symbols[current]
                    .name
                    .map(|n| self.interner.resolve(n).to_string())
                    .unwrap_or_else(|| "<unnamed scope>".to_string());
                self.sink.emit(errors::error_unknown_member(
                    self.interner.resolve(seg.name),
                    &scope_name,
                    seg.span,
                ));
                return None;
            };
            let found = self.unwrap_found(found)?;
            current = self.apply_selects(found, seg)?;
        }
        Some(current)
    }

    /// Searches upward through the hierarchy for a scope or instance whose
    /// name matches the head segment.
    fn upward_lookup(&mut self, scope: SymbolId, head: &PathSeg) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(sym) = current {
            if self.symbols[sym].name == Some(head.name) && self.symbols[sym].is_scope() {
                return self.apply_selects(sym, head);
            }
            if let Some(found) = self.find_member_symbol(sym, head) {
                return Some(found);
            }
            current = self.symbols[sym].parent;
        }
        None
    }

    fn find_member_symbol(&mut self, scope: SymbolId, seg: &PathSeg) -> Option<SymbolId> {
        if !self.symbols[scope].is_scope() {
            return None;
        }
        self.elaborate_scope(scope);
        let found = self.symbols[scope]
            .scope()
            .and_then(|s| s.name_map.get(&seg.name).copied())?;
        let found = self.unwrap_found(found)?;
        self.apply_selects(found, seg)
    }

    /// Applies a segment's element selects into instance and generate
    /// arrays.
    fn apply_selects(&mut self, mut sym: SymbolId, seg: &PathSeg) -> Option<SymbolId> {
        for &index in &seg.selects {
            match &self.symbols[sym].kind {
                SymbolKind::InstanceArray {
                    elements, range, ..
                } => {
                    if !range.contains(index) {
                        return None;
                    }
                    let offset = range.translate_index(index) as usize;
                    sym = *elements.get(offset)?;
                }
                SymbolKind::GenerateBlockArray { entries, .. } => {
                    let target = entries
                        .iter()
                        .find(|(value, _)| *value == i64::from(index))
                        .map(|(_, block)| *block)?;
                    sym = target;
                }
                _ => return None,
            }
        }
        Some(sym)
    }

    /// Follows a symbol to the scope hierarchical resolution should
    /// continue in: instances and generate blocks are their own scopes,
    /// interface ports forward to their connected instance.
    pub(crate) fn resolve_into_scope(&mut self, sym: SymbolId) -> Option<SymbolId> {
        match &self.symbols[sym].kind {
            SymbolKind::InterfacePort { connection, .. } => *connection,
            _ if self.symbols[sym].is_scope() => Some(sym),
            _ => None,
        }
    }
}
