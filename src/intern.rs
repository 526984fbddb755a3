// src/intern.rs
//! Name interning. Every identifier in the representation is a `Symbol`,
//! a dense index into one string table, so name comparison during ident
//! lookup is an integer compare.

use rustc_hash::FxHashMap;

/// Handle to an interned name. Symbols compare equal iff the underlying
/// strings do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub u32);

/// Deduplicating string table. Synthesized names ("self", "destroy",
/// "toString", "nextFree") are re-interned on every use, so duplicates must
/// not grow the table.
#[derive(Debug, Default)]
pub struct Interner {
    lookup: FxHashMap<String, Symbol>,
    table: Vec<String>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        match self.lookup.get(name) {
            Some(&sym) => sym,
            None => {
                let sym = Symbol(self.table.len() as u32);
                self.table.push(name.to_owned());
                self.lookup.insert(name.to_owned(), sym);
                sym
            }
        }
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.table[sym.0 as usize]
    }

    /// Number of distinct names interned so far.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
