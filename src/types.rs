// src/types.rs
//
// Interned datatypes using TypeId handles for O(1) equality and minimal
// allocations.
//
// This module provides the datatype representation consumed by the
// specialization matcher:
// - TypeId: u32 handle to an interned datatype (Copy, trivial Eq/Hash)
// - TypeArena: per-compilation storage with automatic deduplication
// - Datatype: the canonical representation, including the Unresolved
//   placeholder that stands in for a template's not-yet-created class type

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::identity::{ClassId, TemplateId};

/// Handle to an interned datatype in the TypeArena.
///
/// Interning guarantees that two TypeIds are equal iff their datatypes are
/// structurally equal, so identity comparison during specialization matching
/// is a single integer compare.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeId(u32);

impl TypeId {
    /// Get the raw index (for debugging/dump output)
    pub fn index(self) -> u32 {
        self.0
    }
}

/// SmallVec for datatype children - inline up to 4 (covers most tuples)
pub type TypeIdVec = SmallVec<[TypeId; 4]>;

/// The canonical datatype representation.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Datatype {
    /// Unsigned integer of the given bit width
    Uint(u32),
    /// Signed integer of the given bit width
    Int(u32),
    /// Floating point of the given bit width
    Float(u32),
    Bool,
    String,
    Tuple(TypeIdVec),
    /// The type of the template value itself (the callable constructor)
    Template(TemplateId),
    /// The instance type of one concrete specialization
    Class(ClassId),
    /// Placeholder for a template whose concrete class does not exist yet.
    /// Lets a constructor mention its own class type inside its own body;
    /// rewritten to `Class` by the resolution pass once the specialization
    /// is complete.
    Unresolved(TemplateId),
}

impl Datatype {
    /// True for types that address an object by opaque handle, which the
    /// method synthesizer must never print recursively.
    pub fn is_object_ref(&self) -> bool {
        matches!(self, Datatype::Class(_) | Datatype::Unresolved(_))
    }
}

/// Per-compilation datatype storage with automatic deduplication.
#[derive(Debug, Default)]
pub struct TypeArena {
    types: Vec<Datatype>,
    dedup: HashMap<Datatype, TypeId>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a datatype, returning the canonical handle for it.
    pub fn intern(&mut self, datatype: Datatype) -> TypeId {
        if let Some(&id) = self.dedup.get(&datatype) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(datatype.clone());
        self.dedup.insert(datatype, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &Datatype {
        &self.types[id.0 as usize]
    }

    pub fn uint(&mut self, width: u32) -> TypeId {
        self.intern(Datatype::Uint(width))
    }

    pub fn int(&mut self, width: u32) -> TypeId {
        self.intern(Datatype::Int(width))
    }

    pub fn string(&mut self) -> TypeId {
        self.intern(Datatype::String)
    }

    pub fn bool(&mut self) -> TypeId {
        self.intern(Datatype::Bool)
    }

    /// True if `id` addresses an object by handle (class or placeholder).
    pub fn is_object_ref(&self, id: TypeId) -> bool {
        self.get(id).is_object_ref()
    }
}
