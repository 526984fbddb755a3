// src/signature.rs
//
// Call signatures handed in by the binder: the ordered actual argument
// datatypes for one constructor call. A signature may memoize the concrete
// class it resolved to, written at most once.

use smallvec::SmallVec;

use crate::identity::{ClassId, FunctionId, SigId};
use crate::ir::Ir;
use crate::types::TypeId;

/// Inline up to 4 argument types, same shape as the type arena's child lists
pub type ArgTypeVec = SmallVec<[TypeId; 4]>;

#[derive(Debug, Clone)]
pub struct Signature {
    /// The constructor this call binds against
    pub func: FunctionId,
    /// Actual argument datatypes in parameter order
    pub arg_types: ArgTypeVec,
    resolved: Option<ClassId>,
}

impl Signature {
    /// The memoized resolution, if any call already resolved this signature.
    pub fn resolved_class(&self) -> Option<ClassId> {
        self.resolved
    }
}

impl Ir {
    pub fn new_signature(&mut self, func: FunctionId, arg_types: ArgTypeVec) -> SigId {
        let id = SigId::new(self.sigs.len() as u32);
        self.sigs.push(Signature {
            func,
            arg_types,
            resolved: None,
        });
        id
    }

    pub fn signature(&self, id: SigId) -> &Signature {
        &self.sigs[id.index() as usize]
    }

    /// Memoize the class a signature resolved to. First write wins; later
    /// writes are idempotent no-ops.
    pub fn bind_signature_class(&mut self, id: SigId, class: ClassId) {
        let sig = &mut self.sigs[id.index() as usize];
        if let Some(existing) = sig.resolved {
            if existing != class {
                tracing::trace!(?id, ?existing, ?class, "signature already resolved, keeping");
            }
            return;
        }
        sig.resolved = Some(class);
    }
}
