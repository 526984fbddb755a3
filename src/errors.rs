// src/errors.rs
//! Internal invariant diagnostics.
//!
//! This subsystem has no user-facing errors: anything a user could get wrong
//! is caught by the binder before specialization is invoked. Every error here
//! is a compiler bug, so there is no recovery path — `fatal` logs the
//! diagnostic and aborts the compilation.

use thiserror::Error;

use crate::identity::{ClassId, FunctionId, SigId, TemplateId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("constructor {constructor:?} already owns a template class")]
    DuplicateTemplate { constructor: FunctionId },

    #[error("{template:?} is flagged as having a default class but has no specializations")]
    DefaultClassMissing { template: TemplateId },

    #[error(
        "{class:?} has no founding signature but its template is not flagged as having a default class"
    )]
    UnfoundedSpecialization { class: ClassId },

    #[error("{sig:?} carries {found} argument types but parameter {param_index} was requested")]
    SignatureTooShort {
        sig: SigId,
        param_index: usize,
        found: usize,
    },

    #[error("member initializer for '{field}' carries no datatype (line {line})")]
    UntypedMemberInit { field: String, line: u32 },
}

/// Abort the compilation with an internal-invariant diagnostic.
pub fn fatal(err: InternalError) -> ! {
    tracing::error!(%err, "internal compiler error");
    panic!("internal compiler error: {err}");
}
