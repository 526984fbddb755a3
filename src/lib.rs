// src/lib.rs
//! Class template instantiation for the Reed compiler.
//!
//! Every class in Reed is a template: its constructor is called like a
//! function, and the argument datatypes at the parameters flagged as
//! signature-relevant decide whether a call reuses an existing concrete
//! specialization or materializes a new one. This crate owns the template
//! registry, the specialization matcher/pool, the default-class fast path,
//! and synthesis of the built-in destroy/toString/dump methods.

pub mod classes;
pub mod errors;
pub mod identity;
pub mod intern;
pub mod ir;
pub mod signature;
pub mod types;

pub use classes::{ConcreteClass, TemplateClass};
pub use identity::{BlockId, ClassId, FunctionId, SigId, TemplateId, VarId};
pub use intern::{Interner, Symbol};
pub use ir::{
    AssignStmt, CallExpr, CastExpr, Expr, ExprKind, FieldExpr, FnKind, Ident, Ir, Stmt, StringPart,
    VarKind, Variable,
};
pub use signature::{ArgTypeVec, Signature};
pub use types::{Datatype, TypeArena, TypeId, TypeIdVec};
