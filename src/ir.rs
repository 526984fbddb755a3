// src/ir.rs
//
// The IR fragment this subsystem owns: constructor functions, blocks,
// variables, and the statement/expression trees the method synthesizer
// builds. The parser and binder produce these shapes upstream; the
// specialization pass reads constructor bodies and appends synthesized
// members and methods to class bodies.
//
// All entities live in append-only Vec arenas inside a single `Ir` value and
// are addressed by the u32 newtype handles from `identity`. Nothing is ever
// removed during a compilation run.

use rustc_hash::FxHashMap;

use crate::classes::{ConcreteClass, TemplateClass};
use crate::identity::{BlockId, FunctionId, TemplateId, VarId};
use crate::intern::{Interner, Symbol};
use crate::signature::Signature;
use crate::types::{TypeArena, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Parameter,
    Local,
}

/// Constructor parameter or class data member.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: Symbol,
    pub kind: VarKind,
    /// Parameter participates in specialization identity
    pub in_signature: bool,
    /// Pure type parameter, never materialized as a data member
    pub is_type: bool,
    /// Synthesized by the compiler (e.g. nextFree); skipped when printing
    pub generated: bool,
    pub ty: Option<TypeId>,
    pub line: u32,
}

impl Variable {
    /// A plain local with no flags set. Callers flip the flags they need.
    pub fn local(name: Symbol, ty: Option<TypeId>, line: u32) -> Self {
        Self {
            name,
            kind: VarKind::Local,
            in_signature: false,
            is_type: false,
            generated: false,
            ty,
            line,
        }
    }

    pub fn parameter(name: Symbol, in_signature: bool, line: u32) -> Self {
        Self {
            name,
            kind: VarKind::Parameter,
            in_signature,
            is_type: false,
            generated: false,
            ty: None,
            line,
        }
    }

    /// Data members are the variables that survive into the printable field
    /// list: not pure type parameters, not compiler-generated.
    pub fn is_data_member(&self) -> bool {
        !self.is_type && !self.generated
    }
}

/// Entry in a block's identifier table.
///
/// The table names things; ownership stays with the block's `vars`/`funcs`
/// lists. An entry whose function is owned by another block is a forwarding
/// identifier (the default-class body aliases the template's methods this
/// way instead of cloning them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ident {
    Function(FunctionId),
    Variable(VarId),
}

/// A function body or class body.
#[derive(Debug, Default)]
pub struct Block {
    pub vars: Vec<VarId>,
    pub funcs: Vec<FunctionId>,
    pub stmts: Vec<Stmt>,
    idents: FxHashMap<Symbol, Ident>,
    pub line: u32,
}

impl Block {
    pub fn ident(&self, name: Symbol) -> Option<Ident> {
        self.idents.get(&name).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnKind {
    Plain,
    Constructor,
    Destructor,
}

#[derive(Debug)]
pub struct Function {
    pub name: Symbol,
    pub kind: FnKind,
    /// Compiler built-ins get no synthesized destructor
    pub builtin: bool,
    /// Synthesized default; user declarations displace its name binding
    pub generated: bool,
    pub body: BlockId,
    /// Set once when a template class is created for this constructor
    pub template: Option<TemplateId>,
    pub line: u32,
}

/// Statements
#[derive(Debug, Clone)]
pub enum Stmt {
    Return(Option<Expr>),
    Print(Vec<Expr>),
    Assign(Box<AssignStmt>),
    Expr(Expr),
}

/// Assignment: `self.x = expr` in constructor bodies
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
}

/// Expressions
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    /// Datatype annotation filled in by the binder (or by synthesis)
    pub ty: Option<TypeId>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(u64),
    StringLiteral(String),
    Identifier(Symbol),
    /// Member access: object.field
    Field(Box<FieldExpr>),
    /// Narrowing cast to a fixed-width type
    Cast(Box<CastExpr>),
    Call(Box<CallExpr>),
    /// Format interpolation: literal pieces and value pieces in lock-step
    Interpolated(Vec<StringPart>),
}

#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub object: Expr,
    pub field: Symbol,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub target: TypeId,
    pub operand: Expr,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Expr,
    pub args: Vec<Expr>,
}

/// Part of an interpolated string
#[derive(Debug, Clone)]
pub enum StringPart {
    Literal(String),
    Value(Expr),
}

impl Expr {
    pub fn identifier(name: Symbol, ty: Option<TypeId>, line: u32) -> Self {
        Self {
            kind: ExprKind::Identifier(name),
            ty,
            line,
        }
    }

    pub fn field(object: Expr, field: Symbol, ty: Option<TypeId>, line: u32) -> Self {
        Self {
            kind: ExprKind::Field(Box::new(FieldExpr { object, field })),
            ty,
            line,
        }
    }

    pub fn cast(target: TypeId, operand: Expr, line: u32) -> Self {
        Self {
            kind: ExprKind::Cast(Box::new(CastExpr { target, operand })),
            ty: Some(target),
            line,
        }
    }

    pub fn int_literal(value: u64, line: u32) -> Self {
        Self {
            kind: ExprKind::IntLiteral(value),
            ty: None,
            line,
        }
    }

    pub fn string_literal(value: impl Into<String>, line: u32) -> Self {
        Self {
            kind: ExprKind::StringLiteral(value.into()),
            ty: None,
            line,
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>, line: u32) -> Self {
        Self {
            kind: ExprKind::Call(Box::new(CallExpr { callee, args })),
            ty: None,
            line,
        }
    }
}

/// The shared IR graph for one compilation.
///
/// Owns every arena this subsystem touches: names, datatypes, functions,
/// blocks, variables, signatures, template classes, and their
/// specializations. The registry/matcher/synthesizer operations are
/// implemented on this type across the `classes` modules.
#[derive(Debug, Default)]
pub struct Ir {
    pub interner: Interner,
    pub types: TypeArena,
    pub(crate) functions: Vec<Function>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) vars: Vec<Variable>,
    pub(crate) sigs: Vec<Signature>,
    pub(crate) templates: Vec<TemplateClass>,
    pub(crate) classes: Vec<ConcreteClass>,
}

impl Ir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_block(&mut self, line: u32) -> BlockId {
        let id = BlockId::new(self.blocks.len() as u32);
        self.blocks.push(Block {
            line,
            ..Block::default()
        });
        id
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index() as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.index() as usize]
    }

    /// Create a function with a fresh body block, declare it in `parent`'s
    /// owned-function list, and bind its name in `parent`'s ident table.
    pub fn add_function(
        &mut self,
        parent: BlockId,
        name: Symbol,
        kind: FnKind,
        generated: bool,
        line: u32,
    ) -> FunctionId {
        let body = self.new_block(line);
        let id = FunctionId::new(self.functions.len() as u32);
        self.functions.push(Function {
            name,
            kind,
            builtin: false,
            generated,
            body,
            template: None,
            line,
        });
        self.blocks[parent.index() as usize].funcs.push(id);
        self.bind_function_ident(parent, name, id);
        id
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index() as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.index() as usize]
    }

    /// Bind `name` to `func` in `block`'s ident table.
    ///
    /// Collision policy (user always wins, regardless of pass order): a
    /// generated default never displaces an existing binding, and a user
    /// declaration always overwrites whatever is bound.
    pub fn bind_function_ident(&mut self, block: BlockId, name: Symbol, func: FunctionId) {
        let generated = self.functions[func.index() as usize].generated;
        let idents = &mut self.blocks[block.index() as usize].idents;
        if generated && idents.contains_key(&name) {
            return;
        }
        idents.insert(name, Ident::Function(func));
    }

    /// Create a variable in `block` and bind its name in the ident table.
    pub fn add_variable(&mut self, block: BlockId, var: Variable) -> VarId {
        let name = var.name;
        let id = VarId::new(self.vars.len() as u32);
        self.vars.push(var);
        let block = &mut self.blocks[block.index() as usize];
        block.vars.push(id);
        block.idents.insert(name, Ident::Variable(id));
        id
    }

    pub fn var(&self, id: VarId) -> &Variable {
        &self.vars[id.index() as usize]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut Variable {
        &mut self.vars[id.index() as usize]
    }

    pub fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }
}
