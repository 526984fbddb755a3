// src/classes/methods.rs
//
// Synthesis of the built-in methods attached to each concrete class.
//
// toString walks the class's data members once, building the format pieces
// and the value accesses in lock-step; members that address another object
// are cast to a 32-bit handle so printing never recurses into the object
// graph. dump is defined purely in terms of toString, so a user override of
// toString shows through dump without regeneration. Both are bound through
// the class body's ident table, where a user declaration of the same name
// always wins.

use crate::identity::{ClassId, FunctionId};
use crate::intern::Symbol;
use crate::ir::{Expr, ExprKind, FnKind, Ident, Ir, Stmt, StringPart, Variable};

impl Ir {
    /// Synthesize `toString(self)`: a single return of a format
    /// interpolation over the class's data members, in declaration order.
    pub fn generate_to_string(&mut self, class: ClassId) -> FunctionId {
        let class_block = self.class(class).body;
        let line = self.block(class_block).line;
        let name = self.interner.intern("toString");
        let func = self.add_function(class_block, name, FnKind::Plain, true, line);
        let body = self.function(func).body;
        let self_sym = self.interner.intern("self");
        self.add_variable(body, Variable::parameter(self_sym, false, line));

        let str_ty = self.types.string();
        let parts = self.member_format_parts(class, self_sym, line);
        let result = Expr {
            kind: ExprKind::Interpolated(parts),
            ty: Some(str_ty),
            line,
        };
        self.block_mut(body).stmts.push(Stmt::Return(Some(result)));
        func
    }

    // One walk builds both halves of the interpolation: literal pieces
    // `{x = `, `, y = `, `}` and the matching `self.<member>` accesses.
    fn member_format_parts(&mut self, class: ClassId, self_sym: Symbol, line: u32) -> Vec<StringPart> {
        let handle_ty = self.types.uint(32);
        let self_ty = self.class(class).datatype;
        let body = self.class(class).body;
        let members = self.block(body).vars.clone();

        let mut parts = vec![StringPart::Literal("{".to_string())];
        let mut first = true;
        for var_id in members {
            let (name, ty) = {
                let var = self.var(var_id);
                if !var.is_data_member() {
                    continue;
                }
                (var.name, var.ty)
            };
            if !first {
                parts.push(StringPart::Literal(", ".to_string()));
            }
            first = false;
            parts.push(StringPart::Literal(format!("{} = ", self.name(name))));

            let self_expr = Expr::identifier(self_sym, Some(self_ty), line);
            let access = Expr::field(self_expr, name, ty, line);
            let value = match ty {
                // Object references print as numeric handles, never
                // recursively, so output stays bounded over cyclic graphs.
                Some(ty) if self.types.is_object_ref(ty) => Expr::cast(handle_ty, access, line),
                _ => access,
            };
            parts.push(StringPart::Value(value));
        }
        parts.push(StringPart::Literal("}".to_string()));
        parts
    }

    /// Synthesize `dump(self)`: print `self.toString()` and a newline. The
    /// toString call resolves by name at use time, so overrides replace
    /// dump's output for free.
    pub fn generate_dump(&mut self, class: ClassId) -> FunctionId {
        let class_block = self.class(class).body;
        let line = self.block(class_block).line;
        let name = self.interner.intern("dump");
        let func = self.add_function(class_block, name, FnKind::Plain, true, line);
        let body = self.function(func).body;
        let self_sym = self.interner.intern("self");
        self.add_variable(body, Variable::parameter(self_sym, false, line));

        let to_string = self.interner.intern("toString");
        let self_ty = self.class(class).datatype;
        let callee = Expr::field(
            Expr::identifier(self_sym, Some(self_ty), line),
            to_string,
            None,
            line,
        );
        let call = Expr::call(callee, Vec::new(), line);
        let newline = Expr::string_literal("\n", line);
        self.block_mut(body).stmts.push(Stmt::Print(vec![call, newline]));
        func
    }

    /// Look up a method by name in the class body's ident table. Returns
    /// `None` for absent names and for non-function idents (a data member
    /// shadowing the name is not a method).
    pub fn find_method(&self, class: ClassId, name: Symbol) -> Option<FunctionId> {
        match self.block(self.class(class).body).ident(name) {
            Some(Ident::Function(func)) => Some(func),
            _ => None,
        }
    }
}
