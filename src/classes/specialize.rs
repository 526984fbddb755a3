// src/classes/specialize.rs
//
// The specialization matcher and pool: decide whether a call signature can
// reuse an existing concrete class of a template, or whether a new
// specialization must be materialized. Also the default-class fast path for
// templates with no identity-relevant parameters.

use crate::classes::ConcreteClass;
use crate::errors::{InternalError, fatal};
use crate::identity::{BlockId, ClassId, FunctionId, SigId, TemplateId};
use crate::intern::Symbol;
use crate::ir::{Expr, ExprKind, Ir, Stmt, VarKind, Variable};
use crate::types::{Datatype, TypeId};

impl Ir {
    /// Resolve a call signature against a template's specialization pool,
    /// creating a new concrete class only if no existing one matches.
    ///
    /// The signature memoizes its resolution: repeated calls with the same
    /// signature return the same class without rescanning the pool.
    pub fn resolve_or_create_class(&mut self, template: TemplateId, sig: SigId) -> ClassId {
        debug_assert_eq!(self.template(template).constructor, self.signature(sig).func);
        if let Some(class) = self.signature(sig).resolved_class() {
            return class;
        }
        let class = match self.find_existing_class(template, sig) {
            Some(class) => class,
            None => self.class_create(template, sig),
        };
        self.bind_signature_class(sig, class);
        class
    }

    // Scan the pool in creation order and return the first specialization
    // whose founding signature matches. A specialization without a founding
    // signature is the default class and matches any signature.
    fn find_existing_class(&self, template: TemplateId, sig: SigId) -> Option<ClassId> {
        for &class_id in &self.template(template).classes {
            match self.class(class_id).founding_sig {
                None => {
                    if !self.template(template).has_default_class {
                        fatal(InternalError::UnfoundedSpecialization { class: class_id });
                    }
                    return Some(class_id);
                }
                Some(old_sig) => {
                    if self.class_signatures_match(sig, old_sig) {
                        tracing::trace!(?sig, ?class_id, "signature matched existing class");
                        return Some(class_id);
                    }
                }
            }
        }
        None
    }

    // Two signatures produce the same class if the datatypes agree at every
    // parameter flagged in_signature. Only the parameter prefix of the
    // constructor's variable list is compared; the first non-parameter
    // variable ends the walk as a match.
    fn class_signatures_match(&self, new_sig: SigId, old_sig: SigId) -> bool {
        let constructor = self.signature(new_sig).func;
        let block = self.function(constructor).body;
        let mut x_param = 0usize;
        for &var_id in &self.block(block).vars {
            let var = self.var(var_id);
            if var.kind != VarKind::Parameter {
                return true;
            }
            if var.in_signature {
                let new_ty = self.sig_arg(new_sig, x_param);
                let old_ty = self.sig_arg(old_sig, x_param);
                if !self.datatypes_compatible(new_ty, old_ty) {
                    return false;
                }
            }
            x_param += 1;
        }
        true
    }

    // Identity comparison tolerates one asymmetry: a not-yet-resolved
    // placeholder for template T is compatible with an existing concrete
    // class of T. This is what lets a constructor mention its own class
    // type inside its own body.
    fn datatypes_compatible(&self, new: TypeId, old: TypeId) -> bool {
        if new == old {
            return true;
        }
        match (self.types.get(new), self.types.get(old)) {
            (Datatype::Unresolved(template), Datatype::Class(class)) => {
                self.class(*class).template == *template
            }
            _ => false,
        }
    }

    fn sig_arg(&self, sig: SigId, param_index: usize) -> TypeId {
        let signature = self.signature(sig);
        match signature.arg_types.get(param_index) {
            Some(&ty) => ty,
            None => fatal(InternalError::SignatureTooShort {
                sig,
                param_index,
                found: signature.arg_types.len(),
            }),
        }
    }

    // Allocate a specialization record: next sequence number, fresh body
    // block, fresh instance datatype, appended to the template's pool.
    fn alloc_class(&mut self, template: TemplateId) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        let (ref_width, line) = {
            let tmpl = self.template(template);
            (tmpl.ref_width, tmpl.line)
        };
        let body = self.new_block(line);
        let datatype = self.types.intern(Datatype::Class(id));
        self.classes.push(ConcreteClass {
            template,
            number: self.template(template).num_classes + 1,
            ref_width,
            datatype,
            body,
            founding_sig: None,
        });
        let tmpl = self.template_mut(template);
        tmpl.num_classes += 1;
        tmpl.classes.push(id);
        id
    }

    // Materialize an ordinary specialization: independent data members for
    // every self-field the constructor assigns, plus the integer-typed
    // nextFree free-list link.
    fn class_create(&mut self, template: TemplateId, sig: SigId) -> ClassId {
        let class = self.alloc_class(template);
        let members = self.collect_members(template, sig);
        let body = self.class(class).body;
        for (name, ty, line) in members {
            self.add_variable(
                body,
                Variable {
                    ty: Some(ty),
                    ..Variable::local(name, None, line)
                },
            );
        }
        let (ref_width, line) = {
            let tmpl = self.template(template);
            (tmpl.ref_width, tmpl.line)
        };
        let next_free_ty = self.types.uint(ref_width);
        self.add_next_free(body, next_free_ty, line);
        self.class_mut(class).founding_sig = Some(sig);
        tracing::debug!(
            ?template,
            ?class,
            number = self.class(class).number,
            "created specialization"
        );
        class
    }

    fn add_next_free(&mut self, body: BlockId, ty: TypeId, line: u32) {
        let name = self.interner.intern("nextFree");
        self.add_variable(
            body,
            Variable {
                generated: true,
                ty: Some(ty),
                ..Variable::local(name, None, line)
            },
        );
    }

    // Static scan of the constructor body for `self.<field> = <expr>`
    // assignments, in statement order, first assignment per field wins.
    // This fixes the member list and types before any method synthesis runs.
    fn collect_members(&mut self, template: TemplateId, sig: SigId) -> Vec<(Symbol, TypeId, u32)> {
        let self_sym = self.interner.intern("self");
        let constructor = self.template(template).constructor;
        let ctor_body = self.function(constructor).body;

        let mut members: Vec<(Symbol, TypeId, u32)> = Vec::new();
        let mut pending: Vec<(Symbol, Expr, u32)> = Vec::new();
        for stmt in &self.block(ctor_body).stmts {
            let Stmt::Assign(assign) = stmt else { continue };
            let ExprKind::Field(access) = &assign.target.kind else {
                continue;
            };
            let ExprKind::Identifier(object) = &access.object.kind else {
                continue;
            };
            if *object != self_sym {
                continue;
            }
            if pending.iter().any(|(name, _, _)| *name == access.field) {
                continue;
            }
            pending.push((access.field, assign.value.clone(), assign.value.line));
        }
        for (name, value, line) in pending {
            let ty = self.member_init_type(name, &value, constructor, sig);
            members.push((name, ty, line));
        }
        members
    }

    // The member's datatype: the binder's annotation if present, else the
    // literal's own type, else the signature's type at the referenced
    // parameter position. Anything else is a binder bug.
    fn member_init_type(
        &mut self,
        field: Symbol,
        value: &Expr,
        constructor: FunctionId,
        sig: SigId,
    ) -> TypeId {
        if let Some(ty) = value.ty {
            return ty;
        }
        match &value.kind {
            ExprKind::IntLiteral(_) => return self.types.uint(64),
            ExprKind::StringLiteral(_) => return self.types.string(),
            _ => {}
        }
        if let ExprKind::Identifier(name) = &value.kind {
            let block = self.function(constructor).body;
            let mut x_param = 0usize;
            for &var_id in &self.block(block).vars {
                let var = self.var(var_id);
                if var.kind != VarKind::Parameter {
                    break;
                }
                if var.name == *name {
                    return self.sig_arg(sig, x_param);
                }
                x_param += 1;
            }
        }
        fatal(InternalError::UntypedMemberInit {
            field: self.name(field).to_string(),
            line: value.line,
        });
    }

    /// The default-class fast path.
    ///
    /// Returns `None` when the template has identity-relevant parameters:
    /// the caller must use the signature-based path. Otherwise a single
    /// shared specialization is created on first request and returned on
    /// every call thereafter. If a specialization already exists when first
    /// asked, it is adopted as the default instead of creating a second one.
    pub fn get_default_class(&mut self, template: TemplateId) -> Option<ClassId> {
        if !self.template(template).has_default_class {
            if self.template_has_signature_params(template) {
                return None;
            }
            if self.template(template).classes.is_empty() {
                self.default_class_create(template);
            }
            self.template_mut(template).has_default_class = true;
            tracing::debug!(?template, "template classified as defaulted");
        }
        match self.template(template).classes.first() {
            Some(&class) => Some(class),
            None => fatal(InternalError::DefaultClassMissing { template }),
        }
    }

    fn template_has_signature_params(&self, template: TemplateId) -> bool {
        let block = self.function(self.template(template).constructor).body;
        self.block(block)
            .vars
            .iter()
            .any(|&var| self.var(var).in_signature)
    }

    // The default specialization shares the template's declarations instead
    // of cloning them: its body holds forwarding identifiers to the original
    // methods and inner types, and its nextFree link is typed as the class's
    // own self type so free lists can chain directly.
    fn default_class_create(&mut self, template: TemplateId) -> ClassId {
        let class = self.alloc_class(template);
        let body = self.class(class).body;
        let self_ty = self.class(class).datatype;
        let line = self.template(template).line;
        self.add_next_free(body, self_ty, line);

        let ctor_body = self.function(self.template(template).constructor).body;
        let shared = self.block(ctor_body).funcs.clone();
        for func in shared {
            let name = self.function(func).name;
            self.bind_function_ident(body, name, func);
        }
        tracing::debug!(?template, ?class, "created default class");
        class
    }

    /// Rewrite member types that still carry the owning template's
    /// unresolved placeholder to the concrete class datatype. Run once the
    /// specialization is fully constructed.
    pub fn resolve_self_references(&mut self, class: ClassId) {
        let template = self.class(class).template;
        let datatype = self.class(class).datatype;
        let body = self.class(class).body;
        let vars = self.block(body).vars.clone();
        for var_id in vars {
            let Some(ty) = self.var(var_id).ty else {
                continue;
            };
            if matches!(self.types.get(ty), Datatype::Unresolved(t) if *t == template) {
                self.var_mut(var_id).ty = Some(datatype);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FnKind;
    use crate::signature::ArgTypeVec;

    // A constructor whose parameters carry the given in_signature flags.
    fn ctor_with_params(ir: &mut Ir, name: &str, params: &[(&str, bool)]) -> FunctionId {
        let root = ir.new_block(1);
        let sym = ir.interner.intern(name);
        let ctor = ir.add_function(root, sym, FnKind::Constructor, false, 1);
        let body = ir.function(ctor).body;
        for (param, in_signature) in params {
            let param_sym = ir.interner.intern(param);
            ir.add_variable(body, Variable::parameter(param_sym, *in_signature, 1));
        }
        ctor
    }

    fn assign_self_field(ir: &mut Ir, ctor: FunctionId, field: &str, value: Expr) {
        let self_sym = ir.interner.intern("self");
        let field_sym = ir.interner.intern(field);
        let target = Expr::field(Expr::identifier(self_sym, None, 1), field_sym, None, 1);
        let body = ir.function(ctor).body;
        ir.block_mut(body)
            .stmts
            .push(Stmt::Assign(Box::new(crate::ir::AssignStmt {
                target,
                value,
            })));
    }

    #[test]
    fn non_signature_params_do_not_split_classes() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Pair", &[("key", true), ("value", false)]);
        let tmpl = ir.create_template_class(ctor, 32, 1);

        let u64_ty = ir.types.uint(64);
        let str_ty = ir.types.string();
        let bool_ty = ir.types.bool();

        let a = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty, str_ty]));
        let b = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty, bool_ty]));
        let c = ir.new_signature(ctor, ArgTypeVec::from_slice(&[str_ty, str_ty]));

        let class_a = ir.resolve_or_create_class(tmpl, a);
        let class_b = ir.resolve_or_create_class(tmpl, b);
        let class_c = ir.resolve_or_create_class(tmpl, c);

        assert_eq!(class_a, class_b);
        assert_ne!(class_a, class_c);
    }

    #[test]
    fn comparison_stops_at_first_non_parameter() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Box", &[("item", true)]);
        let body = ir.function(ctor).body;
        let scratch = ir.interner.intern("scratch");
        ir.add_variable(body, Variable::local(scratch, None, 2));

        let tmpl = ir.create_template_class(ctor, 32, 1);
        let u64_ty = ir.types.uint(64);
        let str_ty = ir.types.string();

        // Extra trailing types beyond the parameter prefix are never compared.
        let a = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty, u64_ty]));
        let b = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty, str_ty]));

        let class_a = ir.resolve_or_create_class(tmpl, a);
        let class_b = ir.resolve_or_create_class(tmpl, b);
        assert_eq!(class_a, class_b);
    }

    #[test]
    fn placeholder_is_compatible_with_own_class_only() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Node", &[("next", true)]);
        let tmpl = ir.create_template_class(ctor, 32, 1);

        let other_ctor = ctor_with_params(&mut ir, "Leaf", &[("next", true)]);
        let other_tmpl = ir.create_template_class(other_ctor, 32, 1);

        // Founding call: the constructor references its own class through
        // the unresolved placeholder.
        let own_placeholder = ir.types.intern(Datatype::Unresolved(tmpl));
        let sig1 = ir.new_signature(ctor, ArgTypeVec::from_slice(&[own_placeholder]));
        let class = ir.resolve_or_create_class(tmpl, sig1);

        // A later call passing the concrete class type... first rebuild the
        // founding signature's view: new placeholder against old concrete.
        let concrete = ir.class(class).datatype;
        let sig2 = ir.new_signature(ctor, ArgTypeVec::from_slice(&[concrete]));
        // concrete vs placeholder founding type: not identical, and the
        // tolerated direction is placeholder-new vs concrete-old, so this
        // founds a second specialization.
        let class2 = ir.resolve_or_create_class(tmpl, sig2);
        assert_ne!(class, class2);

        // placeholder-new vs concrete-old matches class2.
        let sig3 = ir.new_signature(ctor, ArgTypeVec::from_slice(&[own_placeholder]));
        let class3 = ir.resolve_or_create_class(tmpl, sig3);
        assert_eq!(class3, class);

        // A placeholder for a different template never matches.
        let foreign = ir.types.intern(Datatype::Unresolved(other_tmpl));
        let sig4 = ir.new_signature(ctor, ArgTypeVec::from_slice(&[foreign]));
        let class4 = ir.resolve_or_create_class(tmpl, sig4);
        assert_ne!(class4, class);
        assert_ne!(class4, class2);
    }

    #[test]
    fn members_come_from_self_assignments_in_order() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Point", &[("x", true), ("y", true)]);
        let x = ir.interner.intern("x");
        let y = ir.interner.intern("y");
        assign_self_field(&mut ir, ctor, "x", Expr::identifier(x, None, 2));
        assign_self_field(&mut ir, ctor, "y", Expr::identifier(y, None, 3));
        // A second assignment to x must not add a second member.
        assign_self_field(&mut ir, ctor, "x", Expr::identifier(y, None, 4));

        let tmpl = ir.create_template_class(ctor, 32, 1);
        let u64_ty = ir.types.uint(64);
        let str_ty = ir.types.string();
        let sig = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty, str_ty]));
        let class = ir.resolve_or_create_class(tmpl, sig);

        let body = ir.class(class).body;
        let vars = ir.block(body).vars.clone();
        assert_eq!(vars.len(), 3); // x, y, nextFree

        assert_eq!(ir.var(vars[0]).name, x);
        assert_eq!(ir.var(vars[0]).ty, Some(u64_ty));
        assert_eq!(ir.var(vars[1]).name, y);
        assert_eq!(ir.var(vars[1]).ty, Some(str_ty));

        let handle_ty = ir.types.uint(32);
        let next_free = ir.var(vars[2]);
        assert!(next_free.generated);
        assert_eq!(next_free.ty, Some(handle_ty));
    }

    #[test]
    fn literal_initializers_carry_their_own_type() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Point", &[("seed", true)]);
        let x = ir.interner.intern("x");
        let y = ir.interner.intern("y");
        assign_self_field(&mut ir, ctor, "x", Expr::int_literal(5, 2));
        assign_self_field(&mut ir, ctor, "y", Expr::string_literal("hi", 3));

        let tmpl = ir.create_template_class(ctor, 32, 1);
        let u64_ty = ir.types.uint(64);
        let sig = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty]));
        let class = ir.resolve_or_create_class(tmpl, sig);

        let body = ir.class(class).body;
        let vars = ir.block(body).vars.clone();
        let str_ty = ir.types.string();
        assert_eq!(ir.var(vars[0]).name, x);
        assert_eq!(ir.var(vars[0]).ty, Some(u64_ty));
        assert_eq!(ir.var(vars[1]).name, y);
        assert_eq!(ir.var(vars[1]).ty, Some(str_ty));
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn short_signature_for_member_init_is_fatal() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Span", &[("start", true), ("end", true)]);
        let end = ir.interner.intern("end");
        assign_self_field(&mut ir, ctor, "end", Expr::identifier(end, None, 2));

        let tmpl = ir.create_template_class(ctor, 32, 1);
        let u64_ty = ir.types.uint(64);
        // One arg type for two identity parameters.
        let sig = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty]));
        ir.resolve_or_create_class(tmpl, sig);
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn comparison_past_signature_end_is_fatal() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Span", &[("start", true), ("end", true)]);
        let tmpl = ir.create_template_class(ctor, 32, 1);

        let u64_ty = ir.types.uint(64);
        let full = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty, u64_ty]));
        ir.resolve_or_create_class(tmpl, full);

        let short = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty]));
        ir.resolve_or_create_class(tmpl, short);
    }

    #[test]
    fn default_class_is_none_with_identity_params() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Box", &[("item", true)]);
        let tmpl = ir.create_template_class(ctor, 32, 1);
        assert_eq!(ir.get_default_class(tmpl), None);
    }

    #[test]
    fn default_class_forwards_methods_and_self_links() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Logger", &[("level", false)]);
        let tmpl = ir.create_template_class(ctor, 32, 1);
        // A user method on the template body.
        let ctor_body = ir.function(ctor).body;
        let log = ir.interner.intern("log");
        let log_fn = ir.add_function(ctor_body, log, FnKind::Plain, false, 2);

        let class = ir.get_default_class(tmpl).unwrap();
        let body = ir.class(class).body;

        // Forwarding identifiers, not owned copies.
        assert!(ir.block(body).funcs.is_empty());
        assert_eq!(
            ir.block(body).ident(log),
            Some(crate::ir::Ident::Function(log_fn))
        );
        let destroy = ir.interner.intern("destroy");
        assert!(matches!(
            ir.block(body).ident(destroy),
            Some(crate::ir::Ident::Function(_))
        ));

        // nextFree is typed as the class's own self type.
        let vars = ir.block(body).vars.clone();
        assert_eq!(vars.len(), 1);
        assert_eq!(ir.var(vars[0]).ty, Some(ir.class(class).datatype));
    }

    #[test]
    fn existing_specialization_is_adopted_as_default() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Counter", &[("start", false)]);
        let tmpl = ir.create_template_class(ctor, 32, 1);

        let u64_ty = ir.types.uint(64);
        let sig = ir.new_signature(ctor, ArgTypeVec::from_slice(&[u64_ty]));
        let class = ir.resolve_or_create_class(tmpl, sig);

        assert_eq!(ir.get_default_class(tmpl), Some(class));
        assert!(ir.template(tmpl).has_default_class());
        // And the defaulted template now matches any signature.
        let str_ty = ir.types.string();
        let sig2 = ir.new_signature(ctor, ArgTypeVec::from_slice(&[str_ty]));
        assert_eq!(ir.resolve_or_create_class(tmpl, sig2), class);
    }

    #[test]
    fn resolve_self_references_rewrites_placeholders() {
        let mut ir = Ir::new();
        let ctor = ctor_with_params(&mut ir, "Node", &[("next", true)]);
        let next = ir.interner.intern("next");
        assign_self_field(&mut ir, ctor, "next", Expr::identifier(next, None, 2));

        let tmpl = ir.create_template_class(ctor, 32, 1);
        let placeholder = ir.types.intern(Datatype::Unresolved(tmpl));
        let sig = ir.new_signature(ctor, ArgTypeVec::from_slice(&[placeholder]));
        let class = ir.resolve_or_create_class(tmpl, sig);

        let body = ir.class(class).body;
        let member = ir.block(body).vars[0];
        assert_eq!(ir.var(member).ty, Some(placeholder));

        ir.resolve_self_references(class);
        assert_eq!(ir.var(member).ty, Some(ir.class(class).datatype));
    }
}
