// src/classes/mod.rs
//
// Template classes and their concrete specializations.
//
// Every class in Reed is a template. Its constructor is called like a
// function, and each call signature either reuses an existing specialization
// or materializes a new one; identity is decided by the argument datatypes at
// the parameters flagged as signature-relevant, not by a declared type
// parameter list. The matcher/pool lives in `specialize`, the built-in
// method synthesis in `methods`, and the trace rendering in `dump`.

pub mod dump;
pub mod methods;
pub mod specialize;

use crate::errors::{InternalError, fatal};
use crate::identity::{BlockId, ClassId, FunctionId, SigId, TemplateId};
use crate::intern::Symbol;
use crate::ir::{FnKind, Ir, Variable};
use crate::types::{Datatype, TypeId};

/// A generic class definition: one per constructor declaration.
///
/// Owns the ordered list of specializations created from it. The list is
/// append-only for the lifetime of a compilation and sequence numbers come
/// from `num_classes`, so numbering is monotonic from 1 with no reuse.
#[derive(Debug)]
pub struct TemplateClass {
    pub name: Symbol,
    pub constructor: FunctionId,
    /// Bit width of the opaque handle used to address instances
    pub ref_width: u32,
    /// The type of the template value itself (`Datatype::Template`)
    pub datatype: TypeId,
    pub(crate) has_default_class: bool,
    pub(crate) num_classes: u32,
    pub(crate) classes: Vec<ClassId>,
    pub line: u32,
}

impl TemplateClass {
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    pub fn has_default_class(&self) -> bool {
        self.has_default_class
    }
}

/// One monomorphized specialization of a template class.
#[derive(Debug)]
pub struct ConcreteClass {
    pub template: TemplateId,
    /// 1-based sequence number, unique within the owning template
    pub number: u32,
    pub ref_width: u32,
    /// The instance type of this specialization (`Datatype::Class`)
    pub datatype: TypeId,
    /// Holds data members and per-specialization methods
    pub body: BlockId,
    /// The signature this specialization was created for; `None` only for
    /// the default-class specialization
    pub(crate) founding_sig: Option<SigId>,
}

impl ConcreteClass {
    pub fn founding_sig(&self) -> Option<SigId> {
        self.founding_sig
    }
}

impl Ir {
    /// Create a template class for `constructor` and register it.
    ///
    /// Unless the constructor is a compiler built-in, a default `destroy`
    /// destructor is synthesized into the constructor's body block as an
    /// extension point for later passes.
    pub fn create_template_class(
        &mut self,
        constructor: FunctionId,
        ref_width: u32,
        line: u32,
    ) -> TemplateId {
        if self.function(constructor).template.is_some() {
            fatal(InternalError::DuplicateTemplate { constructor });
        }
        let id = TemplateId::new(self.templates.len() as u32);
        let datatype = self.types.intern(Datatype::Template(id));
        let name = self.function(constructor).name;
        self.templates.push(TemplateClass {
            name,
            constructor,
            ref_width,
            datatype,
            has_default_class: false,
            num_classes: 0,
            classes: Vec::new(),
            line,
        });
        self.function_mut(constructor).template = Some(id);
        if !self.function(constructor).builtin {
            self.add_destroy_method(id);
        }
        tracing::debug!(?id, name = %self.name(name), ref_width, "created template class");
        id
    }

    /// Copy a template class into a new constructor context (e.g. when a
    /// containing module is duplicated). Specializations are not copied;
    /// they are populated independently as calls bind against the new
    /// constructor.
    pub fn copy_template_class(
        &mut self,
        template: TemplateId,
        dest_constructor: FunctionId,
    ) -> TemplateId {
        let (ref_width, line) = {
            let tmpl = self.template(template);
            (tmpl.ref_width, tmpl.line)
        };
        self.create_template_class(dest_constructor, ref_width, line)
    }

    pub fn template(&self, id: TemplateId) -> &TemplateClass {
        &self.templates[id.index() as usize]
    }

    pub fn template_mut(&mut self, id: TemplateId) -> &mut TemplateClass {
        &mut self.templates[id.index() as usize]
    }

    pub fn class(&self, id: ClassId) -> &ConcreteClass {
        &self.classes[id.index() as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ConcreteClass {
        &mut self.classes[id.index() as usize]
    }

    // Default destructor: `destroy(self)` with an empty body. Code
    // generators append cleanup logic later.
    fn add_destroy_method(&mut self, template: TemplateId) {
        let constructor = self.template(template).constructor;
        let class_block = self.function(constructor).body;
        let line = self.block(class_block).line;
        let name = self.interner.intern("destroy");
        let func = self.add_function(class_block, name, FnKind::Destructor, true, line);
        let body = self.function(func).body;
        let self_sym = self.interner.intern("self");
        self.add_variable(body, Variable::parameter(self_sym, false, line));
    }
}
