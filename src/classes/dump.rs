// src/classes/dump.rs
//
// Indented textual rendering of template classes and their specializations,
// for compiler-internal tracing only. The format is not stable across
// versions.

use std::fmt;

use crate::identity::{BlockId, ClassId, TemplateId};
use crate::ir::Ir;
use crate::types::{Datatype, TypeId};

impl Ir {
    pub fn dump_template(&self, id: TemplateId) -> String {
        TemplateDump { ir: self, id }.to_string()
    }

    pub fn dump_class(&self, id: ClassId) -> String {
        ClassDump { ir: self, id }.to_string()
    }
}

struct TemplateDump<'a> {
    ir: &'a Ir,
    id: TemplateId,
}

impl fmt::Display for TemplateDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tmpl = self.ir.template(self.id);
        writeln!(
            f,
            "class {} (0x{:x}) {{",
            self.ir.name(tmpl.name),
            self.id.index()
        )?;
        let block = self.ir.function(tmpl.constructor).body;
        write_block(f, self.ir, block, 1)?;
        writeln!(f, "}}")
    }
}

struct ClassDump<'a> {
    ir: &'a Ir,
    id: ClassId,
}

impl fmt::Display for ClassDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.ir.class(self.id);
        let name = self.ir.name(self.ir.template(class.template).name);
        writeln!(
            f,
            "class {}#{} (0x{:x}) {{",
            name,
            class.number,
            self.id.index()
        )?;
        write_block(f, self.ir, class.body, 1)?;
        writeln!(f, "}}")
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, ir: &Ir, block: BlockId, indent: usize) -> fmt::Result {
    let b = ir.block(block);
    for &var_id in &b.vars {
        let var = ir.var(var_id);
        write_indent(f, indent)?;
        match var.ty {
            Some(ty) => writeln!(f, "{}: {}", ir.name(var.name), type_name(ir, ty))?,
            None => writeln!(f, "{}", ir.name(var.name))?,
        }
    }
    for &func_id in &b.funcs {
        let func = ir.function(func_id);
        write_indent(f, indent)?;
        writeln!(f, "func {} {{", ir.name(func.name))?;
        write_block(f, ir, func.body, indent + 1)?;
        write_indent(f, indent)?;
        writeln!(f, "}}")?;
    }
    Ok(())
}

fn write_indent(f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        f.write_str("  ")?;
    }
    Ok(())
}

/// Human-readable datatype name for trace output.
pub fn type_name(ir: &Ir, ty: TypeId) -> String {
    match ir.types.get(ty) {
        Datatype::Uint(width) => format!("u{width}"),
        Datatype::Int(width) => format!("i{width}"),
        Datatype::Float(width) => format!("f{width}"),
        Datatype::Bool => "bool".to_string(),
        Datatype::String => "string".to_string(),
        Datatype::Tuple(children) => {
            let inner: Vec<String> = children.iter().map(|&c| type_name(ir, c)).collect();
            format!("({})", inner.join(", "))
        }
        Datatype::Template(id) => format!("template {}", ir.name(ir.template(*id).name)),
        Datatype::Class(id) => {
            let class = ir.class(*id);
            format!("{}#{}", ir.name(ir.template(class.template).name), class.number)
        }
        Datatype::Unresolved(id) => {
            format!("unresolved {}", ir.name(ir.template(*id).name))
        }
    }
}
