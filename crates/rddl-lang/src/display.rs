//! Source rendering for AST nodes.
//!
//! Output re-parses to an equivalent tree. Expressions are printed fully
//! parenthesized: every infix node and every `~` gets `( )`, every
//! conditional and aggregation body gets `[ ]`, so precedence never has to
//! be rebuilt.

use std::fmt;

use crate::ast::{
    Assignment, Cpf, Domain, Expr, ExprKind, Instance, Literal, MaxActions, NonFluents,
    ObjectsDecl, PvarDecl, SourceFile, TypeDecl, TypeKind, UnaryOp,
};

fn write_real(f: &mut fmt::Formatter<'_>, r: f64) -> fmt::Result {
    if r == f64::INFINITY {
        f.write_str("pos-inf")
    } else if r == f64::NEG_INFINITY {
        f.write_str("neg-inf")
    } else {
        write!(f, "{r:?}")
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write_real(f, *r),
            Self::Enum(e) => write!(f, "@{e}"),
            Self::Object(o) => f.write_str(o),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Bool(b) => write!(f, "{b}"),
            ExprKind::Int(i) => write!(f, "{i}"),
            ExprKind::Real(r) => write_real(f, *r),
            ExprKind::Enum(e) => write!(f, "@{e}"),
            ExprKind::Param(p) => write!(f, "?{p}"),
            ExprKind::Fluent { name, primed, args } => {
                f.write_str(name)?;
                if *primed {
                    f.write_str("'")?;
                }
                if !args.is_empty() {
                    f.write_str("(")?;
                    write_list(f, args)?;
                    f.write_str(")")?;
                }
                Ok(())
            }
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::Not => write!(f, "(~{operand})"),
            },
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if matches!(cond.kind, ExprKind::Binary { .. }) {
                    write!(f, "[if {cond} then {then_branch} else {else_branch}]")
                } else {
                    write!(f, "[if ({cond}) then {then_branch} else {else_branch}]")
                }
            }
            ExprKind::Aggregate { op, vars, body } => {
                write!(f, "{}{{", op.prefix())?;
                for (i, (param, ty)) in vars.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "?{param} : {ty}")?;
                }
                write!(f, "}} [{body}]")
            }
            ExprKind::Sample { dist, args } => {
                write!(f, "{}(", dist.name())?;
                write_list(f, args)?;
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TypeKind::Object => write!(f, "{} : object;", self.name),
            TypeKind::Enum(members) => {
                write!(f, "{} : {{", self.name)?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "@{m}")?;
                }
                f.write_str("};")
            }
        }
    }
}

impl fmt::Display for PvarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.params.is_empty() {
            f.write_str("(")?;
            write_list(f, &self.params)?;
            f.write_str(")")?;
        }
        write!(f, " : {{ {}, {}", self.class.keyword(), self.range)?;
        if let Some(default) = &self.default {
            write!(f, ", default = {default}")?;
        }
        if let Some(level) = self.level {
            write!(f, ", level = {level}")?;
        }
        f.write_str(" };")
    }
}

impl fmt::Display for Cpf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.target)?;
        if self.primed {
            f.write_str("'")?;
        }
        if !self.params.is_empty() {
            f.write_str("(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "?{p}")?;
            }
            f.write_str(")")?;
        }
        write!(f, " = {};", self.expr)
    }
}

impl fmt::Display for ObjectsDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {{", self.type_name)?;
        write_list(f, &self.objects)?;
        f.write_str("};")
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("(")?;
            write_list(f, &self.args)?;
            f.write_str(")")?;
        }
        write!(f, " = {};", self.value)
    }
}

/// `    name {\n        item\n    };` for a non-empty section.
fn write_section<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    items: &[T],
    terminator: &str,
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "    {name} {{")?;
    for item in items {
        writeln!(f, "        {item}{terminator}")?;
    }
    writeln!(f, "    }};")
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "domain {} {{", self.name)?;
        if !self.requirements.is_empty() {
            f.write_str("    requirements = {")?;
            write_list(f, &self.requirements)?;
            writeln!(f, "}};")?;
        }
        write_section(f, "types", &self.types, "")?;
        write_section(f, "pvariables", &self.pvariables, "")?;
        write_section(f, "cpfs", &self.cpfs, "")?;
        if let Some(reward) = &self.reward {
            writeln!(f, "    reward = {reward};")?;
        }
        write_section(f, "state-action-constraints", &self.constraints, ";")?;
        write_section(f, "action-preconditions", &self.action_preconditions, ";")?;
        write_section(f, "state-invariants", &self.state_invariants, ";")?;
        f.write_str("}\n")
    }
}

impl fmt::Display for NonFluents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "non-fluents {} {{", self.name)?;
        writeln!(f, "    domain = {};", self.domain)?;
        write_section(f, "objects", &self.objects, "")?;
        write_section(f, "non-fluents", &self.values, "")?;
        f.write_str("}\n")
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "instance {} {{", self.name)?;
        writeln!(f, "    domain = {};", self.domain)?;
        if let Some(nf) = &self.non_fluents {
            writeln!(f, "    non-fluents = {nf};")?;
        }
        write_section(f, "objects", &self.objects, "")?;
        write_section(f, "init-state", &self.init_state, "")?;
        match self.max_nondef_actions {
            Some(MaxActions::Unbounded) => writeln!(f, "    max-nondef-actions = pos-inf;")?,
            Some(MaxActions::Limit(n)) => writeln!(f, "    max-nondef-actions = {n};")?,
            None => {}
        }
        if let Some(h) = self.horizon {
            writeln!(f, "    horizon = {h};")?;
        }
        if let Some(d) = self.discount {
            writeln!(f, "    discount = {d:?};")?;
        }
        f.write_str("}\n")
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut separate = |f: &mut fmt::Formatter<'_>| -> fmt::Result {
            if !std::mem::replace(&mut first, false) {
                f.write_str("\n")?;
            }
            Ok(())
        };
        for d in &self.domains {
            separate(f)?;
            write!(f, "{d}")?;
        }
        for nf in &self.non_fluents {
            separate(f)?;
            write!(f, "{nf}")?;
        }
        for inst in &self.instances {
            separate(f)?;
            write!(f, "{inst}")?;
        }
        Ok(())
    }
}
