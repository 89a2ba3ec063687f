//! Variable declarations and the symbol table.

use indexmap::IndexMap;
use rddl_core::{FluentClass, Location, ModelError, TypeId, Value, ValueType, VarId};

/// A resolved pvariable declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    /// Variable name.
    pub name: String,
    /// Fluent class.
    pub class: FluentClass,
    /// Value type.
    pub value_type: ValueType,
    /// Parameter types, in order.
    pub params: Vec<TypeId>,
    /// Default value (absent only for derived fluents).
    pub default: Option<Value>,
    /// `level = n`, kept for reference. Derived fluents are ordered by
    /// their dependencies, not by level.
    pub level: Option<i64>,
    /// Declaration site.
    pub at: Location,
}

impl VarDecl {
    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Name to declaration map. `VarId(n)` is the n-th declaration.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    vars: Vec<VarDecl>,
    ids: IndexMap<String, VarId>,
}

impl SymbolTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a new variable. Fails with `DuplicateDeclaration` if the name
    /// is already bound.
    pub fn declare(&mut self, decl: VarDecl) -> Result<VarId, ModelError> {
        if self.ids.contains_key(&decl.name) {
            return Err(ModelError::DuplicateDeclaration {
                kind: "variable",
                name: decl.name,
                at: decl.at,
            });
        }
        let id = VarId(self.vars.len() as u32);
        self.ids.insert(decl.name.clone(), id);
        self.vars.push(decl);
        Ok(id)
    }

    /// Resolve a name at a use site. Fails with `UnknownVariable`.
    pub fn lookup(&self, name: &str, at: Location) -> Result<(VarId, &VarDecl), ModelError> {
        self.ids
            .get(name)
            .map(|&id| (id, &self.vars[id.0 as usize]))
            .ok_or_else(|| ModelError::UnknownVariable {
                name: name.to_string(),
                at,
            })
    }

    /// Id of a name, if bound.
    pub fn id_of(&self, name: &str) -> Option<VarId> {
        self.ids.get(name).copied()
    }

    /// Declaration of an id, if it belongs to this table.
    pub fn get(&self, id: VarId) -> Option<&VarDecl> {
        self.vars.get(id.0 as usize)
    }

    /// Name of an id (`?` for foreign ids).
    pub fn name(&self, id: VarId) -> &str {
        self.get(id).map_or("?", |d| d.name.as_str())
    }

    /// Iterate `(id, decl)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarDecl)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, d)| (VarId(i as u32), d))
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, class: FluentClass) -> VarDecl {
        VarDecl {
            name: name.into(),
            class,
            value_type: ValueType::Real,
            params: Vec::new(),
            default: Some(Value::Real(0.0)),
            level: None,
            at: Location::new(2, 5),
        }
    }

    #[test]
    fn ids_follow_declaration_order() {
        let mut table = SymbolTable::new();
        let x = table.declare(decl("xPos", FluentClass::StateFluent)).unwrap();
        let m = table.declare(decl("xMove", FluentClass::ActionFluent)).unwrap();
        assert_eq!((x, m), (VarId(0), VarId(1)));
        assert_eq!(table.lookup("xMove", Location::default()).unwrap().0, m);
        assert_eq!(table.name(x), "xPos");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut table = SymbolTable::new();
        table.declare(decl("x", FluentClass::StateFluent)).unwrap();
        let err = table.declare(decl("x", FluentClass::NonFluent)).unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateDeclaration {
                kind: "variable",
                name: "x".into(),
                at: Location::new(2, 5),
            }
        );
    }

    #[test]
    fn unknown_names_report_the_use_site() {
        let table = SymbolTable::new();
        let err = table.lookup("y", Location::new(7, 3)).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownVariable {
                name: "y".into(),
                at: Location::new(7, 3),
            }
        );
    }
}
