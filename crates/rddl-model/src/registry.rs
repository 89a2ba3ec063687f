//! Type registry and object table.
//!
//! Types are numbered in declaration order. Objects get global ids in the
//! order they are added; within a type, each object also records its
//! position, which the grounder uses as its mixed-radix digit.
//! Enumeration literals are stored as objects named `@literal`, so they
//! never collide with ordinary object names.

use indexmap::IndexMap;
use rddl_core::{Location, ModelError, ObjectId, TypeId, ValueType};

/// How a type's members are supplied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeClass {
    /// Members come from `objects` sections of non-fluents and instance
    /// blocks.
    Object,
    /// Members are the `@`-literals listed in the type declaration.
    Enum,
}

/// A declared type and its members.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    /// Type name.
    pub name: String,
    /// Object or enumeration.
    pub class: TypeClass,
    /// Members in declaration order.
    pub objects: Vec<ObjectId>,
}

/// A single object or enumeration literal.
#[derive(Clone, Debug)]
pub struct ObjectInfo {
    /// Name; enumeration literals keep their leading `@`.
    pub name: String,
    /// Owning type.
    pub ty: TypeId,
    /// Zero-based position within the owning type.
    pub position: u32,
}

/// All types and objects of a compiled model.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: Vec<TypeInfo>,
    type_ids: IndexMap<String, TypeId>,
    objects: Vec<ObjectInfo>,
    object_ids: IndexMap<String, ObjectId>,
}

impl TypeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Fails with `DuplicateDeclaration` if the name is
    /// taken.
    pub fn declare_type(
        &mut self,
        name: &str,
        class: TypeClass,
        at: Location,
    ) -> Result<TypeId, ModelError> {
        if self.type_ids.contains_key(name) {
            return Err(ModelError::DuplicateDeclaration {
                kind: "type",
                name: name.to_string(),
                at,
            });
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeInfo {
            name: name.to_string(),
            class,
            objects: Vec::new(),
        });
        self.type_ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Look up a type by name. Fails with `UnknownType`.
    pub fn resolve_type(&self, name: &str, at: Location) -> Result<TypeId, ModelError> {
        self.type_ids
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownType {
                name: name.to_string(),
                at,
            })
    }

    /// Resolve a range keyword (`bool`, `int`, `real`) or a type name.
    pub fn resolve_value_type(&self, range: &str, at: Location) -> Result<ValueType, ModelError> {
        match range {
            "bool" => Ok(ValueType::Bool),
            "int" => Ok(ValueType::Int),
            "real" => Ok(ValueType::Real),
            other => self.resolve_type(other, at).map(ValueType::Object),
        }
    }

    /// Add a member to a type. For enumeration types pass the literal
    /// without `@`; it is stored with one. Fails with
    /// `DuplicateDeclaration` if an object of that name already exists.
    ///
    /// # Panics
    ///
    /// Panics if `ty` was not returned by [`declare_type`](Self::declare_type)
    /// on this registry.
    pub fn add_object(
        &mut self,
        ty: TypeId,
        name: &str,
        at: Location,
    ) -> Result<ObjectId, ModelError> {
        let info = &self.types[ty.0 as usize];
        let key = match info.class {
            TypeClass::Enum => format!("@{}", name.trim_start_matches('@')),
            TypeClass::Object => name.to_string(),
        };
        if self.object_ids.contains_key(&key) {
            return Err(ModelError::DuplicateDeclaration {
                kind: "object",
                name: key,
                at,
            });
        }
        let id = ObjectId(self.objects.len() as u32);
        let members = &mut self.types[ty.0 as usize].objects;
        let position = members.len() as u32;
        members.push(id);
        self.objects.push(ObjectInfo {
            name: key.clone(),
            ty,
            position,
        });
        self.object_ids.insert(key, id);
        Ok(id)
    }

    /// Resolve an object name as a member of `ty`.
    ///
    /// For enumeration types the name may be written with or without the
    /// leading `@`. Fails with `UnknownObject` if there is no such object
    /// or it belongs to another type.
    pub fn resolve_object(
        &self,
        name: &str,
        ty: TypeId,
        at: Location,
    ) -> Result<ObjectId, ModelError> {
        let key = match self.types.get(ty.0 as usize).map(|t| t.class) {
            Some(TypeClass::Enum) => format!("@{}", name.trim_start_matches('@')),
            _ => name.to_string(),
        };
        match self.object_ids.get(&key) {
            Some(&id) if self.objects[id.0 as usize].ty == ty => Ok(id),
            _ => Err(ModelError::UnknownObject {
                name: name.to_string(),
                expected_type: self.type_name(ty).to_string(),
                at,
            }),
        }
    }

    /// Look up an object by its stored name (with `@` for enumeration
    /// literals), regardless of type.
    pub fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.object_ids.get(name).copied()
    }

    /// Type metadata, if `ty` is registered.
    pub fn get(&self, ty: TypeId) -> Option<&TypeInfo> {
        self.types.get(ty.0 as usize)
    }

    /// Members of `ty` in declaration order (empty for unknown ids).
    pub fn objects_of(&self, ty: TypeId) -> &[ObjectId] {
        self.types
            .get(ty.0 as usize)
            .map(|t| t.objects.as_slice())
            .unwrap_or(&[])
    }

    /// Object metadata, if `id` is registered.
    pub fn object(&self, id: ObjectId) -> Option<&ObjectInfo> {
        self.objects.get(id.0 as usize)
    }

    /// Name of a type (`?` for unknown ids).
    pub fn type_name(&self, ty: TypeId) -> &str {
        self.types.get(ty.0 as usize).map_or("?", |t| t.name.as_str())
    }

    /// Name of an object (`?` for unknown ids).
    pub fn object_name(&self, id: ObjectId) -> &str {
        self.objects.get(id.0 as usize).map_or("?", |o| o.name.as_str())
    }

    /// Diagnostic name of a value type, printing object types by name.
    pub fn describe(&self, ty: ValueType) -> String {
        match ty {
            ValueType::Object(t) => self.type_name(t).to_string(),
            other => other.keyword().to_string(),
        }
    }

    /// Number of registered types.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of registered objects across all types.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Iterate `(id, info)` over all types.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeInfo)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }
}
