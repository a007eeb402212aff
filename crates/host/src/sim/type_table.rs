use std::cell::Cell;

use crate::HostError;

use super::reflect::{
    HostValue, MemberHandle, MemberKind, MemberScope, ModuleId, TypeHandle, TypeRegistry,
};
use super::scene::HostWorld;
use super::Simulation;

/// Where a declared member gets its value from when read or invoked.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberSource {
    Constant(HostValue),
    /// Instance read of a named attribute on the target object.
    Attribute(String),
    /// Instance read of the same-named field on a record target.
    RecordField,
    /// One record per roster entry, with `field` holding the character.
    Roster {
        record_type: TypeHandle,
        field: String,
    },
    /// Every access fails with the given reason.
    Faulty(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    pub name: String,
    pub kind: MemberKind,
    pub scope: MemberScope,
    pub source: MemberSource,
}

impl MemberDef {
    pub fn new(
        name: impl Into<String>,
        kind: MemberKind,
        scope: MemberScope,
        source: MemberSource,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            scope,
            source,
        }
    }

    pub fn static_field(name: impl Into<String>, source: MemberSource) -> Self {
        Self::new(name, MemberKind::Field, MemberScope::Static, source)
    }

    pub fn static_property(name: impl Into<String>, source: MemberSource) -> Self {
        Self::new(name, MemberKind::Property, MemberScope::Static, source)
    }

    pub fn static_method(name: impl Into<String>, source: MemberSource) -> Self {
        Self::new(name, MemberKind::Method, MemberScope::Static, source)
    }

    pub fn instance_field(name: impl Into<String>, source: MemberSource) -> Self {
        Self::new(name, MemberKind::Field, MemberScope::Instance, source)
    }

    pub fn instance_property(name: impl Into<String>, source: MemberSource) -> Self {
        Self::new(name, MemberKind::Property, MemberScope::Instance, source)
    }
}

#[derive(Debug, Clone)]
struct ModuleDef {
    name: String,
    load_fault: Option<String>,
    types: Vec<TypeHandle>,
}

#[derive(Debug, Clone)]
struct TypeDef {
    module: ModuleId,
    full_name: String,
    short_name: String,
    nested: Vec<(String, TypeHandle)>,
    members: Vec<MemberDef>,
}

#[derive(Debug, Default)]
pub(crate) struct TypeTable {
    modules: Vec<ModuleDef>,
    types: Vec<TypeDef>,
    type_listings: Cell<u64>,
}

impl TypeTable {
    fn module(&self, module: ModuleId) -> Result<&ModuleDef, HostError> {
        self.modules
            .get(module.0 as usize)
            .ok_or(HostError::UnknownModule(module.0))
    }

    fn type_def(&self, type_handle: TypeHandle) -> Result<&TypeDef, HostError> {
        self.types
            .get(type_handle.0 as usize)
            .ok_or(HostError::UnknownType(type_handle.0))
    }

    fn member_def(&self, member: MemberHandle) -> Result<&MemberDef, HostError> {
        self.type_def(member.owner)?
            .members
            .get(member.index as usize)
            .ok_or(HostError::UnknownMember {
                owner: member.owner.0,
                index: member.index,
            })
    }

    fn push_type(&mut self, module: ModuleId, full_name: String, short_name: String) -> TypeHandle {
        let handle = TypeHandle(self.types.len() as u32);
        self.types.push(TypeDef {
            module,
            full_name,
            short_name,
            nested: Vec::new(),
            members: Vec::new(),
        });
        if let Some(module_def) = self.modules.get_mut(module.0 as usize) {
            module_def.types.push(handle);
        }
        handle
    }
}

fn short_name_of(full_name: &str) -> String {
    full_name
        .rsplit(['.', '+'])
        .next()
        .unwrap_or(full_name)
        .to_string()
}

impl HostWorld {
    pub fn define_module(&mut self, name: impl Into<String>) -> ModuleId {
        let id = ModuleId(self.types.modules.len() as u32);
        self.types.modules.push(ModuleDef {
            name: name.into(),
            load_fault: None,
            types: Vec::new(),
        });
        id
    }

    /// Makes every full listing of the module fail, as a module with
    /// unloadable dependencies would.
    pub fn fail_module_type_load(&mut self, module: ModuleId, reason: impl Into<String>) -> bool {
        match self.types.modules.get_mut(module.0 as usize) {
            Some(module_def) => {
                module_def.load_fault = Some(reason.into());
                true
            }
            None => false,
        }
    }

    pub fn define_type(&mut self, module: ModuleId, full_name: impl Into<String>) -> Option<TypeHandle> {
        self.types.module(module).ok()?;
        let full_name = full_name.into();
        let short_name = short_name_of(&full_name);
        Some(self.types.push_type(module, full_name, short_name))
    }

    pub fn define_nested_type(
        &mut self,
        owner: TypeHandle,
        name: impl Into<String>,
    ) -> Option<TypeHandle> {
        let (module, owner_full_name) = {
            let owner_def = self.types.type_def(owner).ok()?;
            (owner_def.module, owner_def.full_name.clone())
        };
        let name = name.into();
        let handle = self
            .types
            .push_type(module, format!("{owner_full_name}+{name}"), name.clone());
        if let Some(owner_def) = self.types.types.get_mut(owner.0 as usize) {
            owner_def.nested.push((name, handle));
        }
        Some(handle)
    }

    pub fn define_member(&mut self, owner: TypeHandle, member: MemberDef) -> bool {
        match self.types.types.get_mut(owner.0 as usize) {
            Some(type_def) => {
                type_def.members.push(member);
                true
            }
            None => false,
        }
    }

    /// Number of full type listings served so far.
    pub fn type_listing_count(&self) -> u64 {
        self.types.type_listings.get()
    }

    fn evaluate(
        &self,
        member_def: &MemberDef,
        target: Option<&HostValue>,
    ) -> Result<HostValue, HostError> {
        match &member_def.source {
            MemberSource::Constant(value) => Ok(value.clone()),
            MemberSource::Faulty(reason) => Err(HostError::MemberFault {
                member: member_def.name.clone(),
                reason: reason.clone(),
            }),
            MemberSource::Attribute(attribute) => {
                let target = target.ok_or(HostError::WrongAccess {
                    member: member_def.name.clone(),
                    expected: "instance member",
                })?;
                let HostValue::Object(id) = target else {
                    return Err(HostError::TargetMismatch {
                        member: member_def.name.clone(),
                        expected: "object",
                        actual: target.kind_name(),
                    });
                };
                if !self.is_alive(*id) {
                    return Err(HostError::DanglingObject(id.0));
                }
                self.attribute(*id, attribute)
                    .cloned()
                    .ok_or_else(|| HostError::MissingAttribute {
                        object: id.0,
                        attribute: attribute.clone(),
                    })
            }
            MemberSource::RecordField => {
                let target = target.ok_or(HostError::WrongAccess {
                    member: member_def.name.clone(),
                    expected: "instance member",
                })?;
                match target {
                    HostValue::Record { .. } => Ok(target
                        .record_field(&member_def.name)
                        .cloned()
                        .unwrap_or(HostValue::Null)),
                    other => Err(HostError::TargetMismatch {
                        member: member_def.name.clone(),
                        expected: "record",
                        actual: other.kind_name(),
                    }),
                }
            }
            MemberSource::Roster { record_type, field } => Ok(HostValue::List(
                self.roster()
                    .iter()
                    .map(|id| HostValue::Record {
                        type_handle: *record_type,
                        fields: vec![(field.clone(), HostValue::Object(*id))],
                    })
                    .collect(),
            )),
        }
    }
}

impl TypeRegistry for HostWorld {
    fn modules(&self) -> Result<Vec<ModuleId>, HostError> {
        Ok((0..self.types.modules.len() as u32).map(ModuleId).collect())
    }

    fn module_name(&self, module: ModuleId) -> Result<String, HostError> {
        Ok(self.types.module(module)?.name.clone())
    }

    fn type_by_full_name(
        &self,
        module: ModuleId,
        full_name: &str,
    ) -> Result<Option<TypeHandle>, HostError> {
        let module_def = self.types.module(module)?;
        Ok(module_def.types.iter().copied().find(|handle| {
            self.types
                .type_def(*handle)
                .is_ok_and(|type_def| type_def.full_name == full_name)
        }))
    }

    fn types_in(&self, module: ModuleId) -> Result<Vec<TypeHandle>, HostError> {
        self.types
            .type_listings
            .set(self.types.type_listings.get().saturating_add(1));
        let module_def = self.types.module(module)?;
        if let Some(reason) = &module_def.load_fault {
            return Err(HostError::TypeLoad {
                module: module_def.name.clone(),
                reason: reason.clone(),
            });
        }
        Ok(module_def.types.clone())
    }

    fn short_name(&self, type_handle: TypeHandle) -> Result<String, HostError> {
        Ok(self.types.type_def(type_handle)?.short_name.clone())
    }

    fn full_name(&self, type_handle: TypeHandle) -> Result<String, HostError> {
        Ok(self.types.type_def(type_handle)?.full_name.clone())
    }

    fn nested_type(
        &self,
        owner: TypeHandle,
        name: &str,
    ) -> Result<Option<TypeHandle>, HostError> {
        Ok(self
            .types
            .type_def(owner)?
            .nested
            .iter()
            .find(|(nested_name, _)| nested_name == name)
            .map(|(_, handle)| *handle))
    }

    fn member(
        &self,
        owner: TypeHandle,
        name: &str,
        kind: MemberKind,
        scope: MemberScope,
    ) -> Result<Option<MemberHandle>, HostError> {
        let type_def = self.types.type_def(owner)?;
        Ok(type_def
            .members
            .iter()
            .position(|member| member.name == name && member.kind == kind && member.scope == scope)
            .map(|index| MemberHandle {
                owner,
                index: index as u32,
                kind,
                scope,
            }))
    }

    fn read_static(&self, member: MemberHandle) -> Result<HostValue, HostError> {
        let member_def = self.types.member_def(member)?;
        if member_def.scope != MemberScope::Static || member_def.kind == MemberKind::Method {
            return Err(HostError::WrongAccess {
                member: member_def.name.clone(),
                expected: "static field or property",
            });
        }
        self.evaluate(member_def, None)
    }

    fn invoke_static(&self, member: MemberHandle) -> Result<HostValue, HostError> {
        let member_def = self.types.member_def(member)?;
        if member_def.scope != MemberScope::Static || member_def.kind != MemberKind::Method {
            return Err(HostError::WrongAccess {
                member: member_def.name.clone(),
                expected: "static method",
            });
        }
        self.evaluate(member_def, None)
    }

    fn read_instance(
        &self,
        member: MemberHandle,
        target: &HostValue,
    ) -> Result<HostValue, HostError> {
        let member_def = self.types.member_def(member)?;
        if member_def.scope != MemberScope::Instance || member_def.kind == MemberKind::Method {
            return Err(HostError::WrongAccess {
                member: member_def.name.clone(),
                expected: "instance field or property",
            });
        }
        self.evaluate(member_def, Some(target))
    }
}
