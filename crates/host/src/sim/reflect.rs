//! Runtime type registry exposed by the host.
//!
//! Hosts publish their types grouped into modules. Types are looked up either
//! by their full (namespaced) name inside a single module, or by walking every
//! type of a module and comparing short names. Members are addressed by name,
//! kind and scope; once found, a [`MemberHandle`] can be read or invoked
//! repeatedly without another lookup.

use crate::HostError;

use super::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    Method,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Property => "property",
            Self::Method => "method",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberScope {
    Static,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberHandle {
    pub owner: TypeHandle,
    pub index: u32,
    pub kind: MemberKind,
    pub scope: MemberScope,
}

/// A value read out of the host. Objects are returned as non-owning handles.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Object(ObjectId),
    Record {
        type_handle: TypeHandle,
        fields: Vec<(String, HostValue)>,
    },
    List(Vec<HostValue>),
}

impl HostValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Object(_) => "object",
            Self::Record { .. } => "record",
            Self::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn record_field(&self, name: &str) -> Option<&HostValue> {
        match self {
            Self::Record { fields, .. } => fields
                .iter()
                .find(|(field_name, _)| field_name == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

pub trait TypeRegistry {
    fn modules(&self) -> Result<Vec<ModuleId>, HostError>;
    fn module_name(&self, module: ModuleId) -> Result<String, HostError>;
    fn type_by_full_name(
        &self,
        module: ModuleId,
        full_name: &str,
    ) -> Result<Option<TypeHandle>, HostError>;
    /// Every type of the module. This is the expensive call.
    fn types_in(&self, module: ModuleId) -> Result<Vec<TypeHandle>, HostError>;
    fn short_name(&self, type_handle: TypeHandle) -> Result<String, HostError>;
    fn full_name(&self, type_handle: TypeHandle) -> Result<String, HostError>;
    fn nested_type(
        &self,
        owner: TypeHandle,
        name: &str,
    ) -> Result<Option<TypeHandle>, HostError>;
    fn member(
        &self,
        owner: TypeHandle,
        name: &str,
        kind: MemberKind,
        scope: MemberScope,
    ) -> Result<Option<MemberHandle>, HostError>;
    fn read_static(&self, member: MemberHandle) -> Result<HostValue, HostError>;
    fn invoke_static(&self, member: MemberHandle) -> Result<HostValue, HostError>;
    fn read_instance(
        &self,
        member: MemberHandle,
        target: &HostValue,
    ) -> Result<HostValue, HostError>;
}
