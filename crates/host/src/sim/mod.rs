mod reflect;
mod scene;
mod type_table;

pub use glam::Vec3;
pub use reflect::{
    HostValue, MemberHandle, MemberKind, MemberScope, ModuleId, TypeHandle, TypeRegistry,
};
pub use scene::{HostObject, HostWorld, ObjectId, Simulation, Transform};
pub use type_table::{MemberDef, MemberSource};
