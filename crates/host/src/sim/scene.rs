use std::collections::BTreeMap;

use glam::Vec3;

use super::reflect::{HostValue, TypeRegistry};
use super::type_table::TypeTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Read/write surface of a live host simulation.
///
/// Object handles are non-owning. The host may destroy any object between two
/// calls, so every accessor tolerates a stale handle and reports it as `None`
/// or `false` instead of failing.
pub trait Simulation {
    fn environment_id(&self) -> Option<String>;
    fn is_alive(&self, id: ObjectId) -> bool;
    fn position(&self, id: ObjectId) -> Option<Vec3>;
    fn forward(&self, id: ObjectId) -> Option<Vec3>;
    fn set_position(&mut self, id: ObjectId, position: Vec3) -> bool;
    fn set_forward(&mut self, id: ObjectId, forward: Vec3) -> bool;
    fn root_of(&self, id: ObjectId) -> Option<ObjectId>;
    /// True when `id` is `ancestor` itself or sits anywhere below it.
    fn is_in_hierarchy_of(&self, id: ObjectId, ancestor: ObjectId) -> bool;
    fn main_camera(&self) -> Option<ObjectId>;
    fn registry(&self) -> &dyn TypeRegistry;
}

#[derive(Debug, Clone)]
pub struct HostObject {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    pub parent: Option<ObjectId>,
    pub attributes: BTreeMap<String, HostValue>,
}

#[derive(Debug, Default)]
struct ObjectIdAllocator {
    next: u64,
}

impl ObjectIdAllocator {
    fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// In-memory headless host. Holds a flat object list with parent links, the
/// environment label, the main camera, a roster of tracked characters and a
/// declarative type table answering [`TypeRegistry`] queries.
#[derive(Debug, Default)]
pub struct HostWorld {
    allocator: ObjectIdAllocator,
    objects: Vec<HostObject>,
    environment_id: Option<String>,
    main_camera: Option<ObjectId>,
    roster: Vec<ObjectId>,
    pub(super) types: TypeTable,
}

impl HostWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> ObjectId {
        self.spawn_internal(name.into(), transform, None)
    }

    pub fn spawn_child(
        &mut self,
        parent: ObjectId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Option<ObjectId> {
        if !self.is_alive(parent) {
            return None;
        }
        Some(self.spawn_internal(name.into(), transform, Some(parent)))
    }

    fn spawn_internal(
        &mut self,
        name: String,
        transform: Transform,
        parent: Option<ObjectId>,
    ) -> ObjectId {
        let id = self.allocator.allocate();
        self.objects.push(HostObject {
            id,
            name,
            transform,
            parent,
            attributes: BTreeMap::new(),
        });
        id
    }

    /// Destroys the object and everything parented below it. Handles held by
    /// callers become stale.
    pub fn despawn(&mut self, id: ObjectId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let doomed = self
            .objects
            .iter()
            .filter(|object| self.is_in_hierarchy_of(object.id, id))
            .map(|object| object.id)
            .collect::<Vec<_>>();
        self.objects.retain(|object| !doomed.contains(&object.id));
        if self.main_camera.is_some_and(|camera| doomed.contains(&camera)) {
            self.main_camera = None;
        }
        true
    }

    pub fn object(&self, id: ObjectId) -> Option<&HostObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut HostObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    pub fn objects(&self) -> &[HostObject] {
        &self.objects
    }

    pub fn set_attribute(
        &mut self,
        id: ObjectId,
        attribute: impl Into<String>,
        value: HostValue,
    ) -> bool {
        match self.object_mut(id) {
            Some(object) => {
                object.attributes.insert(attribute.into(), value);
                true
            }
            None => false,
        }
    }

    pub fn attribute(&self, id: ObjectId, attribute: &str) -> Option<&HostValue> {
        self.object(id)
            .and_then(|object| object.attributes.get(attribute))
    }

    pub fn set_environment_id(&mut self, environment_id: Option<String>) {
        self.environment_id = environment_id;
    }

    pub fn set_main_camera(&mut self, camera: Option<ObjectId>) {
        self.main_camera = camera;
    }

    pub fn set_roster(&mut self, roster: Vec<ObjectId>) {
        self.roster = roster;
    }

    pub fn push_roster(&mut self, id: ObjectId) {
        self.roster.push(id);
    }

    pub fn roster(&self) -> &[ObjectId] {
        &self.roster
    }
}

impl Simulation for HostWorld {
    fn environment_id(&self) -> Option<String> {
        self.environment_id.clone()
    }

    fn is_alive(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    fn position(&self, id: ObjectId) -> Option<Vec3> {
        self.object(id).map(|object| object.transform.position)
    }

    fn forward(&self, id: ObjectId) -> Option<Vec3> {
        self.object(id).map(|object| object.transform.forward)
    }

    fn set_position(&mut self, id: ObjectId, position: Vec3) -> bool {
        match self.object_mut(id) {
            Some(object) => {
                object.transform.position = position;
                true
            }
            None => false,
        }
    }

    fn set_forward(&mut self, id: ObjectId, forward: Vec3) -> bool {
        match self.object_mut(id) {
            Some(object) => {
                object.transform.forward = forward;
                true
            }
            None => false,
        }
    }

    fn root_of(&self, id: ObjectId) -> Option<ObjectId> {
        let mut current = self.object(id)?;
        while let Some(parent) = current.parent.and_then(|parent| self.object(parent)) {
            current = parent;
        }
        Some(current.id)
    }

    fn is_in_hierarchy_of(&self, id: ObjectId, ancestor: ObjectId) -> bool {
        let mut cursor = self.object(id);
        while let Some(object) = cursor {
            if object.id == ancestor {
                return true;
            }
            cursor = object.parent.and_then(|parent| self.object(parent));
        }
        false
    }

    fn main_camera(&self) -> Option<ObjectId> {
        self.main_camera.filter(|camera| self.is_alive(*camera))
    }

    fn registry(&self) -> &dyn TypeRegistry {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn despawn_removes_children_and_stales_handles() {
        let mut world = HostWorld::new();
        let root = world.spawn("player", Transform::default());
        let child = world.spawn_child(root, "camera", Transform::default()).expect("child");
        let other = world.spawn("enemy", Transform::default());

        assert!(world.despawn(root));

        assert!(!world.is_alive(root));
        assert!(!world.is_alive(child));
        assert!(world.is_alive(other));
        assert!(!world.despawn(root));
        assert_eq!(world.position(child), None);
        assert!(!world.set_position(child, Vec3::ONE));
    }

    #[test]
    fn root_and_hierarchy_follow_parent_links() {
        let mut world = HostWorld::new();
        let root = world.spawn("rig", Transform::default());
        let mid = world.spawn_child(root, "body", Transform::default()).expect("mid");
        let leaf = world.spawn_child(mid, "camera", Transform::default()).expect("leaf");
        let stranger = world.spawn("stranger", Transform::default());

        assert_eq!(world.root_of(leaf), Some(root));
        assert!(world.is_in_hierarchy_of(leaf, root));
        assert!(world.is_in_hierarchy_of(root, root));
        assert!(!world.is_in_hierarchy_of(root, leaf));
        assert!(!world.is_in_hierarchy_of(stranger, root));
    }

    #[test]
    fn main_camera_is_hidden_once_destroyed() {
        let mut world = HostWorld::new();
        let camera = world.spawn("camera", Transform::default());
        world.set_main_camera(Some(camera));
        assert_eq!(world.main_camera(), Some(camera));

        world.despawn(camera);
        assert_eq!(world.main_camera(), None);
    }

    #[test]
    fn ids_are_never_reused() {
        let mut world = HostWorld::new();
        let first = world.spawn("a", Transform::default());
        world.despawn(first);
        let second = world.spawn("b", Transform::default());
        assert_ne!(first, second);
    }
}
