use std::collections::{BTreeMap, HashMap};

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::core::component::{Component, ComponentData, ComponentKind};

/// Opaque entity identifier, unique within one [`EntityRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id (v4 UUID).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// An identity plus at most one component per kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    components: BTreeMap<ComponentKind, Component>,
}

impl Entity {
    fn new(id: EntityId) -> Self {
        Self {
            id,
            components: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Attach a component, returning the one of the same kind it replaced.
    pub fn insert(&mut self, component: impl Into<Component>) -> Option<Component> {
        let component = component.into();
        let kind = component.kind();
        debug!(entity = %self.id, %kind, "component added");
        self.components.insert(kind, component)
    }

    /// Builder-style [`Entity::insert`].
    pub fn with(&mut self, component: impl Into<Component>) -> &mut Self {
        self.insert(component);
        self
    }

    /// Detach the component of `kind`. No-op when absent.
    pub fn remove(&mut self, kind: ComponentKind) -> Option<Component> {
        let removed = self.components.remove(&kind);
        if removed.is_some() {
            debug!(entity = %self.id, %kind, "component removed");
        }
        removed
    }

    pub fn has(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    pub fn has_all(&self, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|kind| self.has(*kind))
    }

    pub fn get<C: ComponentData>(&self) -> Option<&C> {
        self.components.get(&C::KIND).and_then(C::from_component)
    }

    pub fn get_mut<C: ComponentData>(&mut self) -> Option<&mut C> {
        self.components.get_mut(&C::KIND).and_then(C::from_component_mut)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }
}

// Serialized as `{"id": ..., "components": [...]}` so snapshots read naturally.
impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let components: Vec<&Component> = self.components.values().collect();
        let mut state = serializer.serialize_struct("Entity", 2)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("components", &components)?;
        state.end()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("entity id '{0}' is already registered")]
    DuplicateId(EntityId),
}

/// Owns every entity in the world.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<EntityId, Entity>,
    // Insertion order, so iteration (and therefore rendering) is stable.
    order: Vec<EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity. A random id is generated when `id` is `None`.
    pub fn create(&mut self, id: Option<EntityId>) -> Result<&mut Entity, RegistryError> {
        let id = id.unwrap_or_else(EntityId::generate);
        if self.entities.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        debug!(entity = %id, "entity created");
        self.order.push(id.clone());
        Ok(self.entities.entry(id.clone()).or_insert_with(|| Entity::new(id)))
    }

    /// Drop an entity and all of its components. No-op when absent.
    pub fn remove(&mut self, id: &EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id)?;
        self.order.retain(|existing| existing != id);
        debug!(entity = %id, "entity removed");
        Some(removed)
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// All entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Entities whose component kinds are a superset of `kinds`.
    pub fn query(&self, kinds: &[ComponentKind]) -> Vec<&Entity> {
        self.iter().filter(|entity| entity.has_all(kinds)).collect()
    }

    /// Mutable [`EntityRegistry::query`]. Order is unspecified.
    pub fn query_mut(&mut self, kinds: &[ComponentKind]) -> Vec<&mut Entity> {
        self.entities
            .values_mut()
            .filter(|entity| entity.has_all(kinds))
            .collect()
    }
}
