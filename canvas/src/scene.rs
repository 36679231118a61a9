//! Scene graph seam.
//!
//! The drawing toolkit that owns the live objects is an external
//! collaborator; the sync core talks to it through [`SceneGraph`]. Every
//! mutation through the trait raises a [`SceneEvent`], regardless of who
//! caused it, the same way a canvas toolkit fires `object:added` for both
//! user and programmatic adds. Telling the two apart is the job of
//! [`crate::echo::EchoGuard`].
//!
//! [`SceneStore`] is the in-memory implementation used by the headless
//! client and the tests.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use crate::object::{Bounds, ObjectId, SyncedObject};

/// Change notification raised by the scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    Added(ObjectId),
    Modified(ObjectId),
    Removed(ObjectId),
    /// A multi-object selection was transformed as one unit.
    SelectionModified(Vec<ObjectId>),
}

/// Mutation API the sync core needs from a scene.
pub trait SceneGraph {
    fn get(&self, id: &str) -> Option<&SyncedObject>;

    /// Insert `object` under its id, replacing any object with the same id.
    fn insert(&mut self, object: SyncedObject);

    /// Copy `source`'s attributes onto the object `id` in place.
    /// Returns false when `id` is absent.
    fn update(&mut self, id: &str, source: SyncedObject) -> bool;

    fn remove(&mut self, id: &str) -> Option<SyncedObject>;

    /// Whether the local user is currently manipulating `id`.
    fn is_actively_edited(&self, id: &str) -> bool;

    /// Drain change notifications raised since the last call.
    fn take_events(&mut self) -> Vec<SceneEvent>;

    /// All objects in stacking order.
    fn objects(&self) -> Vec<&SyncedObject>;
}

// =============================================================================
// IN-MEMORY SCENE
// =============================================================================

#[derive(Debug)]
struct Entry {
    object: SyncedObject,
    bounds: Bounds,
}

impl Entry {
    fn new(object: SyncedObject) -> Self {
        let bounds = object.bounds();
        Self { object, bounds }
    }
}

#[derive(Debug, Default)]
pub struct SceneStore {
    entries: HashMap<ObjectId, Entry>,
    order: Vec<ObjectId>,
    selection: Vec<ObjectId>,
    events: Vec<SceneEvent>,
}

impl SceneStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object drawn by the local user; assigns a durable id if needed.
    pub fn add_local(&mut self, mut object: SyncedObject) -> ObjectId {
        let id = object.ensure_id().to_owned();
        self.insert(object);
        id
    }

    /// Edit one object in place. Returns false when `id` is absent.
    pub fn modify_local(&mut self, id: &str, edit: impl FnOnce(&mut SyncedObject)) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        edit(&mut entry.object);
        entry.bounds = entry.object.bounds();
        self.events.push(SceneEvent::Modified(id.to_owned()));
        true
    }

    /// Make `ids` the interactive selection. Unknown ids are skipped.
    pub fn select(&mut self, ids: &[&str]) {
        self.selection = ids
            .iter()
            .filter(|id| self.entries.contains_key(**id))
            .map(|id| (*id).to_owned())
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn selection(&self) -> &[ObjectId] {
        &self.selection
    }

    /// Apply `edit` to every selected object as one gesture.
    pub fn transform_selection(&mut self, mut edit: impl FnMut(&mut SyncedObject)) {
        for id in &self.selection {
            if let Some(entry) = self.entries.get_mut(id) {
                edit(&mut entry.object);
                entry.bounds = entry.object.bounds();
            }
        }
        match self.selection.as_slice() {
            [] => {}
            [single] => self.events.push(SceneEvent::Modified(single.clone())),
            many => self.events.push(SceneEvent::SelectionModified(many.to_vec())),
        }
    }

    /// Cached world bounds, refreshed on every mutation.
    #[must_use]
    pub fn bounds(&self, id: &str) -> Option<Bounds> {
        self.entries.get(id).map(|entry| entry.bounds)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SceneGraph for SceneStore {
    fn get(&self, id: &str) -> Option<&SyncedObject> {
        self.entries.get(id).map(|entry| &entry.object)
    }

    fn insert(&mut self, object: SyncedObject) {
        let id = object.id.clone();
        if self.entries.insert(id.clone(), Entry::new(object)).is_none() {
            self.order.push(id.clone());
        }
        self.events.push(SceneEvent::Added(id));
    }

    fn update(&mut self, id: &str, source: SyncedObject) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        entry.object.assign_from(source);
        entry.bounds = entry.object.bounds();
        self.events.push(SceneEvent::Modified(id.to_owned()));
        true
    }

    fn remove(&mut self, id: &str) -> Option<SyncedObject> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|existing| existing != id);
        self.selection.retain(|existing| existing != id);
        self.events.push(SceneEvent::Removed(id.to_owned()));
        Some(entry.object)
    }

    fn is_actively_edited(&self, id: &str) -> bool {
        self.selection.iter().any(|selected| selected == id)
    }

    fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    fn objects(&self) -> Vec<&SyncedObject> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| &entry.object))
            .collect()
    }
}
