//! # Component Storage
//!
//! Dense component storage with an entity -> slot indirection table.
//!
//! The storage uses a sparse set strategy:
//! - Values live in a contiguous array, in insertion order
//! - A sparse table indexed by entity slot resolves the dense position
//! - Access is O(1) via the entity, iteration walks contiguous memory
//!
//! Structural changes (insert of a new row, remove) while iterating are not
//! possible through a single `&mut` borrow. Callers that must restructure
//! during a pass collect the entities first or defer the change through a
//! [`CommandBuffer`](crate::CommandBuffer).

use std::ops::{Index, IndexMut};

use super::component::Component;
use super::entity::Entity;
use crate::error::{EcsError, EcsResult};

/// Storage for a single component type.
///
/// This storage guarantees:
/// - At most one value per entity
/// - O(1) membership test and access
/// - Iteration in insertion order, preserved across removals
///
/// # Type Parameters
///
/// * `C` - The component type to store
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: ComponentPool<Position> = ComponentPool::new();
/// pool.set(entity, Position::new(1.0, 2.0));
/// pool[entity].x += 1.0;
/// ```
#[derive(Debug, Clone)]
pub struct ComponentPool<C> {
    /// Dense slot for each entity index, `None` when the index has no row.
    sparse: Vec<Option<usize>>,
    /// Owner of each dense row.
    entities: Vec<Entity>,
    /// The dense array of components.
    values: Vec<C>,
}

impl<C: Component> ComponentPool<C> {
    /// Creates an empty pool.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Number of stored rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the pool holds no rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dense slot of `entity`, if it has a row.
    #[inline]
    fn slot(&self, entity: Entity) -> Option<usize> {
        let slot = (*self.sparse.get(entity.index() as usize)?)?;
        // The index may be shared with a stale generation
        (self.entities[slot] == entity).then_some(slot)
    }

    /// Checks whether `entity` has a row in this pool.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.slot(entity).is_some()
    }

    /// Gets a component by entity.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&C> {
        self.slot(entity).map(|slot| &self.values[slot])
    }

    /// Gets a mutable component by entity.
    ///
    /// Writes through the returned reference are visible to every later read;
    /// there is no separate write-back step.
    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut C> {
        self.slot(entity).map(|slot| &mut self.values[slot])
    }

    /// Gets a component, reporting absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if `entity` has no row.
    pub fn try_get(&self, entity: Entity) -> EcsResult<&C> {
        self.get(entity).ok_or_else(|| missing::<C>(entity))
    }

    /// Gets a mutable component, reporting absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MissingComponent`] if `entity` has no row.
    pub fn try_get_mut(&mut self, entity: Entity) -> EcsResult<&mut C> {
        self.get_mut(entity).ok_or_else(|| missing::<C>(entity))
    }

    /// Inserts or overwrites the component of `entity`.
    ///
    /// Always a whole-value replacement. A row left behind by an older
    /// generation of the same slot is dropped first.
    ///
    /// # Returns
    ///
    /// The previous value, if the entity already had one.
    pub fn set(&mut self, entity: Entity, component: C) -> Option<C> {
        if let Some(slot) = self.slot(entity) {
            return Some(std::mem::replace(&mut self.values[slot], component));
        }

        let idx = entity.index() as usize;
        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }
        if let Some(stale) = self.sparse[idx] {
            self.remove_slot(stale);
        }

        self.sparse[idx] = Some(self.values.len());
        self.entities.push(entity);
        self.values.push(component);
        None
    }

    /// Removes the component of `entity`.
    ///
    /// Removing an absent row is a no-op. Removal is O(n) in the number of
    /// rows stored after the removed one: they shift down one slot to keep
    /// insertion order, and their sparse entries are rewritten.
    ///
    /// # Returns
    ///
    /// The removed value, if there was one.
    pub fn remove(&mut self, entity: Entity) -> Option<C> {
        let slot = self.slot(entity)?;
        Some(self.remove_slot(slot))
    }

    /// Removes a dense row, keeping the remaining rows in insertion order.
    fn remove_slot(&mut self, slot: usize) -> C {
        let owner = self.entities.remove(slot);
        let value = self.values.remove(slot);
        self.sparse[owner.index() as usize] = None;

        // Every row after `slot` moved down by one
        for (offset, moved) in self.entities[slot..].iter().enumerate() {
            self.sparse[moved.index() as usize] = Some(slot + offset);
        }

        value
    }

    /// Entities holding this component, in insertion order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Returns a slice of all components, in insertion order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[C] {
        &self.values
    }

    /// Iterates over all components with their entities.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &C)> {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Iterates mutably over all components with their entities.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut C)> {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Visits every row in insertion order.
    pub fn for_each<F>(&mut self, mut visit: F)
    where
        F: FnMut(Entity, &mut C),
    {
        for (entity, component) in self.iter_mut() {
            visit(entity, component);
        }
    }

    /// Drops every row.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.entities.clear();
        self.values.clear();
    }
}

impl<C: Component> Default for ComponentPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Component> Index<Entity> for ComponentPool<C> {
    type Output = C;

    /// # Panics
    ///
    /// Panics if `entity` has no row. Guard with [`ComponentPool::has`].
    fn index(&self, entity: Entity) -> &C {
        match self.get(entity) {
            Some(component) => component,
            None => panic!("{}", missing::<C>(entity)),
        }
    }
}

impl<C: Component> IndexMut<Entity> for ComponentPool<C> {
    /// # Panics
    ///
    /// Panics if `entity` has no row. Guard with [`ComponentPool::has`].
    fn index_mut(&mut self, entity: Entity) -> &mut C {
        let Some(slot) = self.slot(entity) else {
            panic!("{}", missing::<C>(entity));
        };
        &mut self.values[slot]
    }
}

fn missing<C: Component>(entity: Entity) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: C::component_name(),
    }
}
