//! # Component Registry
//!
//! Owns one [`ComponentPool`] per component type, keyed by `TypeId`.
//! Pools are created lazily on first mutable use and live for the lifetime of
//! the registry. The type-erased view lets the world cascade an entity's
//! destruction to every pool without knowing the concrete types.

use std::any::{Any, TypeId};

use hashbrown::HashMap;

use super::component::Component;
use super::entity::Entity;
use super::storage::ComponentPool;

/// Type-erased operations every pool supports.
trait ErasedPool {
    /// Removes the row of `entity`, returning whether one existed.
    fn remove_entity(&mut self, entity: Entity) -> bool;
    /// Checks whether `entity` has a row.
    fn contains(&self, entity: Entity) -> bool;
    /// Number of stored rows.
    fn row_count(&self) -> usize;
    /// Component type name, for logs.
    fn component_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ErasedPool for ComponentPool<C> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_some()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.has(entity)
    }

    fn row_count(&self) -> usize {
        self.len()
    }

    fn component_name(&self) -> &'static str {
        C::component_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// All component pools of a world.
#[derive(Default)]
pub struct ComponentRegistry {
    pools: HashMap<TypeId, Box<dyn ErasedPool>>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pools created so far.
    #[inline]
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Returns the pool for `C` if it has been created.
    #[must_use]
    pub fn pool<C: Component>(&self) -> Option<&ComponentPool<C>> {
        self.pools
            .get(&TypeId::of::<C>())
            .and_then(|pool| pool.as_any().downcast_ref())
    }

    /// Returns the pool for `C`, creating it on first use.
    pub fn pool_mut<C: Component>(&mut self) -> &mut ComponentPool<C> {
        self.ensure::<C>();
        downcast_mut(self.pools.get_mut(&TypeId::of::<C>()))
    }

    /// Returns disjoint mutable access to the pools of `A` and `B`.
    ///
    /// # Panics
    ///
    /// Panics if `A` and `B` are the same component type.
    pub fn pool_pair_mut<A: Component, B: Component>(
        &mut self,
    ) -> (&mut ComponentPool<A>, &mut ComponentPool<B>) {
        let (a, b) = (TypeId::of::<A>(), TypeId::of::<B>());
        assert_ne!(
            a,
            b,
            "pool_pair_mut requires two distinct component types, got {} twice",
            A::component_name()
        );

        self.ensure::<A>();
        self.ensure::<B>();

        match self.pools.get_many_mut([&a, &b]) {
            Some([pool_a, pool_b]) => (
                downcast_mut(Some(pool_a)),
                downcast_mut(Some(pool_b)),
            ),
            None => unreachable!("both pools were just ensured"),
        }
    }

    /// Creates the pool for `C` if it does not exist yet.
    fn ensure<C: Component>(&mut self) {
        self.pools.entry(TypeId::of::<C>()).or_insert_with(|| {
            tracing::debug!(component = C::component_name(), "creating component pool");
            Box::new(ComponentPool::<C>::new())
        });
    }

    /// Checks whether `entity` has a `C` row. Never creates a pool.
    #[must_use]
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.pool::<C>().is_some_and(|pool| pool.has(entity))
    }

    /// Removes the row of `entity` from the pool identified by `component`.
    ///
    /// Unknown pools and absent rows are no-ops.
    pub fn remove_erased(&mut self, component: TypeId, entity: Entity) -> bool {
        self.pools
            .get_mut(&component)
            .is_some_and(|pool| pool.remove_entity(entity))
    }

    /// Removes the row of `entity` from every pool that has one.
    ///
    /// # Returns
    ///
    /// The number of rows removed.
    pub fn remove_all(&mut self, entity: Entity) -> usize {
        self.pools
            .values_mut()
            .map(|pool| usize::from(pool.remove_entity(entity)))
            .sum()
    }

    /// Names of the components `entity` currently holds, sorted.
    #[must_use]
    pub fn components_of(&self, entity: Entity) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .pools
            .values()
            .filter(|pool| pool.contains(entity))
            .map(|pool| pool.component_name())
            .collect();
        names.sort_unstable();
        names
    }

    /// Total number of rows across every pool.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.pools.values().map(|pool| pool.row_count()).sum()
    }
}

/// Recovers the concrete pool type from an erased pool known to hold `C`.
fn downcast_mut<C: Component>(pool: Option<&mut Box<dyn ErasedPool>>) -> &mut ComponentPool<C> {
    match pool.and_then(|pool| pool.as_any_mut().downcast_mut()) {
        Some(pool) => pool,
        None => unreachable!("pool for {} is missing or mistyped", C::component_name()),
    }
}
