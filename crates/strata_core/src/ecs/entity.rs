//! # Entity Management
//!
//! Entities are opaque identifiers consisting of:
//! - A slot index shared by every component pool
//! - A generation counter for safe slot reuse
//!
//! Generations start at 1, so the raw value 0 never names a live entity and
//! serves as the "no entity" sentinel.

use std::fmt;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Slot index
/// - Upper 32 bits: Generation counter for detecting stale references
///
/// Equality is by value alone. A destroyed entity's slot may be reused, but
/// the reused id carries a different generation and never compares equal to
/// the old one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// The reserved "no entity" id. Also `Entity::default()`.
    pub const NULL: Self = Self(0);

    /// Creates an entity ID from index and generation.
    ///
    /// # Arguments
    ///
    /// * `index` - The slot index (0 to 2^32-1)
    /// * `generation` - The generation counter (live entities use 1 to 2^32-1)
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the slot index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this is the "no entity" sentinel.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns the packed representation.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuilds an entity from its packed representation.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("null")
        } else {
            write!(f, "{}#{}", self.index(), self.generation())
        }
    }
}

/// Slot bookkeeping for entity allocation.
///
/// Tracks the current generation of every slot ever handed out, whether the
/// slot is live, and a free list of destroyed slots awaiting reuse.
#[derive(Debug, Default)]
pub(crate) struct EntityAllocator {
    /// Current generation of each slot.
    generations: Vec<u32>,
    /// Liveness of each slot.
    alive: Vec<bool>,
    /// Destroyed slot indices available for reuse (LIFO).
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
}

impl EntityAllocator {
    /// Creates an allocator with room for `capacity` slots before reallocating.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: Vec::with_capacity(capacity),
            alive: Vec::with_capacity(capacity),
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocates a fresh entity, reusing a destroyed slot when one exists.
    ///
    /// # Panics
    ///
    /// Panics if all 2^32 slot indices are in use.
    pub(crate) fn allocate(&mut self) -> Entity {
        if let Some(index) = self.free_indices.pop() {
            let idx = index as usize;
            // Bump the generation so ids handed out for the old occupant go stale
            let generation = next_generation(self.generations[idx]);
            self.generations[idx] = generation;
            self.alive[idx] = true;
            self.alive_count += 1;
            return Entity::new(index, generation);
        }

        let index = u32::try_from(self.generations.len())
            .unwrap_or_else(|_| panic!("entity index space exhausted"));
        self.generations.push(1);
        self.alive.push(true);
        self.alive_count += 1;
        Entity::new(index, 1)
    }

    /// Frees an entity's slot.
    ///
    /// Returns `false` if the entity was already dead, stale or null.
    pub(crate) fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        self.alive[entity.index() as usize] = false;
        self.free_indices.push(entity.index());
        self.alive_count -= 1;
        true
    }

    /// Checks whether `entity` is live (not null, not destroyed, not stale).
    #[inline]
    pub(crate) fn is_alive(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }

        let idx = entity.index() as usize;
        idx < self.alive.len()
            && self.alive[idx]
            && self.generations[idx] == entity.generation()
    }

    /// Number of live entities.
    #[inline]
    pub(crate) const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Live entities in ascending slot order.
    pub(crate) fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter(|(_, (alive, _))| **alive)
            // Slot count never exceeds u32::MAX + 1, see `allocate`
            .map(|(idx, (_, generation))| Entity::new(idx as u32, *generation))
    }
}

/// Generation that follows `generation`, skipping 0 on wrap-around.
#[inline]
const fn next_generation(generation: u32) -> u32 {
    if generation == u32::MAX {
        1
    } else {
        generation + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_roundtrip() {
        let id = Entity::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert_eq!(Entity::from_bits(id.to_bits()), id);
    }

    #[test]
    fn test_null_is_default() {
        assert_eq!(Entity::default(), Entity::NULL);
        assert!(Entity::NULL.is_null());
        assert!(!Entity::new(0, 1).is_null());
        assert_eq!(Entity::NULL.to_string(), "null");
        assert_eq!(Entity::new(3, 2).to_string(), "3#2");
    }

    #[test]
    fn test_allocate_never_returns_null() {
        let mut allocator = EntityAllocator::default();
        let first = allocator.allocate();
        assert!(!first.is_null());
        assert_eq!(first.index(), 0);
        assert_eq!(first.generation(), 1);
    }

    #[test]
    fn test_free_and_reuse_bumps_generation() {
        let mut allocator = EntityAllocator::with_capacity(4);

        let a = allocator.allocate();
        let b = allocator.allocate();
        assert_eq!(allocator.alive_count(), 2);

        assert!(allocator.free(a));
        assert!(!allocator.is_alive(a));
        assert!(!allocator.free(a));
        assert_eq!(allocator.alive_count(), 1);

        let c = allocator.allocate();
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(allocator.is_alive(c));
        assert!(allocator.is_alive(b));
        assert!(!allocator.is_alive(a));
    }

    #[test]
    fn test_iter_alive_in_slot_order() {
        let mut allocator = EntityAllocator::default();
        let ids: Vec<_> = (0..5).map(|_| allocator.allocate()).collect();
        allocator.free(ids[1]);
        allocator.free(ids[3]);

        let alive: Vec<_> = allocator.iter_alive().collect();
        assert_eq!(alive, vec![ids[0], ids[2], ids[4]]);
    }

    #[test]
    fn test_generation_wraps_past_zero() {
        assert_eq!(next_generation(u32::MAX), 1);
        assert_eq!(next_generation(7), 8);
    }
}
