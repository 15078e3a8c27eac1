//! Generational slab backing every pooled node and diagram.
//!
//! Slots are recycled through an intrusive free list. Every slot carries a
//! generation counter that is bumped on [`Arena::free`], and every [`Handle`]
//! remembers the generation it was issued with. A handle whose generation no
//! longer matches its slot is *stale*: lookups and frees through it fail with
//! [`MddError::StaleHandle`] instead of silently touching a reused object.
//!
//! Slot 0 is a permanently occupied sentry, so index 0 doubles as the
//! "end of free list" marker.

use std::fmt::{Display, Formatter};

use crate::error::{MddError, Result};

/// Objects that can live in an [`Arena`].
///
/// `prepare` is called on every allocation, for fresh and for recycled slots
/// alike. It must wipe all variant-specific state so that a recycled object is
/// indistinguishable from a never-used one.
pub trait Recycle: Default {
    type Kind: Copy;

    fn prepare(&mut self, kind: Self::Kind);
}

/// Identity of a pooled object: slot index plus the slot generation at the
/// time of allocation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    /// Return the slot index.
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Return the generation this handle was issued with.
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.index)?;
        if self.generation > 0 {
            write!(f, "'{}", self.generation)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Entry<T> {
    value: T,
    generation: u32,
    occupied: bool,
    /// Next free slot (0 = none). Meaningful only while the slot is free.
    next_free: usize,
}

#[derive(Debug)]
pub struct Arena<T> {
    data: Vec<Entry<T>>,
    /// Head of the free list (0 = empty).
    free_head: usize,
    /// Number of occupied cells, not counting the sentry.
    real_size: usize,
}

impl<T> Arena<T>
where
    T: Recycle,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an arena with room for `capacity` objects before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut data = Vec::with_capacity(capacity + 1);
        data.push(Entry {
            occupied: true, // 0th cell is the sentry
            ..Entry::default()
        });
        Self {
            data,
            free_head: 0,
            real_size: 0,
        }
    }

    /// Allocate an object of the given kind, reusing a freed slot if any.
    pub fn allocate(&mut self, kind: T::Kind) -> Handle {
        let index = if self.free_head != 0 {
            let index = self.free_head;
            self.free_head = self.data[index].next_free;
            index
        } else {
            self.data.push(Entry::default());
            self.data.len() - 1
        };
        assert!(index <= u32::MAX as usize, "Arena is full");

        let entry = &mut self.data[index];
        debug_assert!(!entry.occupied);
        entry.value.prepare(kind);
        entry.occupied = true;
        entry.next_free = 0;
        self.real_size += 1;

        Handle {
            index: index as u32,
            generation: entry.generation,
        }
    }

    /// Return the slot behind `handle` to the free list.
    ///
    /// Freeing the same handle twice is reported as [`MddError::StaleHandle`].
    pub fn free(&mut self, handle: Handle) -> Result<()> {
        self.check(handle)?;
        let index = handle.index();
        let entry = &mut self.data[index];
        entry.occupied = false;
        entry.generation = entry.generation.wrapping_add(1);
        entry.next_free = self.free_head;
        self.free_head = index;
        self.real_size -= 1;
        Ok(())
    }
}

impl<T> Default for Arena<T>
where
    T: Recycle,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.real_size
    }

    pub fn is_empty(&self) -> bool {
        self.real_size == 0
    }

    /// Number of slots ever created (live or free), not counting the sentry.
    pub fn slots(&self) -> usize {
        self.data.len() - 1
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.check(handle).is_ok()
    }

    fn check(&self, handle: Handle) -> Result<()> {
        let index = handle.index();
        match self.data.get(index) {
            Some(entry)
                if index != 0 && entry.occupied && entry.generation == handle.generation =>
            {
                Ok(())
            }
            _ => Err(MddError::StaleHandle(handle)),
        }
    }

    pub fn get(&self, handle: Handle) -> Result<&T> {
        self.check(handle)?;
        Ok(&self.data[handle.index()].value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut T> {
        self.check(handle)?;
        Ok(&mut self.data[handle.index()].value)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[derive(Debug, Default)]
    struct Item {
        kind: u8,
        payload: Vec<i32>,
    }

    impl Recycle for Item {
        type Kind = u8;

        fn prepare(&mut self, kind: u8) {
            self.kind = kind;
            self.payload.clear();
        }
    }

    #[test]
    fn test_allocate() {
        let mut arena = Arena::<Item>::new();
        let a = arena.allocate(1);
        let b = arena.allocate(2);
        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(b).unwrap().kind, 2);
    }

    #[test]
    fn test_free_reuses_slot() {
        let mut arena = Arena::<Item>::new();
        let a = arena.allocate(1);
        let _b = arena.allocate(1);
        arena.free(a).unwrap();
        assert_eq!(arena.len(), 1);

        let c = arena.allocate(3);
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_eq!(arena.slots(), 2);
    }

    #[test]
    fn test_recycled_slot_is_reset() {
        let mut arena = Arena::<Item>::new();
        let a = arena.allocate(1);
        arena.get_mut(a).unwrap().payload.extend([1, 2, 3]);
        arena.free(a).unwrap();

        let b = arena.allocate(7);
        let item = arena.get(b).unwrap();
        assert_eq!(item.kind, 7);
        assert!(item.payload.is_empty());
    }

    #[test]
    fn test_double_free() {
        let mut arena = Arena::<Item>::new();
        let a = arena.allocate(1);
        arena.free(a).unwrap();
        assert_eq!(arena.free(a), Err(MddError::StaleHandle(a)));
    }

    #[test]
    fn test_use_after_free() {
        let mut arena = Arena::<Item>::new();
        let a = arena.allocate(1);
        arena.free(a).unwrap();
        let _b = arena.allocate(1);
        assert!(arena.get(a).is_err());
        assert!(arena.get_mut(a).is_err());
        assert!(!arena.contains(a));
    }

    #[test]
    fn test_free_list_is_lifo() {
        let mut arena = Arena::<Item>::new();
        let a = arena.allocate(0);
        let b = arena.allocate(0);
        arena.free(a).unwrap();
        arena.free(b).unwrap();
        assert_eq!(arena.allocate(0).index(), b.index());
        assert_eq!(arena.allocate(0).index(), a.index());
        assert_eq!(arena.allocate(0).index(), 3);
    }
}
