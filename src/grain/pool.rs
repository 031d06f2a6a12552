use super::Grain;
use crate::Error;

// -------------------------------------------------------------------------------------------------

/// Index of a grain slot within a [`GrainPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GrainHandle(usize);

// -------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
struct GrainSlot {
    grain: Grain,
    /// Link to the next slot in either the free or the active list.
    next: Option<usize>,
}

// -------------------------------------------------------------------------------------------------

/// Fixed size arena of grains, linked into a free list and an active list.
///
/// Both lists are intrusive, singly linked lists over slot indices, so every slot is in exactly
/// one of the two lists at any time. New active grains are inserted at the head of the active
/// list, so the list's tail always is the oldest grain.
///
/// Slots get allocated once in `new`: nothing here allocates afterwards.
pub(crate) struct GrainPool {
    slots: Box<[GrainSlot]>,
    free_head: Option<usize>,
    active_head: Option<usize>,
    free_count: usize,
}

impl GrainPool {
    /// Create a new pool with the given maximum number of concurrent grains.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity < 1 {
            return Err(Error::ParameterError(
                "Maximum number of grains needs to be non-zero and positive".to_string(),
            ));
        }
        let mut slots = vec![GrainSlot::default(); capacity].into_boxed_slice();
        for (index, slot) in slots.iter_mut().enumerate() {
            slot.next = if index + 1 < capacity {
                Some(index + 1)
            } else {
                None
            };
        }
        Ok(Self {
            slots,
            free_head: Some(0),
            active_head: None,
            free_count: capacity,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.capacity() - self.free_count
    }

    /// Take a slot from the free list. The slot is neither free nor active until it either
    /// gets activated or released again.
    pub fn acquire(&mut self) -> Option<GrainHandle> {
        let index = self.free_head?;
        self.free_head = self.slots[index].next.take();
        self.free_count -= 1;
        Some(GrainHandle(index))
    }

    /// Return an acquired, not yet activated slot to the free list.
    pub fn release(&mut self, handle: GrainHandle) {
        self.push_free(handle.0);
    }

    /// Insert an acquired slot at the head of the active list.
    pub fn activate(&mut self, handle: GrainHandle) {
        self.slots[handle.0].next = self.active_head;
        self.active_head = Some(handle.0);
    }

    #[inline]
    pub fn grain_mut(&mut self, handle: GrainHandle) -> &mut Grain {
        &mut self.slots[handle.0].grain
    }

    /// Forcibly free the oldest active grain (the active list's tail).
    /// Returns false when there are no active grains.
    pub fn evict_oldest(&mut self) -> bool {
        let Some(mut current) = self.active_head else {
            return false;
        };
        let mut previous = None;
        while let Some(next) = self.slots[current].next {
            previous = Some(current);
            current = next;
        }
        match previous {
            Some(previous) => self.slots[previous].next = None,
            None => self.active_head = None,
        }
        self.push_free(current);
        true
    }

    /// Visit all active grains, newest first. Grains for which `f` returns false are unlinked
    /// from the active list and returned to the free list.
    pub fn retain_active<F: FnMut(&mut Grain) -> bool>(&mut self, mut f: F) {
        let mut previous: Option<usize> = None;
        let mut current = self.active_head;
        while let Some(index) = current {
            let next = self.slots[index].next;
            if f(&mut self.slots[index].grain) {
                previous = Some(index);
            } else {
                match previous {
                    Some(previous) => self.slots[previous].next = next,
                    None => self.active_head = next,
                }
                self.push_free(index);
            }
            current = next;
        }
    }

    /// Iterate over all active grains, newest first.
    #[cfg(test)]
    pub fn active_grains(&self) -> impl Iterator<Item = &Grain> + '_ {
        let mut current = self.active_head;
        std::iter::from_fn(move || {
            let index = current?;
            current = self.slots[index].next;
            Some(&self.slots[index].grain)
        })
    }

    fn push_free(&mut self, index: usize) {
        self.slots[index].next = self.free_head;
        self.free_head = Some(index);
        self.free_count += 1;
        debug_assert!(self.free_count <= self.capacity(), "Slot was released twice");
    }
}

// -------------------------------------------------------------------------------------------------
