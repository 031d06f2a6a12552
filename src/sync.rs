//! Cross instance grain scheduler synchronization.
//!
//! A grain synth with a non-zero sync id publishes its trigger pulses and scheduler phases into
//! a [`SyncTable`] in the context's [`SyncRegistry`] every block. [`GrainSyncReader`]s pick
//! them up from there, e.g. to hard sync other grain synths to the writer's grain clock.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use dashmap::DashMap;

// -------------------------------------------------------------------------------------------------

mod reader;

pub use reader::{GrainSyncReader, SyncReaderConfig};

// -------------------------------------------------------------------------------------------------

/// A two row table with one trigger pulse and one scheduler phase value per block sample.
///
/// Values are stored as relaxed atomics, so the table can be shared between instances
/// without locking. Write before read ordering within a block pass is up to the host.
#[derive(Debug)]
pub struct SyncTable {
    pulses: Box<[AtomicU32]>,
    phases: Box<[AtomicU32]>,
}

impl SyncTable {
    pub fn new(block_size: usize) -> Self {
        let row = || {
            (0..block_size)
                .map(|_| AtomicU32::new(0.0f32.to_bits()))
                .collect::<Box<[_]>>()
        };
        Self {
            pulses: row(),
            phases: row(),
        }
    }

    /// Number of samples in each row.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.pulses.len()
    }

    /// Trigger pulse at the given sample: 1.0 when a grain got triggered, else 0.0.
    pub fn pulse(&self, frame: usize) -> f32 {
        Self::load(&self.pulses, frame)
    }

    /// Writer's scheduler phase at the given sample.
    pub fn phase(&self, frame: usize) -> f32 {
        Self::load(&self.phases, frame)
    }

    /// Copy the pulse row into the given buffer.
    pub fn copy_pulses(&self, dest: &mut [f32]) {
        Self::copy_row(&self.pulses, dest);
    }

    /// Copy the phase row into the given buffer.
    pub fn copy_phases(&self, dest: &mut [f32]) {
        Self::copy_row(&self.phases, dest);
    }

    #[inline]
    pub(crate) fn set_pulse(&self, frame: usize, value: f32) {
        Self::store(&self.pulses, frame, value);
    }

    #[inline]
    pub(crate) fn set_phase(&self, frame: usize, value: f32) {
        Self::store(&self.phases, frame, value);
    }

    pub(crate) fn clear_pulses(&self) {
        for pulse in self.pulses.iter() {
            pulse.store(0.0f32.to_bits(), Ordering::Relaxed);
        }
    }

    #[inline]
    fn load(row: &[AtomicU32], frame: usize) -> f32 {
        row.get(frame)
            .map(|value| f32::from_bits(value.load(Ordering::Relaxed)))
            .unwrap_or(0.0)
    }

    #[inline]
    fn store(row: &[AtomicU32], frame: usize, value: f32) {
        if let Some(slot) = row.get(frame) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    fn copy_row(row: &[AtomicU32], dest: &mut [f32]) {
        for (dest, value) in dest.iter_mut().zip(row.iter()) {
            *dest = f32::from_bits(value.load(Ordering::Relaxed));
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Grow only map of sync tables, keyed by non-zero sync ids.
#[derive(Debug)]
pub struct SyncRegistry {
    entries: DashMap<u32, Arc<SyncTable>>,
    block_size: usize,
}

impl SyncRegistry {
    pub fn new(block_size: usize) -> Self {
        Self {
            entries: DashMap::new(),
            block_size,
        }
    }

    /// Get or create the sync table for the given id. The first registration creates the table,
    /// later ones share it. Id 0 disables syncing and returns `None`.
    pub fn register(&self, id: u32) -> Option<Arc<SyncTable>> {
        if id == 0 {
            return None;
        }
        let entry = self
            .entries
            .entry(id)
            .or_insert_with(|| Arc::new(SyncTable::new(self.block_size)));
        Some(entry.value().clone())
    }

    /// Find an already registered sync table.
    pub fn find(&self, id: u32) -> Option<Arc<SyncTable>> {
        self.entries.get(&id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -------------------------------------------------------------------------------------------------
