//! Phase driven grain clock, which decides when grains start and sets them up.

use crate::{
    error::GrainError,
    grain::GrainPool,
    random::RandomSource,
    sync::SyncTable,
    synth::{BlockInputs, BlockTables, GrainControls, SynthTables},
    table::{FunctionTable, RotatingIndex},
    utils::permit_alloc,
};

// -------------------------------------------------------------------------------------------------

mod setup;

// -------------------------------------------------------------------------------------------------

/// Grain scheduling statistics of a single processed block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockStats {
    /// Number of grain clock triggers.
    pub triggers: usize,
    /// Number of grains which got started.
    pub started: usize,
    /// Number of grains which got muted by gain or random masks.
    pub masked: usize,
    /// Number of grains which got dropped because they were shorter than a sample.
    pub dropped: usize,
    /// Number of grains which got dropped because of an error, see `last_error`.
    pub errors: usize,
    /// Number of playing grains which got stopped to make room for new ones.
    pub evicted: usize,
    /// The last error which caused a grain to be dropped, if any.
    pub last_error: Option<GrainError>,
}

// -------------------------------------------------------------------------------------------------

/// Everything the scheduler reads within a block.
pub(crate) struct ScheduleContext<'a> {
    pub sample_rate: u32,
    pub block_len: usize,
    pub output_channels: usize,
    pub controls: &'a GrainControls,
    pub inputs: &'a BlockInputs<'a>,
    pub tables: &'a SynthTables,
    pub block_tables: &'a BlockTables,
}

// -------------------------------------------------------------------------------------------------

/// Grain clock state of a grain synth.
///
/// The clock is a phase accumulator which wraps at 1.0. On every wrap a new trigger phase gets
/// drawn from the distribution table, and a grain is triggered when the phase passes it.
#[derive(Debug, Clone)]
pub(crate) struct GrainScheduler {
    phase: f64,
    increment: f64,
    next_grain_phase: f64,
    prev_phase: f64,
    synced: bool,
    distribution_index: usize,
    gain_mask_index: RotatingIndex,
    channel_mask_index: RotatingIndex,
    sweep_start_index: RotatingIndex,
    sweep_end_index: RotatingIndex,
    fm_index_index: RotatingIndex,
    wave_gain_index: RotatingIndex,
    out_of_grains_warned: bool,
}

impl Default for GrainScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl GrainScheduler {
    pub fn new() -> Self {
        Self {
            // start with a wrap, so the first grain gets triggered immediately
            phase: 1.0,
            increment: 0.0,
            next_grain_phase: 0.0,
            prev_phase: 0.0,
            synced: false,
            distribution_index: 0,
            gain_mask_index: RotatingIndex::new(),
            channel_mask_index: RotatingIndex::new(),
            sweep_start_index: RotatingIndex::new(),
            sweep_end_index: RotatingIndex::new(),
            fm_index_index: RotatingIndex::new(),
            wave_gain_index: RotatingIndex::new(),
            out_of_grains_warned: false,
        }
    }

    /// True when the grain pool ran out of grains at least once.
    pub fn out_of_grains_warned(&self) -> bool {
        self.out_of_grains_warned
    }

    /// Run the grain clock for a block, starting new grains in the given pool and publishing
    /// trigger pulses and phases into the optional sync table.
    pub fn schedule_block(
        &mut self,
        context: &ScheduleContext,
        pool: &mut GrainPool,
        rng: &mut dyn RandomSource,
        sync: Option<&SyncTable>,
        stats: &mut BlockStats,
    ) {
        if let Some(sync) = sync {
            sync.clear_pulses();
        }
        let sample_rate = context.sample_rate as f64;
        for frame in 0..context.block_len {
            self.increment = (context.inputs.grain_rate.at(frame) as f64 / sample_rate).abs();

            let sync_value = context.inputs.sync.at(frame) as f64;
            if sync_value >= 1.0 {
                if !self.synced {
                    self.phase = 1.0;
                    self.synced = true;
                } else {
                    // hold the clock while the sync input stays high
                    self.increment = 0.0;
                }
            } else {
                if sync_value != 0.0 {
                    self.phase = (self.phase + sync_value).clamp(0.0, 1.0);
                }
                self.synced = false;
            }

            let mut wrapped = false;
            if self.phase >= 1.0 {
                self.next_grain_phase = self.next_grain_phase(
                    context.controls.distribution,
                    &context.tables.distribution,
                    rng,
                );
                self.phase = self.phase.fract();
                wrapped = true;
            }

            if self.phase >= self.next_grain_phase
                && (self.prev_phase < self.next_grain_phase || wrapped)
            {
                stats.triggers += 1;
                self.trigger(context, pool, rng, frame, stats);
                if let Some(sync) = sync {
                    sync.set_pulse(frame, 1.0);
                }
            }
            if let Some(sync) = sync {
                sync.set_phase(frame, self.phase as f32);
            }

            self.prev_phase = self.phase;
            self.phase += self.increment;
        }
    }

    /// Draw the trigger phase for the next grain period from the distribution table.
    fn next_grain_phase(
        &mut self,
        distribution: f32,
        table: &FunctionTable,
        rng: &mut dyn RandomSource,
    ) -> f64 {
        if distribution >= 0.0 {
            let offset = table.value(rng.next_index(table.len()));
            distribution as f64 * offset as f64
        } else {
            if self.distribution_index >= table.len() {
                self.distribution_index = 0;
            }
            let offset = table.value(self.distribution_index);
            self.distribution_index += 1;
            -distribution as f64 * offset as f64
        }
    }

    fn trigger(
        &mut self,
        context: &ScheduleContext,
        pool: &mut GrainPool,
        rng: &mut dyn RandomSource,
        frame: usize,
        stats: &mut BlockStats,
    ) {
        if pool.free_count() == 0 {
            if !self.out_of_grains_warned {
                permit_alloc(|| {
                    log::warn!("Maximum number of grains reached: stopping the oldest grains")
                });
                self.out_of_grains_warned = true;
            }
            let evicted = pool.evict_oldest();
            debug_assert!(evicted, "Evicting the oldest grain must free a slot");
            if evicted {
                stats.evicted += 1;
            }
        }
        let Some(handle) = pool.acquire() else {
            permit_alloc(|| log::error!("No free grain slot available: skipping grain"));
            stats.dropped += 1;
            return;
        };
        match self.setup_grain(context, pool.grain_mut(handle), rng, frame) {
            Ok(setup::GrainSetup::Started) => {
                pool.activate(handle);
                stats.started += 1;
            }
            Ok(setup::GrainSetup::Masked) => {
                pool.release(handle);
                stats.masked += 1;
            }
            Ok(setup::GrainSetup::TooShort) => {
                pool.release(handle);
                stats.dropped += 1;
            }
            Err(err) => {
                pool.release(handle);
                stats.errors += 1;
                stats.last_error = Some(err);
                permit_alloc(|| log::error!("Failed to start grain: {err}"));
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
