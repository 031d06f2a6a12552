//! The grain synth: schedules, renders and mixes grains block by block.

use std::sync::Arc;

use crate::{
    grain::GrainPool,
    random::{default_random_source, RandomSource},
    renderer::{render_grain, RenderContext},
    scheduler::{BlockStats, GrainScheduler, ScheduleContext},
    sync::SyncTable,
    utils::{assert_no_alloc, buffer::planar_to_interleaved},
    Error, GrainContext,
};

// -------------------------------------------------------------------------------------------------

mod config;
mod controls;
mod inputs;
mod tables;

pub use config::GrainSynthConfig;
pub use controls::GrainControls;
pub use inputs::{BlockInputs, Signal};

pub(crate) use tables::{BlockTables, SynthTables};

// -------------------------------------------------------------------------------------------------

/// A granular synthesizer instance with up to four wavetable oscillators and one trainlet
/// oscillator per grain.
///
/// All buffers and grain slots get allocated in `new`: processing blocks is real-time safe.
pub struct GrainSynth {
    context: GrainContext,
    output_channels: usize,
    sync_id: u32,
    tables: SynthTables,
    block_tables: BlockTables,
    scheduler: GrainScheduler,
    pool: GrainPool,
    rng: Box<dyn RandomSource>,
    sync: Option<Arc<SyncTable>>,
    scratch: Vec<f32>,
    outputs: Vec<Vec<f32>>,
}

impl GrainSynth {
    /// Create a new grain synth with a random source that gets seeded from the OS.
    pub fn new(context: &GrainContext, config: &GrainSynthConfig) -> Result<Self, Error> {
        Self::with_random_source(context, config, default_random_source())
    }

    /// Create a new grain synth which uses the given random source for distribution and random
    /// mask draws, e.g. a seeded rng for reproducible renderings.
    pub fn with_random_source(
        context: &GrainContext,
        config: &GrainSynthConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, Error> {
        config.validate()?;
        let tables = SynthTables::resolve(context, config)?;
        let pool = GrainPool::new(config.max_grains)?;
        let sync = context.sync_registry().register(config.sync_id);
        let block_size = context.block_size();
        log::debug!(
            "Creating new grain synth with {} grains, {} outputs and sync id {}",
            config.max_grains,
            config.output_channels,
            config.sync_id
        );
        Ok(Self {
            context: context.clone(),
            output_channels: config.output_channels,
            sync_id: config.sync_id,
            tables,
            block_tables: BlockTables::default(),
            scheduler: GrainScheduler::new(),
            pool,
            rng,
            sync,
            scratch: vec![0.0; block_size],
            outputs: vec![vec![0.0; block_size]; config.output_channels],
        })
    }

    /// Process a single block of `context.block_size()` frames: schedule new grains, then
    /// render all playing grains into the cleared output buffers.
    ///
    /// Errors of single grains don't fail the block: they are logged and reported in the
    /// returned stats. Errors are returned for invalid controls or inputs only, in which case
    /// nothing gets processed.
    pub fn process(
        &mut self,
        controls: &GrainControls,
        inputs: &BlockInputs,
    ) -> Result<BlockStats, Error> {
        let block_len = self.context.block_size();
        controls.validate()?;
        inputs.validate(block_len)?;
        self.block_tables.resolve(&self.context, controls);

        let stats = assert_no_alloc(|| {
            let mut stats = BlockStats::default();
            let schedule_context = ScheduleContext {
                sample_rate: self.context.sample_rate(),
                block_len,
                output_channels: self.output_channels,
                controls,
                inputs,
                tables: &self.tables,
                block_tables: &self.block_tables,
            };
            self.scheduler.schedule_block(
                &schedule_context,
                &mut self.pool,
                self.rng.as_mut(),
                self.sync.as_deref(),
                &mut stats,
            );

            for output in self.outputs.iter_mut() {
                output.fill(0.0);
            }
            let render_context = RenderContext {
                block_len,
                attack: &self.tables.attack,
                decay: &self.tables.decay,
                secondary: &self.tables.secondary,
                cosine: &self.tables.cosine,
                fm: inputs.fm,
            };
            let scratch = &mut self.scratch;
            let outputs = &mut self.outputs;
            self.pool.process_active(block_len, |grain| {
                render_grain(grain, &render_context, scratch, outputs)
            });
            stats
        });
        Ok(stats)
    }

    /// The context this synth got created with.
    pub fn context(&self) -> &GrainContext {
        &self.context
    }

    /// Sync id the synth publishes its grain clock with. 0 when syncing is disabled.
    pub fn sync_id(&self) -> u32 {
        self.sync_id
    }

    /// Planar output buffers of the last processed block.
    pub fn outputs(&self) -> &[Vec<f32>] {
        &self.outputs
    }

    /// Output buffer of the given channel of the last processed block.
    pub fn output(&self, channel: usize) -> Option<&[f32]> {
        self.outputs.get(channel).map(|output| output.as_slice())
    }

    /// Copy the last processed block into an interleaved buffer.
    pub fn copy_interleaved(&self, interleaved: &mut [f32]) {
        planar_to_interleaved(&self.outputs, interleaved);
    }

    /// Maximum number of concurrently playing grains.
    pub fn max_grains(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of currently playing grains.
    pub fn active_grains(&self) -> usize {
        self.pool.active_count()
    }

    /// Number of currently unused grain slots.
    pub fn free_grains(&self) -> usize {
        self.pool.free_count()
    }

    /// True when the synth ran out of grains at least once and had to stop playing grains.
    pub fn out_of_grains_warned(&self) -> bool {
        self.scheduler.out_of_grains_warned()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use four_cc::FourCC;
    use rand::{rngs::SmallRng, SeedableRng};

    use super::*;
    use crate::{
        grain::WaveSlot,
        table::{FunctionTable, TableId, TableRegistry},
        GrainSyncReader, SyncReaderConfig,
    };

    const COSINE: TableId = TableId(1);
    const SINE: TableId = TableId(2);
    const ONES: TableId = TableId(3);
    const ATTACK: TableId = TableId(4);
    const DECAY: TableId = TableId(5);
    const CHANNEL_MASKS: TableId = TableId(6);
    const WAVE_GAINS: TableId = TableId(7);
    const TRAINLET_GAINS: TableId = TableId(8);
    const RAMP: TableId = TableId(9);
    const HALF: TableId = TableId(10);
    const DOUBLE: TableId = TableId(11);
    const UNITY: TableId = TableId(12);

    fn context(sample_rate: u32, block_size: usize) -> Result<GrainContext, Box<Error>> {
        let registry = TableRegistry::new()
            .with_table(COSINE, FunctionTable::cosine(4096)?)
            .with_table(SINE, FunctionTable::sine(1024)?)
            .with_table(ONES, FunctionTable::new(vec![1.0; 16])?)
            .with_table(ATTACK, FunctionTable::with_extended_guard(vec![0.1, 0.5, 1.0])?)
            .with_table(DECAY, FunctionTable::with_extended_guard(vec![1.0, 0.5, 0.0])?)
            .with_table(
                CHANNEL_MASKS,
                FunctionTable::with_extended_guard(vec![0.0, 0.0, 2.5])?,
            )
            .with_table(
                WAVE_GAINS,
                FunctionTable::with_extended_guard(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0])?,
            )
            .with_table(
                TRAINLET_GAINS,
                FunctionTable::with_extended_guard(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0])?,
            )
            .with_table(RAMP, FunctionTable::with_extended_guard(vec![0.0, 1.0])?)
            // single row rotating index tables
            .with_table(HALF, FunctionTable::with_extended_guard(vec![0.0, 0.0, 0.5])?)
            .with_table(DOUBLE, FunctionTable::with_extended_guard(vec![0.0, 0.0, 2.0])?)
            .with_table(UNITY, FunctionTable::with_extended_guard(vec![0.0, 0.0, 1.0])?);
        Ok(GrainContext::new(sample_rate, block_size, Arc::new(registry))?)
    }

    fn seeded_synth(
        context: &GrainContext,
        config: &GrainSynthConfig,
    ) -> Result<GrainSynth, Box<Error>> {
        Ok(GrainSynth::with_random_source(
            context,
            config,
            Box::new(SmallRng::seed_from_u64(0x1234)),
        )?)
    }

    /// Render a single 100 samples long sine grain at 1 kHz into a mono output.
    fn render_sine(
        config: GrainSynthConfig,
        wave_frequency: f32,
        fm_envelope: Option<TableId>,
        inputs: &BlockInputs,
    ) -> Result<Vec<f32>, Box<Error>> {
        let context = context(1000, 100)?;
        let config = config.wave_gains(WAVE_GAINS).output_channels(1);
        let mut synth = seeded_synth(&context, &config)?;
        let mut controls = GrainControls::default();
        controls.waveforms[0] = Some(SINE);
        controls.duration = 100.0;
        controls.wave_frequency = wave_frequency;
        controls.fm_envelope = fm_envelope;
        let stats = synth.process(&controls, inputs)?;
        assert_eq!(stats.started, 1);
        Ok(synth.output(0).unwrap().to_vec())
    }

    /// Expected sine grain output for the given start phase and per sample phase increments.
    fn expected_sine<F: Fn(usize) -> f64>(start_phase: f64, increment: F) -> Vec<f32> {
        let mut phase = start_phase;
        (0..100)
            .map(|frame| {
                let value = (2.0 * std::f64::consts::PI * phase).sin() as f32;
                phase += increment(frame);
                value
            })
            .collect()
    }

    fn assert_close(output: &[f32], expected: &[f32]) {
        for (frame, (value, expected)) in output.iter().zip(expected).enumerate() {
            assert!(
                (value - expected).abs() < 1e-4,
                "frame {frame}: {value} != {expected}"
            );
        }
    }

    #[test]
    fn frequency_modulation() -> Result<(), Box<Error>> {
        // a constant FM signal of 1 doubles the frequency
        let fm = [1.0f32; 100];
        let modulated = render_sine(
            GrainSynthConfig::new(COSINE),
            50.0,
            None,
            &BlockInputs::new(1.0f32).with_fm(&fm),
        )?;
        let plain = render_sine(
            GrainSynthConfig::new(COSINE),
            100.0,
            None,
            &BlockInputs::new(1.0f32),
        )?;
        assert!(plain.iter().any(|v| v.abs() > 0.5));
        assert_close(&modulated, &plain);

        // FM index and a rising FM envelope scale the modulation depth
        let modulated = render_sine(
            GrainSynthConfig::new(COSINE).fm_indices(HALF),
            50.0,
            Some(RAMP),
            &BlockInputs::new(1.0f32).with_fm(&fm),
        )?;
        let expected = expected_sine(0.0, |frame| 0.05 * (1.0 + 0.5 * frame as f64 / 100.0));
        assert_close(&modulated, &expected);
        assert!((modulated[60] - plain[60]).abs() > 0.1);
        Ok(())
    }

    #[test]
    fn sweeps_and_start_positions() -> Result<(), Box<Error>> {
        // linear sweep from 50 to 100 Hz, starting at a quarter of the waveform
        let output = render_sine(
            GrainSynthConfig::new(COSINE).sweep_scalers(UNITY, DOUBLE),
            50.0,
            None,
            &BlockInputs::new(1.0f32).with_sample_position(WaveSlot::Wave1, 0.25f32),
        )?;
        assert!((output[0] - 1.0).abs() < 1e-4);
        let step = (0.1 - 0.05) / 100.0;
        let expected = expected_sine(0.25, |frame| 0.05 + step * frame as f64);
        assert_close(&output, &expected);
        Ok(())
    }

    #[test]
    fn non_finite_inputs() -> Result<(), Box<Error>> {
        let context = context(1000, 16)?;
        let mut synth = seeded_synth(&context, &GrainSynthConfig::new(COSINE))?;
        let controls = GrainControls::default();
        let mut sync = [0.0f32; 16];
        sync[3] = f32::NAN;
        assert!(synth
            .process(&controls, &BlockInputs::new(250.0f32).with_sync(&sync[..]))
            .is_err());
        // the rejected block leaves the grain clock untouched
        for _ in 0..20 {
            let stats = synth.process(&controls, &BlockInputs::new(250.0f32))?;
            assert_eq!(stats.triggers, 4);
        }
        Ok(())
    }

    #[test]
    fn init_errors() -> Result<(), Box<Error>> {
        let context = context(48000, 64)?;
        assert!(GrainSynth::new(&context, &GrainSynthConfig::new(COSINE)).is_ok());
        assert!(matches!(
            GrainSynth::new(&context, &GrainSynthConfig::new(TableId(99))),
            Err(Error::TableNotFound(_))
        ));
        assert!(GrainSynth::new(&context, &GrainSynthConfig::new(COSINE).max_grains(0)).is_err());
        assert!(
            GrainSynth::new(&context, &GrainSynthConfig::new(COSINE).output_channels(0)).is_err()
        );
        assert!(GrainSynth::new(
            &context,
            &GrainSynthConfig::new(COSINE).envelopes(ATTACK, TableId(99))
        )
        .is_err());
        Ok(())
    }

    #[test]
    fn trigger_rate() -> Result<(), Box<Error>> {
        let context = context(48000, 64)?;
        let mut synth = seeded_synth(&context, &GrainSynthConfig::new(COSINE))?;
        let mut controls = GrainControls::default();
        controls.duration = 10.0;
        controls.waveforms[0] = Some(SINE);
        let inputs = BlockInputs::new(100.0f32);

        // one second
        let blocks = 48000 / 64;
        let mut triggers = 0;
        for _ in 0..blocks {
            let stats = synth.process(&controls, &inputs)?;
            assert_eq!(stats.triggers, stats.started);
            triggers += stats.triggers;
            assert_eq!(
                synth.free_grains() + synth.active_grains(),
                synth.max_grains()
            );
        }
        assert!((99..=101).contains(&triggers), "{triggers} triggers");
        assert!(!synth.out_of_grains_warned());
        assert!(synth.output(0).unwrap().iter().any(|v| *v != 0.0));
        Ok(())
    }

    #[test]
    fn envelope_shape() -> Result<(), Box<Error>> {
        let context = context(1000, 100)?;
        let config = GrainSynthConfig::new(COSINE)
            .wave_gains(WAVE_GAINS)
            .envelopes(ATTACK, DECAY)
            .output_channels(1);
        let mut synth = seeded_synth(&context, &config)?;
        let mut controls = GrainControls::default();
        // constant 1.0 waveform, 20 samples long grains
        controls.waveforms[0] = Some(ONES);
        controls.duration = 20.0;
        controls.sustain = 0.2;
        controls.attack_decay_ratio = 0.5;
        // a single grain at the start of the block
        synth.process(&controls, &BlockInputs::new(1.0f32))?;

        let output = synth.output(0).unwrap();
        // 8 attack samples, 4 sustain samples and 8 decay samples
        for frame in 1..8 {
            assert!(output[frame] > output[frame - 1], "{output:?}");
        }
        for frame in 8..12 {
            assert!((output[frame] - 1.0).abs() < 1e-6, "{output:?}");
        }
        for frame in 13..20 {
            assert!(output[frame] <= output[frame - 1], "{output:?}");
        }
        assert!(output[20..].iter().all(|v| *v == 0.0));
        assert_eq!(synth.active_grains(), 0);
        Ok(())
    }

    #[test]
    fn channel_mask_split() -> Result<(), Box<Error>> {
        let context = context(1000, 16)?;
        let config = GrainSynthConfig::new(COSINE)
            .wave_gains(WAVE_GAINS)
            .channel_masks(CHANNEL_MASKS)
            .output_channels(4);
        let mut synth = seeded_synth(&context, &config)?;
        let mut controls = GrainControls::default();
        controls.waveforms[0] = Some(ONES);
        controls.duration = 8.0;
        synth.process(&controls, &BlockInputs::new(1.0f32))?;

        let outputs = synth.outputs();
        for frame in 0..8 {
            assert_eq!(outputs[0][frame], 0.0);
            assert_eq!(outputs[1][frame], 0.0);
            assert!(outputs[2][frame] > 0.0);
            assert!((outputs[2][frame] - outputs[3][frame]).abs() < 1e-6);
        }

        let mut interleaved = vec![0.0; 16 * 4];
        synth.copy_interleaved(&mut interleaved);
        assert_eq!(interleaved[2], outputs[2][0]);
        assert_eq!(interleaved[4 + 3], outputs[3][1]);
        Ok(())
    }

    #[test]
    fn trainlets() -> Result<(), Box<Error>> {
        let context = context(48000, 256)?;
        let config = GrainSynthConfig::new(COSINE).wave_gains(TRAINLET_GAINS);
        let mut synth = seeded_synth(&context, &config)?;
        let mut controls = GrainControls::default();
        controls.trainlet_frequency = 200.0;
        controls.harmonics = 10.0;
        controls.falloff = 0.7;
        controls.duration = 20.0;
        let mut audible = false;
        for _ in 0..8 {
            synth.process(&controls, &BlockInputs::new(20.0f32))?;
            for output in synth.outputs() {
                assert!(output.iter().all(|v| v.is_finite() && v.abs() <= 1.0 + 1e-3));
            }
            audible |= synth.output(0).unwrap().iter().any(|v| *v != 0.0);
        }
        assert!(audible);
        Ok(())
    }

    #[test]
    fn missing_waveform() -> Result<(), Box<Error>> {
        let context = context(48000, 64)?;
        let mut synth = seeded_synth(&context, &GrainSynthConfig::new(COSINE))?;
        let mut controls = GrainControls::default();
        controls.waveforms[2] = Some(TableId(42));
        let stats = synth.process(&controls, &BlockInputs::new(10.0f32))?;
        assert_eq!((stats.triggers, stats.errors), (1, 1));
        assert_eq!(
            stats.last_error,
            Some(crate::GrainError::WaveformTableNotFound(WaveSlot::Wave3))
        );
        assert_eq!(synth.active_grains(), 0);

        // the table may show up later on
        controls.waveforms[2] = Some(SINE);
        let stats = synth.process(&controls, &BlockInputs::new(1000.0f32))?;
        assert_eq!(stats.errors, 0);
        Ok(())
    }

    #[test]
    fn pool_exhaustion() -> Result<(), Box<Error>> {
        let context = context(1000, 8)?;
        let config = GrainSynthConfig::new(COSINE).max_grains(1);
        let mut synth = seeded_synth(&context, &config)?;
        let mut controls = GrainControls::default();
        controls.duration = 100.0;
        // two triggers per block, with a single grain slot
        let inputs = BlockInputs::new(250.0f32);
        let stats = synth.process(&controls, &inputs)?;
        assert_eq!((stats.triggers, stats.started, stats.evicted), (2, 2, 1));
        assert!(synth.out_of_grains_warned());
        for _ in 0..10 {
            let stats = synth.process(&controls, &inputs)?;
            assert_eq!(stats.evicted, 2);
            assert_eq!(synth.active_grains(), 1);
        }
        Ok(())
    }

    #[test]
    fn sync_round_trip() -> Result<(), Box<Error>> {
        let context = context(1000, 16)?;
        let mut writer = seeded_synth(&context, &GrainSynthConfig::new(COSINE).sync_id(7))?;
        let mut reader = GrainSyncReader::new(&context, SyncReaderConfig::new(7))?;
        let controls = GrainControls::default();
        let inputs = BlockInputs::new(250.0f32);

        writer.process(&controls, &inputs)?;
        let table = context.sync_registry().find(7).unwrap();
        let written = (0..16).map(|frame| table.pulse(frame)).collect::<Vec<_>>();
        reader.process();
        assert_eq!(reader.pulses(), written.as_slice());
        assert_eq!(reader.pulses().iter().filter(|p| **p == 1.0).count(), 4);

        // pulses at frames 0, 4, 8 and 12 which no one reads
        writer.process(&controls, &inputs)?;
        assert_eq!(table.pulse(8), 1.0);
        // the writer clears them with the next block: the clock only wraps at frame 0
        writer.process(&controls, &BlockInputs::new(0.0f32))?;
        assert_eq!(table.pulse(0), 1.0);
        assert!((1..16).all(|frame| table.pulse(frame) == 0.0));
        Ok(())
    }

    #[test]
    fn parameter_updates() -> Result<(), Box<Error>> {
        let context = context(48000, 64)?;
        let mut synth = seeded_synth(&context, &GrainSynthConfig::new(COSINE))?;
        let mut controls = GrainControls::default();
        controls.apply_parameter(FourCC(*b"GAMP"), 0.0)?;
        controls.waveforms[0] = Some(SINE);
        let stats = synth.process(&controls, &BlockInputs::new(1000.0f32))?;
        // all grains got muted by the zero amplitude
        assert!(stats.started > 0);
        assert!(synth.outputs().iter().all(|o| o.iter().all(|v| *v == 0.0)));

        controls.duration = f32::INFINITY;
        assert!(synth.process(&controls, &BlockInputs::new(1000.0f32)).is_err());
        let short = [0.0f32; 8];
        assert!(synth
            .process(&GrainControls::default(), &BlockInputs::new(&short[..]))
            .is_err());
        Ok(())
    }
}
