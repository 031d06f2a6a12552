//! Renders a few seconds of a trainlet cloud, plus a sine grain layer which is hard synced to
//! the cloud's grain clock, into a wav file.

use std::{error::Error, sync::Arc};

use four_cc::FourCC;
use hound::{SampleFormat, WavSpec, WavWriter};

use grainwave::{
    BlockInputs, FunctionTable, GrainContext, GrainControls, GrainSyncReader, GrainSynth,
    GrainSynthConfig, SyncReaderConfig, TableId, TableRegistry,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const SAMPLE_RATE: u32 = 44100;
const BLOCK_SIZE: usize = 256;
const CHANNEL_COUNT: usize = 2;
const DURATION_SECS: usize = 6;

const COSINE: TableId = TableId(1);
const SINE: TableId = TableId(2);
const HANN_ATTACK: TableId = TableId(3);
const HANN_DECAY: TableId = TableId(4);
const PANNING: TableId = TableId(5);
const TRAINLETS_ONLY: TableId = TableId(6);
const SWEEP_STARTS: TableId = TableId(7);
const SWEEP_ENDS: TableId = TableId(8);

const SYNC_ID: u32 = 1;

// -------------------------------------------------------------------------------------------------

fn create_tables() -> Result<TableRegistry, grainwave::Error> {
    let half_hann = |rising: bool| {
        let values = (0..=512)
            .map(|index| {
                let x = index as f64 / 512.0;
                let x = if rising { x } else { 1.0 - x };
                (0.5 - 0.5 * (std::f64::consts::PI * x).cos()) as f32
            })
            .collect::<Vec<_>>();
        FunctionTable::with_extended_guard(values)
    };
    Ok(TableRegistry::new()
        .with_table(COSINE, FunctionTable::cosine(8192)?)
        .with_table(SINE, FunctionTable::sine(4096)?)
        .with_table(HANN_ATTACK, half_hann(true)?)
        .with_table(HANN_DECAY, half_hann(false)?)
        // rotating index tables: index bounds followed by the values
        .with_table(
            PANNING,
            FunctionTable::with_extended_guard(vec![0.0, 3.0, 0.1, 0.9, 0.35, 0.65])?,
        )
        .with_table(
            TRAINLETS_ONLY,
            FunctionTable::with_extended_guard(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.6])?,
        )
        .with_table(
            SWEEP_STARTS,
            FunctionTable::with_extended_guard(vec![0.0, 1.0, 1.0, 0.75])?,
        )
        .with_table(
            SWEEP_ENDS,
            FunctionTable::with_extended_guard(vec![0.0, 2.0, 1.5, 0.5, 2.0])?,
        ))
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let context = GrainContext::new(SAMPLE_RATE, BLOCK_SIZE, Arc::new(create_tables()?))?;

    // trainlet cloud, which publishes its grain clock
    let mut cloud = GrainSynth::new(
        &context,
        &GrainSynthConfig::new(COSINE)
            .sync_id(SYNC_ID)
            .envelopes(HANN_ATTACK, HANN_DECAY)
            .channel_masks(PANNING)
            .wave_gains(TRAINLETS_ONLY)
            .sweep_scalers(SWEEP_STARTS, SWEEP_ENDS),
    )?;
    let mut cloud_controls = GrainControls::default();
    cloud_controls.apply_parameter(FourCC(*b"GDUR"), 80.0)?;
    cloud_controls.apply_parameter(FourCC(*b"THRM"), 24.0)?;
    cloud_controls.apply_parameter(FourCC(*b"GAMP"), 0.5)?;

    // sine grains, following the cloud's grain clock
    let mut follower = GrainSynth::new(
        &context,
        &GrainSynthConfig::new(COSINE)
            .envelopes(HANN_ATTACK, HANN_DECAY)
            .channel_masks(PANNING),
    )?;
    let mut reader = GrainSyncReader::new(&context, SyncReaderConfig::new(SYNC_ID))?;
    let mut follower_controls = GrainControls::default();
    follower_controls.waveforms[0] = Some(SINE);
    follower_controls.duration = 30.0;
    follower_controls.amplitude = 0.3;

    let spec = WavSpec {
        channels: CHANNEL_COUNT as u16,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let file_path = "render-trainlets.wav";
    let mut writer = WavWriter::create(file_path, spec)?;

    let mut cloud_buffer = vec![0.0; BLOCK_SIZE * CHANNEL_COUNT];
    let mut follower_buffer = vec![0.0; BLOCK_SIZE * CHANNEL_COUNT];

    let block_count = DURATION_SECS * SAMPLE_RATE as usize / BLOCK_SIZE;
    for block in 0..block_count {
        let progress = block as f32 / block_count as f32;

        // slowly raise the density and pitch of the cloud
        cloud_controls.trainlet_frequency = 80.0 + 220.0 * progress;
        cloud_controls.falloff = 0.6 + 0.35 * progress;
        let stats = cloud.process(&cloud_controls, &BlockInputs::new(4.0 + 36.0 * progress))?;
        if stats.errors > 0 {
            log::warn!("{} trainlet grains failed to start", stats.errors);
        }

        // performed after the writer: picks up the pulses of this block
        reader.process();
        follower_controls.wave_frequency = 220.0 + 440.0 * (1.0 - progress);
        follower.process(
            &follower_controls,
            &BlockInputs::new(0.0f32).with_sync(reader.pulses()),
        )?;

        cloud.copy_interleaved(&mut cloud_buffer);
        follower.copy_interleaved(&mut follower_buffer);
        for (trainlets, sines) in cloud_buffer.iter().zip(follower_buffer.iter()) {
            writer.write_sample(trainlets + sines)?;
        }
    }
    writer.finalize()?;

    log::info!(
        "Rendered {DURATION_SECS} seconds into '{file_path}'. Cloud out of grains: {}",
        cloud.out_of_grains_warned()
    );
    Ok(())
}
