use std::sync::Arc;

use strum::{EnumCount, VariantArray};

use super::{GrainScheduler, ScheduleContext};
use crate::{
    error::GrainError,
    grain::{
        ChannelRouting, FrequencySweep, Grain, GrainEnvelope, Oscillator, TrainletShape, WaveSlot,
    },
    random::RandomSource,
};

// -------------------------------------------------------------------------------------------------

/// Outcome of a grain setup which didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum GrainSetup {
    Started,
    /// Muted by the gain mask or the random mask.
    Masked,
    /// Shorter than a single sample.
    TooShort,
}

// -------------------------------------------------------------------------------------------------

impl GrainScheduler {
    /// Set up a new grain which starts at the given frame in the current block.
    ///
    /// Rotating table indices advance for every triggered grain, including grains which end up
    /// being masked or dropped.
    pub(super) fn setup_grain(
        &mut self,
        context: &ScheduleContext,
        grain: &mut Grain,
        rng: &mut dyn RandomSource,
        frame: usize,
    ) -> Result<GrainSetup, GrainError> {
        let tables = context.tables;
        let controls = context.controls;

        let mask_gain = self.gain_mask_index.next_value(&tables.gain_masks);
        let channel_mask = self.channel_mask_index.next_value(&tables.channel_masks);
        let start_scale = self.sweep_start_index.next_value(&tables.sweep_starts) as f64;
        let end_scale = self.sweep_end_index.next_value(&tables.sweep_ends) as f64;
        let fm_index = self.fm_index_index.next_value(&tables.fm_indices);
        let wave_gain_row = self.wave_gain_index.next_row(&tables.wave_gains);

        if mask_gain.abs() < 1e-8 || rng.next_unit() > 1.0 - controls.random_mask as f64 {
            return Ok(GrainSetup::Masked);
        }

        let routing = ChannelRouting::from_mask(channel_mask, context.output_channels)?;
        let fm_envelope = context
            .block_tables
            .fm_envelope
            .as_ref()
            .ok_or(GrainError::FmEnvelopeTableNotFound)?;

        let sample_rate = context.sample_rate as f64;
        let samples = (sample_rate * controls.duration as f64 / 1000.0 + 0.5) as i64;
        if samples <= 0 {
            return Ok(GrainSetup::TooShort);
        }
        let samples = samples as usize;

        // place synchronous grains between samples
        let phase_correction = if self.phase < self.increment && self.increment != 0.0 {
            self.phase / self.increment
        } else {
            0.0
        };

        let grain_gain = controls.amplitude as f64 * mask_gain as f64;
        for slot in WaveSlot::VARIANTS {
            let index = *slot as usize;
            let frequency = if slot.is_trainlet() {
                controls.trainlet_frequency as f64
            } else {
                controls.wave_keys[index] as f64 * controls.wave_frequency as f64
            };
            let start_freq = frequency * start_scale;
            let end_freq = frequency * end_scale;

            let mut gain = tables
                .wave_gains
                .row_value(wave_gain_row, WaveSlot::COUNT, index) as f64
                * grain_gain;
            if gain.abs() < 1e-10 {
                grain.oscillators[index].table = None;
                continue;
            }

            let table = if slot.is_trainlet() {
                grain.trainlet = TrainletShape::new(
                    start_freq,
                    end_freq,
                    controls.harmonics as f64,
                    controls.falloff as f64,
                    context.sample_rate,
                );
                gain *= grain.trainlet.normalization();
                Arc::clone(&tables.cosine)
            } else {
                context.block_tables.waveforms[index]
                    .clone()
                    .ok_or(GrainError::WaveformTableNotFound(*slot))?
            };

            let mut delta = start_freq / sample_rate;
            let mut end_delta = end_freq / sample_rate;
            let mut phase = if slot.is_trainlet() {
                // keep the pulse away from the grain's start, where the envelope mutes it
                0.5
            } else {
                context.inputs.sample_positions[index].at(frame) as f64
            };
            phase = (phase + phase_correction * delta).clamp(0.0, 1.0);
            if !slot.is_trainlet() {
                let table_len = table.len() as f64;
                phase *= table_len;
                delta *= table_len;
                end_delta *= table_len;
            }

            grain.oscillators[index] = Oscillator {
                table: Some(table),
                phase,
                delta,
                sweep: FrequencySweep::new(
                    delta,
                    end_delta,
                    controls.sweep_shape as f64,
                    samples,
                ),
                gain: gain as f32,
            };
        }

        grain.start = frame;
        grain.stop = frame + samples;
        grain.envelope = GrainEnvelope::new(
            samples,
            controls.sustain as f64,
            controls.attack_decay_ratio as f64,
            controls.env2_amount,
            phase_correction,
        );
        grain.routing = routing;
        grain.fm_index = fm_index;
        grain.fm_envelope = Some(Arc::clone(fm_envelope));

        Ok(GrainSetup::Started)
    }
}
