//! Grain records and the fixed size pool they live in.

use std::sync::Arc;

use strum::EnumCount;

use crate::{error::GrainError, table::FunctionTable};

// -------------------------------------------------------------------------------------------------

mod envelope;
mod lifecycle;
mod pool;
mod sweep;
mod trainlet;

pub(crate) use envelope::GrainEnvelope;
pub(crate) use pool::GrainPool;
pub(crate) use sweep::FrequencySweep;
pub(crate) use trainlet::TrainletShape;

// -------------------------------------------------------------------------------------------------

/// Oscillator slots of a grain: four wavetable oscillators and one trainlet generator.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumCount,
    strum::VariantArray,
)]
#[repr(u8)]
pub enum WaveSlot {
    Wave1 = 0,
    Wave2 = 1,
    Wave3 = 2,
    Wave4 = 3,
    Trainlet = 4,
}

impl WaveSlot {
    /// Number of wavetable (non trainlet) slots.
    pub const WAVETABLE_COUNT: usize = WaveSlot::COUNT - 1;

    #[inline]
    pub fn is_trainlet(&self) -> bool {
        *self == WaveSlot::Trainlet
    }
}

// -------------------------------------------------------------------------------------------------

/// State of a single oscillator within a grain.
///
/// Wavetable oscillator phases and deltas are scaled by the table's length, trainlet phases
/// are normalized. A slot with no table is muted and skipped while rendering.
#[derive(Debug, Default, Clone)]
pub(crate) struct Oscillator {
    pub table: Option<Arc<FunctionTable>>,
    pub phase: f64,
    pub delta: f64,
    pub sweep: FrequencySweep,
    pub gain: f32,
}

// -------------------------------------------------------------------------------------------------

/// Places a grain between two output channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChannelRouting {
    pub primary: usize,
    pub secondary: usize,
    pub primary_gain: f32,
    pub secondary_gain: f32,
}

impl Default for ChannelRouting {
    fn default() -> Self {
        Self {
            primary: 0,
            secondary: 0,
            primary_gain: 1.0,
            secondary_gain: 0.0,
        }
    }
}

impl ChannelRouting {
    /// Resolve a continuous channel mask value: the integer part selects the primary channel,
    /// the fractional part crossfades into the next channel, which wraps around to the first
    /// channel after the last one. Negative masks route to the first channel.
    pub fn from_mask(mask: f32, channel_count: usize) -> Result<Self, GrainError> {
        let mask = mask.max(0.0);
        let channel = mask as usize;
        if channel >= channel_count {
            return Err(GrainError::InvalidChannel {
                channel,
                channel_count,
            });
        }
        let fraction = mask - channel as f32;
        Ok(Self {
            primary: channel,
            secondary: if channel + 1 < channel_count {
                channel + 1
            } else {
                0
            },
            primary_gain: 1.0 - fraction,
            secondary_gain: fraction,
        })
    }
}

// -------------------------------------------------------------------------------------------------

/// A single grain: a short, independently enveloped sound event.
#[derive(Debug, Default, Clone)]
pub(crate) struct Grain {
    /// First sample frame to render in the current block.
    pub start: usize,
    /// Sample frame past the last one to render, relative to the current block's start.
    pub stop: usize,
    pub oscillators: [Oscillator; WaveSlot::COUNT],
    pub trainlet: TrainletShape,
    pub envelope: GrainEnvelope,
    pub routing: ChannelRouting,
    pub fm_index: f32,
    /// FM envelope table, shared by all grains which got scheduled in the same block.
    pub fm_envelope: Option<Arc<FunctionTable>>,
}

// -------------------------------------------------------------------------------------------------
