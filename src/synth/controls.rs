use four_cc::FourCC;

use crate::{
    grain::WaveSlot,
    parameter::{FloatParameter, Parameter, ParameterScaling, ParameterValueUpdate},
    table::TableId,
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Control rate settings of a [`GrainSynth`](super::GrainSynth), read once per block.
///
/// All values are read when a grain gets scheduled: changing them never affects grains which
/// are already playing.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainControls {
    /// Scales the values of the distribution table to get the phase offsets of grains within a
    /// grain period. Values >= 0 pick random offsets from the table, negative values read the
    /// table sequentially.
    pub distribution: f32,
    /// Grain duration in milliseconds.
    pub duration: f32,
    /// Overall grain amplitude.
    pub amplitude: f32,
    /// Fraction of the grain which holds the attack envelope's final value.
    pub sustain: f32,
    /// Splits the non sustained part of the grain into attack and decay.
    pub attack_decay_ratio: f32,
    /// Blend amount of the secondary envelope, which spans the whole grain.
    pub env2_amount: f32,
    /// Probability of a grain getting randomly masked (muted).
    pub random_mask: f32,
    /// Shape of frequency sweeps: 0.5 is linear.
    pub sweep_shape: f32,
    /// Base frequency of the wavetable oscillators in Hz.
    pub wave_frequency: f32,
    /// Per wavetable slot frequency multipliers.
    pub wave_keys: [f32; WaveSlot::WAVETABLE_COUNT],
    /// Fundamental frequency of the trainlet oscillator in Hz.
    pub trainlet_frequency: f32,
    /// Maximum number of trainlet harmonics.
    pub harmonics: f32,
    /// Amplitude factor between neighbouring trainlet harmonics.
    pub falloff: f32,
    /// Waveform tables for the four wavetable slots. `None` uses a silent default table.
    pub waveforms: [Option<TableId>; WaveSlot::WAVETABLE_COUNT],
    /// FM envelope table. `None` applies FM with a constant depth.
    pub fm_envelope: Option<TableId>,
}

impl Default for GrainControls {
    fn default() -> Self {
        Self {
            distribution: Self::DISTRIBUTION.default_value(),
            duration: Self::DURATION.default_value(),
            amplitude: Self::AMPLITUDE.default_value(),
            sustain: Self::SUSTAIN.default_value(),
            attack_decay_ratio: Self::ATTACK_DECAY_RATIO.default_value(),
            env2_amount: Self::ENV2_AMOUNT.default_value(),
            random_mask: Self::RANDOM_MASK.default_value(),
            sweep_shape: Self::SWEEP_SHAPE.default_value(),
            wave_frequency: Self::WAVE_FREQUENCY.default_value(),
            wave_keys: [
                Self::WAVE_KEY_1.default_value(),
                Self::WAVE_KEY_2.default_value(),
                Self::WAVE_KEY_3.default_value(),
                Self::WAVE_KEY_4.default_value(),
            ],
            trainlet_frequency: Self::TRAINLET_FREQUENCY.default_value(),
            harmonics: Self::HARMONICS.default_value(),
            falloff: Self::FALLOFF.default_value(),
            waveforms: [None; WaveSlot::WAVETABLE_COUNT],
            fm_envelope: None,
        }
    }
}

impl GrainControls {
    const MAX_FREQUENCY: f32 = 20000.0;

    pub const DISTRIBUTION: FloatParameter =
        FloatParameter::new(FourCC(*b"GDST"), "Distribution", -1.0..=1.0, 0.0);
    pub const DURATION: FloatParameter =
        FloatParameter::new(FourCC(*b"GDUR"), "Duration", 0.0..=5000.0, 50.0)
            .with_scaling(ParameterScaling::Exponential(2.0))
            .with_unit("ms");
    pub const AMPLITUDE: FloatParameter =
        FloatParameter::new(FourCC(*b"GAMP"), "Amplitude", 0.0..=4.0, 1.0);
    pub const SUSTAIN: FloatParameter =
        FloatParameter::new(FourCC(*b"ESUS"), "Sustain", 0.0..=1.0, 0.0);
    pub const ATTACK_DECAY_RATIO: FloatParameter =
        FloatParameter::new(FourCC(*b"EADR"), "Attack/Decay", 0.0..=1.0, 0.5);
    pub const ENV2_AMOUNT: FloatParameter =
        FloatParameter::new(FourCC(*b"ENV2"), "Env2 Amount", 0.0..=1.0, 0.0);
    pub const RANDOM_MASK: FloatParameter =
        FloatParameter::new(FourCC(*b"GRMK"), "Random Mask", 0.0..=1.0, 0.0);
    pub const SWEEP_SHAPE: FloatParameter =
        FloatParameter::new(FourCC(*b"FSWP"), "Sweep Shape", 0.0..=1.0, 0.5);
    pub const WAVE_FREQUENCY: FloatParameter = FloatParameter::new(
        FourCC(*b"WFRQ"),
        "Wave Frequency",
        0.0..=Self::MAX_FREQUENCY,
        440.0,
    )
    .with_scaling(ParameterScaling::Exponential(2.0))
    .with_unit("Hz");
    pub const WAVE_KEY_1: FloatParameter =
        FloatParameter::new(FourCC(*b"WKY1"), "Wave Key 1", -16.0..=16.0, 1.0).with_unit("x");
    pub const WAVE_KEY_2: FloatParameter =
        FloatParameter::new(FourCC(*b"WKY2"), "Wave Key 2", -16.0..=16.0, 1.0).with_unit("x");
    pub const WAVE_KEY_3: FloatParameter =
        FloatParameter::new(FourCC(*b"WKY3"), "Wave Key 3", -16.0..=16.0, 1.0).with_unit("x");
    pub const WAVE_KEY_4: FloatParameter =
        FloatParameter::new(FourCC(*b"WKY4"), "Wave Key 4", -16.0..=16.0, 1.0).with_unit("x");
    pub const TRAINLET_FREQUENCY: FloatParameter = FloatParameter::new(
        FourCC(*b"TFRQ"),
        "Trainlet Frequency",
        0.0..=Self::MAX_FREQUENCY,
        100.0,
    )
    .with_scaling(ParameterScaling::Exponential(2.0))
    .with_unit("Hz");
    pub const HARMONICS: FloatParameter =
        FloatParameter::new(FourCC(*b"THRM"), "Harmonics", 0.0..=1000.0, 20.0)
            .with_scaling(ParameterScaling::Exponential(2.0));
    pub const FALLOFF: FloatParameter =
        FloatParameter::new(FourCC(*b"TFAL"), "Falloff", 0.0..=2.0, 0.9);

    /// Control parameter descriptors.
    pub fn parameters() -> Vec<Box<dyn Parameter>> {
        vec![
            Self::DISTRIBUTION.into_box(),
            Self::DURATION.into_box(),
            Self::AMPLITUDE.into_box(),
            Self::SUSTAIN.into_box(),
            Self::ATTACK_DECAY_RATIO.into_box(),
            Self::ENV2_AMOUNT.into_box(),
            Self::RANDOM_MASK.into_box(),
            Self::SWEEP_SHAPE.into_box(),
            Self::WAVE_FREQUENCY.into_box(),
            Self::WAVE_KEY_1.into_box(),
            Self::WAVE_KEY_2.into_box(),
            Self::WAVE_KEY_3.into_box(),
            Self::WAVE_KEY_4.into_box(),
            Self::TRAINLET_FREQUENCY.into_box(),
            Self::HARMONICS.into_box(),
            Self::FALLOFF.into_box(),
        ]
    }

    /// Apply a plain or normalized parameter value update for the given parameter id.
    pub fn apply_update(&mut self, id: FourCC, update: &ParameterValueUpdate) -> Result<(), Error> {
        let (descriptor, value) = match id {
            _ if id == Self::DISTRIBUTION.id() => (Self::DISTRIBUTION, &mut self.distribution),
            _ if id == Self::DURATION.id() => (Self::DURATION, &mut self.duration),
            _ if id == Self::AMPLITUDE.id() => (Self::AMPLITUDE, &mut self.amplitude),
            _ if id == Self::SUSTAIN.id() => (Self::SUSTAIN, &mut self.sustain),
            _ if id == Self::ATTACK_DECAY_RATIO.id() => {
                (Self::ATTACK_DECAY_RATIO, &mut self.attack_decay_ratio)
            }
            _ if id == Self::ENV2_AMOUNT.id() => (Self::ENV2_AMOUNT, &mut self.env2_amount),
            _ if id == Self::RANDOM_MASK.id() => (Self::RANDOM_MASK, &mut self.random_mask),
            _ if id == Self::SWEEP_SHAPE.id() => (Self::SWEEP_SHAPE, &mut self.sweep_shape),
            _ if id == Self::WAVE_FREQUENCY.id() => {
                (Self::WAVE_FREQUENCY, &mut self.wave_frequency)
            }
            _ if id == Self::WAVE_KEY_1.id() => (Self::WAVE_KEY_1, &mut self.wave_keys[0]),
            _ if id == Self::WAVE_KEY_2.id() => (Self::WAVE_KEY_2, &mut self.wave_keys[1]),
            _ if id == Self::WAVE_KEY_3.id() => (Self::WAVE_KEY_3, &mut self.wave_keys[2]),
            _ if id == Self::WAVE_KEY_4.id() => (Self::WAVE_KEY_4, &mut self.wave_keys[3]),
            _ if id == Self::TRAINLET_FREQUENCY.id() => {
                (Self::TRAINLET_FREQUENCY, &mut self.trainlet_frequency)
            }
            _ if id == Self::HARMONICS.id() => (Self::HARMONICS, &mut self.harmonics),
            _ if id == Self::FALLOFF.id() => (Self::FALLOFF, &mut self.falloff),
            _ => {
                return Err(Error::ParameterError(format!(
                    "Invalid/unknown grain parameter '{id}'"
                )))
            }
        };
        *value = descriptor.update_value(update);
        Ok(())
    }

    /// Set a plain parameter value. Out of range values get clamped.
    pub fn apply_parameter(&mut self, id: FourCC, value: f32) -> Result<(), Error> {
        self.apply_update(id, &ParameterValueUpdate::Plain(value))
    }

    /// Set a normalized parameter value in range `0.0..=1.0`.
    pub fn apply_normalized(&mut self, id: FourCC, normalized: f32) -> Result<(), Error> {
        self.apply_update(id, &ParameterValueUpdate::Normalized(normalized))
    }

    /// Check that all values are usable for grain scheduling.
    pub fn validate(&self) -> Result<(), Error> {
        let values = [
            ("distribution", self.distribution),
            ("duration", self.duration),
            ("amplitude", self.amplitude),
            ("sustain", self.sustain),
            ("attack/decay ratio", self.attack_decay_ratio),
            ("env2 amount", self.env2_amount),
            ("random mask", self.random_mask),
            ("sweep shape", self.sweep_shape),
            ("wave frequency", self.wave_frequency),
            ("wave key 1", self.wave_keys[0]),
            ("wave key 2", self.wave_keys[1]),
            ("wave key 3", self.wave_keys[2]),
            ("wave key 4", self.wave_keys[3]),
            ("trainlet frequency", self.trainlet_frequency),
            ("harmonics", self.harmonics),
            ("falloff", self.falloff),
        ];
        if let Some((name, value)) = values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(Error::ParameterError(format!(
                "Grain control '{name}' must be finite, but is {value}"
            )));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
