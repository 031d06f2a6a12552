use crate::{grain::WaveSlot, Error};

// -------------------------------------------------------------------------------------------------

/// A block input which either is constant for the whole block or varies per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal<'a> {
    Control(f32),
    Audio(&'a [f32]),
}

impl Default for Signal<'_> {
    fn default() -> Self {
        Self::Control(0.0)
    }
}

impl From<f32> for Signal<'_> {
    fn from(value: f32) -> Self {
        Self::Control(value)
    }
}

impl<'a> From<&'a [f32]> for Signal<'a> {
    fn from(buffer: &'a [f32]) -> Self {
        Self::Audio(buffer)
    }
}

impl Signal<'_> {
    /// Value at the given sample frame.
    #[inline]
    pub fn at(&self, frame: usize) -> f32 {
        match self {
            Self::Control(value) => *value,
            Self::Audio(buffer) => buffer.get(frame).copied().unwrap_or(0.0),
        }
    }

    fn validate(&self, name: &str, block_len: usize) -> Result<(), Error> {
        match self {
            Self::Audio(buffer) if buffer.len() < block_len => Err(Error::ParameterError(
                format!(
                    "Audio input '{name}' has {} samples, but the block needs {block_len}",
                    buffer.len()
                ),
            )),
            Self::Audio(buffer) => match buffer[..block_len].iter().position(|v| !v.is_finite()) {
                Some(frame) => Err(Error::ParameterError(format!(
                    "Audio input '{name}' has a non finite value at frame {frame}"
                ))),
                None => Ok(()),
            },
            Self::Control(value) if !value.is_finite() => Err(Error::ParameterError(format!(
                "Input '{name}' must be finite, but is {value}"
            ))),
            Self::Control(_) => Ok(()),
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Per block inputs of a [`GrainSynth`](super::GrainSynth) which may vary per sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockInputs<'a> {
    /// Grain rate in Hz. Negative rates are treated as positive rates.
    pub grain_rate: Signal<'a>,
    /// Sync input: values >= 1.0 hard sync the grain clock, smaller non zero values nudge
    /// its phase (soft sync).
    pub sync: Signal<'a>,
    /// Frequency modulation signal, scaled by the grain's FM index and FM envelope.
    pub fm: Option<&'a [f32]>,
    /// Start positions of the wavetable slots, normalized to the table's length.
    pub sample_positions: [Signal<'a>; WaveSlot::WAVETABLE_COUNT],
}

impl<'a> BlockInputs<'a> {
    pub fn new<S: Into<Signal<'a>>>(grain_rate: S) -> Self {
        Self {
            grain_rate: grain_rate.into(),
            sync: Signal::default(),
            fm: None,
            sample_positions: [Signal::default(); WaveSlot::WAVETABLE_COUNT],
        }
    }

    pub fn with_sync<S: Into<Signal<'a>>>(mut self, sync: S) -> Self {
        self.sync = sync.into();
        self
    }

    pub fn with_fm(mut self, fm: &'a [f32]) -> Self {
        self.fm = Some(fm);
        self
    }

    /// Set the start position of the given wavetable slot.
    pub fn with_sample_position<S: Into<Signal<'a>>>(mut self, slot: WaveSlot, position: S) -> Self {
        debug_assert!(!slot.is_trainlet(), "Trainlets have no sample position");
        if let Some(sample_position) = self.sample_positions.get_mut(slot as usize) {
            *sample_position = position.into();
        }
        self
    }

    /// Check that all audio inputs cover the given block length.
    pub fn validate(&self, block_len: usize) -> Result<(), Error> {
        self.grain_rate.validate("grain rate", block_len)?;
        self.sync.validate("sync", block_len)?;
        if let Some(fm) = self.fm {
            Signal::Audio(fm).validate("fm", block_len)?;
        }
        for position in &self.sample_positions {
            position.validate("sample position", block_len)?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals() {
        let buffer = [0.0f32, 0.5, 1.0];
        let inputs = BlockInputs::new(10.0f32)
            .with_sync(&buffer[..])
            .with_sample_position(WaveSlot::Wave2, 0.25f32);
        assert_eq!(inputs.grain_rate.at(2), 10.0);
        assert_eq!(inputs.sync.at(1), 0.5);
        assert_eq!(inputs.sample_positions[1].at(0), 0.25);
        assert_eq!(inputs.sample_positions[0].at(0), 0.0);

        assert!(inputs.validate(3).is_ok());
        assert!(inputs.validate(4).is_err());
        assert!(BlockInputs::new(1.0f32).with_fm(&buffer).validate(4).is_err());
    }

    #[test]
    fn non_finite_signals() {
        let mut buffer = [0.0f32; 4];
        buffer[2] = f32::NAN;
        assert!(BlockInputs::new(1.0f32).with_sync(&buffer[..]).validate(4).is_err());
        assert!(BlockInputs::new(&buffer[..]).validate(4).is_err());
        assert!(BlockInputs::new(1.0f32).with_fm(&buffer).validate(4).is_err());
        // samples past the block's end are not read
        assert!(BlockInputs::new(1.0f32).with_sync(&buffer[..]).validate(2).is_ok());

        assert!(BlockInputs::new(f32::INFINITY).validate(4).is_err());
        assert!(BlockInputs::new(1.0f32)
            .with_sample_position(WaveSlot::Wave4, f32::NAN)
            .validate(4)
            .is_err());
    }
}
