use crate::table::FunctionTable;

// -------------------------------------------------------------------------------------------------

/// Amplitude envelope state of a grain.
///
/// The envelope runs from phase 0 to 1 over the grain's lifetime and consists of an attack,
/// a sustain and a decay segment. A secondary envelope, which always spans the whole grain,
/// gets multiplied on top of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GrainEnvelope {
    /// Phase in range `[0, 1]`.
    pub phase: f64,
    /// Phase increment per sample: `1 / duration in samples`.
    pub increment: f64,
    pub attack_len: f64,
    pub decay_start: f64,
    pub secondary_amount: f32,
}

impl Default for GrainEnvelope {
    fn default() -> Self {
        Self {
            phase: 0.0,
            increment: 0.0,
            attack_len: 0.0,
            decay_start: 1.0,
            secondary_amount: 0.0,
        }
    }
}

impl GrainEnvelope {
    /// Create a new envelope for a grain of `samples` length.
    ///
    /// `sustain` is the fraction of the grain which holds the attack's final value, the
    /// `attack_decay_ratio` splits the rest of the grain into the attack and decay segments.
    /// `phase_correction` is the sub-sample offset of the grain's start in range `[0, 1)`.
    pub fn new(
        samples: usize,
        sustain: f64,
        attack_decay_ratio: f64,
        secondary_amount: f32,
        phase_correction: f64,
    ) -> Self {
        debug_assert!(samples > 0, "Grains need at least one sample");
        let increment = 1.0 / samples as f64;
        let attack_len = (1.0 - sustain) * attack_decay_ratio;
        Self {
            phase: phase_correction * increment,
            increment,
            attack_len,
            decay_start: attack_len + sustain,
            secondary_amount,
        }
    }

    /// Calculate the gain for the current phase and advance the phase by one sample.
    #[inline]
    pub fn next_gain(
        &mut self,
        attack: &FunctionTable,
        decay: &FunctionTable,
        secondary: &FunctionTable,
    ) -> f32 {
        let env = if self.phase < self.attack_len {
            attack.lookup_normalized(self.phase / self.attack_len)
        } else if self.phase < self.decay_start {
            // sustain holds the attack's last value
            attack.lookup_normalized(1.0)
        } else if self.phase < 1.0 {
            decay.lookup_normalized((self.phase - self.decay_start) / (1.0 - self.decay_start))
        } else {
            // clamp round-off errors at the grain's end
            self.phase = 1.0;
            if self.decay_start < 1.0 {
                decay.lookup_normalized(1.0)
            } else {
                attack.lookup_normalized(1.0)
            }
        };
        let env2 = 1.0 - self.secondary_amount
            + self.secondary_amount * secondary.lookup_normalized(self.phase);
        self.phase += self.increment;
        env * env2
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn ramp(values: &[f32]) -> Result<FunctionTable, Box<Error>> {
        Ok(FunctionTable::with_extended_guard(values.to_vec())?)
    }

    #[test]
    fn segments() -> Result<(), Box<Error>> {
        let attack = ramp(&[0.0, 1.0])?;
        let decay = ramp(&[1.0, 0.0])?;
        let ones = ramp(&[1.0, 1.0])?;

        // 10 samples: 4 attack, 2 sustain, 4 decay
        let mut envelope = GrainEnvelope::new(10, 0.2, 0.5, 0.0, 0.0);
        assert!((envelope.attack_len - 0.4).abs() < 1e-12);
        assert!((envelope.decay_start - 0.6).abs() < 1e-12);
        let gains = (0..10)
            .map(|_| envelope.next_gain(&attack, &decay, &ones))
            .collect::<Vec<_>>();
        let expected = [0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0, 0.75, 0.5, 0.25];
        for (gain, expected) in gains.iter().zip(expected) {
            assert!((gain - expected).abs() < 1e-5, "{gains:?}");
        }

        // runs past the grain's end are clamped
        assert!(envelope.next_gain(&attack, &decay, &ones) < 1e-5);
        assert_eq!(envelope.next_gain(&attack, &decay, &ones), 0.0);
        assert_eq!(envelope.phase, 1.0 + envelope.increment);
        Ok(())
    }

    #[test]
    fn secondary_envelope() -> Result<(), Box<Error>> {
        let ones = ramp(&[1.0, 1.0])?;
        let zeros = ramp(&[0.0, 0.0])?;
        let mut envelope = GrainEnvelope::new(4, 1.0, 0.5, 0.25, 0.0);
        assert_eq!(envelope.next_gain(&ones, &ones, &zeros), 0.75);

        let mut envelope = GrainEnvelope::new(4, 1.0, 0.5, 0.0, 0.0);
        assert_eq!(envelope.next_gain(&ones, &ones, &zeros), 1.0);
        Ok(())
    }

    #[test]
    fn phase_correction() {
        let envelope = GrainEnvelope::new(100, 0.0, 0.5, 0.0, 0.5);
        assert_eq!(envelope.phase, 0.005);
        assert_eq!(envelope.increment, 0.01);
    }
}
