// -------------------------------------------------------------------------------------------------

/// Single pole recurrence which sweeps an oscillator's phase increment from its start to its
/// end value over the grain's lifetime: `delta = delta * decay + offset`.
///
/// A decay of 1 gives a linear sweep, decays below 1 exponential curves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrequencySweep {
    pub decay: f64,
    pub offset: f64,
}

impl Default for FrequencySweep {
    fn default() -> Self {
        Self {
            decay: 1.0,
            offset: 0.0,
        }
    }
}

impl FrequencySweep {
    /// Calculate sweep coefficients for a grain of `samples` length.
    ///
    /// `shape` bends the curve: 0.5 is linear, values towards 0 hold the start frequency longer,
    /// values towards 1 jump to the end frequency sooner.
    pub fn new(start_delta: f64, end_delta: f64, shape: f64, samples: usize) -> Self {
        debug_assert!(samples > 0, "Grains need at least one sample");
        if start_delta == end_delta || shape == 0.5 {
            Self {
                decay: 1.0,
                offset: (end_delta - start_delta) / samples as f64,
            }
        } else if shape < 0.001 {
            Self {
                decay: 1.0,
                offset: 0.0,
            }
        } else if shape > 0.999 {
            Self {
                decay: 0.0,
                offset: end_delta,
            }
        } else {
            let t = ((shape - 1.0) / shape).abs();
            let decay = t.powf(2.0 / samples as f64);
            let total = t * t;
            let offset = (end_delta - start_delta * total) / (1.0 - total) * (1.0 - decay);
            Self { decay, offset }
        }
    }

    /// Next phase increment.
    #[inline]
    pub fn apply(&self, delta: f64) -> f64 {
        delta * self.decay + self.offset
    }
}

// -------------------------------------------------------------------------------------------------
