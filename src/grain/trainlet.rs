// -------------------------------------------------------------------------------------------------

/// Harmonic series settings of a trainlet grain, evaluated in closed form with the discrete
/// summation formula.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct TrainletShape {
    /// Number of summed cosine partials, including the DC partial. Always >= 2.
    pub harmonics: u32,
    /// Amplitude factor between two neighbouring partials.
    pub falloff: f64,
    /// `falloff ^ harmonics`
    pub falloff_pow_n: f64,
}

impl TrainletShape {
    /// Create a trainlet shape for a grain which sweeps from `start_freq` to `end_freq`.
    ///
    /// The number of harmonics is limited to the user's `harmonics` control and Nyquist, so
    /// the highest partial never aliases at the highest frequency of the sweep.
    pub fn new(
        start_freq: f64,
        end_freq: f64,
        harmonics: f64,
        falloff: f64,
        sample_rate: u32,
    ) -> Self {
        let max_freq = if start_freq > end_freq {
            start_freq
        } else {
            end_freq
        };
        let nyquist_harmonics = (0.5 * sample_rate as f64 / max_freq.abs()).min(harmonics.abs());
        // a single partial would be DC only
        let harmonics = (nyquist_harmonics as u32).saturating_add(1).max(2);
        Self {
            harmonics,
            falloff,
            falloff_pow_n: int_pow(falloff, harmonics),
        }
    }

    /// Gain which normalizes the harmonic series to a uniform peak, using its geometric sum.
    pub fn normalization(&self) -> f64 {
        let falloff = self.falloff.abs();
        if falloff > 0.9999 && falloff < 1.0001 {
            1.0 / self.harmonics as f64
        } else {
            (1.0 - falloff) / (1.0 - self.falloff_pow_n.abs())
        }
    }

    /// Evaluate `sum(a^k * cos(k * beta)) - 1` for `k` in `[0, harmonics)`, where beta is a
    /// normalized phase in range `[0, 1)`. The DC partial is removed by the `- 1`.
    ///
    /// `cosine` looks up a full cosine period with a 32-bit fixed point phase.
    #[inline]
    pub fn sample<F: Fn(u32) -> f64>(&self, beta: f64, cosine: F) -> f64 {
        let n = self.harmonics;
        let a = self.falloff;
        let fixed_beta = (beta * u32::MAX as f64) as u32;
        let cos_beta = cosine(fixed_beta);
        let denominator = 1.0 - 2.0 * a * cos_beta + a * a;
        if denominator.abs() < 1e-4 {
            // limit at a = 1, beta = 0
            n as f64 - 1.0
        } else {
            let last_harmonic = self.falloff_pow_n * cosine(fixed_beta.wrapping_mul(n));
            let numerator = 1.0 - a * cos_beta - last_harmonic
                + a * self.falloff_pow_n * cosine(fixed_beta.wrapping_mul(n - 1));
            numerator / denominator - 1.0
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// `base ^ exp` by repeated squaring.
pub(crate) fn int_pow(mut base: f64, mut exp: u32) -> f64 {
    let mut result = 1.0;
    while exp > 0 {
        if exp & 1 != 0 {
            result *= base;
        }
        base *= base;
        exp >>= 1;
    }
    result
}

// -------------------------------------------------------------------------------------------------
