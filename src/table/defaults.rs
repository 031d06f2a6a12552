use std::sync::Arc;

use super::FunctionTable;

// -------------------------------------------------------------------------------------------------

/// Fallback tables for all table selections a grain synth leaves unset.
///
/// Created once per [`GrainContext`](crate::GrainContext) and shared by all grain synths
/// created within that context.
#[derive(Debug, Clone)]
pub struct DefaultTables {
    ones: Arc<FunctionTable>,
    zeros: Arc<FunctionTable>,
    unity_row: Arc<FunctionTable>,
    wave_gains: Arc<FunctionTable>,
}

impl Default for DefaultTables {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultTables {
    pub fn new() -> Self {
        Self {
            ones: constant_table([1.0, 1.0]),
            zeros: constant_table([0.0, 0.0]),
            unity_row: constant_table([0.0, 0.0, 1.0]),
            wave_gains: constant_table([0.0, 0.0, 0.5, 0.5, 0.5, 0.5, 0.0]),
        }
    }

    /// Constant 1.0: default for all envelopes and the FM envelope.
    pub fn ones(&self) -> &Arc<FunctionTable> {
        &self.ones
    }

    /// Constant 0.0: default for the distribution, channel masks and waveforms.
    pub fn zeros(&self) -> &Arc<FunctionTable> {
        &self.zeros
    }

    /// Rotating index table with a single 1.0 value: default for gain masks, FM indices and
    /// frequency sweep scalers.
    pub fn unity_row(&self) -> &Arc<FunctionTable> {
        &self.unity_row
    }

    /// Rotating index table with a single wave gain row: all four wavetable slots at half gain,
    /// trainlets disabled.
    pub fn wave_gains(&self) -> &Arc<FunctionTable> {
        &self.wave_gains
    }
}

// -------------------------------------------------------------------------------------------------

/// Non periodic table with an extended guard sample.
fn constant_table<const N: usize>(values: [f32; N]) -> Arc<FunctionTable> {
    let guard = values[N - 1];
    Arc::new(FunctionTable::from_parts(values.to_vec(), guard))
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::RotatingIndex;

    #[test]
    fn default_rows() {
        let defaults = DefaultTables::new();
        let mut index = RotatingIndex::new();
        assert_eq!(index.next_value(defaults.unity_row()), 1.0);
        assert_eq!(index.next_value(defaults.unity_row()), 1.0);

        let mut index = RotatingIndex::new();
        let row = index.next_row(defaults.wave_gains());
        let gains = (0..5)
            .map(|column| defaults.wave_gains().row_value(row, 5, column))
            .collect::<Vec<_>>();
        assert_eq!(gains, vec![0.5, 0.5, 0.5, 0.5, 0.0]);

        assert_eq!(defaults.ones().lookup_normalized(0.3), 1.0);
        assert_eq!(defaults.zeros().lookup_wrapped(1.5), 0.0);
    }
}
