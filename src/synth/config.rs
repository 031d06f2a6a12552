use crate::{table::TableId, Error};

// -------------------------------------------------------------------------------------------------

/// Init time settings of a [`GrainSynth`](super::GrainSynth).
///
/// Table selections which are left unset fall back to the context's default tables.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainSynthConfig {
    /// By default 100. Maximum number of concurrently playing grains. When exceeded, the oldest
    /// playing grain gets stopped to make room for a new one.
    pub max_grains: usize,
    /// By default 2. Number of output channels grains get routed to via channel masks.
    pub output_channels: usize,
    /// By default 0 (disabled). When set, the synth publishes its grain clock under this id,
    /// so [`GrainSyncReader`](crate::GrainSyncReader)s can follow it.
    pub sync_id: u32,
    /// Power of two sized cosine table, used for trainlet synthesis.
    pub cosine: TableId,
    /// Grain phase offsets within a grain period. Default: no offsets.
    pub distribution: Option<TableId>,
    /// Rotating index table with per grain gains. Default: unity gain.
    pub gain_masks: Option<TableId>,
    /// Rotating index table with per grain channel masks. Default: first channel.
    pub channel_masks: Option<TableId>,
    /// Rotating index table with frequency sweep start scalers. Default: 1.
    pub sweep_starts: Option<TableId>,
    /// Rotating index table with frequency sweep end scalers. Default: 1.
    pub sweep_ends: Option<TableId>,
    /// Rotating index table with per grain FM indices. Default: 1.
    pub fm_indices: Option<TableId>,
    /// Rotating index table with rows of five gains, one for each wave slot.
    /// Default: all wavetable slots at half gain, no trainlets.
    pub wave_gains: Option<TableId>,
    /// Attack envelope. Default: constant 1.
    pub attack_envelope: Option<TableId>,
    /// Decay envelope. Default: constant 1.
    pub decay_envelope: Option<TableId>,
    /// Secondary envelope which spans the whole grain. Default: constant 1.
    pub secondary_envelope: Option<TableId>,
}

impl GrainSynthConfig {
    pub fn new(cosine: TableId) -> Self {
        Self {
            max_grains: 100,
            output_channels: 2,
            sync_id: 0,
            cosine,
            distribution: None,
            gain_masks: None,
            channel_masks: None,
            sweep_starts: None,
            sweep_ends: None,
            fm_indices: None,
            wave_gains: None,
            attack_envelope: None,
            decay_envelope: None,
            secondary_envelope: None,
        }
    }

    pub fn max_grains(mut self, max_grains: usize) -> Self {
        self.max_grains = max_grains;
        self
    }

    pub fn output_channels(mut self, channels: usize) -> Self {
        self.output_channels = channels;
        self
    }

    pub fn sync_id(mut self, id: u32) -> Self {
        self.sync_id = id;
        self
    }

    pub fn distribution(mut self, table: TableId) -> Self {
        self.distribution = Some(table);
        self
    }

    pub fn gain_masks(mut self, table: TableId) -> Self {
        self.gain_masks = Some(table);
        self
    }

    pub fn channel_masks(mut self, table: TableId) -> Self {
        self.channel_masks = Some(table);
        self
    }

    pub fn sweep_scalers(mut self, starts: TableId, ends: TableId) -> Self {
        self.sweep_starts = Some(starts);
        self.sweep_ends = Some(ends);
        self
    }

    pub fn fm_indices(mut self, table: TableId) -> Self {
        self.fm_indices = Some(table);
        self
    }

    pub fn wave_gains(mut self, table: TableId) -> Self {
        self.wave_gains = Some(table);
        self
    }

    pub fn envelopes(mut self, attack: TableId, decay: TableId) -> Self {
        self.attack_envelope = Some(attack);
        self.decay_envelope = Some(decay);
        self
    }

    pub fn secondary_envelope(mut self, table: TableId) -> Self {
        self.secondary_envelope = Some(table);
        self
    }

    /// Validate all settings which don't depend on tables.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_grains < 1 {
            return Err(Error::ParameterError(
                "Maximum number of grains needs to be non-zero and positive".to_string(),
            ));
        }
        if self.output_channels < 1 {
            return Err(Error::ParameterError(
                "Grain synths need at least one output channel".to_string(),
            ));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate() {
        let config = GrainSynthConfig::new(TableId(1));
        assert!(config.validate().is_ok());
        assert!(config.clone().max_grains(0).validate().is_err());
        assert!(config.clone().output_channels(0).validate().is_err());
        let config = config.sync_id(3).envelopes(TableId(2), TableId(3));
        assert_eq!(config.sync_id, 3);
        assert_eq!(config.decay_envelope, Some(TableId(3)));
    }
}
