use crate::{
    BlockInputs, BlockStats, Error, GrainContext, GrainControls, GrainSyncReader, GrainSynth,
    GrainSynthConfig, SyncReaderConfig,
};

// -------------------------------------------------------------------------------------------------

/// Init time settings of a [`GrainOpcode`].
#[derive(Debug, Clone, PartialEq)]
pub enum OpcodeConfig {
    Synth(GrainSynthConfig),
    SyncReader(SyncReaderConfig),
}

impl From<GrainSynthConfig> for OpcodeConfig {
    fn from(config: GrainSynthConfig) -> Self {
        Self::Synth(config)
    }
}

impl From<SyncReaderConfig> for OpcodeConfig {
    fn from(config: SyncReaderConfig) -> Self {
        Self::SyncReader(config)
    }
}

// -------------------------------------------------------------------------------------------------

/// A unified [`GrainSynth`] and [`GrainSyncReader`], for hosts which drive all grain instances
/// through the same init and perform entry points.
///
/// Within a block pass, hosts must perform sync writing synths before the readers which
/// follow them.
pub enum GrainOpcode {
    Synth(Box<GrainSynth>),
    SyncReader(GrainSyncReader),
}

impl GrainOpcode {
    /// Create a new instance. Nothing gets created when the configuration or a table it
    /// references is invalid.
    pub fn init<C: Into<OpcodeConfig>>(context: &GrainContext, config: C) -> Result<Self, Error> {
        match config.into() {
            OpcodeConfig::Synth(config) => Ok(Self::Synth(Box::new(GrainSynth::new(
                context, &config,
            )?))),
            OpcodeConfig::SyncReader(config) => {
                Ok(Self::SyncReader(GrainSyncReader::new(context, config)?))
            }
        }
    }

    /// Process a single block. Sync readers ignore the controls and inputs and always return
    /// empty stats.
    pub fn perform(
        &mut self,
        controls: &GrainControls,
        inputs: &BlockInputs,
    ) -> Result<BlockStats, Error> {
        match self {
            GrainOpcode::Synth(synth) => synth.process(controls, inputs),
            GrainOpcode::SyncReader(reader) => {
                reader.process();
                Ok(BlockStats::default())
            }
        }
    }

    /// Number of output rows: the synth's channels, or the reader's pulse and optional phase rows.
    pub fn output_count(&self) -> usize {
        match self {
            GrainOpcode::Synth(synth) => synth.outputs().len(),
            GrainOpcode::SyncReader(reader) => 1 + reader.phases().map_or(0, |_| 1),
        }
    }

    /// Output row of the last performed block.
    pub fn output(&self, index: usize) -> Option<&[f32]> {
        match self {
            GrainOpcode::Synth(synth) => synth.output(index),
            GrainOpcode::SyncReader(reader) => match index {
                0 => Some(reader.pulses()),
                1 => reader.phases(),
                _ => None,
            },
        }
    }
}

// -------------------------------------------------------------------------------------------------
