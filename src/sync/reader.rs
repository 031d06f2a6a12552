use std::sync::Arc;

use super::SyncTable;
use crate::{Error, GrainContext};

// -------------------------------------------------------------------------------------------------

/// Init time settings of a [`GrainSyncReader`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReaderConfig {
    /// Sync id of the grain synth to read from. Must be non-zero.
    pub id: u32,
    /// When set, the reader also outputs the writer's scheduler phase.
    pub emit_phase: bool,
}

impl SyncReaderConfig {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            emit_phase: false,
        }
    }

    pub fn with_phase_output(mut self) -> Self {
        self.emit_phase = true;
        self
    }
}

// -------------------------------------------------------------------------------------------------

/// Reads trigger pulses and scheduler phases of a grain synth with a sync id.
///
/// Readers consume the pulses: after reading, the writer's pulse row gets cleared.
pub struct GrainSyncReader {
    table: Arc<SyncTable>,
    pulses: Vec<f32>,
    phases: Option<Vec<f32>>,
}

impl GrainSyncReader {
    /// Create a new reader for an already existing grain synth with the given sync id.
    pub fn new(context: &GrainContext, config: SyncReaderConfig) -> Result<Self, Error> {
        if config.id == 0 {
            return Err(Error::InvalidSyncId);
        }
        let table = context
            .sync_registry()
            .find(config.id)
            .ok_or(Error::SyncIdNotFound(config.id))?;
        let block_size = context.block_size();
        log::debug!("Creating new grain sync reader for id {}", config.id);
        Ok(Self {
            table,
            pulses: vec![0.0; block_size],
            phases: config.emit_phase.then(|| vec![0.0; block_size]),
        })
    }

    /// Copy the writer's current block into the reader's outputs and consume its pulses.
    pub fn process(&mut self) {
        self.table.copy_pulses(&mut self.pulses);
        if let Some(phases) = &mut self.phases {
            self.table.copy_phases(phases);
        }
        self.table.clear_pulses();
    }

    /// Trigger pulses of the last processed block.
    pub fn pulses(&self) -> &[f32] {
        &self.pulses
    }

    /// Scheduler phases of the last processed block, if phase output is enabled.
    pub fn phases(&self) -> Option<&[f32]> {
        self.phases.as_deref()
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableRegistry;

    #[test]
    fn init_errors() -> Result<(), Box<Error>> {
        let context = GrainContext::new(48000, 8, Arc::new(TableRegistry::new()))?;
        assert!(matches!(
            GrainSyncReader::new(&context, SyncReaderConfig::new(0)),
            Err(Error::InvalidSyncId)
        ));
        assert!(matches!(
            GrainSyncReader::new(&context, SyncReaderConfig::new(5)),
            Err(Error::SyncIdNotFound(5))
        ));
        context.sync_registry().register(5);
        assert!(GrainSyncReader::new(&context, SyncReaderConfig::new(5)).is_ok());
        Ok(())
    }

    #[test]
    fn consumes_pulses() -> Result<(), Box<Error>> {
        let context = GrainContext::new(48000, 4, Arc::new(TableRegistry::new()))?;
        let table = context.sync_registry().register(9).unwrap();
        let mut reader =
            GrainSyncReader::new(&context, SyncReaderConfig::new(9).with_phase_output())?;
        table.set_pulse(2, 1.0);
        for (frame, phase) in [0.1, 0.2, 0.3, 0.4].into_iter().enumerate() {
            table.set_phase(frame, phase);
        }
        reader.process();
        assert_eq!(reader.pulses(), &[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(reader.phases(), Some([0.1, 0.2, 0.3, 0.4].as_slice()));
        assert_eq!(table.pulse(2), 0.0);

        reader.process();
        assert_eq!(reader.pulses(), &[0.0; 4]);
        Ok(())
    }
}
