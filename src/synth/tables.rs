use std::sync::Arc;

use super::{GrainControls, GrainSynthConfig};
use crate::{
    grain::WaveSlot,
    table::{FunctionTable, TableId},
    Error, GrainContext,
};

// -------------------------------------------------------------------------------------------------

/// Tables a grain synth resolves once at init time.
pub(crate) struct SynthTables {
    pub distribution: Arc<FunctionTable>,
    pub gain_masks: Arc<FunctionTable>,
    pub channel_masks: Arc<FunctionTable>,
    pub sweep_starts: Arc<FunctionTable>,
    pub sweep_ends: Arc<FunctionTable>,
    pub fm_indices: Arc<FunctionTable>,
    pub wave_gains: Arc<FunctionTable>,
    pub attack: Arc<FunctionTable>,
    pub decay: Arc<FunctionTable>,
    pub secondary: Arc<FunctionTable>,
    pub cosine: Arc<FunctionTable>,
}

impl SynthTables {
    pub fn resolve(context: &GrainContext, config: &GrainSynthConfig) -> Result<Self, Error> {
        let defaults = context.defaults();
        let resolve = |id: Option<TableId>, default: &Arc<FunctionTable>, name: &'static str| {
            match id {
                Some(id) => context.tables().find(id).ok_or(Error::TableNotFound(name)),
                None => Ok(Arc::clone(default)),
            }
        };
        let cosine = context
            .tables()
            .find(config.cosine)
            .ok_or(Error::TableNotFound("cosine"))?;
        if cosine.low_bits().is_none() {
            return Err(Error::InvalidTable(format!(
                "Cosine table needs a power of two length, but has {} values",
                cosine.len()
            )));
        }
        Ok(Self {
            distribution: resolve(config.distribution, defaults.zeros(), "distribution")?,
            gain_masks: resolve(config.gain_masks, defaults.unity_row(), "gain mask")?,
            channel_masks: resolve(config.channel_masks, defaults.zeros(), "channel mask")?,
            sweep_starts: resolve(config.sweep_starts, defaults.unity_row(), "sweep start")?,
            sweep_ends: resolve(config.sweep_ends, defaults.unity_row(), "sweep end")?,
            fm_indices: resolve(config.fm_indices, defaults.unity_row(), "FM index")?,
            wave_gains: resolve(config.wave_gains, defaults.wave_gains(), "wave gain")?,
            attack: resolve(config.attack_envelope, defaults.ones(), "attack envelope")?,
            decay: resolve(config.decay_envelope, defaults.ones(), "decay envelope")?,
            secondary: resolve(config.secondary_envelope, defaults.ones(), "secondary envelope")?,
            cosine,
        })
    }
}

// -------------------------------------------------------------------------------------------------

/// Tables a grain synth resolves at the start of every block.
///
/// Unresolvable tables are kept as `None`: grains which need them get dropped with an error,
/// while all other grains continue to play.
#[derive(Default)]
pub(crate) struct BlockTables {
    pub waveforms: [Option<Arc<FunctionTable>>; WaveSlot::WAVETABLE_COUNT],
    pub fm_envelope: Option<Arc<FunctionTable>>,
}

impl BlockTables {
    pub fn resolve(&mut self, context: &GrainContext, controls: &GrainControls) {
        let defaults = context.defaults();
        for (waveform, id) in self.waveforms.iter_mut().zip(controls.waveforms) {
            *waveform = match id {
                Some(id) => context.tables().find(id),
                None => Some(Arc::clone(defaults.zeros())),
            };
        }
        self.fm_envelope = match controls.fm_envelope {
            Some(id) => context.tables().find(id),
            None => Some(Arc::clone(defaults.ones())),
        };
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableRegistry;

    #[test]
    fn init_tables() -> Result<(), Box<Error>> {
        let registry = TableRegistry::new()
            .with_table(TableId(1), FunctionTable::cosine(1024)?)
            .with_table(TableId(2), FunctionTable::cosine(1000)?);
        let context = GrainContext::new(48000, 64, Arc::new(registry))?;

        let tables = SynthTables::resolve(&context, &GrainSynthConfig::new(TableId(1)))?;
        assert!(Arc::ptr_eq(&tables.attack, context.defaults().ones()));
        assert!(Arc::ptr_eq(&tables.wave_gains, context.defaults().wave_gains()));

        assert!(matches!(
            SynthTables::resolve(&context, &GrainSynthConfig::new(TableId(2))),
            Err(Error::InvalidTable(_))
        ));
        assert!(matches!(
            SynthTables::resolve(&context, &GrainSynthConfig::new(TableId(3))),
            Err(Error::TableNotFound("cosine"))
        ));
        assert!(matches!(
            SynthTables::resolve(
                &context,
                &GrainSynthConfig::new(TableId(1)).gain_masks(TableId(9))
            ),
            Err(Error::TableNotFound("gain mask"))
        ));
        Ok(())
    }

    #[test]
    fn block_tables() -> Result<(), Box<Error>> {
        let registry = TableRegistry::new().with_table(TableId(1), FunctionTable::sine(64)?);
        let context = GrainContext::new(48000, 64, Arc::new(registry))?;
        let mut tables = BlockTables::default();
        let mut controls = GrainControls::default();
        controls.waveforms[0] = Some(TableId(1));
        controls.waveforms[1] = Some(TableId(2));
        tables.resolve(&context, &controls);
        assert_eq!(tables.waveforms[0].as_ref().map(|t| t.len()), Some(64));
        assert!(tables.waveforms[1].is_none());
        assert!(tables.waveforms[2].is_some());
        assert!(tables.fm_envelope.is_some());
        Ok(())
    }
}
