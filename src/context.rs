//! Engine wide state shared by all grain synths and sync readers.

use std::sync::Arc;

use crate::{
    sync::SyncRegistry,
    table::{DefaultTables, TableService},
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Shared engine context: audio settings, the host's table service, default tables and the
/// grain sync registry.
///
/// Create one context per audio engine and hand clones of it to all instances which should
/// share default tables and be able to sync to each other. Clones are cheap and refer to the
/// same shared state.
#[derive(Clone)]
pub struct GrainContext {
    sample_rate: u32,
    block_size: usize,
    tables: Arc<dyn TableService>,
    defaults: Arc<DefaultTables>,
    sync_registry: Arc<SyncRegistry>,
}

impl GrainContext {
    pub fn new(
        sample_rate: u32,
        block_size: usize,
        tables: Arc<dyn TableService>,
    ) -> Result<Self, Error> {
        if sample_rate == 0 {
            return Err(Error::ParameterError(
                "Sample rate needs to be non-zero".to_string(),
            ));
        }
        if block_size == 0 {
            return Err(Error::ParameterError(
                "Block size needs to be non-zero".to_string(),
            ));
        }
        log::debug!(
            "Creating new grain context with sample rate {sample_rate} and block size {block_size}"
        );
        Ok(Self {
            sample_rate,
            block_size,
            tables,
            defaults: Arc::new(DefaultTables::new()),
            sync_registry: Arc::new(SyncRegistry::new(block_size)),
        })
    }

    /// Audio sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames processed in one block.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// The host's table service.
    pub fn tables(&self) -> &dyn TableService {
        self.tables.as_ref()
    }

    /// Fallback tables for unset table selections.
    pub fn defaults(&self) -> &DefaultTables {
        &self.defaults
    }

    /// Registry of grain sync tables, keyed by sync id.
    pub fn sync_registry(&self) -> &SyncRegistry {
        &self.sync_registry
    }
}

// -------------------------------------------------------------------------------------------------
