#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod context;
mod error;
mod grain;
mod opcode;
mod random;
mod renderer;
mod scheduler;
mod sync;
mod synth;
mod table;

// public, flat re-exports
pub use error::{Error, GrainError};

pub use context::GrainContext;

pub use grain::WaveSlot;

pub use opcode::{GrainOpcode, OpcodeConfig};

pub use random::{default_random_source, RandomSource};

pub use scheduler::BlockStats;

pub use sync::{GrainSyncReader, SyncReaderConfig, SyncRegistry, SyncTable};

pub use synth::{BlockInputs, GrainControls, GrainSynth, GrainSynthConfig, Signal};

pub use table::{DefaultTables, FunctionTable, TableId, TableRegistry, TableService};

// public mods
pub mod parameter;
pub mod utils;
