use std::{error, fmt};

use crate::grain::WaveSlot;

// -------------------------------------------------------------------------------------------------

/// Provides an enumeration of all possible errors reported by grainwave.
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A required table could not be resolved by the table service.
    TableNotFound(&'static str),
    /// A table exists, but can't be used for the requested purpose.
    InvalidTable(String),
    ParameterError(String),
    /// A sync reader references an id no grain synth registered.
    SyncIdNotFound(u32),
    /// Sync readers need a non zero sync id.
    InvalidSyncId,
    GrainError(GrainError),
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableNotFound(name) => write!(f, "Unable to load {name} table"),
            Self::InvalidTable(str) => write!(f, "Invalid table: {str}"),
            Self::ParameterError(str) => write!(f, "Invalid parameter: {str}"),
            Self::SyncIdNotFound(id) => write!(f, "Could not find grain sync id {id}"),
            Self::InvalidSyncId => write!(f, "Grain sync id needs to be a non-zero integer"),
            Self::GrainError(err) => err.fmt(f),
        }
    }
}

impl From<GrainError> for Error {
    fn from(err: GrainError) -> Error {
        Error::GrainError(err)
    }
}

// -------------------------------------------------------------------------------------------------

/// Errors which cancel a single grain while scheduling. They never stop block processing.
///
/// Unlike [`Error`] this type is `Copy` and never allocates, so it can be passed around freely
/// in the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrainError {
    /// The channel mask resolved to an output channel which does not exist.
    InvalidChannel { channel: usize, channel_count: usize },
    /// The waveform table selected for the given slot could not be resolved.
    WaveformTableNotFound(WaveSlot),
    /// The FM envelope table selected for the current block could not be resolved.
    FmEnvelopeTableNotFound,
}

impl error::Error for GrainError {}

impl fmt::Display for GrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel {
                channel,
                channel_count,
            } => write!(
                f,
                "Channel mask specifies non-existing output channel {channel} (have {channel_count})"
            ),
            Self::WaveformTableNotFound(slot) => {
                write!(f, "Unable to load waveform table for slot '{slot}'")
            }
            Self::FmEnvelopeTableNotFound => write!(f, "Unable to load FM envelope table"),
        }
    }
}
