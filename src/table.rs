//! Read-only function tables and the table service grain synths resolve them from.

use std::{collections::HashMap, f64::consts::PI, fmt::Debug, sync::Arc};

use assume::assume;

use crate::Error;

// -------------------------------------------------------------------------------------------------

mod defaults;

pub use defaults::DefaultTables;

// -------------------------------------------------------------------------------------------------

/// Identifies a table within a [`TableService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

// -------------------------------------------------------------------------------------------------

/// Resolves [`TableId`]s to shared, read-only tables.
///
/// Implemented by the host. Lookups happen in the audio thread once per block for waveform
/// and FM envelope tables, so implementations must not block or allocate in `find`.
pub trait TableService: Send + Sync {
    /// Resolve the given table id. Returns `None` when there's no such table.
    fn find(&self, id: TableId) -> Option<Arc<FunctionTable>>;
}

// -------------------------------------------------------------------------------------------------

/// Simple [`TableService`] impl which holds tables in a hash map.
#[derive(Debug, Default, Clone)]
pub struct TableRegistry {
    tables: HashMap<TableId, Arc<FunctionTable>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table with the given id.
    pub fn insert(&mut self, id: TableId, table: FunctionTable) {
        self.tables.insert(id, Arc::new(table));
    }

    /// Builder style [`Self::insert`].
    pub fn with_table(mut self, id: TableId, table: FunctionTable) -> Self {
        self.insert(id, table);
        self
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableService for TableRegistry {
    fn find(&self, id: TableId) -> Option<Arc<FunctionTable>> {
        self.tables.get(&id).cloned()
    }
}

// -------------------------------------------------------------------------------------------------

/// A read-only table of `length` values, followed by one guard sample for interpolation.
///
/// Tables with a power of two length additionally provide a `low_bits` shift, which maps a
/// 32-bit fixed point phase directly to a table index. Tables used as "rotating index" tables
/// declare their valid index range in the first two cells, followed by the actual values.
#[derive(Clone, PartialEq)]
pub struct FunctionTable {
    data: Box<[f32]>,
    length: usize,
    low_bits: Option<u32>,
}

impl Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTable")
            .field("length", &self.length)
            .field("low_bits", &self.low_bits)
            .finish()
    }
}

impl FunctionTable {
    /// Create a periodic table: the guard sample repeats the first value, so interpolated
    /// lookups wrap around smoothly. Use this for waveforms.
    pub fn new(values: Vec<f32>) -> Result<Self, Error> {
        let guard = values.first().copied();
        Self::with_guard(values, guard)
    }

    /// Create a table whose guard sample repeats the last value. Use this for envelopes and
    /// other non periodic shapes.
    pub fn with_extended_guard(values: Vec<f32>) -> Result<Self, Error> {
        let guard = values.last().copied();
        Self::with_guard(values, guard)
    }

    /// Create a periodic table of the given length from a function which receives the normalized
    /// table position in range `[0, 1)`.
    pub fn from_fn<F: Fn(f64) -> f32>(length: usize, f: F) -> Result<Self, Error> {
        Self::new(
            (0..length)
                .map(|index| f(index as f64 / length as f64))
                .collect(),
        )
    }

    /// A single period of a cosine wave. Trainlet synthesis needs this with a power of two length.
    pub fn cosine(length: usize) -> Result<Self, Error> {
        Self::from_fn(length, |phase| (2.0 * PI * phase).cos() as f32)
    }

    /// A single period of a sine wave.
    pub fn sine(length: usize) -> Result<Self, Error> {
        Self::from_fn(length, |phase| (2.0 * PI * phase).sin() as f32)
    }

    fn with_guard(values: Vec<f32>, guard: Option<f32>) -> Result<Self, Error> {
        match guard {
            Some(guard) => Ok(Self::from_parts(values, guard)),
            None => Err(Error::InvalidTable("Tables need at least one value".to_string())),
        }
    }

    /// Create a table from non empty values and the given guard sample.
    pub(crate) fn from_parts(mut values: Vec<f32>, guard: f32) -> Self {
        debug_assert!(!values.is_empty(), "Tables need at least one value");
        let length = values.len();
        let low_bits = if length >= 2 && length.is_power_of_two() && length <= 1 << 31 {
            Some(u32::BITS - length.trailing_zeros())
        } else {
            None
        };
        values.push(guard);
        Self {
            data: values.into_boxed_slice(),
            length,
            low_bits,
        }
    }

    /// Number of values in the table, excluding the guard sample.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Tables are never empty. Present for API completeness only.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Table values, excluding the guard sample.
    pub fn values(&self) -> &[f32] {
        &self.data[..self.length]
    }

    /// Shift which maps a 32-bit fixed point phase to a table index.
    /// Only available for power of two table lengths.
    pub fn low_bits(&self) -> Option<u32> {
        self.low_bits
    }

    /// Raw value at the given index (guard sample included). Out of bounds reads return 0.
    #[inline]
    pub fn value(&self, index: usize) -> f32 {
        self.data.get(index).copied().unwrap_or(0.0)
    }

    /// Linear interpolated lookup with a table-length scaled phase in range `[0, length)`.
    #[inline]
    pub fn lookup_wrapped(&self, phase: f64) -> f32 {
        debug_assert!(phase >= 0.0, "Phase must be wrapped");
        let x0 = (phase as usize).min(self.length - 1);
        let frac = (phase - x0 as f64) as f32;
        assume!(unsafe: x0 + 1 < self.data.len(), "Guard sample is always present");
        let a = self.data[x0];
        let b = self.data[x0 + 1];
        a + (b - a) * frac
    }

    /// Linear interpolated lookup with a normalized phase. Phase `0.0` reads the first, phase
    /// `1.0` reads the last value of the table. Out of range phases are clamped.
    #[inline]
    pub fn lookup_normalized(&self, phase: f64) -> f32 {
        let position = phase.clamp(0.0, 1.0) * (self.length - 1) as f64;
        let x0 = (position as usize).min(self.length - 1);
        let frac = (position - x0 as f64) as f32;
        assume!(unsafe: x0 + 1 < self.data.len(), "Guard sample is always present");
        let a = self.data[x0];
        let b = self.data[x0 + 1];
        a + (b - a) * frac
    }

    /// Linear interpolated lookup with a 32-bit fixed point phase, where `u32::MAX` is
    /// (almost) a full table period.
    ///
    /// Must only be called on power of two sized tables (see [`Self::low_bits`]).
    #[inline]
    pub fn lookup_fixed(&self, phase: u32) -> f32 {
        debug_assert!(self.low_bits.is_some(), "Need a power of two sized table");
        let shift = self.low_bits.unwrap_or(u32::BITS - 1);
        let mask = (1u32 << shift) - 1;
        let index = (phase >> shift) as usize;
        let frac = (phase & mask) as f32 / (1u64 << shift) as f32;
        assume!(unsafe: index + 1 < self.data.len(), "Index is bound by low_bits");
        let a = self.data[index];
        let b = self.data[index + 1];
        a + (b - a) * frac
    }

    /// Valid index range of a rotating index table, as declared in its first two cells.
    #[inline]
    pub fn declared_bounds(&self) -> (usize, usize) {
        // negative or NaN bounds saturate to 0
        (self.value(0) as usize, self.value(1) as usize)
    }

    /// Value of a rotating index table at the given row and column.
    #[inline]
    pub fn row_value(&self, row: usize, stride: usize, column: usize) -> f32 {
        self.value(2 + row * stride + column)
    }
}

// -------------------------------------------------------------------------------------------------

/// A read cursor into a rotating index table.
///
/// The table's declared bounds are re-read on every access, as they may change at any time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RotatingIndex(usize);

impl RotatingIndex {
    pub fn new() -> Self {
        Self(0)
    }

    /// Returns the current row and advances the cursor. The cursor gets reset to the declared
    /// lower bound when it's outside of the table's declared bounds.
    #[inline]
    pub fn next_row(&mut self, table: &FunctionTable) -> usize {
        let (low, high) = table.declared_bounds();
        if self.0 > high || self.0 < low {
            self.0 = low;
        }
        let row = self.0;
        self.0 += 1;
        row
    }

    /// Reads the current value from a table with one value per row and advances the cursor.
    #[inline]
    pub fn next_value(&mut self, table: &FunctionTable) -> f32 {
        let row = self.next_row(table);
        table.row_value(row, 1, 0)
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_points() -> Result<(), Box<Error>> {
        let periodic = FunctionTable::new(vec![0.0, 1.0, 2.0, 3.0])?;
        assert_eq!(periodic.len(), 4);
        assert_eq!(periodic.value(4), 0.0);
        assert_eq!(periodic.low_bits(), Some(30));

        let extended = FunctionTable::with_extended_guard(vec![0.0, 1.0, 2.0])?;
        assert_eq!(extended.value(3), 2.0);
        assert_eq!(extended.low_bits(), None);

        assert!(FunctionTable::new(vec![]).is_err());
        Ok(())
    }

    #[test]
    fn interpolated_lookups() -> Result<(), Box<Error>> {
        let table = FunctionTable::with_extended_guard(vec![0.0, 1.0, 2.0, 3.0, 4.0])?;
        assert_eq!(table.lookup_normalized(0.0), 0.0);
        assert_eq!(table.lookup_normalized(1.0), 4.0);
        assert_eq!(table.lookup_normalized(0.5), 2.0);
        assert_eq!(table.lookup_normalized(0.125), 0.5);
        assert_eq!(table.lookup_normalized(7.0), 4.0);

        let table = FunctionTable::new(vec![0.0, 1.0, 0.0, -1.0])?;
        assert_eq!(table.lookup_wrapped(0.5), 0.5);
        assert_eq!(table.lookup_wrapped(3.5), -0.5);
        assert_eq!(table.lookup_fixed(0), 0.0);
        assert_eq!(table.lookup_fixed(1 << 30), 1.0);
        assert_eq!(table.lookup_fixed(3 << 29), 0.5);
        Ok(())
    }

    #[test]
    fn cosine_lookup() -> Result<(), Box<Error>> {
        let table = FunctionTable::cosine(4096)?;
        for step in 0..64u64 {
            let phase = step as f64 / 64.0 + 0.003;
            let fixed = (phase * u32::MAX as f64) as u32;
            let expected = (2.0 * PI * phase).cos();
            assert!((table.lookup_fixed(fixed) as f64 - expected).abs() < 1e-5);
        }
        Ok(())
    }

    #[test]
    fn rotating_index() -> Result<(), Box<Error>> {
        // bounds 1..=2, values 10, 20, 30
        let table = FunctionTable::new(vec![1.0, 2.0, 10.0, 20.0, 30.0])?;
        let mut index = RotatingIndex::new();
        let values = (0..5).map(|_| index.next_value(&table)).collect::<Vec<_>>();
        assert_eq!(values, vec![20.0, 30.0, 20.0, 30.0, 20.0]);

        // bounds beyond the table's content read zeros instead of panicking
        let table = FunctionTable::new(vec![0.0, 8.0, 1.0])?;
        let mut index = RotatingIndex::new();
        assert_eq!(index.next_value(&table), 1.0);
        assert_eq!(index.next_value(&table), 0.0);
        Ok(())
    }

    #[test]
    fn registry() -> Result<(), Box<Error>> {
        let registry = TableRegistry::new().with_table(TableId(1), FunctionTable::sine(16)?);
        assert!(registry.find(TableId(1)).is_some());
        assert!(registry.find(TableId(2)).is_none());
        Ok(())
    }
}
