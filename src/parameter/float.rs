use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterScaling, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f32>,
    default: f32,
    scaling: ParameterScaling,
    unit: &'static str,
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<f32>,
        default: f32,
    ) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            scaling: ParameterScaling::Linear,
            unit: "",
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// Optional scaling, applied when converting normalized values.
    pub const fn with_scaling(mut self, scaling: ParameterScaling) -> Self {
        scaling.validate();
        self.scaling = scaling;
        self
    }

    /// The parameter's id.
    pub const fn id(&self) -> FourCC {
        self.id
    }

    /// The parameter's value range.
    pub fn range(&self) -> &RangeInclusive<f32> {
        &self.range
    }

    /// The parameter's default value.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// The parameter's normalized value scaling.
    pub fn scaling(&self) -> ParameterScaling {
        self.scaling
    }

    /// Clamp the given plain value to the parameter's range.
    pub fn clamp_value(&self, value: f32) -> f32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: f32) -> f32 {
        let (start, end) = (*self.range.start(), *self.range.end());
        let linear = ((self.clamp_value(value) - start) / (end - start)).clamp(0.0, 1.0);
        self.scaling.unscale(linear)
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f32) -> f32 {
        let (start, end) = (*self.range.start(), *self.range.end());
        start + self.scaling.scale(normalized.clamp(0.0, 1.0)) * (end - start)
    }

    /// Convert the given plain value to a string.
    pub fn value_to_string(&self, value: f32, include_unit: bool) -> String {
        if include_unit && !self.unit.is_empty() {
            format!("{:.2} {}", value, self.unit)
        } else {
            format!("{:.2}", value)
        }
    }

    /// Resolve a plain or normalized update to a plain, clamped value.
    pub fn update_value(&self, update: &ParameterValueUpdate) -> f32 {
        match update {
            ParameterValueUpdate::Plain(value) => self.clamp_value(*value),
            ParameterValueUpdate::Normalized(normalized) => self.denormalize_value(*normalized),
        }
    }

    /// Wrap the descriptor into a boxed [`Parameter`].
    pub fn into_box(self) -> Box<dyn Parameter> {
        Box::new(self)
    }

    /// Convert the given string to a plain, clamped value.
    pub fn string_to_value(&self, string: &str) -> Option<f32> {
        let value = string
            .trim()
            .trim_end_matches(self.unit)
            .trim()
            .parse::<f32>()
            .ok()?;
        Some(self.clamp_value(value))
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn default_normalized_value(&self) -> f32 {
        self.normalize_value(self.default)
    }

    fn normalized_value_to_string(&self, normalized: f32, include_unit: bool) -> String {
        self.value_to_string(self.denormalize_value(normalized), include_unit)
    }

    fn string_to_normalized_value(&self, string: &str) -> Option<f32> {
        let value = self.string_to_value(string)?;
        Some(self.normalize_value(value))
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: FloatParameter =
        FloatParameter::new(FourCC(*b"test"), "Duration", 0.0..=1000.0, 50.0)
            .with_unit("ms")
            .with_scaling(ParameterScaling::Exponential(2.0));

    #[test]
    fn conversions() {
        assert_eq!(DURATION.default_value(), 50.0);
        assert_eq!(DURATION.denormalize_value(0.5), 250.0);
        assert_eq!(DURATION.normalize_value(250.0), 0.5);
        assert_eq!(DURATION.denormalize_value(2.0), 1000.0);
        assert_eq!(DURATION.normalize_value(-10.0), 0.0);

        assert_eq!(DURATION.value_to_string(12.345, true), "12.35 ms");
        assert_eq!(DURATION.string_to_value(" 20 ms"), Some(20.0));
        assert_eq!(DURATION.string_to_value("2000"), Some(1000.0));
        assert_eq!(DURATION.string_to_value("fast"), None);

        let normalized = DURATION.string_to_normalized_value("250").unwrap();
        assert_eq!(DURATION.normalized_value_to_string(normalized, false), "250.00");
    }
}
