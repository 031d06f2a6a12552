//! Per grain synthesis: oscillators, frequency sweeps, FM, envelopes and channel routing.

use assume::assume;

use crate::{
    grain::{Grain, Oscillator, WaveSlot},
    table::FunctionTable,
};

// -------------------------------------------------------------------------------------------------

/// Tables and inputs which are shared by all grains rendered in a block.
pub(crate) struct RenderContext<'a> {
    pub block_len: usize,
    pub attack: &'a FunctionTable,
    pub decay: &'a FunctionTable,
    pub secondary: &'a FunctionTable,
    pub cosine: &'a FunctionTable,
    pub fm: Option<&'a [f32]>,
}

// -------------------------------------------------------------------------------------------------

/// Render the grain's current block window and mix it into the output buffers.
///
/// `scratch` must be zeroed and at least `block_len` long. It gets zeroed again before
/// returning. Grains must have been routed to existing output channels.
pub(crate) fn render_grain(
    grain: &mut Grain,
    context: &RenderContext,
    scratch: &mut [f32],
    outputs: &mut [Vec<f32>],
) {
    let stop = grain.stop.min(context.block_len).min(scratch.len());
    let start = grain.start;
    if start >= stop {
        return;
    }
    let scratch = &mut scratch[start..stop];
    let fm = context.fm.map(|fm| fm.get(start..stop).unwrap_or(&[]));
    let fm_envelope = grain.fm_envelope.as_deref();
    let fm_index = grain.fm_index as f64;
    let envelope_phase = grain.envelope.phase;
    let envelope_increment = grain.envelope.increment;

    // FM depth at the given offset into the grain's block window
    let fm_amount = |offset: usize| -> f64 {
        match (fm, fm_envelope) {
            (Some(fm), Some(envelope)) => {
                let phase = envelope_phase + offset as f64 * envelope_increment;
                fm.get(offset).copied().unwrap_or(0.0) as f64
                    * fm_index
                    * envelope.lookup_normalized(phase) as f64
            }
            (Some(fm), None) => fm.get(offset).copied().unwrap_or(0.0) as f64 * fm_index,
            _ => 0.0,
        }
    };

    for (slot, oscillator) in grain.oscillators.iter_mut().enumerate() {
        let Oscillator {
            table,
            phase,
            delta,
            sweep,
            gain,
        } = oscillator;
        let Some(table) = table.as_deref() else {
            continue;
        };
        if slot == WaveSlot::Trainlet as usize {
            let shape = grain.trainlet;
            let cosine = context.cosine;
            for (offset, output) in scratch.iter_mut().enumerate() {
                if *phase >= 1.0 || *phase < 0.0 {
                    *phase = phase.rem_euclid(1.0);
                }
                let value = shape.sample(*phase, |fixed| cosine.lookup_fixed(fixed) as f64);
                *output += (value * *gain as f64) as f32;
                *phase += *delta + *delta * fm_amount(offset);
                *delta = sweep.apply(*delta);
            }
        } else {
            let table_len = table.len() as f64;
            for (offset, output) in scratch.iter_mut().enumerate() {
                if *phase >= table_len || *phase < 0.0 {
                    *phase = phase.rem_euclid(table_len);
                }
                *output += table.lookup_wrapped(*phase) * *gain;
                *phase += *delta + *delta * fm_amount(offset);
                *delta = sweep.apply(*delta);
            }
        }
    }

    let routing = grain.routing;
    assume!(unsafe: routing.primary < outputs.len(), "Channel routing was validated");
    assume!(unsafe: routing.secondary < outputs.len(), "Channel routing was validated");
    for (offset, sample) in scratch.iter_mut().enumerate() {
        let gain = grain
            .envelope
            .next_gain(context.attack, context.decay, context.secondary);
        let output = *sample * gain;
        *sample = 0.0;
        let frame = start + offset;
        if let Some(out) = outputs[routing.primary].get_mut(frame) {
            *out += output * routing.primary_gain;
        }
        if let Some(out) = outputs[routing.secondary].get_mut(frame) {
            *out += output * routing.secondary_gain;
        }
    }
}
