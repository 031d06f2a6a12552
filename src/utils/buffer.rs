// -------------------------------------------------------------------------------------------------

/// Copy the given planar buffer into an interleaved one.
/// The planar buffer's layout defines layout of the interleaved buffer (channel and frame count).
pub fn planar_to_interleaved(planar: &[Vec<f32>], interleaved: &mut [f32]) {
    let channel_count = planar.len();
    match channel_count {
        0 => {}
        1 => {
            for (i, p) in interleaved.iter_mut().zip(planar[0].iter()) {
                *i = *p;
            }
        }
        2 => {
            for (frame, (l, r)) in interleaved
                .chunks_exact_mut(2)
                .zip(planar[0].iter().zip(planar[1].iter()))
            {
                frame[0] = *l;
                frame[1] = *r;
            }
        }
        _ => {
            for (frame_index, frame) in interleaved.chunks_exact_mut(channel_count).enumerate() {
                for (value, channel_values) in frame.iter_mut().zip(planar) {
                    *value = channel_values.get(frame_index).copied().unwrap_or(0.0);
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
