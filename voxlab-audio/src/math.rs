//! Sample-level buffer math: peak normalization and wet/dry mixing

use crate::buffer::AudioBuffer;

/// Scale a buffer so its loudest sample reaches `target_peak`
///
/// Silence (peak of zero) has nothing to normalize against and is returned
/// unchanged, sharing storage with the input.
pub fn normalize(buffer: &AudioBuffer, target_peak: f32) -> AudioBuffer {
    let peak = buffer.peak();
    if peak == 0.0 {
        return buffer.clone();
    }

    let gain = target_peak / peak;
    buffer.map_samples(|s| s * gain)
}

/// Linear cross-fade between a dry and a wet buffer
///
/// `wet_amount <= 0` returns `dry` and `wet_amount >= 1` returns `wet`, both
/// without copying. In between, the result is as long as the shorter input
/// (the longer one is truncated, a known approximation) and as wide as the
/// wider one. A buffer with fewer channels contributes its last channel to
/// the extra outputs. The sample rate is taken from `dry`.
pub fn mix(dry: &AudioBuffer, wet: &AudioBuffer, wet_amount: f32) -> AudioBuffer {
    if !(wet_amount > 0.0) {
        return dry.clone();
    }
    if wet_amount >= 1.0 {
        return wet.clone();
    }

    let dry_amount = 1.0 - wet_amount;
    let frames = dry.len().min(wet.len());
    let channels = dry.num_channels().max(wet.num_channels());

    let mixed: Vec<Vec<f32>> = (0..channels)
        .map(|ch| {
            let dry_data = dry.channel(ch);
            let wet_data = wet.channel(ch);
            (0..frames)
                .map(|i| dry_data[i] * dry_amount + wet_data[i] * wet_amount)
                .collect()
        })
        .collect();

    // Channel count >= 1, equal lengths and a valid rate are all inherited
    // from the inputs, so construction cannot fail.
    AudioBuffer::new(mixed, dry.sample_rate()).unwrap_or_else(|_| dry.clone())
}
