use super::models::{BackendVolume, VolumeType};

pub const UNKNOWN_VOLUME: f64 = 1.0;

const CURVE_RATIO: f64 = 100.0;

pub fn to_fraction(volume: &BackendVolume) -> f64 {
    let span = volume.max - volume.min;
    if span <= 0.0 || !span.is_finite() {
        return 0.0;
    }

    let normalized = ((volume.value - volume.min) / span).clamp(0.0, 1.0);
    let linear = match volume.kind {
        VolumeType::Db if normalized > 0.0 => {
            (normalized * CURVE_RATIO.ln()).exp() / CURVE_RATIO
        }
        _ => normalized,
    };

    linear.clamp(0.0, 1.0)
}

pub fn to_raw(volume: &BackendVolume, fraction: f64) -> f64 {
    let linear = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let span = volume.max - volume.min;

    let position = match volume.kind {
        // fractions under 0.01 land on min
        VolumeType::Db if linear > 0.0 => {
            ((linear * CURVE_RATIO).ln() / CURVE_RATIO.ln()).max(0.0)
        }
        VolumeType::Db => 0.0,
        VolumeType::Linear => linear,
    };

    volume.min + position * span
}
