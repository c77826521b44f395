// Math utilities for raw axis samples

/// Default dead zone, in normalized units
pub const DEFAULT_DEAD_ZONE: f32 = 0.1;

/// Normalize a signed 16-bit axis sample to `-1.0..=1.0`
///
/// The signed range is asymmetric, so negative samples are divided by `0x8000`
/// and non-negative ones by `0x7FFF`: both extremes map to exactly -1 and 1.
pub fn normalize_axis(raw: i16) -> f32 {
    if raw < 0 {
        f32::from(raw) / 32768.0
    } else {
        f32::from(raw) / 32767.0
    }
}

/// Normalize a signed 16-bit axis sample to `0.0..=1.0`
pub fn normalize_half_axis(raw: i16) -> f32 {
    // 0..=0xFFFF is exactly representable in f32
    (i32::from(raw) + 0x8000) as f32 / 65535.0
}

/// Force values strictly inside `(-threshold, threshold)` to exactly zero
pub fn apply_dead_zone(value: f32, threshold: f32) -> f32 {
    if value > -threshold && value < threshold {
        0.0
    } else {
        value
    }
}

/// Clamp a value between min and max
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
