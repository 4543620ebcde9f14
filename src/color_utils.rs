//! Color utility functions shared across the annotation model.
//!
//! Shapes take their display colors from an explicit per-class color map when
//! the user picked one, and otherwise from a color derived deterministically
//! from the label text, so the same class always renders the same way.

use crate::constants::FILL_ALPHA;

/// RGBA color with 8 bits per channel.
pub type Rgba = [u8; 4];

/// Number of distinct hues in the generated palette.
const PALETTE_SIZE: u64 = 36;

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// 64-bit FNV-1a hash. Stable across runs and platforms, unlike `DefaultHasher`.
fn fnv1a(text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    text.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// Generate the display color for a label: `hash(label) mod palette`.
///
/// The returned color is opaque; use [`fill_color`] for the translucent variant.
pub fn color_for_label(label: &str) -> Rgba {
    let slot = fnv1a(label) % PALETTE_SIZE;
    let hue = slot as f32 * (360.0 / PALETTE_SIZE as f32);
    let (r, g, b) = hsv_to_rgb(hue, 0.75, 0.95);
    [to_channel(r), to_channel(g), to_channel(b), 255]
}

/// Translucent variant of a line color used to fill the shape.
pub fn fill_color(line: Rgba) -> Rgba {
    [line[0], line[1], line[2], FILL_ALPHA]
}

fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
