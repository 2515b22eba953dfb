//! Turning escape values into colors.
//!
//! There are two ways to do it.  The standard palette cycles three
//! phase-shifted cosines through the iteration range and darkens
//! toward the cap.  The equalized palette ignores the raw iteration
//! value and instead asks what fraction of the escaped pixels escaped
//! at least as fast, so that every color band covers roughly the same
//! share of the image however the escape values happen to cluster.
//!
//! Either way, anything that never escaped is black.

use num::clamp;
use std::f64::consts::PI;

use histogram::Histogram;

const THIRD: f64 = 2.0 * PI / 3.0;

/// An 8-bit RGB triple.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// The color of points in the set.
pub const BLACK: Rgb = Rgb(0, 0, 0);

/// Knobs for the standard palette.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StandardPalette {
    /// How many times the hue wheel turns over the iteration range.
    pub cycles: f64,
    /// Exponent of the brightness falloff toward the cap.  Smaller
    /// values keep more of the image bright.
    pub gamma: f64,
}

impl Default for StandardPalette {
    fn default() -> Self {
        StandardPalette {
            cycles: 4.0,
            gamma: 0.4,
        }
    }
}

/// Which palette a render uses.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Coloring {
    /// Cyclic cosine palette over the raw escape value.
    Standard(StandardPalette),
    /// Cosine palette over the escape value's rank in the image.
    /// Needs the whole grid evaluated before any pixel is colored.
    Histogram,
}

impl Coloring {
    /// True if this palette has to see every escape value first.
    pub fn needs_histogram(&self) -> bool {
        match *self {
            Coloring::Histogram => true,
            Coloring::Standard(_) => false,
        }
    }

    /// The color of one escape value.  `histogram` is consulted only
    /// by the equalized palette.
    pub fn color(&self, result: f64, max_iterations: usize, histogram: Option<&Histogram>) -> Rgb {
        match *self {
            Coloring::Standard(ref palette) => standard(result, max_iterations, palette),
            Coloring::Histogram => equalized(result, max_iterations, histogram),
        }
    }
}

impl Default for Coloring {
    fn default() -> Self {
        Coloring::Histogram
    }
}

#[inline]
fn channel(value: f64) -> u8 {
    (255.0 * clamp(value, 0.0, 1.0)) as u8
}

/// The standard cyclic palette.
pub fn standard(result: f64, max_iterations: usize, palette: &StandardPalette) -> Rgb {
    if result >= max_iterations as f64 {
        return BLACK;
    }

    let t = result / (max_iterations as f64);
    let phase = t * palette.cycles * 2.0 * PI;
    let brightness = (1.0 - t).powf(palette.gamma);

    Rgb(
        channel(0.5 * (1.0 + phase.cos()) * brightness),
        channel(0.5 * (1.0 + (phase + THIRD).cos()) * brightness),
        channel(0.5 * (1.0 + (phase + 2.0 * THIRD).cos()) * brightness),
    )
}

/// The histogram-equalized palette.  Without a histogram, or with one
/// in which nothing escaped, every pixel is black.
pub fn equalized(result: f64, max_iterations: usize, histogram: Option<&Histogram>) -> Rgb {
    let histogram = match histogram {
        Some(h) if h.total() > 0 => h,
        _ => return BLACK,
    };
    if result >= max_iterations as f64 {
        return BLACK;
    }

    let p = histogram.cumulative(result) as f64 / histogram.total() as f64;

    // One broad cycle with two finer ones layered over it.
    let primary = p * 8.0 * PI;
    let secondary = p * 16.0 * PI;
    let tertiary = p * 32.0 * PI;

    let r = 0.5 * (1.0 + 0.8 * primary.cos() + 0.3 * secondary.cos());
    let g = 0.5 * (1.0 + 0.8 * (primary + THIRD).cos() + 0.3 * secondary.sin());
    let b = 0.5 * (1.0 + 0.8 * (primary + 2.0 * THIRD).cos() + 0.3 * tertiary.cos());

    let brightness = 0.3 + 0.7 * p.powf(0.8);

    Rgb(
        channel(r * brightness),
        channel(g * brightness),
        channel(b * brightness),
    )
}
