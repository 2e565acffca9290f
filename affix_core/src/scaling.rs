//! ScalingCurve - level to power position, and fuzzed roll windows
//!
//! Power position is the 0-1 placement of a roll inside an affix's effect
//! range. Fuzz widens that point into a window so that two items generated at
//! the same level still roll differently.

use serde::{Deserialize, Serialize};

/// Shape applied to the normalized level before it becomes a power position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurveShape {
    /// Identity
    Linear,
    /// `x^exponent`; exponents below 1 front-load power, above 1 back-load it
    Power { exponent: f64 },
    /// Hermite smoothstep `3x^2 - 2x^3`
    SmoothStep,
    /// Piecewise-linear interpolation through `[x, y]` points
    Points { points: Vec<[f64; 2]> },
}

impl CurveShape {
    /// Apply the curve to an already-normalized input, result clamped to [0, 1]
    pub fn apply(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        let y = match self {
            CurveShape::Linear => x,
            CurveShape::Power { exponent } => {
                if *exponent <= 0.0 {
                    tracing::warn!(exponent, "non-positive curve exponent, using linear");
                    x
                } else {
                    x.powf(*exponent)
                }
            }
            CurveShape::SmoothStep => x * x * (3.0 - 2.0 * x),
            CurveShape::Points { points } => interpolate(points, x),
        };
        if y.is_finite() {
            y.clamp(0.0, 1.0)
        } else {
            x
        }
    }

    /// Whether the curve never decreases over [0, 1]
    pub fn is_monotonic(&self) -> bool {
        match self {
            CurveShape::Linear | CurveShape::SmoothStep => true,
            CurveShape::Power { exponent } => *exponent > 0.0,
            CurveShape::Points { points } => {
                let mut sorted = points.clone();
                sorted.sort_by(|a, b| a[0].total_cmp(&b[0]));
                sorted.windows(2).all(|w| w[1][1] >= w[0][1])
            }
        }
    }
}

fn interpolate(points: &[[f64; 2]], x: f64) -> f64 {
    if points.is_empty() {
        return x;
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]));

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    if x <= first[0] {
        return first[1];
    }
    if x >= last[0] {
        return last[1];
    }

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if x >= a[0] && x <= b[0] {
            let span = b[0] - a[0];
            if span <= f64::EPSILON {
                return b[1];
            }
            let t = (x - a[0]) / span;
            return lerp(a[1], b[1], t);
        }
    }
    last[1]
}

/// Linear interpolation between `a` and `b`
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Map a level to a power position in [0, 1]
///
/// Normalizes `(level - 1) / (max_level - 1)` and applies the curve. Without a
/// curve the normalized value is returned unchanged.
pub fn power_position(level: u32, max_level: u32, curve: Option<&CurveShape>) -> f64 {
    if max_level <= 1 {
        tracing::warn!(max_level, "max_level must exceed 1, treating as full power");
        return 1.0;
    }
    let normalized =
        ((level as f64 - 1.0) / (max_level as f64 - 1.0)).clamp(0.0, 1.0);
    match curve {
        Some(curve) => curve.apply(normalized),
        None => normalized,
    }
}

/// A min/max roll window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzWindow {
    pub min: f64,
    pub max: f64,
}

impl FuzzWindow {
    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Widen a center value into a roll window bounded by the effect range
///
/// `actual_fuzz = max(|center| * fuzz_pct, min_absolute_fuzz)`. The absolute
/// floor keeps small integer ranges from collapsing to a single value.
pub fn fuzz_range(
    center: f64,
    effect_min: f64,
    effect_max: f64,
    fuzz_pct: f64,
    min_absolute_fuzz: f64,
) -> FuzzWindow {
    let (lo_bound, hi_bound) = if effect_min <= effect_max {
        (effect_min, effect_max)
    } else {
        (effect_max, effect_min)
    };

    let actual_fuzz = (center.abs() * fuzz_pct.abs()).max(min_absolute_fuzz.abs());
    let min = (center - actual_fuzz).max(lo_bound);
    let max = (center + actual_fuzz).min(hi_bound);

    if min > max {
        // Center sits outside the effect range
        let pinned = center.clamp(lo_bound, hi_bound);
        return FuzzWindow { min: pinned, max: pinned };
    }
    FuzzWindow { min, max }
}
