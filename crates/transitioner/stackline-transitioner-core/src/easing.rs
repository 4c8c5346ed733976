//! Easing curves for timed transitions.
//!
//! Curves map normalized progress `t ∈ [0, 1]` to eased progress. Cubic
//! bezier curves are inverted on x with a bisection search.

use serde::{Deserialize, Serialize};

/// Control points of the standard `ease` curve.
const EASE: [f64; 4] = [0.42, 0.0, 1.0, 1.0];

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Easing {
    Linear,
    /// `cubic-bezier(0.42, 0, 1, 1)`.
    Ease,
    /// `ease` mirrored around the midpoint. Default curve for stack transitions.
    EaseInOut,
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Default for Easing {
    fn default() -> Self {
        Easing::EaseInOut
    }
}

impl Easing {
    /// Eased progress for `t`, clamped to `[0, 1]`.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::Ease => bezier_ease_t(t, EASE),
            Easing::EaseInOut => {
                if t < 0.5 {
                    bezier_ease_t(t * 2.0, EASE) / 2.0
                } else {
                    1.0 - bezier_ease_t((1.0 - t) * 2.0, EASE) / 2.0
                }
            }
            Easing::CubicBezier { x1, y1, x2, y2 } => bezier_ease_t(t, [x1, y1, x2, y2]),
        }
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Given control points (x1, y1, x2, y2) and an input t in [0,1],
/// compute the eased y by inverting the x bezier via binary search.
fn bezier_ease_t(t: f64, ctrl: [f64; 4]) -> f64 {
    let [x1, y1, x2, y2] = ctrl;
    if x1 == 0.0 && y1 == 0.0 && x2 == 1.0 && y2 == 1.0 {
        return t;
    }
    if t <= 0.0 || t >= 1.0 {
        return t;
    }
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    let mut mid = t;
    for _ in 0..48 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-9 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    cubic_bezier(0.0, y1, y2, 1.0, mid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn endpoints_are_fixed() {
        for easing in [
            Easing::Linear,
            Easing::Ease,
            Easing::EaseInOut,
            Easing::CubicBezier {
                x1: 0.25,
                y1: 0.1,
                x2: 0.25,
                y2: 1.0,
            },
        ] {
            approx(easing.apply(0.0), 0.0, 1e-9);
            approx(easing.apply(1.0), 1.0, 1e-9);
        }
    }

    #[test]
    fn ease_in_out_is_symmetric() {
        approx(Easing::EaseInOut.apply(0.5), 0.5, 1e-6);
        for t in [0.1, 0.2, 0.3, 0.45] {
            let a = Easing::EaseInOut.apply(t);
            let b = Easing::EaseInOut.apply(1.0 - t);
            approx(a + b, 1.0, 1e-6);
            assert!(a < t, "ease-in-out starts slow at t={t}");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        let mut prev = 0.0;
        for i in 1..=100 {
            let v = Easing::EaseInOut.apply(i as f64 / 100.0);
            assert!(v >= prev - 1e-9);
            prev = v;
        }
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-2.0), 0.0);
        assert_eq!(Easing::Ease.apply(3.0), 1.0);
    }
}
