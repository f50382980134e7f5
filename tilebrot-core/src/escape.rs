use crate::complex::Complex;

/// Squared modulus at which an orbit counts as escaped (`|z| = 2`).
pub const ESCAPE_NORM_SQ: f64 = 4.0;

/// Grid value stored for points that never escaped.
pub const INSIDE: f64 = 0.0;

/// The result of iterating a single point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Escape {
    /// The orbit stayed bounded for the whole iteration budget.
    Inside,

    /// The orbit escaped; `smoothed` is the continuous escape count
    /// `ν = i + 1 − ln(log₂|z|)`, always positive.
    Escaped { smoothed: f64 },
}

impl Escape {
    #[inline]
    pub fn is_inside(self) -> bool {
        matches!(self, Self::Inside)
    }

    /// The value written into a grid cell: `0` for inside, `ν` otherwise.
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            Self::Inside => INSIDE,
            Self::Escaped { smoothed } => smoothed,
        }
    }
}

/// Decides set membership for one plane coordinate.
///
/// Designed for **static dispatch**: the engine is generic over
/// `E: Evaluator` so the hot loop inlines. Implementations must be pure.
pub trait Evaluator {
    fn evaluate(&self, c: Complex, max_steps: u32) -> Escape;
}

/// The Mandelbrot recurrence `z ← z² + c` from `z = 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mandelbrot;

impl Evaluator for Mandelbrot {
    #[inline]
    fn evaluate(&self, c: Complex, max_steps: u32) -> Escape {
        evaluate(c, max_steps)
    }
}

/// Iterate `c` for at most `max_steps` steps.
///
/// An orbit has escaped once `|z|² ≥ 4`, so every `c` with `|c| ≥ 2` escapes
/// on the first step. Points on the boundary circle such as `-2`, which
/// belong to the set, are therefore classified as escaping.
#[inline]
pub fn evaluate(c: Complex, max_steps: u32) -> Escape {
    let (mut zr, mut zi) = (0.0_f64, 0.0_f64);

    for step in 1..=max_steps {
        let zr2 = zr * zr;
        let zi2 = zi * zi;
        zi = 2.0 * zr * zi + c.im;
        zr = zr2 - zi2 + c.re;

        let norm_sq = zr * zr + zi * zi;
        if norm_sq >= ESCAPE_NORM_SQ {
            let smoothed = step as f64 + 1.0 - norm_sq.sqrt().log2().ln();
            // Very distant points would otherwise go non-positive and
            // collide with the inside sentinel.
            return Escape::Escaped {
                smoothed: smoothed.max(f64::MIN_POSITIVE),
            };
        }
    }

    Escape::Inside
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_inside() {
        assert_eq!(evaluate(Complex::ZERO, 1000), Escape::Inside);
    }

    #[test]
    fn minus_half_is_inside_for_every_budget() {
        for n in [1, 2, 3, 10, 100, 1024, 1 << 15] {
            assert!(
                evaluate(Complex::new(-0.5, 0.0), n).is_inside(),
                "-0.5 should stay inside with budget {n}"
            );
        }
    }

    #[test]
    fn modulus_two_escapes_on_first_step() {
        for c in [
            Complex::new(2.0, 0.0),
            Complex::new(0.0, 2.0),
            Complex::new(-3.0, 1.0),
            Complex::new(10.0, -10.0),
        ] {
            for n in [1, 2, 50] {
                let result = evaluate(c, n);
                assert!(!result.is_inside(), "{c} should escape with budget {n}");
                assert!(result.value() > 0.0);
            }
        }
    }

    #[test]
    fn two_escapes_with_first_step_smoothing() {
        // z₁ = 2 → |z₁| = 2 → log₂ 2 = 1 → ln 1 = 0 → ν = 1 + 1 − 0.
        assert_eq!(
            evaluate(Complex::new(2.0, 0.0), 1),
            Escape::Escaped { smoothed: 2.0 }
        );
    }

    #[test]
    fn minus_two_counts_as_escaping() {
        // z₁ = -2 lands exactly on the circle.
        for n in [1, 5, 1024] {
            assert_eq!(
                evaluate(Complex::new(-2.0, 0.0), n),
                Escape::Escaped { smoothed: 2.0 }
            );
        }
    }

    #[test]
    fn one_escapes_on_second_step() {
        // c = 1: z₁ = 1, z₂ = 2 (|z|² = 4 → escaped at step 2).
        match evaluate(Complex::new(1.0, 0.0), 100) {
            Escape::Escaped { smoothed } => assert_eq!(smoothed, 3.0),
            Escape::Inside => panic!("c = 1 should escape"),
        }
        assert!(evaluate(Complex::new(1.0, 0.0), 1).is_inside());
    }

    #[test]
    fn zero_budget_reports_inside() {
        assert!(evaluate(Complex::new(5.0, 5.0), 0).is_inside());
    }

    #[test]
    fn distant_points_stay_positive() {
        let value = evaluate(Complex::new(1e300, 0.0), 10).value();
        assert!(value > 0.0);
    }

    #[test]
    fn deterministic_results() {
        let points = [
            Complex::new(0.0, 0.0),
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(-1.7490, 0.0001),
            Complex::new(0.2501, 0.0),
        ];
        let run1: Vec<_> = points.iter().map(|&c| Mandelbrot.evaluate(c, 4096)).collect();
        let run2: Vec<_> = points.iter().map(|&c| Mandelbrot.evaluate(c, 4096)).collect();
        for (a, b) in run1.iter().zip(&run2) {
            assert_eq!(a.value().to_bits(), b.value().to_bits());
        }
    }

    #[test]
    fn value_maps_inside_to_sentinel() {
        assert_eq!(Escape::Inside.value(), INSIDE);
        assert_eq!(Escape::Escaped { smoothed: 4.5 }.value(), 4.5);
    }
}
