//! Wilson score confidence interval for binomial proportions.
//!
//! Chosen over the normal approximation because it stays inside `[0, 1]`
//! and behaves at extreme rates and small sample counts.

use serde::{Deserialize, Serialize};

/// A two-sided confidence interval on a proportion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    /// Lower bound, in `[0, 1]`.
    pub low: f64,
    /// Upper bound, in `[0, 1]`.
    pub high: f64,
}

impl ConfidenceInterval {
    /// Interval width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Whether the proportion lies inside the interval (inclusive).
    #[must_use]
    pub fn contains(&self, p: f64) -> bool {
        p >= self.low && p <= self.high
    }
}

/// Wilson score interval for `successes` out of `trials` at the given
/// confidence level (e.g. 0.95).
///
/// Degenerate inputs (`trials == 0`, or a level outside `(0, 1)`) return
/// the vacuous interval `[0, 1]`.
#[must_use]
pub fn wilson_interval(successes: u64, trials: u64, confidence_level: f64) -> ConfidenceInterval {
    if trials == 0 || confidence_level <= 0.0 || confidence_level >= 1.0 {
        return ConfidenceInterval { low: 0.0, high: 1.0 };
    }

    #[allow(clippy::cast_precision_loss)]
    let n = trials as f64;
    #[allow(clippy::cast_precision_loss)]
    let p = successes.min(trials) as f64 / n;

    let z = probit(1.0 - (1.0 - confidence_level) / 2.0);
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = (z / denom) * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    ConfidenceInterval {
        low: (center - half).clamp(0.0, 1.0),
        high: (center + half).clamp(0.0, 1.0),
    }
}

/// Inverse standard normal CDF, Acklam's rational approximation
/// (relative error below 1.15e-9 across the open unit interval).
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn probit(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.02425;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -((((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0))
    }
}
