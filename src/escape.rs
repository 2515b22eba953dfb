// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time evaluation.
//!
//! Every point `c` on the complex plane gets a single number: how
//! quickly the orbit `z ← z² + c`, starting at zero, runs off to
//! infinity.  Points that never leave within the iteration cap get
//! exactly the cap, and everything else gets a fractional "smooth"
//! count that varies continuously across the plane, so that color
//! bands blend into one another instead of stepping.
//!
//! Three cheap tricks run before the orbit is iterated in earnest.
//! The main cardioid and the period-2 bulb are both regions with a
//! closed-form description, and anything inside them is in the set
//! without question.  Past those, a short run of the orbit together
//! with its derivative can sometimes predict how much longer the
//! point will take to escape, skipping the long tail entirely.

use num::{clamp, Complex};

/// The squared magnitude past which an orbit is considered escaped.
/// Four is enough to prove escape; a larger radius makes the smooth
/// count more accurate.
pub const BAILOUT: f64 = 256.0;

/// The number of derivative terms computed by the series estimate.
pub const SERIES_TERMS: usize = 8;

/// Series estimates are never attempted below this many iterations.
pub const MIN_SERIES_ITERATIONS: usize = 10;

/// The number of points the batched kernel iterates side by side.
pub const LANES: usize = 4;

const ESCAPE_RADIUS: f64 = 2.0;
const ESCAPE_RADIUS_SQ: f64 = ESCAPE_RADIUS * ESCAPE_RADIUS;
const MIN_DERIVATIVE: f64 = 1e-10;

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// How a point's escape value was arrived at.  Counted per render so
/// that the cost of each shortcut can be reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Method {
    /// Inside the main cardioid; no iteration.
    Cardioid,
    /// Inside the period-2 bulb; no iteration.
    Bulb,
    /// Predicted by the derivative series.
    Series,
    /// Iterated until the orbit crossed the bailout.
    Escaped,
    /// Iterated all the way to the cap without escaping.
    Bounded,
}

/// True if `c` lies inside the main cardioid.
#[inline]
pub fn in_cardioid(c: Complex<f64>) -> bool {
    let x = c.re - D4;
    let y = c.im * c.im;
    let q = x * x + y;
    q * (q + x) < D4 * y
}

/// True if `c` lies inside the period-2 bulb, the disc of radius 1/4
/// centered on -1.
#[inline]
pub fn in_bulb(c: Complex<f64>) -> bool {
    let x = c.re + 1.0;
    x * x + c.im * c.im < D16
}

/// Converts the iteration at which an orbit crossed the bailout, and
/// the squared magnitude it crossed with, into a continuous escape
/// count.  Never negative.
#[inline]
pub fn smooth(iterations: usize, norm_sqr: f64) -> f64 {
    let value = (iterations as f64) + 1.0 - (0.5 * norm_sqr.ln()).log2();
    if value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Runs the orbit and its derivative with respect to `c` for a few
/// terms, then extrapolates how many more iterations the orbit needs
/// to reach radius 2.  Returns `None` whenever the estimate is not
/// trustworthy: too few iterations to bother, an orbit that escaped
/// during the terms, a vanishing derivative, or an estimate that is
/// not positive or would land past the cap.
pub fn series_estimate(c: Complex<f64>, max_iterations: usize) -> Option<f64> {
    if max_iterations < MIN_SERIES_ITERATIONS {
        return None;
    }

    let mut z = Complex::new(0.0_f64, 0.0);
    let mut dz = Complex::new(1.0_f64, 0.0);
    let terms = SERIES_TERMS.min(max_iterations / 4);
    for _ in 0..terms {
        dz = z * dz * 2.0 + 1.0;
        let escaped = z.norm_sqr() > ESCAPE_RADIUS_SQ;
        z = z * z + c;
        if escaped {
            return None;
        }
    }

    let derivative = dz.norm();
    if derivative <= MIN_DERIVATIVE {
        return None;
    }

    let estimate = (ESCAPE_RADIUS / z.norm()).ln() / derivative.ln();
    if estimate > 0.0 && estimate < (max_iterations - SERIES_TERMS) as f64 {
        Some(SERIES_TERMS as f64 + estimate)
    } else {
        None
    }
}

/// Iterates `z ← z² + c` from zero until the orbit crosses the
/// bailout or the cap is reached.  The escape test looks at the orbit
/// before each step, so an orbit is only seen to escape on the step
/// after it crosses.  The iteration at which the orbit first left
/// radius 2 is noted on the way, and the smooth count is held within
/// one of it.  At the cap, anything outside radius 2 still counts as
/// escaped.
pub fn iterate(c: Complex<f64>, max_iterations: usize) -> (f64, Method) {
    let (mut zr, mut zi) = (0.0_f64, 0.0_f64);
    let mut iterations = 0;
    let mut crossed = 0;
    while iterations < max_iterations {
        let zr_sq = zr * zr;
        let zi_sq = zi * zi;
        let norm_sqr = zr_sq + zi_sq;
        if crossed == 0 && norm_sqr > ESCAPE_RADIUS_SQ {
            crossed = iterations;
        }
        if norm_sqr > BAILOUT {
            return (escape_value(iterations, norm_sqr, crossed), Method::Escaped);
        }
        zi = 2.0 * zr * zi + c.im;
        zr = zr_sq - zi_sq + c.re;
        iterations += 1;
    }
    match escaped_at_cap(zr * zr + zi * zi, crossed, max_iterations) {
        Some(value) => (value, Method::Escaped),
        None => (max_iterations as f64, Method::Bounded),
    }
}

/// The same loop as `iterate`, run over `LANES` points in lockstep.
/// Lanes that have escaped stop updating while the rest carry on; the
/// whole batch stops once every lane has escaped.  The arithmetic in
/// each lane is exactly that of `iterate`, so the results match it bit
/// for bit.
pub fn iterate_lanes(points: &[Complex<f64>; LANES], max_iterations: usize) -> [f64; LANES] {
    let mut zr = [0.0_f64; LANES];
    let mut zi = [0.0_f64; LANES];
    let mut counts = [0_usize; LANES];
    let mut crossed = [0_usize; LANES];
    let mut escaped = [false; LANES];

    for _ in 0..max_iterations {
        let mut running = false;
        for lane in 0..LANES {
            if escaped[lane] {
                continue;
            }
            let zr_sq = zr[lane] * zr[lane];
            let zi_sq = zi[lane] * zi[lane];
            let norm_sqr = zr_sq + zi_sq;
            if crossed[lane] == 0 && norm_sqr > ESCAPE_RADIUS_SQ {
                crossed[lane] = counts[lane];
            }
            if norm_sqr > BAILOUT {
                escaped[lane] = true;
                continue;
            }
            zi[lane] = 2.0 * zr[lane] * zi[lane] + points[lane].im;
            zr[lane] = zr_sq - zi_sq + points[lane].re;
            counts[lane] += 1;
            running = true;
        }
        if !running {
            break;
        }
    }

    let mut results = [max_iterations as f64; LANES];
    for lane in 0..LANES {
        let norm_sqr = zr[lane] * zr[lane] + zi[lane] * zi[lane];
        if counts[lane] < max_iterations {
            results[lane] = escape_value(counts[lane], norm_sqr, crossed[lane]);
        } else if let Some(value) = escaped_at_cap(norm_sqr, crossed[lane], max_iterations) {
            results[lane] = value;
        }
    }
    results
}

// The largest value strictly below `x`, near enough.
#[inline]
fn below(x: f64) -> f64 {
    x - x * f64::EPSILON
}

/// The smooth count of an orbit seen past the bailout after
/// `iterations` steps, held to within one of `crossed`, the step at
/// which it first left radius 2.
#[inline]
fn escape_value(iterations: usize, norm_sqr: f64, crossed: usize) -> f64 {
    let first = crossed as f64;
    clamp(smooth(iterations, norm_sqr), first - 1.0, below(first + 1.0))
}

/// An orbit that used its whole budget without passing the bailout
/// has still escaped if it ended outside radius 2.  Its smooth count
/// is pinned just below the cap so that it never reads as a set
/// member.  `crossed` is zero if the orbit only left radius 2 on the
/// last step.
#[inline]
fn escaped_at_cap(norm_sqr: f64, crossed: usize, max_iterations: usize) -> Option<f64> {
    if norm_sqr <= ESCAPE_RADIUS_SQ {
        return None;
    }
    let crossed = if crossed == 0 { max_iterations } else { crossed };
    let value = escape_value(max_iterations, norm_sqr, crossed);
    Some(value.min(below(max_iterations as f64)))
}

/// Evaluates points against a fixed iteration cap.  Once set, this
/// object should not be mutable.
#[derive(Copy, Clone, Debug)]
pub struct Evaluator {
    max_iterations: usize,
    series: bool,
}

impl Evaluator {
    /// An evaluator with every shortcut enabled.
    pub fn new(max_iterations: usize) -> Self {
        Evaluator {
            max_iterations,
            series: true,
        }
    }

    /// Turns the series estimate on or off.  The cardioid and bulb
    /// tests are exact and always run.
    pub fn with_series(self, series: bool) -> Self {
        Evaluator { series, ..self }
    }

    /// The iteration cap.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Whether the series estimate is attempted.
    pub fn series(&self) -> bool {
        self.series
    }

    /// Tries every method that avoids the full iteration.  `None`
    /// means the point has to be iterated.
    pub fn shortcut(&self, c: Complex<f64>) -> Option<(f64, Method)> {
        let cap = self.max_iterations as f64;
        if in_cardioid(c) {
            return Some((cap, Method::Cardioid));
        }
        if in_bulb(c) {
            return Some((cap, Method::Bulb));
        }
        if self.series {
            if let Some(estimate) = series_estimate(c, self.max_iterations) {
                return Some((estimate, Method::Series));
            }
        }
        None
    }

    /// The escape value of `c` together with the method that produced
    /// it.
    pub fn trace(&self, c: Complex<f64>) -> (f64, Method) {
        match self.shortcut(c) {
            Some(result) => result,
            None => iterate(c, self.max_iterations),
        }
    }

    /// The escape value of `c`: exactly the cap for points that never
    /// escaped, a smooth count below it for everything else.
    pub fn evaluate(&self, c: Complex<f64>) -> f64 {
        self.trace(c).0
    }
}

/// Evaluates a single point with every shortcut enabled.
pub fn evaluate(c: Complex<f64>, max_iterations: usize) -> f64 {
    Evaluator::new(max_iterations).evaluate(c)
}
