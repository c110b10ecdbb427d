/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Computes `Σ(v·w) / Σw` over `(value, weight)` pairs.
/// Returns `None` for empty input or a zero total weight.
///
/// Weights are divided by the largest weight first so that huge survey
/// weights cannot overflow the sums.
pub fn weighted_mean(pairs: &[(f64, f64)]) -> Option<f64> {
    let max_weight = pairs.iter().map(|(_, w)| *w).fold(0.0, f64::max);
    if pairs.is_empty() || max_weight <= 0.0 {
        return None;
    }

    let (value_sum, weight_sum) = pairs.iter().fold((0.0, 0.0), |(vs, ws), (v, w)| {
        let w = w / max_weight;
        (vs + v * w, ws + w)
    });
    Some(value_sum / weight_sum)
}

/// Percentile of already sorted values with linear interpolation between the
/// two nearest ranks (index `rank / 100 · (n − 1)`).
///
/// `rank` must already be validated to lie in `[0, 100]`.
pub fn interpolated_percentile(sorted: &[f64], rank: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = rank / 100.0 * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] * (1.0 - frac) + sorted[hi] * frac)
}

/// Share of `part` in `total` as a percentage. Returns 0.0 when `total` is zero.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Single-pass count, mean, extrema and sum of squared deviations (Welford).
#[derive(Debug, Clone)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.count += 1;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Sample standard deviation (n − 1 divisor); undefined below two values.
    pub fn sample_std_dev(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).sqrt())
    }
}

impl Default for RunningStats {
    fn default() -> Self {
        Self::new()
    }
}
