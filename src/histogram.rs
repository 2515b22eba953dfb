//! The distribution of escape values over a finished grid, used to
//! spread colors evenly over the pixels that escaped rather than
//! evenly over the iteration range.

/// Per-iteration counts of escaped pixels.  Built in one pass over a
/// complete grid of escape values and never modified afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    counts: Vec<usize>,
    // Running totals of `counts`, so that lookups while coloring are
    // constant time.
    cumulative: Vec<usize>,
    total: usize,
    max_count: usize,
}

impl Histogram {
    /// Buckets every value below `max_iterations` by its integer part.
    /// Values at or above the cap never escaped and are left out of
    /// both the buckets and the total.
    pub fn build(results: &[f64], max_iterations: usize) -> Histogram {
        let mut counts = vec![0 as usize; max_iterations];
        for &result in results {
            if result < max_iterations as f64 {
                counts[bucket(result, max_iterations)] += 1;
            }
        }
        Histogram::from_counts(counts)
    }

    fn from_counts(counts: Vec<usize>) -> Histogram {
        let mut cumulative = Vec::with_capacity(counts.len());
        let mut running = 0;
        for &count in &counts {
            running += count;
            cumulative.push(running);
        }
        let max_count = counts.iter().cloned().max().unwrap_or(0);
        Histogram {
            counts,
            cumulative,
            total: running,
            max_count,
        }
    }

    /// Combines per-worker histograms over disjoint parts of the same
    /// grid into one.  All parts must share an iteration cap.
    pub fn merge(parts: &[Histogram]) -> Option<Histogram> {
        let buckets = parts.first()?.counts.len();
        if parts.iter().any(|p| p.counts.len() != buckets) {
            return None;
        }
        let mut counts = vec![0 as usize; buckets];
        for part in parts {
            for (sum, count) in counts.iter_mut().zip(&part.counts) {
                *sum += count;
            }
        }
        Some(Histogram::from_counts(counts))
    }

    /// The number of pixels whose escape value fell in `bucket`.
    pub fn count(&self, bucket: usize) -> usize {
        self.counts.get(bucket).cloned().unwrap_or(0)
    }

    /// The number of pixels whose escape value fell in any bucket up
    /// to and including the one `result` belongs to.
    pub fn cumulative(&self, result: f64) -> usize {
        if self.cumulative.is_empty() {
            return 0;
        }
        self.cumulative[bucket(result, self.cumulative.len())]
    }

    /// The number of pixels that escaped.
    pub fn total(&self) -> usize {
        self.total
    }

    /// The largest single bucket.
    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// The number of buckets, equal to the iteration cap.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if the histogram has no buckets at all.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[inline]
fn bucket(result: f64, buckets: usize) -> usize {
    let index = if result > 0.0 { result as usize } else { 0 };
    index.min(buckets - 1)
}
