use std::ops::Range;

/// Logarithmic grouping of frequency bins into display bars.
///
/// Bar `i` covers bins `[floor(min·r^(i/B)), floor(min·r^((i+1)/B)))` with
/// `r = max / min`, widened to at least one bin. The last bar includes
/// `max_bin` itself. A bar's value is the peak of its span, so short
/// transients stay visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBands {
    spans: Vec<Range<usize>>,
}

impl LogBands {
    /// Spans for `bar_count` bars over bins `min_bin..=max_bin`.
    ///
    /// `min_bin` is raised to 1 (the DC bin never takes part) and `max_bin`
    /// to at least `min_bin`.
    pub fn new(bar_count: usize, min_bin: usize, max_bin: usize) -> Self {
        let min_bin = min_bin.max(1);
        let max_bin = max_bin.max(min_bin);
        let ratio = max_bin as f64 / min_bin as f64;
        let edge = |i: usize| -> usize {
            let exponent = i as f64 / bar_count as f64;
            ((min_bin as f64 * ratio.powf(exponent)).floor() as usize).clamp(min_bin, max_bin)
        };

        let spans = (0..bar_count)
            .map(|i| {
                let start = edge(i);
                let end = if i + 1 == bar_count { max_bin + 1 } else { edge(i + 1) };
                start..end.max(start + 1)
            })
            .collect();
        Self { spans }
    }

    /// Spans covering every non-DC bin of a frame with `bin_count` bins.
    pub fn for_bins(bar_count: usize, bin_count: usize) -> Self {
        Self::new(bar_count, 1, bin_count.saturating_sub(1))
    }

    pub fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }

    pub fn bar_count(&self) -> usize {
        self.spans.len()
    }

    /// Write each bar's peak bin value into `out`.
    ///
    /// Bins missing from `bins` count as zero; extra `out` slots are left alone.
    pub fn apply(&self, bins: &[u8], out: &mut [u8]) {
        for (value, span) in out.iter_mut().zip(&self.spans) {
            let start = span.start.min(bins.len());
            let end = span.end.min(bins.len());
            *value = bins[start..end].iter().copied().max().unwrap_or(0);
        }
    }

    pub fn compute(&self, bins: &[u8]) -> Vec<u8> {
        let mut out = vec![0; self.spans.len()];
        self.apply(bins, &mut out);
        out
    }
}
