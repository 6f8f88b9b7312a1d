//! A single uniform binning axis.

use trackeff_core::ConfigError;

/// A uniform axis of `bins` bins spanning `(low, high]`.
///
/// Bin `i` covers `(low + i·w, low + (i+1)·w]` where `w` is the bin
/// width. A value exactly equal to `low` belongs to no bin.
///
/// Construction does not validate; an invalid axis simply locates
/// nothing. Validation happens when an assessor is initialized, via
/// [`AxisDef::validate`].
///
/// # Examples
///
/// ```
/// use trackeff_axis::AxisDef;
///
/// let vz = AxisDef::new(5, -30.0, 30.0);
/// assert_eq!(vz.bin(-29.9), Some(0));
/// assert_eq!(vz.bin(-18.0), Some(0));
/// assert_eq!(vz.bin(30.0), Some(4));
/// assert_eq!(vz.bin(-30.0), None);
/// assert_eq!(vz.bin(30.1), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisDef {
    bins: u32,
    low: f64,
    high: f64,
}

impl AxisDef {
    /// Create an axis. No validation is performed.
    pub const fn new(bins: u32, low: f64, high: f64) -> Self {
        Self { bins, low, high }
    }

    /// Number of bins.
    pub fn bins(&self) -> u32 {
        self.bins
    }

    /// Lower (excluded) edge.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper (included) edge.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Bin width, `(high - low) / bins`.
    ///
    /// Not finite for a zero-bin axis.
    pub fn width(&self) -> f64 {
        (self.high - self.low) / f64::from(self.bins)
    }

    /// `bins > 0` and `width() > 0`.
    pub fn is_valid(&self) -> bool {
        self.bins > 0 && self.width() > 0.0
    }

    /// Validate, naming the axis in the error.
    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ConfigError::InvalidAxis {
                name,
                bins: self.bins,
                low: self.low,
                high: self.high,
            })
        }
    }

    /// Lower edge of bin `i`.
    fn lower_edge(&self, i: i64) -> f64 {
        self.low + i as f64 * self.width()
    }

    /// Locate `value`, or `None` if it lies outside `(low, high]` or the
    /// axis is invalid.
    ///
    /// Edges are evaluated as `low + i·width` so the result is identical
    /// to a linear scan over bins, including at rounding boundaries.
    pub fn bin(&self, value: f64) -> Option<u32> {
        if !self.is_valid() || value.is_nan() {
            return None;
        }
        let last = i64::from(self.bins) - 1;
        // Clamped in f64 first: infinities and far-off values saturate the cast.
        let ceil = ((value - self.low) / self.width())
            .ceil()
            .clamp(0.0, f64::from(self.bins));
        let guess = (ceil as i64 - 1).clamp(0, last);
        let lo = (guess - 1).max(0);
        let hi = (guess + 1).min(last);
        (lo..=hi)
            .find(|&i| value > self.lower_edge(i) && value <= self.lower_edge(i + 1))
            .map(|i| i as u32)
    }

    /// `(lower, upper)` edges of bin `i`, or `None` if out of range.
    pub fn edges(&self, i: u32) -> Option<(f64, f64)> {
        (i < self.bins).then(|| {
            let i = i64::from(i);
            (self.lower_edge(i), self.lower_edge(i + 1))
        })
    }

    /// Midpoint of bin `i`, or `None` if out of range.
    pub fn center(&self, i: u32) -> Option<f64> {
        self.edges(i).map(|(lo, hi)| 0.5 * (lo + hi))
    }
}
