//! Dense weighted histograms of one to three dimensions.

use smallvec::SmallVec;
use trackeff_axis::{AxisDef, GridShape};
use trackeff_core::ConfigError;

/// Maximum number of dimensions a [`Histogram`] supports.
pub const MAX_DIMS: usize = 3;

/// A dense weighted histogram over up to [`MAX_DIMS`] axes.
///
/// Each bin stores the sum of weights and the sum of squared weights,
/// so the statistical error of a weighted bin is `sqrt(sumw2)`. Fills
/// that fall outside any axis are counted as misses and otherwise
/// dropped; there are no under/overflow bins.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    axes: SmallVec<[AxisDef; MAX_DIMS]>,
    shape: GridShape,
    sumw: Vec<f64>,
    sumw2: Vec<f64>,
    entries: u64,
    misses: u64,
}

impl Histogram {
    /// Create an empty histogram over `axes`.
    ///
    /// Fails if there are no axes, more than [`MAX_DIMS`], or any axis is
    /// invalid.
    pub fn new(axes: &[AxisDef]) -> Result<Self, ConfigError> {
        if axes.is_empty() || axes.len() > MAX_DIMS {
            return Err(ConfigError::InvalidHistogram {
                reason: format!("{} axes requested, supported 1..={MAX_DIMS}", axes.len()),
            });
        }
        for a in axes {
            a.validate("histogram")?;
        }
        let dims: SmallVec<[u32; MAX_DIMS]> = axes.iter().map(|a| a.bins()).collect();
        let shape = GridShape::new(&dims)?;
        let n = shape.cell_count();
        Ok(Self {
            axes: SmallVec::from_slice(axes),
            shape,
            sumw: vec![0.0; n],
            sumw2: vec![0.0; n],
            entries: 0,
            misses: 0,
        })
    }

    /// Rebuild a histogram from stored contents.
    ///
    /// `sumw` and `sumw2` must each hold one value per bin in row-major
    /// order.
    pub fn from_parts(
        axes: &[AxisDef],
        sumw: Vec<f64>,
        sumw2: Vec<f64>,
        entries: u64,
        misses: u64,
    ) -> Result<Self, ConfigError> {
        let mut h = Self::new(axes)?;
        let n = h.shape.cell_count();
        if sumw.len() != n || sumw2.len() != n {
            return Err(ConfigError::InvalidHistogram {
                reason: format!(
                    "expected {n} bins, got {} sums and {} squared sums",
                    sumw.len(),
                    sumw2.len()
                ),
            });
        }
        h.sumw = sumw;
        h.sumw2 = sumw2;
        h.entries = entries;
        h.misses = misses;
        Ok(h)
    }

    /// The axes, in coordinate order.
    pub fn axes(&self) -> &[AxisDef] {
        &self.axes
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Total number of bins.
    pub fn bin_count(&self) -> usize {
        self.shape.cell_count()
    }

    /// Add `weight` at the bin containing `values`.
    ///
    /// Returns `true` if the fill landed in a bin.
    pub fn fill(&mut self, values: &[f64], weight: f64) -> bool {
        if values.len() != self.axes.len() {
            self.misses += 1;
            return false;
        }
        let mut coord: SmallVec<[u32; MAX_DIMS]> = SmallVec::new();
        for (a, &v) in self.axes.iter().zip(values) {
            match a.bin(v) {
                Some(b) => coord.push(b),
                None => {
                    self.misses += 1;
                    return false;
                }
            }
        }
        match self.shape.linear_index(&coord) {
            Some(i) => {
                self.sumw[i] += weight;
                self.sumw2[i] += weight * weight;
                self.entries += 1;
                true
            }
            None => {
                self.misses += 1;
                false
            }
        }
    }

    /// Sum of weights in the bin at `coord` (0 if out of range).
    pub fn bin_content(&self, coord: &[u32]) -> f64 {
        self.shape
            .linear_index(coord)
            .map_or(0.0, |i| self.sumw[i])
    }

    /// Statistical error of the bin at `coord`, `sqrt(sumw2)`.
    pub fn bin_error(&self, coord: &[u32]) -> f64 {
        self.shape
            .linear_index(coord)
            .map_or(0.0, |i| self.sumw2[i].sqrt())
    }

    /// Per-bin sums of weights, row-major.
    pub fn contents(&self) -> &[f64] {
        &self.sumw
    }

    /// Per-bin sums of squared weights, row-major.
    pub fn sumw2(&self) -> &[f64] {
        &self.sumw2
    }

    /// Total sum of weights over all bins.
    pub fn integral(&self) -> f64 {
        self.sumw.iter().sum()
    }

    /// Number of fills that landed in a bin.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Number of fills that fell outside the axes.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn counts() -> Histogram {
        Histogram::new(&[AxisDef::new(50, 0.0, 50.0), AxisDef::new(50, 0.0, 50.0)]).unwrap()
    }

    #[test]
    fn weighted_fill_tracks_sumw2() {
        let mut h = Histogram::new(&[AxisDef::new(30, 0.0, 3.0)]).unwrap();
        assert!(h.fill(&[1.05], 2.0));
        assert!(h.fill(&[1.05], 3.0));
        assert_eq!(h.bin_content(&[10]), 5.0);
        assert!((h.bin_error(&[10]) - 13f64.sqrt()).abs() < 1e-12);
        assert_eq!(h.entries(), 2);
    }

    #[test]
    fn out_of_range_counts_as_miss() {
        let mut h = counts();
        assert!(!h.fill(&[0.0, 3.5], 1.0));
        assert!(!h.fill(&[3.5], 1.0));
        assert_eq!(h.misses(), 2);
        assert_eq!(h.integral(), 0.0);
    }

    #[test]
    fn half_offset_puts_zero_count_in_first_bin() {
        let mut h = counts();
        assert!(h.fill(&[0.5, 0.5], 1.0));
        assert_eq!(h.bin_content(&[0, 0]), 1.0);
    }

    #[test]
    fn rejects_bad_dimensionality() {
        match Histogram::new(&[]) {
            Err(ConfigError::InvalidHistogram { .. }) => {}
            other => panic!("expected InvalidHistogram, got {other:?}"),
        }
        let a = AxisDef::new(2, 0.0, 1.0);
        assert!(Histogram::new(&[a, a, a, a]).is_err());
    }

    #[test]
    fn from_parts_checks_lengths() {
        let a = [AxisDef::new(4, 0.0, 1.0)];
        assert!(Histogram::from_parts(&a, vec![0.0; 4], vec![0.0; 4], 0, 0).is_ok());
        assert!(Histogram::from_parts(&a, vec![0.0; 3], vec![0.0; 4], 0, 0).is_err());
    }

    proptest! {
        #[test]
        fn integral_equals_in_range_weight(
            fills in proptest::collection::vec((-1.0f64..6.0, 0.0f64..4.0), 0..64),
        ) {
            let axis = AxisDef::new(20, 0.0, 5.0);
            let mut h = Histogram::new(&[axis]).unwrap();
            let mut expected = 0.0;
            for (v, w) in &fills {
                let landed = h.fill(&[*v], *w);
                prop_assert_eq!(landed, axis.bin(*v).is_some());
                if landed {
                    expected += w;
                }
            }
            prop_assert!((h.integral() - expected).abs() < 1e-9);
            prop_assert_eq!(h.entries() + h.misses(), fills.len() as u64);
        }
    }
}
