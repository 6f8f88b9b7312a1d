//! Finalized assessor output and the persistence seam.

use std::convert::Infallible;

use trackeff_axis::AxisDef;
use trackeff_core::{ConfigError, EventIdentity, TrackQuality};
use trackeff_cuts::{EventCutStats, TrackCutStats};
use trackeff_hist::{FamilyId, HistogramGrid};

use crate::config::AxisSet;
use crate::metrics::RunMetrics;
use crate::qa::{count_value, QaHistograms};

// ── Grid families ──────────────────────────────────────────────────

/// Cell quality axis for global DCA.
pub const DCA_CELL_AXIS: AxisDef = AxisDef::new(30, 0.0, 3.0);
/// Cell quality axis for fit points and possible points.
pub const NHIT_CELL_AXIS: AxisDef = AxisDef::new(40, 10.0, 50.0);
/// Axis of both counts in the truth-vs-matched count grid.
pub const COUNT_AXIS: AxisDef = AxisDef::new(50, 0.0, 50.0);

/// Name of the single family in the count grid.
pub const COUNT_FAMILY: &str = "counts";

/// The three quality families of one reconstructed track population.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualityFamilies {
    /// Cells over (φ, η, DCA).
    pub dca: FamilyId,
    /// Cells over (φ, η, fit points).
    pub nhit: FamilyId,
    /// Cells over (φ, η, possible points).
    pub nhit_poss: FamilyId,
}

impl QualityFamilies {
    fn register(grid: &mut HistogramGrid, prefix: &str, axes: &AxisSet) -> Result<Self, ConfigError> {
        let (phi, eta) = (axes.phi, axes.eta);
        Ok(Self {
            dca: grid.add_family(&format!("{prefix}_dca"), &[phi, eta, DCA_CELL_AXIS])?,
            nhit: grid.add_family(&format!("{prefix}_nhit"), &[phi, eta, NHIT_CELL_AXIS])?,
            nhit_poss: grid.add_family(&format!("{prefix}_nhit_poss"), &[phi, eta, NHIT_CELL_AXIS])?,
        })
    }

    /// Fill all three families at `coord`.
    pub fn fill<T: TrackQuality + ?Sized>(
        &self,
        grid: &mut HistogramGrid,
        coord: &[u32],
        track: &T,
        weight: f64,
    ) {
        let (phi, eta) = (track.phi(), track.eta());
        grid.accumulate(self.dca, coord, &[phi, eta, track.dca_global()], weight);
        grid.accumulate(self.nhit, coord, &[phi, eta, count_value(track.fit_points())], weight);
        grid.accumulate(
            self.nhit_poss,
            coord,
            &[phi, eta, count_value(track.possible_points())],
            weight,
        );
    }
}

/// Handles of every family registered in the track grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridFamilies {
    /// Truth primaries over (φ, η).
    pub truth: FamilyId,
    /// Accepted matched pairs.
    pub matched: QualityFamilies,
    /// Accepted data tracks.
    pub data: QualityFamilies,
    /// Accepted data tracks inside the PID window.
    pub data_pid: QualityFamilies,
}

impl GridFamilies {
    /// Register the standard families on an empty grid.
    pub fn register(grid: &mut HistogramGrid, axes: &AxisSet) -> Result<Self, ConfigError> {
        Ok(Self {
            truth: grid.add_family("truth", &[axes.phi, axes.eta])?,
            matched: QualityFamilies::register(grid, "matched", axes)?,
            data: QualityFamilies::register(grid, "data", axes)?,
            data_pid: QualityFamilies::register(grid, "data_pid", axes)?,
        })
    }
}

// ── Output ─────────────────────────────────────────────────────────

/// Everything an assessor produced over a run, moved out at finalization.
#[derive(Clone, Debug)]
pub struct AssessorOutput {
    /// Axes the run was configured with.
    pub axes: AxisSet,
    /// Name of the centrality provider used.
    pub centrality: String,
    /// Track grid with the truth, matched, data, and PID families.
    pub grid: HistogramGrid,
    /// Family handles into `grid`.
    pub families: GridFamilies,
    /// Per-event-coordinate (truth count, matched count) histograms.
    pub counts: HistogramGrid,
    /// Per-run diagnostic histograms.
    pub qa: QaHistograms,
    /// Identities of accepted events, in processing order.
    pub identities: Vec<EventIdentity>,
    /// Event-cut statistics.
    pub event_cuts: EventCutStats,
    /// Track-cut statistics for matched pairs.
    pub matched_cuts: TrackCutStats,
    /// Track-cut statistics for data tracks.
    pub data_cuts: TrackCutStats,
    /// Cumulative run counters.
    pub metrics: RunMetrics,
}

/// Consumer of finalized output, e.g. a file writer.
///
/// Errors are surfaced to the caller of
/// [`EfficiencyAssessor::finalize_into`](crate::EfficiencyAssessor::finalize_into)
/// unchanged.
pub trait HistogramSink {
    /// Failure type of the sink.
    type Error;

    /// Persist `output`.
    fn write_output(&mut self, output: &AssessorOutput) -> Result<(), Self::Error>;
}

/// Collects outputs in memory.
impl HistogramSink for Vec<AssessorOutput> {
    type Error = Infallible;

    fn write_output(&mut self, output: &AssessorOutput) -> Result<(), Self::Error> {
        self.push(output.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackeff_axis::AxisGrid;
    use trackeff_test_utils::good_pair;

    use crate::config::GridAxes;

    fn grid(axes: &AxisSet) -> HistogramGrid {
        HistogramGrid::new(AxisGrid::new(GridAxes::default().track_axes(axes)).unwrap())
    }

    #[test]
    fn families_register_in_order() {
        let axes = AxisSet::default();
        let mut g = grid(&axes);
        let f = GridFamilies::register(&mut g, &axes).unwrap();
        let names: Vec<&str> = g.families().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            [
                "truth",
                "matched_dca",
                "matched_nhit",
                "matched_nhit_poss",
                "data_dca",
                "data_nhit",
                "data_nhit_poss",
                "data_pid_dca",
                "data_pid_nhit",
                "data_pid_nhit_poss",
            ]
        );
        assert_eq!(g.family_id("data_pid_nhit"), Some(f.data_pid.nhit));
    }

    #[test]
    fn registering_twice_fails() {
        let axes = AxisSet::default();
        let mut g = grid(&axes);
        GridFamilies::register(&mut g, &axes).unwrap();
        match GridFamilies::register(&mut g, &axes) {
            Err(ConfigError::InvalidHistogram { .. }) => {}
            other => panic!("expected InvalidHistogram, got {other:?}"),
        }
    }

    #[test]
    fn quality_fill_lands_in_every_family() {
        let axes = AxisSet::default();
        let mut g = grid(&axes);
        let f = GridFamilies::register(&mut g, &axes).unwrap();
        let coord = [1, 4, 2, 3];
        f.matched.fill(&mut g, &coord, &good_pair(0.8, 0.1, 0.5), 1.0);
        for id in [f.matched.dca, f.matched.nhit, f.matched.nhit_poss] {
            assert_eq!(g.cell(id, &coord).map(|h| h.entries()), Some(1));
        }
        assert!(g.cell(f.data.dca, &coord).is_none());
    }
}
