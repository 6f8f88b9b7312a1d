//! Cumulative run counters for the efficiency assessor.
//!
//! [`RunMetrics`] is updated once per `process()` call and handed out with
//! the finalized output; it complements the per-cut statistics kept by
//! the cut evaluators.

use std::fmt;

use crate::assessor::RejectReason;

/// Counters accumulated across every processed event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Calls to `process()` made while initialized.
    pub events_seen: u64,
    /// Events whose truth entry could not be found.
    pub alignment_failures: u64,
    /// Events skipped because their run is masked.
    pub rejected_masked: u64,
    /// Events rejected by at least one event cut.
    pub rejected_event_cuts: u64,
    /// Events for which the centrality provider returned no class.
    pub rejected_centrality: u64,
    /// Events whose coordinate fell outside the grid axes.
    pub rejected_outside_binning: u64,
    /// Events that contributed to the histograms.
    pub accepted_events: u64,
    /// Truth primaries accumulated.
    pub accepted_truth: u64,
    /// Matched pairs passing the full cascade.
    pub accepted_matched: u64,
    /// Data tracks passing the full cascade.
    pub accepted_data: u64,
    /// Accepted data tracks inside the PID window.
    pub accepted_data_pid: u64,
    /// Accepted tracks whose Jacobian weight was not finite.
    pub non_finite_weights: u64,
}

impl RunMetrics {
    /// Count one rejected event.
    pub fn record_rejection(&mut self, reason: &RejectReason) {
        match reason {
            RejectReason::Masked => self.rejected_masked += 1,
            RejectReason::EventCuts(_) => self.rejected_event_cuts += 1,
            RejectReason::CentralityInvalid => self.rejected_centrality += 1,
            RejectReason::OutsideBinning => self.rejected_outside_binning += 1,
        }
    }

    /// Events rejected for any reason (alignment failures excluded).
    pub fn rejected_events(&self) -> u64 {
        self.rejected_masked
            + self.rejected_event_cuts
            + self.rejected_centrality
            + self.rejected_outside_binning
    }
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seen {} | unaligned {} | masked {} | event cuts {} | centrality {} | outside {} | accepted {} \
             | truth {} matched {} data {} pid {} | non-finite weights {}",
            self.events_seen,
            self.alignment_failures,
            self.rejected_masked,
            self.rejected_event_cuts,
            self.rejected_centrality,
            self.rejected_outside_binning,
            self.accepted_events,
            self.accepted_truth,
            self.accepted_matched,
            self.accepted_data,
            self.accepted_data_pid,
            self.non_finite_weights,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use trackeff_cuts::EventCut;

    #[test]
    fn default_metrics_are_zero() {
        let m = RunMetrics::default();
        assert_eq!(m.events_seen, 0);
        assert_eq!(m.rejected_events(), 0);
        assert_eq!(m.non_finite_weights, 0);
    }

    #[test]
    fn rejections_are_counted_by_reason() {
        let mut m = RunMetrics::default();
        m.record_rejection(&RejectReason::Masked);
        m.record_rejection(&RejectReason::EventCuts(smallvec![EventCut::Vz]));
        m.record_rejection(&RejectReason::EventCuts(smallvec![EventCut::Vx, EventCut::Vr]));
        m.record_rejection(&RejectReason::OutsideBinning);
        assert_eq!(m.rejected_masked, 1);
        assert_eq!(m.rejected_event_cuts, 2);
        assert_eq!(m.rejected_centrality, 0);
        assert_eq!(m.rejected_outside_binning, 1);
        assert_eq!(m.rejected_events(), 4);
    }
}
