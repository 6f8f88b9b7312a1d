//! Per-run diagnostic histograms.
//!
//! Integer-valued quantities (multiplicities, hit counts) are filled at
//! `n + 0.5` so that `n` lands in bin `n` under the open-low bin rule.

use std::f64::consts::PI;

use trackeff_axis::AxisDef;
use trackeff_core::{ConfigError, TrackQuality};
use trackeff_hist::Histogram;

use crate::config::AxisSet;

/// Fill coordinate for an integer count.
pub fn count_value(n: u32) -> f64 {
    f64::from(n) + 0.5
}

/// Fill coordinate for a collection length, saturating at `u32::MAX`.
pub fn count_len(len: usize) -> f64 {
    count_value(u32::try_from(len).unwrap_or(u32::MAX))
}

fn h1(a: AxisDef) -> Result<Histogram, ConfigError> {
    Histogram::new(&[a])
}

fn h3(axes: &AxisSet, var: AxisDef) -> Result<Histogram, ConfigError> {
    Histogram::new(&[axes.centrality, axes.momentum, var])
}

// ── Event QA ───────────────────────────────────────────────────────

/// Event-level distributions of accepted events.
#[derive(Clone, Debug, PartialEq)]
pub struct EventQa {
    /// Vertex z, 60 bins over (-30, 30].
    pub vz: Histogram,
    /// Reference multiplicity, 800 bins over (0, 800].
    pub ref_mult: Histogram,
    /// Global reference multiplicity, 800 bins over (0, 800].
    pub gref_mult: Histogram,
    /// Centrality class on the centrality axis.
    pub centrality: Histogram,
    /// Number of primary tracks, 400 bins over (0, 2000].
    pub n_primaries: Histogram,
    /// Number of truth tracks, 200 bins over (0, 200].
    pub n_mc: Histogram,
    /// Number of matched pairs, 100 bins over (0, 100].
    pub n_matched: Histogram,
}

impl EventQa {
    /// Allocate empty histograms.
    pub fn new(axes: &AxisSet) -> Result<Self, ConfigError> {
        Ok(Self {
            vz: h1(AxisDef::new(60, -30.0, 30.0))?,
            ref_mult: h1(AxisDef::new(800, 0.0, 800.0))?,
            gref_mult: h1(AxisDef::new(800, 0.0, 800.0))?,
            centrality: h1(axes.centrality)?,
            n_primaries: h1(AxisDef::new(400, 0.0, 2000.0))?,
            n_mc: h1(AxisDef::new(200, 0.0, 200.0))?,
            n_matched: h1(AxisDef::new(100, 0.0, 100.0))?,
        })
    }

    fn named(&self) -> [(&'static str, &Histogram); 7] {
        [
            ("vz", &self.vz),
            ("refmult", &self.ref_mult),
            ("grefmult", &self.gref_mult),
            ("centrality", &self.centrality),
            ("nprimaries", &self.n_primaries),
            ("nmc", &self.n_mc),
            ("nmatched", &self.n_matched),
        ]
    }
}

// ── Track QA ───────────────────────────────────────────────────────

/// Track-quality distributions over (centrality, pT, variable).
#[derive(Clone, Debug, PartialEq)]
pub struct QualitySet {
    /// Fit points, 50 bins over (0, 50].
    pub fit_points: Histogram,
    /// Global DCA, 50 bins over (0, 3].
    pub dca: Histogram,
    /// Possible points, 50 bins over (0, 50].
    pub possible_points: Histogram,
    /// Pseudorapidity, 50 bins over (-1, 1].
    pub eta: Histogram,
    /// Azimuth, 50 bins over (-π, π].
    pub phi: Histogram,
    /// Fit fraction, 50 bins over (0, 1].
    pub fit_fraction: Histogram,
}

impl QualitySet {
    fn new(axes: &AxisSet) -> Result<Self, ConfigError> {
        Ok(Self {
            fit_points: h3(axes, AxisDef::new(50, 0.0, 50.0))?,
            dca: h3(axes, AxisDef::new(50, 0.0, 3.0))?,
            possible_points: h3(axes, AxisDef::new(50, 0.0, 50.0))?,
            eta: h3(axes, AxisDef::new(50, -1.0, 1.0))?,
            phi: h3(axes, AxisDef::new(50, -PI, PI))?,
            fit_fraction: h3(axes, AxisDef::new(50, 0.0, 1.0))?,
        })
    }

    /// Record every quality variable of `track`.
    pub fn fill<T: TrackQuality + ?Sized>(&mut self, centrality: f64, track: &T) {
        let (c, pt) = (centrality, track.pt());
        self.fit_points.fill(&[c, pt, count_value(track.fit_points())], 1.0);
        self.dca.fill(&[c, pt, track.dca_global()], 1.0);
        self.possible_points
            .fill(&[c, pt, count_value(track.possible_points())], 1.0);
        self.eta.fill(&[c, pt, track.eta()], 1.0);
        self.phi.fill(&[c, pt, track.phi()], 1.0);
        self.fit_fraction.fill(&[c, pt, track.fit_fraction()], 1.0);
    }

    fn named(&self) -> [(&'static str, &Histogram); 6] {
        [
            ("nhit", &self.fit_points),
            ("dca", &self.dca),
            ("nhitposs", &self.possible_points),
            ("eta", &self.eta),
            ("phi", &self.phi),
            ("fitfrac", &self.fit_fraction),
        ]
    }
}

/// The staged histograms of one track class.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackQa {
    /// Every visited track, before any cut.
    pub pre: QualitySet,
    /// Tracks passing the full cascade.
    pub post: QualitySet,
    /// DCA of tracks passing fit and η cuts, before the DCA cut.
    pub dca_scale: Histogram,
    /// DCA of accepted tracks weighted by the inverse Jacobian,
    /// 30 bins over (0, 3].
    pub weighted_dca: Histogram,
}

impl TrackQa {
    /// Allocate empty histograms.
    pub fn new(axes: &AxisSet) -> Result<Self, ConfigError> {
        Ok(Self {
            pre: QualitySet::new(axes)?,
            post: QualitySet::new(axes)?,
            dca_scale: h3(axes, AxisDef::new(50, 0.0, 3.0))?,
            weighted_dca: weighted_dca(axes)?,
        })
    }

    /// Record the scale-stage DCA.
    pub fn fill_scale<T: TrackQuality + ?Sized>(&mut self, centrality: f64, track: &T) {
        self.dca_scale
            .fill(&[centrality, track.pt(), track.dca_global()], 1.0);
    }

    fn push_named<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Histogram)>) {
        for (name, h) in self.pre.named() {
            out.push((format!("{prefix}_{name}"), h));
        }
        for (name, h) in self.post.named() {
            out.push((format!("{prefix}_cut_{name}"), h));
        }
        out.push((format!("{prefix}_dcascale"), &self.dca_scale));
        out.push((format!("{prefix}_weighted_dca"), &self.weighted_dca));
    }
}

fn weighted_dca(axes: &AxisSet) -> Result<Histogram, ConfigError> {
    h3(axes, AxisDef::new(30, 0.0, 3.0))
}

// ── Aggregate ──────────────────────────────────────────────────────

/// Every per-run diagnostic histogram.
#[derive(Clone, Debug, PartialEq)]
pub struct QaHistograms {
    /// Event-level distributions.
    pub event: EventQa,
    /// Truth primaries over (centrality, pT): the efficiency denominator.
    pub truth_pt: Histogram,
    /// Accepted matched pairs over (centrality, pT): the numerator.
    pub matched_pt: Histogram,
    /// Matched-pair staged histograms.
    pub matched: TrackQa,
    /// Data-track staged histograms.
    pub data: TrackQa,
    /// Inverse-Jacobian weighted DCA of PID-selected data tracks.
    pub data_pid_weighted_dca: Histogram,
}

impl QaHistograms {
    /// Allocate empty histograms for the given axes.
    pub fn new(axes: &AxisSet) -> Result<Self, ConfigError> {
        let cent_pt = [axes.centrality, axes.momentum];
        Ok(Self {
            event: EventQa::new(axes)?,
            truth_pt: Histogram::new(&cent_pt)?,
            matched_pt: Histogram::new(&cent_pt)?,
            matched: TrackQa::new(axes)?,
            data: TrackQa::new(axes)?,
            data_pid_weighted_dca: weighted_dca(axes)?,
        })
    }

    /// Every histogram with a unique persistent name.
    pub fn named(&self) -> Vec<(String, &Histogram)> {
        let mut out: Vec<(String, &Histogram)> = self
            .event
            .named()
            .into_iter()
            .map(|(n, h)| (n.to_string(), h))
            .collect();
        out.push(("mc_pt".to_string(), &self.truth_pt));
        out.push(("reco_pt".to_string(), &self.matched_pt));
        self.matched.push_named("reco", &mut out);
        self.data.push_named("data", &mut out);
        out.push(("data_pid_weighted_dca".to_string(), &self.data_pid_weighted_dca));
        out
    }
}
