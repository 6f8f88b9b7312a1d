//! The staged track-cut cascade.
//!
//! Order: pre-cut observation → fit points → fit fraction → |η| → scale
//! observation → DCA. A track reaching the end is accepted.

use std::fmt;
use trackeff_core::{ConfigError, TrackQuality};

/// Thresholds of the track cascade.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackCutConfig {
    /// Fewer fit points than this rejects. Default: 20.
    pub min_fit_points: u32,
    /// A fit fraction below this rejects. Default: 0.52.
    pub min_fit_fraction: f64,
    /// `|η|` above this rejects. Default: 1.0.
    pub max_abs_eta: f64,
    /// A global DCA above this (cm) rejects. Default: 3.0.
    pub max_dca: f64,
}

impl Default for TrackCutConfig {
    fn default() -> Self {
        Self {
            min_fit_points: 20,
            min_fit_fraction: 0.52,
            max_abs_eta: 1.0,
            max_dca: 3.0,
        }
    }
}

impl TrackCutConfig {
    /// Check that every threshold is a usable number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Fit fraction must be a fraction.
        if !(0.0..=1.0).contains(&self.min_fit_fraction) {
            return Err(ConfigError::InvalidCut {
                reason: format!("min_fit_fraction {} outside [0, 1]", self.min_fit_fraction),
            });
        }
        // 2. Eta and DCA limits must be finite and non-negative.
        for (name, v) in [("max_abs_eta", self.max_abs_eta), ("max_dca", self.max_dca)] {
            if !v.is_finite() || v < 0.0 {
                return Err(ConfigError::InvalidCut {
                    reason: format!("{name} must be finite and non-negative, got {v}"),
                });
            }
        }
        Ok(())
    }
}

/// The stage at which a track was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackStage {
    /// Too few fit points.
    FitPoints,
    /// Fit fraction too low.
    FitFraction,
    /// Outside the pseudorapidity window.
    Eta,
    /// DCA too large.
    Dca,
}

impl fmt::Display for TrackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FitPoints => write!(f, "fit points"),
            Self::FitFraction => write!(f, "fit fraction"),
            Self::Eta => write!(f, "eta"),
            Self::Dca => write!(f, "dca"),
        }
    }
}

/// Diagnostic points reported to the cascade observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadePoint {
    /// Before any cut; every visited track reaches this.
    PreCut,
    /// After fit points, fit fraction, and |η|, before the DCA cut.
    Scale,
}

/// Outcome of the cascade for one track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackVerdict {
    /// Passed every cut.
    Accepted,
    /// Rejected at the given stage.
    Rejected(TrackStage),
}

impl TrackVerdict {
    /// Whether the track passed.
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Which track population is being cut. Statistics are kept per class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackClass {
    /// Embedded truth particles matched to a reconstructed track.
    Matched,
    /// Tracks from real data.
    Data,
}

impl fmt::Display for TrackClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matched => write!(f, "matched"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// Cumulative per-class cascade counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackCutStats {
    /// Tracks that entered the cascade.
    pub visited: u64,
    /// Data tracks dropped for a negative quality flag before the cascade.
    pub bad_flag: u64,
    /// Rejected for too few fit points.
    pub failed_fit_points: u64,
    /// Rejected for a low fit fraction.
    pub failed_fit_fraction: u64,
    /// Rejected for |η|.
    pub failed_eta: u64,
    /// Rejected for DCA.
    pub failed_dca: u64,
    /// Passed the full cascade.
    pub accepted: u64,
}

impl TrackCutStats {
    fn record(&mut self, verdict: TrackVerdict) {
        match verdict {
            TrackVerdict::Accepted => self.accepted += 1,
            TrackVerdict::Rejected(TrackStage::FitPoints) => self.failed_fit_points += 1,
            TrackVerdict::Rejected(TrackStage::FitFraction) => self.failed_fit_fraction += 1,
            TrackVerdict::Rejected(TrackStage::Eta) => self.failed_eta += 1,
            TrackVerdict::Rejected(TrackStage::Dca) => self.failed_dca += 1,
        }
    }
}

impl fmt::Display for TrackCutStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "visited {} | fit points -{} | fit fraction -{} | eta -{} | dca -{} | accepted {}",
            self.visited,
            self.failed_fit_points,
            self.failed_fit_fraction,
            self.failed_eta,
            self.failed_dca,
            self.accepted
        )?;
        if self.bad_flag > 0 {
            write!(f, " (bad flag {})", self.bad_flag)?;
        }
        Ok(())
    }
}

/// The track cascade plus per-class statistics.
#[derive(Clone, Debug, Default)]
pub struct TrackCuts {
    config: TrackCutConfig,
    matched: TrackCutStats,
    data: TrackCutStats,
}

impl TrackCuts {
    /// Create a cascade with the given thresholds.
    pub fn new(config: TrackCutConfig) -> Self {
        Self {
            config,
            matched: TrackCutStats::default(),
            data: TrackCutStats::default(),
        }
    }

    /// The thresholds in use.
    pub fn config(&self) -> &TrackCutConfig {
        &self.config
    }

    /// Statistics for one class.
    pub fn stats(&self, class: TrackClass) -> &TrackCutStats {
        match class {
            TrackClass::Matched => &self.matched,
            TrackClass::Data => &self.data,
        }
    }

    fn stats_mut(&mut self, class: TrackClass) -> &mut TrackCutStats {
        match class {
            TrackClass::Matched => &mut self.matched,
            TrackClass::Data => &mut self.data,
        }
    }

    /// Count a data track dropped for its quality flag.
    pub fn record_bad_flag(&mut self) {
        self.data.bad_flag += 1;
    }

    /// Run the cascade over one track.
    ///
    /// `observe` is called with [`CascadePoint::PreCut`] for every track
    /// and with [`CascadePoint::Scale`] exactly once for tracks that pass
    /// fit points, fit fraction, and |η|.
    ///
    /// A NaN η fails the |η| cut and a NaN DCA fails the DCA cut.
    pub fn evaluate<T, F>(&mut self, class: TrackClass, track: &T, mut observe: F) -> TrackVerdict
    where
        T: TrackQuality + ?Sized,
        F: FnMut(CascadePoint),
    {
        self.stats_mut(class).visited += 1;
        observe(CascadePoint::PreCut);
        let verdict = self.cascade(track, observe);
        self.stats_mut(class).record(verdict);
        verdict
    }

    fn cascade<T, F>(&self, track: &T, mut observe: F) -> TrackVerdict
    where
        T: TrackQuality + ?Sized,
        F: FnMut(CascadePoint),
    {
        let c = &self.config;
        if track.fit_points() < c.min_fit_points {
            return TrackVerdict::Rejected(TrackStage::FitPoints);
        }
        if track.fit_fraction() < c.min_fit_fraction {
            return TrackVerdict::Rejected(TrackStage::FitFraction);
        }
        let abs_eta = track.eta().abs();
        if abs_eta.is_nan() || abs_eta > c.max_abs_eta {
            return TrackVerdict::Rejected(TrackStage::Eta);
        }
        observe(CascadePoint::Scale);
        let dca = track.dca_global();
        if dca.is_nan() || dca > c.max_dca {
            return TrackVerdict::Rejected(TrackStage::Dca);
        }
        TrackVerdict::Accepted
    }
}
