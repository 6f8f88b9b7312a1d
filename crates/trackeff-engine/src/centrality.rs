//! Centrality models selected by production library tag.
//!
//! Both models are threshold tables over a multiplicity, raw or
//! corrected. Analyses supply calibrated edges through
//! [`CentralityCalibration`].

use std::fmt;
use std::str::FromStr;

use trackeff_core::{CentralityInput, CentralityProvider, ConfigError};

// ── Library tags ───────────────────────────────────────────────────

/// Production library versions with a known centrality definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LibraryTag {
    /// Run 14 production; global multiplicity with vz and rate corrections.
    Sl16d,
    /// Raw reference multiplicity.
    Sl17d,
    /// Raw reference multiplicity.
    Sl18f,
    /// Raw reference multiplicity.
    Sl18h,
}

impl LibraryTag {
    const ALL: [(&'static str, LibraryTag); 4] = [
        ("SL16d", LibraryTag::Sl16d),
        ("SL17d", LibraryTag::Sl17d),
        ("SL18f", LibraryTag::Sl18f),
        ("SL18h", LibraryTag::Sl18h),
    ];

    /// Find the tag embedded in a file name or path, e.g.
    /// `st_physics_15107008_raw_SL16d.MuDst.root`.
    pub fn detect(path: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .iter()
            .find(|(name, _)| path.contains(name))
            .map(|(_, tag)| *tag)
            .ok_or_else(|| ConfigError::UnknownLibrary {
                tag: path.to_string(),
            })
    }
}

impl FromStr for LibraryTag {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, tag)| *tag)
            .ok_or_else(|| ConfigError::UnknownLibrary { tag: s.to_string() })
    }
}

impl fmt::Display for LibraryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = Self::ALL
            .iter()
            .find(|(_, t)| t == self)
            .map_or("?", |(n, _)| *n);
        write!(f, "{name}")
    }
}

// ── Calibration ────────────────────────────────────────────────────

/// Correction applied to the global reference multiplicity before
/// classification.
///
/// `corrected = gref · p(0)/p(vz) · a/(a + b·rate_khz)` where `p` is the
/// polynomial with coefficients `vz_poly` (constant term first).
#[derive(Clone, Debug, PartialEq)]
pub struct GRefMultCorrection {
    /// Vertex-z normalisation polynomial, constant term first.
    pub vz_poly: Vec<f64>,
    /// Vertex-z window in which the correction is valid (cm).
    pub vz_window: (f64, f64),
    /// Luminosity correction intercept `a`.
    pub rate_intercept: f64,
    /// Luminosity correction slope `b` per kHz.
    pub rate_slope: f64,
    /// Ascending lower edges of each class on the corrected multiplicity.
    pub edges: Vec<f64>,
}

impl GRefMultCorrection {
    fn poly(&self, z: f64) -> f64 {
        self.vz_poly.iter().rev().fold(0.0, |acc, c| acc * z + c)
    }

    /// Corrected multiplicity, or `None` outside the vz window or where
    /// the correction degenerates.
    pub fn corrected(&self, gref_mult: u32, vertex_z: f64, beam_rate: f64) -> Option<f64> {
        let (lo, hi) = self.vz_window;
        if !(lo..=hi).contains(&vertex_z) {
            return None;
        }
        let at_z = self.poly(vertex_z);
        if at_z <= 0.0 {
            return None;
        }
        let lumi = self.rate_intercept + self.rate_slope * beam_rate / 1000.0;
        if lumi <= 0.0 {
            return None;
        }
        let value = f64::from(gref_mult) * self.poly(0.0) / at_z * self.rate_intercept / lumi;
        value.is_finite().then_some(value)
    }
}

/// Calibration constants for every supported model.
///
/// The default edges are placeholders for tests and examples; production
/// analyses supply their own.
#[derive(Clone, Debug, PartialEq)]
pub struct CentralityCalibration {
    /// Ascending lower edges on raw reference multiplicity.
    pub refmult_edges: Vec<u32>,
    /// Global multiplicity correction and edges.
    pub gref: GRefMultCorrection,
}

impl Default for CentralityCalibration {
    fn default() -> Self {
        Self {
            refmult_edges: vec![10, 21, 41, 72, 118, 182, 266, 375, 441],
            gref: GRefMultCorrection {
                vz_poly: vec![1.0],
                vz_window: (-30.0, 30.0),
                rate_intercept: 1.0,
                rate_slope: 0.0,
                edges: vec![10.0, 22.0, 43.0, 76.0, 125.0, 193.0, 281.0, 396.0, 466.0],
            },
        }
    }
}

// ── CentralityModel ────────────────────────────────────────────────

/// The closed set of centrality estimators.
#[derive(Clone, Debug, PartialEq)]
pub enum CentralityModel {
    /// Thresholds on raw reference multiplicity.
    RefMultThresholds {
        /// Ascending lower edge of each class.
        edges: Vec<u32>,
    },
    /// Thresholds on corrected global reference multiplicity.
    GRefMultCorrected(GRefMultCorrection),
}

impl CentralityModel {
    /// Select the model for a production library.
    pub fn for_library(tag: LibraryTag, calibration: CentralityCalibration) -> Result<Self, ConfigError> {
        let model = match tag {
            LibraryTag::Sl16d => Self::GRefMultCorrected(calibration.gref),
            LibraryTag::Sl17d | LibraryTag::Sl18f | LibraryTag::Sl18h => Self::RefMultThresholds {
                edges: calibration.refmult_edges,
            },
        };
        model.validate()?;
        tracing::info!(library = %tag, model = model.name(), "selected centrality model");
        Ok(model)
    }

    /// Edges must be non-empty and ascending.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ascending = match self {
            Self::RefMultThresholds { edges } => {
                !edges.is_empty() && edges.windows(2).all(|w| w[0] < w[1])
            }
            Self::GRefMultCorrected(c) => {
                !c.edges.is_empty()
                    && c.edges.windows(2).all(|w| w[0] < w[1])
                    && !c.vz_poly.is_empty()
            }
        };
        if ascending {
            Ok(())
        } else {
            Err(ConfigError::InvalidCentrality {
                reason: format!("{} edges must be non-empty and strictly ascending", self.name()),
            })
        }
    }
}

/// Index of the highest edge not above `value`.
fn classify_edges<T: PartialOrd + Copy>(edges: &[T], value: T) -> Option<u32> {
    let n = edges.iter().take_while(|&&e| e <= value).count();
    n.checked_sub(1).map(|i| u32::try_from(i).unwrap_or(u32::MAX))
}

impl CentralityProvider for CentralityModel {
    fn name(&self) -> &str {
        match self {
            Self::RefMultThresholds { .. } => "refmult",
            Self::GRefMultCorrected(_) => "grefmult-corrected",
        }
    }

    fn class_count(&self) -> u32 {
        match self {
            Self::RefMultThresholds { edges } => u32::try_from(edges.len()).unwrap_or(u32::MAX),
            Self::GRefMultCorrected(c) => u32::try_from(c.edges.len()).unwrap_or(u32::MAX),
        }
    }

    fn classify(&self, input: &CentralityInput) -> Option<u32> {
        match self {
            Self::RefMultThresholds { edges } => classify_edges(edges, input.ref_mult),
            Self::GRefMultCorrected(c) => {
                let value = c.corrected(input.gref_mult, input.vertex_z, input.beam_rate)?;
                classify_edges(&c.edges, value)
            }
        }
    }
}
