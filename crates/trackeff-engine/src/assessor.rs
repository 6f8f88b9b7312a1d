//! The efficiency assessor: one call per reconstructed event.
//!
//! [`EfficiencyAssessor`] owns the truth stream, the aligner cursor, the
//! cut evaluators, and (once initialized) every histogram. Processing an
//! event runs, in order: alignment, event cuts, centrality, event
//! coordinate, event QA, the truth pass, the matched-pair cascade, the
//! data-track cascade, and the count-grid fill.

use std::error::Error;
use std::fmt;

use smallvec::{smallvec, SmallVec};
use trackeff_axis::{AxisDef, AxisGrid};
use trackeff_core::{
    AlignmentError, BinCoord, CentralityInput, EventIdentity, InitError, LifecycleError, Phase,
    ProcessError, ReconstructedEvent, TrackQuality, TruthEvent, TruthSource,
};
use trackeff_cuts::{
    CascadePoint, EventCut, EventCutStats, EventVerdict, TrackClass, TrackCutStats, TrackCuts,
};
use trackeff_hist::{FamilyId, HistogramGrid};

use crate::align::EventAligner;
use crate::config::{AssessorConfig, AxisSet};
use crate::metrics::RunMetrics;
use crate::output::{AssessorOutput, GridFamilies, HistogramSink, COUNT_AXIS, COUNT_FAMILY};
use crate::qa::{count_len, count_value, QaHistograms, TrackQa};

// ── Outcomes ───────────────────────────────────────────────────────

/// Why an aligned event contributed nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The run is on the mask list.
    Masked,
    /// One or more event cuts failed; all failing cuts are listed.
    EventCuts(SmallVec<[EventCut; 6]>),
    /// The centrality provider returned no class.
    CentralityInvalid,
    /// The event coordinate lies outside a grid axis.
    OutsideBinning,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Masked => write!(f, "run masked"),
            Self::EventCuts(cuts) => {
                let names: Vec<String> = cuts.iter().map(ToString::to_string).collect();
                write!(f, "failed event cuts [{}]", names.join(", "))
            }
            Self::CentralityInvalid => write!(f, "no centrality class"),
            Self::OutsideBinning => write!(f, "outside grid binning"),
        }
    }
}

/// What an accepted event contributed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventSummary {
    /// Identity of the event.
    pub identity: EventIdentity,
    /// Position of the matching entry in the truth stream.
    pub truth_index: usize,
    /// Centrality class.
    pub centrality: u32,
    /// Event coordinate on the event axes (luminosity, centrality, vertex-z).
    pub coord: BinCoord,
    /// Truth primaries passing the particle-type filter.
    pub truth: u32,
    /// Matched pairs passing the full cascade.
    pub matched: u32,
    /// Data tracks passing the full cascade.
    pub data: u32,
    /// Accepted data tracks inside the PID window.
    pub data_pid: u32,
}

/// Result of processing one aligned event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event was accumulated.
    Accepted(EventSummary),
    /// The event was skipped; this is a counted outcome, not an error.
    Rejected(RejectReason),
}

impl EventOutcome {
    /// Whether the event was accumulated.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Failure of [`EfficiencyAssessor::finalize_into`].
#[derive(Debug)]
pub enum FinalizeError<E> {
    /// The assessor was not initialized, or already finalized.
    Lifecycle(LifecycleError),
    /// The sink refused the output. The output is returned so it can be
    /// handed to another sink.
    Sink {
        /// The sink's error, unchanged.
        error: E,
        /// The output that was not persisted.
        output: Box<AssessorOutput>,
    },
}

impl<E: fmt::Display> fmt::Display for FinalizeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lifecycle(e) => write!(f, "lifecycle violation: {e}"),
            Self::Sink { error, .. } => write!(f, "histogram sink failed: {error}"),
        }
    }
}

impl<E: Error + 'static> Error for FinalizeError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lifecycle(e) => Some(e),
            Self::Sink { error, .. } => Some(error),
        }
    }
}

impl<E> From<LifecycleError> for FinalizeError<E> {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

// ── Run state ──────────────────────────────────────────────────────

/// Everything allocated at initialization.
struct RunState {
    grid: HistogramGrid,
    families: GridFamilies,
    counts: HistogramGrid,
    count_family: FamilyId,
    qa: QaHistograms,
    momentum: Option<AxisDef>,
    identities: Vec<EventIdentity>,
}

/// Per-event values shared by every track fill.
struct EventContext<'a> {
    identity: EventIdentity,
    centrality: f64,
    coord: BinCoord,
    config: &'a AssessorConfig,
}

/// Counts of what one event contributed.
#[derive(Default)]
struct Tally {
    truth: u32,
    matched: u32,
    data: u32,
    data_pid: u32,
}

/// Inverse-Jacobian weight of an accepted track. Non-finite weights are
/// counted and logged; the caller skips its weighted fills.
fn checked_weight<T: TrackQuality + ?Sized>(
    track: &T,
    identity: EventIdentity,
    metrics: &mut RunMetrics,
) -> Option<f64> {
    let weight = track.jacobian_weight();
    if weight.is_none() {
        metrics.non_finite_weights += 1;
        tracing::warn!(
            identity = %identity,
            dca_global = track.dca_global(),
            dca_transverse = track.dca_transverse(),
            "non-finite Jacobian weight, weighted fills skipped"
        );
    }
    weight
}

/// Run the cascade for one track, filling the staged QA histograms.
fn run_cascade<T: TrackQuality + ?Sized>(
    cuts: &mut TrackCuts,
    class: TrackClass,
    qa: &mut TrackQa,
    centrality: f64,
    track: &T,
) -> bool {
    let verdict = cuts.evaluate(class, track, |point| match point {
        CascadePoint::PreCut => qa.pre.fill(centrality, track),
        CascadePoint::Scale => qa.fill_scale(centrality, track),
    });
    if verdict.is_accepted() {
        qa.post.fill(centrality, track);
    }
    verdict.is_accepted()
}

impl RunState {
    /// Grid coordinate of a track: the event coordinate plus the momentum
    /// bin when momentum is a grid axis.
    fn track_coord(&self, ctx: &EventContext<'_>, pt: f64) -> Option<BinCoord> {
        let mut coord = ctx.coord.clone();
        if let Some(axis) = self.momentum {
            coord.push(axis.bin(pt)?);
        }
        Some(coord)
    }

    fn fill_event_qa(&mut self, ctx: &EventContext<'_>, event: &ReconstructedEvent, truth: &TruthEvent) {
        let qa = &mut self.qa.event;
        qa.vz.fill(&[event.vertex.z], 1.0);
        qa.ref_mult.fill(&[count_value(event.ref_mult)], 1.0);
        qa.gref_mult.fill(&[count_value(event.gref_mult)], 1.0);
        qa.centrality.fill(&[ctx.centrality], 1.0);
        qa.n_primaries
            .fill(&[count_len(event.tracks.len())], 1.0);
        qa.n_mc.fill(&[count_value(truth.mc_track_count)], 1.0);
        qa.n_matched
            .fill(&[count_len(truth.matched.len())], 1.0);
    }

    fn truth_pass(&mut self, ctx: &EventContext<'_>, truth: &TruthEvent) -> u32 {
        let mut accepted = 0;
        let selected = truth
            .particles
            .iter()
            .filter(|p| p.is_primary() && ctx.config.accepts_geant_id(p.geant_id));
        for p in selected {
            accepted += 1;
            self.qa.truth_pt.fill(&[ctx.centrality, p.pt], 1.0);
            if let Some(coord) = self.track_coord(ctx, p.pt) {
                self.grid
                    .accumulate(self.families.truth, &coord, &[p.phi, p.eta], 1.0);
            }
        }
        accepted
    }

    fn matched_pass(
        &mut self,
        ctx: &EventContext<'_>,
        truth: &TruthEvent,
        cuts: &mut TrackCuts,
        metrics: &mut RunMetrics,
    ) -> u32 {
        let mut accepted = 0;
        let selected = truth
            .matched
            .iter()
            .filter(|m| m.is_primary() && ctx.config.accepts_geant_id(m.geant_id));
        for pair in selected {
            if !run_cascade(cuts, TrackClass::Matched, &mut self.qa.matched, ctx.centrality, pair) {
                continue;
            }
            accepted += 1;
            self.qa.matched_pt.fill(&[ctx.centrality, pair.pt], 1.0);

            let weight = checked_weight(pair, ctx.identity, metrics);
            if let Some(w) = weight {
                self.qa
                    .matched
                    .weighted_dca
                    .fill(&[ctx.centrality, pair.pt, pair.dca_global], w);
            }
            let Some(cell_weight) = grid_weight(ctx.config, weight) else {
                continue;
            };
            if let Some(coord) = self.track_coord(ctx, pair.pt) {
                self.families
                    .matched
                    .fill(&mut self.grid, &coord, pair, cell_weight);
            }
        }
        accepted
    }

    fn data_pass(
        &mut self,
        ctx: &EventContext<'_>,
        event: &ReconstructedEvent,
        cuts: &mut TrackCuts,
        metrics: &mut RunMetrics,
    ) -> (u32, u32) {
        let (mut accepted, mut pid_accepted) = (0, 0);
        for track in &event.tracks {
            if track.flag < 0 {
                cuts.record_bad_flag();
                continue;
            }
            if !run_cascade(cuts, TrackClass::Data, &mut self.qa.data, ctx.centrality, track) {
                continue;
            }
            accepted += 1;
            let in_pid = track.pid_sigma.abs() < ctx.config.pid_window;
            if in_pid {
                pid_accepted += 1;
            }

            let weight = checked_weight(track, ctx.identity, metrics);
            if let Some(w) = weight {
                let values = [ctx.centrality, track.pt, track.dca_global];
                self.qa.data.weighted_dca.fill(&values, w);
                if in_pid {
                    self.qa.data_pid_weighted_dca.fill(&values, w);
                }
            }
            let Some(cell_weight) = grid_weight(ctx.config, weight) else {
                continue;
            };
            if let Some(coord) = self.track_coord(ctx, track.pt) {
                self.families
                    .data
                    .fill(&mut self.grid, &coord, track, cell_weight);
                if in_pid {
                    self.families
                        .data_pid
                        .fill(&mut self.grid, &coord, track, cell_weight);
                }
            }
        }
        (accepted, pid_accepted)
    }
}

/// Weight for grid-cell fills, or `None` if the cell fill must be skipped.
fn grid_weight(config: &AssessorConfig, jacobian: Option<f64>) -> Option<f64> {
    if config.weight_cells_by_jacobian {
        jacobian
    } else {
        Some(1.0)
    }
}

// ── EfficiencyAssessor ─────────────────────────────────────────────

/// Aligns, cuts, and accumulates embedding events into efficiency
/// histograms.
///
/// # Lifecycle
///
/// Created `Uninitialized`: axes and cuts may be changed. [`initialize`]
/// validates the configuration and allocates every histogram.
/// [`process`] is then called once per reconstructed event. [`finalize`]
/// moves the output out; afterwards every `process` call fails with a
/// lifecycle error, so no event is ever counted after hand-off.
///
/// [`initialize`]: EfficiencyAssessor::initialize
/// [`process`]: EfficiencyAssessor::process
/// [`finalize`]: EfficiencyAssessor::finalize
pub struct EfficiencyAssessor<S> {
    source: S,
    config: AssessorConfig,
    phase: Phase,
    aligner: EventAligner,
    track_cuts: TrackCuts,
    metrics: RunMetrics,
    run: Option<RunState>,
}

impl<S: TruthSource> EfficiencyAssessor<S> {
    /// Create an uninitialized assessor over a truth stream.
    pub fn new(source: S, config: AssessorConfig) -> Self {
        let track_cuts = TrackCuts::new(config.track_cuts.clone());
        Self {
            source,
            config,
            phase: Phase::Uninitialized,
            aligner: EventAligner::new(),
            track_cuts,
            metrics: RunMetrics::default(),
            run: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The configuration.
    pub fn config(&self) -> &AssessorConfig {
        &self.config
    }

    /// Mutable configuration; only while uninitialized.
    pub fn config_mut(&mut self) -> Result<&mut AssessorConfig, LifecycleError> {
        self.require_uninitialized("configure")?;
        Ok(&mut self.config)
    }

    /// Cumulative counters so far.
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Event-cut statistics so far.
    pub fn event_cut_stats(&self) -> &EventCutStats {
        self.config.event_cuts.stats()
    }

    /// Track-cut statistics so far for one class.
    pub fn track_cut_stats(&self, class: TrackClass) -> &TrackCutStats {
        self.track_cuts.stats(class)
    }

    /// The truth stream.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Give back the truth stream.
    pub fn into_source(self) -> S {
        self.source
    }

    fn require_uninitialized(&self, operation: &'static str) -> Result<(), LifecycleError> {
        match self.phase {
            Phase::Uninitialized => Ok(()),
            phase => Err(LifecycleError { operation, phase }),
        }
    }

    fn axes_mut(&mut self) -> Result<&mut AxisSet, LifecycleError> {
        self.require_uninitialized("set axis")?;
        Ok(&mut self.config.axes)
    }

    // ── Axis setters ───────────────────────────────────────────────

    /// Replace the luminosity axis.
    pub fn set_luminosity_axis(&mut self, bins: u32, low: f64, high: f64) -> Result<(), LifecycleError> {
        self.axes_mut()?.luminosity = AxisDef::new(bins, low, high);
        Ok(())
    }

    /// Replace the centrality axis.
    pub fn set_centrality_axis(&mut self, bins: u32, low: f64, high: f64) -> Result<(), LifecycleError> {
        self.axes_mut()?.centrality = AxisDef::new(bins, low, high);
        Ok(())
    }

    /// Replace the vertex-z axis.
    pub fn set_vertex_z_axis(&mut self, bins: u32, low: f64, high: f64) -> Result<(), LifecycleError> {
        self.axes_mut()?.vertex_z = AxisDef::new(bins, low, high);
        Ok(())
    }

    /// Replace the transverse-momentum axis.
    pub fn set_momentum_axis(&mut self, bins: u32, low: f64, high: f64) -> Result<(), LifecycleError> {
        self.axes_mut()?.momentum = AxisDef::new(bins, low, high);
        Ok(())
    }

    /// Replace the pseudorapidity axis.
    pub fn set_eta_axis(&mut self, bins: u32, low: f64, high: f64) -> Result<(), LifecycleError> {
        self.axes_mut()?.eta = AxisDef::new(bins, low, high);
        Ok(())
    }

    /// Replace the azimuth axis.
    pub fn set_phi_axis(&mut self, bins: u32, low: f64, high: f64) -> Result<(), LifecycleError> {
        self.axes_mut()?.phi = AxisDef::new(bins, low, high);
        Ok(())
    }

    /// Restore every axis to its default.
    pub fn reset_axes_to_defaults(&mut self) -> Result<(), LifecycleError> {
        self.axes_mut()?.reset_to_defaults();
        Ok(())
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Validate the configuration and allocate every histogram.
    ///
    /// # Errors
    ///
    /// [`InitError::Config`] if any axis, cut, or the centrality provider
    /// is invalid; [`InitError::Lifecycle`] if already initialized.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        self.require_uninitialized("initialize")?;
        let cfg = &self.config;
        let axes = cfg.axes;

        // 1. Every axis, cut, and the provider must be valid.
        cfg.validate()?;

        // 2. Track grid and its families.
        let mut grid = HistogramGrid::new(AxisGrid::new(cfg.grid.track_axes(&axes))?);
        let families = GridFamilies::register(&mut grid, &axes)?;

        // 3. Count grid over the event axes.
        let mut counts = HistogramGrid::new(AxisGrid::new(cfg.grid.event_axes(&axes))?);
        let count_family = counts.add_family(COUNT_FAMILY, &[COUNT_AXIS, COUNT_AXIS])?;

        // 4. Diagnostic histograms.
        let qa = QaHistograms::new(&axes)?;

        tracing::info!(
            centrality = cfg.centrality.as_ref().map(|c| c.name()).unwrap_or_default(),
            grid_cells = grid.axes().shape().cell_count(),
            families = grid.families().count(),
            "efficiency assessor initialized"
        );
        tracing::info!(cuts = %cfg.event_cuts.describe(), "event cuts");
        tracing::info!(
            min_fit_points = cfg.track_cuts.min_fit_points,
            min_fit_fraction = cfg.track_cuts.min_fit_fraction,
            max_abs_eta = cfg.track_cuts.max_abs_eta,
            max_dca = cfg.track_cuts.max_dca,
            "track cuts"
        );

        self.track_cuts = TrackCuts::new(cfg.track_cuts.clone());
        self.run = Some(RunState {
            grid,
            families,
            counts,
            count_family,
            qa,
            momentum: cfg.grid.momentum.then_some(axes.momentum),
            identities: Vec::new(),
        });
        self.phase = Phase::Initialized;
        Ok(())
    }

    fn reject(&mut self, identity: EventIdentity, reason: RejectReason) -> EventOutcome {
        tracing::debug!(identity = %identity, reason = %reason, "event rejected");
        self.metrics.record_rejection(&reason);
        EventOutcome::Rejected(reason)
    }

    fn alignment_failed(&mut self, error: AlignmentError) -> ProcessError {
        self.metrics.alignment_failures += 1;
        tracing::warn!(identity = %error.identity(), error = %error, "skipping unaligned event");
        ProcessError::Alignment(error)
    }

    /// Process one reconstructed event.
    ///
    /// Cut rejections and out-of-range coordinates are `Ok` outcomes.
    ///
    /// # Errors
    ///
    /// [`ProcessError::Lifecycle`] unless initialized;
    /// [`ProcessError::Alignment`] if no truth entry has the event's
    /// identity. Both leave every histogram untouched.
    pub fn process(&mut self, event: &ReconstructedEvent) -> Result<EventOutcome, ProcessError> {
        if !self.phase.accepts_events() || self.run.is_none() {
            return Err(LifecycleError {
                operation: "process",
                phase: self.phase,
            }
            .into());
        }
        self.metrics.events_seen += 1;
        let identity = event.identity;

        let truth_index = match self.aligner.align(identity, &mut self.source) {
            Ok(i) => i,
            Err(e) => return Err(self.alignment_failed(e)),
        };

        match self.config.event_cuts.accept(event) {
            EventVerdict::Accepted => {}
            EventVerdict::Masked => return Ok(self.reject(identity, RejectReason::Masked)),
            EventVerdict::Rejected(cuts) => {
                return Ok(self.reject(identity, RejectReason::EventCuts(cuts)))
            }
        }

        let input = CentralityInput::from_event(event);
        let class = self
            .config
            .centrality
            .as_ref()
            .and_then(|p| p.classify(&input));
        let Some(class) = class else {
            return Ok(self.reject(identity, RejectReason::CentralityInvalid));
        };
        let centrality = f64::from(class);

        let mut values: SmallVec<[f64; 3]> = smallvec![];
        if self.config.grid.luminosity {
            values.push(event.beam_rate);
        }
        values.push(centrality);
        values.push(event.vertex.z);
        let coord = self.run.as_ref().and_then(|r| r.counts.locate(&values));
        let Some(coord) = coord else {
            return Ok(self.reject(identity, RejectReason::OutsideBinning));
        };

        // The aligner just loaded this entry; a source that cannot reload
        // it is treated as out of correspondence.
        let Some(truth) = self.source.get(truth_index) else {
            let error = AlignmentError::NoMatch {
                identity,
                attempts: 1,
            };
            return Err(self.alignment_failed(error));
        };
        let Some(run) = self.run.as_mut() else {
            return Err(LifecycleError {
                operation: "process",
                phase: self.phase,
            }
            .into());
        };

        let ctx = EventContext {
            identity,
            centrality,
            coord,
            config: &self.config,
        };
        run.fill_event_qa(&ctx, event, truth);
        let mut tally = Tally {
            truth: run.truth_pass(&ctx, truth),
            matched: run.matched_pass(&ctx, truth, &mut self.track_cuts, &mut self.metrics),
            ..Tally::default()
        };
        (tally.data, tally.data_pid) =
            run.data_pass(&ctx, event, &mut self.track_cuts, &mut self.metrics);

        run.counts.accumulate(
            run.count_family,
            &ctx.coord,
            &[count_value(tally.truth), count_value(tally.matched)],
            1.0,
        );
        run.identities.push(identity);

        let m = &mut self.metrics;
        m.accepted_events += 1;
        m.accepted_truth += u64::from(tally.truth);
        m.accepted_matched += u64::from(tally.matched);
        m.accepted_data += u64::from(tally.data);
        m.accepted_data_pid += u64::from(tally.data_pid);

        tracing::debug!(
            identity = %identity,
            centrality = class,
            truth = tally.truth,
            matched = tally.matched,
            data = tally.data,
            "event accepted"
        );
        Ok(EventOutcome::Accepted(EventSummary {
            identity,
            truth_index,
            centrality: class,
            coord: ctx.coord,
            truth: tally.truth,
            matched: tally.matched,
            data: tally.data,
            data_pid: tally.data_pid,
        }))
    }

    /// Move the output out and enter `Finalized`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError`] unless initialized.
    pub fn finalize(&mut self) -> Result<AssessorOutput, LifecycleError> {
        let refused = LifecycleError {
            operation: "finalize",
            phase: self.phase,
        };
        if self.phase != Phase::Initialized {
            return Err(refused);
        }
        let run = self.run.take().ok_or(refused)?;
        self.phase = Phase::Finalized;

        let event_cuts = self.config.event_cuts.stats().clone();
        let matched_cuts = self.track_cuts.stats(TrackClass::Matched).clone();
        let data_cuts = self.track_cuts.stats(TrackClass::Data).clone();
        tracing::info!(summary = %event_cuts, "event cut statistics");
        tracing::info!(summary = %matched_cuts, "matched track cut statistics");
        tracing::info!(summary = %data_cuts, "data track cut statistics");
        tracing::info!(summary = %self.metrics, "run metrics");

        Ok(AssessorOutput {
            axes: self.config.axes,
            centrality: self
                .config
                .centrality
                .as_ref()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            grid: run.grid,
            families: run.families,
            counts: run.counts,
            qa: run.qa,
            identities: run.identities,
            event_cuts,
            matched_cuts,
            data_cuts,
            metrics: self.metrics.clone(),
        })
    }

    /// Finalize and hand the output to `sink`.
    ///
    /// On success the output is returned as well.
    pub fn finalize_into<K: HistogramSink>(
        &mut self,
        sink: &mut K,
    ) -> Result<AssessorOutput, FinalizeError<K::Error>> {
        let output = self.finalize()?;
        match sink.write_output(&output) {
            Ok(()) => Ok(output),
            Err(error) => Err(FinalizeError::Sink {
                error,
                output: Box::new(output),
            }),
        }
    }
}

impl<S> fmt::Debug for EfficiencyAssessor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EfficiencyAssessor")
            .field("phase", &self.phase)
            .field("config", &self.config)
            .field("aligner", &self.aligner)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}
