//! Event-level cuts: vertex ranges, multiplicity, triggers, run mask.

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use trackeff_core::{ConfigError, ReconstructedEvent, RunId, TriggerId};

use crate::error::CutError;
use crate::mask::parse_run_mask;

// ── Range cut ──────────────────────────────────────────────────

/// An inclusive `[min, max]` acceptance window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeCut<T> {
    /// Smallest accepted value.
    pub min: T,
    /// Largest accepted value.
    pub max: T,
}

impl<T: PartialOrd + Copy> RangeCut<T> {
    /// Rejects iff `value > max || value < min`.
    pub fn accepts(&self, value: T) -> bool {
        !(value > self.max || value < self.min)
    }
}

impl<T: fmt::Display> fmt::Display for RangeCut<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

// ── Cut identities and verdicts ────────────────────────────────

/// One independently toggled event-level cut.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCut {
    /// Vertex x range.
    Vx,
    /// Vertex y range.
    Vy,
    /// Vertex z range.
    Vz,
    /// Radial vertex range.
    Vr,
    /// Reference multiplicity range (raw or global).
    RefMult,
    /// Trigger-id membership.
    Trigger,
}

impl fmt::Display for EventCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vx => write!(f, "Vx"),
            Self::Vy => write!(f, "Vy"),
            Self::Vz => write!(f, "Vz"),
            Self::Vr => write!(f, "Vr"),
            Self::RefMult => write!(f, "RefMult"),
            Self::Trigger => write!(f, "trigger"),
        }
    }
}

/// Outcome of [`EventCuts::accept`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventVerdict {
    /// Every enabled cut passed.
    Accepted,
    /// The run is masked; no other cut was evaluated.
    Masked,
    /// At least one enabled cut failed. Lists every failing cut.
    Rejected(SmallVec<[EventCut; 6]>),
}

impl EventVerdict {
    /// Whether the event passed.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

// ── Statistics ─────────────────────────────────────────────────

/// Cumulative event-cut statistics.
///
/// `events` counts events evaluated after removing masked runs; masked
/// events are counted only in `masked`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventCutStats {
    /// Events evaluated (masked runs excluded).
    pub events: u64,
    /// Events short-circuited by the run mask.
    pub masked: u64,
    /// Events rejected by at least one cut.
    pub rejected: u64,
    /// Rejections per enabled cut, in the order cuts were enabled.
    pub per_cut: IndexMap<EventCut, u64>,
    /// For each configured trigger, events that did not carry it.
    pub per_trigger: IndexMap<TriggerId, u64>,
}

impl EventCutStats {
    /// Fraction of evaluated events lost to `cut`, or 0 with no events.
    pub fn loss(&self, cut: EventCut) -> f64 {
        let failed = self.per_cut.get(&cut).copied().unwrap_or(0);
        ratio(failed, self.events)
    }

    /// Fraction of evaluated events rejected by any cut.
    pub fn total_loss(&self) -> f64 {
        ratio(self.rejected, self.events)
    }
}

fn ratio(n: u64, d: u64) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

impl fmt::Display for EventCutStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "event cut statistics (after removing masked runs)")?;
        writeln!(f, "  events evaluated: {}", self.events)?;
        writeln!(f, "  events masked:    {}", self.masked)?;
        for (cut, n) in &self.per_cut {
            writeln!(
                f,
                "  rejected by {cut}: {n} (loss {:.4})",
                self.loss(*cut)
            )?;
        }
        if !self.per_trigger.is_empty() {
            let list: Vec<String> = self
                .per_trigger
                .iter()
                .map(|(t, n)| format!("{t}: {n}"))
                .collect();
            writeln!(f, "  missing per trigger: [{}]", list.join(", "))?;
        }
        write!(
            f,
            "  total rejected: {} (loss {:.4})",
            self.rejected,
            self.total_loss()
        )
    }
}

// ── EventCuts ──────────────────────────────────────────────────

/// Configurable event-level cuts with cumulative statistics.
///
/// All cuts are disabled by default. Setting a range enables it; adding
/// a trigger enables the trigger cut.
#[derive(Clone, Debug, Default)]
pub struct EventCuts {
    vx: Option<RangeCut<f64>>,
    vy: Option<RangeCut<f64>>,
    vz: Option<RangeCut<f64>>,
    vr: Option<RangeCut<f64>>,
    ref_mult: Option<RangeCut<u32>>,
    use_gref_mult: bool,
    triggers: IndexSet<TriggerId>,
    masked_runs: BTreeSet<RunId>,
    stats: EventCutStats,
}

impl EventCuts {
    /// No cuts enabled, no runs masked.
    pub fn new() -> Self {
        Self::default()
    }

    fn enable(&mut self, cut: EventCut) {
        self.stats.per_cut.entry(cut).or_insert(0);
    }

    /// Accept `min <= vx <= max`.
    pub fn set_vx_range(&mut self, min: f64, max: f64) {
        self.vx = Some(RangeCut { min, max });
        self.enable(EventCut::Vx);
    }

    /// Accept `min <= vy <= max`.
    pub fn set_vy_range(&mut self, min: f64, max: f64) {
        self.vy = Some(RangeCut { min, max });
        self.enable(EventCut::Vy);
    }

    /// Accept `min <= vz <= max`.
    pub fn set_vz_range(&mut self, min: f64, max: f64) {
        self.vz = Some(RangeCut { min, max });
        self.enable(EventCut::Vz);
    }

    /// Accept `min <= sqrt(vx² + vy²) <= max`.
    pub fn set_vr_range(&mut self, min: f64, max: f64) {
        self.vr = Some(RangeCut { min, max });
        self.enable(EventCut::Vr);
    }

    /// Accept `min <= multiplicity <= max`.
    pub fn set_ref_mult_range(&mut self, min: u32, max: u32) {
        self.ref_mult = Some(RangeCut { min, max });
        self.enable(EventCut::RefMult);
    }

    /// Cut on the global-track reference multiplicity instead of the raw one.
    pub fn use_gref_mult(&mut self, use_gref: bool) {
        self.use_gref_mult = use_gref;
    }

    /// Whether the multiplicity cut uses the global variant.
    pub fn uses_gref_mult(&self) -> bool {
        self.use_gref_mult
    }

    /// Add an accepted trigger. Duplicates are ignored.
    pub fn add_trigger(&mut self, trigger: TriggerId) {
        if self.triggers.insert(trigger) {
            self.stats.per_trigger.insert(trigger, 0);
            self.enable(EventCut::Trigger);
        }
    }

    /// Add several accepted triggers.
    pub fn add_triggers<I: IntoIterator<Item = TriggerId>>(&mut self, triggers: I) {
        for t in triggers {
            self.add_trigger(t);
        }
    }

    /// Configured triggers, in insertion order.
    pub fn triggers(&self) -> impl Iterator<Item = TriggerId> + '_ {
        self.triggers.iter().copied()
    }

    /// Reject every event from `run`.
    pub fn mask_run(&mut self, run: RunId) {
        self.masked_runs.insert(run);
    }

    /// Mask every run listed in a run-mask text source.
    ///
    /// Returns the number of entries read.
    pub fn mask_runs_from_reader<R: BufRead>(&mut self, reader: R) -> Result<usize, CutError> {
        let runs = parse_run_mask(reader)?;
        for run in &runs {
            tracing::debug!(run = %run, "added masked run");
            self.masked_runs.insert(*run);
        }
        Ok(runs.len())
    }

    /// Mask every run listed in a run-mask file.
    pub fn mask_runs_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, CutError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading run mask file");
        let file = File::open(path).map_err(|source| CutError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.mask_runs_from_reader(BufReader::new(file))
    }

    /// Whether events from `run` are rejected outright.
    pub fn is_masked(&self, run: RunId) -> bool {
        self.masked_runs.contains(&run)
    }

    /// Masked runs, ascending.
    pub fn masked_runs(&self) -> impl Iterator<Item = RunId> + '_ {
        self.masked_runs.iter().copied()
    }

    /// Cumulative statistics.
    pub fn stats(&self) -> &EventCutStats {
        &self.stats
    }

    /// Check that every enabled range is ordered and free of NaN.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            (EventCut::Vx, self.vx),
            (EventCut::Vy, self.vy),
            (EventCut::Vz, self.vz),
            (EventCut::Vr, self.vr),
        ];
        for (cut, range) in ranges {
            if let Some(r) = range {
                if r.min.is_nan() || r.max.is_nan() || r.min > r.max {
                    return Err(ConfigError::InvalidCut {
                        reason: format!("{cut} range {r} is empty or NaN"),
                    });
                }
            }
        }
        if let Some(r) = self.ref_mult {
            if r.min > r.max {
                return Err(ConfigError::InvalidCut {
                    reason: format!("RefMult range {r} is empty"),
                });
            }
        }
        Ok(())
    }

    /// Evaluate the event and update statistics.
    ///
    /// The run mask is checked first and short-circuits. Otherwise every
    /// enabled cut is evaluated, even after one has failed.
    pub fn accept(&mut self, event: &ReconstructedEvent) -> EventVerdict {
        let run = event.identity.run;
        if self.is_masked(run) {
            tracing::debug!(run = %run, "fail: run is masked out");
            self.stats.masked += 1;
            return EventVerdict::Masked;
        }

        self.stats.events += 1;
        let mut failed: SmallVec<[EventCut; 6]> = SmallVec::new();
        let v = event.vertex;
        let checks = [
            (EventCut::Vx, self.vx, v.x),
            (EventCut::Vy, self.vy, v.y),
            (EventCut::Vz, self.vz, v.z),
            (EventCut::Vr, self.vr, v.radial()),
        ];
        for (cut, range, value) in checks {
            if let Some(r) = range {
                if !r.accepts(value) {
                    tracing::debug!(cut = %cut, value, min = r.min, max = r.max, "fail");
                    failed.push(cut);
                }
            }
        }

        if let Some(r) = self.ref_mult {
            let mult = if self.use_gref_mult {
                event.gref_mult
            } else {
                event.ref_mult
            };
            if !r.accepts(mult) {
                tracing::debug!(mult, gref = self.use_gref_mult, min = r.min, max = r.max, "fail: refmult");
                failed.push(EventCut::RefMult);
            }
        }

        if !self.triggers.is_empty() && !self.accept_trigger(event) {
            failed.push(EventCut::Trigger);
        }

        if failed.is_empty() {
            tracing::debug!(identity = %event.identity, "event accepted");
            EventVerdict::Accepted
        } else {
            self.stats.rejected += 1;
            for cut in &failed {
                *self.stats.per_cut.entry(*cut).or_insert(0) += 1;
            }
            tracing::debug!(identity = %event.identity, failed = failed.len(), "event failed");
            EventVerdict::Rejected(failed)
        }
    }

    /// Any configured trigger present passes. Each absent trigger is
    /// counted against its own counter.
    fn accept_trigger(&mut self, event: &ReconstructedEvent) -> bool {
        let mut accept = false;
        for t in &self.triggers {
            if event.trigger_ids.contains(t) {
                accept = true;
            } else {
                *self.stats.per_trigger.entry(*t).or_insert(0) += 1;
            }
        }
        if !accept {
            tracing::debug!("fail: no trigger accepted");
        }
        accept
    }

    /// Human-readable list of active cuts.
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();
        let named = [("Vx", self.vx), ("Vy", self.vy), ("Vz", self.vz), ("Vr", self.vr)];
        for (name, range) in named {
            if let Some(r) = range {
                lines.push(format!("{} <= {name} <= {}", r.min, r.max));
            }
        }
        if let Some(r) = self.ref_mult {
            let name = if self.use_gref_mult { "gRefMult" } else { "RefMult" };
            lines.push(format!("{} <= {name} <= {}", r.min, r.max));
        }
        if !self.triggers.is_empty() {
            let list: Vec<String> = self.triggers.iter().map(ToString::to_string).collect();
            lines.push(format!("triggers: [{}]", list.join(", ")));
        }
        if !self.masked_runs.is_empty() {
            let list: Vec<String> = self.masked_runs.iter().map(ToString::to_string).collect();
            lines.push(format!("masked runs: [{}]", list.join(", ")));
        }
        if lines.is_empty() {
            "no event cuts".to_string()
        } else {
            lines.join("\n")
        }
    }
}
