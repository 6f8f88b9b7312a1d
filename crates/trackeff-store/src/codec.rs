//! Binary encode/decode for store records.
//!
//! All multi-byte values are little-endian. Strings are length-prefixed
//! (u32 byte count followed by UTF-8 bytes).

use std::io::{self, Read, Write};

use indexmap::IndexMap;
use trackeff_axis::{AxisDef, AxisGrid, GridAxis};
use trackeff_core::EventIdentity;
use trackeff_engine::RunMetrics;
use trackeff_hist::{Histogram, HistogramGrid};

use crate::error::StoreError;
use crate::types::StoreHeader;
use crate::{FORMAT_VERSION, MAGIC};

/// Upper bound on any length prefix, so a corrupt count cannot trigger a
/// huge allocation before the stream runs dry.
const MAX_LEN: u32 = 1 << 28;

/// Upper bound on the cell count of any decoded grid or histogram, checked
/// before the layout is allocated.
const MAX_CELLS: u64 = 1 << 24;

/// Axis names a grid may carry.
const AXIS_NAMES: [&str; 6] = ["lumi", "cent", "vz", "pt", "eta", "phi"];

// ── Primitive writers ──────────────────────────────────────────────

fn write_u8(w: &mut dyn Write, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

fn write_u32_le(w: &mut dyn Write, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u64_le(w: &mut dyn Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f64_le(w: &mut dyn Write, v: f64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_len(w: &mut dyn Write, len: usize) -> Result<(), StoreError> {
    let n = u32::try_from(len)
        .ok()
        .filter(|&n| n <= MAX_LEN)
        .ok_or_else(|| StoreError::malformed(format!("length {len} too large to encode")))?;
    write_u32_le(w, n)?;
    Ok(())
}

fn write_str(w: &mut dyn Write, s: &str) -> Result<(), StoreError> {
    write_len(w, s.len())?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn write_f64_slice(w: &mut dyn Write, values: &[f64]) -> io::Result<()> {
    for &v in values {
        write_f64_le(w, v)?;
    }
    Ok(())
}

// ── Primitive readers ──────────────────────────────────────────────

fn read_u8(r: &mut dyn Read) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32_le(r: &mut dyn Read) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64_le(r: &mut dyn Read) -> io::Result<f64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_len(r: &mut dyn Read, what: &str) -> Result<usize, StoreError> {
    let n = read_u32_le(r)?;
    if n > MAX_LEN {
        return Err(StoreError::malformed(format!("{what} length {n} exceeds limit")));
    }
    Ok(n as usize)
}

fn read_str(r: &mut dyn Read) -> Result<String, StoreError> {
    let len = read_len(r, "string")?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| StoreError::malformed(format!("invalid UTF-8: {e}")))
}

fn read_f64_vec(r: &mut dyn Read, len: usize) -> io::Result<Vec<f64>> {
    (0..len).map(|_| read_f64_le(r)).collect()
}

// ── Header ─────────────────────────────────────────────────────────

/// Write magic, format version, and header fields.
pub fn encode_header(w: &mut dyn Write, header: &StoreHeader) -> Result<(), StoreError> {
    w.write_all(&MAGIC)?;
    write_u8(w, FORMAT_VERSION)?;
    write_str(w, &header.crate_version)?;
    write_u64_le(w, header.config_hash)?;
    write_str(w, &header.centrality)?;
    Ok(())
}

/// Read and validate magic and version, then the header fields.
pub fn decode_header(r: &mut dyn Read) -> Result<StoreHeader, StoreError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(StoreError::BadMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion { found: version });
    }
    Ok(StoreHeader {
        crate_version: read_str(r)?,
        config_hash: read_u64_le(r)?,
        centrality: read_str(r)?,
    })
}

// ── Identity log ───────────────────────────────────────────────────

/// Write the accepted-event identities in acceptance order.
pub fn encode_identities(w: &mut dyn Write, ids: &[EventIdentity]) -> Result<(), StoreError> {
    write_len(w, ids.len())?;
    for id in ids {
        write_u32_le(w, id.run.0)?;
        write_u32_le(w, id.event.0)?;
    }
    Ok(())
}

/// Read an identity log written by [`encode_identities`].
pub fn decode_identities(r: &mut dyn Read) -> Result<Vec<EventIdentity>, StoreError> {
    let n = read_len(r, "identity log")?;
    let mut ids = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        let run = read_u32_le(r)?;
        let event = read_u32_le(r)?;
        ids.push(EventIdentity::new(run, event));
    }
    Ok(ids)
}

// ── Metrics ────────────────────────────────────────────────────────

/// Number of counters in a metrics record.
const METRIC_COUNT: u8 = 12;

/// Write the run counters as a fixed-count u64 record.
pub fn encode_metrics(w: &mut dyn Write, m: &RunMetrics) -> Result<(), StoreError> {
    write_u8(w, METRIC_COUNT)?;
    for v in [
        m.events_seen,
        m.alignment_failures,
        m.rejected_masked,
        m.rejected_event_cuts,
        m.rejected_centrality,
        m.rejected_outside_binning,
        m.accepted_events,
        m.accepted_truth,
        m.accepted_matched,
        m.accepted_data,
        m.accepted_data_pid,
        m.non_finite_weights,
    ] {
        write_u64_le(w, v)?;
    }
    Ok(())
}

/// Read a metrics record written by [`encode_metrics`].
pub fn decode_metrics(r: &mut dyn Read) -> Result<RunMetrics, StoreError> {
    let count = read_u8(r)?;
    if count != METRIC_COUNT {
        return Err(StoreError::malformed(format!(
            "expected {METRIC_COUNT} metric counters, found {count}"
        )));
    }
    let mut v = [0u64; METRIC_COUNT as usize];
    for slot in &mut v {
        *slot = read_u64_le(r)?;
    }
    Ok(RunMetrics {
        events_seen: v[0],
        alignment_failures: v[1],
        rejected_masked: v[2],
        rejected_event_cuts: v[3],
        rejected_centrality: v[4],
        rejected_outside_binning: v[5],
        accepted_events: v[6],
        accepted_truth: v[7],
        accepted_matched: v[8],
        accepted_data: v[9],
        accepted_data_pid: v[10],
        non_finite_weights: v[11],
    })
}

// ── Histograms ─────────────────────────────────────────────────────

fn encode_axis(w: &mut dyn Write, axis: &AxisDef) -> io::Result<()> {
    write_u32_le(w, axis.bins())?;
    write_f64_le(w, axis.low())?;
    write_f64_le(w, axis.high())
}

fn decode_axis(r: &mut dyn Read) -> io::Result<AxisDef> {
    let bins = read_u32_le(r)?;
    let low = read_f64_le(r)?;
    let high = read_f64_le(r)?;
    Ok(AxisDef::new(bins, low, high))
}

fn encode_layout(w: &mut dyn Write, axes: &[AxisDef]) -> Result<(), StoreError> {
    let ndim = u8::try_from(axes.len())
        .map_err(|_| StoreError::malformed(format!("{} dimensions", axes.len())))?;
    write_u8(w, ndim)?;
    for a in axes {
        encode_axis(w, a)?;
    }
    Ok(())
}

fn decode_layout(r: &mut dyn Read) -> Result<Vec<AxisDef>, StoreError> {
    let ndim = read_u8(r)?;
    (0..ndim).map(|_| decode_axis(r).map_err(StoreError::from)).collect()
}

/// Product of the bin counts, or `Malformed` if it exceeds [`MAX_CELLS`].
fn bounded_cells<'a>(
    axes: impl IntoIterator<Item = &'a AxisDef>,
    what: &str,
) -> Result<usize, StoreError> {
    let cells = axes
        .into_iter()
        .try_fold(1u64, |n, a| n.checked_mul(u64::from(a.bins())))
        .filter(|&n| n <= MAX_CELLS)
        .ok_or_else(|| StoreError::malformed(format!("{what} exceeds {MAX_CELLS} cells")))?;
    Ok(cells as usize)
}

/// Write one histogram: layout, fill counters, then per-bin sums.
pub fn encode_histogram(w: &mut dyn Write, h: &Histogram) -> Result<(), StoreError> {
    encode_layout(w, h.axes())?;
    write_u64_le(w, h.entries())?;
    write_u64_le(w, h.misses())?;
    write_len(w, h.bin_count())?;
    write_f64_slice(w, h.contents())?;
    write_f64_slice(w, h.sumw2())?;
    Ok(())
}

/// Read a histogram written by [`encode_histogram`].
pub fn decode_histogram(r: &mut dyn Read) -> Result<Histogram, StoreError> {
    let axes = decode_layout(r)?;
    let entries = read_u64_le(r)?;
    let misses = read_u64_le(r)?;
    let bins = read_len(r, "histogram")?;
    let expected = bounded_cells(&axes, "histogram layout")?;
    if bins != expected {
        return Err(StoreError::malformed(format!(
            "histogram has {bins} bins, layout expects {expected}"
        )));
    }
    let sumw = read_f64_vec(r, bins)?;
    let sumw2 = read_f64_vec(r, bins)?;
    Histogram::from_parts(&axes, sumw, sumw2, entries, misses)
        .map_err(|e| StoreError::malformed(format!("histogram: {e}")))
}

/// Write a list of named histograms.
pub fn encode_named(w: &mut dyn Write, named: &[(String, &Histogram)]) -> Result<(), StoreError> {
    write_len(w, named.len())?;
    for (name, h) in named {
        write_str(w, name)?;
        encode_histogram(w, h)?;
    }
    Ok(())
}

/// Read named histograms, rejecting duplicate names.
pub fn decode_named(r: &mut dyn Read) -> Result<IndexMap<String, Histogram>, StoreError> {
    let n = read_len(r, "histogram list")?;
    let mut out = IndexMap::with_capacity(n.min(256));
    for _ in 0..n {
        let name = read_str(r)?;
        let h = decode_histogram(r)?;
        if out.insert(name.clone(), h).is_some() {
            return Err(StoreError::malformed(format!("duplicate histogram '{name}'")));
        }
    }
    Ok(out)
}

// ── Grids ──────────────────────────────────────────────────────────

/// Write a grid: its axes, then each family with its occupied cells.
pub fn encode_grid(w: &mut dyn Write, grid: &HistogramGrid) -> Result<(), StoreError> {
    let axes = grid.axes().axes();
    write_len(w, axes.len())?;
    for a in axes {
        write_str(w, a.name)?;
        encode_axis(w, &a.axis)?;
    }
    let families: Vec<_> = grid.families().collect();
    write_len(w, families.len())?;
    for (name, family) in families {
        write_str(w, name)?;
        encode_layout(w, family.layout())?;
        write_len(w, family.occupied_count())?;
        for (index, cell) in family.occupied() {
            write_u64_le(w, index as u64)?;
            encode_histogram(w, cell)?;
        }
    }
    Ok(())
}

fn axis_name(name: &str) -> Result<&'static str, StoreError> {
    AXIS_NAMES
        .iter()
        .copied()
        .find(|&known| known == name)
        .ok_or_else(|| StoreError::malformed(format!("unknown grid axis '{name}'")))
}

/// Read a grid written by [`encode_grid`].
///
/// Families are re-registered in stored order, so family ids match the
/// ones the writer saw.
pub fn decode_grid(r: &mut dyn Read) -> Result<HistogramGrid, StoreError> {
    let naxes = read_len(r, "grid axes")?;
    let mut axes = Vec::with_capacity(naxes.min(8));
    for _ in 0..naxes {
        let name = axis_name(&read_str(r)?)?;
        axes.push(GridAxis {
            name,
            axis: decode_axis(r)?,
        });
    }
    bounded_cells(axes.iter().map(|a| &a.axis), "grid")?;
    let axis_grid =
        AxisGrid::new(axes).map_err(|e| StoreError::malformed(format!("grid axes: {e}")))?;
    let mut grid = HistogramGrid::new(axis_grid);

    let nfamilies = read_len(r, "family list")?;
    for _ in 0..nfamilies {
        let name = read_str(r)?;
        let layout = decode_layout(r)?;
        bounded_cells(&layout, "cell layout")?;
        let id = grid
            .add_family(&name, &layout)
            .map_err(|e| StoreError::malformed(format!("family '{name}': {e}")))?;
        let ncells = read_len(r, "cell list")?;
        for _ in 0..ncells {
            let index = usize::try_from(read_u64_le(r)?)
                .map_err(|_| StoreError::malformed("cell index overflows usize"))?;
            let cell = decode_histogram(r)?;
            grid.insert_cell(id, index, cell)
                .map_err(|e| StoreError::malformed(format!("family '{name}': {e}")))?;
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_histogram() -> Histogram {
        let mut h = Histogram::new(&[AxisDef::new(4, 0.0, 4.0), AxisDef::new(2, -1.0, 1.0)]).unwrap();
        h.fill(&[1.5, 0.5], 2.0);
        h.fill(&[3.5, -0.5], 0.5);
        h.fill(&[9.0, 0.0], 1.0);
        h
    }

    #[test]
    fn header_round_trip() {
        let header = StoreHeader {
            crate_version: "0.1.0".into(),
            config_hash: 0xDEAD_BEEF,
            centrality: "band".into(),
        };
        let mut buf = Vec::new();
        encode_header(&mut buf, &header).unwrap();
        assert_eq!(&buf[..4], b"TEFF");
        assert_eq!(buf[4], FORMAT_VERSION);
        let decoded = decode_header(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn histogram_keeps_sums_and_counters() {
        let h = sample_histogram();
        let mut buf = Vec::new();
        encode_histogram(&mut buf, &h).unwrap();
        let back = decode_histogram(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, h);
        assert_eq!(back.misses(), 1);
        assert_eq!(back.sumw2()[back.contents().iter().position(|&c| c == 2.0).unwrap()], 4.0);
    }

    #[test]
    fn truncated_histogram_is_io_error() {
        let mut buf = Vec::new();
        encode_histogram(&mut buf, &sample_histogram()).unwrap();
        buf.truncate(buf.len() - 3);
        match decode_histogram(&mut Cursor::new(buf)) {
            Err(StoreError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn bin_count_must_match_layout() {
        let mut buf = Vec::new();
        encode_layout(&mut buf, &[AxisDef::new(3, 0.0, 3.0)]).unwrap();
        write_u64_le(&mut buf, 0).unwrap();
        write_u64_le(&mut buf, 0).unwrap();
        write_u32_le(&mut buf, 2).unwrap();
        write_f64_slice(&mut buf, &[0.0; 4]).unwrap();
        match decode_histogram(&mut Cursor::new(buf)) {
            Err(StoreError::Malformed { .. }) => {}
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn oversized_length_is_rejected_before_allocation() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, u32::MAX).unwrap();
        match read_str(&mut Cursor::new(buf)) {
            Err(StoreError::Malformed { .. }) => {}
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn huge_grid_is_rejected_before_allocation() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 3).unwrap();
        for name in ["cent", "vz", "pt"] {
            write_str(&mut buf, name).unwrap();
            encode_axis(&mut buf, &AxisDef::new(1 << 21, 0.0, 1.0)).unwrap();
        }
        write_u32_le(&mut buf, 1).unwrap();
        write_str(&mut buf, "truth").unwrap();
        encode_layout(&mut buf, &[AxisDef::new(6, -3.2, 3.2)]).unwrap();
        write_u32_le(&mut buf, 0).unwrap();
        match decode_grid(&mut Cursor::new(buf)) {
            Err(StoreError::Malformed { detail }) => assert!(detail.contains("grid")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn huge_histogram_layout_is_rejected_before_allocation() {
        let mut buf = Vec::new();
        encode_layout(&mut buf, &[AxisDef::new(u32::MAX, 0.0, 1.0); 3]).unwrap();
        write_u64_le(&mut buf, 0).unwrap();
        write_u64_le(&mut buf, 0).unwrap();
        write_u32_le(&mut buf, 0).unwrap();
        match decode_histogram(&mut Cursor::new(buf)) {
            Err(StoreError::Malformed { detail }) => assert!(detail.contains("layout")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_named_histogram_is_rejected() {
        let h = sample_histogram();
        let named = vec![("vz".to_string(), &h), ("vz".to_string(), &h)];
        let mut buf = Vec::new();
        encode_named(&mut buf, &named).unwrap();
        match decode_named(&mut Cursor::new(buf)) {
            Err(StoreError::Malformed { detail }) => assert!(detail.contains("vz")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn unknown_axis_name_is_rejected() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 1).unwrap();
        write_str(&mut buf, "rapidity").unwrap();
        encode_axis(&mut buf, &AxisDef::new(2, 0.0, 1.0)).unwrap();
        match decode_grid(&mut Cursor::new(buf)) {
            Err(StoreError::Malformed { detail }) => assert!(detail.contains("rapidity")),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn grid_round_trip_is_sparse() {
        let axes = AxisGrid::new(vec![
            GridAxis { name: "cent", axis: AxisDef::new(9, 0.0, 9.0) },
            GridAxis { name: "vz", axis: AxisDef::new(5, -30.0, 30.0) },
        ])
        .unwrap();
        let mut grid = HistogramGrid::new(axes);
        let layout = [AxisDef::new(10, 0.0, 5.0)];
        let a = grid.add_family("truth", &layout).unwrap();
        let b = grid.add_family("matched", &layout).unwrap();
        grid.accumulate(a, &[2, 1], &[1.2], 1.0);
        grid.accumulate(a, &[8, 4], &[4.9], 1.0);
        grid.accumulate(b, &[2, 1], &[1.2], 0.5);

        let mut buf = Vec::new();
        encode_grid(&mut buf, &grid).unwrap();
        let back = decode_grid(&mut Cursor::new(buf)).unwrap();
        assert_eq!(back, grid);
        assert_eq!(back.family_id("matched"), Some(b));
        assert_eq!(back.family(a).unwrap().occupied_count(), 2);
    }

    #[test]
    fn metrics_round_trip() {
        let m = RunMetrics {
            events_seen: 10,
            alignment_failures: 1,
            accepted_events: 7,
            accepted_truth: 30,
            non_finite_weights: 2,
            ..RunMetrics::default()
        };
        let mut buf = Vec::new();
        encode_metrics(&mut buf, &m).unwrap();
        assert_eq!(decode_metrics(&mut Cursor::new(buf)).unwrap(), m);
    }
}
