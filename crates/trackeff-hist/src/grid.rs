//! Sparse grids of histogram cells, grouped into named families.

use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt;
use trackeff_axis::{AxisDef, AxisGrid};
use trackeff_core::{BinCoord, ConfigError};

use crate::histogram::{Histogram, MAX_DIMS};

/// Handle to a family registered in a [`HistogramGrid`].
///
/// Handles are assigned sequentially in registration order and are only
/// meaningful for the grid that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FamilyId(pub u32);

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One family of cells: every grid slot holds at most one histogram with
/// the family's cell layout.
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramFamily {
    layout: SmallVec<[AxisDef; MAX_DIMS]>,
    cells: Vec<Option<Histogram>>,
}

impl HistogramFamily {
    /// Axes of every cell in this family.
    pub fn layout(&self) -> &[AxisDef] {
        &self.layout
    }

    /// The cell at linear grid index `index`, if it has been filled.
    pub fn cell(&self, index: usize) -> Option<&Histogram> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Allocated cells with their linear grid indices, in index order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &Histogram)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|h| (i, h)))
    }

    /// Number of allocated cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn slot(&mut self, index: usize) -> Option<&mut Histogram> {
        let layout = &self.layout;
        let slot = self.cells.get_mut(index)?;
        if slot.is_none() {
            // Layout was validated at registration.
            *slot = Histogram::new(layout).ok();
        }
        slot.as_mut()
    }
}

/// Named families of histogram cells over a shared [`AxisGrid`].
///
/// Storage is a flat vector per family addressed by the grid's linear
/// index; cells are allocated the first time they are filled, so
/// untouched regions of a large grid cost one `None` each.
#[derive(Clone, Debug, PartialEq)]
pub struct HistogramGrid {
    grid: AxisGrid,
    families: IndexMap<String, HistogramFamily>,
}

impl HistogramGrid {
    /// Create a grid with no families.
    pub fn new(grid: AxisGrid) -> Self {
        Self {
            grid,
            families: IndexMap::new(),
        }
    }

    /// The axis grid cells are laid over.
    pub fn axes(&self) -> &AxisGrid {
        &self.grid
    }

    /// Register a family whose cells have the given layout.
    ///
    /// Fails if the name is taken or the layout is not a valid histogram.
    pub fn add_family(&mut self, name: &str, layout: &[AxisDef]) -> Result<FamilyId, ConfigError> {
        if self.families.contains_key(name) {
            return Err(ConfigError::InvalidHistogram {
                reason: format!("family '{name}' registered twice"),
            });
        }
        Histogram::new(layout)?;
        let id = FamilyId(self.families.len() as u32);
        self.families.insert(
            name.to_string(),
            HistogramFamily {
                layout: SmallVec::from_slice(layout),
                cells: vec![None; self.grid.shape().cell_count()],
            },
        );
        Ok(id)
    }

    /// Look up a family handle by name.
    pub fn family_id(&self, name: &str) -> Option<FamilyId> {
        self.families
            .get_index_of(name)
            .map(|i| FamilyId(i as u32))
    }

    /// Borrow a family by handle.
    pub fn family(&self, id: FamilyId) -> Option<&HistogramFamily> {
        self.families.get_index(id.0 as usize).map(|(_, f)| f)
    }

    /// Families with their names, in registration order.
    pub fn families(&self) -> impl Iterator<Item = (&str, &HistogramFamily)> + '_ {
        self.families.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Locate grid coordinates for one value per grid axis.
    pub fn locate(&self, values: &[f64]) -> Option<BinCoord> {
        self.grid.locate(values)
    }

    /// Fill the cell of `family` at `coord` with `values` and `weight`.
    ///
    /// Returns `true` if the fill landed inside the cell's axes. A
    /// coordinate outside the grid or an unknown family fills nothing.
    pub fn accumulate(
        &mut self,
        family: FamilyId,
        coord: &[u32],
        values: &[f64],
        weight: f64,
    ) -> bool {
        let Some(index) = self.grid.shape().linear_index(coord) else {
            return false;
        };
        self.families
            .get_index_mut(family.0 as usize)
            .and_then(|(_, f)| f.slot(index))
            .is_some_and(|h| h.fill(values, weight))
    }

    /// The cell of `family` at `coord`, if it has been filled.
    pub fn cell(&self, family: FamilyId, coord: &[u32]) -> Option<&Histogram> {
        let index = self.grid.shape().linear_index(coord)?;
        self.family(family)?.cell(index)
    }

    /// Install a previously stored cell. Used when reading persisted grids.
    pub fn insert_cell(
        &mut self,
        family: FamilyId,
        index: usize,
        cell: Histogram,
    ) -> Result<(), ConfigError> {
        let (name, f) = self
            .families
            .get_index_mut(family.0 as usize)
            .ok_or_else(|| ConfigError::InvalidHistogram {
                reason: format!("no family with id {family}"),
            })?;
        if cell.axes() != f.layout.as_slice() {
            return Err(ConfigError::InvalidHistogram {
                reason: format!("cell layout does not match family '{name}'"),
            });
        }
        let slot = f
            .cells
            .get_mut(index)
            .ok_or_else(|| ConfigError::InvalidHistogram {
                reason: format!("cell index {index} outside grid of family '{name}'"),
            })?;
        *slot = Some(cell);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackeff_axis::GridAxis;

    fn grid() -> HistogramGrid {
        let axes = AxisGrid::new(vec![
            GridAxis {
                name: "cent",
                axis: AxisDef::new(9, -0.5, 8.5),
            },
            GridAxis {
                name: "vz",
                axis: AxisDef::new(5, -30.0, 30.0),
            },
        ])
        .unwrap();
        HistogramGrid::new(axes)
    }

    fn phi_eta() -> [AxisDef; 2] {
        [
            AxisDef::new(6, -std::f64::consts::PI, std::f64::consts::PI),
            AxisDef::new(5, -1.0, 1.0),
        ]
    }

    #[test]
    fn cells_allocate_lazily() {
        let mut g = grid();
        let truth = g.add_family("truth", &phi_eta()).unwrap();
        assert_eq!(g.family(truth).unwrap().occupied_count(), 0);
        let c = g.locate(&[2.0, 10.0]).unwrap();
        assert!(g.accumulate(truth, &c, &[0.1, 0.1], 1.0));
        assert!(g.accumulate(truth, &c, &[0.1, 0.1], 1.0));
        assert_eq!(g.family(truth).unwrap().occupied_count(), 1);
        assert_eq!(g.cell(truth, &c).unwrap().integral(), 2.0);
    }

    #[test]
    fn families_are_independent() {
        let mut g = grid();
        let a = g.add_family("matched_dca", &phi_eta()).unwrap();
        let b = g.add_family("data_dca", &phi_eta()).unwrap();
        g.accumulate(a, &[0, 0], &[0.1, 0.1], 1.0);
        assert!(g.cell(b, &[0, 0]).is_none());
        assert_eq!(g.family_id("data_dca"), Some(b));
    }

    #[test]
    fn duplicate_family_rejected() {
        let mut g = grid();
        g.add_family("truth", &phi_eta()).unwrap();
        match g.add_family("truth", &phi_eta()) {
            Err(ConfigError::InvalidHistogram { .. }) => {}
            other => panic!("expected InvalidHistogram, got {other:?}"),
        }
    }

    #[test]
    fn off_grid_coordinate_fills_nothing() {
        let mut g = grid();
        let t = g.add_family("truth", &phi_eta()).unwrap();
        assert!(!g.accumulate(t, &[9, 0], &[0.1, 0.1], 1.0));
        assert!(!g.accumulate(FamilyId(7), &[0, 0], &[0.1, 0.1], 1.0));
        assert_eq!(g.family(t).unwrap().occupied_count(), 0);
    }

    #[test]
    fn insert_cell_checks_layout() {
        let mut g = grid();
        let t = g.add_family("truth", &phi_eta()).unwrap();
        let wrong = Histogram::new(&[AxisDef::new(3, 0.0, 1.0)]).unwrap();
        assert!(g.insert_cell(t, 0, wrong).is_err());
        let right = Histogram::new(&phi_eta()).unwrap();
        assert!(g.insert_cell(t, 0, right.clone()).is_ok());
        assert!(g.insert_cell(t, 45, right).is_err());
    }
}
