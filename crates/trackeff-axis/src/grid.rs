//! Mixed-radix grid shapes and named axis grids.

use smallvec::SmallVec;
use trackeff_core::{BinCoord, ConfigError};

use crate::axis::AxisDef;

/// The shape of an N-dimensional grid of bins, with precomputed strides.
///
/// Linear indices follow row-major order: the last dimension varies
/// fastest. `strides[i]` is the product of all dimension sizes after `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridShape {
    dims: SmallVec<[u32; 4]>,
    strides: SmallVec<[usize; 4]>,
    cell_count: usize,
}

impl GridShape {
    /// Build a shape from per-dimension bin counts.
    ///
    /// Returns `Err(ConfigError::GridTooLarge)` if the cell count
    /// overflows `usize`. A zero-dimensional shape has one cell.
    pub fn new(dims: &[u32]) -> Result<Self, ConfigError> {
        let mut cell_count: usize = 1;
        for &d in dims {
            cell_count = cell_count
                .checked_mul(d as usize)
                .ok_or(ConfigError::GridTooLarge)?;
        }

        // strides[i] = product(dims[j] for j > i)
        let n = dims.len();
        let mut strides: SmallVec<[usize; 4]> = SmallVec::from_elem(1, n);
        if n > 1 {
            for i in (0..n - 1).rev() {
                strides[i] = strides[i + 1] * dims[i + 1] as usize;
            }
        }

        Ok(Self {
            dims: SmallVec::from_slice(dims),
            strides,
            cell_count,
        })
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Bin count of each dimension.
    pub fn dims(&self) -> &[u32] {
        &self.dims
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Flatten a coordinate, or `None` if it has the wrong rank or any
    /// component is out of range.
    pub fn linear_index(&self, coord: &[u32]) -> Option<usize> {
        if coord.len() != self.dims.len() {
            return None;
        }
        let mut index = 0usize;
        for ((&c, &d), &s) in coord.iter().zip(&self.dims).zip(&self.strides) {
            if c >= d {
                return None;
            }
            index += c as usize * s;
        }
        Some(index)
    }

    /// Inverse of [`linear_index`](Self::linear_index).
    pub fn coord_of(&self, index: usize) -> Option<BinCoord> {
        if index >= self.cell_count {
            return None;
        }
        let mut rest = index;
        let coord = self
            .strides
            .iter()
            .map(|&s| {
                let c = rest / s;
                rest %= s;
                c as u32
            })
            .collect();
        Some(coord)
    }
}

/// A named axis participating in a grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridAxis {
    /// Name used in errors and persisted output.
    pub name: &'static str,
    /// The binning.
    pub axis: AxisDef,
}

/// An ordered set of validated axes plus the shape they induce.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisGrid {
    axes: Vec<GridAxis>,
    shape: GridShape,
}

impl AxisGrid {
    /// Validate every axis and build the grid shape.
    pub fn new(axes: Vec<GridAxis>) -> Result<Self, ConfigError> {
        for a in &axes {
            a.axis.validate(a.name)?;
        }
        let dims: SmallVec<[u32; 4]> = axes.iter().map(|a| a.axis.bins()).collect();
        let shape = GridShape::new(&dims)?;
        Ok(Self { axes, shape })
    }

    /// The axes, in coordinate order.
    pub fn axes(&self) -> &[GridAxis] {
        &self.axes
    }

    /// The induced shape.
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    /// Locate one value per axis.
    ///
    /// Returns `None` if the number of values does not match or any
    /// value falls outside its axis.
    pub fn locate(&self, values: &[f64]) -> Option<BinCoord> {
        if values.len() != self.axes.len() {
            return None;
        }
        self.axes
            .iter()
            .zip(values)
            .map(|(a, &v)| a.axis.bin(v))
            .collect()
    }

    /// Locate and flatten in one step.
    pub fn locate_index(&self, values: &[f64]) -> Option<usize> {
        self.locate(values)
            .and_then(|c| self.shape.linear_index(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use smallvec::smallvec;

    #[test]
    fn strides_rightmost_fastest() {
        let s = GridShape::new(&[3, 9, 5, 20]).unwrap();
        assert_eq!(s.cell_count(), 3 * 9 * 5 * 20);
        assert_eq!(s.linear_index(&[0, 0, 0, 1]), Some(1));
        assert_eq!(s.linear_index(&[0, 0, 1, 0]), Some(20));
        assert_eq!(s.linear_index(&[0, 1, 0, 0]), Some(100));
        assert_eq!(s.linear_index(&[1, 0, 0, 0]), Some(900));
    }

    #[test]
    fn rejects_bad_coords() {
        let s = GridShape::new(&[3, 4]).unwrap();
        assert_eq!(s.linear_index(&[3, 0]), None);
        assert_eq!(s.linear_index(&[0]), None);
        assert_eq!(s.coord_of(12), None);
    }

    #[test]
    fn overflow_is_config_error() {
        match GridShape::new(&[u32::MAX, u32::MAX, u32::MAX]) {
            Err(ConfigError::GridTooLarge) => {}
            other => panic!("expected GridTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn scalar_shape_has_one_cell() {
        let s = GridShape::new(&[]).unwrap();
        assert_eq!(s.cell_count(), 1);
        assert_eq!(s.linear_index(&[]), Some(0));
    }

    #[test]
    fn axis_grid_locates_and_rejects() {
        let g = AxisGrid::new(vec![
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
        let c: BinCoord = smallvec![3, 2];
        assert_eq!(g.locate(&[3.0, 0.0]), Some(c));
        assert_eq!(g.locate_index(&[3.0, 0.0]), Some(3 * 5 + 2));
        assert_eq!(g.locate(&[3.0, -30.0]), None);
        assert_eq!(g.locate(&[3.0]), None);
    }

    #[test]
    fn axis_grid_validates() {
        let r = AxisGrid::new(vec![GridAxis {
            name: "lumi",
            axis: AxisDef::new(0, 0.0, 1.0),
        }]);
        match r {
            Err(ConfigError::InvalidAxis { name: "lumi", .. }) => {}
            other => panic!("expected InvalidAxis, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn index_round_trips(
            a in 1u32..6, b in 1u32..6, c in 1u32..6,
            i in 0usize..216,
        ) {
            let s = GridShape::new(&[a, b, c]).unwrap();
            let i = i % s.cell_count();
            let coord = s.coord_of(i).unwrap();
            prop_assert_eq!(s.linear_index(&coord), Some(i));
        }
    }
}
