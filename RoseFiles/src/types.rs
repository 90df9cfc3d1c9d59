//! Value types shared across formats

use glam::{IVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub const WHITE: Color4 = Color4 {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub minimum: Vec3,
    pub maximum: Vec3,
}

/// Bounding circle on the ground plane, stored as integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingSphere {
    pub center: IVec2,
    pub radius: i32,
}

/// Fixed-size 2-D array addressed by `(x, y)`.
///
/// Cells are stored row by row (`y` outer, `x` inner).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridCells<T>")]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// Unchecked serialized form of a [`Grid`].
#[derive(Deserialize)]
struct GridCells<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> TryFrom<GridCells<T>> for Grid<T> {
    type Error = Error;

    fn try_from(grid: GridCells<T>) -> Result<Self> {
        Grid::from_cells(grid.width, grid.height, grid.cells)
    }
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }

    /// Resize, keeping the overlapping region and default-filling the rest.
    pub fn resize(&mut self, width: usize, height: usize) {
        let mut cells = vec![T::default(); width * height];
        for y in 0..height.min(self.height) {
            for x in 0..width.min(self.width) {
                cells[y * width + x] = self.cells[y * self.width + x].clone();
            }
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
    }
}

impl<T> Grid<T> {
    /// Build a grid from row-major cells.
    pub fn from_cells(width: usize, height: usize, cells: Vec<T>) -> Result<Self> {
        let expected = width.checked_mul(height).unwrap_or(usize::MAX);
        if cells.len() != expected {
            return Err(Error::ShapeMismatch {
                what: "grid",
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> Result<usize> {
        if x >= self.width {
            return Err(Error::IndexOutOfRange {
                what: "grid column",
                index: x,
                len: self.width,
            });
        }
        if y >= self.height {
            return Err(Error::IndexOutOfRange {
                what: "grid row",
                index: y,
                len: self.height,
            });
        }
        Ok(y * self.width + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Result<&T> {
        let index = self.index(x, y)?;
        Ok(&self.cells[index])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Result<&mut T> {
        let index = self.index(x, y)?;
        Ok(&mut self.cells[index])
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<()> {
        *self.get_mut(x, y)? = value;
        Ok(())
    }

    /// Cells in storage order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cells.iter()
    }

    /// Iterate `((x, y), cell)` in storage order.
    pub fn indexed(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i % width, i / width), cell))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_resize_preserves_overlap() {
        let mut grid: Grid<i32> = Grid::new(3, 2);
        grid.set(0, 0, 1).unwrap();
        grid.set(2, 1, 6).unwrap();
        grid.set(1, 1, 5).unwrap();

        grid.resize(2, 3);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 3);
        assert_eq!(*grid.get(0, 0).unwrap(), 1);
        assert_eq!(*grid.get(1, 1).unwrap(), 5);
        assert_eq!(*grid.get(1, 2).unwrap(), 0);
        assert!(grid.get(2, 1).is_err());
    }

    #[test]
    fn test_grid_out_of_range() {
        let grid: Grid<u8> = Grid::new(4, 4);
        let err = grid.get(4, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::IndexOutOfRange {
                what: "grid column",
                index: 4,
                len: 4
            }
        ));
    }

    #[test]
    fn test_from_cells_checks_shape() {
        assert!(matches!(
            Grid::from_cells(2, 2, vec![1u8, 2, 3]),
            Err(Error::ShapeMismatch {
                what: "grid",
                expected: 4,
                actual: 3
            })
        ));
        assert!(Grid::<u8>::from_cells(usize::MAX, 2, Vec::new()).is_err());
    }

    #[test]
    fn test_deserialize_rejects_wrong_cell_count() {
        let grid: Grid<u8> =
            serde_json::from_str(r#"{"width":2,"height":1,"cells":[7,8]}"#).unwrap();
        assert_eq!(*grid.get(1, 0).unwrap(), 8);

        let result: std::result::Result<Grid<u8>, _> =
            serde_json::from_str(r#"{"width":2,"height":2,"cells":[]}"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("grid has 0 cells, expected 4"), "{message}");
    }

    #[test]
    fn test_indexed_order() {
        let grid = Grid::from_cells(2, 2, vec!['a', 'b', 'c', 'd']).unwrap();
        let cells: Vec<_> = grid.indexed().map(|(xy, c)| (xy, *c)).collect();
        assert_eq!(cells[1], ((1, 0), 'b'));
        assert_eq!(cells[2], ((0, 1), 'c'));
    }
}
