use crate::error::{MapError, Result};
use crate::spatial::TileCoord;

/// Fixed-size, row-major 2D container of optional cells.
///
/// Dimensions are set at construction and never change; an owner that needs
/// a different size builds a new grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTileGrid<T> {
    columns: usize,
    rows: usize,
    cells: Vec<Option<T>>,
}

impl<T> SparseTileGrid<T> {
    pub fn new(columns: usize, rows: usize) -> Self {
        let mut cells = Vec::with_capacity(columns * rows);
        cells.resize_with(columns * rows, || None);
        Self { columns, rows, cells }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cells (occupied or not).
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.columns && (y as usize) < self.rows
    }

    fn index(&self, x: i32, y: i32) -> Result<usize> {
        if !self.contains(x, y) {
            return Err(MapError::OutOfBounds {
                x,
                y,
                columns: self.columns,
                rows: self.rows,
            });
        }
        Ok(y as usize * self.columns + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Result<Option<&T>> {
        let i = self.index(x, y)?;
        Ok(self.cells[i].as_ref())
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Result<Option<&mut T>> {
        let i = self.index(x, y)?;
        Ok(self.cells[i].as_mut())
    }

    /// Store `value` at the cell, returning what was there before.
    pub fn set(&mut self, x: i32, y: i32, value: Option<T>) -> Result<Option<T>> {
        let i = self.index(x, y)?;
        Ok(std::mem::replace(&mut self.cells[i], value))
    }

    pub fn take(&mut self, x: i32, y: i32) -> Result<Option<T>> {
        self.set(x, y, None)
    }

    /// Row-major walk over every cell. Each call starts from the first cell.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        self.cells.iter().map(Option::as_ref)
    }

    /// Occupied cells with their coordinates, in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (TileCoord, &T)> + '_ {
        let columns = self.columns.max(1);
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.as_ref()
                .map(|v| (TileCoord::new((i % columns) as i32, (i / columns) as i32), v))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.cells.iter().flatten()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.cells.iter_mut().flatten()
    }

    /// Empty every cell.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }
}
