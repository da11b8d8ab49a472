/// Physical dimensions of a slot grid, measured in slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub width: usize,
    pub height: usize,
}

impl GridShape {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Total slot capacity.
    pub const fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.size()
    }
}

/// A slot index together with its column/row inside a [`GridShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotPosition {
    pub index: usize,
    pub column: usize,
    pub row: usize,
}

impl SlotPosition {
    /// Position of a linear slot index, `None` when it lies outside the grid.
    pub fn from_index(shape: GridShape, index: usize) -> Option<Self> {
        if shape.width == 0 || !shape.contains(index) {
            return None;
        }
        Some(Self {
            index,
            column: index % shape.width,
            row: index / shape.width,
        })
    }

    /// Position of a column/row pair, `None` when it lies outside the grid.
    pub fn from_coords(shape: GridShape, column: usize, row: usize) -> Option<Self> {
        if column >= shape.width || row >= shape.height {
            return None;
        }
        Some(Self {
            index: row * shape.width + column,
            column,
            row,
        })
    }
}
