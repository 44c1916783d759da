pub mod grid;

pub use grid::{FieldGrid, GRID_COLS, GRID_ROWS};
