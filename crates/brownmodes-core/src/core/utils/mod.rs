pub mod directions;
pub mod grid;
