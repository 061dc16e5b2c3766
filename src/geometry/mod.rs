pub mod cap;
pub mod cell;
pub mod cell_id;
pub mod shape;

pub use cap::Cap;
pub use cell::Cell;
pub use cell_id::CellId;
pub use shape::{Polygon, ReferencePoint, Shape};
