pub mod error;
pub mod geometry;
pub mod index;
pub mod math;
pub mod query;
pub mod text_format;

#[cfg(test)]
mod testing;

pub use error::{OrbisError, Result};
pub use geometry::{Cell, CellId, Polygon, Shape};
pub use index::{IndexOptions, ShapeIndex};
pub use math::{ChordAngle, Point};
pub use query::{ClosestEdgeQuery, EdgeResult, Options, Target};
