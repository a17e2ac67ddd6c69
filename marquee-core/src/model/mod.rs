pub mod annotations;
pub mod geometry;
pub mod marker;

pub use annotations::{Annotations, Entry};
pub use geometry::{Extent, Geometry, Point};
pub use marker::{Marker, MarkerId, Shape};
