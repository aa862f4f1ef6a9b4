mod bbox;
mod geom;
mod resolve;

pub(crate) use bbox::BoundingBox;
pub(crate) use geom::Geometries;
pub use resolve::{ExclusionReason, ResolveReport};
pub(crate) use resolve::resolve_shapes;
