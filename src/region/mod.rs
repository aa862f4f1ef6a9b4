mod attributes;
mod region_id;
mod region_set;

pub use attributes::AttributeTable;
pub use region_id::RegionId;
pub use region_set::{Region, RegionFeature, RegionSet};
