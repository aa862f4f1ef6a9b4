//! Bilateral migration flows estimated from migrant stock snapshots.

mod estimate;
mod net;
mod stock;

pub use estimate::{estimate_flows, FlowEstimate, FlowMethod, FlowRecord};
pub use net::{net_migration, NetMigration, NetMigrationRecord};
pub use stock::{Period, StockEntry, StockTable};
