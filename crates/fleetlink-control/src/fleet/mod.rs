//! Fleet-wide deployment template reconciliation and teardown.

mod manager;

pub use manager::FleetManager;
