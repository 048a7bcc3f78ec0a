//! Data returned by the sync core.

pub mod menu;
pub mod status;

pub use menu::{flatten_leaves, parse_menu, CheckState, MenuItem};
pub use status::{parse_status_updates, PathUpdate, SyncStatus};
