//! Host environment for the terminal: a page snapshot file stands in for the
//! browser page, and desktop tools stand in for the browser's alert APIs.

pub mod desktop;
pub mod snapshot;
pub mod tone;

pub use desktop::DesktopChannels;
pub use snapshot::{SnapshotFile, SnapshotPage};
