mod store;

pub use store::{QuotaStore, SharedStore, SnapshotView};
