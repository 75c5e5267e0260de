//! Data-access layer: a shared cache of backend reads keyed by descriptors.

mod descriptor;
mod mutation;
mod persist;
mod state;
mod store;

pub use descriptor::{Descriptor, DescriptorPattern};
pub use mutation::{Mutation, PendingMutation};
pub use persist::{NoopStorage, SnapshotStorage, SqliteSnapshots};
pub use state::{Query, QueryState, QueryStatus};
pub use store::{QueryFn, QueryStore, StoreOptions};
