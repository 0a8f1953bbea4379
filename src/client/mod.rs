//! Client-side cart: an optimistic local store plus a best-effort
//! background mirror of every mutation to the server.

pub mod store;
pub mod sync;

pub use store::{CartStore, SyncOp};
pub use sync::SyncClient;
