//! On-disk state: sessions, the daemon PID registry, and the server
//! registry. Every operation is a fresh filesystem read or write — no
//! in-memory caching, per the cross-process sharing contract.

mod atomic;
mod error;
mod pid_registry;
mod server_registry;
mod session_store;

pub use error::StorageError;
pub use pid_registry::PidRegistry;
pub use server_registry::{ServerRegistryError, ServerRegistryReader};
pub use session_store::{LogSelector, ReadLogOptions, SessionStore};
