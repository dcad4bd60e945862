pub mod config;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::LedgerError;
pub use crate::core::service::LedgerService;
pub use crate::infrastructure::notify::in_memory::InMemoryNotifier;
pub use crate::infrastructure::notify::Notifier;
pub use crate::infrastructure::store::in_memory::InMemoryStore;
pub use crate::infrastructure::store::LedgerStore;

#[cfg(test)]
mod tests;
