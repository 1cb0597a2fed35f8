//! Multi-tenant session management

pub mod manager;
pub mod scheduler;
pub mod store;

pub use manager::SessionManager;
pub use scheduler::RefreshScheduler;
pub use store::SessionStore;
