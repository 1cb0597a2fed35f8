//! Paginated query engine

pub mod ports;
pub mod stream;

pub use ports::PageSource;
pub use stream::QueryStream;
