//! Connection provider.
//!
//! Every logical operation opens one session from a [`Connector`], runs a
//! handful of statements from [`statements`] and finishes it. Nothing here is
//! pooled or kept between operations.

/// Engine errors.
pub mod error;
/// In-memory engine for tests (`testing` feature).
#[cfg(any(test, feature = "testing"))]
pub mod memory;
/// `sqlx` MySQL adapter for Dolt.
pub mod mysql;
/// Connection configuration.
pub mod options;
/// Session and connector traits.
pub mod session;
/// The fixed SQL vocabulary.
pub mod statements;

pub use error::EngineError;
#[cfg(any(test, feature = "testing"))]
pub use memory::{MemoryConnector, MemoryEngine, Operation};
pub use mysql::{MySqlConnector, MySqlSession};
pub use options::ConnectionOptions;
pub use session::{CheckoutMode, Connector, EngineSession};
