//! Real-time event gateway: connection directory, liveness sweep, admission,
//! event registry and dispatch.

pub mod admission;
pub mod connection;
pub mod directory;
pub mod dispatcher;
pub mod events;
pub mod handlers;
pub mod liveness;
pub mod registry;
pub mod server;

pub use connection::ConnectionHandle;
pub use directory::ConnectionDirectory;
pub use dispatcher::{DispatchError, DispatchSummary, Dispatcher};
pub use events::{EventArgs, EventPayload, EventType};
pub use liveness::LivenessSupervisor;
pub use registry::EventRegistry;
