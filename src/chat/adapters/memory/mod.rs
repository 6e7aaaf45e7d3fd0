//! In-memory adapters for every port.
//!
//! These back the engine for tests and embedded use without any
//! network or durable storage behind them.

pub mod capability;
pub mod directory;
pub mod events;
pub mod store;
pub mod transport;
pub mod upload;

pub use capability::StaticCapabilityDiscovery;
pub use directory::StaticContactDirectory;
pub use events::RecordingEventSink;
pub use store::InMemoryConversationStore;
pub use transport::RecordingTransport;
pub use upload::ScriptedFileUploader;
