//! Port trait definitions for the conversation subsystem.
//!
//! Ports define the abstract interfaces the engine requires from its
//! external collaborators. Adapters implement these ports to connect the
//! engine to a real connection stack, roster, archive and store.

pub mod capability;
pub mod directory;
pub mod events;
pub mod storage;
pub mod transport;
pub mod upload;

pub use capability::{CapabilityDiscovery, MAX_FILE_SIZE_FIELD, ServiceItem};
pub use directory::{Contact, ContactDirectory};
pub use events::{EventSink, SessionEvent};
pub use storage::{ConversationStore, StoreError, StoreResult};
pub use transport::{Transport, TransportError, TransportResult};
pub use upload::{FileHandle, FileUploader, UploadError, UploadResult, UploadSlot};
