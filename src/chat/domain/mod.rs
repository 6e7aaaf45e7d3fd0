//! Domain types for the conversation subsystem.
//!
//! Pure types with no infrastructure dependencies. Records and timelines
//! are mutated only through the narrow operations the invariants allow;
//! stanza views are read-only.

mod address;
mod attributes;
mod ids;
mod outbound;
mod record;
mod stanza;
mod timeline;

pub mod ns;

pub use address::{Address, AddressError};
pub use attributes::MessageAttributes;
pub use ids::{ConversationId, MessageId};
pub use outbound::{DeliveryHint, OutboundStanza, StanzaBuilder};
pub use record::{
    Acknowledgment, CorrectionState, Direction, EPHEMERAL_TTL_SECONDS, MessageRecord,
    MessageRecordBuilder, RecordKind, SupersededVersion, UploadState,
};
pub use stanza::{ChatState, Marker, MarkerKind, StanzaKind, StanzaView, StanzaViewBuilder};
pub use timeline::{Timeline, TimelineError};
