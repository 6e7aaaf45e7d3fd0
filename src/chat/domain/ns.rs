//! Protocol extension namespaces consumed and produced by the engine.

/// XEP-0308 Last Message Correction.
pub const MESSAGE_CORRECT: &str = "urn:xmpp:message-correct:0";

/// XEP-0184 Message Delivery Receipts.
pub const RECEIPTS: &str = "urn:xmpp:receipts";

/// XEP-0333 Chat Markers.
pub const MARKERS: &str = "urn:xmpp:chat-markers:0";

/// XEP-0359 Unique and Stable Stanza IDs.
pub const STANZA_ID: &str = "urn:xmpp:sid:0";

/// XEP-0363 HTTP File Upload.
pub const HTTP_UPLOAD: &str = "urn:xmpp:http:upload:0";

/// XEP-0066 Out of Band Data.
pub const OUT_OF_BAND: &str = "jabber:x:oob";

/// XEP-0085 Chat State Notifications.
pub const CHAT_STATES: &str = "http://jabber.org/protocol/chatstates";

/// XEP-0203 Delayed Delivery.
pub const DELAY: &str = "urn:xmpp:delay";

/// XEP-0280 Message Carbons.
pub const CARBONS: &str = "urn:xmpp:carbons:2";

/// XEP-0334 Message Processing Hints.
pub const HINTS: &str = "urn:xmpp:hints";
