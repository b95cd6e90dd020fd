//! Wire protocol between clients and the room layer.
//!
//! Frames are JSON text, one message per frame, tagged by a `type` field.

/// JSON framing with a size cap.
pub mod codec;

/// Protocol error types.
pub mod errors;

/// Client and server message types.
pub mod messages;

pub use errors::ProtocolError;
pub use messages::{ClientMessage, MemberView, ServerMessage};
