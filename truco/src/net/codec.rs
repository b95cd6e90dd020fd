use serde::{Serialize, de::DeserializeOwned};

use super::errors::{ProtocolError, Result};

/// Maximum allowed frame size (64KB). Client messages are tiny; anything
/// bigger is rejected before parsing.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

pub fn decode<T: DeserializeOwned>(frame: &str) -> Result<T> {
    if frame.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            actual: frame.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(serde_json::from_str(frame)?)
}

pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    let frame = serde_json::to_string(value)?;
    if frame.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            actual: frame.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(frame)
}
