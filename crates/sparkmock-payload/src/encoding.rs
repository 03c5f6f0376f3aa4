//! Encoding-mode selection between the compact and readable formats.

use crate::error::EncodeError;
use crate::payload::Payload;
use crate::wire;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two mutually exclusive wire encodings a run may use.
///
/// The mode is chosen once per process, never per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Sparkplug protobuf wire format.
    Compact,
    /// Indented JSON mirroring the wire schema field-for-field.
    Readable,
}

impl Encoding {
    /// Serialize a payload in this mode.
    ///
    /// The payload is validated first; a malformed payload is reported as an
    /// [`EncodeError`] so the caller can drop the tick instead of publishing
    /// garbage.
    pub fn encode(&self, payload: &Payload) -> Result<Vec<u8>, EncodeError> {
        payload.validate()?;
        match self {
            Encoding::Compact => Ok(wire::encode(payload)),
            Encoding::Readable => Ok(serde_json::to_vec_pretty(payload)?),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Compact => write!(f, "compact"),
            Encoding::Readable => write!(f, "readable"),
        }
    }
}
