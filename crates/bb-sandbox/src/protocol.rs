//! Host → sandbox messages and their byte encoding.
//!
//! Messages are MessagePack (`rmp-serde`, named fields) so the worker only
//! ever sees its own deserialised copy, never a reference into the host.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SandboxMessage {
    /// Replace the stored script text.
    LoadScript { script: String },
    /// Run the most recently loaded script with no arguments.
    ExecuteScript,
    /// Stop the worker. Sent on destroy; never by user interaction.
    Shutdown,
}

impl SandboxMessage {
    pub fn encode(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}
