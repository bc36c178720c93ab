/*!
 * Synchronization Configuration
 *
 * Retrieval policy selection for `SyncChannel`
 */

use serde::{Deserialize, Serialize};

/// Order in which a channel hands out pending values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPolicy {
    /// Most recently sent value first
    #[default]
    Lifo,
    /// Oldest value first
    Fifo,
}

impl RetrievalPolicy {
    /// Parse a policy name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "lifo" => Some(Self::Lifo),
            "fifo" => Some(Self::Fifo),
            _ => None,
        }
    }
}
