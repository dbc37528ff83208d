//! Per-run correlation id.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Random id shared by a scan's tracing span and its report.
///
/// Serialized as the hyphenated UUID; the `scan` span only carries
/// [`short`](Self::short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Leading 32 bits as lowercase hex.
    pub fn short(&self) -> String {
        let (head, ..) = self.0.as_fields();
        format!("{head:08x}")
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_form_leads_the_display_form() {
        let id = ScanId(Uuid::from_u128(0x0000_00ab_1234_4000_8000_0000_0000_0001));
        assert_eq!(id.short(), "000000ab");
        assert_eq!(id.to_string(), "000000ab-1234-4000-8000-000000000001");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ScanId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        assert_eq!(serde_json::from_str::<ScanId>(&json).unwrap(), id);
    }
}
