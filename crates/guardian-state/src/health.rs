use serde::{Deserialize, Serialize};

/// Condition of one storage tier's backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierStatus {
    Ok,
    Missing,
    Corrupted,
}

impl TierStatus {
    pub fn is_ok(self) -> bool {
        self == TierStatus::Ok
    }
}

/// Per-tier health as reported on `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryHealth {
    pub stm: TierStatus,
    pub ltm: TierStatus,
}

impl MemoryHealth {
    /// A tier that has not been written yet still counts as healthy.
    pub fn is_healthy(&self) -> bool {
        self.stm != TierStatus::Corrupted && self.ltm != TierStatus::Corrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tiers_are_healthy() {
        let h = MemoryHealth {
            stm: TierStatus::Missing,
            ltm: TierStatus::Missing,
        };
        assert!(h.is_healthy());
    }

    #[test]
    fn corrupted_tier_is_unhealthy() {
        let h = MemoryHealth {
            stm: TierStatus::Ok,
            ltm: TierStatus::Corrupted,
        };
        assert!(!h.is_healthy());
        assert_eq!(serde_json::to_value(h).unwrap()["ltm"], "corrupted");
    }
}
