//! State commitment over a custody instance
//!
//! A snapshot is a canonical, participant-sorted view of one instance. Its
//! SHA-256 root lets two replicas (or an auditor and the live instance)
//! confirm they hold identical custody state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use types::ids::{AccountId, CohortId, TokenId};
use types::participant::{ParticipantRecord, ParticipantStatus};

use crate::schedule::Schedule;

/// Point-in-time view of a custody instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodySnapshot {
    pub cohort_id: CohortId,
    pub custody_account: AccountId,
    pub token: TokenId,
    pub deposit_amount: Decimal,
    pub schedule: Schedule,
    pub paused: bool,
    pub forfeited: Decimal,
    /// Sorted by participant id
    pub participants: Vec<(AccountId, ParticipantRecord)>,
}

impl CustodySnapshot {
    /// SHA-256 root over every field, in a fixed byte layout.
    ///
    /// Decimals are normalized first so `100` and `100.00` hash alike.
    pub fn root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.cohort_id.as_uuid().as_bytes());
        hasher.update(self.custody_account.as_uuid().as_bytes());
        hasher.update((self.token.as_str().len() as u64).to_be_bytes());
        hasher.update(self.token.as_str().as_bytes());
        hasher.update(self.deposit_amount.normalize().serialize());
        hasher.update(self.schedule.cohort_start().to_be_bytes());
        hasher.update(self.schedule.deposit_window_end().to_be_bytes());
        hasher.update(self.schedule.finish_time().to_be_bytes());
        hasher.update([self.paused as u8]);
        hasher.update(self.forfeited.normalize().serialize());
        hasher.update((self.participants.len() as u64).to_be_bytes());
        for (participant, record) in &self.participants {
            hasher.update(participant.as_uuid().as_bytes());
            hasher.update(record.deposited_amount.normalize().serialize());
            hasher.update([status_tag(record.status)]);
        }
        hasher.finalize().into()
    }
}

fn status_tag(status: ParticipantStatus) -> u8 {
    match status {
        ParticipantStatus::InProgress => 0,
        ParticipantStatus::Withdrawable => 1,
        ParticipantStatus::Completed => 2,
        ParticipantStatus::Failed => 3,
    }
}

/// Lower-case hex rendering of a root, for logs and reports.
pub fn root_hex(root: &[u8; 32]) -> String {
    root.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CohortConfig;

    fn snapshot() -> CustodySnapshot {
        let config = CohortConfig::new(
            Decimal::from(100),
            TokenId::from("USDC"),
            AccountId::new(),
            1_000,
        )
        .with_deposit_grace(100);
        CustodySnapshot {
            cohort_id: CohortId::new(),
            custody_account: AccountId::new(),
            token: TokenId::from("USDC"),
            deposit_amount: Decimal::from(100),
            schedule: Schedule::from_config(&config, 0).unwrap(),
            paused: false,
            forfeited: Decimal::ZERO,
            participants: vec![(AccountId::new(), ParticipantRecord::deposited(Decimal::from(100)))],
        }
    }

    #[test]
    fn test_root_deterministic() {
        let snap = snapshot();
        assert_eq!(snap.root(), snap.clone().root());
    }

    #[test]
    fn test_root_ignores_decimal_scale() {
        let snap = snapshot();
        let mut rescaled = snap.clone();
        rescaled.deposit_amount = Decimal::new(10_000, 2);
        assert_eq!(snap.root(), rescaled.root());
    }

    #[test]
    fn test_root_changes_with_status() {
        let snap = snapshot();
        let mut judged = snap.clone();
        judged.participants[0].1.status = ParticipantStatus::Withdrawable;
        assert_ne!(snap.root(), judged.root());
    }

    #[test]
    fn test_root_changes_with_pause() {
        let snap = snapshot();
        let mut paused = snap.clone();
        paused.paused = true;
        assert_ne!(snap.root(), paused.root());
    }

    #[test]
    fn test_snapshot_serialization() {
        let snap = snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let deser: CustodySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, deser);
    }

    #[test]
    fn test_root_hex() {
        let root = snapshot().root();
        let hex = root_hex(&root);
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(root_hex(&[0xab; 32]), "ab".repeat(32));
    }
}
