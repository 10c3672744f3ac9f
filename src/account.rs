//! Source accounts and account ledger entries

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{AccountEntry, SignerKey};

use crate::keys::account_id_to_string;
use crate::{Error, Result};

/// Transaction source account with its shared sequence counter
///
/// The sequence number is atomic so that a single account can be handed to
/// several builders; each submitted transaction consumes exactly one slot.
#[derive(Debug)]
pub struct SourceAccount {
    account_id: String,
    sequence: AtomicI64,
}

impl SourceAccount {
    pub fn new(account_id: impl Into<String>, sequence: i64) -> Self {
        Self {
            account_id: account_id.into(),
            sequence: AtomicI64::new(sequence),
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Last consumed sequence number
    pub fn sequence_number(&self) -> i64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Sequence number the next transaction would use, without consuming it
    pub fn next_sequence_number(&self) -> Result<i64> {
        self.sequence_number()
            .checked_add(1)
            .ok_or_else(|| Error::SequenceOverflow(self.account_id.clone()))
    }

    /// Hand back `sequence` if it is still the last consumed number
    ///
    /// Returns false when a later transaction already took a slot; the
    /// account then has to be reloaded from the ledger.
    pub fn release_sequence_number(&self, sequence: i64) -> bool {
        let Some(previous) = sequence.checked_sub(1) else {
            return false;
        };
        self.sequence
            .compare_exchange(sequence, previous, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Consume the next sequence number and return it
    pub fn increment_sequence_number(&self) -> Result<i64> {
        self.sequence
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |seq| seq.checked_add(1))
            .map(|previous| previous + 1)
            .map_err(|_| Error::SequenceOverflow(self.account_id.clone()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountThresholds {
    pub master_weight: u8,
    pub low_threshold: u8,
    pub med_threshold: u8,
    pub high_threshold: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFlags {
    pub auth_required: bool,
    pub auth_revocable: bool,
    pub auth_immutable: bool,
    pub auth_clawback_enabled: bool,
}

impl AccountFlags {
    fn from_bits(flags: u32) -> Self {
        Self {
            auth_required: flags & 0x1 != 0,
            auth_revocable: flags & 0x2 != 0,
            auth_immutable: flags & 0x4 != 0,
            auth_clawback_enabled: flags & 0x8 != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSigner {
    pub key: String,
    pub weight: u32,
}

/// Account ledger entry in a readable form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_id: String,
    pub sequence: i64,
    pub subentry_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_destination: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub home_domain: String,
    pub thresholds: AccountThresholds,
    pub flags: AccountFlags,
    /// Balance in stroops
    pub balance: i64,
    pub signers: Vec<AccountSigner>,
}

impl AccountInfo {
    /// Source account starting from the entry's current sequence number
    pub fn source_account(&self) -> SourceAccount {
        SourceAccount::new(self.account_id.clone(), self.sequence)
    }

    /// Signer key to weight, including the master key
    pub fn signer_summary(&self) -> Vec<(String, u32)> {
        let mut summary = vec![(
            self.account_id.clone(),
            u32::from(self.thresholds.master_weight),
        )];
        summary.extend(self.signers.iter().map(|s| (s.key.clone(), s.weight)));
        summary
    }
}

impl From<&AccountEntry> for AccountInfo {
    fn from(entry: &AccountEntry) -> Self {
        let [master_weight, low_threshold, med_threshold, high_threshold] = entry.thresholds.0;
        Self {
            account_id: account_id_to_string(&entry.account_id),
            sequence: entry.seq_num.0,
            subentry_count: entry.num_sub_entries,
            inflation_destination: entry.inflation_dest.as_ref().map(account_id_to_string),
            home_domain: entry.home_domain.to_utf8_string_lossy(),
            thresholds: AccountThresholds {
                master_weight,
                low_threshold,
                med_threshold,
                high_threshold,
            },
            flags: AccountFlags::from_bits(entry.flags),
            balance: entry.balance,
            signers: entry
                .signers
                .iter()
                .map(|signer| AccountSigner {
                    key: signer_key_to_string(&signer.key),
                    weight: signer.weight,
                })
                .collect(),
        }
    }
}

/// Strkey form of a signer key (G..., T..., X... or P...)
pub fn signer_key_to_string(key: &SignerKey) -> String {
    match key {
        SignerKey::Ed25519(k) => stellar_strkey::ed25519::PublicKey(k.0).to_string(),
        SignerKey::PreAuthTx(k) => stellar_strkey::PreAuthTx(k.0).to_string(),
        SignerKey::HashX(k) => stellar_strkey::HashX(k.0).to_string(),
        SignerKey::Ed25519SignedPayload(p) => match p.payload.as_slice().try_into() {
            Ok(payload) => stellar_strkey::ed25519::SignedPayload {
                ed25519: p.ed25519.0,
                payload,
            }
            .to_string(),
            Err(_) => hex::encode(p.payload.as_slice()),
        },
    }
}
