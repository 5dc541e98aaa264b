//! Batch upload admission.

use pxs_models::TierLevel;
use tracing::debug;

/// Largest file accepted into a batch.
pub const MAX_BATCH_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// A file offered for the batch queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCandidate {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

impl BatchCandidate {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoSlotsLeft,
    NotAnImage,
    TooLarge,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAdmission {
    pub accepted: Vec<BatchCandidate>,
    pub rejected: Vec<(BatchCandidate, RejectReason)>,
    /// Slots left before this admission.
    pub remaining_slots: usize,
}

/// Admit candidates into a queue already holding `already_queued` files.
///
/// Candidates past the tier's remaining slots are cut first; the rest are
/// filtered by type and size.
pub fn admit_batch(
    tier: Option<TierLevel>,
    already_queued: usize,
    candidates: Vec<BatchCandidate>,
) -> BatchAdmission {
    let limit = tier.unwrap_or_default().benefits().batch_limit as usize;
    let remaining_slots = limit.saturating_sub(already_queued);

    let mut admission = BatchAdmission {
        remaining_slots,
        ..BatchAdmission::default()
    };

    for (index, candidate) in candidates.into_iter().enumerate() {
        let reason = if index >= remaining_slots {
            Some(RejectReason::NoSlotsLeft)
        } else if !candidate.content_type.starts_with("image/") {
            Some(RejectReason::NotAnImage)
        } else if candidate.size > MAX_BATCH_FILE_BYTES {
            Some(RejectReason::TooLarge)
        } else {
            None
        };

        match reason {
            Some(reason) => admission.rejected.push((candidate, reason)),
            None => admission.accepted.push(candidate),
        }
    }

    debug!(
        accepted = admission.accepted.len(),
        rejected = admission.rejected.len(),
        remaining_slots,
        "Batch admission"
    );
    admission
}
