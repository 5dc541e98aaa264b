//! Support ticket models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Ticket as entered by the user, before submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SupportTicketDraft {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

/// Ticket lifecycle state in the `support_tickets` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closed,
}

/// Row inserted into the `support_tickets` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportTicket {
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_premium: bool,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl SupportTicket {
    /// Open a ticket from a draft.
    pub fn open(draft: SupportTicketDraft, is_premium: bool) -> Self {
        Self {
            email: draft.email,
            subject: draft.subject,
            message: draft.message,
            is_premium,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }
}
