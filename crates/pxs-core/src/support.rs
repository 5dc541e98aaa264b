//! Support ticket submission.

use async_trait::async_trait;
use pxs_models::{SupportTicket, SupportTicketDraft};
use tracing::info;
use validator::Validate;

use crate::error::CoreResult;
use crate::session::MemberView;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupportDesk: Send + Sync {
    async fn create_ticket(&self, ticket: &SupportTicket) -> CoreResult<()>;
}

/// Validate and file a ticket. A signed-in member's email replaces the one
/// typed in the form, and their premium flag is attached.
pub async fn submit_ticket(
    desk: &dyn SupportDesk,
    mut draft: SupportTicketDraft,
    member: Option<&MemberView>,
) -> CoreResult<SupportTicket> {
    if let Some(member) = member {
        if !member.email.trim().is_empty() {
            draft.email = member.email.clone();
        }
    }
    draft.validate()?;

    let ticket = SupportTicket::open(draft, member.is_some_and(|m| m.is_premium));
    desk.create_ticket(&ticket).await?;
    info!(premium = ticket.is_premium, subject_len = ticket.subject.len(), "Support ticket filed");
    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use pxs_models::{TicketStatus, TierLevel};

    fn draft(email: &str) -> SupportTicketDraft {
        SupportTicketDraft {
            email: email.to_string(),
            subject: "Refund".to_string(),
            message: "I was charged twice".to_string(),
        }
    }

    fn premium_member() -> MemberView {
        MemberView {
            id: "u1".to_string(),
            email: "member@pixelscale.ai".to_string(),
            display_name: "member".to_string(),
            avatar_url: String::new(),
            credits: 200,
            tier: TierLevel::Pro,
            is_premium: true,
        }
    }

    #[tokio::test]
    async fn test_member_email_and_premium_used() {
        let mut desk = MockSupportDesk::new();
        desk.expect_create_ticket()
            .withf(|t| t.email == "member@pixelscale.ai" && t.is_premium && t.status == TicketStatus::Open)
            .times(1)
            .returning(|_| Ok(()));

        let member = premium_member();
        let ticket = submit_ticket(&desk, draft("typo@x"), Some(&member)).await.unwrap();
        assert_eq!(ticket.email, "member@pixelscale.ai");
    }

    #[tokio::test]
    async fn test_invalid_draft_not_sent() {
        let mut desk = MockSupportDesk::new();
        desk.expect_create_ticket().never();

        let err = submit_ticket(&desk, draft("not-an-email"), None).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let mut empty = draft("a@b.co");
        empty.subject.clear();
        assert!(submit_ticket(&desk, empty, None).await.is_err());
    }
}
