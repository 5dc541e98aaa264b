//! `support_tickets` table access.

use pxs_models::SupportTicket;
use tracing::info;

use crate::client::SupabaseClient;
use crate::error::SupabaseResult;

pub const SUPPORT_TABLE: &str = "support_tickets";

#[derive(Debug, Clone)]
pub struct SupportTicketRepository {
    client: SupabaseClient,
}

impl SupportTicketRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, ticket: &SupportTicket) -> SupabaseResult<()> {
        self.client
            .insert(SUPPORT_TABLE, std::slice::from_ref(ticket))
            .await?;
        info!(premium = ticket.is_premium, "Support ticket created");
        Ok(())
    }
}
