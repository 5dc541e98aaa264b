//! Device-local credit ledger for visitors who are not signed in.

use std::sync::Arc;

use tracing::{debug, info};

use crate::device_store::{keys, LocalDeviceStore};
use crate::entitlement::deny;
use crate::error::Denial;
use crate::session::ActorKind;

/// Balance granted on a device's first visit.
pub const GUEST_STARTING_CREDITS: u32 = 50;

/// A stored balance below this is topped back up to
/// [`GUEST_STARTING_CREDITS`] on load.
// TODO: confirm the top-up rule with product; a guest can refill by reloading.
pub const GUEST_TOP_UP_THRESHOLD: u32 = 10;

pub struct GuestLedger {
    store: Arc<dyn LocalDeviceStore>,
    balance: u32,
}

impl std::fmt::Debug for GuestLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestLedger")
            .field("balance", &self.balance)
            .finish()
    }
}

impl GuestLedger {
    /// Read the stored balance, initializing or topping it up as needed.
    ///
    /// A missing, unparseable, negative or below-threshold value becomes
    /// [`GUEST_STARTING_CREDITS`] and is written back.
    pub fn load(store: Arc<dyn LocalDeviceStore>) -> Self {
        let stored = store.get(keys::GUEST_CREDITS);
        let parsed = stored.as_deref().and_then(|v| v.trim().parse::<i64>().ok());

        let balance = match parsed {
            Some(value) if value >= GUEST_TOP_UP_THRESHOLD as i64 => {
                value.min(u32::MAX as i64) as u32
            }
            _ => {
                info!(stored = ?stored, "Guest balance initialized to {}", GUEST_STARTING_CREDITS);
                store.set(keys::GUEST_CREDITS, &GUEST_STARTING_CREDITS.to_string());
                GUEST_STARTING_CREDITS
            }
        };

        Self { store, balance }
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn can_spend(&self) -> bool {
        self.balance > 0
    }

    /// Spend one credit. At zero the balance is left untouched.
    pub fn debit(&mut self) -> Result<u32, Denial> {
        if self.balance == 0 {
            return Err(deny(Denial::OutOfCredits {
                actor: ActorKind::Guest,
            }));
        }
        self.balance -= 1;
        self.store
            .set(keys::GUEST_CREDITS, &self.balance.to_string());
        debug!(remaining = self.balance, "Guest credit debited");
        Ok(self.balance)
    }
}
