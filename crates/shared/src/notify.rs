//! Fire-and-forget notification requests to the external messaging service.
//!
//! The messaging collaborator owns templating and delivery; this client only
//! hands it the financial facts. Delivery failures are logged and never
//! propagate into the calling financial transaction.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::NotificationSettings;
use crate::types::{Cents, ReservationId, TenantId};

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The messaging endpoint rejected or failed the request.
    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
}

/// What kind of notice the messaging service should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Payment receipt for a charge.
    Receipt,
    /// Refund notice.
    RefundNotice,
}

/// Request payload sent to the messaging service.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRequest {
    /// Tenant the reservation belongs to.
    pub tenant_id: Uuid,
    /// Reservation the money movement is tied to.
    pub reservation_id: Uuid,
    /// Amount in cents.
    pub amount_cents: i64,
    /// Notice kind.
    pub kind: NotificationKind,
}

/// Client for the external messaging service.
#[derive(Clone)]
pub struct NotificationService {
    client: reqwest::Client,
    settings: NotificationSettings,
}

impl NotificationService {
    /// Creates a new notification service.
    #[must_use]
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    /// Sends one notification request.
    ///
    /// # Errors
    ///
    /// Returns an error if the messaging endpoint cannot be reached or
    /// responds with a non-success status.
    pub async fn send(
        &self,
        tenant_id: TenantId,
        reservation_id: ReservationId,
        amount: Cents,
        kind: NotificationKind,
    ) -> Result<(), NotifyError> {
        if self.settings.endpoint.is_empty() {
            debug!(
                tenant_id = %tenant_id,
                reservation_id = %reservation_id,
                ?kind,
                "Notification endpoint not configured, dropping notice"
            );
            return Ok(());
        }

        let request = NotificationRequest {
            tenant_id: tenant_id.into_inner(),
            reservation_id: reservation_id.into_inner(),
            amount_cents: amount.into_inner(),
            kind,
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "messaging service returned {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Fire-and-forget variant: spawns the send and logs failures.
    ///
    /// This is the entry point financial code uses after commit; a lost
    /// notice never rolls back money state.
    pub fn send_detached(
        &self,
        tenant_id: TenantId,
        reservation_id: ReservationId,
        amount: Cents,
        kind: NotificationKind,
    ) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.send(tenant_id, reservation_id, amount, kind).await {
                warn!(
                    tenant_id = %tenant_id,
                    reservation_id = %reservation_id,
                    ?kind,
                    error = %e,
                    "Notification send failed"
                );
            }
        });
    }
}
