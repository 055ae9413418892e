//! Réessai linéaire des appels au fournisseur d'IA

use std::{future::Future, time::Duration};

use log::{error, warn};
use tokio_retry::RetryIf;

use super::provider::ProviderError;
use crate::consts;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Nombre total de tentatives, la première comprise
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: consts::MAX_RETRIES,
            base_delay: consts::RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Attente après l'échec de la tentative `attempt` (numérotée à partir de 1)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Exécute `operation` jusqu'à son succès ou jusqu'à épuisement des tentatives.
/// Seules les erreurs passagères sont réessayées; la dernière erreur est retournée.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, operation: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let attempts = policy.max_attempts.max(1);
    let delays = (1..attempts).map(move |attempt| policy.delay_after(attempt));
    let mut attempt = 0;

    let result = RetryIf::spawn(delays, operation, |e: &ProviderError| {
        attempt += 1;
        let retry = e.is_transient() && attempt < attempts;
        if retry {
            warn!(
                "AI call failed (attempt {}/{}), retrying in {:?}: {}",
                attempt,
                attempts,
                policy.delay_after(attempt),
                e
            );
        }
        retry
    })
    .await;

    result.map_err(|e| {
        error!("AI call failed after {} attempt(s): {}", attempt, e);
        e
    })
}
