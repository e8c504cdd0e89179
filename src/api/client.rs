// ============================================================================
// Client HTTP
// ============================================================================
// Émet les requêtes GET construites par le Request Builder et retourne le
// JSON brut de la réponse.
//
// CONCEPTS RUST :
// 1. Trait async (async-trait) : le cycle de fetch dépend de HttpFetch,
//    pas de reqwest ; les tests injectent un faux client sans réseau
// 2. Send + Sync : le client est partagé entre les tâches tokio (Arc)
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::api::request::{redact_url, RequestSpec};
use crate::error::FetchError;

/// User-Agent par défaut des requêtes sortantes
pub const DEFAULT_USER_AGENT: &str = concat!("finboard/", env!("CARGO_PKG_VERSION"));

/// Transport HTTP : une requête GET, une réponse JSON
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Émet la requête et parse la réponse en JSON
    ///
    /// Un statut hors 2xx est une erreur (FetchError::Status).
    async fn get_json(&self, request: &RequestSpec) -> Result<Value, FetchError>;
}

/// Implémentation reqwest
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Crée le client HTTP partagé
    ///
    /// Aucun timeout n'est imposé au-delà de celui du transport.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Échec de la création du client HTTP")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for HttpClient {
    #[instrument(skip(self, request), fields(url = %redact_url(&request.url), symbol = ?request.symbol))]
    async fn get_json(&self, request: &RequestSpec) -> Result<Value, FetchError> {
        // CONCEPT RUST : Builder pattern
        // - chaque header est ajouté au RequestBuilder
        // - un nom de header invalide échoue à l'envoi (erreur transport)
        let mut builder = self.client.get(&request.url);
        for (name, value) in request.headers.iter().flatten() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!("Sending HTTP request");
        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "HTTP request failed");
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        if !status.is_success() {
            error!(status = %status, "API returned error status");
            return Err(FetchError::Status(status.as_u16()));
        }

        response.json::<Value>().await.map_err(|e| {
            error!(error = %e, "Failed to parse JSON response");
            FetchError::Parse(e.to_string())
        })
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::new(DEFAULT_USER_AGENT).is_ok());
        assert!(DEFAULT_USER_AGENT.starts_with("finboard/"));
    }

    // Test avec un port local fermé : l'échec doit être une erreur transport,
    // jamais un panic
    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let client = HttpClient::new(DEFAULT_USER_AGENT).unwrap();
        let request = RequestSpec {
            url: "http://127.0.0.1:9/quote".to_string(),
            headers: None,
            symbol: None,
        };

        match client.get_json(&request).await {
            Err(FetchError::Transport(_)) => {}
            other => panic!("expected transport error, got {:?}", other),
        }
    }
}
