// ============================================================================
// Erreurs typées
// ============================================================================
// Deux familles d'erreurs traversent le cœur de l'application :
// - ConfigError : configuration invalide, détectée à la création/édition
//   d'un widget, n'atteint jamais le cycle de rafraîchissement
// - FetchError : échec d'une tentative de fetch (réseau, statut HTTP, JSON),
//   affichée comme message transitoire, ne modifie jamais les données
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] implémente std::error::Error et Display
// - #[error("...")] définit le message affiché
// ============================================================================

use thiserror::Error;

/// Erreur de configuration d'un widget (formulaire d'ajout/édition)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("L'URL de l'API est obligatoire")]
    EmptyUrl,

    #[error("L'intervalle de rafraîchissement doit être > 0")]
    NonPositiveInterval,

    #[error("Intervalle invalide : {0:?}")]
    InvalidInterval(String),

    #[error("Preset inconnu : {0}")]
    UnknownPreset(String),
}

/// Erreur d'une tentative de fetch
///
/// Le message (Display) est celui affiché dans la carte du widget et,
/// pour le fan-out, celui embarqué dans le champ `error` de la ligne.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Réponse HTTP hors 2xx
    #[error("Fetch failed: {0}")]
    Status(u16),

    /// Échec réseau (DNS, connexion, URL malformée, header invalide...)
    #[error("Fetch failed: {0}")]
    Transport(String),

    /// Corps de réponse qui n'est pas du JSON
    #[error("Invalid JSON response: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_carries_code() {
        assert_eq!(FetchError::Status(404).to_string(), "Fetch failed: 404");
    }

    #[test]
    fn test_config_error_messages() {
        assert!(ConfigError::EmptyUrl.to_string().contains("URL"));
        assert!(ConfigError::InvalidInterval("abc".to_string())
            .to_string()
            .contains("abc"));
    }
}
