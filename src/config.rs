// ============================================================================
// Configuration : Settings
// ============================================================================
// Paramètres d'exécution résolus une fois au démarrage depuis les
// variables d'environnement, avec des valeurs par défaut :
//
// - FINBOARD_DATA_DIR   : répertoire des données persistées
// - FINBOARD_LOG_DIR    : répertoire des logs
// - FINBOARD_STORE_SLOT : nom du slot persisté (fichier <slot>.json)
// - FINBOARD_USER_AGENT : User-Agent des requêtes sortantes
// - RUST_LOG            : filtre des logs
// ============================================================================

use std::path::PathBuf;

use crate::api::DEFAULT_USER_AGENT;

/// Slot persisté par défaut
pub const DEFAULT_STORE_SLOT: &str = "finboard-widgets";

/// Filtre de logs par défaut : debug pour finboard, info pour le reste
pub const DEFAULT_LOG_FILTER: &str = "finboard=debug,info";

/// Paramètres d'exécution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub store_slot: String,
    pub user_agent: String,
    pub log_filter: String,
}

impl Settings {
    /// Lit les paramètres depuis l'environnement du processus
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lit les paramètres depuis une source de variables quelconque
    ///
    /// CONCEPT RUST : Closures en paramètre
    /// - `impl Fn(&str) -> Option<String>` : n'importe quelle fonction de lookup
    /// - En test, on passe une HashMap au lieu de l'environnement réel
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = var("FINBOARD_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let log_dir = var("FINBOARD_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("logs"));

        Self {
            log_dir,
            store_slot: var("FINBOARD_STORE_SLOT").unwrap_or_else(|| DEFAULT_STORE_SLOT.to_string()),
            user_agent: var("FINBOARD_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            log_filter: var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            data_dir,
        }
    }

    /// Fichier du slot persisté
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.store_slot))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Répertoire de données par défaut
///
/// - Linux : ~/.local/share/finboard
/// - macOS : ~/Library/Application Support/finboard
/// - Windows : C:\Users\<user>\AppData\Local\finboard
/// - Sinon : ./.finboard
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("finboard"))
        .unwrap_or_else(|| PathBuf::from(".finboard"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]);
        assert_eq!(settings.store_slot, "finboard-widgets");
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(settings.log_dir, settings.data_dir.join("logs"));
        assert!(settings.store_path().ends_with("finboard-widgets.json"));
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("FINBOARD_DATA_DIR", "/tmp/board"),
            ("FINBOARD_STORE_SLOT", "demo"),
            ("RUST_LOG", "finboard=trace"),
            ("FINBOARD_USER_AGENT", "  "),
        ]);
        assert_eq!(settings.store_path(), PathBuf::from("/tmp/board/demo.json"));
        assert_eq!(settings.log_dir, PathBuf::from("/tmp/board/logs"));
        assert_eq!(settings.log_filter, "finboard=trace");
        // Valeur vide : défaut
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }
}
