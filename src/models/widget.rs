// ============================================================================
// Structures : WidgetConfig et Widget
// ============================================================================
// WidgetConfig : la configuration d'un widget (source de données + affichage)
// Widget : un widget stocké = id + configuration + dernier résultat de fetch
//
// CONCEPTS RUST :
// 1. #[serde(flatten)] : aplatit la configuration dans l'enregistrement JSON
//    persisté (même forme qu'un objet { id, name, apiUrl, ..., lastData })
// 2. #[serde(rename_all = "camelCase")] : api_url (Rust) <-> apiUrl (JSON)
// 3. Option<T> : champs optionnels, omis du JSON quand absents
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::NormalizedData;

/// Champ tracé par défaut pour les séries temporelles (format Alpha Vantage)
pub const DEFAULT_CHART_FIELD: &str = "4. close";

/// Mode d'affichage d'un widget
///
/// Couplé par convention à la stratégie de fetch :
/// - Table : peut faire un fan-out multi-symboles
/// - Json : séries temporelles / graphique
/// - Card : un seul objet clé-valeur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Table,
    Json,
    Card,
}

impl LayoutKind {
    /// Label pour l'affichage
    pub fn label(&self) -> &'static str {
        match self {
            LayoutKind::Table => "Table",
            LayoutKind::Json => "JSON / Chart",
            LayoutKind::Card => "Card",
        }
    }

    /// Layout suivant (cycle Table → Json → Card → Table)
    pub fn next(&self) -> Self {
        match self {
            LayoutKind::Table => LayoutKind::Json,
            LayoutKind::Json => LayoutKind::Card,
            LayoutKind::Card => LayoutKind::Table,
        }
    }

    /// Layout précédent
    pub fn previous(&self) -> Self {
        match self {
            LayoutKind::Table => LayoutKind::Card,
            LayoutKind::Json => LayoutKind::Table,
            LayoutKind::Card => LayoutKind::Json,
        }
    }
}

/// Configuration d'un widget
///
/// Immuable pendant un cycle de fetch : une édition la remplace entièrement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Nom affiché
    pub name: String,

    /// URL de base (peut déjà contenir une query string)
    pub api_url: String,

    /// Clé d'API transmise en header (ou en query `token` en repli)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Secondes entre deux rafraîchissements automatiques (> 0)
    pub interval: u64,

    /// Mode d'affichage
    #[serde(default)]
    pub layout: LayoutKind,

    /// Tickers pour le fan-out (layout Table uniquement)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<String>>,

    /// Headers personnalisés (nom -> valeur)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,

    /// Preset du catalogue utilisé pour préremplir (informatif)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Champ d'une série temporelle à tracer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_field: Option<String>,
}

impl WidgetConfig {
    /// Crée une configuration minimale
    pub fn new(name: impl Into<String>, api_url: impl Into<String>, interval: u64) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            api_key: None,
            interval,
            layout: LayoutKind::default(),
            symbols: None,
            headers: None,
            preset: None,
            chart_field: None,
        }
    }

    /// Vérifie les invariants de la configuration
    ///
    /// Appelé à la création et à l'édition : une configuration invalide
    /// n'atteint jamais le cycle de rafraîchissement.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        if self.interval == 0 {
            return Err(ConfigError::NonPositiveInterval);
        }
        Ok(())
    }

    /// Clé d'API nettoyée, None si absente ou vide
    pub fn trimmed_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Champ à tracer (DEFAULT_CHART_FIELD si absent ou vide)
    pub fn effective_chart_field(&self) -> &str {
        self.chart_field
            .as_deref()
            .filter(|field| !field.is_empty())
            .unwrap_or(DEFAULT_CHART_FIELD)
    }

    /// Symboles du fan-out (vide si pas de fan-out)
    ///
    /// Le fan-out n'a lieu qu'en layout Table avec au moins un symbole.
    pub fn fan_out_symbols(&self) -> &[String] {
        match (&self.layout, &self.symbols) {
            (LayoutKind::Table, Some(symbols)) => symbols,
            _ => &[],
        }
    }

    /// Compare les champs qui pilotent le fetch
    ///
    /// Un changement de l'un d'eux redémarre le cycle du widget.
    /// Le nom et le preset sont purement informatifs.
    pub fn same_fetch_inputs(&self, other: &WidgetConfig) -> bool {
        self.api_url == other.api_url
            && self.api_key == other.api_key
            && self.interval == other.interval
            && self.layout == other.layout
            && self.symbols == other.symbols
            && self.headers == other.headers
            && self.chart_field == other.chart_field
    }
}

/// Un widget du tableau de bord : configuration + dernier résultat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Widget {
    /// Identifiant opaque, stable pendant toute la vie du widget
    pub id: String,

    #[serde(flatten)]
    pub config: WidgetConfig,

    /// Dernières données normalisées (None tant qu'aucun fetch n'a réussi)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_data: Option<NormalizedData>,

    /// Date du dernier fetch réussi (millisecondes Unix en JSON)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Widget {
    /// Crée un widget sans données
    pub fn new(id: String, config: WidgetConfig) -> Self {
        Self {
            id,
            config,
            last_data: None,
            last_updated: None,
        }
    }

    /// Vérifie si les données en cache sont encore fraîches à `now`
    ///
    /// Fraîches = des données existent et `now - last_updated` est inférieur
    /// à l'intervalle (en millisecondes).
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        if self.last_data.is_none() {
            return false;
        }
        let Some(updated) = self.last_updated else {
            return false;
        };
        let window_ms = i64::try_from(self.config.interval.saturating_mul(1000)).unwrap_or(i64::MAX);
        (now - updated).num_milliseconds() < window_ms
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn quote_config() -> WidgetConfig {
        WidgetConfig::new("Quote", "https://finnhub.io/api/v1/quote", 30)
    }

    #[test]
    fn test_validate() {
        assert!(quote_config().validate().is_ok());

        let mut config = quote_config();
        config.api_url = "   ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyUrl));

        let mut config = quote_config();
        config.interval = 0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveInterval));
    }

    #[test]
    fn test_fan_out_only_in_table_layout() {
        let mut config = quote_config();
        config.symbols = Some(vec!["AAPL".to_string(), "MSFT".to_string()]);
        assert_eq!(config.fan_out_symbols().len(), 2);

        config.layout = LayoutKind::Card;
        assert!(config.fan_out_symbols().is_empty());
    }

    #[test]
    fn test_effective_chart_field() {
        let mut config = quote_config();
        assert_eq!(config.effective_chart_field(), "4. close");

        config.chart_field = Some(String::new());
        assert_eq!(config.effective_chart_field(), "4. close");

        config.chart_field = Some("5. volume".to_string());
        assert_eq!(config.effective_chart_field(), "5. volume");
    }

    #[test]
    fn test_same_fetch_inputs_ignores_name() {
        let config = quote_config();
        let mut renamed = config.clone();
        renamed.name = "Autre nom".to_string();
        assert!(config.same_fetch_inputs(&renamed));

        let mut rekeyed = config.clone();
        rekeyed.api_key = Some("secret".to_string());
        assert!(!config.same_fetch_inputs(&rekeyed));
    }

    #[test]
    fn test_is_fresh_window() {
        let t0 = Utc::now();
        let mut widget = Widget::new("1".to_string(), quote_config());
        assert!(!widget.is_fresh(t0));

        widget.last_data = Some(NormalizedData::KeyValue(serde_json::Map::new()));
        widget.last_updated = Some(t0);
        assert!(widget.is_fresh(t0 + Duration::seconds(10)));
        assert!(!widget.is_fresh(t0 + Duration::seconds(30)));
        assert!(!widget.is_fresh(t0 + Duration::seconds(31)));
    }

    #[test]
    fn test_widget_json_shape() {
        let mut widget = Widget::new("1700000000000".to_string(), quote_config());
        widget.config.api_key = Some("k".to_string());

        let value = serde_json::to_value(&widget).unwrap();
        assert_eq!(value["id"], json!("1700000000000"));
        assert_eq!(value["apiUrl"], json!("https://finnhub.io/api/v1/quote"));
        assert_eq!(value["apiKey"], json!("k"));
        assert_eq!(value["layout"], json!("table"));
        assert!(value.get("lastData").is_none());

        let back: Widget = serde_json::from_value(value).unwrap();
        assert_eq!(back, widget);
    }
}
