// ============================================================================
// Structure : WidgetDraft
// ============================================================================
// Le brouillon édité dans le formulaire d'ajout / d'édition d'un widget.
// Tous les champs sont du texte brut tel que saisi ; into_config() valide
// et normalise le brouillon en WidgetConfig.
//
// Un seul type pour les deux formulaires : l'ajout part d'un brouillon
// vide (ou d'un preset), l'édition part de from_config().
// ============================================================================

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::models::{find_preset, LayoutKind, WidgetConfig, DEFAULT_CHART_FIELD};

/// Intervalle proposé par défaut (secondes)
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Une ligne de header dans le formulaire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// Brouillon de widget (contenu du formulaire)
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetDraft {
    pub preset_id: Option<String>,
    pub name: String,
    pub api_url: String,
    pub api_key: String,
    /// Texte saisi, parsé à la validation
    pub interval: String,
    pub layout: LayoutKind,
    /// Symboles séparés par des virgules
    pub symbols: String,
    pub chart_field: String,
    pub headers: Vec<HeaderPair>,
}

impl Default for WidgetDraft {
    fn default() -> Self {
        Self {
            preset_id: None,
            name: String::new(),
            api_url: String::new(),
            api_key: String::new(),
            interval: DEFAULT_INTERVAL_SECS.to_string(),
            layout: LayoutKind::Table,
            symbols: String::new(),
            chart_field: DEFAULT_CHART_FIELD.to_string(),
            headers: Vec::new(),
        }
    }
}

impl WidgetDraft {
    /// Brouillon vide pour le formulaire d'ajout
    pub fn new() -> Self {
        Self::default()
    }

    /// Brouillon prérempli depuis un widget existant (formulaire d'édition)
    pub fn from_config(config: &WidgetConfig) -> Self {
        let headers = config
            .headers
            .iter()
            .flatten()
            .map(|(name, value)| HeaderPair {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();

        Self {
            preset_id: config.preset.clone(),
            name: config.name.clone(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            interval: config.interval.to_string(),
            layout: config.layout,
            symbols: config.symbols.as_deref().unwrap_or_default().join(", "),
            chart_field: config
                .chart_field
                .clone()
                .unwrap_or_else(|| DEFAULT_CHART_FIELD.to_string()),
            headers,
        }
    }

    /// Applique un preset du catalogue : URL, layout et headers
    ///
    /// Le layout retombe sur Table si le preset n'en précise pas.
    pub fn apply_preset(&mut self, id: &str) -> Result<(), ConfigError> {
        let preset = find_preset(id).ok_or_else(|| ConfigError::UnknownPreset(id.to_string()))?;

        self.preset_id = Some(preset.id.to_string());
        self.api_url = preset.api_url.to_string();
        self.layout = preset.layout.unwrap_or(LayoutKind::Table);
        self.headers = preset
            .headers
            .iter()
            .map(|(name, value)| HeaderPair {
                name: name.to_string(),
                value: value.to_string(),
            })
            .collect();
        Ok(())
    }

    /// Retire le preset sans toucher aux champs déjà remplis
    pub fn clear_preset(&mut self) {
        self.preset_id = None;
    }

    /// Headers au format texte "Nom: valeur; Nom2: valeur2"
    pub fn headers_text(&self) -> String {
        self.headers
            .iter()
            .map(|pair| format!("{}: {}", pair.name, pair.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Remplace les headers depuis le format texte de headers_text()
    pub fn set_headers_text(&mut self, text: &str) {
        self.headers = text
            .split(';')
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| match entry.split_once(':') {
                Some((name, value)) => HeaderPair {
                    name: name.trim().to_string(),
                    value: value.trim().to_string(),
                },
                None => HeaderPair {
                    name: entry.trim().to_string(),
                    value: String::new(),
                },
            })
            .collect();
    }

    /// Valide et normalise le brouillon
    ///
    /// - URL nettoyée et obligatoire
    /// - intervalle entier > 0
    /// - nom par défaut : label du preset, sinon "Untitled Widget"
    /// - clé, symboles et headers vides => absents
    pub fn into_config(&self) -> Result<WidgetConfig, ConfigError> {
        let api_url = self.api_url.trim();
        if api_url.is_empty() {
            return Err(ConfigError::EmptyUrl);
        }

        let interval_text = self.interval.trim();
        let interval: i64 = interval_text
            .parse()
            .map_err(|_| ConfigError::InvalidInterval(interval_text.to_string()))?;
        if interval <= 0 {
            return Err(ConfigError::NonPositiveInterval);
        }

        let name = match (self.name.trim(), &self.preset_id) {
            (name, _) if !name.is_empty() => name.to_string(),
            (_, Some(preset_id)) => find_preset(preset_id)
                .map(|preset| preset.label.to_string())
                .unwrap_or_else(|| "Untitled".to_string()),
            (_, None) => "Untitled Widget".to_string(),
        };

        let api_key = Some(self.api_key.trim())
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        let symbols: Vec<String> = self
            .symbols
            .split(',')
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty())
            .map(str::to_string)
            .collect();

        let headers: BTreeMap<String, String> = self
            .headers
            .iter()
            .filter(|pair| !pair.name.trim().is_empty())
            .map(|pair| (pair.name.trim().to_string(), pair.value.clone()))
            .collect();

        let config = WidgetConfig {
            name,
            api_url: api_url.to_string(),
            api_key,
            interval: interval as u64,
            layout: self.layout,
            symbols: (!symbols.is_empty()).then_some(symbols),
            headers: (!headers.is_empty()).then_some(headers),
            preset: self.preset_id.clone(),
            chart_field: Some(self.chart_field.clone()),
        };
        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_url_is_rejected() {
        let draft = WidgetDraft::new();
        assert_eq!(draft.into_config(), Err(ConfigError::EmptyUrl));
    }

    #[test]
    fn test_interval_validation() {
        let mut draft = WidgetDraft::new();
        draft.api_url = "https://example.com/api".to_string();

        draft.interval = "0".to_string();
        assert_eq!(draft.into_config(), Err(ConfigError::NonPositiveInterval));

        draft.interval = "-5".to_string();
        assert_eq!(draft.into_config(), Err(ConfigError::NonPositiveInterval));

        draft.interval = "abc".to_string();
        assert_eq!(
            draft.into_config(),
            Err(ConfigError::InvalidInterval("abc".to_string()))
        );
    }

    #[test]
    fn test_normalization() {
        let mut draft = WidgetDraft::new();
        draft.api_url = "  https://finnhub.io/api/v1/quote ".to_string();
        draft.api_key = "   ".to_string();
        draft.symbols = "AAPL, MSFT,, TCS ,".to_string();
        draft.headers = vec![
            HeaderPair { name: "  ".to_string(), value: "ignored".to_string() },
            HeaderPair { name: " Accept ".to_string(), value: "application/json".to_string() },
        ];

        let config = draft.into_config().unwrap();
        assert_eq!(config.name, "Untitled Widget");
        assert_eq!(config.api_url, "https://finnhub.io/api/v1/quote");
        assert_eq!(config.api_key, None);
        assert_eq!(
            config.symbols,
            Some(vec!["AAPL".to_string(), "MSFT".to_string(), "TCS".to_string()])
        );
        let headers = config.headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["Accept"], "application/json");
        assert_eq!(config.chart_field.as_deref(), Some("4. close"));
    }

    #[test]
    fn test_preset_prefill_and_default_name() {
        let mut draft = WidgetDraft::new();
        draft.apply_preset("indianapi_trending").unwrap();
        assert_eq!(draft.api_url, "https://stock.indianapi.in/trending");
        assert_eq!(draft.headers.len(), 1);
        assert_eq!(draft.headers[0].name, "X-Api-Key");

        let config = draft.into_config().unwrap();
        assert_eq!(config.name, "IndianAPI · Trending");
        assert_eq!(config.preset.as_deref(), Some("indianapi_trending"));

        assert!(matches!(
            draft.apply_preset("missing"),
            Err(ConfigError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_edit_prefill_round_trip() {
        let mut config = WidgetConfig::new("Quotes", "https://finnhub.io/api/v1/quote", 15);
        config.symbols = Some(vec!["AAPL".to_string(), "MSFT".to_string()]);
        config.chart_field = Some("4. close".to_string());
        let mut headers = BTreeMap::new();
        headers.insert("Authorization".to_string(), "Bearer abc".to_string());
        config.headers = Some(headers);

        let draft = WidgetDraft::from_config(&config);
        assert_eq!(draft.symbols, "AAPL, MSFT");
        assert_eq!(draft.interval, "15");
        assert_eq!(draft.into_config().unwrap(), config);
    }

    #[test]
    fn test_headers_text() {
        let mut draft = WidgetDraft::new();
        draft.set_headers_text("X-Api-Key: abc; Accept : application/json;  ");
        assert_eq!(draft.headers.len(), 2);
        assert_eq!(draft.headers[1].name, "Accept");
        assert_eq!(draft.headers[1].value, "application/json");
        assert_eq!(draft.headers_text(), "X-Api-Key: abc; Accept: application/json");
    }
}
