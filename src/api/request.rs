// ============================================================================
// Request Builder
// ============================================================================
// Dérive la (ou les) requête(s) HTTP effective(s) d'un widget à partir de
// sa configuration :
// 1. fusion des headers et injection de la clé d'API (X-Api-Key)
// 2. repli de la clé en paramètre `token` quand aucun header n'est configuré
// 3. fan-out : une requête par symbole en layout Table
//
// Tout ici est pur : aucune I/O, la configuration n'est jamais modifiée.
// ============================================================================

use std::collections::BTreeMap;

use crate::models::WidgetConfig;

/// Noms de headers d'authentification (comparés sans tenir compte de la casse)
pub const AUTH_HEADER_NAMES: [&str; 4] = ["x-api-key", "authorization", "apikey", "api-key"];

/// Header sous lequel la clé d'API est injectée
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Paramètre de query utilisé en repli pour la clé
pub const TOKEN_PARAM: &str = "token";

/// Une requête GET à émettre
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub url: String,

    /// None = aucun header envoyé
    pub headers: Option<BTreeMap<String, String>>,

    /// Symbole du fan-out à l'origine de cette requête
    pub symbol: Option<String>,
}

/// Plan de requêtes d'un cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPlan {
    /// Une seule requête, réponse normalisée
    Single(RequestSpec),

    /// Une requête par symbole, émises en parallèle et agrégées
    FanOut(Vec<RequestSpec>),
}

impl RequestPlan {
    /// Nombre de requêtes réseau du plan
    pub fn request_count(&self) -> usize {
        match self {
            RequestPlan::Single(_) => 1,
            RequestPlan::FanOut(requests) => requests.len(),
        }
    }
}

/// Construit le plan de requêtes d'un widget
///
/// Retourne None si l'URL est vide : le cycle est simplement sauté.
/// Les URLs malformées ne sont pas validées ici, elles échoueront au fetch.
pub fn build_plan(config: &WidgetConfig) -> Option<RequestPlan> {
    if config.api_url.trim().is_empty() {
        return None;
    }

    let headers = build_headers(config);
    let token = token_fallback(config);

    let symbols = config.fan_out_symbols();
    if symbols.is_empty() {
        let url = with_token(config.api_url.clone(), token);
        return Some(RequestPlan::Single(RequestSpec {
            url,
            headers,
            symbol: None,
        }));
    }

    // CONCEPT RUST : Iterator chaining
    // - une RequestSpec par symbole, le repli token est évalué par requête
    let requests = symbols
        .iter()
        .map(|symbol| {
            let url = append_query(&config.api_url, "symbol", symbol);
            RequestSpec {
                url: with_token(url, token),
                headers: headers.clone(),
                symbol: Some(symbol.clone()),
            }
        })
        .collect();

    Some(RequestPlan::FanOut(requests))
}

/// Fusionne les headers configurés et la clé d'API
///
/// La clé est injectée sous X-Api-Key seulement si aucun header
/// d'authentification n'est déjà présent. Retourne None si la map
/// résultante est vide.
pub fn build_headers(config: &WidgetConfig) -> Option<BTreeMap<String, String>> {
    let mut headers = config.headers.clone().unwrap_or_default();

    if let Some(key) = config.trimmed_api_key() {
        if !has_auth_header(&headers) {
            headers.insert(API_KEY_HEADER.to_string(), key.to_string());
        }
    }

    (!headers.is_empty()).then_some(headers)
}

/// Vérifie la présence d'un header d'authentification (insensible à la casse)
pub fn has_auth_header(headers: &BTreeMap<String, String>) -> bool {
    headers.keys().any(|name| {
        let name = name.to_ascii_lowercase();
        AUTH_HEADER_NAMES.contains(&name.as_str())
    })
}

/// Clé à ajouter en paramètre `token`, si le repli s'applique
///
/// Le repli ne s'applique que si le widget ne configure aucun header :
/// la clé part alors aussi en query pour les APIs qui l'attendent là.
fn token_fallback(config: &WidgetConfig) -> Option<&str> {
    let no_configured_headers = config.headers.as_ref().map_or(true, BTreeMap::is_empty);
    if no_configured_headers {
        config.trimmed_api_key()
    } else {
        None
    }
}

/// Ajoute `token=<clé>` sauf si l'URL porte déjà un paramètre token
fn with_token(url: String, token: Option<&str>) -> String {
    match token {
        Some(token) if !has_query_param(&url, TOKEN_PARAM) => append_query(&url, TOKEN_PARAM, token),
        _ => url,
    }
}

/// Ajoute `name=<valeur encodée>` à l'URL
///
/// Utilise `&` si l'URL contient déjà un `?`, sinon `?`.
pub fn append_query(url: &str, name: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", url, separator, name, urlencoding::encode(value))
}

/// Vérifie si la query string contient le paramètre `name`
pub fn has_query_param(url: &str, name: &str) -> bool {
    let Some((_, query)) = url.split_once('?') else {
        return false;
    };
    let query = query.split('#').next().unwrap_or_default();
    query
        .split('&')
        .any(|pair| pair.split('=').next() == Some(name))
}

/// Masque la valeur du paramètre token (pour les logs)
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((TOKEN_PARAM, _)) => format!("{}=***", TOKEN_PARAM),
            _ => pair.to_string(),
        })
        .collect();
    format!("{}?{}", base, redacted.join("&"))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LayoutKind;

    fn config(url: &str) -> WidgetConfig {
        WidgetConfig::new("Test", url, 30)
    }

    fn with_headers(mut config: WidgetConfig, pairs: &[(&str, &str)]) -> WidgetConfig {
        config.headers = Some(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        );
        config
    }

    fn single(plan: Option<RequestPlan>) -> RequestSpec {
        match plan {
            Some(RequestPlan::Single(request)) => request,
            other => panic!("expected a single request, got {:?}", other),
        }
    }

    fn token_count(url: &str) -> usize {
        url.split(['?', '&'])
            .filter(|pair| pair.starts_with("token="))
            .count()
    }

    #[test]
    fn test_empty_url_produces_no_request() {
        assert_eq!(build_plan(&config("")), None);
        assert_eq!(build_plan(&config("   ")), None);
    }

    #[test]
    fn test_plain_request_without_key() {
        let request = single(build_plan(&config("https://finnhub.io/api/v1/quote")));
        assert_eq!(request.url, "https://finnhub.io/api/v1/quote");
        assert_eq!(request.headers, None);
    }

    #[test]
    fn test_auth_header_blocks_injection() {
        for name in ["Authorization", "X-API-KEY", "apikey", "Api-Key"] {
            let mut config = with_headers(config("https://example.com/q"), &[(name, "Bearer t")]);
            config.api_key = Some("secret".to_string());

            let request = single(build_plan(&config));
            let headers = request.headers.unwrap();
            assert_eq!(headers.len(), 1, "header {}", name);
            assert!(!headers.contains_key(API_KEY_HEADER) || name == API_KEY_HEADER);
            assert_eq!(headers[name], "Bearer t");
            assert_eq!(token_count(&request.url), 0);
        }
    }

    #[test]
    fn test_key_injected_next_to_custom_headers() {
        let mut config = with_headers(config("https://example.com/q"), &[("Accept", "application/json")]);
        config.api_key = Some("  secret  ".to_string());

        let request = single(build_plan(&config));
        let headers = request.headers.unwrap();
        assert_eq!(headers[API_KEY_HEADER], "secret");
        assert_eq!(headers["Accept"], "application/json");
        // Des headers sont configurés : pas de repli en query
        assert_eq!(token_count(&request.url), 0);
    }

    #[test]
    fn test_token_fallback_without_headers() {
        let mut config = config("https://finnhub.io/api/v1/quote");
        config.api_key = Some("abc".to_string());

        let request = single(build_plan(&config));
        assert_eq!(request.url, "https://finnhub.io/api/v1/quote?token=abc");
        assert_eq!(token_count(&request.url), 1);

        config.api_url = "https://finnhub.io/api/v1/quote?symbol=AAPL".to_string();
        let request = single(build_plan(&config));
        assert_eq!(request.url, "https://finnhub.io/api/v1/quote?symbol=AAPL&token=abc");
        assert_eq!(token_count(&request.url), 1);
    }

    #[test]
    fn test_token_not_duplicated() {
        let mut config = config("https://example.com/q?token=already");
        config.api_key = Some("abc".to_string());

        let request = single(build_plan(&config));
        assert_eq!(request.url, "https://example.com/q?token=already");
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let mut config = config("https://example.com/q");
        config.api_key = Some("   ".to_string());

        let request = single(build_plan(&config));
        assert_eq!(request.url, "https://example.com/q");
        assert_eq!(request.headers, None);
    }

    #[test]
    fn test_fan_out_one_request_per_symbol() {
        let mut config = config("https://finnhub.io/api/v1/quote");
        config.api_key = Some("abc".to_string());
        config.symbols = Some(vec!["AAPL".to_string(), "BRK.B".to_string(), "M&M".to_string()]);

        let Some(RequestPlan::FanOut(requests)) = build_plan(&config) else {
            panic!("expected fan-out");
        };
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "https://finnhub.io/api/v1/quote?symbol=AAPL&token=abc");
        assert_eq!(requests[1].symbol.as_deref(), Some("BRK.B"));
        assert_eq!(requests[2].url, "https://finnhub.io/api/v1/quote?symbol=M%26M&token=abc");
        for request in &requests {
            assert_eq!(token_count(&request.url), 1);
        }
    }

    #[test]
    fn test_removing_a_symbol_shrinks_the_fan_out() {
        let mut config = config("https://example.com/q?exchange=NSE");
        config.symbols = Some(vec!["INFY".to_string(), "TCS".to_string(), "WIPRO".to_string()]);
        config.symbols.as_mut().unwrap().retain(|symbol| symbol != "TCS");

        let plan = build_plan(&config).unwrap();
        assert_eq!(plan.request_count(), 2);
        let RequestPlan::FanOut(requests) = plan else {
            panic!("expected fan-out");
        };
        assert_eq!(requests[0].url, "https://example.com/q?exchange=NSE&symbol=INFY");
        assert_eq!(requests[1].url, "https://example.com/q?exchange=NSE&symbol=WIPRO");
    }

    #[test]
    fn test_no_fan_out_outside_table_layout() {
        let mut config = config("https://example.com/q");
        config.layout = LayoutKind::Json;
        config.symbols = Some(vec!["AAPL".to_string()]);

        let request = single(build_plan(&config));
        assert_eq!(request.url, "https://example.com/q");
    }

    #[test]
    fn test_configuration_is_not_mutated() {
        let mut config = with_headers(config("https://example.com/q"), &[("Accept", "*/*")]);
        config.api_key = Some("abc".to_string());
        let before = config.clone();

        let _ = build_plan(&config);
        assert_eq!(config, before);
    }

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("https://x.io/q?symbol=AAPL&token=abc"),
            "https://x.io/q?symbol=AAPL&token=***"
        );
        assert_eq!(redact_url("https://x.io/q"), "https://x.io/q");
    }
}
