// ============================================================================
// Response Normalizer
// ============================================================================
// Transforme le JSON brut d'une API en l'une des trois formes canoniques :
// - objet avec une clé "time series" => TimeSeries (points x / y)
// - objet sans série temporelle      => KeyValue (inchangé)
// - tableau                          => RecordArray (inchangé)
//
// Normalisation pure et déterministe : même entrée => même sortie,
// aucune dépendance au réseau ni à l'horloge.
// ============================================================================

use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::models::{NormalizedData, TimePoint, DEFAULT_CHART_FIELD};

/// Sous-chaîne (en minuscules) qui identifie une clé de série temporelle
const TIME_SERIES_MARKER: &str = "time series";

/// Normalise une réponse brute
///
/// `chart_field` désigne le champ à extraire de chaque point d'une série
/// temporelle (DEFAULT_CHART_FIELD si absent).
pub fn normalize(raw: Value, chart_field: Option<&str>) -> NormalizedData {
    match raw {
        Value::Object(map) => {
            if let Some(series) = time_series_of(&map) {
                return NormalizedData::TimeSeries(extract_time_series(series, chart_field));
            }
            NormalizedData::KeyValue(map)
        }
        Value::Array(items) => NormalizedData::RecordArray(items),
        Value::Null => NormalizedData::KeyValue(Map::new()),
        // Scalaire : un objet à une seule entrée pour rester affichable
        scalar => {
            let mut map = Map::new();
            map.insert("value".to_string(), scalar);
            NormalizedData::KeyValue(map)
        }
    }
}

/// Retourne la série temporelle de la réponse, si elle en a une
///
/// Seule la première clé qui matche est considérée ; si sa valeur n'est pas
/// un objet, la réponse reste un objet clé-valeur.
fn time_series_of(map: &Map<String, Value>) -> Option<&Map<String, Value>> {
    let (_, series) = map
        .iter()
        .find(|(key, _)| key.to_lowercase().contains(TIME_SERIES_MARKER))?;
    series.as_object()
}

/// Convertit une map `timestamp -> champs` en points, dans l'ordre reçu
pub fn extract_time_series(series: &Map<String, Value>, chart_field: Option<&str>) -> Vec<TimePoint> {
    let chart_field = chart_field
        .filter(|field| !field.is_empty())
        .unwrap_or(DEFAULT_CHART_FIELD);

    series
        .iter()
        .map(|(timestamp, fields)| {
            let y = point_value(fields, chart_field);
            let fields = fields.as_object().cloned().unwrap_or_default();
            TimePoint::new(timestamp.clone(), y, fields)
        })
        .collect()
}

/// Calcule la valeur y d'un point
///
/// Ordre de priorité : champ demandé, puis "4. close", puis la première
/// valeur. Une valeur JSON null compte comme absente. 0 si rien ne se
/// parse en nombre fini.
fn point_value(fields: &Value, chart_field: &str) -> f64 {
    let candidate = match fields {
        Value::Object(map) => present(map, chart_field)
            .or_else(|| present(map, DEFAULT_CHART_FIELD))
            .or_else(|| map.values().next()),
        other => Some(other),
    };

    candidate
        .and_then(parse_float)
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

/// Lit un nombre depuis une valeur JSON
///
/// Les chaînes sont lues comme le ferait un parseFloat : espaces de tête
/// ignorés, plus long préfixe numérique ("123.45 USD" => 123.45).
pub fn parse_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_float_prefix(text),
        _ => None,
    }
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |mut at: usize| {
        while at < bytes.len() && bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_end = digits_from(end);
    let mut digit_count = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digit_count += frac_end - (end + 1);
        end = frac_end;
    }
    if digit_count == 0 {
        return None;
    }

    // Exposant seulement s'il est suivi d'au moins un chiffre
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

/// Construit la ligne d'un symbole du fan-out
///
/// Succès : { symbol, ...réponse } (une réponse non-objet va sous "data").
/// Échec : { symbol, error } avec le message de l'erreur.
pub fn symbol_row(symbol: &str, outcome: Result<Value, FetchError>) -> Value {
    let mut row = Map::new();
    row.insert("symbol".to_string(), Value::String(symbol.to_string()));

    match outcome {
        Ok(Value::Object(fields)) => row.extend(fields),
        Ok(other) => {
            row.insert("data".to_string(), other);
        }
        Err(error) => {
            row.insert("error".to_string(), Value::String(error.to_string()));
        }
    }
    Value::Object(row)
}

/// Agrège les résultats d'un fan-out, dans l'ordre des symboles
pub fn aggregate_fan_out<I>(outcomes: I) -> NormalizedData
where
    I: IntoIterator<Item = (String, Result<Value, FetchError>)>,
{
    NormalizedData::RecordArray(
        outcomes
            .into_iter()
            .map(|(symbol, outcome)| symbol_row(&symbol, outcome))
            .collect(),
    )
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn points(data: NormalizedData) -> Vec<TimePoint> {
        match data {
            NormalizedData::TimeSeries(points) => points,
            other => panic!("expected time series, got {:?}", other),
        }
    }

    #[test]
    fn test_daily_series_with_default_field() {
        let raw = json!({"Time Series (Daily)": {"2024-01-01": {"4. close": "123.45"}}});
        let data = normalize(raw, None);

        assert_eq!(
            data.to_json(),
            json!([{"x": "2024-01-01", "y": 123.45, "4. close": "123.45"}])
        );
    }

    #[test]
    fn test_series_keeps_received_order_and_fields() {
        let raw = json!({
            "Meta Data": {"1. Information": "Daily Prices"},
            "Time Series FX (Daily)": {
                "2024-01-03": {"1. open": "1.09", "4. close": "1.10"},
                "2024-01-01": {"1. open": "1.07", "4. close": "1.08"},
                "2024-01-02": {"1. open": "1.08", "4. close": "1.09"}
            }
        });

        let points = points(normalize(raw, None));
        let labels: Vec<&str> = points.iter().map(|p| p.x.as_str()).collect();
        assert_eq!(labels, ["2024-01-03", "2024-01-01", "2024-01-02"]);
        assert_eq!(points[1].y, 1.08);
        assert_eq!(points[1].fields["1. open"], json!("1.07"));
    }

    #[test]
    fn test_chart_field_priority() {
        let raw = json!({"Time Series (5min)": {
            "10:00": {"1. open": "10", "4. close": "11", "5. volume": "500"},
            "10:05": {"1. open": "12", "5. volume": "n/a"},
            "10:10": {"1. open": "13"}
        }});

        let by_volume = points(normalize(raw.clone(), Some("5. volume")));
        assert_eq!(by_volume[0].y, 500.0);
        // Champ présent mais non numérique : 0, sans repli
        assert_eq!(by_volume[1].y, 0.0);
        // Champ absent, pas de close : première valeur
        assert_eq!(by_volume[2].y, 13.0);

        let by_close = points(normalize(raw, Some("")));
        assert_eq!(by_close[0].y, 11.0);
        assert_eq!(by_close[1].y, 12.0);
    }

    #[test]
    fn test_null_field_falls_through() {
        let raw = json!({"time series": {"t": {"x1": null, "4. close": 7.5}}});
        assert_eq!(points(normalize(raw, Some("x1")))[0].y, 7.5);
    }

    #[test]
    fn test_empty_fields_default_to_zero() {
        let raw = json!({"Time Series": {"t": {}}});
        assert_eq!(points(normalize(raw, None))[0].y, 0.0);
    }

    #[test]
    fn test_series_key_must_hold_an_object() {
        let raw = json!({"time series note": "not available", "c": 1});
        assert_eq!(normalize(raw.clone(), None), NormalizedData::KeyValue(raw.as_object().unwrap().clone()));
    }

    #[test]
    fn test_plain_object_is_unchanged() {
        let raw = json!({"c": 150.2, "d": 1.1});
        let data = normalize(raw.clone(), None);
        assert!(matches!(data, NormalizedData::KeyValue(_)));
        assert_eq!(data.to_json(), raw);
    }

    #[test]
    fn test_array_is_unchanged() {
        let raw = json!([{"symbol": "AAPL", "error": "Fetch failed"}, {"symbol": "MSFT", "c": 310}]);
        let data = normalize(raw.clone(), None);
        assert!(matches!(data, NormalizedData::RecordArray(_)));
        assert_eq!(data.to_json(), raw);
    }

    #[test]
    fn test_scalars() {
        assert_eq!(normalize(json!(42), None).to_json(), json!({"value": 42}));
        assert_eq!(normalize(Value::Null, None).to_json(), json!({}));
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let raw = json!({"Time Series (Daily)": {"a": {"4. close": "1"}, "b": {"4. close": "2"}}});
        assert_eq!(normalize(raw.clone(), None), normalize(raw, None));
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float(&json!("123.45")), Some(123.45));
        assert_eq!(parse_float(&json!("  -7.5e2xyz")), Some(-750.0));
        assert_eq!(parse_float(&json!("12.5 USD")), Some(12.5));
        assert_eq!(parse_float(&json!(".5")), Some(0.5));
        assert_eq!(parse_float(&json!("3e")), Some(3.0));
        assert_eq!(parse_float(&json!("abc")), None);
        assert_eq!(parse_float(&json!("-")), None);
        assert_eq!(parse_float(&json!(true)), None);
        assert_eq!(parse_float(&json!(310)), Some(310.0));
    }

    #[test]
    fn test_fan_out_rows() {
        let data = aggregate_fan_out(vec![
            ("AAPL".to_string(), Err(FetchError::Status(429))),
            ("MSFT".to_string(), Ok(json!({"c": 310}))),
            ("TCS".to_string(), Ok(json!(["x"]))),
        ]);

        assert_eq!(
            data.to_json(),
            json!([
                {"symbol": "AAPL", "error": "Fetch failed: 429"},
                {"symbol": "MSFT", "c": 310},
                {"symbol": "TCS", "data": ["x"]}
            ])
        );
    }
}
