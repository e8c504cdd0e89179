// ============================================================================
// Enum : NormalizedData
// ============================================================================
// Les réponses des APIs ont des formes hétérogènes. Le normaliseur les
// ramène à l'une des trois formes canoniques ci-dessous, que le rendu
// consomme sans deviner la forme.
//
// CONCEPT RUST : Tagged union
// - Chaque variant porte sa propre donnée
// - #[serde(tag, content)] : persisté sous la forme
//   { "shape": "timeSeries", "data": [...] }
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Données normalisées d'un widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "camelCase")]
pub enum NormalizedData {
    /// Objet plat : affiché en tableau label / valeur
    KeyValue(Map<String, Value>),

    /// Suite ordonnée de lignes (clés hétérogènes, colonnes en union)
    RecordArray(Vec<Value>),

    /// Points (x = label temporel, y = valeur numérique)
    TimeSeries(Vec<TimePoint>),
}

/// Un point de série temporelle
///
/// Les champs d'origine sont conservés pour l'affichage détaillé.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub x: String,
    pub y: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TimePoint {
    /// Crée un point
    ///
    /// Les champs nommés "x" ou "y" sont écartés : le label et la valeur
    /// du point priment dans la vue plate.
    pub fn new(x: String, y: f64, mut fields: Map<String, Value>) -> Self {
        fields.remove("x");
        fields.remove("y");
        Self { x, y, fields }
    }

    /// Vue JSON plate : { x, y, ...champs d'origine }
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("x".to_string(), Value::String(self.x.clone()));
        object.insert("y".to_string(), Value::from(self.y));
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }
}

impl NormalizedData {
    /// Nom de la forme (logs, affichage)
    pub fn shape_label(&self) -> &'static str {
        match self {
            NormalizedData::KeyValue(_) => "key-value",
            NormalizedData::RecordArray(_) => "records",
            NormalizedData::TimeSeries(_) => "time-series",
        }
    }

    /// Nombre d'entrées (clés, lignes ou points)
    pub fn len(&self) -> usize {
        match self {
            NormalizedData::KeyValue(map) => map.len(),
            NormalizedData::RecordArray(rows) => rows.len(),
            NormalizedData::TimeSeries(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vue JSON plate, telle que l'afficherait une vue "JSON brut"
    pub fn to_json(&self) -> Value {
        match self {
            NormalizedData::KeyValue(map) => Value::Object(map.clone()),
            NormalizedData::RecordArray(rows) => Value::Array(rows.clone()),
            NormalizedData::TimeSeries(points) => {
                Value::Array(points.iter().map(TimePoint::to_json).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_point_flat_json() {
        let mut fields = Map::new();
        fields.insert("4. close".to_string(), json!("123.45"));
        let point = TimePoint::new("2024-01-01".to_string(), 123.45, fields);

        assert_eq!(
            point.to_json(),
            json!({"x": "2024-01-01", "y": 123.45, "4. close": "123.45"})
        );
    }

    #[test]
    fn test_persisted_shape_round_trips() {
        let mut fields = Map::new();
        fields.insert("1. open".to_string(), json!("10.0"));
        let data = NormalizedData::TimeSeries(vec![TimePoint::new(
            "2024-01-02".to_string(),
            10.0,
            fields,
        )]);

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["shape"], json!("timeSeries"));
        assert_eq!(value["data"][0]["1. open"], json!("10.0"));

        let back: NormalizedData = serde_json::from_value(value).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_len_and_label() {
        let data = NormalizedData::RecordArray(vec![json!({"a": 1}), json!({"b": 2})]);
        assert_eq!(data.len(), 2);
        assert_eq!(data.shape_label(), "records");
        assert!(NormalizedData::KeyValue(Map::new()).is_empty());
    }
}
