// ============================================================================
// Helpers d'affichage
// ============================================================================
// Fonctions pures utilisées par le rendu : labels lisibles, colonnes d'un
// tableau hétérogène, formatage des cellules, extraction d'une série pour
// le graphique et choix de la vue selon le layout et la forme des données.
//
// Aucune dépendance à ratatui : tout est testable sans terminal.
// ============================================================================

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::normalize::parse_float;
use crate::models::{LayoutKind, NormalizedData};

/// Labels lisibles des clés de cotation usuelles (format Finnhub)
pub const LABELS: &[(&str, &str)] = &[
    ("c", "Current Price"),
    ("d", "Change"),
    ("dp", "Percent Change"),
    ("h", "High"),
    ("l", "Low"),
    ("o", "Open"),
    ("pc", "Previous Close"),
    ("t", "Timestamp"),
];

/// Champs candidats pour la valeur d'un point de graphique, par priorité
const SERIES_FIELDS: &[&str] = &["y", "close", "4. close", "c"];

/// Label affiché pour une clé (la clé elle-même si inconnue)
pub fn friendly_label(key: &str) -> &str {
    LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
        .unwrap_or(key)
}

/// Union des colonnes d'un tableau de lignes, dans l'ordre de première
/// apparition
///
/// Les lignes qui ne sont pas des objets n'apportent aucune colonne.
pub fn column_union(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows.iter().filter_map(Value::as_object) {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Formate une cellule
///
/// - chaîne : telle quelle
/// - objet / tableau : JSON compact
/// - absente ou null : vide
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Extrait la série (label, valeur) d'une liste de points JSON
///
/// Valeur : "y", sinon "close", sinon "4. close", sinon "c".
/// Label : "x" s'il existe, sinon l'index du point.
/// Les points sans valeur numérique sont ignorés.
pub fn chart_series(points: &[Value]) -> Vec<(String, f64)> {
    points
        .iter()
        .enumerate()
        .filter_map(|(index, point)| {
            let fields = point.as_object()?;
            let value = SERIES_FIELDS
                .iter()
                .find_map(|field| fields.get(*field).filter(|v| !v.is_null()))
                .and_then(parse_float)
                .filter(|v| v.is_finite())?;
            let label = fields
                .get("x")
                .map(|x| format_cell(Some(x)))
                .unwrap_or_else(|| index.to_string());
            Some((label, value))
        })
        .collect()
}

/// Bornes de l'axe Y avec une marge de 5%
pub fn series_bounds(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let (min, max) = values
        .iter()
        .fold((f64::MAX, f64::MIN), |(min, max), &v| (min.min(v), max.max(v)));

    // Série plate : on ouvre artificiellement l'axe
    let margin = if max > min { (max - min) * 0.05 } else { 1.0 };
    (min - margin, max + margin)
}

/// Vue de détail d'un widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailView {
    /// Pas encore de données
    Empty,

    /// Tableau label / valeur
    KeyValue,

    /// Tableau de lignes (colonnes en union)
    Records,

    /// Graphique ligne
    Chart,

    /// JSON indenté
    Json,
}

/// Choisit la vue selon le layout et la forme normalisée
pub fn choose_view(layout: LayoutKind, data: Option<&NormalizedData>) -> DetailView {
    let Some(data) = data else {
        return DetailView::Empty;
    };

    match (layout, data) {
        (LayoutKind::Json, NormalizedData::TimeSeries(_)) => DetailView::Chart,
        (LayoutKind::Json, _) => DetailView::Json,
        (_, NormalizedData::KeyValue(_)) => DetailView::KeyValue,
        (LayoutKind::Table, _) => DetailView::Records,
        (LayoutKind::Card, _) => DetailView::Json,
    }
}

/// Âge lisible de la dernière mise à jour
pub fn format_age(last_updated: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(updated) = last_updated else {
        return "never".to_string();
    };

    let secs = (now - updated).num_seconds().max(0);
    match secs {
        0..=59 => format!("{}s ago", secs),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => updated.format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// Pied de carte : "Every 30s"
pub fn every_label(interval: u64) -> String {
    format!("Every {}s", interval)
}

// ============================================================================
// Tests unitaires
// ============================================================================
