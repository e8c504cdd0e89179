// ============================================================================
// Module : models
// ============================================================================
// Structures de données du tableau de bord : configuration des widgets,
// données normalisées, catalogue de presets et brouillon de formulaire
// ============================================================================

pub mod draft;      // Brouillon du formulaire d'ajout / édition
pub mod normalized; // Formes canoniques des réponses (KeyValue, RecordArray, TimeSeries)
pub mod preset;     // Catalogue statique de presets
pub mod widget;     // WidgetConfig et Widget (configuration + dernier résultat)

// Re-export des structures principales pour simplifier les imports
pub use draft::{HeaderPair, WidgetDraft, DEFAULT_INTERVAL_SECS};
pub use normalized::{NormalizedData, TimePoint};
pub use preset::{find_preset, Preset, PRESETS};
pub use widget::{LayoutKind, Widget, WidgetConfig, DEFAULT_CHART_FIELD};
