// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod dashboard;   // Rendu de l'interface principale
pub mod events;      // Gestion des événements clavier
pub mod form;        // Formulaire d'ajout / édition
pub mod format;      // Helpers d'affichage (labels, colonnes, séries)
pub mod theme;       // Palettes dark / light
pub mod widget_view; // Détail du widget sélectionné

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
