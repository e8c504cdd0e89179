// ============================================================================
// Finboard - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;    // Request Builder, client HTTP, Response Normalizer
pub mod app;    // État de l'application
pub mod config; // Paramètres d'exécution
pub mod cycle;  // Fetch Cycle Controller
pub mod error;  // Erreurs typées
pub mod models; // Structures de données
pub mod store;  // Widget Store persisté
pub mod ui;     // Interface utilisateur
