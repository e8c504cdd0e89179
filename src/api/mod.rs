// ============================================================================
// Module : api
// ============================================================================
// Tout ce qui touche aux APIs externes : construction des requêtes,
// transport HTTP et normalisation des réponses
// ============================================================================

pub mod client;    // Transport HTTP (trait HttpFetch + client reqwest)
pub mod normalize; // Response Normalizer
pub mod request;   // Request Builder

// Re-export des fonctions principales
pub use client::{HttpClient, HttpFetch, DEFAULT_USER_AGENT};
pub use normalize::{aggregate_fan_out, normalize};
pub use request::{build_plan, RequestPlan, RequestSpec};
