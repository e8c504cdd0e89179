// ============================================================================
// Catalogue de presets
// ============================================================================
// Liste statique de formes d'API connues, utilisée uniquement pour
// préremplir le formulaire de création. Jamais consultée pendant un cycle
// de fetch.
//
// CONCEPT RUST : données 'static
// - Le catalogue vit pendant toute la durée du programme
// - &'static str : pas d'allocation, tout est dans le binaire
// ============================================================================

use crate::models::LayoutKind;

/// Une entrée du catalogue
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub id: &'static str,
    pub label: &'static str,
    pub api_url: &'static str,
    /// Headers préremplis (valeurs vides à compléter par l'utilisateur)
    pub headers: &'static [(&'static str, &'static str)],
    pub layout: Option<LayoutKind>,
}

const INDIAN_API_KEY: &[(&str, &str)] = &[("X-Api-Key", "")];

/// Le catalogue
pub const PRESETS: &[Preset] = &[
    // IndianAPI
    Preset {
        id: "indianapi_bse_most_active",
        label: "IndianAPI · BSE Most Active",
        api_url: "https://stock.indianapi.in/BSE_most_active",
        headers: INDIAN_API_KEY,
        layout: Some(LayoutKind::Table),
    },
    Preset {
        id: "indianapi_top_gainers",
        label: "IndianAPI · Top Gainers",
        api_url: "https://stock.indianapi.in/top_gainers",
        headers: INDIAN_API_KEY,
        layout: Some(LayoutKind::Table),
    },
    Preset {
        id: "indianapi_top_losers",
        label: "IndianAPI · Top Losers",
        api_url: "https://stock.indianapi.in/top_losers",
        headers: INDIAN_API_KEY,
        layout: Some(LayoutKind::Table),
    },
    Preset {
        id: "indianapi_trending",
        label: "IndianAPI · Trending",
        api_url: "https://stock.indianapi.in/trending",
        headers: INDIAN_API_KEY,
        layout: Some(LayoutKind::Table),
    },
    // Finnhub
    Preset {
        id: "finnhub_quote",
        label: "Finnhub · Quote",
        api_url: "https://finnhub.io/api/v1/quote",
        headers: &[],
        layout: Some(LayoutKind::Table),
    },
    Preset {
        id: "finnhub_company_profile",
        label: "Finnhub · Company Profile",
        api_url: "https://finnhub.io/api/v1/stock/profile2",
        headers: &[],
        layout: Some(LayoutKind::Card),
    },
    Preset {
        id: "finnhub_peers",
        label: "Finnhub · Company Peers",
        api_url: "https://finnhub.io/api/v1/stock/peers",
        headers: &[],
        layout: Some(LayoutKind::Table),
    },
    Preset {
        id: "finnhub_recommendation_trends",
        label: "Finnhub · Recommendation Trends",
        api_url: "https://finnhub.io/api/v1/stock/recommendation",
        headers: &[],
        layout: Some(LayoutKind::Table),
    },
    // Alpha Vantage
    Preset {
        id: "alpha_fx",
        label: "Alpha Vantage · FX Daily",
        api_url: "https://www.alphavantage.co/query?function=FX_DAILY&from_symbol=FROM_CURRENCY&to_symbol=TO_CURRENCY&outputsize=compact_or_full&apikey=",
        headers: &[],
        layout: Some(LayoutKind::Json),
    },
    Preset {
        id: "alpha_crypto",
        label: "Alpha Vantage · Crypto Daily",
        api_url: "https://www.alphavantage.co/query?function=DIGITAL_CURRENCY_DAILY&symbol=BTC&market=USD&apikey=",
        headers: &[],
        layout: Some(LayoutKind::Json),
    },
];

/// Cherche un preset par son identifiant
pub fn find_preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|preset| preset.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_preset() {
        let preset = find_preset("finnhub_company_profile").unwrap();
        assert_eq!(preset.layout, Some(LayoutKind::Card));
        assert!(find_preset("nope").is_none());
    }

    #[test]
    fn test_preset_ids_are_unique() {
        for (i, a) in PRESETS.iter().enumerate() {
            for b in &PRESETS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }
}
