//! # Manual Fallback Rate Table
//!
//! Static VAT rates keyed by two-letter destination country code, used
//! only when the remote tax provider fails. Unknown countries resolve to
//! a 0% rate, which keeps checkout moving at the cost of possibly
//! under-collecting — the result is flagged `is_manual_calculation` so
//! the order can be reviewed.
//!
//! NOTE: a static table drifts from real VAT rates over time. It is a
//! degraded-mode fallback, not the primary calculation path; keep it
//! small and obvious rather than complete.

/// Fallback VAT rates in basis points by ISO 3166-1 alpha-2 country code.
const FALLBACK_VAT_RATES_BPS: &[(&str, u32)] = &[
    ("AT", 2000), // Austria
    ("BE", 2100), // Belgium
    ("DE", 1900), // Germany
    ("DK", 2500), // Denmark
    ("EE", 2200), // Estonia
    ("ES", 2100), // Spain
    ("FI", 2550), // Finland
    ("FR", 2000), // France
    ("GB", 2000), // United Kingdom
    ("IE", 2300), // Ireland
    ("IT", 2200), // Italy
    ("LT", 2100), // Lithuania
    ("LU", 1700), // Luxembourg
    ("LV", 2100), // Latvia
    ("NL", 2100), // Netherlands
    ("NO", 2500), // Norway
    ("PL", 2300), // Poland
    ("PT", 2300), // Portugal
    ("SE", 2500), // Sweden
];

/// Looks up the fallback rate for a destination country.
///
/// Case-insensitive; unknown countries (including non-VAT jurisdictions
/// like the US, where the provider normally handles sales tax) return 0.
pub fn fallback_rate_bps(country: &str) -> u32 {
    let country = country.trim().to_ascii_uppercase();
    FALLBACK_VAT_RATES_BPS
        .iter()
        .find(|(code, _)| *code == country)
        .map(|(_, bps)| *bps)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_countries() {
        assert_eq!(fallback_rate_bps("FI"), 2550);
        assert_eq!(fallback_rate_bps("GB"), 2000);
        assert_eq!(fallback_rate_bps("DE"), 1900);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(fallback_rate_bps("fi"), 2550);
        assert_eq!(fallback_rate_bps(" se "), 2500);
    }

    #[test]
    fn test_unknown_countries_are_zero_rated() {
        assert_eq!(fallback_rate_bps("XX"), 0);
        assert_eq!(fallback_rate_bps("US"), 0);
        assert_eq!(fallback_rate_bps(""), 0);
    }
}
