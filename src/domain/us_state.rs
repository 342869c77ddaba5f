// ============================================================
// US STATE CODES
// ============================================================
// Two-letter USPS codes accepted for the `state` column

/// The 50 states, the District of Columbia and the inhabited territories.
pub const US_STATE_CODES: [&str; 57] = [
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY", "DC", "AS", "GU", "MP", "PR", "VI", "UM",
];

/// Trim and upper-case a state value, returning it only if it is a known code.
pub fn normalize_state(value: &str) -> Option<String> {
    let normalized = value.trim().to_ascii_uppercase();
    if US_STATE_CODES.contains(&normalized.as_str()) {
        Some(normalized)
    } else {
        None
    }
}
