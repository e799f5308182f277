//! Minimal ISO 3166-1 alpha-2 normalization for the `Country` extended-info
//! field. The reference implementation's full country table (numeric and
//! alpha-3 lookups feeding UI flag icons) is an external collaborator, not
//! part of this wire parser; this keeps only the normalization the parser
//! itself is contractually required to perform.

/// Normalize a raw 3-byte country field to uppercase alpha-2, or `"??"`
/// if it cannot be read as one.
pub fn normalize_country_code(raw: &str) -> String {
    let alpha2: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(2)
        .collect::<String>()
        .to_ascii_uppercase();

    if alpha2.chars().count() == 2 {
        alpha2
    } else {
        "??".to_string()
    }
}
