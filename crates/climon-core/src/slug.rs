//! Canonical name normalization.
//!
//! Every identifier that leaves user-supplied text — tenant usernames,
//! place names, and the compound `tenant_place` key that scopes readings
//! and authorization — goes through [`normalize`]. Normalization logic
//! lives only here; callers derive, never re-implement.

/// Normalize arbitrary text into a canonical slug.
///
/// Characters outside letters, digits, whitespace, and hyphen are
/// stripped; runs of whitespace/hyphen collapse into a single `_`; the
/// result is lower-cased. Total and idempotent — an input of only
/// disallowed characters yields the empty slug.
pub fn normalize(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_separator = true;
        }
        // Anything else is stripped without acting as a separator.
    }

    slug
}

/// Build the compound `tenant_place` identifier from raw text.
pub fn compound(tenant: &str, place: &str) -> String {
    format!("{}_{}", normalize(tenant), normalize(place))
}
