// crates/citysearch-core/src/states.rs

//! # US State Table
//!
//! Two-letter postal codes and display names for the 50 states, DC and
//! Puerto Rico. Used to fill in missing state names while parsing and to
//! accept either `"TX"` or `"Texas"` as a state filter.

use crate::text::equals_folded;

static US_STATES: &[(&str, &str)] = &[
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// All `(code, name)` pairs, ordered by name.
pub fn all_states() -> &'static [(&'static str, &'static str)] {
    US_STATES
}

/// Display name for a two-letter code, case-insensitive.
///
/// ```rust
/// use citysearch_core::states::state_name;
///
/// assert_eq!(state_name("az"), Some("Arizona"));
/// assert_eq!(state_name("XX"), None);
/// ```
pub fn state_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    US_STATES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, n)| *n)
}

/// Resolves either a code (`"tx"`) or a full name (`"Texas"`) to the
/// canonical upper-case code.
pub fn state_code(name_or_code: &str) -> Option<&'static str> {
    let q = name_or_code.trim();
    US_STATES
        .iter()
        .find(|(c, n)| c.eq_ignore_ascii_case(q) || equals_folded(n, q))
        .map(|(c, _)| *c)
}
