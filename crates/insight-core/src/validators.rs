//! Field cleanup rules applied to identifier columns before typed records
//! are built.
//!
//! Each validator is a pure `&str -> String` function attached to a column
//! by name in the analysis pipeline, replacing the original runtime schema
//! validation with explicit, testable functions.

/// A pure cleanup rule for one text field.
pub type FieldValidator = fn(&str) -> String;

/// Building marker appended to unit names in the rental dataset.
const UNIT_MARKER: &str = "(blocoAP)";

/// Lowercase and trim a customer identifier so `"Ana"` and `"ana "` group
/// together.
pub fn lowercase_trim(value: &str) -> String {
    value.to_lowercase().trim().to_string()
}

/// Remove the `(blocoAP)` building marker from a unit name, then trim.
pub fn strip_unit_marker(value: &str) -> String {
    value.replace(UNIT_MARKER, "").trim().to_string()
}
