//! Front-matter validation.
//!
//! Each section declares the fields its documents must carry. The section's
//! index document is an entry page rather than a dated article, so the two
//! date fields are never required of it.

use crate::content::ContentUnit;

/// Front-matter key holding the publication date.
pub const DATE_PUBLISHED: &str = "datePublished";
/// Front-matter key holding the last modification date.
pub const DATE_MODIFIED: &str = "dateModified";

/// Fields never required of a section's index document.
const INDEX_EXEMPT_FIELDS: &[&str] = &[DATE_PUBLISHED, DATE_MODIFIED];

/// Return the required fields `unit` lacks, in declaration order.
///
/// A field counts as missing when it is absent or blank. Any other value is
/// present, including `false` and `0`: they are substituted into the page
/// as their text.
pub fn missing_fields(unit: &ContentUnit, required: &[String], is_index: bool) -> Vec<String> {
    required
        .iter()
        .filter(|field| !(is_index && INDEX_EXEMPT_FIELDS.contains(&field.as_str())))
        .filter(|field| unit.attr(field).trim().is_empty())
        .cloned()
        .collect()
}
