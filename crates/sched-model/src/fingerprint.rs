//! Column-set fingerprints used as mapping cache keys.
//!
//! The fingerprint only looks at column names. Two inputs that share a column
//! set collide on the same key even if their rows mean different things; the
//! cache is addressed by layout, not by content.

/// Separator placed between sorted column names.
pub const FINGERPRINT_DELIMITER: &str = "|";

/// Derives an order- and case-insensitive key from a set of column names.
pub fn fingerprint<S: AsRef<str>>(columns: &[S]) -> String {
    let mut names: Vec<String> = columns
        .iter()
        .map(|column| column.as_ref().to_lowercase())
        .collect();
    names.sort();
    names.join(FINGERPRINT_DELIMITER)
}
