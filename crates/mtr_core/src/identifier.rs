use std::fmt;

/// Maximum number of digits kept from a raw manifest code.
pub const MANIFEST_ID_LEN: usize = 10;

/// Canonical manifest code: digits only, at most [`MANIFEST_ID_LEN`] long.
///
/// Deduplication everywhere in the queue is keyed on this form, so a code
/// typed as `"0001-234 567"` and one scanned as `"0001234567"` collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManifestId(String);

impl ManifestId {
    /// Strips every non-digit and truncates. Returns `None` when nothing is left.
    pub fn normalize(raw: &str) -> Option<Self> {
        let digits: String = raw
            .chars()
            .filter(char::is_ascii_digit)
            .take(MANIFEST_ID_LEN)
            .collect();
        if digits.is_empty() {
            None
        } else {
            Some(Self(digits))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ManifestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_and_letters() {
        let id = ManifestId::normalize(" MTR 123.456-7 ").unwrap();
        assert_eq!(id.as_str(), "1234567");
    }

    #[test]
    fn truncates_to_ten_digits() {
        let id = ManifestId::normalize("123456789012345").unwrap();
        assert_eq!(id.as_str(), "1234567890");
    }

    #[test]
    fn empty_after_normalization_is_none() {
        assert_eq!(ManifestId::normalize(""), None);
        assert_eq!(ManifestId::normalize("abc"), None);
        assert_eq!(ManifestId::normalize("  -/ "), None);
    }

    #[test]
    fn ignores_non_ascii_digits() {
        assert_eq!(ManifestId::normalize("١٢٣"), None);
    }
}
