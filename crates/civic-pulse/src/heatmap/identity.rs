use std::collections::BTreeSet;

/// Expand raw person identifiers into every spelling that may appear as a
/// join key in another ingestion source.
///
/// OCD-style person ids arrive inconsistently as `ocd-person_abc` or
/// `ocd-person/abc` depending on which upstream wrote them, so each input
/// contributes itself plus a first-occurrence underscore/slash swap. Empty
/// and missing inputs are skipped.
pub fn normalize_ids<'a, I>(ids: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut out = BTreeSet::new();
    for raw in ids.into_iter().flatten() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.insert(trimmed.to_string());
        if trimmed.contains('_') {
            out.insert(trimmed.replacen('_', "/", 1));
        }
        if trimmed.contains('/') {
            out.insert(trimmed.replacen('/', "_", 1));
        }
    }
    out
}

/// Variants of a single identifier, for resolving an unknown join key
/// against an already-built index.
pub fn id_variants(raw: &str) -> BTreeSet<String> {
    normalize_ids([Some(raw)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_missing_and_empty_inputs() {
        let out = normalize_ids([None, Some(""), Some("   "), Some("ocd-person/abc")]);
        assert_eq!(out.len(), 2);
        assert!(out.contains("ocd-person/abc"));
        assert!(out.contains("ocd-person_abc"));
    }

    #[test]
    fn swaps_first_separator_in_both_directions() {
        let out = normalize_ids([Some("ocd-person_abc"), Some("a/b/c")]);
        assert!(out.contains("ocd-person_abc"));
        assert!(out.contains("ocd-person/abc"));
        assert!(out.contains("a/b/c"));
        assert!(out.contains("a_b/c"));
    }

    #[test]
    fn renormalizing_output_adds_nothing_new() {
        let first = normalize_ids([Some("ocd-person_abc"), Some("B001234"), Some("Jane Doe")]);
        for variant in &first {
            let again = normalize_ids([Some(variant.as_str())]);
            assert!(
                again.is_subset(&first),
                "variant '{variant}' expanded beyond the first pass"
            );
        }
    }
}
