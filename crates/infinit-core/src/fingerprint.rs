//! Content identity for source documents
//!
//! Two documents are the same if their URLs match, or failing that if the
//! SHA-256 of their whitespace-and-case-normalized text matches.

use infinit_domain::{Fingerprint, SourceDoc};
use sha2::{Digest, Sha256};

/// Lowercases and collapses all whitespace runs to single spaces.
pub fn normalize_content(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// SHA-256 over the normalized text, as lowercase hex.
pub fn content_fingerprint(text: &str) -> Fingerprint {
    let digest = Sha256::digest(normalize_content(text).as_bytes());
    Fingerprint::from_hex(hex::encode(digest))
}

/// Identity check between two stored documents. URL equality decides first;
/// fingerprints are only compared when both documents carry one.
pub fn same_document(a: &SourceDoc, b: &SourceDoc) -> bool {
    if a.url == b.url {
        return true;
    }
    match (&a.fingerprint, &b.fingerprint) {
        (Some(fa), Some(fb)) => fa == fb,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use infinit_domain::SourceId;

    fn doc(id: i64, url: &str, fingerprint: Option<Fingerprint>) -> SourceDoc {
        SourceDoc {
            id: SourceId(id),
            movement_id: None,
            url: url.to_string(),
            title: None,
            content: None,
            fingerprint,
            published_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_fingerprint_ignores_case_and_whitespace() {
        let a = content_fingerprint("Svědkové  Jehovovi\n\tv Praze");
        let b = content_fingerprint("svědkové jehovovi v praze");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_distinguishes_content() {
        assert_ne!(content_fingerprint("deti bozi"), content_fingerprint("hare krsna"));
    }

    #[test]
    fn test_same_url_wins_over_missing_fingerprints() {
        let a = doc(1, "https://example.org/a", None);
        let b = doc(2, "https://example.org/a", None);
        assert!(same_document(&a, &b));
    }

    #[test]
    fn test_matching_fingerprints_with_different_urls() {
        let fp = content_fingerprint("same text");
        let a = doc(1, "https://example.org/a", Some(fp.clone()));
        let b = doc(2, "https://example.org/b", Some(fp));
        assert!(same_document(&a, &b));
    }

    #[test]
    fn test_missing_fingerprint_never_matches() {
        let a = doc(1, "https://example.org/a", Some(content_fingerprint("x")));
        let b = doc(2, "https://example.org/b", None);
        assert!(!same_document(&a, &b));
    }
}
