/// Policy for deciding whether a candidate message or comment has already
/// been posted. The comparison strategy is deliberately isolated here so it
/// can be swapped without touching the synchronizers.
pub trait DuplicateCheck: Send + Sync {
    fn is_duplicate(&self, candidate: &str, existing: &[String]) -> bool;
}

/// Exact text equality after trimming leading/trailing whitespace. This is
/// intentionally syntactic: editing a message template makes previously
/// posted copies non-matching, and a new copy will be posted.
pub struct ExactTrimMatch;

impl DuplicateCheck for ExactTrimMatch {
    fn is_duplicate(&self, candidate: &str, existing: &[String]) -> bool {
        let candidate = candidate.trim();
        existing.iter().any(|e| e.trim() == candidate)
    }
}
