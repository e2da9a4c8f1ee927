use std::cmp::Ordering;

use super::Student;

// -0.0 and 0.0 must compare as the same score.
fn rank_key(score: f64) -> f64 {
    score + 0.0
}

fn same_score(a: f64, b: f64) -> bool {
    rank_key(a).total_cmp(&rank_key(b)).is_eq()
}

/// Order used for course rankings: highest score first, equal scores by ascending
/// student id so the result does not depend on store iteration order.
pub fn compare_ranked(a: &(Student, f64), b: &(Student, f64)) -> Ordering {
    rank_key(b.1)
        .total_cmp(&rank_key(a.1))
        .then_with(|| a.0.id.cmp(&b.0.id))
}

/// Competition ranks ("1, 2, 2, 4") for scores already sorted descending.
pub fn competition_ranks(sorted_scores: &[f64]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(sorted_scores.len());
    for (i, score) in sorted_scores.iter().enumerate() {
        let rank = if i > 0 && same_score(sorted_scores[i - 1], *score) {
            ranks[i - 1]
        } else {
            i + 1
        };
        ranks.push(rank);
    }
    ranks
}
