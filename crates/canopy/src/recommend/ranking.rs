//! Deterministic ranking and presentation formatting.

use super::domain::{ExcludedSpecies, RecommendationEntry, ScoredSpecies};

/// Assign dense ranks to an already-sorted score sequence.
///
/// The rank only advances when the score strictly changes, so ties share a
/// rank and there are no gaps: [0.82, 0.76, 0.76, 0.70] -> [1, 2, 2, 3].
pub fn assign_dense_ranks(scores: &[f64]) -> Vec<i32> {
    let mut ranks = Vec::with_capacity(scores.len());
    let mut last_score: Option<f64> = None;
    let mut current_rank = 0;
    for &score in scores {
        if last_score != Some(score) {
            current_rank += 1;
            last_score = Some(score);
        }
        ranks.push(current_rank);
    }
    ranks
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Sort, rank, and format scored species into recommendation rows.
///
/// Sorting is score descending with species id ascending as the tie break,
/// making the order fully deterministic. Ranks are assigned from the
/// unrounded scores; rounding is presentation only.
pub fn build_recommendations(mut scored: Vec<ScoredSpecies>) -> Vec<RecommendationEntry> {
    scored.sort_by(|left, right| {
        right
            .mcda_score
            .total_cmp(&left.mcda_score)
            .then(left.species_id.cmp(&right.species_id))
    });

    let scores: Vec<f64> = scored.iter().map(|species| species.mcda_score).collect();
    let ranks = assign_dense_ranks(&scores);

    scored
        .into_iter()
        .zip(ranks)
        .map(|(species, rank)| {
            let key_reasons = species
                .features
                .iter()
                .map(|trace| format!("{}:{}", trace.short, trace.reason.to_lowercase()))
                .collect();
            RecommendationEntry {
                species_id: species.species_id,
                species_name: species.species_name,
                species_common_name: species.species_common_name,
                score_mcda: round3(species.mcda_score),
                rank_overall: rank,
                key_reasons,
            }
        })
        .collect()
}

/// Excluded species as a uniform recommendation row with sentinel values.
pub fn excluded_entry(excluded: &ExcludedSpecies) -> RecommendationEntry {
    RecommendationEntry {
        species_id: excluded.id,
        species_name: excluded.species_name.clone(),
        species_common_name: excluded.species_common_name.clone(),
        score_mcda: -1.0,
        rank_overall: -1,
        key_reasons: excluded.reasons.clone(),
    }
}
