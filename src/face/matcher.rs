use serde::Serialize;
use utoipa::ToSchema;

/// Minimum similarity score (percent) a candidate must reach before it can
/// be accepted as a match.
pub const MIN_MATCH_SCORE: u8 = 60;

/// A registered employee with an already-normalized descriptor. Roster
/// loading is where the stored shapes are decoded (and undecodable rows
/// silently dropped); matching itself only ever sees flat vectors.
#[derive(Debug, Clone)]
pub struct FaceCandidate {
    pub employee_id: String,
    pub name: String,
    pub descriptor: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FaceMatch {
    #[schema(example = "ckw9x0001")]
    pub employee_id: String,
    #[schema(example = "Budi Santoso")]
    pub name: String,
    #[schema(example = 87)]
    pub score: u8,
}

/// Picks the candidate with the strictly highest score at or above
/// `min_score`. Ties keep the first candidate found; a candidate whose
/// descriptor length differs from the live frame is skipped, not an error.
/// No candidate qualifying returns `None` — the operator re-scans, the
/// system never guesses.
pub fn best_match(
    live: &[f32],
    candidates: &[FaceCandidate],
    min_score: u8,
) -> Option<FaceMatch> {
    let mut best: Option<FaceMatch> = None;

    for candidate in candidates {
        if candidate.descriptor.len() != live.len() {
            continue;
        }

        let distance = super::descriptor::euclidean_distance(live, &candidate.descriptor);
        let score = super::descriptor::match_score(distance);

        if score >= min_score && best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(FaceMatch {
                employee_id: candidate.employee_id.clone(),
                name: candidate.name.clone(),
                score,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, descriptor: Vec<f32>) -> FaceCandidate {
        FaceCandidate {
            employee_id: id.to_string(),
            name: id.to_uppercase(),
            descriptor,
        }
    }

    #[test]
    fn identical_descriptor_scores_100_and_wins() {
        let live = vec![0.1f32; 128];
        let mut other = live.clone();
        other[0] += 0.2; // distance 0.2 -> score 67

        let candidates = vec![candidate("other", other), candidate("exact", live.clone())];
        let m = best_match(&live, &candidates, MIN_MATCH_SCORE).unwrap();
        assert_eq!(m.employee_id, "exact");
        assert_eq!(m.score, 100);
    }

    #[test]
    fn below_threshold_matches_nothing() {
        let live = vec![0.0f32; 128];
        let mut far = live.clone();
        far[0] = 0.5; // distance 0.5 -> score 17

        let candidates = vec![candidate("far", far)];
        assert!(best_match(&live, &candidates, MIN_MATCH_SCORE).is_none());
    }

    #[test]
    fn tie_keeps_the_first_candidate() {
        let live = vec![0.0f32; 128];
        let candidates = vec![
            candidate("first", live.clone()),
            candidate("second", live.clone()),
        ];
        let m = best_match(&live, &candidates, MIN_MATCH_SCORE).unwrap();
        assert_eq!(m.employee_id, "first");
    }

    #[test]
    fn length_mismatch_is_skipped_silently() {
        let live = vec![0.0f32; 128];
        let candidates = vec![
            candidate("short", vec![0.0f32; 64]),
            candidate("full", live.clone()),
        ];
        let m = best_match(&live, &candidates, MIN_MATCH_SCORE).unwrap();
        assert_eq!(m.employee_id, "full");
    }

    #[test]
    fn empty_roster_matches_nothing() {
        assert!(best_match(&[0.0; 128], &[], MIN_MATCH_SCORE).is_none());
    }
}
