use crate::models::{ComparisonResponse, PercentagePolicy, VerificationResult};

/// Map a verification result onto the public response shape
pub fn format_result(result: &VerificationResult, policy: PercentagePolicy) -> ComparisonResponse {
    let similarity = result.similarity();

    ComparisonResponse {
        matched: result.verified,
        distance: result.distance,
        similarity,
        percentage_match: percentage_match(similarity, policy),
    }
}

/// `round(similarity * 100)` followed by `%`
///
/// Ties round to even, so 62.5 becomes "62%" and 87.5 becomes "88%".
pub fn percentage_match(similarity: f64, policy: PercentagePolicy) -> String {
    let mut percent = (similarity * 100.0).round_ties_even();
    if policy == PercentagePolicy::Clamped {
        percent = percent.clamp(0.0, 100.0);
    }
    // via i64 so that -0.0 prints as "0"
    format!("{}%", percent as i64)
}
