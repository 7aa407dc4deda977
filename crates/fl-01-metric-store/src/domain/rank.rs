//! Decay-weighted rank score
//!
//! `score = incentive_score * motivation_factor / decay_factor`
//!
//! Integer arithmetic with truncating division (toward zero, also for
//! negative incentive scores). A zero decay factor yields a score of 0.
//! The product is formed in 128 bits, so it cannot overflow; a quotient
//! outside the `i64` range saturates.

/// Compute the rank score of a piece of content.
#[must_use]
pub fn rank_score(incentive_score: i64, decay_factor: u64, motivation_factor: i64) -> i64 {
    if decay_factor == 0 {
        return 0;
    }

    let scaled = i128::from(incentive_score) * i128::from(motivation_factor);
    let score = scaled / i128::from(decay_factor);

    i64::try_from(score).unwrap_or(if score.is_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}
