use keystone_common::{
    review::{ConsensusContext, ConsensusResult, ConsensusStrategy, Vote, DEFAULT_TRUST_SCORE},
    Result,
};

use super::detector::{DetectorPolicy, ManipulationDetector};

/// Submitters below this trust are reviewed under supermajority by `adaptive`.
pub const ADAPTIVE_STRICT_BELOW: f64 = 0.5;

/// Raw counts over a vote set, shared by every strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Tally {
    approvals: usize,
    rejections: usize,
    weighted_approval: f64,
    weighted_rejection: f64,
}

impl Tally {
    fn from_votes(votes: &[Vote]) -> Self {
        votes.iter().fold(Tally::default(), |mut tally, vote| {
            // Trust is summed as given; anomalous scores stay visible.
            if vote.approved {
                tally.approvals += 1;
                tally.weighted_approval += vote.weight();
            } else {
                tally.rejections += 1;
                tally.weighted_rejection += vote.weight();
            }
            tally
        })
    }

    fn total(&self) -> usize {
        self.approvals + self.rejections
    }

    fn approval_ratio(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.approvals as f64 / n as f64,
        }
    }
}

/// Aggregates a frozen vote set into an accept/reject decision.
///
/// Stateless apart from its detector policy.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConsensusCalculator {
    pub detector: ManipulationDetector,
}

impl ConsensusCalculator {
    pub fn new(policy: DetectorPolicy) -> Self {
        Self {
            detector: ManipulationDetector::new(policy),
        }
    }

    /// Computes the decision and statistics for `votes` under `strategy`.
    ///
    /// Counts, ratio, weighted sums and suspicious patterns are always filled
    /// in; only `accepted` depends on the strategy. An empty vote set is never
    /// accepted.
    pub fn calculate(
        &self,
        votes: &[Vote],
        strategy: ConsensusStrategy,
        context: &ConsensusContext,
    ) -> ConsensusResult {
        let tally = Tally::from_votes(votes);
        let effective_strategy = resolve(strategy, context);

        let accepted = tally.total() > 0 && decide(strategy, &tally, context);

        ConsensusResult {
            accepted,
            approval_count: tally.approvals,
            rejection_count: tally.rejections,
            total_votes: tally.total(),
            approval_ratio: tally.approval_ratio(),
            weighted_approval: tally.weighted_approval,
            weighted_rejection: tally.weighted_rejection,
            suspicious_patterns: self.detector.inspect(votes),
            strategy,
            effective_strategy,
        }
    }

    /// Like [`calculate`](Self::calculate), with the strategy given by name.
    ///
    /// Unknown names fail with `ReviewError::InvalidStrategy`.
    pub fn calculate_named(
        &self,
        votes: &[Vote],
        strategy: &str,
        context: &ConsensusContext,
    ) -> Result<ConsensusResult> {
        let strategy = strategy.parse::<ConsensusStrategy>()?;
        Ok(self.calculate(votes, strategy, context))
    }
}

/// Picks the concrete rule for `strategy`. Only `adaptive` looks at the context.
fn resolve(strategy: ConsensusStrategy, context: &ConsensusContext) -> ConsensusStrategy {
    match strategy {
        ConsensusStrategy::Adaptive => {
            let trust = context.submitter_trust.unwrap_or(DEFAULT_TRUST_SCORE);
            // NaN trust falls through to the strict side.
            if trust >= ADAPTIVE_STRICT_BELOW {
                ConsensusStrategy::SimpleMajority
            } else {
                ConsensusStrategy::Supermajority
            }
        }
        other => other,
    }
}

fn decide(strategy: ConsensusStrategy, tally: &Tally, context: &ConsensusContext) -> bool {
    let n = tally.total();
    let approvals = tally.approvals;

    match strategy {
        // Ties reject.
        ConsensusStrategy::SimpleMajority => approvals > tally.rejections,
        ConsensusStrategy::TrustWeighted => tally.weighted_approval > tally.weighted_rejection,
        // approvals / n >= 2/3, kept in integers so the boundary is exact.
        ConsensusStrategy::Supermajority => 3 * approvals >= 2 * n,
        ConsensusStrategy::ByzantineFaultTolerant => {
            // n = 3f + 1
            let f = n.saturating_sub(1) / 3;
            approvals >= 2 * f + 1
        }
        // ceil(3n / 4)
        ConsensusStrategy::Quorum => approvals >= (3 * n + 3) / 4,
        ConsensusStrategy::Adaptive => decide(resolve(strategy, context), tally, context),
    }
}

/// [`ConsensusCalculator::calculate`] with the default detector policy.
pub fn calculate(
    votes: &[Vote],
    strategy: ConsensusStrategy,
    context: &ConsensusContext,
) -> ConsensusResult {
    ConsensusCalculator::default().calculate(votes, strategy, context)
}

/// [`ConsensusCalculator::calculate_named`] with the default detector policy.
pub fn calculate_named(
    votes: &[Vote],
    strategy: &str,
    context: &ConsensusContext,
) -> Result<ConsensusResult> {
    ConsensusCalculator::default().calculate_named(votes, strategy, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_common::{review::SuspiciousPattern, ReviewError};

    fn ballots(pattern: &[bool]) -> Vec<Vote> {
        pattern
            .iter()
            .enumerate()
            .map(|(i, approved)| Vote::new(format!("validator-{}", i), *approved))
            .collect()
    }

    fn run(votes: &[Vote], strategy: ConsensusStrategy) -> ConsensusResult {
        calculate(votes, strategy, &ConsensusContext::default())
    }

    #[test]
    fn test_empty_vote_set_never_accepts() {
        for strategy in ConsensusStrategy::ALL {
            let result = run(&[], strategy);
            assert!(!result.accepted, "{} accepted zero votes", strategy);
            assert_eq!(result.approval_ratio, 0.0);
            assert!(result.suspicious_patterns.is_empty());
        }
    }

    #[test]
    fn test_simple_majority_tie_rejects() {
        assert!(!run(&ballots(&[true, false]), ConsensusStrategy::SimpleMajority).accepted);
        assert!(run(&ballots(&[true, true, false]), ConsensusStrategy::SimpleMajority).accepted);
    }

    #[test]
    fn test_trust_weighted_high_trust_outweighs() {
        let votes = vec![
            Vote::new("a", true).with_trust(0.9),
            Vote::new("b", false).with_trust(0.3),
        ];
        let result = run(&votes, ConsensusStrategy::TrustWeighted);
        assert!(result.accepted);
        assert!((result.weighted_approval - 0.9).abs() < 1e-12);
        assert!((result.weighted_rejection - 0.3).abs() < 1e-12);

        let swapped = vec![
            Vote::new("a", true).with_trust(0.3),
            Vote::new("b", false).with_trust(0.9),
        ];
        assert!(!run(&swapped, ConsensusStrategy::TrustWeighted).accepted);
    }

    #[test]
    fn test_trust_weighted_one_vote_beats_several() {
        let votes = vec![
            Vote::new("elder", true).with_trust(1.0),
            Vote::new("n1", false).with_trust(0.2),
            Vote::new("n2", false).with_trust(0.2),
            Vote::new("n3", false).with_trust(0.2),
        ];
        assert!(run(&votes, ConsensusStrategy::TrustWeighted).accepted);
        assert!(!run(&votes, ConsensusStrategy::SimpleMajority).accepted);
    }

    #[test]
    fn test_trust_weighted_defaults_missing_trust() {
        // 0.5 (default) vs 0.4
        let votes = vec![Vote::new("a", true), Vote::new("b", false).with_trust(0.4)];
        let result = run(&votes, ConsensusStrategy::TrustWeighted);
        assert!(result.accepted);
        assert_eq!(result.weighted_approval, 0.5);
    }

    #[test]
    fn test_out_of_range_trust_is_not_clamped() {
        let votes = vec![
            Vote::new("a", true).with_trust(-1.0),
            Vote::new("b", false).with_trust(0.1),
        ];
        let result = run(&votes, ConsensusStrategy::TrustWeighted);
        assert_eq!(result.weighted_approval, -1.0);
        assert!(!result.accepted);
    }

    #[test]
    fn test_weighted_sums_computed_for_every_strategy() {
        let votes = vec![Vote::new("a", true).with_trust(0.8), Vote::new("b", false)];
        let result = run(&votes, ConsensusStrategy::Quorum);
        assert_eq!(result.weighted_approval, 0.8);
        assert_eq!(result.weighted_rejection, 0.5);
    }

    #[test]
    fn test_supermajority_threshold_inclusive() {
        assert!(run(&ballots(&[true, true, false]), ConsensusStrategy::Supermajority).accepted);
        assert!(run(&ballots(&[true, true, true, true, false, false]), ConsensusStrategy::Supermajority).accepted);
        assert!(!run(&ballots(&[true, true, false, false]), ConsensusStrategy::Supermajority).accepted);
        assert!(!run(&ballots(&[true, true, true, true, true, false, false, false]), ConsensusStrategy::Supermajority).accepted);
    }

    #[test]
    fn test_bft_quorum_from_n() {
        // n = 4 -> f = 1 -> 3 approvals
        assert!(run(&ballots(&[true, true, true, false]), ConsensusStrategy::ByzantineFaultTolerant).accepted);
        assert!(!run(&ballots(&[true, true, false, false]), ConsensusStrategy::ByzantineFaultTolerant).accepted);

        // n = 1 -> f = 0 -> 1 approval
        assert!(run(&ballots(&[true]), ConsensusStrategy::ByzantineFaultTolerant).accepted);

        // n = 7 -> f = 2 -> 5 approvals
        let four_of_seven = ballots(&[true, true, true, true, false, false, false]);
        assert!(!run(&four_of_seven, ConsensusStrategy::ByzantineFaultTolerant).accepted);
        let five_of_seven = ballots(&[true, true, true, true, true, false, false]);
        assert!(run(&five_of_seven, ConsensusStrategy::ByzantineFaultTolerant).accepted);
    }

    #[test]
    fn test_quorum_three_quarters() {
        assert!(run(&ballots(&[true, true, true, false]), ConsensusStrategy::Quorum).accepted);
        assert!(!run(&ballots(&[true, true, false, false]), ConsensusStrategy::Quorum).accepted);

        // n = 5 -> ceil(15 / 4) = 4
        assert!(!run(&ballots(&[true, true, true, false, false]), ConsensusStrategy::Quorum).accepted);
        assert!(run(&ballots(&[true, true, true, true, false]), ConsensusStrategy::Quorum).accepted);
    }

    #[test]
    fn test_adaptive_follows_submitter_trust() {
        let two_of_three = ballots(&[true, true, false]);
        let low = calculate(
            &two_of_three,
            ConsensusStrategy::Adaptive,
            &ConsensusContext::with_submitter_trust(0.3),
        );
        assert!(low.accepted);
        assert_eq!(low.effective_strategy, ConsensusStrategy::Supermajority);

        let tie = ballots(&[true, false]);
        let high = calculate(
            &tie,
            ConsensusStrategy::Adaptive,
            &ConsensusContext::with_submitter_trust(0.9),
        );
        assert!(!high.accepted);
        assert_eq!(high.strategy, ConsensusStrategy::Adaptive);
        assert_eq!(high.effective_strategy, ConsensusStrategy::SimpleMajority);
    }

    #[test]
    fn test_adaptive_is_stricter_for_low_trust() {
        // 3 of 5 passes majority but not supermajority
        let votes = ballots(&[true, true, true, false, false]);
        let strict = calculate(&votes, ConsensusStrategy::Adaptive, &ConsensusContext::with_submitter_trust(0.49));
        let lenient = calculate(&votes, ConsensusStrategy::Adaptive, &ConsensusContext::with_submitter_trust(0.5));
        assert!(!strict.accepted);
        assert!(lenient.accepted);
    }

    #[test]
    fn test_adaptive_nan_submitter_trust_is_strict() {
        // 3 of 5 clears majority but not two thirds.
        let votes = ballots(&[true, true, true, false, false]);
        let result = calculate(&votes, ConsensusStrategy::Adaptive, &ConsensusContext::with_submitter_trust(f64::NAN));
        assert_eq!(result.effective_strategy, ConsensusStrategy::Supermajority);
        assert!(!result.accepted);
    }

    #[test]
    fn test_adaptive_without_context_uses_simple_majority() {
        let result = run(&ballots(&[true, true, true, false, false]), ConsensusStrategy::Adaptive);
        assert_eq!(result.effective_strategy, ConsensusStrategy::SimpleMajority);
        assert!(result.accepted);
    }

    #[test]
    fn test_calculate_named_rejects_unknown_strategy() {
        let err = calculate_named(&ballots(&[true]), "plurality", &ConsensusContext::default()).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidStrategy(name) if name == "plurality"));

        let ok = calculate_named(&ballots(&[true]), "quorum", &ConsensusContext::default()).unwrap();
        assert!(ok.accepted);
    }

    #[test]
    fn test_patterns_never_change_decision() {
        let votes: Vec<Vote> = (0..3)
            .map(|i| Vote::new(format!("bot{}", i), true).with_trust(0.5).at(5_000 + i * 50))
            .collect();
        let result = run(&votes, ConsensusStrategy::SimpleMajority);
        assert!(result.accepted);
        assert!(result.has_pattern(SuspiciousPattern::IdenticalTrustScores));
        assert!(result.has_pattern(SuspiciousPattern::RapidVoting));
    }

    #[test]
    fn test_counts_and_ratio() {
        let result = run(&ballots(&[true, false, false, true, true]), ConsensusStrategy::SimpleMajority);
        assert_eq!(result.approval_count, 3);
        assert_eq!(result.rejection_count, 2);
        assert_eq!(result.total_votes, 5);
        assert!((result.approval_ratio - 0.6).abs() < 1e-12);
    }
}
