#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::config::{GameRules, ModelSettings};
    use crate::error::StatsError;
    use crate::models::PlayerCountSelector;
    use crate::services::outcomes::{IntegerOutcome, IntegerSamples};
    use crate::services::theory::{binomial, Distribution, TheoreticalDistributionModel};

    const ALL_OUTCOMES: [IntegerOutcome; 3] = [
        IntegerOutcome::Sips,
        IntegerOutcome::Chugs,
        IntegerOutcome::TurnSips,
    ];

    fn model() -> TheoreticalDistributionModel {
        TheoreticalDistributionModel::new(GameRules::default(), ModelSettings::default())
    }

    fn simulating_model(trial_count: u64) -> TheoreticalDistributionModel {
        let settings = ModelSettings {
            trial_count,
            tractability_threshold: 0,
            ..ModelSettings::default()
        };
        TheoreticalDistributionModel::new(GameRules::default(), settings)
    }

    fn single(n: u32) -> BTreeMap<u32, u64> {
        BTreeMap::from([(n, 1)])
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(52, 0), 1.0);
        assert_eq!(binomial(3, 4), 0.0);
        assert!((binomial(52, 13) - 635_013_559_600.0).abs() < 1.0);
    }

    #[test]
    fn test_exact_models_sum_to_one_for_every_player_count() {
        let model = model();
        let rules = GameRules::default();
        for outcome in ALL_OUTCOMES {
            for n in rules.supported_player_counts() {
                let pmf = model.exact_component(outcome, n).unwrap();
                assert!(
                    (pmf.total() - 1.0).abs() < 1e-9,
                    "{} with {} players sums to {}",
                    outcome.name(),
                    n,
                    pmf.total()
                );
            }
        }
    }

    #[test]
    fn test_chugs_hypergeometric_four_players() {
        let pmf = model()
            .exact_component(IntegerOutcome::Chugs, 4)
            .unwrap();
        assert_eq!(pmf.description(), "HyperGeometric(52, 4, 13)");
        // No ace in a 13-card bridge hand
        assert!((pmf.prob(0) - 0.303_817_5).abs() < 1e-6);
        assert!((pmf.prob(1) - 0.438_847_5).abs() < 1e-6);
        assert!((pmf.prob(4) - 0.002_641_1).abs() < 1e-6);
        assert!((pmf.mean() - 1.0).abs() < 1e-9);
        assert_eq!(pmf.probs().len(), 5);
    }

    #[test]
    fn test_hand_sum_moments() {
        let model = model();
        for n in 2..=6 {
            let pmf = model.exact_component(IntegerOutcome::Sips, n).unwrap();
            // 13 cards averaging 8 sips
            assert!((pmf.mean() - 104.0).abs() < 1e-6, "mean for {} players", n);
            assert_eq!(pmf.prob(300), 0.0);
        }
        let two = model.exact_component(IntegerOutcome::Sips, 2).unwrap();
        assert_eq!(two.probs().len(), 147);
        assert!(two.prob(146) > 0.0);
        // Smallest hand: 2,2,3,3,...,7,7,8
        assert!(two.prob(62) > 0.0);
        assert_eq!(two.prob(61), 0.0);
        assert_eq!(two.description(), "HandSum(26, 13)");
    }

    #[test]
    fn test_hand_sum_single_suit_is_deterministic() {
        // One player holding the whole deck always sums to 104
        let rules = GameRules {
            min_players: 1,
            ..GameRules::default()
        };
        let model = TheoreticalDistributionModel::new(rules, ModelSettings::default());
        let pmf = model.exact_component(IntegerOutcome::Sips, 1).unwrap();
        assert!((pmf.prob(104) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_turn_sips_uniform() {
        let pmf = model()
            .exact_component(IntegerOutcome::TurnSips, 3)
            .unwrap();
        assert_eq!(pmf.description(), "Uniform(2..=14)");
        assert_eq!(pmf.prob(0), 0.0);
        assert_eq!(pmf.prob(1), 0.0);
        for v in 2..=14 {
            assert!((pmf.prob(v) - 1.0 / 13.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_single_player_count_is_exact() {
        let dist = model()
            .distribution(IntegerOutcome::Sips, &single(6), 174)
            .unwrap();
        assert!(dist.is_exact());
        assert_eq!(dist.trials(), None);
        assert_eq!(dist.pmf().probs().len(), 175);
    }

    #[test]
    fn test_mixture_over_all_counts_stays_exact() {
        let model = model();
        let weights: BTreeMap<u32, u64> = (2..=6).map(|n| (n, 1)).collect();
        let total: u64 = (2..=6)
            .map(|n| model.state_space(IntegerOutcome::Sips, n))
            .sum();
        assert_eq!(total, 761_124);

        let dist = model
            .distribution(IntegerOutcome::Sips, &weights, 174)
            .unwrap();
        assert!(dist.is_exact());
        assert!((dist.pmf().total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mixture_weights_and_description() {
        let model = model();
        let weights = BTreeMap::from([(2, 1), (4, 3)]);
        let dist = model
            .distribution(IntegerOutcome::Chugs, &weights, 6)
            .unwrap();
        let two = model.exact_component(IntegerOutcome::Chugs, 2).unwrap();
        let four = model.exact_component(IntegerOutcome::Chugs, 4).unwrap();
        for k in 0..=6 {
            let expected = 0.25 * two.prob(k) + 0.75 * four.prob(k);
            assert!((dist.pmf().prob(k) - expected).abs() < 1e-12);
        }
        assert_eq!(
            dist.pmf().description(),
            "0.25 * HyperGeometric(26, 2, 13) +\n0.75 * HyperGeometric(52, 4, 13)"
        );
        assert_eq!(dist.pmf().probs().len(), 7);
    }

    #[test]
    fn test_dist_str_lists_non_zero_values() {
        let dist = model()
            .distribution(IntegerOutcome::Chugs, &single(2), 6)
            .unwrap();
        let text = dist.dist_str();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("HyperGeometric(26, 2, 13)"));
        assert_eq!(lines.next(), Some("0: 0.2400"));
        assert_eq!(lines.next(), Some("1: 0.5200"));
        assert_eq!(lines.next(), Some("2: 0.2400"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_simulation_is_flagged_and_reproducible() {
        let model = simulating_model(20_000);
        let first = model
            .distribution(IntegerOutcome::Chugs, &single(4), 4)
            .unwrap();
        let second = model
            .distribution(IntegerOutcome::Chugs, &single(4), 4)
            .unwrap();
        assert_eq!(first, second);
        assert!(!first.is_exact());
        assert_eq!(first.trials(), Some(20_000));
        assert!((first.pmf().total() - 1.0).abs() < 1e-6);
        assert!(first
            .pmf()
            .description()
            .starts_with("Simulated(20000 trials) of HyperGeometric(52, 4, 13)"));
    }

    #[test]
    fn test_simulation_tracks_exact_model() {
        let exact = model()
            .exact_component(IntegerOutcome::Chugs, 4)
            .unwrap();
        let simulated = simulating_model(50_000)
            .distribution(IntegerOutcome::Chugs, &single(4), 4)
            .unwrap();
        for k in 0..=4 {
            assert!(
                (simulated.pmf().prob(k) - exact.prob(k)).abs() < 0.01,
                "P({}) drifted",
                k
            );
        }

        let sips = simulating_model(20_000)
            .distribution(IntegerOutcome::Sips, &BTreeMap::from([(2, 1), (5, 1)]), 174)
            .unwrap();
        assert!((sips.pmf().mean() - 104.0).abs() < 1.0);
    }

    #[test]
    fn test_simulation_budget() {
        let err = simulating_model(0)
            .distribution(IntegerOutcome::Sips, &single(2), 146)
            .unwrap_err();
        assert!(matches!(err, StatsError::IntractableModel { .. }));

        let settings = ModelSettings {
            trial_count: 200,
            max_trials: 100,
            tractability_threshold: 0,
            seed: 7,
        };
        let err = TheoreticalDistributionModel::new(GameRules::default(), settings)
            .distribution(IntegerOutcome::TurnSips, &single(3), 14)
            .unwrap_err();
        assert!(matches!(err, StatsError::IntractableModel { .. }));
    }

    #[test]
    fn test_for_selection_any_uses_sample_weights() {
        let model = model();
        let mut samples = IntegerSamples::default();
        assert_eq!(
            model
                .for_selection(IntegerOutcome::Chugs, PlayerCountSelector::Any, &samples, 6)
                .unwrap(),
            None
        );

        samples.values = vec![0, 1, 1, 2];
        samples.per_player_count = BTreeMap::from([(2, 1), (4, 3)]);
        let dist = model
            .for_selection(IntegerOutcome::Chugs, PlayerCountSelector::Any, &samples, 6)
            .unwrap()
            .unwrap();
        assert!(dist.pmf().description().starts_with("0.25 * "));

        let fixed = model
            .for_selection(
                IntegerOutcome::Chugs,
                PlayerCountSelector::Exactly(3),
                &IntegerSamples::default(),
                3,
            )
            .unwrap();
        assert!(matches!(fixed, Some(Distribution::Exact(_))));
    }

    #[test]
    fn test_unsupported_player_count_has_no_model() {
        let err = model()
            .distribution(IntegerOutcome::Chugs, &single(9), 9)
            .unwrap_err();
        assert!(matches!(err, StatsError::InternalConsistency { .. }));
    }
}
