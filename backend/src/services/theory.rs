//! Theoretical distributions of the integer outcomes.
//!
//! A player's hand is a uniformly random subset of `hand_size` cards drawn
//! without replacement from a deck holding `copies(p)` copies of every card
//! value. From that:
//!
//! - `chugs` is hypergeometric in the copies of the chug value,
//! - `sips` is the sum of the hand, computed by dynamic programming over how
//!   many copies of each value land in the hand,
//! - `turn_sips` is the value of a single card, uniform over the deck.
//!
//! When the player count is not fixed, the model is a mixture over player
//! counts weighted by how many samples each count contributed. Exact
//! evaluation is used while the summed state space stays below the
//! configured threshold; beyond that the deck is shuffled `trial_count`
//! times with a seeded RNG and the result is tagged as approximate.

use std::collections::BTreeMap;

use rand::distributions::{Distribution as _, WeightedIndex};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use crate::config::{GameRules, ModelSettings};
use crate::error::{ErrorContext, StatsError, StatsResult};
use crate::models::PlayerCountSelector;
use crate::services::outcomes::{IntegerOutcome, IntegerSamples};

/// Allowed drift of an exact PMF's total mass from 1.
pub const EXACT_TOLERANCE: f64 = 1e-9;
/// Allowed drift of a simulated PMF's total mass from 1.
pub const APPROXIMATE_TOLERANCE: f64 = 1e-6;

/// Probability mass function over `0..probs.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pmf {
    probs: Vec<f64>,
    description: String,
}

impl Pmf {
    pub fn new(probs: Vec<f64>, description: impl Into<String>) -> Self {
        Self {
            probs,
            description: description.into(),
        }
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Short name of the generating model, e.g. `HyperGeometric(52, 4, 13)`.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn prob(&self, k: u32) -> f64 {
        self.probs.get(k as usize).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.probs.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.probs
            .iter()
            .enumerate()
            .map(|(k, p)| k as f64 * p)
            .sum()
    }

    /// The description followed by one `value: probability` line per
    /// non-zero entry.
    pub fn render(&self) -> String {
        let mut out = self.description.clone();
        for (k, p) in self.probs.iter().enumerate() {
            if *p > 0.0 {
                out.push_str(&format!("\n{}: {:.4}", k, p));
            }
        }
        out
    }

    fn check_total(&self, tolerance: f64, outcome: IntegerOutcome) -> StatsResult<()> {
        let context = || {
            ErrorContext::new("theoretical_model")
                .with_outcome(outcome.name())
                .with_details(self.description.clone())
        };
        if let Some(bad) = self.probs.iter().find(|p| !(p.is_finite() && **p >= 0.0)) {
            return Err(StatsError::consistency(
                format!("invalid probability {}", bad),
                context(),
            ));
        }
        let total = self.total();
        if (total - 1.0).abs() > tolerance {
            return Err(StatsError::consistency(
                format!("probabilities sum to {} (tolerance {:e})", total, tolerance),
                context(),
            ));
        }
        Ok(())
    }
}

/// A model result, tagged with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    /// Computed by enumeration or closed form.
    Exact(Pmf),
    /// Estimated from `trials` simulated games.
    Approximate { pmf: Pmf, trials: u64 },
}

impl Distribution {
    pub fn pmf(&self) -> &Pmf {
        match self {
            Distribution::Exact(pmf) => pmf,
            Distribution::Approximate { pmf, .. } => pmf,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Distribution::Exact(_))
    }

    pub fn trials(&self) -> Option<u64> {
        match self {
            Distribution::Exact(_) => None,
            Distribution::Approximate { trials, .. } => Some(*trials),
        }
    }

    /// Probabilities aligned with `xs`.
    pub fn probs_for(&self, xs: &[u32]) -> Vec<f64> {
        xs.iter().map(|&x| self.pmf().prob(x)).collect()
    }

    /// Text rendering shown next to charts.
    pub fn dist_str(&self) -> String {
        self.pmf().render()
    }
}

/// Computes theoretical distributions for one rule set.
#[derive(Debug, Clone)]
pub struct TheoreticalDistributionModel {
    rules: GameRules,
    settings: ModelSettings,
}

impl TheoreticalDistributionModel {
    pub fn new(rules: GameRules, settings: ModelSettings) -> Self {
        Self { rules, settings }
    }

    /// Size of the state space exact evaluation walks for one player count.
    pub fn state_space(&self, outcome: IntegerOutcome, player_count: u32) -> u64 {
        let hand = self.rules.hand_size() as u64;
        match outcome {
            IntegerOutcome::Sips => {
                let values = self.rules.card_values.len() as u64;
                let max_sum = self.rules.max_hand_sum(player_count) as u64;
                let copies = self.rules.copies(player_count) as u64;
                values
                    .saturating_mul(hand + 1)
                    .saturating_mul(max_sum + 1)
                    .saturating_mul(copies + 1)
            }
            IntegerOutcome::Chugs => hand + 1,
            IntegerOutcome::TurnSips => self.rules.card_values.len() as u64,
        }
    }

    /// Model for a report selection.
    ///
    /// A fixed player count is always modelled. For "any" player count the
    /// mixture weights are the sample counts per player count, so an empty
    /// sample has no model and `Ok(None)` is returned.
    pub fn for_selection(
        &self,
        outcome: IntegerOutcome,
        selector: PlayerCountSelector,
        samples: &IntegerSamples,
        domain_max: u32,
    ) -> StatsResult<Option<Distribution>> {
        let weights: BTreeMap<u32, u64> = match selector {
            PlayerCountSelector::Exactly(n) => BTreeMap::from([(n, 1)]),
            PlayerCountSelector::Any => samples
                .per_player_count
                .iter()
                .filter(|&(&n, _)| {
                    let supported = self.rules.supports(n);
                    if !supported {
                        log::warn!(
                            "Ignoring {} samples with unsupported player count {}",
                            outcome.name(),
                            n
                        );
                    }
                    supported
                })
                .map(|(&n, &w)| (n, w))
                .collect(),
        };

        if weights.values().sum::<u64>() == 0 {
            return Ok(None);
        }
        self.distribution(outcome, &weights, domain_max).map(Some)
    }

    /// Distribution of `outcome` for a mixture of player counts.
    ///
    /// `weights` maps player counts to relative weights; the result covers
    /// `0..=domain_max`.
    pub fn distribution(
        &self,
        outcome: IntegerOutcome,
        weights: &BTreeMap<u32, u64>,
        domain_max: u32,
    ) -> StatsResult<Distribution> {
        let context = || ErrorContext::new("theoretical_model").with_outcome(outcome.name());

        let total_weight: u64 = weights.values().sum();
        if total_weight == 0 {
            return Err(StatsError::consistency(
                "mixture has no weight",
                context(),
            ));
        }
        if let Some(&n) = weights.keys().find(|&&n| !self.rules.supports(n)) {
            return Err(StatsError::consistency(
                format!("no model for player count {}", n),
                context(),
            ));
        }

        let components: Vec<(u32, f64)> = weights
            .iter()
            .filter(|&(_, &w)| w > 0)
            .map(|(&n, &w)| (n, w as f64 / total_weight as f64))
            .collect();

        let state_space: u64 = components
            .iter()
            .map(|&(n, _)| self.state_space(outcome, n))
            .fold(0, u64::saturating_add);
        let description = self.mixture_description(outcome, &components);

        if state_space < self.settings.tractability_threshold {
            log::debug!(
                "Exact {} model, state space {} below {}",
                outcome.name(),
                state_space,
                self.settings.tractability_threshold
            );
            let mut probs = vec![0.0; domain_max as usize + 1];
            for &(n, w) in &components {
                let component = self.exact_component(outcome, n)?;
                for (k, p) in component.probs().iter().enumerate() {
                    if let Some(slot) = probs.get_mut(k) {
                        *slot += w * p;
                    }
                }
            }
            let pmf = Pmf::new(probs, description);
            pmf.check_total(EXACT_TOLERANCE, outcome)?;
            Ok(Distribution::Exact(pmf))
        } else {
            log::debug!(
                "Simulated {} model, state space {} reaches {}",
                outcome.name(),
                state_space,
                self.settings.tractability_threshold
            );
            self.simulate(outcome, &components, domain_max, description)
        }
    }

    /// Exact distribution for one player count.
    pub fn exact_component(&self, outcome: IntegerOutcome, player_count: u32) -> StatsResult<Pmf> {
        let pmf = match outcome {
            IntegerOutcome::Sips => self.hand_sum(player_count),
            IntegerOutcome::Chugs => self.hypergeometric(player_count),
            IntegerOutcome::TurnSips => self.single_card(player_count),
        };
        pmf.check_total(EXACT_TOLERANCE, outcome)?;
        Ok(pmf)
    }

    fn component_description(&self, outcome: IntegerOutcome, player_count: u32) -> String {
        let deck = self.rules.deck_size(player_count);
        let hand = self.rules.hand_size();
        match outcome {
            IntegerOutcome::Sips => format!("HandSum({}, {})", deck, hand),
            IntegerOutcome::Chugs => format!(
                "HyperGeometric({}, {}, {})",
                deck,
                self.rules.chug_copies(player_count),
                hand
            ),
            IntegerOutcome::TurnSips => {
                let mut values = self.rules.card_values.clone();
                values.sort_unstable();
                let contiguous = values.windows(2).all(|w| w[0] + 1 == w[1]);
                match (values.first(), values.last()) {
                    (Some(lo), Some(hi)) if contiguous => format!("Uniform({}..={})", lo, hi),
                    _ => format!("Uniform{:?}", values),
                }
            }
        }
    }

    fn mixture_description(&self, outcome: IntegerOutcome, components: &[(u32, f64)]) -> String {
        if let [(n, _)] = components {
            return self.component_description(outcome, *n);
        }
        components
            .iter()
            .map(|&(n, w)| format!("{:.2} * {}", w, self.component_description(outcome, n)))
            .collect::<Vec<_>>()
            .join(" +\n")
    }

    fn hypergeometric(&self, player_count: u32) -> Pmf {
        let deck = self.rules.deck_size(player_count) as u64;
        let successes = self.rules.chug_copies(player_count) as u64;
        let hand = self.rules.hand_size() as u64;
        let total = binomial(deck, hand);

        let probs = (0..=self.rules.max_chugs(player_count) as u64)
            .map(|k| {
                if hand - k > deck - successes {
                    0.0
                } else {
                    binomial(successes, k) * binomial(deck - successes, hand - k) / total
                }
            })
            .collect();

        Pmf::new(probs, self.component_description(IntegerOutcome::Chugs, player_count))
    }

    fn hand_sum(&self, player_count: u32) -> Pmf {
        let copies = self.rules.copies(player_count) as usize;
        let hand = self.rules.hand_size() as usize;
        let max_sum = self.rules.max_hand_sum(player_count) as usize;
        let choose: Vec<f64> = (0..=copies)
            .map(|t| binomial(copies as u64, t as u64))
            .collect();

        // ways[k][s]: weighted number of k-card selections summing to s
        let mut ways = vec![vec![0.0f64; max_sum + 1]; hand + 1];
        ways[0][0] = 1.0;

        for &value in &self.rules.card_values {
            let value = value as usize;
            let mut next = vec![vec![0.0f64; max_sum + 1]; hand + 1];
            for k in 0..=hand {
                for s in 0..=max_sum {
                    let w = ways[k][s];
                    if w == 0.0 {
                        continue;
                    }
                    for t in 0..=copies.min(hand - k) {
                        let sum = s + t * value;
                        if sum > max_sum {
                            break;
                        }
                        next[k + t][sum] += w * choose[t];
                    }
                }
            }
            ways = next;
        }

        let total = binomial(self.rules.deck_size(player_count) as u64, hand as u64);
        let probs = ways[hand].iter().map(|w| w / total).collect();
        Pmf::new(probs, self.component_description(IntegerOutcome::Sips, player_count))
    }

    fn single_card(&self, player_count: u32) -> Pmf {
        let deck = self.rules.deck_size(player_count) as f64;
        let copies = self.rules.copies(player_count) as f64;
        let mut probs = vec![0.0; self.rules.max_card_value() as usize + 1];
        for &value in &self.rules.card_values {
            probs[value as usize] += copies / deck;
        }
        Pmf::new(probs, self.component_description(IntegerOutcome::TurnSips, player_count))
    }

    fn simulate(
        &self,
        outcome: IntegerOutcome,
        components: &[(u32, f64)],
        domain_max: u32,
        description: String,
    ) -> StatsResult<Distribution> {
        let trials = self.settings.trial_count;
        let context = || {
            ErrorContext::new("theoretical_model")
                .with_outcome(outcome.name())
                .with_details(description.clone())
        };
        if trials == 0 {
            return Err(StatsError::intractable(
                "state space above threshold and simulation disabled",
                context(),
            ));
        }
        if trials > self.settings.max_trials {
            return Err(StatsError::intractable(
                format!(
                    "{} trials exceed the budget of {}",
                    trials, self.settings.max_trials
                ),
                context(),
            ));
        }

        let mut decks: Vec<Vec<u32>> = components
            .iter()
            .map(|&(n, _)| {
                let copies = self.rules.copies(n) as usize;
                self.rules
                    .card_values
                    .iter()
                    .flat_map(|&v| std::iter::repeat(v).take(copies))
                    .collect()
            })
            .collect();
        let picker = WeightedIndex::new(components.iter().map(|&(_, w)| w))
            .map_err(|e| StatsError::consistency(e.to_string(), context()))?;
        let hand = match outcome {
            IntegerOutcome::TurnSips => 1,
            IntegerOutcome::Sips | IntegerOutcome::Chugs => self.rules.hand_size() as usize,
        };
        let chug_value = self.rules.chug_value;

        let mut rng = ChaCha20Rng::seed_from_u64(self.settings.seed);
        let mut counts = vec![0u64; domain_max as usize + 1];
        for _ in 0..trials {
            let deck = &mut decks[picker.sample(&mut rng)];
            let (drawn, _) = deck.partial_shuffle(&mut rng, hand);
            let value = match outcome {
                IntegerOutcome::Sips => drawn.iter().sum::<u32>(),
                IntegerOutcome::Chugs => drawn.iter().filter(|&&v| v == chug_value).count() as u32,
                IntegerOutcome::TurnSips => drawn[0],
            };
            match counts.get_mut(value as usize) {
                Some(count) => *count += 1,
                None => {
                    return Err(StatsError::consistency(
                        format!("simulated value {} above domain {}", value, domain_max),
                        context(),
                    ))
                }
            }
        }

        let probs = counts
            .iter()
            .map(|&c| c as f64 / trials as f64)
            .collect();
        let pmf = Pmf::new(
            probs,
            format!("Simulated({} trials) of {}", trials, description),
        );
        pmf.check_total(APPROXIMATE_TOLERANCE, outcome)?;
        Ok(Distribution::Approximate { pmf, trials })
    }
}

/// `C(n, k)` as a float.
pub fn binomial(n: u64, k: u64) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (1..=k).fold(1.0, |acc, i| acc * (n - k + i) as f64 / i as f64)
}

#[cfg(test)]
#[path = "theory_tests.rs"]
mod theory_tests;
