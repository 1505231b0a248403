//! Report assembly.
//!
//! Every sub-report is computed on its own blocking task over the same
//! [`FilteredGames`] snapshot; the assembler waits for all of them and
//! either returns the complete report or the first failure.

use std::sync::Arc;

use tokio::task::{self, JoinHandle};

use crate::api::{OutcomeReport, StatsReport};
use crate::config::EngineConfig;
use crate::db::repository::GameRepository;
use crate::error::StatsResult;
use crate::models::{PlayerCountSelector, SeasonSelector};
use crate::services::chug_summary::compute_chug_summary;
use crate::services::cross_tab::{AxisBins, CrossTabBuilder};
use crate::services::duration::DurationHistogramBuilder;
use crate::services::filter::{FilteredGames, RecordFilter};
use crate::services::geo::GeoAggregator;
use crate::services::histogram::EmpiricalHistogramBuilder;
use crate::services::outcomes::{
    chug_sip_pairs, compute_game_stats, duration_samples, integer_samples, DurationOutcome,
    IntegerOutcome,
};
use crate::services::seat_stats::compute_seat_stats;
use crate::services::theory::TheoreticalDistributionModel;

/// Histogram and model of one integer outcome.
pub fn compute_outcome_report(
    filtered: &FilteredGames,
    outcome: IntegerOutcome,
    config: &EngineConfig,
) -> StatsResult<OutcomeReport> {
    let samples = integer_samples(filtered.games(), outcome, &config.rules);
    let domain_max = outcome.domain_max(&config.rules, filtered.player_count());
    let histogram = EmpiricalHistogramBuilder::new(domain_max).build(&samples.values)?;

    let model = TheoreticalDistributionModel::new(config.rules.clone(), config.model.clone());
    let distribution =
        model.for_selection(outcome, filtered.player_count(), &samples, domain_max)?;

    Ok(OutcomeReport {
        probs: distribution.as_ref().map(|d| d.probs_for(&histogram.xs)),
        probs_exact: distribution.as_ref().is_some_and(|d| d.is_exact()),
        trials: distribution.as_ref().and_then(|d| d.trials()),
        dist_str: distribution.as_ref().map(|d| d.dist_str()),
        histogram,
    })
}

/// Composes the builders into one report.
#[derive(Debug, Clone)]
pub struct StatsReportAssembler {
    config: Arc<EngineConfig>,
}

impl StatsReportAssembler {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub async fn assemble(&self, filtered: FilteredGames) -> StatsResult<StatsReport> {
        let config = &self.config;

        let sips = spawn(&filtered, config, |games, config| {
            compute_outcome_report(games, IntegerOutcome::Sips, config)
        });
        let chugs = spawn(&filtered, config, |games, config| {
            compute_outcome_report(games, IntegerOutcome::Chugs, config)
        });
        let turn_sips = spawn(&filtered, config, |games, config| {
            compute_outcome_report(games, IntegerOutcome::TurnSips, config)
        });
        let game_duration = spawn(&filtered, config, |games, config| {
            DurationHistogramBuilder::new(config.game_duration)
                .build(&duration_samples(games.games(), DurationOutcome::Game))
        });
        let chug_duration = spawn(&filtered, config, |games, config| {
            DurationHistogramBuilder::new(config.chug_duration)
                .build(&duration_samples(games.games(), DurationOutcome::Chug))
        });
        let cross_tab = spawn(&filtered, config, |games, config| {
            let max_chugs =
                IntegerOutcome::Chugs.domain_max(&config.rules, games.player_count());
            CrossTabBuilder::new(
                "chugs",
                AxisBins::counts_up_to(max_chugs),
                AxisBins::Edges(config.cross_tab.sip_bucket_edges.clone()),
            )
            .build(&chug_sip_pairs(games.games(), &config.rules))
        });
        let geo = spawn(&filtered, config, |games, config| {
            GeoAggregator::new(config.geo.grid_resolution_deg).build(games.games())
        });
        let chug_summary = spawn(&filtered, config, |games, config| {
            Ok(compute_chug_summary(
                games.games(),
                &config.rules,
                &config.chug_summary,
            ))
        });
        let seat_stats = spawn(&filtered, config, |games, config| {
            Ok(games
                .games()
                .iter()
                .map(|game| compute_seat_stats(game, &config.rules))
                .collect::<Vec<_>>())
        });

        let (
            sips,
            chugs,
            turn_sips,
            game_duration,
            chug_duration,
            cross_tab,
            geo,
            chug_summary,
            seat_stats,
        ) = tokio::try_join!(
            join(sips),
            join(chugs),
            join(turn_sips),
            join(game_duration),
            join(chug_duration),
            join(cross_tab),
            join(geo),
            join(chug_summary),
            join(seat_stats),
        )?;

        Ok(StatsReport {
            season: filtered.season().label(),
            player_count: filtered.player_count().label(),
            game_count: filtered.len(),
            snapshot_checksum: filtered.checksum(),
            game_stats: compute_game_stats(filtered.games(), &config.rules),
            sips,
            chugs,
            turn_sips,
            game_duration,
            chug_duration,
            cross_tab,
            geo,
            chug_summary,
            seat_stats,
        })
    }
}

fn spawn<T, F>(filtered: &FilteredGames, config: &Arc<EngineConfig>, f: F) -> JoinHandle<StatsResult<T>>
where
    T: Send + 'static,
    F: FnOnce(&FilteredGames, &EngineConfig) -> StatsResult<T> + Send + 'static,
{
    let filtered = filtered.clone();
    let config = Arc::clone(config);
    task::spawn_blocking(move || f(&filtered, &config))
}

async fn join<T>(handle: JoinHandle<StatsResult<T>>) -> StatsResult<T> {
    handle.await?
}

/// Fetches, filters and assembles reports against a repository.
#[derive(Debug, Clone)]
pub struct StatsService {
    config: Arc<EngineConfig>,
    filter: RecordFilter,
    assembler: StatsReportAssembler,
}

impl StatsService {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            filter: RecordFilter::new(config.rules.clone()),
            assembler: StatsReportAssembler::new(Arc::clone(&config)),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Generate the statistics report for one selection.
    ///
    /// Selectors are validated before the repository is queried.
    pub async fn generate_report(
        &self,
        repo: &dyn GameRepository,
        season: SeasonSelector,
        player_count: PlayerCountSelector,
    ) -> StatsResult<StatsReport> {
        self.filter.validate(season, player_count)?;

        let records = repo.fetch_games(season, player_count).await?;
        let filtered = self.filter.apply(records, season, player_count)?;
        log::info!(
            "Generating report for {} / {} over {} games",
            season.label(),
            player_count.label(),
            filtered.len()
        );

        self.assembler.assemble(filtered).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GameRecord, Season, TurnRecord};
    use chrono::{Duration, TimeZone, Utc};

    fn filtered(games: Vec<GameRecord>, players: PlayerCountSelector) -> FilteredGames {
        RecordFilter::new(EngineConfig::default().rules)
            .apply(games, SeasonSelector::All, players)
            .unwrap()
    }

    fn four_player_game() -> GameRecord {
        let start = Utc.with_ymd_and_hms(2013, 2, 2, 20, 0, 0).unwrap();
        GameRecord::new(4, start)
            .with_season(Season(1))
            .with_end(start + Duration::minutes(40))
            .with_turns(vec![TurnRecord::sips(2), TurnRecord::sips(2), TurnRecord::sips(5)])
    }

    #[test]
    fn test_outcome_report_aligns_probs_with_xs() {
        let config = EngineConfig::default();
        let games = filtered(vec![four_player_game()], PlayerCountSelector::Exactly(4));
        let report = compute_outcome_report(&games, IntegerOutcome::Chugs, &config).unwrap();
        assert_eq!(report.histogram.xs, vec![0, 1, 2, 3, 4]);
        // Three cards dealt is not a full hand for anyone
        assert_eq!(report.histogram.ys, vec![0, 0, 0, 0, 0]);
        assert_eq!(report.probs.as_ref().map(Vec::len), Some(5));
        assert!(report.probs_exact);
        assert_eq!(report.trials, None);
        assert!(report
            .dist_str
            .as_deref()
            .is_some_and(|s| s.starts_with("HyperGeometric(52, 4, 13)")));
    }

    #[test]
    fn test_outcome_report_any_without_samples_has_no_model() {
        let config = EngineConfig::default();
        let games = filtered(vec![], PlayerCountSelector::Any);
        let report = compute_outcome_report(&games, IntegerOutcome::Sips, &config).unwrap();
        assert_eq!(report.histogram.total_ys, 0);
        assert_eq!(report.histogram.xs.len(), 175);
        assert_eq!(report.probs, None);
        assert!(!report.probs_exact);
        assert_eq!(report.dist_str, None);
    }

    #[tokio::test]
    async fn test_assemble_uses_one_snapshot() {
        let config = Arc::new(EngineConfig::default());
        let games = filtered(vec![four_player_game()], PlayerCountSelector::Exactly(4));
        let checksum = games.checksum();
        let report = StatsReportAssembler::new(config).assemble(games).await.unwrap();

        assert_eq!(report.snapshot_checksum, checksum);
        assert_eq!(report.game_count, 1);
        assert_eq!(report.turn_sips.histogram.ys[2], 2);
        assert_eq!(report.turn_sips.histogram.ys[5], 1);
        assert_eq!(report.turn_sips.histogram.total_ys, 3);
        assert_eq!(report.game_duration.histogram.ys[8], 1);
        assert_eq!(report.cross_tab.rows.len(), 5);
        assert_eq!(report.game_stats.total_sips, 9);
        assert_eq!(report.seat_stats.len(), 1);
        assert_eq!(report.seat_stats[0].seats.len(), 4);
        assert_eq!(report.seat_stats[0].seats[0].total_sips, 2);
        assert_eq!(report.chug_summary.total_chugs, 0);
    }
}
