pub mod rank;

use ahash::AHashSet;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::mods::Mods;
use crate::packets::PacketEncoder;
use crate::player::Player;
use crate::profile::{PlayCollection, Profile, ScoreRecord};
use crate::utils::filter_top_scores;

pub use rank::{
    interpret_rank_response, lookup_with_retry, OsuDailyClient, RankError, RankLookup,
    RetryPolicy, UNKNOWN_RANK,
};

/// Only this many best plays are weighted.
pub const TOP_PLAY_LIMIT: usize = 100;
pub const PP_WEIGHT: f64 = 0.95;

/// Recomputed performance figures for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    /// Rounded total as stored on the player.
    pub pp: i64,
    pub raw_pp: f64,
    /// `None` when there were no plays to average.
    pub accuracy: Option<f64>,
    pub playcount: Option<u32>,
    /// Scores left after filtering, before the top-play cut.
    pub scores_considered: usize,
    pub top_plays: usize,
}

/// Scores eligible for a pp total.
///
/// With a non-empty `filter` only scores sharing a mod with it are kept;
/// otherwise Relax and Autopilot scores are dropped. Scores on `blocked`
/// beatmaps are always removed.
pub fn collect_scores<'a>(
    plays: &'a PlayCollection,
    filter: Option<Mods>,
    blocked: Option<&AHashSet<String>>,
) -> Vec<&'a ScoreRecord> {
    let filter = filter.filter(|m| !m.is_empty());

    plays
        .all_scores()
        .filter(|s| {
            let mods = Mods::from_bits_retain(s.mods);
            match filter {
                Some(wanted) => mods.intersects(wanted),
                None => !mods.intersects(Mods::UNRANKED_PP),
            }
        })
        .filter(|s| blocked.map_or(true, |b| !b.contains(&s.beatmap_md5)))
        .collect()
}

/// Stable sort, best pp first.
pub fn sort_by_pp(scores: &mut [&ScoreRecord]) {
    scores.sort_by(|a, b| b.pp.total_cmp(&a.pp));
}

/// Best play per beatmap among the top [`TOP_PLAY_LIMIT`] of a pp-sorted list.
pub fn top_plays<'a>(sorted: &[&'a ScoreRecord]) -> Vec<&'a ScoreRecord> {
    let cut = sorted.len().min(TOP_PLAY_LIMIT);
    let mut top = filter_top_scores(sorted[..cut].to_vec());
    sort_by_pp(&mut top);
    top
}

/// Bonus for the sheer number of eligible scores.
pub fn bonus_pp(score_count: usize) -> f64 {
    416.6667 * (1.0 - 0.9994_f64.powi(score_count.min(i32::MAX as usize) as i32))
}

/// Σ pp·0.95^i over the top plays plus the score-count bonus.
pub fn weighted_pp(top: &[&ScoreRecord], score_count: usize) -> f64 {
    let weighted: f64 = top
        .iter()
        .enumerate()
        .map(|(i, s)| s.pp * PP_WEIGHT.powi(i as i32))
        .sum();
    weighted + bonus_pp(score_count)
}

/// Plain mean of the top plays' accuracy.
// TODO: switch to the pp-weighted accuracy formula once it matches the client's numbers.
pub fn average_accuracy(top: &[&ScoreRecord]) -> Option<f64> {
    if top.is_empty() {
        return None;
    }
    Some(top.iter().map(|s| s.accuracy).sum::<f64>() / top.len() as f64)
}

/// Recomputes player statistics from stored plays.
pub struct StatsAggregator<L, E> {
    rank_lookup: L,
    encoder: E,
    retry: RetryPolicy,
    /// Populated only when modified maps are excluded from totals.
    blocked_maps: Option<AHashSet<String>>,
}

impl<L: RankLookup, E: PacketEncoder> StatsAggregator<L, E> {
    pub fn new(rank_lookup: L, encoder: E) -> Self {
        Self {
            rank_lookup,
            encoder,
            retry: RetryPolicy::default(),
            blocked_maps: None,
        }
    }

    /// Build an aggregator honouring `disable_funorange_maps`: `modified` is
    /// only excluded while that setting is on.
    pub fn from_config(
        rank_lookup: L,
        encoder: E,
        config: &AppConfig,
        modified: Option<AHashSet<String>>,
    ) -> Self {
        let aggregator = Self::new(rank_lookup, encoder);
        match (config.disable_funorange_maps, modified) {
            (true, Some(hashes)) => {
                debug!("Excluding {} modified beatmaps", hashes.len());
                aggregator.exclude_maps(hashes)
            }
            (true, None) => {
                warn!("Modified maps are disabled but no modified beatmap list was given");
                aggregator
            }
            (false, Some(_)) => {
                debug!("Modified maps are allowed, ignoring the modified beatmap list");
                aggregator
            }
            (false, None) => aggregator,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Leave scores on these beatmaps out of every total.
    pub fn exclude_maps(mut self, hashes: AHashSet<String>) -> Self {
        self.blocked_maps = Some(hashes);
        self
    }

    /// The synchronous part of a refresh: everything except the rank.
    pub fn compute(&self, profile: &Profile, filter: Option<Mods>) -> PerformanceSummary {
        let mut scores = collect_scores(&profile.plays, filter, self.blocked_maps.as_ref());
        sort_by_pp(&mut scores);

        let top = top_plays(&scores);
        let raw_pp = weighted_pp(&top, scores.len());
        debug!(
            "{} eligible scores, {} top plays, {:.2}pp",
            scores.len(),
            top.len(),
            raw_pp
        );

        PerformanceSummary {
            pp: raw_pp.round() as i64,
            raw_pp,
            accuracy: average_accuracy(&top),
            playcount: profile.playcount,
            scores_considered: scores.len(),
            top_plays: top.len(),
        }
    }

    /// Refresh `player` from `profile`, look up the new rank, and queue a
    /// stats packet for logged-in sessions. Never fails: anything that
    /// can't be determined keeps its previous value.
    pub async fn update(
        &self,
        player: &mut Player,
        profile: &Profile,
        filter: Option<Mods>,
    ) -> PerformanceSummary {
        let summary = self.compute(profile, filter);

        player.pp = summary.pp;
        if let Some(accuracy) = summary.accuracy {
            player.accuracy = accuracy;
        }
        if let Some(playcount) = summary.playcount {
            player.playcount = playcount;
        }

        match lookup_with_retry(&self.rank_lookup, player.pp, player.mode, &self.retry).await {
            Some(rank) if rank > 0 => player.rank = rank,
            Some(_) => {}
            None => debug!("Keeping previous rank #{} for {}", player.rank, player.name),
        }

        info!(
            "{}: {}pp, {:.2}% accuracy, rank #{}",
            player.name, player.pp, player.accuracy, player.rank
        );

        if player.from_login {
            let packet = self.encoder.user_stats(player);
            player.enqueue(&packet);
        }

        summary
    }
}
