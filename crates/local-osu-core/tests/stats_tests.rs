use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use local_osu_core::packets::{BanchoEncoder, USER_STATS};
use local_osu_core::profile::{parse_modified_beatmaps, ProfileStore};
use local_osu_core::stats::{RankError, RankLookup, RetryPolicy};
use local_osu_core::{AppConfig, Mods, Player, StatsAggregator};

/// Rank service that is rate limited for the first `throttled` calls.
struct ScriptedRanks {
    throttled: u32,
    rank: i32,
    calls: AtomicU32,
    seen: Arc<Mutex<Vec<(i64, u8)>>>,
}

impl ScriptedRanks {
    fn answering(rank: i32) -> Self {
        Self::throttled_for(0, rank)
    }

    fn throttled_for(throttled: u32, rank: i32) -> Self {
        Self {
            throttled,
            rank,
            calls: AtomicU32::new(0),
            seen: Arc::default(),
        }
    }
}

impl RankLookup for ScriptedRanks {
    async fn rank(&self, pp: i64, mode: u8) -> Result<i32, RankError> {
        self.seen.lock().unwrap().push((pp, mode));
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.throttled {
            Err(RankError::RateLimited)
        } else {
            Ok(self.rank)
        }
    }
}

const PROFILES: &str = r#"{
    "cover": {
        "playcount": 812,
        "plays": {
            "ranked_plays": {
                "A": [
                    {"md5": "A", "pp": 300.0, "acc": 98.0, "mods": 0},
                    {"md5": "A", "pp": 250.0, "acc": 97.0, "mods": 8}
                ],
                "R": [
                    {"md5": "R", "pp": 900.0, "acc": 100.0, "mods": 128}
                ]
            },
            "approved_plays": {
                "B": [
                    {"md5": "B", "pp": 200.0, "acc": 96.0, "mods": 64}
                ]
            }
        }
    },
    "empty": {}
}"#;

fn store() -> ProfileStore {
    ProfileStore::from_json(PROFILES).unwrap()
}

fn packet_id(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

#[tokio::test]
async fn test_update_applies_weighted_total_and_rank() {
    let store = store();
    let profile = store.get("cover").unwrap();
    let aggregator = StatsAggregator::new(ScriptedRanks::answering(4321), BanchoEncoder);
    let mut player = Player::new("cover", false);
    player.mode = 0;

    let summary = aggregator.update(&mut player, profile, None).await;

    // relax play on R is ignored; A keeps its best play only
    assert_eq!(summary.scores_considered, 3);
    assert_eq!(summary.top_plays, 2);
    assert_eq!(player.pp, 491);
    assert_eq!(player.rank, 4321);
    assert_eq!(player.playcount, 812);
    assert!((player.accuracy - 97.0).abs() < 1e-9);
    assert!(player.queue.is_empty());
}

#[tokio::test]
async fn test_login_session_gets_stats_packet() {
    let store = store();
    let profile = store.get("cover").unwrap();
    let ranks = ScriptedRanks::answering(10);
    let aggregator = StatsAggregator::new(ranks, BanchoEncoder);
    let mut player = Player::new("cover", true);
    player.mode = 2;

    aggregator.update(&mut player, profile, None).await;

    let queued = player.clear();
    assert!(!queued.is_empty());
    assert_eq!(packet_id(&queued), USER_STATS);
}

#[tokio::test]
async fn test_rank_lookup_receives_rounded_pp_and_mode() {
    let store = store();
    let profile = store.get("cover").unwrap();
    let ranks = ScriptedRanks::answering(5);
    let seen = Arc::clone(&ranks.seen);
    let aggregator = StatsAggregator::new(ranks, BanchoEncoder);
    let mut player = Player::new("cover", false);
    player.mode = 3;

    aggregator.update(&mut player, profile, None).await;

    assert_eq!(player.rank, 5);
    assert_eq!(*seen.lock().unwrap(), vec![(491, 3)]);
}

#[tokio::test]
async fn test_rate_limited_lookup_is_retried() {
    let store = store();
    let profile = store.get("cover").unwrap();
    let aggregator = StatsAggregator::new(ScriptedRanks::throttled_for(3, 777), BanchoEncoder)
        .with_retry(RetryPolicy::immediate(5));
    let mut player = Player::new("cover", false);

    aggregator.update(&mut player, profile, None).await;
    assert_eq!(player.rank, 777);
}

#[tokio::test]
async fn test_exhausted_retries_keep_previous_rank() {
    let store = store();
    let profile = store.get("cover").unwrap();
    let aggregator = StatsAggregator::new(ScriptedRanks::throttled_for(u32::MAX, 1), BanchoEncoder)
        .with_retry(RetryPolicy {
            delay: Duration::from_millis(1),
            backoff: 2.0,
            max_delay: Duration::from_millis(4),
            max_attempts: Some(4),
        });
    let mut player = Player::new("cover", true);
    player.rank = 1234;

    let summary = aggregator.update(&mut player, profile, None).await;

    assert_eq!(player.rank, 1234);
    assert_eq!(player.pp, summary.pp);
    // stats still go out with the refreshed pp
    assert_eq!(packet_id(&player.clear()), USER_STATS);
}

#[tokio::test]
async fn test_mod_filter_selects_relax_plays() {
    let store = store();
    let profile = store.get("cover").unwrap();
    let aggregator = StatsAggregator::new(ScriptedRanks::answering(1), BanchoEncoder);
    let mut player = Player::new("cover", false);

    let summary = aggregator
        .update(&mut player, profile, Some(Mods::RELAX))
        .await;

    assert_eq!(summary.scores_considered, 1);
    // 900 + bonus for a single score
    let expected = 900.0 + 416.6667 * (1.0 - 0.9994);
    assert!((summary.raw_pp - expected).abs() < 1e-6);
    assert_eq!(player.pp, 900);
    assert!((player.accuracy - 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_modified_maps_are_excluded() {
    let store = store();
    let profile = store.get("cover").unwrap();
    let blocked = parse_modified_beatmaps(r#"["A"]"#).unwrap();
    let aggregator =
        StatsAggregator::new(ScriptedRanks::answering(1), BanchoEncoder).exclude_maps(blocked);
    let mut player = Player::new("cover", false);

    let summary = aggregator.update(&mut player, profile, None).await;

    assert_eq!(summary.scores_considered, 1);
    assert_eq!(player.pp, 200);
}

async fn pp_with_config(disable_funorange_maps: bool, modified: Option<&str>) -> i64 {
    let store = store();
    let profile = store.get("cover").unwrap();
    let config = AppConfig {
        disable_funorange_maps,
        ..Default::default()
    };
    let modified = modified.map(|raw| parse_modified_beatmaps(raw).unwrap());
    let aggregator =
        StatsAggregator::from_config(ScriptedRanks::answering(1), BanchoEncoder, &config, modified);
    let mut player = Player::new("cover", false);

    aggregator.update(&mut player, profile, None).await;
    player.pp
}

#[tokio::test]
async fn test_modified_maps_count_while_allowed() {
    assert_eq!(pp_with_config(false, Some(r#"["A"]"#)).await, 491);
    assert_eq!(pp_with_config(false, None).await, 491);
}

#[tokio::test]
async fn test_modified_maps_dropped_when_disabled() {
    assert_eq!(pp_with_config(true, Some(r#"{"A": {}}"#)).await, 200);
    // nothing to exclude without a list
    assert_eq!(pp_with_config(true, None).await, 491);
}

#[tokio::test]
async fn test_empty_profile_keeps_accuracy_and_playcount() {
    let store = store();
    let profile = store.get("empty").unwrap();
    let aggregator = StatsAggregator::new(ScriptedRanks::answering(0), BanchoEncoder);
    let mut player = Player::new("empty", false);
    player.accuracy = 91.5;
    player.playcount = 7;
    player.rank = 42;

    let summary = aggregator.update(&mut player, profile, None).await;

    assert_eq!(summary.accuracy, None);
    assert_eq!(player.pp, 0);
    assert_eq!(player.accuracy, 91.5);
    assert_eq!(player.playcount, 7);
    // a rank of 0 is not a real answer
    assert_eq!(player.rank, 42);
}
