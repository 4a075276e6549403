use super::algorithm::Algorithm;
use super::random::RandomSource;
use crate::media_store::{normalize_genres, DiscoveryStore, Track, TrackId};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

pub const DISCOVERY_LIMIT: usize = 20;

const SECONDS_PER_DAY: f64 = 86_400.0;
const PLAY_COUNT_WEIGHT: f64 = 0.3;
const AGE_WEIGHT: f64 = -0.1;
const RANDOM_WEIGHT: f64 = 0.4;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("storage unavailable: {cause:#}")]
    StorageUnavailable { cause: anyhow::Error },
}

impl DiscoveryError {
    fn storage(cause: anyhow::Error) -> Self {
        DiscoveryError::StorageUnavailable { cause }
    }
}

#[derive(Clone, Debug)]
pub struct DiscoveryRequest {
    pub user_id: String,
    pub algorithm: Algorithm,
}

/// A ranked track enriched with engagement data for the requesting user.
#[derive(Clone, Debug, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub track: Track,
    pub play_count: u64,
    pub is_favorited: bool,
    /// Only set by the mixed ranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_score: Option<f64>,
}

impl Candidate {
    fn new(
        mut track: Track,
        play_counts: &HashMap<TrackId, u64>,
        favorites: &HashSet<TrackId>,
    ) -> Candidate {
        track.genres = normalize_genres(track.genres.iter().map(String::as_str));
        Candidate {
            play_count: play_counts.get(&track.id).copied().unwrap_or(0),
            is_favorited: favorites.contains(&track.id),
            recommendation_score: None,
            track,
        }
    }
}

fn newest_first(a: &Track, b: &Track) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

fn age_in_days(created_at: i64, now: i64) -> f64 {
    ((now - created_at) as f64 / SECONDS_PER_DAY).max(0.0)
}

pub fn mixed_score(play_count: u64, age_days: f64, unit_draw: f64) -> f64 {
    PLAY_COUNT_WEIGHT * play_count as f64 + AGE_WEIGHT * age_days + RANDOM_WEIGHT * unit_draw
}

fn rank_popular(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then_with(|| newest_first(&a.track, &b.track))
    });
}

fn rank_new(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| newest_first(&a.track, &b.track));
}

/// Keeps the tracks sharing a genre with the user's favorites, minus the favorites
/// themselves, in shuffled order.
fn rank_genre_based(
    candidates: Vec<Candidate>,
    favorites: &HashSet<TrackId>,
    rng: &mut dyn RandomSource,
) -> Vec<Candidate> {
    let favorite_genres: HashSet<&str> = candidates
        .iter()
        .filter(|c| favorites.contains(&c.track.id))
        .flat_map(|c| c.track.genres.iter().map(String::as_str))
        .collect();
    if favorite_genres.is_empty() {
        return Vec::new();
    }

    let eligible: Vec<bool> = candidates
        .iter()
        .map(|c| {
            !c.is_favorited
                && c.track
                    .genres
                    .iter()
                    .any(|g| favorite_genres.contains(g.as_str()))
        })
        .collect();
    let mut pool: Vec<Candidate> = candidates
        .into_iter()
        .zip(eligible)
        .filter_map(|(c, keep)| keep.then_some(c))
        .collect();

    for i in (1..pool.len()).rev() {
        let j = rng.next_index(i + 1);
        pool.swap(i, j);
    }
    pool
}

fn rank_mixed(candidates: &mut [Candidate], now: i64, rng: &mut dyn RandomSource) {
    for candidate in candidates.iter_mut() {
        let score = mixed_score(
            candidate.play_count,
            age_in_days(candidate.track.created_at, now),
            rng.next_unit(),
        );
        candidate.recommendation_score = Some(score);
    }
    candidates.sort_by(|a, b| {
        let a_score = a.recommendation_score.unwrap_or(f64::MIN);
        let b_score = b.recommendation_score.unwrap_or(f64::MIN);
        b_score.total_cmp(&a_score).then(b.track.id.cmp(&a.track.id))
    });
}

/// Ranks the catalog for `request` and returns at most `DISCOVERY_LIMIT` candidates.
///
/// `now` is the current Unix time in seconds. Every random decision is drawn from `rng`,
/// in catalog id order, so a deterministic source yields a deterministic ranking.
/// Any storage failure aborts the whole call.
pub fn discover<S: DiscoveryStore + ?Sized>(
    store: &S,
    request: &DiscoveryRequest,
    now: i64,
    rng: &mut dyn RandomSource,
) -> Result<Vec<Candidate>, DiscoveryError> {
    let mut catalog = store.catalog_snapshot().map_err(DiscoveryError::storage)?;
    let play_counts = store
        .aggregate_play_counts()
        .map_err(DiscoveryError::storage)?;
    let favorites = store
        .favorite_track_ids(&request.user_id)
        .map_err(DiscoveryError::storage)?;

    catalog.sort_by_key(|t| t.id);
    let mut candidates: Vec<Candidate> = catalog
        .into_iter()
        .map(|track| Candidate::new(track, &play_counts, &favorites))
        .collect();

    match request.algorithm {
        Algorithm::Popular => rank_popular(&mut candidates),
        Algorithm::New => rank_new(&mut candidates),
        Algorithm::GenreBased => candidates = rank_genre_based(candidates, &favorites, rng),
        Algorithm::Mixed => rank_mixed(&mut candidates, now, rng),
    }
    candidates.truncate(DISCOVERY_LIMIT);

    debug!(
        "discover({}) for {} returned {} candidates",
        request.algorithm,
        request.user_id,
        candidates.len()
    );
    Ok(candidates)
}
