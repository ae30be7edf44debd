//! Collaborative filtering: Pearson similarity between users over shared
//! ratings, turned into a weighted-average predicted score per movie.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::RecommenderConfig;
use crate::data::Dataset;
use crate::models::{MovieId, MovieRecord, NeighborScore, Rating, UserId};

/// Returns the target user's ratings (sorted by rating descending) together
/// with the candidate neighbor pool: every rating row, by any user, for a
/// movie the target has rated.
pub fn watched_history<'a>(
    user_id: UserId,
    dataset: &'a Dataset,
) -> (Vec<&'a Rating>, Vec<&'a Rating>) {
    let target_ratings = dataset.ratings_for_user(user_id);
    let watched: HashSet<MovieId> = target_ratings.iter().map(|r| r.movie_id).collect();

    let co_raters: Vec<&Rating> = dataset
        .ratings()
        .iter()
        .filter(|r| watched.contains(&r.movie_id))
        .collect();

    (target_ratings, co_raters)
}

/// Scores candidate neighbors by Pearson correlation against the target user
///
/// Co-rater rows are grouped by user, ranked by shared-movie count descending
/// and capped at `neighbor_pool_size` before any correlation is computed.
/// The target user is excluded by id, never by position. The result is
/// sorted by score descending, capped at `top_neighbors`; ties at both
/// stages break by user id ascending.
pub fn similarity_scores(
    user_id: UserId,
    target_ratings: &[&Rating],
    co_raters: &[&Rating],
    config: &RecommenderConfig,
) -> Vec<NeighborScore> {
    // BTreeMap iterates in user-id order, so the stable sort below keeps
    // ties ordered by id ascending.
    let mut grouped: BTreeMap<UserId, Vec<&Rating>> = BTreeMap::new();
    for rating in co_raters {
        if rating.user_id == user_id {
            continue;
        }
        grouped.entry(rating.user_id).or_default().push(rating);
    }

    let mut groups: Vec<(UserId, Vec<&Rating>)> = grouped.into_iter().collect();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    groups.truncate(config.neighbor_pool_size);

    tracing::debug!(
        user = user_id,
        candidates = groups.len(),
        "Scoring neighbor groups"
    );

    let mut scores: Vec<NeighborScore> = groups
        .into_iter()
        .map(|(neighbor_id, mut group)| {
            // Align both vectors on shared movie ids before pairing, or the
            // Pearson terms would mix ratings of different movies.
            group.sort_by_key(|r| r.movie_id);
            let shared: HashSet<MovieId> = group.iter().map(|r| r.movie_id).collect();

            let mut target: Vec<&&Rating> = target_ratings
                .iter()
                .filter(|r| shared.contains(&r.movie_id))
                .collect();
            target.sort_by_key(|r| r.movie_id);

            let x: Vec<f64> = target.iter().map(|r| r.rating).collect();
            let y: Vec<f64> = group.iter().map(|r| r.rating).collect();

            NeighborScore {
                user_id: neighbor_id,
                score: pearson(&x, &y),
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.user_id.cmp(&b.user_id))
    });
    scores.truncate(config.top_neighbors);
    scores
}

/// Pearson's correlation coefficient over two aligned rating vectors
///
/// Fewer than 2 shared ratings, mismatched alignment or zero variance in
/// either vector all yield 0: a degenerate pair carries no signal instead
/// of raising a division fault.
fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || x.len() != y.len() {
        return 0.0;
    }
    let n = x.len() as f64;

    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_x2: f64 = x.iter().map(|v| v * v).sum();
    let sum_y2: f64 = y.iter().map(|v| v * v).sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();

    let sxx = sum_x2 - sum_x * sum_x / n;
    let syy = sum_y2 - sum_y * sum_y / n;
    let sxy = sum_xy - sum_x * sum_y / n;

    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    sxy / (sxx * syy).sqrt()
}

/// Produces the collaborative recommendation list for a user
///
/// Every neighbor rating is weighted by that neighbor's similarity; per
/// movie, predicted score = Σ(similarity × rating) / Σ(similarity). Movies
/// whose summed similarity is exactly zero are skipped. Output is capped at
/// `collaborative_top_n`, sorted by predicted score descending with ties by
/// movie id ascending. A user with no ratings gets an empty list.
pub fn recommend(
    user_id: UserId,
    dataset: &Dataset,
    config: &RecommenderConfig,
) -> Vec<MovieRecord> {
    let (target_ratings, co_raters) = watched_history(user_id, dataset);
    if target_ratings.is_empty() {
        return Vec::new();
    }

    let neighbors = similarity_scores(user_id, &target_ratings, &co_raters, config);
    if neighbors.is_empty() {
        return Vec::new();
    }

    let similarity: HashMap<UserId, f64> =
        neighbors.iter().map(|n| (n.user_id, n.score)).collect();
    let watched: HashSet<MovieId> = target_ratings.iter().map(|r| r.movie_id).collect();

    // Per movie: (summed similarity, summed weighted rating) across all
    // contributing neighbor ratings.
    let mut totals: HashMap<MovieId, (f64, f64)> = HashMap::new();
    for rating in dataset.ratings() {
        let Some(&score) = similarity.get(&rating.user_id) else {
            continue;
        };
        if config.exclude_watched && watched.contains(&rating.movie_id) {
            continue;
        }
        let entry = totals.entry(rating.movie_id).or_insert((0.0, 0.0));
        entry.0 += score;
        entry.1 += score * rating.rating;
    }

    let mut predicted: Vec<(MovieId, f64)> = totals
        .into_iter()
        .filter(|&(_, (sum_similarity, _))| sum_similarity != 0.0)
        .map(|(movie_id, (sum_similarity, sum_weighted))| {
            (movie_id, sum_weighted / sum_similarity)
        })
        .collect();

    predicted.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    predicted.truncate(config.collaborative_top_n);

    tracing::debug!(
        user = user_id,
        neighbors = neighbors.len(),
        recommended = predicted.len(),
        "Collaborative recommendation computed"
    );

    predicted
        .iter()
        .filter_map(|&(movie_id, _)| dataset.movie(movie_id))
        .map(MovieRecord::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Movie;

    fn movie(movie_id: MovieId, title: &str) -> Movie {
        Movie {
            movie_id,
            title: title.to_string(),
            year: Some(2000),
            features: Vec::new(),
        }
    }

    fn rating(user_id: UserId, movie_id: MovieId, value: f64) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
        }
    }

    fn dataset(ratings: Vec<Rating>) -> Dataset {
        let movie_ids: HashSet<MovieId> = ratings.iter().map(|r| r.movie_id).collect();
        let mut movies: Vec<Movie> = movie_ids
            .into_iter()
            .map(|id| movie(id, &format!("Movie {}", id)))
            .collect();
        movies.sort_by_key(|m| m.movie_id);
        Dataset::new(vec![], movies, ratings, vec![])
    }

    fn scores_for(user_id: UserId, data: &Dataset, config: &RecommenderConfig) -> Vec<NeighborScore> {
        let (target, co_raters) = watched_history(user_id, data);
        similarity_scores(user_id, &target, &co_raters, config)
    }

    #[test]
    fn test_identical_ratings_give_similarity_one() {
        let data = dataset(vec![
            rating(1, 10, 5.0),
            rating(1, 11, 4.0),
            rating(1, 12, 3.0),
            rating(2, 10, 5.0),
            rating(2, 11, 4.0),
            rating(2, 12, 3.0),
        ]);

        let scores = scores_for(1, &data, &RecommenderConfig::default());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].user_id, 2);
        assert!((scores[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_ratings_give_similarity_zero() {
        // Neighbor 2 rated everything 3.0: zero variance, no signal.
        let data = dataset(vec![
            rating(1, 10, 5.0),
            rating(1, 11, 2.0),
            rating(2, 10, 3.0),
            rating(2, 11, 3.0),
        ]);

        let scores = scores_for(1, &data, &RecommenderConfig::default());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 0.0);
    }

    #[test]
    fn test_single_shared_movie_gives_similarity_zero() {
        let data = dataset(vec![
            rating(1, 10, 5.0),
            rating(1, 11, 2.0),
            rating(2, 10, 4.0),
        ]);

        let scores = scores_for(1, &data, &RecommenderConfig::default());
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].score, 0.0);
    }

    #[test]
    fn test_target_user_excluded_by_id() {
        let data = dataset(vec![
            rating(1, 10, 5.0),
            rating(1, 11, 4.0),
            rating(2, 10, 5.0),
            rating(2, 11, 4.0),
        ]);

        let scores = scores_for(1, &data, &RecommenderConfig::default());
        assert!(scores.iter().all(|s| s.user_id != 1));
    }

    #[test]
    fn test_neighbor_pool_keeps_largest_overlap() {
        // User 2 shares three movies, user 3 shares one; a pool of one
        // must retain user 2.
        let data = dataset(vec![
            rating(1, 10, 1.0),
            rating(1, 11, 2.0),
            rating(1, 12, 3.0),
            rating(2, 10, 1.0),
            rating(2, 11, 2.0),
            rating(2, 12, 3.0),
            rating(3, 10, 5.0),
        ]);

        let config = RecommenderConfig {
            neighbor_pool_size: 1,
            ..RecommenderConfig::default()
        };
        let scores = scores_for(1, &data, &config);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].user_id, 2);
    }

    #[test]
    fn test_top_neighbors_truncation() {
        let data = dataset(vec![
            rating(1, 10, 1.0),
            rating(1, 11, 5.0),
            rating(2, 10, 1.0),
            rating(2, 11, 5.0),
            rating(3, 10, 2.0),
            rating(3, 11, 4.0),
        ]);

        let config = RecommenderConfig {
            top_neighbors: 1,
            ..RecommenderConfig::default()
        };
        let scores = scores_for(1, &data, &config);
        assert_eq!(scores.len(), 1);
        // Both correlate perfectly; the tie breaks by user id ascending.
        assert_eq!(scores[0].user_id, 2);
    }

    #[test]
    fn test_recommend_surfaces_neighbor_movies() {
        // User 2 rates identically on shared movies (similarity 1.0) and
        // has also seen movie 13.
        let data = dataset(vec![
            rating(1, 10, 5.0),
            rating(1, 11, 4.0),
            rating(1, 12, 3.0),
            rating(2, 10, 5.0),
            rating(2, 11, 4.0),
            rating(2, 12, 3.0),
            rating(2, 13, 5.0),
        ]);

        let records = recommend(1, &data, &RecommenderConfig::default());
        let ids: Vec<MovieId> = records.iter().map(|r| r.movie_id).collect();

        assert!(ids.contains(&13));
        // With a single perfectly-similar neighbor, predicted scores are the
        // neighbor's own ratings: 10 and 13 tie at 5.0, then 11, then 12.
        assert_eq!(ids, vec![10, 13, 11, 12]);
    }

    #[test]
    fn test_recommend_respects_top_n_and_has_no_duplicates() {
        let mut ratings = vec![rating(1, 10, 5.0), rating(1, 11, 1.0)];
        // Neighbor 2 agrees on the shared movies and has rated many others.
        ratings.push(rating(2, 10, 5.0));
        ratings.push(rating(2, 11, 1.0));
        for movie_id in 20..40 {
            ratings.push(rating(2, movie_id, 4.0));
        }
        let data = dataset(ratings);

        let records = recommend(1, &data, &RecommenderConfig::default());
        assert!(records.len() <= 10);

        let mut ids: Vec<MovieId> = records.iter().map(|r| r.movie_id).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_recommend_exclude_watched() {
        let data = dataset(vec![
            rating(1, 10, 5.0),
            rating(1, 11, 4.0),
            rating(2, 10, 5.0),
            rating(2, 11, 4.0),
            rating(2, 13, 5.0),
        ]);

        let config = RecommenderConfig {
            exclude_watched: true,
            ..RecommenderConfig::default()
        };
        let records = recommend(1, &data, &config);
        let ids: Vec<MovieId> = records.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![13]);
    }

    #[test]
    fn test_zero_similarity_weight_is_skipped() {
        // User 2 correlates at +1, user 3 at -1; their weights cancel on
        // every candidate movie, so nothing survives the zero-weight guard.
        let data = dataset(vec![
            rating(1, 10, 1.0),
            rating(1, 11, 2.0),
            rating(1, 12, 3.0),
            rating(2, 10, 1.0),
            rating(2, 11, 2.0),
            rating(2, 12, 3.0),
            rating(2, 99, 4.0),
            rating(3, 10, 3.0),
            rating(3, 11, 2.0),
            rating(3, 12, 1.0),
            rating(3, 99, 4.0),
        ]);

        let records = recommend(1, &data, &RecommenderConfig::default());
        assert!(records.is_empty());
    }

    #[test]
    fn test_user_without_ratings_gets_empty_list() {
        let data = dataset(vec![rating(2, 10, 5.0)]);
        assert!(recommend(1, &data, &RecommenderConfig::default()).is_empty());
    }

    #[test]
    fn test_pearson_anticorrelation() {
        let score = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!((score + 1.0).abs() < 1e-9);
    }
}
