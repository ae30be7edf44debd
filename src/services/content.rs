//! Content-based filtering: dot-product similarity between a user's
//! top-rated movies and the catalog over categorical feature vectors.

use std::collections::HashSet;

use crate::config::RecommenderConfig;
use crate::data::Dataset;
use crate::models::{Movie, MovieId, MovieRecord, UserId};

/// The user's top `limit` rated movies, joined with catalog metadata
///
/// `None` means all rated movies. Order follows rating descending with ties
/// by movie id ascending.
pub fn user_top_movies<'a>(
    user_id: UserId,
    dataset: &'a Dataset,
    limit: Option<usize>,
) -> Vec<&'a Movie> {
    let mut rows = dataset.ratings_for_user(user_id);
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows.iter()
        .filter_map(|r| dataset.movie(r.movie_id))
        .collect()
}

/// Computes the (top × catalog) similarity matrix
///
/// Cell (i, j) is the dot product of movie i's and movie j's categorical
/// feature vectors; a higher value means more shared categories.
pub fn similarity_matrix(top_movies: &[&Movie], catalog: &[Movie]) -> Vec<Vec<u32>> {
    top_movies
        .iter()
        .map(|movie| {
            catalog
                .iter()
                .map(|candidate| dot(&movie.features, &candidate.features))
                .collect()
        })
        .collect()
}

fn dot(a: &[u8], b: &[u8]) -> u32 {
    a.iter().zip(b).map(|(&x, &y)| u32::from(x) * u32::from(y)).sum()
}

/// Produces the content-based recommendation list for a user
///
/// For each top movie the single most similar catalog movie is selected
/// (arg-max across the similarity row, ties broken by first occurrence in
/// catalog order), then the picks are deduplicated preserving first-seen
/// order. A movie may select itself unless `exclude_self_match` is set.
pub fn recommend(
    user_id: UserId,
    dataset: &Dataset,
    limit: Option<usize>,
    config: &RecommenderConfig,
) -> Vec<MovieRecord> {
    let top_movies = user_top_movies(user_id, dataset, limit);
    if top_movies.is_empty() {
        return Vec::new();
    }

    let catalog = dataset.movies();
    let matrix = similarity_matrix(&top_movies, catalog);

    let mut seen: HashSet<MovieId> = HashSet::new();
    let mut picks: Vec<&Movie> = Vec::new();

    for (movie, row) in top_movies.iter().zip(&matrix) {
        let mut best: Option<(usize, u32)> = None;
        for (col, &score) in row.iter().enumerate() {
            if config.exclude_self_match && catalog[col].movie_id == movie.movie_id {
                continue;
            }
            // Strictly greater keeps the first occurrence on ties.
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((col, score));
            }
        }
        if let Some((col, _)) = best {
            let candidate = &catalog[col];
            if seen.insert(candidate.movie_id) {
                picks.push(candidate);
            }
        }
    }

    tracing::debug!(
        user = user_id,
        top_movies = top_movies.len(),
        recommended = picks.len(),
        "Content recommendation computed"
    );

    picks.into_iter().map(MovieRecord::from).collect()
}
