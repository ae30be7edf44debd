use serde::{Deserialize, Serialize};

pub type UserId = u32;
pub type MovieId = u32;

/// A registered user. Only the identifier participates in scoring.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub user_id: UserId,
}

/// One (user, movie, rating) triple from the ratings table
///
/// Ratings are assumed to be unique per (user, movie) pair; duplicate rows
/// are not collapsed and would skew the weighted sums.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f64,
}

/// A catalog movie with its categorical feature flags
///
/// `features` holds the 0/1 genre membership flags in the column order of the
/// movies table. Identifier, title and year never enter the vector math.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<i32>,
    pub features: Vec<u8>,
}

/// The movie metadata shape returned to clients by both endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieRecord {
    pub movie_id: MovieId,
    pub title: String,
    pub year: Option<i32>,
}

impl From<&Movie> for MovieRecord {
    fn from(movie: &Movie) -> Self {
        Self {
            movie_id: movie.movie_id,
            title: movie.title.clone(),
            year: movie.year,
        }
    }
}

/// A candidate neighbor paired with its Pearson similarity to the target user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborScore {
    pub user_id: UserId,
    pub score: f64,
}
