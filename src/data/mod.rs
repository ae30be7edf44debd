use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::models::{Movie, MovieId, Rating, User, UserId};

/// Movie table columns that are not categorical features
const NON_FEATURE_COLUMNS: [&str; 3] = ["movie_id", "title", "year"];

/// The immutable rating store backing every recommendation request
///
/// Loaded once at startup and shared read-only across handlers. Catalog order
/// of `movies` is preserved from the source file; the content pipeline relies
/// on it for first-occurrence tie-breaking.
#[derive(Debug)]
pub struct Dataset {
    users: Vec<User>,
    movies: Vec<Movie>,
    movie_index: HashMap<MovieId, usize>,
    ratings: Vec<Rating>,
    feature_names: Vec<String>,
}

impl Dataset {
    /// Builds a dataset from already-parsed tables
    pub fn new(
        users: Vec<User>,
        movies: Vec<Movie>,
        ratings: Vec<Rating>,
        feature_names: Vec<String>,
    ) -> Self {
        let movie_index = movies
            .iter()
            .enumerate()
            .map(|(idx, movie)| (movie.movie_id, idx))
            .collect();

        Self {
            users,
            movies,
            movie_index,
            ratings,
            feature_names,
        }
    }

    /// Loads the three tables from CSV files
    pub fn load<P: AsRef<Path>>(users_path: P, movies_path: P, ratings_path: P) -> AppResult<Self> {
        let users = load_users(users_path.as_ref())?;
        let (movies, feature_names) = load_movies(movies_path.as_ref())?;
        let ratings = load_ratings(ratings_path.as_ref())?;

        tracing::info!(
            users = users.len(),
            movies = movies.len(),
            ratings = ratings.len(),
            features = feature_names.len(),
            "Dataset loaded"
        );

        Ok(Self::new(users, movies, ratings, feature_names))
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Looks up a catalog movie by id
    pub fn movie(&self, movie_id: MovieId) -> Option<&Movie> {
        self.movie_index.get(&movie_id).map(|&idx| &self.movies[idx])
    }

    /// All ratings by one user, sorted by rating descending
    ///
    /// Ties are broken by movie id ascending so repeated calls produce the
    /// same order.
    pub fn ratings_for_user(&self, user_id: UserId) -> Vec<&Rating> {
        let mut rows: Vec<&Rating> = self
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .collect();

        rows.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(Ordering::Equal)
                .then(a.movie_id.cmp(&b.movie_id))
        });
        rows
    }
}

fn load_users(path: &Path) -> AppResult<Vec<User>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut users = Vec::new();

    for row in reader.deserialize() {
        let user: User = row?;
        users.push(user);
    }

    Ok(users)
}

fn load_ratings(path: &Path) -> AppResult<Vec<Rating>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut ratings = Vec::new();

    for row in reader.deserialize() {
        let rating: Rating = row?;
        ratings.push(rating);
    }

    Ok(ratings)
}

/// Parses the movies table, splitting fixed metadata columns from the
/// variable set of categorical feature columns
///
/// Every column not named in `NON_FEATURE_COLUMNS` is treated as a 0/1
/// feature flag, in header order.
fn load_movies(path: &Path) -> AppResult<(Vec<Movie>, Vec<String>)> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let mut id_col = None;
    let mut title_col = None;
    let mut year_col = None;
    let mut feature_cols = Vec::new();
    let mut feature_names = Vec::new();

    for (idx, name) in headers.iter().enumerate() {
        match name {
            "movie_id" => id_col = Some(idx),
            "title" => title_col = Some(idx),
            "year" => year_col = Some(idx),
            _ => {
                feature_cols.push(idx);
                feature_names.push(name.to_string());
            }
        }
    }

    let id_col = id_col
        .ok_or_else(|| AppError::Internal(format!("{}: missing movie_id column", path.display())))?;
    let title_col = title_col
        .ok_or_else(|| AppError::Internal(format!("{}: missing title column", path.display())))?;

    let mut movies = Vec::new();
    for (row_idx, row) in reader.records().enumerate() {
        let record = row?;

        let movie_id = parse_field::<MovieId>(&record, id_col, row_idx, path)?;
        let title = record.get(title_col).unwrap_or_default().to_string();
        let year = match year_col.and_then(|idx| record.get(idx)) {
            Some(value) if !value.is_empty() => Some(parse_str::<i32>(value, row_idx, path)?),
            _ => None,
        };

        let mut features = Vec::with_capacity(feature_cols.len());
        for &col in &feature_cols {
            let flag = match record.get(col) {
                Some(value) => parse_str::<u8>(value, row_idx, path)?,
                None => 0,
            };
            features.push(flag);
        }

        movies.push(Movie {
            movie_id,
            title,
            year,
            features,
        });
    }

    Ok((movies, feature_names))
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    col: usize,
    row: usize,
    path: &Path,
) -> AppResult<T> {
    let value = record
        .get(col)
        .ok_or_else(|| AppError::Internal(format!("{}: row {}: missing column", path.display(), row)))?;
    parse_str(value, row, path)
}

fn parse_str<T: std::str::FromStr>(value: &str, row: usize, path: &Path) -> AppResult<T> {
    value.trim().parse::<T>().map_err(|_| {
        AppError::Internal(format!(
            "{}: row {}: cannot parse value {:?}",
            path.display(),
            row,
            value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_csv_files() {
        let dir = std::env::temp_dir().join(format!("cinerec-dataset-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let users = write_fixture(&dir, "users.csv", "user_id\n1\n2\n3\n");
        let movies = write_fixture(
            &dir,
            "movies.csv",
            "movie_id,title,year,action,comedy,drama\n\
             10,Heat,1995,1,0,1\n\
             11,Clue,1985,0,1,0\n",
        );
        let ratings = write_fixture(
            &dir,
            "ratings.csv",
            "user_id,movie_id,rating\n1,10,5\n1,11,3.5\n2,10,4\n",
        );

        let dataset = Dataset::load(&users, &movies, &ratings).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(dataset.users().len(), 3);
        assert_eq!(dataset.movies().len(), 2);
        assert_eq!(dataset.ratings().len(), 3);
        assert_eq!(dataset.feature_names(), ["action", "comedy", "drama"]);

        let heat = dataset.movie(10).unwrap();
        assert_eq!(heat.title, "Heat");
        assert_eq!(heat.year, Some(1995));
        assert_eq!(heat.features, vec![1, 0, 1]);
    }

    #[test]
    fn test_ratings_for_user_sorted_descending() {
        let ratings = vec![
            Rating { user_id: 1, movie_id: 20, rating: 3.0 },
            Rating { user_id: 1, movie_id: 21, rating: 5.0 },
            Rating { user_id: 2, movie_id: 20, rating: 4.0 },
            Rating { user_id: 1, movie_id: 22, rating: 5.0 },
        ];
        let dataset = Dataset::new(vec![], vec![], ratings, vec![]);

        let rows = dataset.ratings_for_user(1);
        let ids: Vec<MovieId> = rows.iter().map(|r| r.movie_id).collect();
        // Equal ratings fall back to movie id ascending
        assert_eq!(ids, vec![21, 22, 20]);
    }

    #[test]
    fn test_unknown_user_has_no_ratings() {
        let dataset = Dataset::new(vec![], vec![], vec![], vec![]);
        assert!(dataset.ratings_for_user(99).is_empty());
    }
}
