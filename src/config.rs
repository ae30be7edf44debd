use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the users CSV file
    #[serde(default = "default_users_path")]
    pub users_path: String,

    /// Path to the movies CSV file
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Path to the ratings CSV file
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Maximum number of co-rater groups considered per request
    #[serde(default = "default_neighbor_pool_size")]
    pub neighbor_pool_size: usize,

    /// Maximum number of scored neighbors fed into the weighted average
    #[serde(default = "default_top_neighbors")]
    pub top_neighbors: usize,

    /// Number of movies returned by the collaborative endpoint
    #[serde(default = "default_collaborative_top_n")]
    pub collaborative_top_n: usize,

    /// Drop movies the target user has already rated from collaborative results
    #[serde(default)]
    pub exclude_watched: bool,

    /// Forbid a top movie from selecting itself as its best content match
    #[serde(default)]
    pub exclude_self_match: bool,
}

/// Tunables for the two recommendation pipelines
#[derive(Debug, Clone, Copy)]
pub struct RecommenderConfig {
    pub neighbor_pool_size: usize,
    pub top_neighbors: usize,
    pub collaborative_top_n: usize,
    pub exclude_watched: bool,
    pub exclude_self_match: bool,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            neighbor_pool_size: default_neighbor_pool_size(),
            top_neighbors: default_top_neighbors(),
            collaborative_top_n: default_collaborative_top_n(),
            exclude_watched: false,
            exclude_self_match: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_users_path() -> String {
    "data/users.csv".to_string()
}

fn default_movies_path() -> String {
    "data/movies.csv".to_string()
}

fn default_ratings_path() -> String {
    "data/ratings.csv".to_string()
}

fn default_neighbor_pool_size() -> usize {
    50
}

fn default_top_neighbors() -> usize {
    50
}

fn default_collaborative_top_n() -> usize {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// The recommender tunables carried into request handling
    pub fn recommender(&self) -> RecommenderConfig {
        RecommenderConfig {
            neighbor_pool_size: self.neighbor_pool_size,
            top_neighbors: self.top_neighbors,
            collaborative_top_n: self.collaborative_top_n,
            exclude_watched: self.exclude_watched,
            exclude_self_match: self.exclude_self_match,
        }
    }
}
