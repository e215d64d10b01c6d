use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// CSV file with the trained user factors (`id`, `features`)
    #[serde(default = "default_user_factors_path")]
    pub user_factors_path: String,

    /// CSV file with the trained movie factors (`id`, `features`)
    #[serde(default = "default_movie_factors_path")]
    pub movie_factors_path: String,

    /// Dense user-user cosine similarity matrix; unset disables the user fallback
    #[serde(default)]
    pub user_similarity_path: Option<String>,

    /// Dense movie-movie cosine similarity matrix; unset disables the movie fallback
    #[serde(default)]
    pub movie_similarity_path: Option<String>,

    /// MovieLens-style `movies.csv` used to attach titles to predictions
    #[serde(default)]
    pub movie_titles_path: Option<String>,

    /// Expected factor dimensionality (the trainer's rank)
    #[serde(default)]
    pub factor_rank: Option<usize>,

    /// Upper bound on requests accepted by one batch call
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_user_factors_path() -> String {
    "data/user_factors.csv".to_string()
}

fn default_movie_factors_path() -> String {
    "data/movie_factors.csv".to_string()
}

fn default_max_batch_size() -> usize {
    10_000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
