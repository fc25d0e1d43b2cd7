use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Delay before the recorded opponent reply lands on the board.
    pub reply_delay_ms: u64,
    /// Default number of puzzles in a lesson batch.
    pub lesson_batch_size: i64,
    /// NDJSON puzzle feed for admin imports, if configured.
    pub puzzle_feed_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
            reply_delay_ms: env::var("REPLY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
            lesson_batch_size: env::var("LESSON_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            puzzle_feed_url: env::var("PUZZLE_FEED_URL").ok(),
        }
    }
}
