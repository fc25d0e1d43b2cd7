use reqwest::Client;
use serde::Deserialize;

use tactics_core::puzzle::RawPuzzle;

/// One NDJSON line from the puzzle feed. Moves and themes arrive as
/// space-separated strings, the way puzzle corpus exports ship them.
#[derive(Deserialize)]
struct FeedRecord {
    id: String,
    fen: String,
    moves: String,
    rating: i32,
    #[serde(default)]
    themes: String,
    #[serde(default)]
    plays: i64,
}

pub struct PuzzleFeedClient {
    client: Client,
    base_url: String,
}

impl PuzzleFeedClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .user_agent("TacticsLessons/1.0")
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Fetch up to `count` puzzles from the feed. Unparseable lines are
    /// logged and skipped rather than failing the import.
    pub async fn fetch_batch(&self, count: usize) -> Result<Vec<RawPuzzle>, String> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("max", count.to_string())])
            .header("Accept", "application/x-ndjson")
            .send()
            .await
            .map_err(|e| format!("Request error: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }

        let text = resp
            .text()
            .await
            .map_err(|e| format!("Body read error: {e}"))?;

        let mut results = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<FeedRecord>(line) {
                Ok(record) => {
                    results.push(RawPuzzle {
                        id: record.id,
                        fen: record.fen,
                        moves: record
                            .moves
                            .split_whitespace()
                            .map(|s| s.to_string())
                            .collect(),
                        rating: record.rating,
                        themes: record
                            .themes
                            .split_whitespace()
                            .map(|s| s.to_string())
                            .collect(),
                        plays: record.plays,
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to parse puzzle feed line: {e}");
                }
            }

            if results.len() >= count {
                break;
            }
        }

        Ok(results)
    }
}
