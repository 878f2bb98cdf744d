use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Something that can propose a move for a position.
#[async_trait]
pub trait MoveSource: Send + Sync {
    /// Best move in coordinate notation (`e2e4`), or `None` when no move
    /// could be obtained. Failures are never surfaced to the caller.
    async fn best_move(&self, fen: &str, depth: u8) -> Option<String>;
}

/// Client for the stockfish.online HTTP API.
#[derive(Debug, Clone)]
pub struct StockfishApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct EngineResponse {
    success: bool,
    bestmove: Option<String>,
}

impl StockfishApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(StockfishApi {
            client,
            base_url: base_url.into(),
        })
    }

    async fn request(&self, fen: &str, depth: u8) -> Result<EngineResponse, reqwest::Error> {
        self.client
            .get(&self.base_url)
            .query(&[("fen", fen), ("depth", &depth.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json::<EngineResponse>()
            .await
    }
}

#[async_trait]
impl MoveSource for StockfishApi {
    async fn best_move(&self, fen: &str, depth: u8) -> Option<String> {
        match self.request(fen, depth).await {
            Ok(EngineResponse {
                success: true,
                bestmove: Some(line),
            }) => {
                let mv = parse_bestmove(&line);
                if mv.is_none() {
                    tracing::warn!("Engine returned unreadable bestmove: {line:?}");
                }
                mv
            }
            Ok(resp) => {
                tracing::warn!("Engine reported no move for {fen}: {resp:?}");
                None
            }
            Err(e) => {
                tracing::warn!("Failed to get move from engine: {e}");
                None
            }
        }
    }
}

/// Extract the move from a UCI `bestmove e2e4 ponder e7e5` line.
pub fn parse_bestmove(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("bestmove"), Some(mv)) if mv != "(none)" => Some(mv.to_string()),
        _ => None,
    }
}
