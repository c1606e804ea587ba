//! Ranked leaderboard client
//!
//! The client is sans-IO: it builds [`HttpRequest`] values and parses
//! `(status, body)` pairs. The browser backend runs them with `fetch`.
//! Failures are values the UI renders as a degraded state; they never reach
//! the frame loop.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::DeviceClass;
use crate::sim::{BulletPattern, Density, Difficulty, RunSummary};

/// Shortest accepted player name (characters, after trimming)
pub const MIN_USERNAME_LEN: usize = 3;
/// Rows requested per leaderboard fetch
pub const DEFAULT_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    #[error("player name must be at least {} characters", MIN_USERNAME_LEN)]
    UsernameTooShort,
    #[error("leaderboard server returned HTTP {0}")]
    Http(u16),
    #[error("leaderboard server unreachable: {0}")]
    Network(String),
    #[error("malformed leaderboard response: {0}")]
    Decode(String),
}

impl LeaderboardError {
    /// Message for the degraded UI state
    pub fn user_message(&self) -> &'static str {
        match self {
            LeaderboardError::UsernameTooShort => "Player name must be at least 3 characters",
            LeaderboardError::Http(_) | LeaderboardError::Network(_) => {
                "Cannot reach the leaderboard server. Ranked results are unavailable."
            }
            LeaderboardError::Decode(_) => "The leaderboard server sent an unexpected response.",
        }
    }
}

/// Validated, trimmed player name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn parse(raw: &str) -> Result<Self, LeaderboardError> {
        let name = raw.trim();
        if name.chars().count() < MIN_USERNAME_LEN {
            return Err(LeaderboardError::UsernameTooShort);
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub survival_time: f64,
    pub bullet_density: String,
    pub bullet_pattern: String,
}

/// `POST /scores` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSubmission {
    pub username: String,
    pub survival_time: f64,
    pub difficulty: Difficulty,
    pub bullet_density: Density,
    pub bullet_pattern: BulletPattern,
    pub max_hp: u32,
    pub device_type: DeviceClass,
}

impl ScoreSubmission {
    /// Ranked runs with a player name produce a submission; practice runs do not
    pub fn from_summary(summary: &RunSummary) -> Option<Self> {
        if summary.mode != crate::sim::RunMode::Ranked {
            return None;
        }
        Some(Self {
            username: summary.username.clone()?,
            survival_time: f64::from(summary.survival_time),
            difficulty: summary.config.difficulty,
            bullet_density: summary.config.density,
            bullet_pattern: summary.config.pattern,
            max_hp: summary.config.max_hp,
            device_type: summary.device,
        })
    }
}

/// `POST /scores` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub is_personal_best: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A request for the browser backend to execute
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// JSON body
    pub body: Option<String>,
}

/// Resolve the API base from the page location
pub fn api_base(hostname: &str, port: &str) -> String {
    let local = matches!(hostname, "localhost" | "127.0.0.1" | "[::1]");
    if local && port == "8000" {
        return "http://localhost:3000/api".to_string();
    }
    if hostname.contains("u-ryukyu.ac.jp") {
        return "/bullet-hell/api".to_string();
    }
    "/api".to_string()
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    base: String,
}

impl Leaderboard {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn for_host(hostname: &str, port: &str) -> Self {
        Self::new(api_base(hostname, port))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn fetch_request(&self, difficulty: Difficulty, device: DeviceClass, limit: u32) -> HttpRequest {
        HttpRequest {
            method: Method::Get,
            url: format!(
                "{}/leaderboard?difficulty={}&device_type={}&limit={}",
                self.base,
                difficulty.as_str(),
                device.as_str(),
                limit
            ),
            body: None,
        }
    }

    /// Validates the player name before anything is built
    pub fn submit_request(&self, submission: &ScoreSubmission) -> Result<HttpRequest, LeaderboardError> {
        let username = Username::parse(&submission.username)?;
        let body = ScoreSubmission {
            username: username.as_str().to_string(),
            ..submission.clone()
        };
        let body = serde_json::to_string(&body).map_err(|e| LeaderboardError::Decode(e.to_string()))?;
        Ok(HttpRequest {
            method: Method::Post,
            url: format!("{}/scores", self.base),
            body: Some(body),
        })
    }

    pub fn parse_leaderboard(status: u16, body: &str) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        check_status(status)?;
        serde_json::from_str(body).map_err(|e| LeaderboardError::Decode(e.to_string()))
    }

    pub fn parse_submit(status: u16, body: &str) -> Result<SubmitResponse, LeaderboardError> {
        check_status(status)?;
        serde_json::from_str(body).map_err(|e| LeaderboardError::Decode(e.to_string()))
    }
}

fn check_status(status: u16) -> Result<(), LeaderboardError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(LeaderboardError::Http(status))
    }
}

/// What the leaderboard panel currently shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BoardState {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<LeaderboardEntry>),
    Unavailable(String),
}

/// Leaderboard panel state with a stale-response guard
///
/// Every fetch takes a ticket; only the newest ticket may update the panel,
/// so a slow earlier response cannot overwrite a newer one.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardBoard {
    generation: u64,
    state: BoardState,
}

impl LeaderboardBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Start a fetch and return its ticket
    pub fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.state = BoardState::Loading;
        self.generation
    }

    /// Apply a finished fetch. Returns false if a newer fetch superseded it.
    pub fn resolve(&mut self, ticket: u64, result: Result<Vec<LeaderboardEntry>, LeaderboardError>) -> bool {
        if ticket != self.generation {
            log::debug!("Dropping stale leaderboard response {} (current {})", ticket, self.generation);
            return false;
        }
        self.state = match result {
            Ok(entries) => BoardState::Loaded(entries),
            Err(e) => BoardState::Unavailable(e.user_message().to_string()),
        };
        true
    }
}

/// Result of a score submission, as shown on the game-over screen
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Ranked { rank: u32, personal_best: bool },
    Recorded { personal_best: bool },
    Failed(String),
}

impl SubmitOutcome {
    pub fn from_result(result: Result<SubmitResponse, LeaderboardError>) -> Self {
        match result {
            Ok(SubmitResponse {
                rank: Some(rank),
                is_personal_best,
            }) => SubmitOutcome::Ranked {
                rank,
                personal_best: is_personal_best,
            },
            Ok(SubmitResponse {
                rank: None,
                is_personal_best,
            }) => SubmitOutcome::Recorded {
                personal_best: is_personal_best,
            },
            Err(e) => SubmitOutcome::Failed(e.user_message().to_string()),
        }
    }

    pub fn headline(&self) -> String {
        match self {
            SubmitOutcome::Ranked { rank, .. } => format!("Rank: #{}", rank),
            SubmitOutcome::Recorded { .. } => "Score Recorded!".to_string(),
            SubmitOutcome::Failed(_) => "Could not submit score".to_string(),
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            SubmitOutcome::Ranked {
                personal_best: true,
                ..
            }
            | SubmitOutcome::Recorded {
                personal_best: true,
            } => "New Personal Best!",
            SubmitOutcome::Failed(message) => message,
            _ => "",
        }
    }
}

/// Browser `fetch` backend (WASM only)
#[cfg(target_arch = "wasm32")]
mod browser {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    use super::*;

    fn js_error(value: JsValue) -> LeaderboardError {
        LeaderboardError::Network(format!("{:?}", value))
    }

    /// Execute a request, returning `(status, body)`
    pub async fn send(request: &HttpRequest) -> Result<(u16, String), LeaderboardError> {
        let init = web_sys::RequestInit::new();
        init.set_method(request.method.as_str());
        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(body));
        }

        let req = web_sys::Request::new_with_str_and_init(&request.url, &init).map_err(js_error)?;
        if request.body.is_some() {
            req.headers()
                .set("Content-Type", "application/json")
                .map_err(js_error)?;
        }

        let window = web_sys::window().ok_or_else(|| LeaderboardError::Network("no window".into()))?;
        let response: web_sys::Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;

        let status = response.status();
        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        Ok((status, text.as_string().unwrap_or_default()))
    }

    pub async fn fetch_leaderboard(
        client: &Leaderboard,
        difficulty: Difficulty,
        device: DeviceClass,
        limit: u32,
    ) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let (status, body) = send(&client.fetch_request(difficulty, device, limit)).await?;
        Leaderboard::parse_leaderboard(status, &body)
    }

    pub async fn submit_score(
        client: &Leaderboard,
        submission: &ScoreSubmission,
    ) -> Result<SubmitResponse, LeaderboardError> {
        let request = client.submit_request(submission)?;
        let (status, body) = send(&request).await?;
        Leaderboard::parse_submit(status, &body)
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::{fetch_leaderboard, send, submit_score};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RunConfig, RunMode};

    fn submission(username: &str) -> ScoreSubmission {
        ScoreSubmission {
            username: username.to_string(),
            survival_time: 12.5,
            difficulty: Difficulty::Hard,
            bullet_density: Density::High,
            bullet_pattern: BulletPattern::Spiral,
            max_hp: 3,
            device_type: DeviceClass::Mobile,
        }
    }

    #[test]
    fn test_short_username_rejected_before_request() {
        let client = Leaderboard::new("/api");
        assert_eq!(
            client.submit_request(&submission("ab")),
            Err(LeaderboardError::UsernameTooShort)
        );
        assert_eq!(Username::parse("  ab  "), Err(LeaderboardError::UsernameTooShort));
        assert_eq!(Username::parse(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_submit_body_matches_contract() {
        let client = Leaderboard::new("/api/");
        let request = client.submit_request(&submission("  alice ")).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "/api/scores");

        let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["survival_time"], 12.5);
        assert_eq!(body["difficulty"], "hard");
        assert_eq!(body["bullet_density"], "high");
        assert_eq!(body["bullet_pattern"], "spiral");
        assert_eq!(body["max_hp"], 3);
        assert_eq!(body["device_type"], "mobile");
    }

    #[test]
    fn test_fetch_url() {
        let client = Leaderboard::for_host("localhost", "8000");
        let request = client.fetch_request(Difficulty::Lunatic, DeviceClass::Pc, DEFAULT_LIMIT);
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url,
            "http://localhost:3000/api/leaderboard?difficulty=lunatic&device_type=pc&limit=50"
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_query_values_need_no_escaping() {
        let labels = Difficulty::ALL
            .iter()
            .map(Difficulty::as_str)
            .chain([DeviceClass::Pc.as_str(), DeviceClass::Mobile.as_str()]);
        for label in labels {
            assert!(
                !label.is_empty() && label.bytes().all(|b| b.is_ascii_lowercase()),
                "{label:?} is not URL-safe"
            );
        }
    }

    #[test]
    fn test_api_base_resolution() {
        assert_eq!(api_base("127.0.0.1", "8000"), "http://localhost:3000/api");
        assert_eq!(api_base("localhost", "8080"), "/api");
        assert_eq!(api_base("www.ie.u-ryukyu.ac.jp", ""), "/bullet-hell/api");
        assert_eq!(api_base("example.com", "443"), "/api");
    }

    #[test]
    fn test_parse_leaderboard() {
        let body = r#"[{"rank":1,"username":"alice","survival_time":42.25,"bullet_density":"high","bullet_pattern":"mixed"}]"#;
        let entries = Leaderboard::parse_leaderboard(200, body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].username, "alice");
        assert_eq!(entries[0].survival_time, 42.25);

        assert!(matches!(
            Leaderboard::parse_leaderboard(200, "oops"),
            Err(LeaderboardError::Decode(_))
        ));
    }

    #[test]
    fn test_server_error_degrades_board() {
        let mut board = LeaderboardBoard::new();
        let ticket = board.begin();
        assert_eq!(board.state(), &BoardState::Loading);

        let result = Leaderboard::parse_leaderboard(500, "Internal Server Error");
        assert_eq!(result, Err(LeaderboardError::Http(500)));
        assert!(board.resolve(ticket, result));
        assert!(matches!(board.state(), BoardState::Unavailable(msg) if msg.contains("Cannot reach")));
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut board = LeaderboardBoard::new();
        let first = board.begin();
        let second = board.begin();

        assert!(board.resolve(second, Ok(Vec::new())));
        assert!(!board.resolve(first, Err(LeaderboardError::Http(502))));
        assert_eq!(board.state(), &BoardState::Loaded(Vec::new()));
    }

    #[test]
    fn test_submit_outcomes() {
        let ranked = SubmitOutcome::from_result(Leaderboard::parse_submit(
            200,
            r#"{"score_id":"x","rank":4,"is_personal_best":true}"#,
        ));
        assert_eq!(
            ranked,
            SubmitOutcome::Ranked {
                rank: 4,
                personal_best: true
            }
        );
        assert_eq!(ranked.headline(), "Rank: #4");
        assert_eq!(ranked.detail(), "New Personal Best!");

        let recorded = SubmitOutcome::from_result(Leaderboard::parse_submit(200, r#"{"rank":null}"#));
        assert_eq!(recorded, SubmitOutcome::Recorded { personal_best: false });
        assert_eq!(recorded.detail(), "");

        let failed = SubmitOutcome::from_result(Err(LeaderboardError::Network("refused".into())));
        assert_eq!(failed.headline(), "Could not submit score");
        assert!(failed.detail().contains("Cannot reach"));
    }

    #[test]
    fn test_submission_only_for_ranked_runs() {
        let mut summary = RunSummary {
            survival_time: 9.0,
            config: RunConfig::default(),
            mode: RunMode::Practice,
            device: DeviceClass::Pc,
            username: Some("alice".to_string()),
        };
        assert!(ScoreSubmission::from_summary(&summary).is_none());

        summary.mode = RunMode::Ranked;
        let submission = ScoreSubmission::from_summary(&summary).unwrap();
        assert_eq!(submission.username, "alice");
        assert_eq!(submission.survival_time, 9.0);

        summary.username = None;
        assert!(ScoreSubmission::from_summary(&summary).is_none());
    }
}
