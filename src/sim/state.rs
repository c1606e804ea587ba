//! Session state and run configuration
//!
//! A [`Session`] is created on "start game", mutated every frame and on
//! collision, and discarded on the next start or on "back to settings".

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::INVINCIBLE_DURATION;
use crate::platform::DeviceClass;

/// Top-level phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Choosing practice vs ranked (and entering a name for ranked)
    #[default]
    MenuSelect,
    /// Editing difficulty / density / pattern / HP
    Configuring,
    /// Active run
    Playing,
    /// Run ended, survival clock frozen
    GameOver,
}

/// Practice runs are free-form; ranked runs use pinned settings and submit scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Practice,
    Ranked,
}

/// Bullet speed preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Lunatic,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Lunatic,
    ];

    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.7,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.5,
            Difficulty::Lunatic => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Lunatic => "lunatic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }

    /// Capitalized label for headings
    pub fn title(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
            Difficulty::Lunatic => "Lunatic",
        }
    }
}

/// Spawn cycle rate preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    #[default]
    Medium,
    High,
    Extreme,
}

impl Density {
    pub const ALL: [Density; 4] = [Density::Low, Density::Medium, Density::High, Density::Extreme];

    /// Spawn cycles per second
    pub fn spawn_rate(&self) -> f32 {
        match self {
            Density::Low => 20.0,
            Density::Medium => 50.0,
            Density::High => 100.0,
            Density::Extreme => 200.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Low => "low",
            Density::Medium => "medium",
            Density::High => "high",
            Density::Extreme => "extreme",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

/// Active spawn pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletPattern {
    #[default]
    Random,
    Circle,
    Spiral,
    Mixed,
}

impl BulletPattern {
    pub const ALL: [BulletPattern; 4] = [
        BulletPattern::Random,
        BulletPattern::Circle,
        BulletPattern::Spiral,
        BulletPattern::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BulletPattern::Random => "random",
            BulletPattern::Circle => "circle",
            BulletPattern::Spiral => "spiral",
            BulletPattern::Mixed => "mixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

/// Everything the player picks on the settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub density: Density,
    #[serde(default)]
    pub pattern: BulletPattern,
    #[serde(default = "default_max_hp")]
    pub max_hp: u32,
}

fn default_max_hp() -> u32 {
    3
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            density: Density::Medium,
            pattern: BulletPattern::Random,
            max_hp: default_max_hp(),
        }
    }
}

impl RunConfig {
    /// Configuration every ranked run is pinned to
    pub fn ranked_default() -> Self {
        Self::default()
    }

    /// Clamp HP to at least one
    pub fn sanitized(mut self) -> Self {
        self.max_hp = self.max_hp.max(1);
        self
    }
}

/// Result of a collision verdict applied to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Grace window active, nothing changed
    Ignored,
    /// HP dropped, a new grace window started
    Damaged { hp_left: u32 },
    /// HP reached zero
    Fatal,
}

/// The current run
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub hp: u32,
    pub max_hp: u32,
    /// Seconds survived, frozen at game over
    pub survival_time: f32,
    pub invincible: bool,
    pub invincible_remaining: f32,
    pub difficulty_multiplier: f32,
    /// Spawn cycles per second
    pub spawn_rate: f32,
    pub active_pattern: BulletPattern,
    /// Player position (aim target) for this frame
    pub aim: Vec2,
}

impl Session {
    /// Fresh session: full HP, clock at zero, grace window armed
    pub fn new(config: &RunConfig, aim: Vec2) -> Self {
        let config = config.sanitized();
        Self {
            hp: config.max_hp,
            max_hp: config.max_hp,
            survival_time: 0.0,
            invincible: true,
            invincible_remaining: INVINCIBLE_DURATION,
            difficulty_multiplier: config.difficulty.speed_multiplier(),
            spawn_rate: config.density.spawn_rate(),
            active_pattern: config.pattern,
            aim,
        }
    }

    /// Count down the grace window; the flag drops at or below zero
    pub fn tick_invincibility(&mut self, dt: f32) {
        if !self.invincible {
            return;
        }
        self.invincible_remaining -= dt;
        if self.invincible_remaining <= 0.0 {
            self.invincible_remaining = 0.0;
            self.invincible = false;
        }
    }

    /// Apply one collision verdict
    pub fn take_hit(&mut self) -> HitOutcome {
        if self.invincible || self.hp == 0 {
            return HitOutcome::Ignored;
        }
        self.hp -= 1;
        if self.hp == 0 {
            self.invincible = false;
            self.invincible_remaining = 0.0;
            HitOutcome::Fatal
        } else {
            self.invincible = true;
            self.invincible_remaining = INVINCIBLE_DURATION;
            HitOutcome::Damaged { hp_left: self.hp }
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// HUD text, e.g. `HP: 2 / 3`
    pub fn hp_label(&self) -> String {
        format!("HP: {} / {}", self.hp, self.max_hp)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&RunConfig::default(), Vec2::ZERO)
    }
}

/// Snapshot of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub survival_time: f32,
    pub config: RunConfig,
    pub mode: RunMode,
    pub device: DeviceClass,
    pub username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(Difficulty::Lunatic.speed_multiplier(), 2.0);
        assert_eq!(Difficulty::Easy.speed_multiplier(), 0.7);
        assert_eq!(Density::Extreme.spawn_rate(), 200.0);
        assert_eq!(Density::from_str(" Medium "), Some(Density::Medium));
        assert_eq!(BulletPattern::from_str("mixed"), Some(BulletPattern::Mixed));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_new_session_is_armed() {
        let config = RunConfig {
            max_hp: 5,
            difficulty: Difficulty::Hard,
            ..Default::default()
        };
        let session = Session::new(&config, Vec2::new(400.0, 300.0));
        assert_eq!(session.hp, 5);
        assert!(session.invincible);
        assert_eq!(session.invincible_remaining, INVINCIBLE_DURATION);
        assert_eq!(session.difficulty_multiplier, 1.5);
        assert_eq!(session.spawn_rate, 50.0);
    }

    #[test]
    fn test_zero_hp_config_is_sanitized() {
        let config = RunConfig {
            max_hp: 0,
            ..Default::default()
        };
        assert_eq!(Session::new(&config, Vec2::ZERO).max_hp, 1);
    }

    #[test]
    fn test_grace_window_suppresses_hits() {
        let mut session = Session::default();
        assert_eq!(session.take_hit(), HitOutcome::Ignored);
        assert_eq!(session.hp, 3);

        session.tick_invincibility(0.5);
        assert!(session.invincible);
        session.tick_invincibility(0.5);
        assert!(!session.invincible);
        assert_eq!(session.invincible_remaining, 0.0);

        assert_eq!(session.take_hit(), HitOutcome::Damaged { hp_left: 2 });
        assert!(session.invincible);
        assert_eq!(session.take_hit(), HitOutcome::Ignored);
    }

    #[test]
    fn test_fatal_hit() {
        let mut session = Session::new(
            &RunConfig {
                max_hp: 1,
                ..Default::default()
            },
            Vec2::ZERO,
        );
        session.tick_invincibility(1.0);
        assert_eq!(session.take_hit(), HitOutcome::Fatal);
        assert!(!session.is_alive());
        assert_eq!(session.hp_label(), "HP: 0 / 1");
        assert_eq!(session.take_hit(), HitOutcome::Ignored);
        assert_eq!(session.hp, 0);
    }

    #[test]
    fn test_config_serde_labels() {
        let json = serde_json::to_string(&RunConfig::default()).unwrap();
        assert_eq!(
            json,
            r#"{"difficulty":"normal","density":"medium","pattern":"random","max_hp":3}"#
        );
        let parsed: RunConfig = serde_json::from_str(r#"{"difficulty":"hard"}"#).unwrap();
        assert_eq!(parsed.difficulty, Difficulty::Hard);
        assert_eq!(parsed.max_hp, 3);
    }
}
