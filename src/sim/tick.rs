//! Per-frame game loop and phase transitions
//!
//! `MenuSelect -> Configuring -> Playing -> GameOver`, with the invincibility
//! window as a sub-state of `Playing`. One [`tick`] runs per animation frame.

use glam::Vec2;

use super::spawn::{self, SpawnContext, SpawnEvent, Spawner};
use super::state::{GamePhase, HitOutcome, RunConfig, RunMode, RunSummary, Session};
use crate::Playfield;
use crate::consts::{MAX_FRAME_DT, PLAYER_RADIUS};
use crate::engine::BulletEngine;
use crate::leaderboard::{LeaderboardError, Username};
use crate::platform::{DeviceClass, InputState, Key};

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// A collision verdict was applied
    pub hit: bool,
    /// The session ended this frame
    pub game_over: bool,
    /// Bullets requested from the engine
    pub spawned: usize,
}

/// Clamp a raw frame delta to `[0, MAX_FRAME_DT]`
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    debug_assert!(!dt.is_nan(), "NaN frame delta");
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, MAX_FRAME_DT)
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub mode: RunMode,
    /// Settings-screen choice (practice runs)
    pub config: RunConfig,
    pub session: Session,
    username: Option<Username>,
    device: DeviceClass,
    playfield: Playfield,
    spawner: Spawner,
    /// Scratch buffer, drained every frame
    events: Vec<SpawnEvent>,
    summary: Option<RunSummary>,
}

impl GameState {
    pub fn new(seed: u64, device: DeviceClass, playfield: Playfield) -> Self {
        Self {
            phase: GamePhase::MenuSelect,
            mode: RunMode::Practice,
            config: RunConfig::default(),
            session: Session::new(&RunConfig::default(), playfield.center()),
            username: None,
            device,
            playfield,
            spawner: Spawner::new(seed),
            events: Vec::with_capacity(64),
            summary: None,
        }
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn playfield(&self) -> Playfield {
        self.playfield
    }

    pub fn resize(&mut self, playfield: Playfield) {
        self.playfield = playfield;
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_ref().map(Username::as_str)
    }

    /// HP and survival clock belong on the HUD: during a run and on its
    /// game-over screen, so the killing hit shows 0 HP
    pub fn shows_run_stats(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::GameOver)
    }

    /// Last finished run
    pub fn summary(&self) -> Option<&RunSummary> {
        self.summary.as_ref()
    }

    /// Configuration the next run will use
    pub fn effective_config(&self) -> RunConfig {
        match self.mode {
            RunMode::Practice => self.config.sanitized(),
            RunMode::Ranked => RunConfig::ranked_default(),
        }
    }

    /// Practice goes straight to the settings screen; ranked asks for a name first
    pub fn select_mode(&mut self, mode: RunMode) {
        if !matches!(self.phase, GamePhase::MenuSelect | GamePhase::Configuring) {
            log::warn!("Mode change ignored in {:?}", self.phase);
            return;
        }
        self.mode = mode;
        match mode {
            RunMode::Practice => {
                self.username = None;
                self.phase = GamePhase::Configuring;
            }
            RunMode::Ranked => {
                self.username = None;
                self.phase = GamePhase::MenuSelect;
            }
        }
        log::info!("Selected {:?} mode", mode);
    }

    /// Accept a ranked player name and move on to the settings screen
    ///
    /// Only valid on the ranked name-entry screen; returns `Ok(false)` and
    /// changes nothing anywhere else.
    pub fn confirm_username(&mut self, raw: &str) -> Result<bool, LeaderboardError> {
        if self.phase != GamePhase::MenuSelect || self.mode != RunMode::Ranked {
            log::warn!("Player name ignored in {:?} ({:?})", self.phase, self.mode);
            return Ok(false);
        }
        let username = Username::parse(raw)?;
        log::info!("Ranked player {}", username.as_str());
        self.username = Some(username);
        self.phase = GamePhase::Configuring;
        Ok(true)
    }

    /// Leave name entry / settings and return to mode selection
    pub fn back_to_menu(&mut self) {
        if matches!(self.phase, GamePhase::MenuSelect | GamePhase::Configuring) {
            self.mode = RunMode::Practice;
            self.username = None;
            self.phase = GamePhase::MenuSelect;
        }
    }

    /// Update settings-screen choices. Ranked mode keeps its pinned defaults.
    pub fn configure(&mut self, config: RunConfig) -> bool {
        if self.mode == RunMode::Ranked {
            log::info!("Ranked mode uses fixed settings, ignoring {:?}", config);
            return false;
        }
        self.config = config.sanitized();
        true
    }

    /// Start (or retry) a run
    pub fn start(&mut self, input: &mut InputState, engine: &mut impl BulletEngine) -> bool {
        if !matches!(self.phase, GamePhase::Configuring | GamePhase::GameOver) {
            log::warn!("Start ignored in {:?}", self.phase);
            return false;
        }
        if self.mode == RunMode::Ranked && self.username.is_none() {
            log::warn!("Ranked run needs a player name");
            return false;
        }

        let config = self.effective_config();
        input.recenter();
        self.session = Session::new(&config, self.playfield.center());
        self.spawner.reset();
        self.events.clear();
        SpawnEvent::Clear.apply(engine);
        self.summary = None;
        self.phase = GamePhase::Playing;

        log::info!(
            "Run started: {} / {} / {} / {} HP ({:?})",
            config.difficulty.as_str(),
            config.density.as_str(),
            config.pattern.as_str(),
            config.max_hp,
            self.mode
        );
        true
    }

    /// Abandon the run or leave the game-over screen
    pub fn back_to_settings(&mut self, engine: &mut impl BulletEngine) {
        if !matches!(self.phase, GamePhase::Playing | GamePhase::GameOver) {
            return;
        }
        self.session = Session::new(&self.effective_config(), self.playfield.center());
        self.spawner.reset();
        SpawnEvent::Clear.apply(engine);
        self.phase = GamePhase::Configuring;
    }

    fn finish(&mut self) {
        self.phase = GamePhase::GameOver;
        self.summary = Some(RunSummary {
            survival_time: self.session.survival_time,
            config: self.effective_config(),
            mode: self.mode,
            device: self.device,
            username: self.username().map(str::to_string),
        });
        log::info!("Game over after {:.2}s", self.session.survival_time);
    }
}

/// Advance the game by one animation frame
///
/// `dt` is the raw wall-clock delta since the previous frame and `now_secs`
/// the wall clock itself. The engine is integrated every frame, including
/// outside `Playing`, so bullets keep moving behind menus.
pub fn tick(
    state: &mut GameState,
    input: &InputState,
    engine: &mut impl BulletEngine,
    dt: f32,
    now_secs: f64,
) -> FrameReport {
    let mut report = FrameReport::default();
    let step = clamp_dt(dt);

    if state.phase == GamePhase::Playing {
        let session = &mut state.session;
        session.survival_time += dt.max(0.0);
        session.tick_invincibility(step);
        session.aim = input.current_target();

        let ctx = SpawnContext {
            playfield: state.playfield,
            now_secs,
        };
        state.spawner.advance(step, session, &ctx, &mut state.events);

        if input.is_pressed(Key::Burst) {
            state.events.push(spawn::burst(session));
        }
        if input.is_pressed(Key::Clear) {
            state.events.push(SpawnEvent::Clear);
        }

        for event in state.events.drain(..) {
            report.spawned += event.bullet_count();
            event.apply(engine);
        }
    }

    engine.update(step);

    if state.phase == GamePhase::Playing && !state.session.invincible {
        let Vec2 { x, y } = state.session.aim;
        if engine.check_collision(x, y, PLAYER_RADIUS) {
            report.hit = true;
            match state.session.take_hit() {
                HitOutcome::Fatal => {
                    state.finish();
                    report.game_over = true;
                }
                HitOutcome::Damaged { hp_left } => {
                    log::info!("Hit! {} / {} HP left", hp_left, state.session.max_hp);
                }
                HitOutcome::Ignored => {}
            }
        }
    }

    report
}
