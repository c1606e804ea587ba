//! Game simulation
//!
//! Session state, spawn patterns and the per-frame loop. Nothing here touches
//! the DOM or the GPU; bullets are driven through the [`BulletEngine`] trait.
//!
//! [`BulletEngine`]: crate::engine::BulletEngine

pub mod spawn;
pub mod state;
pub mod tick;

pub use spawn::{Ring, SpawnContext, SpawnEvent, Spawner};
pub use state::{
    BulletPattern, Density, Difficulty, GamePhase, HitOutcome, RunConfig, RunMode, RunSummary,
    Session,
};
pub use tick::{FrameReport, GameState, clamp_dt, tick};
