//! Host domain: headless stand-ins for the input device and the presentation
//! layer, plus the game-over and restart flow.

mod pilot;
mod presentation;

#[cfg(test)]
mod tests;

use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;

pub use pilot::Autopilot;
pub use presentation::{AbilityClips, AnimationClock};

use crate::core::{GameOver, RestartRequested, RunState};

pub struct HostPlugin;

impl Plugin for HostPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Autopilot>()
            .init_resource::<AbilityClips>()
            .init_resource::<AnimationClock>()
            .init_resource::<HostSettings>()
            .init_resource::<RestartCountdown>()
            .add_systems(
                Update,
                (pilot::drive_player, presentation::play_clips)
                    .chain()
                    .run_if(in_state(RunState::Running)),
            )
            .add_systems(Update, (watch_game_over, count_down_restart).chain());
    }
}

/// How the host reacts when a run ends.
#[derive(Resource, Debug, Clone)]
pub struct HostSettings {
    pub auto_restart: bool,
    /// Seconds between game over and the restart request.
    pub restart_delay: f32,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            auto_restart: true,
            restart_delay: 2.0,
        }
    }
}

/// Pending restart, if any.
#[derive(Resource, Debug, Default)]
pub struct RestartCountdown(Option<f32>);

impl RestartCountdown {
    pub fn start(&mut self, delay: f32) {
        self.0 = Some(delay);
    }

    pub fn is_pending(&self) -> bool {
        self.0.is_some()
    }

    /// Returns true exactly once, on the tick the delay runs out.
    pub fn tick(&mut self, dt: f32) -> bool {
        let Some(remaining) = self.0.as_mut() else {
            return false;
        };
        *remaining -= dt;
        if *remaining > 0.0 {
            return false;
        }
        self.0 = None;
        true
    }
}

pub(crate) fn watch_game_over(
    mut game_over: MessageReader<GameOver>,
    settings: Res<HostSettings>,
    mut countdown: ResMut<RestartCountdown>,
) {
    for over in game_over.read() {
        info!("Run ended ({:?}) with score {}", over.reason, over.score);
        if settings.auto_restart && !countdown.is_pending() {
            countdown.start(settings.restart_delay);
        }
    }
}

pub(crate) fn count_down_restart(
    time: Res<Time>,
    mut countdown: ResMut<RestartCountdown>,
    mut restarts: MessageWriter<RestartRequested>,
) {
    if countdown.tick(time.delta_secs()) {
        debug!("Requesting restart");
        restarts.write(RestartRequested);
    }
}
