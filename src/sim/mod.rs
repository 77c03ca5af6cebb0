//! Sim domain: the runner world, its frame stages and the bevy plugin that
//! schedules them against avian.
//!
//! Avian steps in `FixedPostUpdate`, so every stage runs there too: the
//! intent stages before `PhysicsSystems::First` and the readback after
//! `PhysicsSystems::Last`. Registry velocities are therefore always the
//! engine-resolved ones by the time combat and presentation read them.

#[cfg(feature = "dev-tools")]
mod dev;
mod enemies;
mod snapshot;
mod world;

#[cfg(test)]
mod tests;

use avian2d::prelude::{Gravity, PhysicsSystems};
use bevy::ecs::message::{MessageReader, MessageWriter};
use bevy::prelude::*;
use std::path::Path;

pub use enemies::{spawn_enemy, update_enemies};
pub use snapshot::{CharacterSnapshot, EnemySnapshot, FrameSnapshot, TerrainSnapshot};
pub use world::Simulation;

use crate::character::CommandSet;
use crate::core::{
    AbilityAnimationComplete, CompanionLost, DEFAULT_CONFIG_PATH, EnemyKilled, GameOver,
    RestartRequested, RunState, SimConfig, SimEvent, load_or_default,
};
use crate::physics::{AvianBackend, AvianLinks};

/// Player input for the next frame, written by the input source.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlayerCommands(pub CommandSet);

/// Snapshot published at the end of the last completed frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct LatestSnapshot(pub FrameSnapshot);

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = match app.world().get_resource::<SimConfig>() {
            Some(config) => config.clone(),
            None => load_or_default(Path::new(DEFAULT_CONFIG_PATH)),
        };

        app.insert_resource(Gravity(Vec2::new(0.0, config.physics.gravity)))
            .insert_resource(Simulation::new(config.clone()))
            .insert_resource(config)
            .init_resource::<PlayerCommands>()
            .init_resource::<LatestSnapshot>()
            .init_resource::<AvianLinks>()
            .init_state::<RunState>()
            .add_message::<AbilityAnimationComplete>()
            .add_message::<EnemyKilled>()
            .add_message::<CompanionLost>()
            .add_message::<GameOver>()
            .add_message::<RestartRequested>()
            .add_systems(Startup, initialize_physics)
            .add_systems(
                FixedPostUpdate,
                (
                    apply_animation_complete,
                    scroll_stage,
                    sync_stage,
                    steer_stage,
                    movement_stage,
                )
                    .chain()
                    .before(PhysicsSystems::First)
                    .run_if(in_state(RunState::Running)),
            )
            .add_systems(
                FixedPostUpdate,
                (settle_stage, combat_stage, publish_stage)
                    .chain()
                    .after(PhysicsSystems::Last)
                    .run_if(in_state(RunState::Running)),
            )
            .add_systems(Update, handle_restart);

        #[cfg(feature = "dev-tools")]
        app.add_systems(
            FixedPostUpdate,
            dev::dump_snapshot
                .after(publish_stage)
                .run_if(in_state(RunState::Running)),
        );
    }
}

fn initialize_physics(mut sim: ResMut<Simulation>) {
    sim.initialize_physics();
}

fn apply_animation_complete(
    mut sim: ResMut<Simulation>,
    mut backend: AvianBackend,
    mut completions: MessageReader<AbilityAnimationComplete>,
) {
    for event in completions.read() {
        sim.on_ability_animation_complete(&mut backend, *event);
    }
}

fn scroll_stage(mut sim: ResMut<Simulation>, time: Res<Time>) {
    sim.scroll(time.delta_secs());
}

fn sync_stage(mut sim: ResMut<Simulation>, mut backend: AvianBackend) {
    sim.sync_statics(&mut backend);
}

fn steer_stage(mut sim: ResMut<Simulation>, commands: Res<PlayerCommands>) {
    sim.set_player_commands(commands.0);
    sim.steer();
}

fn movement_stage(mut sim: ResMut<Simulation>, mut backend: AvianBackend, time: Res<Time>) {
    sim.resolve_movement(&mut backend, time.delta_secs());
}

fn settle_stage(mut sim: ResMut<Simulation>, mut backend: AvianBackend) {
    sim.settle_movement(&mut backend);
}

fn combat_stage(mut sim: ResMut<Simulation>, mut backend: AvianBackend) {
    sim.resolve_combat(&mut backend);
}

fn publish_stage(
    mut sim: ResMut<Simulation>,
    mut latest: ResMut<LatestSnapshot>,
    mut next_state: ResMut<NextState<RunState>>,
    mut kills: MessageWriter<EnemyKilled>,
    mut losses: MessageWriter<CompanionLost>,
    mut game_over: MessageWriter<GameOver>,
) {
    for event in sim.drain_events() {
        match event {
            SimEvent::EnemyKilled(killed) => {
                kills.write(killed);
            }
            SimEvent::CompanionLost(lost) => {
                losses.write(lost);
            }
            SimEvent::GameOver(over) => {
                game_over.write(over);
            }
        }
    }

    latest.0 = sim.snapshot();
    if sim.run_state() == RunState::GameOver {
        next_state.set(RunState::GameOver);
    }
}

fn handle_restart(
    mut sim: ResMut<Simulation>,
    mut backend: AvianBackend,
    mut requests: MessageReader<RestartRequested>,
    mut next_state: ResMut<NextState<RunState>>,
    mut latest: ResMut<LatestSnapshot>,
) {
    if requests.read().count() == 0 {
        return;
    }
    sim.restart(&mut backend);
    latest.0 = sim.snapshot();
    next_state.set(RunState::Running);
}
