use avian2d::prelude::PhysicsPlugins;
use bevy::app::ScheduleRunnerPlugin;
use bevy::asset::AssetPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::transform::TransformPlugin;
use std::time::Duration;

use knight_runner::host::HostPlugin;
use knight_runner::sim::SimulationPlugin;

fn main() {
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))))
        .add_plugins((
            LogPlugin::default(),
            StatesPlugin,
            TransformPlugin,
            AssetPlugin::default(),
            ScenePlugin,
        ))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(PhysicsPlugins::default())
        .add_plugins((SimulationPlugin, HostPlugin))
        .run();
}
