//! Host domain: a scripted player that runs right and fights what it meets.

use bevy::prelude::*;

use crate::character::{CharacterFlags, CommandSet, Role};
use crate::sim::{FrameSnapshot, LatestSnapshot, PlayerCommands};

#[derive(Resource, Debug, Clone)]
pub struct Autopilot {
    /// Swing at enemies whose center is this close ahead.
    pub strike_reach: f32,
    /// Hop toward enemies this close ahead that are not yet in reach.
    pub hop_reach: f32,
    /// Vertical slack around the player's center for an enemy to count as
    /// in the way.
    pub lane_height: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            strike_reach: 70.0,
            hop_reach: 140.0,
            lane_height: 40.0,
        }
    }
}

impl Autopilot {
    /// Commands for the player given the last published frame.
    pub fn plan(&self, snapshot: &FrameSnapshot) -> CommandSet {
        let Some(me) = snapshot.characters.iter().find(|c| c.role == Role::Player) else {
            return CommandSet::default();
        };
        if me.has(CharacterFlags::DEAD) {
            return CommandSet::default();
        }

        if me.has(CharacterFlags::WALL_HANGING) {
            let toward = if me.has(CharacterFlags::WALL_LEFT) { -1.0 } else { 1.0 };
            return CommandSet::new(Vec2::new(toward, 1.0));
        }

        let mut commands = CommandSet::new(Vec2::X);
        let nearest_ahead = snapshot
            .enemies
            .iter()
            .filter(|e| (e.y - me.y).abs() <= self.lane_height + e.size * 0.5)
            .map(|e| e.x - me.x)
            .filter(|dx| *dx > 0.0)
            .min_by(|a, b| a.total_cmp(b));

        match nearest_ahead {
            Some(dx) if dx <= self.strike_reach => commands.attack = true,
            Some(dx) if dx <= self.hop_reach => {
                commands.jump = me.has(CharacterFlags::GROUNDED);
            }
            _ => {}
        }
        commands
    }
}

pub(crate) fn drive_player(
    pilot: Res<Autopilot>,
    latest: Res<LatestSnapshot>,
    mut commands: ResMut<PlayerCommands>,
) {
    commands.0 = pilot.plan(&latest.0);
}
