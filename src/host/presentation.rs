//! Host domain: clip timing for ability animations.
//!
//! The core sets an ability flag when the ability starts and clears it only
//! when presentation reports the clip finished. This stands in for a real
//! animation player by timing each clip against the published snapshots.

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::character::CharacterFlags;
use crate::core::{Ability, AbilityAnimationComplete};
use crate::registry::EntityId;
use crate::sim::{FrameSnapshot, LatestSnapshot};

const TRACKED: [(Ability, CharacterFlags); 3] = [
    (Ability::Attack, CharacterFlags::ATTACKING),
    (Ability::Roll, CharacterFlags::ROLLING),
    (Ability::Turn, CharacterFlags::TURNING),
];

/// Clip lengths in seconds.
#[derive(Resource, Debug, Clone)]
pub struct AbilityClips {
    pub attack: f32,
    pub roll: f32,
    pub turn: f32,
}

impl Default for AbilityClips {
    fn default() -> Self {
        Self {
            attack: 0.35,
            roll: 0.5,
            turn: 0.15,
        }
    }
}

impl AbilityClips {
    pub fn length(&self, ability: Ability) -> f32 {
        match ability {
            Ability::Attack => self.attack,
            Ability::Roll => self.roll,
            Ability::Turn => self.turn,
        }
    }
}

/// Playback time of every clip currently running.
#[derive(Resource, Debug, Default)]
pub struct AnimationClock {
    playing: HashMap<(EntityId, Ability), f32>,
}

impl AnimationClock {
    pub fn playing(&self) -> usize {
        self.playing.len()
    }

    /// Advance every clip whose flag is set in `snapshot`, forget clips whose
    /// flag is gone, and return the clips that just finished.
    pub fn advance(
        &mut self,
        snapshot: &FrameSnapshot,
        dt: f32,
        clips: &AbilityClips,
    ) -> Vec<AbilityAnimationComplete> {
        let mut active = HashSet::new();
        let mut finished = Vec::new();

        for character in &snapshot.characters {
            for (ability, flag) in TRACKED {
                if !character.has(flag) {
                    continue;
                }
                let key = (character.id, ability);
                active.insert(key);
                let elapsed = self.playing.entry(key).or_insert(0.0);
                *elapsed += dt;
                if *elapsed >= clips.length(ability) {
                    finished.push(AbilityAnimationComplete {
                        character: character.id,
                        ability,
                    });
                }
            }
        }

        self.playing.retain(|key, _| active.contains(key));
        for done in &finished {
            self.playing.remove(&(done.character, done.ability));
        }
        finished
    }
}

pub(crate) fn play_clips(
    time: Res<Time>,
    latest: Res<LatestSnapshot>,
    clips: Res<AbilityClips>,
    mut clock: ResMut<AnimationClock>,
    mut completions: MessageWriter<AbilityAnimationComplete>,
) {
    for done in clock.advance(&latest.0, time.delta_secs(), &clips) {
        completions.write(done);
    }
}
