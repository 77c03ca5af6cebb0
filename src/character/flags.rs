//! Character domain: state bitset.

use serde::Serialize;
use std::ops::BitOr;

/// Simultaneously-possible character states.
///
/// Airborne is implicit: neither `GROUNDED` nor `WALL_HANGING`. Grappling
/// is not a flag; it lives on [`GrappleState`](super::GrappleState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CharacterFlags(u16);

impl CharacterFlags {
    pub const EMPTY: Self = Self(0);
    pub const GROUNDED: Self = Self(1);
    pub const CROUCHING: Self = Self(1 << 1);
    pub const ATTACKING: Self = Self(1 << 2);
    pub const TURNING: Self = Self(1 << 3);
    pub const DEAD: Self = Self(1 << 5);
    pub const ROLLING: Self = Self(1 << 12);
    pub const WALL_SLIDING: Self = Self(1 << 13);
    /// The wall being touched is on the character's left.
    pub const WALL_LEFT: Self = Self(1 << 14);
    pub const WALL_HANGING: Self = Self(1 << 15);

    /// Every wall-related state.
    pub const WALL_STATES: Self =
        Self(Self::WALL_SLIDING.0 | Self::WALL_LEFT.0 | Self::WALL_HANGING.0);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Self, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl BitOr for CharacterFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
