//! Sim domain: dev-only snapshot dumps for inspecting a headless run.

use bevy::prelude::*;

use super::LatestSnapshot;

/// Dump every this many frames.
const DUMP_INTERVAL: u64 = 120;

pub(super) fn dump_snapshot(latest: Res<LatestSnapshot>) {
    let snapshot = &latest.0;
    if snapshot.frame == 0 || snapshot.frame % DUMP_INTERVAL != 0 {
        return;
    }
    match serde_json::to_string(snapshot) {
        Ok(json) => debug!("frame {}: {}", snapshot.frame, json),
        Err(e) => warn!("Failed to serialize frame {}: {}", snapshot.frame, e),
    }
}
