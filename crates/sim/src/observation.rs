use aircombat_shared::*;
use std::ops::Range;

use crate::arena::Arena;
use crate::frame::{relative_rotation, to_local_direction, to_local_point};

const SLOT_TEAM: usize = OTHER_SLOT_SIZE - 1;

/// Encode what `observer` (a roster index) sees of the arena.
///
/// Other agents fill slots in roster order with the observer skipped.
/// Destroyed agents keep their slot and last transform so the layout never
/// shifts mid-episode; slots past the roster are zero with team scalar 0.
pub fn encode(arena: &Arena, observer: usize) -> Observation {
    let boundaries = arena.boundaries();
    let mut data = vec![0.0f32; observation_len(boundaries.len())];
    let me = arena.agent(observer);
    let q = me.orientation;

    // SELF STATE (8 floats) [0..8)
    let v = to_local_direction(q, me.velocity);
    data[0..3].copy_from_slice(&v.to_array());
    data[3] = me.ammunition as f32;
    data[4] = me.pitch_rate();
    data[5] = me.yaw_rate();
    data[6] = me.roll_rate();
    data[7] = me.controls.fire.value;

    // BOUNDARIES (6 floats each)
    for (i, wall) in boundaries.iter().enumerate() {
        let base = SELF_OBS_SIZE + i * BOUNDARY_SLOT_SIZE;
        let point = to_local_point(me.position, q, wall.point);
        let normal = to_local_direction(q, wall.normal);
        data[base..base + 3].copy_from_slice(&point.to_array());
        data[base + 3..base + 6].copy_from_slice(&normal.to_array());
    }

    // OTHER AGENTS (12 floats each, OTHER_SLOTS slots)
    let others_start = SELF_OBS_SIZE + boundaries.len() * BOUNDARY_SLOT_SIZE;
    let others = arena
        .agents()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != observer)
        .map(|(_, a)| a)
        .take(OTHER_SLOTS);
    for (slot, other) in others.enumerate() {
        let base = others_start + slot * OTHER_SLOT_SIZE;
        let pos = to_local_point(me.position, q, other.position);
        let vel = to_local_direction(q, other.velocity);
        let rot = relative_rotation(q, other.orientation);
        data[base..base + 3].copy_from_slice(&pos.to_array());
        data[base + 3..base + 6].copy_from_slice(&vel.to_array());
        data[base + 6..base + 10].copy_from_slice(&rot.to_array());
        data[base + 10] = other.controls.fire.value;
        data[base + SLOT_TEAM] = if other.team() == me.team() { 1.0 } else { -1.0 };
    }

    Observation { data }
}

/// Named index ranges of an observation vector, in order.
pub fn layout(boundaries: usize) -> Vec<(String, Range<usize>)> {
    let mut fields = Vec::new();
    let mut at = 0;
    let mut push = |name: String, width: usize| {
        fields.push((name, at..at + width));
        at += width;
    };
    push("self.velocity".into(), 3);
    push("self.ammunition".into(), 1);
    push("self.turn_rates".into(), 3);
    push("self.fire".into(), 1);
    for i in 0..boundaries {
        push(format!("boundary[{i}].point"), 3);
        push(format!("boundary[{i}].normal"), 3);
    }
    for i in 0..OTHER_SLOTS {
        push(format!("other[{i}].position"), 3);
        push(format!("other[{i}].velocity"), 3);
        push(format!("other[{i}].rotation"), 4);
        push(format!("other[{i}].fire"), 1);
        push(format!("other[{i}].team"), 1);
    }
    fields
}
