use aircombat_shared::*;
use glam::Vec3;

use crate::agent::Agent;
use crate::arena::Arena;
use crate::frame::{aim_error, turn_command};

/// The primary target of an engagement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engagement {
    pub target: usize,
    /// Angle off the observer's nose, radians.
    pub angle: f32,
    pub offset: Vec3,
}

impl Engagement {
    pub fn acquire(observer: &Agent, arena: &Arena) -> Option<Self> {
        let (target, angle) = arena.nearest_angle_enemy(observer)?;
        Some(Self {
            target,
            angle,
            offset: arena.agent(target).position - observer.position,
        })
    }

    pub fn in_fire_cone(&self, observer: &Agent) -> bool {
        self.angle <= observer.tuning.fire_cone.to_radians()
    }

    pub fn distance(&self) -> f32 {
        self.offset.length()
    }
}

/// Gated pitch and yaw commands that swing the nose toward `direction`.
pub fn steer_towards(observer: &Agent, direction: Vec3) -> (i8, i8) {
    let (horizontal, vertical) = aim_error(observer.orientation, direction);
    (
        turn_command(vertical, observer.pitch_rate(), TURN_GATE_SECS),
        turn_command(horizontal, observer.yaw_rate(), TURN_GATE_SECS),
    )
}

/// Force a yaw away from every wall inside the avoidance distance. Walls
/// ahead of the nose turn right, walls behind turn left; later walls in
/// the list win.
pub fn avoid_boundaries(observer: &Agent, arena: &Arena, action: &mut ActionTuple) {
    let forward = observer.forward();
    for wall in arena.boundaries() {
        // Distance to the plane, not to the wall's anchor point.
        if wall.distance(observer.position) >= BOUNDARY_AVOID_DISTANCE {
            continue;
        }
        let toward = wall.closest_point(observer.position) - observer.position;
        action.yaw = if forward.dot(toward) > 0.0 { 1 } else { -1 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    fn arena() -> Arena {
        let mut arena = Arena::new(&ArenaConfig::default()).unwrap();
        arena.agent_mut(0).reset(Vec3::ZERO, Quat::IDENTITY);
        arena
    }

    #[test]
    fn test_wall_ahead_turns_right() {
        let mut arena = arena();
        arena
            .agent_mut(0)
            .reset(Vec3::new(0.0, 0.0, ARENA_HALF_EXTENT - 20.0), Quat::IDENTITY);
        let mut action = ActionTuple::none();
        avoid_boundaries(arena.agent(0), &arena, &mut action);
        assert_eq!(action.yaw, 1);
    }

    #[test]
    fn test_wall_behind_turns_left() {
        let mut arena = arena();
        arena
            .agent_mut(0)
            .reset(Vec3::new(0.0, 0.0, -ARENA_HALF_EXTENT + 20.0), Quat::IDENTITY);
        let mut action = ActionTuple {
            yaw: 1,
            ..ActionTuple::none()
        };
        avoid_boundaries(arena.agent(0), &arena, &mut action);
        assert_eq!(action.yaw, -1);
    }

    #[test]
    fn test_far_walls_leave_action_alone() {
        let arena = arena();
        let mut action = ActionTuple {
            yaw: 1,
            pitch: -1,
            ..ActionTuple::none()
        };
        avoid_boundaries(arena.agent(0), &arena, &mut action);
        assert_eq!(action.yaw, 1);
        assert_eq!(action.pitch, -1);
    }

    #[test]
    fn test_steer_toward_target_below_right() {
        let arena = arena();
        let (pitch, yaw) = steer_towards(arena.agent(0), Vec3::new(20.0, -20.0, 100.0));
        assert_eq!(pitch, 1, "nose down");
        assert_eq!(yaw, 1, "turn right");
    }
}
