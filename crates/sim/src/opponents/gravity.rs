use aircombat_shared::*;
use glam::Vec3;

use super::tactics::{avoid_boundaries, steer_towards, Engagement};
use crate::agent::Agent;
use crate::arena::Arena;
use crate::policy::Policy;

/// Steers along the sum of an attractive and repulsive force field.
///
/// The primary target pulls like a spring. Every other body pushes back
/// with an inverse-square force: enemies, friends and walls. Each enemy's
/// nose pushes hard while its tail pulls gently, so the field bends the
/// path around into the enemy's six.
#[derive(Debug, Clone, Copy)]
pub struct PotentialFieldPolicy {
    pub spring_gain: f32,
    pub repulse_gain: f32,
    pub boundary_gain: f32,
    pub nose_offset: f32,
    pub nose_gain: f32,
    pub tail_gain: f32,
}

impl Default for PotentialFieldPolicy {
    fn default() -> Self {
        Self {
            spring_gain: FIELD_SPRING_GAIN,
            repulse_gain: FIELD_REPULSE_GAIN,
            boundary_gain: FIELD_BOUNDARY_GAIN,
            nose_offset: FIELD_NOSE_OFFSET,
            nose_gain: FIELD_NOSE_GAIN,
            tail_gain: FIELD_TAIL_GAIN,
        }
    }
}

/// Inverse-square push from `source` on a body at `at`.
fn repulsion(at: Vec3, source: Vec3, gain: f32) -> Vec3 {
    let away = at - source;
    let d = away.length().max(FIELD_MIN_DISTANCE);
    away.normalize_or_zero() * (gain / (d * d))
}

impl PotentialFieldPolicy {
    /// Net force on `observer` given its primary target.
    pub fn field(&self, observer: &Agent, arena: &Arena, target: usize) -> Vec3 {
        let me = observer.position;
        let mut force = (arena.agent(target).position - me) * self.spring_gain;

        for other in arena.agents() {
            if other.id == observer.id || !other.is_alive() {
                continue;
            }
            force += repulsion(me, other.position, self.repulse_gain);
            if other.team() != observer.team() {
                let nose = other.position + other.forward() * self.nose_offset;
                let tail = other.position - other.forward() * self.nose_offset;
                force += repulsion(me, nose, self.nose_gain);
                force += (tail - me).normalize_or_zero() * self.tail_gain;
            }
        }

        for wall in arena.boundaries() {
            force += repulsion(me, wall.closest_point(me), self.boundary_gain);
        }
        force
    }
}

impl Policy for PotentialFieldPolicy {
    fn name(&self) -> &str {
        "gravity"
    }

    fn decide(&mut self, observer: &Agent, arena: &Arena) -> ActionTuple {
        let mut action = ActionTuple::none();

        if let Some(engagement) = Engagement::acquire(observer, arena) {
            action.fire = engagement.in_fire_cone(observer);
            action.throttle = engagement.distance() > FIELD_BOOST_RANGE;
            let desired = self.field(observer, arena, engagement.target);
            if desired.length_squared() > f32::EPSILON {
                let (pitch, yaw) = steer_towards(observer, desired);
                action.pitch = pitch;
                action.yaw = yaw;
            }
        }

        avoid_boundaries(observer, arena, &mut action);
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::level_heading;
    use glam::Quat;

    fn arena(team_size: u32) -> Arena {
        let mut arena = Arena::new(&ArenaConfig::versus(
            PolicyKind::PotentialField,
            PolicyKind::Greedy,
            team_size,
        ))
        .unwrap();
        arena.agent_mut(0).reset(Vec3::ZERO, Quat::IDENTITY);
        arena
    }

    #[test]
    fn test_distant_target_is_chased_with_boost() {
        let mut arena = arena(1);
        // Enemy far ahead and to the right, flying away
        arena
            .agent_mut(1)
            .reset(Vec3::new(100.0, 0.0, 200.0), Quat::IDENTITY);
        let action = PotentialFieldPolicy::default().decide(arena.agent(0), &arena);
        assert!(action.throttle);
        assert_eq!(action.yaw, 1);
        assert!(!action.fire);
    }

    #[test]
    fn test_enemy_nose_pushes_away() {
        let mut arena = arena(1);
        // Enemy close ahead, pointing straight back at us
        arena
            .agent_mut(1)
            .reset(Vec3::new(0.0, 0.0, 60.0), level_heading(180.0));
        let policy = PotentialFieldPolicy::default();
        let force = policy.field(arena.agent(0), &arena, 1);
        assert!(force.z < 0.0, "head-on threat repels, got {force:?}");
    }

    #[test]
    fn test_friend_repels() {
        let mut arena = arena(2);
        arena.agent_mut(1).reset(Vec3::new(5.0, 0.0, 0.0), Quat::IDENTITY);
        arena
            .agent_mut(2)
            .reset(Vec3::new(0.0, 0.0, 200.0), Quat::IDENTITY);
        arena
            .agent_mut(3)
            .reset(Vec3::new(0.0, 0.0, 250.0), Quat::IDENTITY);
        let policy = PotentialFieldPolicy::default();
        let force = policy.field(arena.agent(0), &arena, 2);
        assert!(force.x < 0.0, "wingman on the right pushes left");
    }

    #[test]
    fn test_fire_decision_matches_greedy() {
        let mut arena = arena(1);
        arena.agent_mut(1).reset(Vec3::new(0.0, 0.0, 100.0), Quat::IDENTITY);
        let action = PotentialFieldPolicy::default().decide(arena.agent(0), &arena);
        assert!(action.fire);
        assert!(!action.throttle);
    }

    #[test]
    fn test_no_target_only_avoids_walls() {
        let mut arena = arena(1);
        arena.agent_mut(1).mark_pending_destruction();
        arena.agent_mut(1).commit_destruction();
        let action = PotentialFieldPolicy::default().decide(arena.agent(0), &arena);
        assert_eq!(action, ActionTuple::none());
    }
}
