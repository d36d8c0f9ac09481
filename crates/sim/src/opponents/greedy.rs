use aircombat_shared::*;

use super::tactics::{avoid_boundaries, steer_towards, Engagement};
use crate::agent::Agent;
use crate::arena::Arena;
use crate::policy::Policy;

/// Points the nose at the enemy nearest in angle and fires whenever it is
/// inside the gun cone. Never boosts.
pub struct GreedyPolicy;

impl Policy for GreedyPolicy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decide(&mut self, observer: &Agent, arena: &Arena) -> ActionTuple {
        let mut action = ActionTuple::none();

        if let Some(engagement) = Engagement::acquire(observer, arena) {
            action.fire = engagement.in_fire_cone(observer);
            let (pitch, yaw) = steer_towards(observer, engagement.offset);
            action.pitch = pitch;
            action.yaw = yaw;
        }

        avoid_boundaries(observer, arena, &mut action);
        action
    }
}
