//! Contact routing and the deferred destruction commit.
//!
//! Contacts observed during tick T only mark agents as pending; the
//! destruction itself lands at the start of tick T+1 so two agents that
//! hit each other both go down.

use aircombat_shared::*;
use tracing::debug;

use crate::arena::Arena;

/// A discrete contact reported by the physics backend. Indices refer to
/// the arena roster, projectile list and boundary list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    AgentAgent(usize, usize),
    AgentBoundary { agent: usize, boundary: usize },
    ProjectileAgent { projectile: usize, agent: usize },
    ProjectileBoundary { projectile: usize, boundary: usize },
}

impl Arena {
    pub fn handle_contacts(&mut self, contacts: &[Contact], tick: u64) {
        for contact in contacts {
            self.handle_contact(*contact, tick);
        }
    }

    pub fn handle_contact(&mut self, contact: Contact, tick: u64) {
        match contact {
            Contact::AgentAgent(a, b) => {
                if a == b {
                    return;
                }
                // A destroyed agent is passed through by everyone.
                if self.agent(a).is_destroyed() || self.agent(b).is_destroyed() {
                    return;
                }
                for (me, other) in [(a, b), (b, a)] {
                    let other_id = self.agent(other).id;
                    let agent = self.agent_mut(me);
                    agent.stats.agent_hits += 1;
                    agent.mark_pending_destruction();
                    debug!(agent = %agent.id, other = %other_id, tick, "agent contact");
                }
            }
            Contact::AgentBoundary { agent, boundary } => {
                let agent = self.agent_mut(agent);
                if agent.is_destroyed() {
                    return;
                }
                agent.stats.boundary_hits += 1;
                agent.mark_pending_destruction();
                debug!(agent = %agent.id, boundary, tick, "boundary contact");
            }
            Contact::ProjectileAgent { projectile, agent } => {
                let Some(p) = self.projectiles.get(projectile) else {
                    return;
                };
                if !p.is_active() {
                    return;
                }
                let owner = p.owner;
                let target = self.agent(agent);
                if target.is_destroyed() || target.id == owner {
                    return;
                }
                let target_id = target.id;

                self.projectiles[projectile].retire(ProjectileState::Hit, tick);
                if let Some(owner_index) = self.index_of(owner) {
                    self.agent_mut(owner_index).on_projectile_hit(target_id);
                }
                let target = self.agent_mut(agent);
                target.stats.projectile_hits += 1;
                target.mark_pending_destruction();
            }
            Contact::ProjectileBoundary { projectile, .. } => {
                if let Some(p) = self.projectiles.get_mut(projectile) {
                    p.retire(ProjectileState::Hit, tick);
                }
            }
        }
    }

    /// Commit destructions recorded on the previous tick. Returns how many
    /// agents went down.
    pub fn commit_pending_destruction(&mut self) -> usize {
        self.agents_mut()
            .iter_mut()
            .filter_map(|a| a.commit_destruction().then_some(()))
            .count()
    }

    /// Retire projectiles whose lifetime has elapsed at time `now`.
    pub fn expire_projectiles(&mut self, now: f32, tick: u64) {
        for p in &mut self.projectiles {
            if p.is_active() && now - p.spawned_at >= p.lifetime {
                p.retire(ProjectileState::Expired, tick);
            }
        }
    }

    /// Drop projectiles that were retired on an earlier tick.
    pub fn remove_retired_projectiles(&mut self, tick: u64) {
        self.projectiles
            .retain(|p| p.retired_at.map_or(true, |retired| retired >= tick));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn arena() -> Arena {
        Arena::new(&ArenaConfig::versus(
            PolicyKind::Greedy,
            PolicyKind::Greedy,
            1,
        ))
        .unwrap()
    }

    fn bullet_from(arena: &mut Arena, shooter: usize) -> usize {
        let p = arena.agent_mut(shooter).fire(0.0).unwrap();
        arena.projectiles.push(p);
        arena.projectiles.len() - 1
    }

    #[test]
    fn test_mutual_collision_destroys_both_next_tick() {
        let mut arena = arena();
        arena.handle_contact(Contact::AgentAgent(0, 1), 10);
        assert!(arena.agent(0).is_alive());
        assert!(arena.agent(1).is_alive());

        assert_eq!(arena.commit_pending_destruction(), 2);
        assert!(arena.agent(0).is_destroyed());
        assert!(arena.agent(1).is_destroyed());
        assert_eq!(arena.agent(0).cumulative_reward(), DESTROYED_PENALTY);
    }

    #[test]
    fn test_destroyed_agent_is_passed_through() {
        let mut arena = arena();
        arena.handle_contact(Contact::AgentBoundary { agent: 1, boundary: 0 }, 1);
        arena.commit_pending_destruction();
        arena.handle_contact(Contact::AgentAgent(0, 1), 2);
        assert_eq!(arena.commit_pending_destruction(), 0);
        assert!(arena.agent(0).is_alive());
    }

    #[test]
    fn test_own_projectile_is_ignored() {
        let mut arena = arena();
        let p = bullet_from(&mut arena, 0);
        arena.handle_contact(Contact::ProjectileAgent { projectile: p, agent: 0 }, 1);
        assert!(arena.projectiles[p].is_active());
        assert_eq!(arena.commit_pending_destruction(), 0);
    }

    #[test]
    fn test_hit_rewards_shooter_and_destroys_target() {
        let mut arena = arena();
        let p = bullet_from(&mut arena, 0);
        let before = arena.agent(0).cumulative_reward();
        arena.handle_contact(Contact::ProjectileAgent { projectile: p, agent: 1 }, 3);
        assert_eq!(arena.projectiles[p].state, ProjectileState::Hit);
        assert_eq!(arena.agent(0).cumulative_reward() - before, HIT_REWARD);

        // A spent projectile cannot hit again.
        arena.handle_contact(Contact::ProjectileAgent { projectile: p, agent: 1 }, 3);
        assert_eq!(arena.agent(0).cumulative_reward() - before, HIT_REWARD);

        arena.commit_pending_destruction();
        assert!(arena.agent(1).is_destroyed());
        assert_eq!(arena.agent(1).cumulative_reward(), DESTROYED_PENALTY);
    }

    #[test]
    fn test_friendly_fire_penalises_shooter() {
        let mut arena = Arena::new(&ArenaConfig::versus(
            PolicyKind::Greedy,
            PolicyKind::Greedy,
            2,
        ))
        .unwrap();
        let p = bullet_from(&mut arena, 0);
        let before = arena.agent(0).cumulative_reward();
        arena.handle_contact(Contact::ProjectileAgent { projectile: p, agent: 1 }, 1);
        assert_eq!(arena.agent(0).cumulative_reward() - before, FRIENDLY_FIRE_PENALTY);
        arena.commit_pending_destruction();
        assert!(arena.agent(1).is_destroyed());
    }

    #[test]
    fn test_projectile_passes_destroyed_target() {
        let mut arena = arena();
        arena.handle_contact(Contact::AgentBoundary { agent: 1, boundary: 0 }, 1);
        arena.commit_pending_destruction();
        let p = bullet_from(&mut arena, 0);
        arena.handle_contact(Contact::ProjectileAgent { projectile: p, agent: 1 }, 2);
        assert!(arena.projectiles[p].is_active());
    }

    #[test]
    fn test_retired_projectiles_linger_one_tick() {
        let mut arena = arena();
        let p = bullet_from(&mut arena, 0);
        arena.handle_contact(Contact::ProjectileBoundary { projectile: p, boundary: 0 }, 5);
        arena.remove_retired_projectiles(5);
        assert_eq!(arena.projectiles.len(), 1);
        arena.remove_retired_projectiles(6);
        assert!(arena.projectiles.is_empty());
    }

    #[test]
    fn test_projectiles_expire() {
        let mut arena = arena();
        arena.agent_mut(0).reset(Vec3::ZERO, Quat::IDENTITY);
        bullet_from(&mut arena, 0);
        arena.expire_projectiles(BULLET_LIFETIME_SECS - 0.5, 1);
        assert!(arena.projectiles[0].is_active());
        arena.expire_projectiles(BULLET_LIFETIME_SECS, 2);
        assert_eq!(arena.projectiles[0].state, ProjectileState::Expired);
    }
}
