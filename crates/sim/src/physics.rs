use aircombat_shared::*;

use crate::arena::Arena;
use crate::collision::Contact;
use crate::frame::segment_distance;

/// Integrates bodies for one tick and reports the contacts it observed.
///
/// Contacts are only reported; their consequences are applied by
/// [`Arena::handle_contacts`].
pub trait PhysicsBackend: Send {
    fn integrate(&mut self, arena: &mut Arena, dt: f32) -> Vec<Contact>;
}

/// Point-mass flight with linear drag and sphere/plane contact tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicPhysics {
    pub mass: f32,
    pub drag: f32,
    pub agent_radius: f32,
    pub projectile_radius: f32,
}

impl Default for KinematicPhysics {
    fn default() -> Self {
        Self {
            mass: MASS,
            drag: LINEAR_DRAG,
            agent_radius: AGENT_RADIUS,
            projectile_radius: BULLET_RADIUS,
        }
    }
}

impl PhysicsBackend for KinematicPhysics {
    fn integrate(&mut self, arena: &mut Arena, dt: f32) -> Vec<Contact> {
        let mut contacts = Vec::new();

        for agent in arena.agents_mut() {
            if agent.is_destroyed() || agent.is_frozen() {
                continue;
            }
            let accel = agent.thrust_command / self.mass - agent.velocity * self.drag;
            agent.velocity += accel * dt;
            agent.position += agent.velocity * dt;
        }

        // Agent vs wall and agent vs agent
        let agents = arena.agents();
        for (i, agent) in agents.iter().enumerate() {
            if agent.is_destroyed() {
                continue;
            }
            for (b, wall) in arena.boundaries().iter().enumerate() {
                if wall.signed_distance(agent.position) + self.agent_radius >= 0.0 {
                    contacts.push(Contact::AgentBoundary {
                        agent: i,
                        boundary: b,
                    });
                }
            }
            let reach = 2.0 * self.agent_radius;
            for (j, other) in agents.iter().enumerate().skip(i + 1) {
                if other.is_destroyed() {
                    continue;
                }
                if agent.position.distance_squared(other.position) <= reach * reach {
                    contacts.push(Contact::AgentAgent(i, j));
                }
            }
        }

        // Projectiles sweep their path so a fast round cannot tunnel.
        let hit_radius = self.agent_radius + self.projectile_radius;
        let mut swept = Vec::with_capacity(arena.projectiles.len());
        for (i, p) in arena.projectiles.iter_mut().enumerate() {
            if !p.is_active() {
                continue;
            }
            swept.push((i, p.position));
            p.position += p.velocity * dt;
        }

        for (pi, from) in swept {
            let p = &arena.projectiles[pi];
            let struck = arena
                .agents()
                .iter()
                .position(|a| {
                    a.is_alive()
                        && a.id != p.owner
                        && segment_distance(from, p.position, a.position) <= hit_radius
                });
            if let Some(agent) = struck {
                contacts.push(Contact::ProjectileAgent {
                    projectile: pi,
                    agent,
                });
                continue;
            }
            if let Some(boundary) = arena
                .boundaries()
                .iter()
                .position(|w| w.signed_distance(p.position) >= 0.0)
            {
                contacts.push(Contact::ProjectileBoundary {
                    projectile: pi,
                    boundary,
                });
            }
        }

        contacts
    }
}
