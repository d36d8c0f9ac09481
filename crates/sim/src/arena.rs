use aircombat_shared::*;
use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use thiserror::Error;
use tracing::warn;

use crate::agent::Agent;
use crate::frame::{self, angle_between};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    #[error("an arena needs at least {min} agents, got {0}", min = MIN_AGENTS)]
    TooFewAgents(usize),
    #[error("at most {max} agents fit the observation layout, got {0}", max = MAX_AGENTS)]
    TooManyAgents(usize),
    #[error("at most one manual-controlled agent is allowed, got {0}")]
    MultipleManualAgents(usize),
    #[error("duplicate agent id {0}")]
    DuplicateAgent(AgentId),
    #[error("no agent at roster index {0}")]
    NoSuchAgent(usize),
}

/// One match's roster, walls and in-flight projectiles.
#[derive(Debug, Clone)]
pub struct Arena {
    pub id: u32,
    agents: Vec<Agent>,
    boundaries: Vec<Boundary>,
    pub projectiles: Vec<Projectile>,
    red_anchor: Vec3,
    blue_anchor: Vec3,
    spawn_jitter: f32,
    player: Option<usize>,
    rng: Pcg64,
}

impl Arena {
    /// Validate the roster and place every agent at its spawn.
    pub fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        let count = config.agents.len();
        if count < MIN_AGENTS {
            return Err(ArenaError::TooFewAgents(count));
        }
        if count > MAX_AGENTS {
            return Err(ArenaError::TooManyAgents(count));
        }
        let manual = config
            .agents
            .iter()
            .filter(|a| a.policy == PolicyKind::Manual)
            .count();
        if manual > 1 {
            return Err(ArenaError::MultipleManualAgents(manual));
        }
        for (i, a) in config.agents.iter().enumerate() {
            if config.agents[..i].iter().any(|b| b.id() == a.id()) {
                return Err(ArenaError::DuplicateAgent(a.id()));
            }
        }

        let agents: Vec<Agent> = config.agents.iter().map(Agent::new).collect();

        // The player is the manual agent, falling back to red #0.
        let player = agents
            .iter()
            .position(|a| a.policy == PolicyKind::Manual)
            .or_else(|| {
                agents
                    .iter()
                    .position(|a| a.id == AgentId::new(Team::Red, 0))
            });
        if player.is_none() {
            warn!(arena = config.id, "no player agent; results are reported from red's side");
        }

        let mut arena = Self {
            id: config.id,
            agents,
            boundaries: config.boundaries.clone(),
            projectiles: Vec::new(),
            red_anchor: config.red_anchor,
            blue_anchor: config.blue_anchor,
            spawn_jitter: config.spawn_jitter,
            player,
            rng: Pcg64::seed_from_u64(config.seed),
        };
        arena.reset_all();
        Ok(arena)
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn agent(&self, index: usize) -> &Agent {
        &self.agents[index]
    }

    pub fn agent_mut(&mut self, index: usize) -> &mut Agent {
        &mut self.agents[index]
    }

    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.agents.iter().position(|a| a.id == id)
    }

    pub fn player(&self) -> Option<&Agent> {
        self.player.map(|i| &self.agents[i])
    }

    /// Team whose perspective Win/Lose are reported from.
    pub fn player_team(&self) -> Team {
        self.player().map(Agent::team).unwrap_or(Team::Red)
    }

    pub fn anchor(&self, team: Team) -> Vec3 {
        match team {
            Team::Red => self.red_anchor,
            Team::Blue => self.blue_anchor,
        }
    }

    pub fn spawn_jitter(&self) -> f32 {
        self.spawn_jitter
    }

    /// A random pose near the team anchor: independent jitter per axis,
    /// level attitude, uniform heading in [-180, 180) degrees.
    pub fn spawn_pose(&mut self, team: Team) -> (Vec3, Quat) {
        let anchor = self.anchor(team);
        let j = self.spawn_jitter;
        let offset = if j > 0.0 {
            Vec3::new(
                self.rng.gen_range(-j..=j),
                self.rng.gen_range(-j..=j),
                self.rng.gen_range(-j..=j),
            )
        } else {
            Vec3::ZERO
        };
        let heading = self.rng.gen_range(-180.0f32..180.0);
        (anchor + offset, frame::level_heading(heading))
    }

    pub fn reset_agent(&mut self, index: usize) {
        let team = self.agents[index].team();
        let (position, orientation) = self.spawn_pose(team);
        self.agents[index].reset(position, orientation);
    }

    /// Reset every agent and clear projectiles for a new episode.
    pub fn reset_all(&mut self) {
        for i in 0..self.agents.len() {
            self.reset_agent(i);
        }
        self.projectiles.clear();
    }

    pub fn alive_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_alive())
    }

    pub fn alive_enemies_of(&self, team: Team) -> impl Iterator<Item = &Agent> {
        self.agents
            .iter()
            .filter(move |a| a.is_alive() && a.team() != team)
    }

    pub fn alive_friends_of(&self, team: Team) -> impl Iterator<Item = &Agent> {
        self.agents
            .iter()
            .filter(move |a| a.is_alive() && a.team() == team)
    }

    /// The alive enemy closest in angle to the observer's nose, with that
    /// angle in radians. Ties keep the first in roster order.
    pub fn nearest_angle_enemy(&self, observer: &Agent) -> Option<(usize, f32)> {
        let forward = observer.forward();
        let mut best: Option<(usize, f32)> = None;
        for (i, other) in self.agents.iter().enumerate() {
            if other.id == observer.id || other.team() == observer.team() || !other.is_alive() {
                continue;
            }
            let angle = angle_between(forward, other.position - observer.position);
            match best {
                Some((_, min)) if angle >= min => {}
                _ => best = Some((i, angle)),
            }
        }
        best
    }

    /// Distance from an agent to its closest wall.
    pub fn nearest_boundary_distance(&self, agent: &Agent) -> Option<f32> {
        self.boundaries
            .iter()
            .map(|b| b.distance(agent.position))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Summed ammunition of a team's alive agents.
    pub fn team_ammunition(&self, team: Team) -> u32 {
        self.alive_friends_of(team).map(|a| a.ammunition).sum()
    }

    pub fn snapshot(&self, tick: u64, time: f32, game_state: GameState) -> ArenaSnapshot {
        ArenaSnapshot {
            tick,
            time,
            game_state,
            agents: self.agents.iter().map(Agent::snapshot).collect(),
            projectiles: self
                .projectiles
                .iter()
                .filter(|p| p.is_active())
                .map(ProjectileSnapshot::from)
                .collect(),
        }
    }
}
