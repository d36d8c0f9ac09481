use aircombat_shared::*;
use tracing::{debug, info};

use crate::arena::{Arena, ArenaError};
use crate::episode::{state_for_result, EpisodeState, StateObserver};
use crate::observation::encode;
use crate::physics::{KinematicPhysics, PhysicsBackend};
use crate::policy::{self, ExternalInput, Policy};
use crate::resolver::{distribute_rewards, MatchResolver, Resolution};

/// Fixed-timestep driver for one arena.
pub struct Simulation {
    config: SimConfig,
    arena: Arena,
    policies: Vec<Box<dyn Policy>>,
    physics: Box<dyn PhysicsBackend>,
    resolver: MatchResolver,
    episode: EpisodeState,
    observations: Vec<Observation>,
    tick: u64,
    episode_index: u32,
    episode_steps: u32,
    episode_start: f32,
}

impl Simulation {
    pub fn new(arena: &ArenaConfig, config: SimConfig) -> Result<Self, ArenaError> {
        Self::with_physics(arena, config, Box::<KinematicPhysics>::default())
    }

    pub fn with_physics(
        arena_config: &ArenaConfig,
        config: SimConfig,
        physics: Box<dyn PhysicsBackend>,
    ) -> Result<Self, ArenaError> {
        let arena = Arena::new(arena_config)?;
        let policies = arena.agents().iter().map(|a| policy::for_kind(a.policy)).collect();
        let mut sim = Self {
            config,
            arena,
            policies,
            physics,
            resolver: MatchResolver::new(config),
            episode: EpisodeState::new(GameState::Playing),
            observations: Vec::new(),
            tick: 0,
            episode_index: 0,
            episode_steps: 0,
            episode_start: 0.0,
        };
        sim.refresh_observations();
        info!(
            arena = arena_config.id,
            agents = sim.arena.len(),
            mode = ?config.mode,
            "simulation ready"
        );
        Ok(sim)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since start.
    pub fn time(&self) -> f32 {
        self.tick as f32 * self.config.dt
    }

    pub fn game_state(&self) -> GameState {
        self.episode.get()
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.resolver.scoreboard()
    }

    pub fn episode_index(&self) -> u32 {
        self.episode_index
    }

    pub fn subscribe(&mut self, observer: StateObserver) {
        self.episode.subscribe(observer);
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        self.arena.snapshot(self.tick, self.time(), self.game_state())
    }

    /// Observation of a roster slot as of the end of the last tick.
    pub fn observation(&self, index: usize) -> Option<&Observation> {
        self.observations.get(index)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Hand an external action or raw input to an agent's policy.
    pub fn submit_input(&mut self, index: usize, input: ExternalInput) -> Result<(), ArenaError> {
        let policy = self
            .policies
            .get_mut(index)
            .ok_or(ArenaError::NoSuchAgent(index))?;
        policy.accept_input(&input);
        Ok(())
    }

    pub fn toggle_pause(&mut self) {
        if self.episode.toggle_pause() {
            self.sync_freeze();
        }
    }

    /// Leave the match; nothing advances until [`Simulation::start`].
    pub fn return_to_menu(&mut self) {
        self.set_state(GameState::MainMenu);
    }

    /// Begin a fresh episode from the menu (or restart the current one).
    pub fn start(&mut self) {
        self.reset_episode();
    }

    /// Advance one tick. Returns the summary of an episode that ended on it.
    pub fn step(&mut self) -> Option<EpisodeSummary> {
        if !self.game_state().is_running() {
            return None;
        }
        self.tick += 1;
        let tick = self.tick;
        let now = self.time();
        let dt = self.config.dt;

        // Contacts from the previous tick land now.
        if self.arena.commit_pending_destruction() > 0 && !self.config.is_training() {
            for agent in self.arena.agents_mut() {
                if agent.is_destroyed() {
                    agent.freeze();
                }
            }
        }
        self.arena.remove_retired_projectiles(tick);

        if self.resolver.reset_due(now) {
            self.reset_episode();
        }

        if self.game_state().agents_may_act() {
            let actions: Vec<Option<ActionTuple>> = self
                .policies
                .iter_mut()
                .zip(self.arena.agents())
                .map(|(policy, agent)| {
                    (agent.is_alive() && !agent.is_frozen())
                        .then(|| policy.decide(agent, &self.arena))
                })
                .collect();

            let budget = self.config.max_episode_steps;
            for (i, action) in actions.into_iter().enumerate() {
                let Some(action) = action else { continue };
                if let Some(p) = self.arena.agent_mut(i).apply_action(&action, now, dt, budget) {
                    self.arena.projectiles.push(p);
                }
            }
            self.episode_steps += 1;
        }

        let contacts = self.physics.integrate(&mut self.arena, dt);
        self.arena.handle_contacts(&contacts, tick);
        self.arena.expire_projectiles(now, tick);
        self.refresh_observations();

        let resolution = self.resolver.poll(&self.arena, now, self.episode_steps)?;
        Some(self.conclude(resolution, now))
    }

    /// Step until an episode ends or `max_ticks` pass.
    pub fn run_episode(&mut self, max_ticks: u64) -> Option<EpisodeSummary> {
        (0..max_ticks).find_map(|_| self.step())
    }

    fn conclude(&mut self, resolution: Resolution, now: f32) -> EpisodeSummary {
        let Resolution { result, reason } = resolution;
        if result.is_terminal() {
            distribute_rewards(&mut self.arena, result);
        }

        let summary = EpisodeSummary {
            episode: self.episode_index,
            result,
            reason,
            final_tick: self.tick,
            duration_secs: now - self.episode_start,
            scoreboard: self.resolver.scoreboard(),
            agents: self
                .arena
                .agents()
                .iter()
                .map(|a| AgentReward {
                    id: a.id,
                    reward: a.cumulative_reward(),
                    destroyed: a.is_destroyed(),
                    ammunition: a.ammunition,
                })
                .collect(),
        };
        info!(
            episode = summary.episode,
            result = ?result,
            reason = ?reason,
            tick = self.tick,
            red_wins = summary.scoreboard.red_wins,
            blue_wins = summary.scoreboard.blue_wins,
            draws = summary.scoreboard.draws,
            "episode finished"
        );

        if result.is_terminal() {
            self.set_state(state_for_result(result, self.arena.player_team()));
        }
        if self.config.is_training() || !result.is_terminal() {
            self.reset_episode();
        } else {
            self.resolver.schedule_reset(now);
        }
        summary
    }

    fn reset_episode(&mut self) {
        let now = self.time();
        self.arena.reset_all();
        self.resolver.finish_reset(now);
        self.episode_index += 1;
        self.episode_steps = 0;
        self.episode_start = now;
        self.set_state(GameState::Playing);
        self.sync_freeze();
        self.refresh_observations();
        debug!(episode = self.episode_index, tick = self.tick, "episode reset");
    }

    fn set_state(&mut self, state: GameState) {
        if self.episode.set(state) {
            debug!(state = ?state, "game state");
            self.sync_freeze();
        }
    }

    /// Playing thaws the living, every other state freezes everyone.
    fn sync_freeze(&mut self) {
        let may_act = self.game_state().agents_may_act();
        let freeze_destroyed = !self.config.is_training();
        for agent in self.arena.agents_mut() {
            if may_act && !(agent.is_destroyed() && freeze_destroyed) {
                agent.thaw();
            } else {
                agent.freeze();
            }
        }
    }

    fn refresh_observations(&mut self) {
        self.observations = (0..self.arena.len())
            .map(|i| encode(&self.arena, i))
            .collect();
    }
}

/// Run `count` episodes of a fresh simulation, giving up after `max_ticks`
/// ticks in total.
pub fn run_episodes(
    arena: &ArenaConfig,
    config: SimConfig,
    count: usize,
    max_ticks: u64,
) -> Result<Vec<EpisodeSummary>, ArenaError> {
    let mut sim = Simulation::new(arena, config)?;
    let mut summaries = Vec::with_capacity(count);
    while summaries.len() < count && sim.tick() < max_ticks {
        if let Some(summary) = sim.step() {
            summaries.push(summary);
        }
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn duel(config: SimConfig) -> Simulation {
        Simulation::new(
            &ArenaConfig::versus(PolicyKind::Learned, PolicyKind::Learned, 1),
            config,
        )
        .unwrap()
    }

    fn place(sim: &mut Simulation, index: usize, pos: Vec3, rot: Quat) {
        sim.arena.agent_mut(index).reset(pos, rot);
    }

    #[test]
    fn test_idle_agents_drift_forward() {
        let mut sim = duel(SimConfig::showcase());
        let start = sim.arena().agent(0).position;
        for _ in 0..10 {
            assert!(sim.step().is_none());
        }
        assert_ne!(sim.arena().agent(0).position, start);
        assert_eq!(sim.tick(), 10);
    }

    #[test]
    fn test_observation_reflects_tick_just_run() {
        let mut sim = duel(SimConfig::training());
        let boost = ActionTuple {
            throttle: true,
            ..ActionTuple::none()
        };
        sim.submit_input(0, ExternalInput::Learned(boost)).unwrap();
        for _ in 0..5 {
            sim.step();
            assert_eq!(sim.observation(0), Some(&encode(sim.arena(), 0)));
            assert_eq!(sim.observation(1), Some(&encode(sim.arena(), 1)));
        }
        // Forward speed in the published vector is the speed now
        let speed = sim.arena().agent(0).velocity.length();
        let published = sim.observation(0).map(|o| o.data[2]).unwrap();
        assert!((published - speed).abs() < 1e-4, "{published} vs {speed}");
    }

    #[test]
    fn test_submit_input_rejects_unknown_slot() {
        let mut sim = duel(SimConfig::showcase());
        let err = sim
            .submit_input(7, ExternalInput::Learned(ActionTuple::none()))
            .unwrap_err();
        assert_eq!(err, ArenaError::NoSuchAgent(7));
    }

    #[test]
    fn test_paused_simulation_does_not_advance() {
        let mut sim = duel(SimConfig::showcase());
        sim.toggle_pause();
        assert_eq!(sim.game_state(), GameState::Paused);
        assert!(sim.arena().agent(0).is_frozen());
        let before = sim.snapshot();
        sim.step();
        assert_eq!(sim.tick(), before.tick);

        sim.toggle_pause();
        assert!(!sim.arena().agent(0).is_frozen());
        sim.step();
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_menu_holds_until_start() {
        let mut sim = duel(SimConfig::showcase());
        sim.return_to_menu();
        assert!(sim.step().is_none());
        assert_eq!(sim.tick(), 0);
        sim.start();
        assert_eq!(sim.game_state(), GameState::Playing);
        sim.step();
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn test_showcase_result_pause_then_reset() {
        let mut sim = duel(SimConfig::showcase());
        // Blue flies into the ceiling
        place(&mut sim, 1, Vec3::new(100.0, ARENA_HALF_EXTENT - 2.0, 0.0), Quat::IDENTITY);

        let summary = sim.run_episode(100).expect("episode should end");
        assert_eq!(summary.result, MatchResult::RedWin);
        assert_eq!(summary.reason, EpisodeEndReason::Elimination);
        assert_eq!(sim.game_state(), GameState::Win);
        assert!(sim.arena().agent(0).is_frozen());
        assert_eq!(sim.scoreboard().red_wins, 1);

        // Two seconds of pause, then everyone respawns
        let pause_ticks = (RESULT_PAUSE_SECS / DT) as u64 + 2;
        for _ in 0..pause_ticks {
            assert!(sim.step().is_none());
        }
        assert_eq!(sim.game_state(), GameState::Playing);
        assert!(sim.arena().agent(1).is_alive());
        assert_eq!(sim.arena().agent(1).cumulative_reward(), 0.0);
    }

    #[test]
    fn test_training_resets_immediately() {
        let mut sim = duel(SimConfig::training());
        place(&mut sim, 0, Vec3::new(-100.0, ARENA_HALF_EXTENT - 2.0, 0.0), Quat::IDENTITY);
        let summary = sim.run_episode(10).expect("episode should end");
        assert_eq!(summary.result, MatchResult::BlueWin);
        assert_eq!(sim.game_state(), GameState::Playing);
        assert!(sim.arena().agent(0).is_alive());
        assert_eq!(sim.episode_index(), 1);

        let red = &summary.agents[0];
        assert!(red.destroyed);
        assert!(red.reward < DESTROYED_PENALTY);
    }

    #[test]
    fn test_step_budget_truncates() {
        let config = SimConfig {
            max_episode_steps: 20,
            ..SimConfig::training()
        };
        let mut sim = duel(config);
        let summary = sim.run_episode(100).unwrap();
        assert_eq!(summary.reason, EpisodeEndReason::StepBudget);
        assert_eq!(summary.final_tick, 20);
        assert_eq!(sim.scoreboard().total(), 0);
        // -1/20 for each of 20 steps
        assert!((summary.agents[0].reward + 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_run_episodes_collects_summaries() {
        let config = SimConfig {
            max_episode_steps: 10,
            ..SimConfig::training()
        };
        let summaries = run_episodes(&ArenaConfig::default(), config, 3, 10_000).unwrap();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[2].episode, 2);
    }
}
