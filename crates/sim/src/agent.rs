use aircombat_shared::*;
use glam::{EulerRot, Quat, Vec3};
use tracing::debug;

use crate::frame::{self, move_towards};

/// A commanded value and the rate-limited reading that follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedInput {
    pub target: f32,
    pub value: f32,
}

impl SmoothedInput {
    pub fn advance(&mut self, target: f32, dt: f32) {
        self.target = target;
        self.value = move_towards(self.value, target, CONTROL_RAMP_RATE * dt);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlState {
    pub pitch: SmoothedInput,
    pub yaw: SmoothedInput,
    pub roll: SmoothedInput,
    pub throttle: SmoothedInput,
    pub fire: SmoothedInput,
}

impl ControlState {
    fn advance(&mut self, action: &ActionTuple, dt: f32) {
        self.pitch.advance(action.pitch.signum() as f32, dt);
        self.yaw.advance(action.yaw.signum() as f32, dt);
        self.roll.advance(action.roll.signum() as f32, dt);
        self.throttle.advance(if action.throttle { 1.0 } else { 0.0 }, dt);
        self.fire.advance(if action.fire { 1.0 } else { 0.0 }, dt);
    }
}

/// Why a trigger pull did not produce a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireBlocked {
    EmptyMagazine,
    Cooldown,
    Inactive,
}

/// One combat aircraft.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub policy: PolicyKind,
    pub tuning: AircraftTuning,

    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    /// World-space force requested for the next physics step.
    pub thrust_command: Vec3,

    pub ammunition: u32,
    pub controls: ControlState,
    pub stats: ContactStats,
    pub step_count: u32,

    destroyed: bool,
    pending_destruction: bool,
    frozen: bool,
    last_fire_time: Option<f32>,
    reward: f32,
}

impl Agent {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            id: config.id(),
            policy: config.policy,
            tuning: config.tuning,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            thrust_command: Vec3::ZERO,
            ammunition: config.tuning.initial_ammunition,
            controls: ControlState::default(),
            stats: ContactStats::default(),
            step_count: 0,
            destroyed: false,
            pending_destruction: false,
            frozen: false,
            last_fire_time: None,
            reward: 0.0,
        }
    }

    pub fn team(&self) -> Team {
        self.id.team
    }

    pub fn forward(&self) -> Vec3 {
        frame::forward(self.orientation)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_alive(&self) -> bool {
        !self.destroyed
    }

    pub fn is_pending_destruction(&self) -> bool {
        self.pending_destruction
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.reward
    }

    /// Signed turn rates (rad/s) the aircraft is currently flying.
    pub fn pitch_rate(&self) -> f32 {
        self.controls.pitch.value * self.tuning.pitch_rate()
    }

    pub fn yaw_rate(&self) -> f32 {
        self.controls.yaw.value * self.tuning.yaw_rate()
    }

    pub fn roll_rate(&self) -> f32 {
        self.controls.roll.value * self.tuning.roll_rate()
    }

    /// Destroyed agents never collect positive reward.
    pub fn add_reward(&mut self, amount: f32) {
        if self.destroyed && amount > 0.0 {
            return;
        }
        self.reward += amount;
    }

    /// Put the agent back at a spawn pose with a full magazine.
    pub fn reset(&mut self, position: Vec3, orientation: Quat) {
        self.position = position;
        self.orientation = orientation;
        self.velocity = Vec3::ZERO;
        self.thrust_command = Vec3::ZERO;
        self.ammunition = self.tuning.initial_ammunition;
        self.controls = ControlState::default();
        self.step_count = 0;
        self.destroyed = false;
        self.pending_destruction = false;
        self.frozen = false;
        self.last_fire_time = None;
        self.reward = 0.0;
    }

    pub fn freeze(&mut self) {
        if !self.frozen {
            debug!(agent = %self.id, "freeze");
            self.frozen = true;
            self.velocity = Vec3::ZERO;
            self.thrust_command = Vec3::ZERO;
        }
    }

    pub fn thaw(&mut self) {
        if self.frozen {
            debug!(agent = %self.id, "thaw");
            self.frozen = false;
        }
    }

    /// Record a contact that destroys this agent at the start of the next tick.
    pub fn mark_pending_destruction(&mut self) {
        if !self.destroyed {
            self.pending_destruction = true;
        }
    }

    /// Apply a pending destruction. Returns true if the agent was destroyed now.
    pub fn commit_destruction(&mut self) -> bool {
        if !self.pending_destruction || self.destroyed {
            self.pending_destruction = false;
            return false;
        }
        self.pending_destruction = false;
        self.destroyed = true;
        self.thrust_command = Vec3::ZERO;
        self.add_reward(DESTROYED_PENALTY);
        debug!(agent = %self.id, reward = self.reward, "destroyed");
        true
    }

    /// Reward the owner of a projectile that struck `target`.
    pub fn on_projectile_hit(&mut self, target: AgentId) {
        if target.team == self.team() {
            self.add_reward(FRIENDLY_FIRE_PENALTY);
        } else {
            self.stats.kills += 1;
            self.add_reward(HIT_REWARD);
        }
        debug!(agent = %self.id, %target, reward = self.reward, "projectile hit");
    }

    /// Update smoothed controls, rotate, command thrust and fire.
    ///
    /// `max_episode_steps` of 0 disables the per-step penalty.
    pub fn apply_action(
        &mut self,
        action: &ActionTuple,
        now: f32,
        dt: f32,
        max_episode_steps: u32,
    ) -> Option<Projectile> {
        if self.frozen || self.destroyed {
            return None;
        }
        self.step_count += 1;

        self.controls.advance(action, dt);

        let boost = 1.0 + (self.tuning.boost_multiplier - 1.0) * self.controls.throttle.value;
        self.thrust_command = self.forward() * (self.tuning.thrust * boost);

        let delta = Quat::from_euler(
            EulerRot::YXZ,
            self.yaw_rate() * dt,
            self.pitch_rate() * dt,
            -self.roll_rate() * dt,
        );
        self.orientation = (self.orientation * delta).normalize();

        let projectile = if action.fire {
            self.fire(now).ok()
        } else {
            None
        };

        if max_episode_steps > 0 {
            self.add_reward(-1.0 / max_episode_steps as f32);
        }

        projectile
    }

    /// Pull the trigger at simulated time `now`.
    pub fn fire(&mut self, now: f32) -> Result<Projectile, FireBlocked> {
        if self.destroyed || self.frozen {
            return Err(FireBlocked::Inactive);
        }
        if self.ammunition == 0 {
            self.add_reward(EMPTY_MAGAZINE_PENALTY);
            return Err(FireBlocked::EmptyMagazine);
        }
        if let Some(last) = self.last_fire_time {
            if now - last < self.tuning.fire_interval {
                return Err(FireBlocked::Cooldown);
            }
        }

        self.last_fire_time = Some(now);
        self.ammunition -= 1;
        self.stats.shots += 1;
        let initial = self.tuning.initial_ammunition.max(1);
        self.add_reward(1.0 / initial as f32);

        let forward = self.forward();
        debug!(agent = %self.id, ammunition = self.ammunition, "fire");
        Ok(Projectile {
            position: self.position + forward * MUZZLE_OFFSET,
            velocity: self.velocity + forward * BULLET_SPEED,
            owner: self.id,
            spawned_at: now,
            lifetime: BULLET_LIFETIME_SECS,
            state: ProjectileState::Active,
            retired_at: None,
        })
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            policy: self.policy,
            position: self.position,
            orientation: self.orientation,
            velocity: self.velocity,
            ammunition: self.ammunition,
            destroyed: self.destroyed,
            reward: self.reward,
            stats: self.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(team: Team) -> Agent {
        Agent::new(&AgentConfig::new(team, 0, PolicyKind::Learned))
    }

    #[test]
    fn test_controls_ramp_not_snap() {
        let mut a = agent(Team::Red);
        let turn = ActionTuple {
            yaw: 1,
            ..ActionTuple::none()
        };
        a.apply_action(&turn, 0.0, DT, 0);
        assert!((a.controls.yaw.value - CONTROL_RAMP_RATE * DT).abs() < 1e-6);
        assert_eq!(a.controls.yaw.target, 1.0);
        for _ in 0..100 {
            a.apply_action(&turn, 0.0, DT, 0);
        }
        assert_eq!(a.controls.yaw.value, 1.0);
    }

    #[test]
    fn test_yaw_action_turns_right() {
        let mut a = agent(Team::Red);
        let turn = ActionTuple {
            yaw: 1,
            ..ActionTuple::none()
        };
        for _ in 0..50 {
            a.apply_action(&turn, 0.0, DT, 0);
        }
        assert!(a.forward().x > 0.0);
        assert!(a.forward().y.abs() < 1e-3);
    }

    #[test]
    fn test_boost_scales_thrust() {
        let mut a = agent(Team::Red);
        a.apply_action(&ActionTuple::none(), 0.0, DT, 0);
        assert!((a.thrust_command.length() - THRUST).abs() < 1e-3);
        let boost = ActionTuple {
            throttle: true,
            ..ActionTuple::none()
        };
        for _ in 0..50 {
            a.apply_action(&boost, 0.0, DT, 0);
        }
        assert!((a.thrust_command.length() - THRUST * BOOST_MULTIPLIER).abs() < 1e-3);
    }

    #[test]
    fn test_step_penalty_only_with_budget() {
        let mut a = agent(Team::Red);
        a.apply_action(&ActionTuple::none(), 0.0, DT, 0);
        assert_eq!(a.cumulative_reward(), 0.0);
        a.apply_action(&ActionTuple::none(), 0.0, DT, 100);
        assert!((a.cumulative_reward() + 0.01).abs() < 1e-6);
        assert_eq!(a.step_count, 2);
    }

    #[test]
    fn test_fire_consumes_ammunition_and_rewards() {
        let mut a = agent(Team::Red);
        let p = a.fire(1.0).unwrap();
        assert_eq!(a.ammunition, INITIAL_AMMUNITION - 1);
        assert_eq!(p.owner, a.id);
        assert!((a.cumulative_reward() - 1.0 / INITIAL_AMMUNITION as f32).abs() < 1e-7);
        assert!(p.velocity.z > 0.0);
    }

    #[test]
    fn test_fire_cooldown() {
        let mut a = agent(Team::Red);
        assert!(a.fire(1.0).is_ok());
        assert_eq!(a.fire(1.05), Err(FireBlocked::Cooldown));
        assert!(a.fire(1.2).is_ok());
        assert_eq!(a.ammunition, INITIAL_AMMUNITION - 2);
    }

    #[test]
    fn test_empty_magazine_never_fires() {
        let mut a = agent(Team::Red);
        a.ammunition = 0;
        for i in 0..10 {
            assert_eq!(a.fire(i as f32), Err(FireBlocked::EmptyMagazine));
        }
        assert_eq!(a.ammunition, 0);
        assert!((a.cumulative_reward() - 10.0 * EMPTY_MAGAZINE_PENALTY).abs() < 1e-4);
    }

    #[test]
    fn test_destruction_is_deferred_and_penalised_once() {
        let mut a = agent(Team::Blue);
        a.mark_pending_destruction();
        assert!(a.is_alive());
        assert!(a.commit_destruction());
        assert!(a.is_destroyed());
        a.mark_pending_destruction();
        assert!(!a.commit_destruction());
        assert_eq!(a.cumulative_reward(), DESTROYED_PENALTY);
    }

    #[test]
    fn test_destroyed_agent_is_inert() {
        let mut a = agent(Team::Red);
        a.mark_pending_destruction();
        a.commit_destruction();
        assert_eq!(a.fire(5.0), Err(FireBlocked::Inactive));
        let fire = ActionTuple {
            fire: true,
            ..ActionTuple::none()
        };
        assert!(a.apply_action(&fire, 5.0, DT, 0).is_none());
        a.add_reward(HIT_REWARD);
        assert_eq!(a.cumulative_reward(), DESTROYED_PENALTY);
        a.add_reward(LOSE_REWARD);
        assert_eq!(a.cumulative_reward(), DESTROYED_PENALTY + LOSE_REWARD);
    }

    #[test]
    fn test_hit_attribution() {
        let mut a = agent(Team::Red);
        a.on_projectile_hit(AgentId::new(Team::Blue, 0));
        assert_eq!(a.cumulative_reward(), HIT_REWARD);
        a.on_projectile_hit(AgentId::new(Team::Red, 1));
        assert_eq!(a.cumulative_reward(), HIT_REWARD + FRIENDLY_FIRE_PENALTY);
    }

    #[test]
    fn test_reset_restores_episode_state() {
        let mut a = agent(Team::Red);
        a.fire(0.0).unwrap();
        a.mark_pending_destruction();
        a.commit_destruction();
        a.reset(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        assert!(a.is_alive());
        assert_eq!(a.ammunition, INITIAL_AMMUNITION);
        assert_eq!(a.cumulative_reward(), 0.0);
        assert_eq!(a.position, Vec3::new(1.0, 2.0, 3.0));
        // cooldown forgotten
        assert!(a.fire(0.0).is_ok());
    }
}
