use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::*;

/// Per-aircraft flight and gun parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AircraftTuning {
    pub thrust: f32,
    pub boost_multiplier: f32,
    /// Max angular speeds, degrees per second.
    pub pitch_speed: f32,
    pub yaw_speed: f32,
    pub roll_speed: f32,
    pub initial_ammunition: u32,
    pub fire_interval: f32,
    /// Half-angle of the auto-fire cone, degrees.
    pub fire_cone: f32,
}

impl Default for AircraftTuning {
    fn default() -> Self {
        Self {
            thrust: THRUST,
            boost_multiplier: BOOST_MULTIPLIER,
            pitch_speed: PITCH_SPEED_DEG,
            yaw_speed: YAW_SPEED_DEG,
            roll_speed: ROLL_SPEED_DEG,
            initial_ammunition: INITIAL_AMMUNITION,
            fire_interval: FIRE_INTERVAL_SECS,
            fire_cone: FIRE_CONE_DEG,
        }
    }
}

impl AircraftTuning {
    pub fn pitch_rate(&self) -> f32 {
        self.pitch_speed.to_radians()
    }

    pub fn yaw_rate(&self) -> f32 {
        self.yaw_speed.to_radians()
    }

    pub fn roll_rate(&self) -> f32 {
        self.roll_speed.to_radians()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub number: u32,
    pub team: Team,
    pub policy: PolicyKind,
    #[serde(default)]
    pub tuning: AircraftTuning,
}

impl AgentConfig {
    pub fn new(team: Team, number: u32, policy: PolicyKind) -> Self {
        Self {
            number,
            team,
            policy,
            tuning: AircraftTuning::default(),
        }
    }

    pub fn id(&self) -> AgentId {
        AgentId::new(self.team, self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub id: u32,
    pub seed: u64,
    pub red_anchor: Vec3,
    pub blue_anchor: Vec3,
    pub spawn_jitter: f32,
    pub boundaries: Vec<Boundary>,
    pub agents: Vec<AgentConfig>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::versus(PolicyKind::Greedy, PolicyKind::PotentialField, 1)
    }
}

impl ArenaConfig {
    /// Six-wall cube with `team_size` agents per side.
    pub fn versus(red: PolicyKind, blue: PolicyKind, team_size: u32) -> Self {
        let mut agents = Vec::new();
        for n in 0..team_size {
            agents.push(AgentConfig::new(Team::Red, n, red));
        }
        for n in 0..team_size {
            agents.push(AgentConfig::new(Team::Blue, n, blue));
        }
        Self {
            id: 0,
            seed: 0,
            red_anchor: Vec3::new(-SPAWN_ANCHOR_OFFSET, 0.0, 0.0),
            blue_anchor: Vec3::new(SPAWN_ANCHOR_OFFSET, 0.0, 0.0),
            spawn_jitter: SPAWN_JITTER,
            boundaries: cube_boundaries(ARENA_HALF_EXTENT),
            agents,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

pub fn cube_boundaries(half_extent: f32) -> Vec<Boundary> {
    [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z]
        .into_iter()
        .map(|n| Boundary::new(n * half_extent, n))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimMode {
    /// Evaluate every tick, reset immediately, per-episode step budget.
    Training,
    /// Periodic evaluation with a result pause, destroyed agents frozen.
    Showcase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub mode: SimMode,
    pub dt: f32,
    pub evaluation_interval: f32,
    pub result_pause: f32,
    pub resume_settle: f32,
    /// 0 disables the step budget and the per-step penalty.
    pub max_episode_steps: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::showcase()
    }
}

impl SimConfig {
    pub fn showcase() -> Self {
        Self {
            mode: SimMode::Showcase,
            dt: DT,
            evaluation_interval: EVALUATION_INTERVAL_SECS,
            result_pause: RESULT_PAUSE_SECS,
            resume_settle: RESUME_SETTLE_SECS,
            max_episode_steps: 0,
        }
    }

    pub fn training() -> Self {
        Self {
            mode: SimMode::Training,
            dt: DT,
            evaluation_interval: 0.0,
            result_pause: 0.0,
            resume_settle: 0.0,
            max_episode_steps: TRAINING_MAX_STEPS,
        }
    }

    pub fn is_training(&self) -> bool {
        self.mode == SimMode::Training
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arena_is_one_versus_one() {
        let config = ArenaConfig::default();
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.boundaries.len(), 6);
        assert_eq!(config.agents[0].id(), AgentId::new(Team::Red, 0));
        assert_eq!(config.agents[1].policy, PolicyKind::PotentialField);
    }

    #[test]
    fn test_cube_normals_point_outward() {
        for wall in cube_boundaries(100.0) {
            assert!(wall.signed_distance(Vec3::ZERO) < 0.0);
        }
    }

    #[test]
    fn test_config_json_defaults_fill_in() {
        let json = r#"{
            "id": 3,
            "seed": 9,
            "red_anchor": [-50.0, 0.0, 0.0],
            "blue_anchor": [50.0, 0.0, 0.0],
            "spawn_jitter": 5.0,
            "boundaries": [],
            "agents": [
                {"number": 0, "team": "red", "policy": "greedy"},
                {"number": 0, "team": "blue", "policy": "learned", "tuning": {"initial_ammunition": 20}}
            ]
        }"#;
        let config: ArenaConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.agents[0].tuning, AircraftTuning::default());
        assert_eq!(config.agents[1].tuning.initial_ammunition, 20);
        assert_eq!(config.agents[1].tuning.thrust, THRUST);
    }

    #[test]
    fn test_training_config_has_step_budget() {
        assert_eq!(SimConfig::training().max_episode_steps, TRAINING_MAX_STEPS);
        assert_eq!(SimConfig::showcase().max_episode_steps, 0);
    }
}
