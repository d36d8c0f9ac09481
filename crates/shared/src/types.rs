use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Red => write!(f, "red"),
            Team::Blue => write!(f, "blue"),
        }
    }
}

/// Stable identity of an agent: unique per team within one arena.
///
/// Projectiles refer to their owner through this id only, so a projectile
/// never keeps its owner alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId {
    pub team: Team,
    pub number: u32,
}

impl AgentId {
    pub fn new(team: Team, number: u32) -> Self {
        Self { team, number }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.team, self.number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Actions come from an external learned policy.
    Learned,
    /// Actions come from a human input device.
    Manual,
    Greedy,
    PotentialField,
}

impl PolicyKind {
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Learned => "learned",
            PolicyKind::Manual => "manual",
            PolicyKind::Greedy => "greedy",
            PolicyKind::PotentialField => "gravity",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learned" | "none" => Ok(PolicyKind::Learned),
            "manual" | "player" => Ok(PolicyKind::Manual),
            "greedy" => Ok(PolicyKind::Greedy),
            "gravity" | "potential_field" => Ok(PolicyKind::PotentialField),
            other => Err(format!(
                "unknown policy '{other}'. Valid options: learned, manual, greedy, gravity"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("action branch {branch} got code {code}, expected < {size}")]
    CodeOutOfRange { branch: usize, code: i64, size: u8 },
    #[error("expected {expected} action values, got {got}")]
    WrongLength { expected: usize, got: usize },
}

/// One tick's discrete decision.
///
/// Turning axes are in {-1, 0, +1}: pitch +1 is nose down, yaw +1 is
/// right, roll +1 is roll right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTuple {
    pub pitch: i8,
    pub yaw: i8,
    pub roll: i8,
    pub throttle: bool,
    pub fire: bool,
}

impl ActionTuple {
    pub fn none() -> Self {
        Self::default()
    }

    /// Decode the learner-facing encoding: turn codes 0/1/2 map to 0/+1/-1,
    /// throttle and fire codes are 0/1.
    pub fn from_discrete(codes: [u8; crate::ACTION_SIZE]) -> Result<Self, ActionError> {
        for (branch, (&code, &size)) in codes.iter().zip(crate::ACTION_BRANCHES.iter()).enumerate() {
            if code >= size {
                return Err(ActionError::CodeOutOfRange {
                    branch,
                    code: code.into(),
                    size,
                });
            }
        }
        let turn = |code: u8| -> i8 {
            match code {
                1 => 1,
                2 => -1,
                _ => 0,
            }
        };
        Ok(Self {
            pitch: turn(codes[0]),
            yaw: turn(codes[1]),
            roll: turn(codes[2]),
            throttle: codes[3] == 1,
            fire: codes[4] == 1,
        })
    }

    pub fn from_slice(codes: &[i64]) -> Result<Self, ActionError> {
        if codes.len() != crate::ACTION_SIZE {
            return Err(ActionError::WrongLength {
                expected: crate::ACTION_SIZE,
                got: codes.len(),
            });
        }
        let mut raw = [0u8; crate::ACTION_SIZE];
        for (branch, (&c, &size)) in codes.iter().zip(crate::ACTION_BRANCHES.iter()).enumerate() {
            raw[branch] = u8::try_from(c).map_err(|_| ActionError::CodeOutOfRange {
                branch,
                code: c,
                size,
            })?;
        }
        Self::from_discrete(raw)
    }

    pub fn to_discrete(&self) -> [u8; crate::ACTION_SIZE] {
        let turn = |v: i8| -> u8 {
            match v.signum() {
                1 => 1,
                -1 => 2,
                _ => 0,
            }
        };
        [
            turn(self.pitch),
            turn(self.yaw),
            turn(self.roll),
            self.throttle as u8,
            self.fire as u8,
        ]
    }
}

/// Raw analog readings from an input device, each nominally in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualInput {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub boost: f32,
    pub fire: f32,
}

impl ManualInput {
    /// Round each reading to the nearest action value, halves to even.
    pub fn to_action(&self) -> ActionTuple {
        let axis = |v: f32| v.clamp(-1.0, 1.0).round_ties_even() as i8;
        ActionTuple {
            pitch: axis(self.pitch),
            yaw: axis(self.yaw),
            roll: axis(self.roll),
            throttle: self.boost.clamp(0.0, 1.0).round_ties_even() > 0.0,
            fire: self.fire.clamp(0.0, 1.0).round_ties_even() > 0.0,
        }
    }
}

/// Length of the observation vector for an arena with `boundaries` walls.
pub const fn observation_len(boundaries: usize) -> usize {
    crate::SELF_OBS_SIZE
        + crate::BOUNDARY_SLOT_SIZE * boundaries
        + crate::OTHER_SLOT_SIZE * crate::OTHER_SLOTS
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub data: Vec<f32>,
}

impl Observation {
    pub fn zeros(boundaries: usize) -> Self {
        Self {
            data: vec![0.0; observation_len(boundaries)],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl serde::Serialize for Observation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.as_slice().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Observation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let data: Vec<f32> = Vec::deserialize(deserializer)?;
        let fixed = observation_len(0);
        if data.len() < fixed || (data.len() - fixed) % crate::BOUNDARY_SLOT_SIZE != 0 {
            return Err(serde::de::Error::custom(format!(
                "{} floats is not a valid observation length",
                data.len()
            )));
        }
        Ok(Observation { data })
    }
}

/// A planar wall: anchor point plus outward unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Boundary {
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Self {
            point,
            normal: normal.normalize_or_zero(),
        }
    }

    /// Positive outside the playable volume, negative inside.
    pub fn signed_distance(&self, p: Vec3) -> f32 {
        (p - self.point).dot(self.normal)
    }

    pub fn distance(&self, p: Vec3) -> f32 {
        self.signed_distance(p).abs()
    }

    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p - self.normal * self.signed_distance(p)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileState {
    Active,
    Hit,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub owner: AgentId,
    pub spawned_at: f32,
    pub lifetime: f32,
    pub state: ProjectileState,
    /// Tick on which the projectile left `Active`; it is removed on the next tick.
    pub retired_at: Option<u64>,
}

impl Projectile {
    pub fn is_active(&self) -> bool {
        self.state == ProjectileState::Active
    }

    pub fn retire(&mut self, state: ProjectileState, tick: u64) {
        if self.is_active() {
            self.state = state;
            self.retired_at = Some(tick);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Undetermined,
    RedWin,
    BlueWin,
    Draw,
}

impl MatchResult {
    pub fn is_terminal(self) -> bool {
        self != MatchResult::Undetermined
    }

    pub fn winner(self) -> Option<Team> {
        match self {
            MatchResult::RedWin => Some(Team::Red),
            MatchResult::BlueWin => Some(Team::Blue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    MainMenu,
    Playing,
    Paused,
    Win,
    Lose,
    Draw,
}

impl GameState {
    /// Whether agents are thawed in this state.
    pub fn agents_may_act(self) -> bool {
        matches!(self, GameState::Playing)
    }

    /// Whether the simulation clock advances at all.
    pub fn is_running(self) -> bool {
        !matches!(self, GameState::MainMenu | GameState::Paused)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeEndReason {
    Elimination,
    AmmunitionExhausted,
    StepBudget,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub red_wins: u32,
    pub blue_wins: u32,
    pub draws: u32,
}

impl Scoreboard {
    pub fn record(&mut self, result: MatchResult) {
        match result {
            MatchResult::RedWin => self.red_wins += 1,
            MatchResult::BlueWin => self.blue_wins += 1,
            MatchResult::Draw => self.draws += 1,
            MatchResult::Undetermined => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.red_wins + self.blue_wins + self.draws
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReward {
    pub id: AgentId,
    pub reward: f32,
    pub destroyed: bool,
    pub ammunition: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub result: MatchResult,
    pub reason: EpisodeEndReason,
    pub final_tick: u64,
    pub duration_secs: f32,
    pub scoreboard: Scoreboard,
    pub agents: Vec<AgentReward>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStats {
    pub boundary_hits: u32,
    pub projectile_hits: u32,
    pub agent_hits: u32,
    pub shots: u32,
    pub kills: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub policy: PolicyKind,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub ammunition: u32,
    pub destroyed: bool,
    pub reward: f32,
    pub stats: ContactStats,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub owner: AgentId,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            position: p.position,
            velocity: p.velocity,
            owner: p.owner,
        }
    }
}

/// Read-only view handed to render, camera and HUD collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub tick: u64,
    pub time: f32,
    pub game_state: GameState,
    pub agents: Vec<AgentSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
}
