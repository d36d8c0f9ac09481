//! Match outcome evaluation and the timing around it.

use aircombat_shared::*;

use crate::arena::Arena;

/// Alive counts and remaining ammunition per team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamTally {
    pub red_alive: u32,
    pub blue_alive: u32,
    pub red_ammunition: u32,
    pub blue_ammunition: u32,
}

impl TeamTally {
    pub fn of(arena: &Arena) -> Self {
        let mut tally = Self::default();
        for agent in arena.alive_agents() {
            match agent.team() {
                Team::Red => {
                    tally.red_alive += 1;
                    tally.red_ammunition += agent.ammunition;
                }
                Team::Blue => {
                    tally.blue_alive += 1;
                    tally.blue_ammunition += agent.ammunition;
                }
            }
        }
        tally
    }

    /// Alive counts decide first; ammunition only matters once both sides
    /// still have someone flying.
    pub fn result(&self) -> (MatchResult, Option<EpisodeEndReason>) {
        use EpisodeEndReason::*;
        match (self.red_alive, self.blue_alive) {
            (0, 0) => (MatchResult::Draw, Some(Elimination)),
            (0, _) => (MatchResult::BlueWin, Some(Elimination)),
            (_, 0) => (MatchResult::RedWin, Some(Elimination)),
            _ => match (self.red_ammunition, self.blue_ammunition) {
                (0, 0) => (MatchResult::Draw, Some(AmmunitionExhausted)),
                (0, _) => (MatchResult::BlueWin, Some(AmmunitionExhausted)),
                (_, 0) => (MatchResult::RedWin, Some(AmmunitionExhausted)),
                _ => (MatchResult::Undetermined, None),
            },
        }
    }
}

pub fn evaluate(arena: &Arena) -> (MatchResult, Option<EpisodeEndReason>) {
    TeamTally::of(arena).result()
}

/// Apply win, lose or draw rewards to every agent.
pub fn distribute_rewards(arena: &mut Arena, result: MatchResult) {
    for agent in arena.agents_mut() {
        let reward = match result.winner() {
            Some(team) if team == agent.team() => WIN_REWARD,
            Some(_) => LOSE_REWARD,
            None if result == MatchResult::Draw => DRAW_REWARD,
            None => continue,
        };
        agent.add_reward(reward);
    }
}

/// How an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub result: MatchResult,
    pub reason: EpisodeEndReason,
}

/// Decides when the roster is evaluated and when a finished episode resets.
#[derive(Debug, Clone)]
pub struct MatchResolver {
    config: SimConfig,
    scoreboard: Scoreboard,
    next_evaluation: f32,
    reset_at: Option<f32>,
}

// Tolerance for comparing accumulated simulated time.
const TIME_EPSILON: f32 = 1e-4;

impl MatchResolver {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            scoreboard: Scoreboard::default(),
            next_evaluation: 0.0,
            reset_at: None,
        }
    }

    pub fn scoreboard(&self) -> Scoreboard {
        self.scoreboard
    }

    pub fn awaiting_reset(&self) -> bool {
        self.reset_at.is_some()
    }

    /// Evaluate the roster if an evaluation is due at `now`.
    ///
    /// `episode_steps` counts ticks since the last reset and drives the
    /// step budget when one is configured.
    pub fn poll(&mut self, arena: &Arena, now: f32, episode_steps: u32) -> Option<Resolution> {
        if self.reset_at.is_some() {
            return None;
        }
        if !self.config.is_training() {
            if now + TIME_EPSILON < self.next_evaluation {
                return None;
            }
            self.next_evaluation = now + self.config.evaluation_interval;
        }

        if let (result, Some(reason)) = evaluate(arena) {
            self.scoreboard.record(result);
            return Some(Resolution { result, reason });
        }
        let budget = self.config.max_episode_steps;
        if budget > 0 && episode_steps >= budget {
            return Some(Resolution {
                result: MatchResult::Undetermined,
                reason: EpisodeEndReason::StepBudget,
            });
        }
        None
    }

    pub fn schedule_reset(&mut self, now: f32) {
        self.reset_at = Some(now + self.config.result_pause);
    }

    pub fn reset_due(&self, now: f32) -> bool {
        self.reset_at.is_some_and(|at| now + TIME_EPSILON >= at)
    }

    /// Called once agents are back at their spawns.
    pub fn finish_reset(&mut self, now: f32) {
        self.reset_at = None;
        self.next_evaluation = now + self.config.resume_settle;
    }
}
