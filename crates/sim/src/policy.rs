use aircombat_shared::{ActionTuple, ManualInput, PolicyKind};

use crate::agent::Agent;
use crate::arena::Arena;
use crate::opponents::{GreedyPolicy, PotentialFieldPolicy};

/// Input delivered to an agent from outside the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExternalInput {
    /// Raw stick/trigger values from a human player.
    Manual(ManualInput),
    /// A decoded action from an external learned policy.
    Learned(ActionTuple),
}

pub trait Policy: Send {
    fn name(&self) -> &str;
    fn decide(&mut self, observer: &Agent, arena: &Arena) -> ActionTuple;

    /// Policies driven from outside take their next action here.
    fn accept_input(&mut self, _input: &ExternalInput) {}
}

/// Passes through the last action supplied by an external learner.
#[derive(Debug, Default)]
pub struct LearnedPolicy {
    action: ActionTuple,
}

impl Policy for LearnedPolicy {
    fn name(&self) -> &str {
        "learned"
    }

    fn decide(&mut self, _observer: &Agent, _arena: &Arena) -> ActionTuple {
        self.action
    }

    fn accept_input(&mut self, input: &ExternalInput) {
        match input {
            ExternalInput::Learned(action) => self.action = *action,
            ExternalInput::Manual(raw) => self.action = raw.to_action(),
        }
    }
}

/// Rounds the latest raw human input to the nearest action.
#[derive(Debug, Default)]
pub struct ManualPolicy {
    input: ManualInput,
}

impl Policy for ManualPolicy {
    fn name(&self) -> &str {
        "manual"
    }

    fn decide(&mut self, _observer: &Agent, _arena: &Arena) -> ActionTuple {
        self.input.to_action()
    }

    fn accept_input(&mut self, input: &ExternalInput) {
        match input {
            ExternalInput::Manual(raw) => self.input = *raw,
            ExternalInput::Learned(action) => {
                self.input = ManualInput {
                    pitch: action.pitch as f32,
                    yaw: action.yaw as f32,
                    roll: action.roll as f32,
                    boost: if action.throttle { 1.0 } else { 0.0 },
                    fire: if action.fire { 1.0 } else { 0.0 },
                }
            }
        }
    }
}

pub fn for_kind(kind: PolicyKind) -> Box<dyn Policy> {
    match kind {
        PolicyKind::Learned => Box::<LearnedPolicy>::default(),
        PolicyKind::Manual => Box::<ManualPolicy>::default(),
        PolicyKind::Greedy => Box::new(GreedyPolicy),
        PolicyKind::PotentialField => Box::new(PotentialFieldPolicy::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aircombat_shared::ArenaConfig;

    #[test]
    fn test_learned_policy_holds_last_action() {
        let arena = Arena::new(&ArenaConfig::default()).unwrap();
        let mut policy = LearnedPolicy::default();
        assert_eq!(policy.decide(arena.agent(0), &arena), ActionTuple::none());

        let action = ActionTuple {
            yaw: -1,
            fire: true,
            ..ActionTuple::none()
        };
        policy.accept_input(&ExternalInput::Learned(action));
        assert_eq!(policy.decide(arena.agent(0), &arena), action);
        assert_eq!(policy.decide(arena.agent(0), &arena), action);
    }

    #[test]
    fn test_manual_policy_rounds_raw_input() {
        let arena = Arena::new(&ArenaConfig::default()).unwrap();
        let mut policy = ManualPolicy::default();
        policy.accept_input(&ExternalInput::Manual(ManualInput {
            pitch: 0.7,
            yaw: -0.4,
            roll: -0.6,
            boost: 0.2,
            fire: 0.9,
        }));
        let action = policy.decide(arena.agent(0), &arena);
        assert_eq!(action.pitch, 1);
        assert_eq!(action.yaw, 0);
        assert_eq!(action.roll, -1);
        assert!(!action.throttle);
        assert!(action.fire);
    }

    #[test]
    fn test_for_kind_names() {
        for kind in [
            PolicyKind::Learned,
            PolicyKind::Manual,
            PolicyKind::Greedy,
            PolicyKind::PotentialField,
        ] {
            assert_eq!(for_kind(kind).name(), kind.name());
        }
    }
}
