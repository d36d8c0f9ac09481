//! The owned game-state holder and its change notifications.

use aircombat_shared::{GameState, MatchResult, Team};
use std::fmt;

pub type StateObserver = Box<dyn FnMut(GameState) + Send>;

/// Current game state plus everyone listening for changes to it.
pub struct EpisodeState {
    state: GameState,
    observers: Vec<StateObserver>,
}

impl fmt::Debug for EpisodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpisodeState")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl EpisodeState {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            observers: Vec::new(),
        }
    }

    pub fn get(&self) -> GameState {
        self.state
    }

    /// Register a callback run on every state change.
    pub fn subscribe(&mut self, observer: StateObserver) {
        self.observers.push(observer);
    }

    /// Change state, notifying observers. Returns false if nothing changed.
    pub fn set(&mut self, state: GameState) -> bool {
        if state == self.state {
            return false;
        }
        self.state = state;
        for observer in &mut self.observers {
            observer(state);
        }
        true
    }

    /// Flip between Playing and Paused; other states are left alone.
    pub fn toggle_pause(&mut self) -> bool {
        match self.state {
            GameState::Playing => self.set(GameState::Paused),
            GameState::Paused => self.set(GameState::Playing),
            _ => false,
        }
    }
}

/// Win/Lose/Draw as seen from `player_team`.
pub fn state_for_result(result: MatchResult, player_team: Team) -> GameState {
    match result.winner() {
        Some(team) if team == player_team => GameState::Win,
        Some(_) => GameState::Lose,
        None if result == MatchResult::Draw => GameState::Draw,
        None => GameState::Playing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_observers_see_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut episode = EpisodeState::new(GameState::Playing);
        episode.subscribe(Box::new(move |s| sink.lock().unwrap().push(s)));

        assert!(!episode.set(GameState::Playing));
        assert!(episode.set(GameState::Win));
        assert!(episode.set(GameState::Playing));
        assert_eq!(*seen.lock().unwrap(), vec![GameState::Win, GameState::Playing]);
    }

    #[test]
    fn test_toggle_pause() {
        let mut episode = EpisodeState::new(GameState::Playing);
        assert!(episode.toggle_pause());
        assert_eq!(episode.get(), GameState::Paused);
        assert!(episode.toggle_pause());
        assert_eq!(episode.get(), GameState::Playing);

        let mut menu = EpisodeState::new(GameState::MainMenu);
        assert!(!menu.toggle_pause());
        assert_eq!(menu.get(), GameState::MainMenu);
    }

    #[test]
    fn test_result_from_player_side() {
        assert_eq!(state_for_result(MatchResult::RedWin, Team::Red), GameState::Win);
        assert_eq!(state_for_result(MatchResult::RedWin, Team::Blue), GameState::Lose);
        assert_eq!(state_for_result(MatchResult::Draw, Team::Blue), GameState::Draw);
        assert_eq!(
            state_for_result(MatchResult::Undetermined, Team::Red),
            GameState::Playing
        );
    }
}
