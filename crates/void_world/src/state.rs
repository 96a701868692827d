use std::time::Duration;

use void_scope::ScopeId;

/// Clock advanced once per frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameTime {
    /// Time since the world started
    pub total: Duration,
    /// Length of the last frame
    pub elapsed: Duration,
}

impl GameTime {
    pub fn advance(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.total += elapsed;
    }
}

/// Update context: the clock and the tables currently being updated
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    pub game_time: GameTime,
    pub current_world: Option<ScopeId>,
    pub current_sector: Option<ScopeId>,
    pub current_entity: Option<ScopeId>,
    pub current_action: Option<ScopeId>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget which tables are being updated; the clock is kept
    pub fn reset_focus(&mut self) {
        self.current_world = None;
        self.current_sector = None;
        self.current_entity = None;
        self.current_action = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_time_advance() {
        let mut time = GameTime::default();
        time.advance(Duration::from_millis(16));
        time.advance(Duration::from_millis(20));

        assert_eq!(time.elapsed, Duration::from_millis(20));
        assert_eq!(time.total, Duration::from_millis(36));
    }
}
