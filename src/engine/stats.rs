use serde::Serialize;

/// Running figures of one game session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSessionStats {
    pub score: u64,
    pub words_typed: u32,
    pub errors_count: u32,
    pub elapsed_seconds: f64,
    /// speed of the most recently spawned word
    pub current_speed: f64,
    pub level: u32,
    /// percentage of accepted keystrokes, rounded
    pub accuracy: f64,
    pub wpm: u32,
    #[serde(skip)]
    accepted_keys: u32,
    #[serde(skip)]
    rejected_keys: u32,
}

impl Default for GameSessionStats {
    fn default() -> Self {
        Self {
            score: 0,
            words_typed: 0,
            errors_count: 0,
            elapsed_seconds: 0.0,
            current_speed: 0.0,
            level: 1,
            accuracy: 100.0,
            wpm: 0,
            accepted_keys: 0,
            rejected_keys: 0,
        }
    }
}

impl GameSessionStats {
    pub fn record_accepted(&mut self) {
        self.accepted_keys += 1;
        self.update_accuracy();
    }

    pub fn record_rejected(&mut self) {
        self.rejected_keys += 1;
        self.errors_count += 1;
        self.update_accuracy();
    }

    /// A word reached the danger line
    pub fn record_escape(&mut self) {
        self.errors_count += 1;
    }

    pub fn record_completion(&mut self, points: u64) {
        self.score += points;
        self.words_typed += 1;
        self.level = self.words_typed / 10 + 1;
        self.update_wpm();
    }

    pub fn add_elapsed(&mut self, secs: f64) {
        self.elapsed_seconds += secs;
    }

    pub fn keystrokes(&self) -> u32 {
        self.accepted_keys + self.rejected_keys
    }

    fn update_accuracy(&mut self) {
        let total = self.keystrokes();
        self.accuracy = if total == 0 {
            100.0
        } else {
            ((self.accepted_keys as f64 / total as f64) * 100.0).round()
        };
    }

    fn update_wpm(&mut self) {
        self.wpm = if self.elapsed_seconds > 0.0 {
            (self.words_typed as f64 / self.elapsed_seconds * 60.0).round() as u32
        } else {
            0
        };
    }
}
