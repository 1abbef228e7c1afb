use serde::Serialize;

use crate::words::Tier;

/// Direction in which the letters of a word must be typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputMode {
    LeftToRight,
    /// last letter first; the remaining text shrinks from its right edge
    RightToLeft,
}

impl InputMode {
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Expert => InputMode::RightToLeft,
            _ => InputMode::LeftToRight,
        }
    }
}

/// Result of matching one keystroke against the active word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    Accepted,
    Rejected { expected: char },
    Completed,
}

/// Case-insensitive letter comparison
pub fn same_letter(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// The word currently descending the play-field
#[derive(Debug, Clone, PartialEq)]
pub struct FallingWord {
    pub id: u64,
    pub original: String,
    letters: Vec<char>,
    typed: usize,
    /// percent of the play-field height, 0 at the top
    pub position: f64,
    pub speed: f64,
    pub mode: InputMode,
}

impl FallingWord {
    pub fn new(id: u64, text: &str, position: f64, speed: f64, mode: InputMode) -> Self {
        Self {
            id,
            original: text.to_string(),
            letters: text.chars().collect(),
            typed: 0,
            position,
            speed,
            mode,
        }
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn typed_count(&self) -> usize {
        self.typed
    }

    /// Letters accepted so far, in their order within the word
    pub fn typed_text(&self) -> String {
        match self.mode {
            InputMode::LeftToRight => self.letters[..self.typed].iter().collect(),
            InputMode::RightToLeft => self.letters[self.len() - self.typed..].iter().collect(),
        }
    }

    /// Letters still to be typed, as displayed
    pub fn remaining_text(&self) -> String {
        match self.mode {
            InputMode::LeftToRight => self.letters[self.typed..].iter().collect(),
            InputMode::RightToLeft => self.letters[..self.len() - self.typed].iter().collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.typed >= self.letters.len()
    }

    /// Letter the next keystroke must match
    pub fn expected(&self) -> Option<char> {
        if self.is_complete() {
            return None;
        }
        let idx = match self.mode {
            InputMode::LeftToRight => self.typed,
            InputMode::RightToLeft => self.len() - 1 - self.typed,
        };
        Some(self.letters[idx])
    }

    pub fn type_char(&mut self, c: char) -> Match {
        let Some(expected) = self.expected() else {
            return Match::Completed;
        };
        if !same_letter(c, expected) {
            return Match::Rejected { expected };
        }
        self.typed += 1;
        if self.is_complete() {
            Match::Completed
        } else {
            Match::Accepted
        }
    }

    /// Give back the last accepted letter. Returns false when nothing was typed.
    pub fn backspace(&mut self) -> bool {
        if self.typed == 0 {
            return false;
        }
        self.typed -= 1;
        true
    }

    pub fn advance(&mut self) {
        self.position += self.speed;
    }
}
