use std::collections::BTreeSet;

use super::Tier;

/// Length and frequency rules applied when building a deck for a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyProfile {
    pub tier: Tier,
    pub base_lengths: &'static [usize],
    /// joins the filter once the player reaches `unlock_level`
    pub progressive_lengths: &'static [usize],
    pub unlock_level: u32,
    pub allowed_tiers: &'static [u8],
    pub frequency_floor: u32,
}

const EASY: DifficultyProfile = DifficultyProfile {
    tier: Tier::Easy,
    base_lengths: &[2, 3, 4],
    progressive_lengths: &[5],
    unlock_level: 4,
    allowed_tiers: &[1],
    frequency_floor: 2,
};

const NORMAL: DifficultyProfile = DifficultyProfile {
    tier: Tier::Normal,
    base_lengths: &[3, 4, 5, 6],
    progressive_lengths: &[7],
    unlock_level: 4,
    allowed_tiers: &[1, 2],
    frequency_floor: 1,
};

const HARD: DifficultyProfile = DifficultyProfile {
    tier: Tier::Hard,
    base_lengths: &[4, 5, 6, 7],
    progressive_lengths: &[8],
    unlock_level: 4,
    allowed_tiers: &[2, 3],
    frequency_floor: 1,
};

const EXPERT: DifficultyProfile = DifficultyProfile {
    tier: Tier::Expert,
    base_lengths: &[3, 4, 5],
    progressive_lengths: &[6, 7, 8],
    unlock_level: 4,
    allowed_tiers: &[2, 3, 4],
    frequency_floor: 1,
};

impl DifficultyProfile {
    pub fn for_tier(tier: Tier) -> &'static DifficultyProfile {
        match tier {
            Tier::Easy => &EASY,
            Tier::Normal => &NORMAL,
            Tier::Hard => &HARD,
            Tier::Expert => &EXPERT,
        }
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        level >= self.unlock_level
    }

    /// Word lengths eligible at `level`
    pub fn lengths_for_level(&self, level: u32) -> BTreeSet<usize> {
        let mut lengths: BTreeSet<usize> = self.base_lengths.iter().copied().collect();
        if self.is_unlocked(level) {
            lengths.extend(self.progressive_lengths.iter().copied());
        }
        lengths
    }

    pub fn allowed_tier_set(&self) -> BTreeSet<u8> {
        self.allowed_tiers.iter().copied().collect()
    }
}
