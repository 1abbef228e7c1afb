use crate::words::Tier;

/// Fall speed of the first word, in play-field units per tick
pub const BASE_SPEED: f64 = 0.3;
pub const SPEED_INCREMENT: f64 = 0.1;

/// Words typed between two speed steps
pub fn speed_interval(tier: Tier) -> u32 {
    match tier {
        Tier::Easy => 10,
        Tier::Normal => 5,
        Tier::Hard => 5,
        Tier::Expert => 10,
    }
}

/// Speed given to the next spawned word
pub fn current_speed(tier: Tier, words_typed: u32) -> f64 {
    let steps = words_typed / speed_interval(tier);
    BASE_SPEED + steps as f64 * SPEED_INCREMENT
}
