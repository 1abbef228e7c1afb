use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::error;

use super::{profile::DifficultyProfile, Language, Tier, WordRecord};

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

const FALLBACK_FILE: &str = "fallback.json";
const FALLBACK_FREQUENCY: u32 = 5;

/// Embedded per-language, per-tier word lists used when the store has nothing
#[derive(Deserialize, Debug, Default)]
struct FallbackLists(HashMap<Language, HashMap<Tier, Vec<String>>>);

fn lists() -> &'static FallbackLists {
    static LISTS: OnceLock<FallbackLists> = OnceLock::new();
    LISTS.get_or_init(|| {
        let parsed = LANG_DIR
            .get_file(FALLBACK_FILE)
            .and_then(|file| file.contents_utf8())
            .map(serde_json::from_str::<FallbackLists>);
        match parsed {
            Some(Ok(lists)) => lists,
            Some(Err(e)) => {
                error!("embedded fallback word lists are malformed: {e}");
                FallbackLists::default()
            }
            None => {
                error!("embedded fallback word lists are missing");
                FallbackLists::default()
            }
        }
    })
}

/// Static words for `language`/`tier`. Never empty.
pub fn fallback_words(tier: Tier, language: Language) -> Vec<WordRecord> {
    let profile = DifficultyProfile::for_tier(tier);
    let word_tier = profile.allowed_tiers.first().copied().unwrap_or(1);
    let frequency = FALLBACK_FREQUENCY.max(profile.frequency_floor);

    let texts = lists()
        .0
        .get(&language)
        .and_then(|by_tier| by_tier.get(&tier))
        .filter(|words| !words.is_empty())
        .or_else(|| {
            lists()
                .0
                .get(&Language::Fr)
                .and_then(|by_tier| by_tier.get(&Tier::Normal))
        });

    match texts {
        Some(texts) if !texts.is_empty() => texts
            .iter()
            .map(|t| WordRecord::new(t.as_str(), language, word_tier, frequency))
            .collect(),
        _ => vec![WordRecord::new("mot", language, word_tier, frequency)],
    }
}
