use std::sync::{mpsc, Arc};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use wordfall::engine::{Engine, EngineConfig, GameOverReason, Phase};
use wordfall::feed::DirectFeed;
use wordfall::runtime::{dispatch, Control, FixedTicker, GameEvent, Runner, TestEventSource};
use wordfall::words::{DeckManager, Language, MemorySource, Tier, WordRecord};

fn key(c: char) -> GameEvent {
    GameEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn engine_over(words: &[&str], config: EngineConfig) -> Engine<DirectFeed> {
    let records = words
        .iter()
        .map(|w| WordRecord::new(*w, Language::En, 2, 10))
        .collect();
    let manager = DeckManager::with_seed(Arc::new(MemorySource::new(records)), 5);
    Engine::new(config, DirectFeed::new(Arc::new(manager)))
}

fn quick() -> EngineConfig {
    EngineConfig {
        spawn_delay: Duration::from_millis(10),
        ..Default::default()
    }
}

// Drives the engine through Runner/TestEventSource without a TTY:
// wait for the spawn, type the word, check the score.
#[test]
fn headless_word_is_typed_and_scored() {
    let mut engine = engine_over(&["cat"], quick());
    let (tx, rx) = mpsc::channel();
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let mut runner = Runner::new(TestEventSource::new(rx), ticker);
    let dt = runner.tick_interval();

    engine.start(Tier::Normal, Language::En);
    let mut sent = false;
    for _ in 0..200u32 {
        let event = runner.step();
        assert_eq!(dispatch(&mut engine, &event, dt), Control::Continue);
        if !sent && engine.active_word().is_some() {
            for c in "cat".chars() {
                tx.send(key(c)).unwrap();
            }
            sent = true;
        }
        if engine.stats().words_typed == 1 {
            break;
        }
    }

    let stats = engine.stats();
    assert_eq!(stats.words_typed, 1);
    assert!(stats.score >= 30, "score was {}", stats.score);
    assert_eq!(stats.errors_count, 0);
    assert_eq!(stats.accuracy, 100.0);
    assert!(engine.is_playing());
}

#[test]
fn headless_untyped_word_escapes_then_enter_restarts() {
    let config = EngineConfig {
        spawn_position: 90.0,
        ..quick()
    };
    let mut engine = engine_over(&["cat"], config);
    let dt = Duration::from_millis(16);

    engine.start(Tier::Hard, Language::En);
    for _ in 0..100 {
        dispatch(&mut engine, &GameEvent::Tick, dt);
        if engine.is_over() {
            break;
        }
    }
    assert_eq!(engine.phase(), &Phase::GameOver(GameOverReason::WordEscaped));
    assert_eq!(engine.stats().errors_count, 1);

    // letters are dropped once the game is over
    dispatch(&mut engine, &key('c'), dt);
    assert_eq!(engine.stats().errors_count, 1);

    let enter = GameEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    dispatch(&mut engine, &enter, dt);
    assert!(engine.is_playing());
    assert_eq!(engine.stats().errors_count, 0);
}

#[test]
fn headless_escape_pauses_and_ctrl_c_quits() {
    let mut engine = engine_over(&["cat"], quick());
    let dt = Duration::from_millis(16);
    engine.start(Tier::Normal, Language::En);

    let esc = GameEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    dispatch(&mut engine, &esc, dt);
    assert!(matches!(engine.phase(), Phase::Paused(_)));
    dispatch(&mut engine, &esc, dt);
    assert!(engine.is_playing());

    let ctrl_c = GameEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert_eq!(dispatch(&mut engine, &ctrl_c, dt), Control::Quit);
    assert_eq!(engine.phase(), &Phase::GameOver(GameOverReason::Stopped));
}

#[test]
fn headless_expert_session_types_backwards() {
    let mut engine = engine_over(&["dune"], quick());
    let dt = Duration::from_millis(16);
    engine.start(Tier::Expert, Language::En);
    while engine.active_word().is_none() {
        dispatch(&mut engine, &GameEvent::Tick, dt);
    }
    for c in "enud".chars() {
        dispatch(&mut engine, &key(c), dt);
    }
    assert_eq!(engine.stats().words_typed, 1);
    assert_eq!(engine.stats().errors_count, 0);
}
