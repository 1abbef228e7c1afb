use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::engine::{Engine, Phase};
use crate::feed::WordFeed;

/// Unified event type consumed by the game loop
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => GameEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => GameEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Serializes keystrokes and ticks into one stream. Ticks keep their cadence
/// regardless of how many keys arrive in between.
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    next_tick: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        let next_tick = Instant::now() + ticker.interval();
        Self {
            event_source,
            ticker,
            next_tick,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.ticker.interval()
    }

    /// Blocks until the next event or the next tick, whichever comes first
    pub fn step(&mut self) -> GameEvent {
        let now = Instant::now();
        if now >= self.next_tick {
            self.next_tick = now + self.ticker.interval();
            return GameEvent::Tick;
        }
        let wait = self.next_tick - now;
        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => {
                self.next_tick = Instant::now() + self.ticker.interval();
                GameEvent::Tick
            }
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(wait);
                self.next_tick = Instant::now() + self.ticker.interval();
                GameEvent::Tick
            }
        }
    }
}

/// What a key press asks of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Type(char),
    Backspace,
    TogglePause,
    Restart,
    Quit,
    Nothing,
}

pub fn command_for(key: &KeyEvent) -> Command {
    if key.kind == KeyEventKind::Release {
        return Command::Nothing;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Command::Quit,
        KeyCode::Char(c) if !ctrl => Command::Type(c),
        KeyCode::Backspace => Command::Backspace,
        KeyCode::Esc => Command::TogglePause,
        KeyCode::Enter => Command::Restart,
        _ => Command::Nothing,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Apply one event to the engine. `dt` is the time a tick stands for.
///
/// Enter restarts only once a session is over; letters typed while paused
/// or over are dropped.
pub fn dispatch<F: WordFeed>(engine: &mut Engine<F>, event: &GameEvent, dt: Duration) -> Control {
    match event {
        GameEvent::Tick => {
            engine.tick(dt);
        }
        GameEvent::Resize => {}
        GameEvent::Key(key) => match command_for(key) {
            Command::Quit => {
                engine.stop();
                return Control::Quit;
            }
            Command::Type(c) => {
                engine.key(c);
            }
            Command::Backspace => {
                engine.backspace();
            }
            Command::TogglePause => {
                engine.toggle_pause();
            }
            Command::Restart => {
                if let &Phase::GameOver(reason) = engine.phase() {
                    debug!(?reason, "restarting after game over");
                    engine.restart();
                }
            }
            Command::Nothing => {}
        },
    }
    Control::Continue
}
