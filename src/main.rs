use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    tty::IsTty,
};
use serde::Serialize;
use std::{
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{info, warn};

use wordfall::{
    config::{Config, ConfigStore, FileConfigStore},
    engine::{Engine, GameOverReason, Phase, Slot},
    feed::{ThreadedFeed, WordFeed},
    logging,
    runtime::{dispatch, Control, CrosstermEventSource, FixedTicker, GameEvent, Runner},
    scores::{HighScore, HighScoreDb},
    service::WordService,
    words::{Language, Tier},
};

/// falling-word typing game with no-repeat word decks
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// more logging (-v info, -vv debug, -vvv trace); WORDFALL_LOG overrides
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// config file (defaults to the platform config dir)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite word corpus
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// SQLite high-score board
    #[clap(long, global = true)]
    scores_db: Option<PathBuf>,

    /// fixed shuffle seed
    #[clap(long, global = true)]
    seed: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct DeckArgs {
    /// easy, normal, hard or expert
    #[clap(short, long)]
    tier: String,

    /// fr or en (default fr)
    #[clap(short, long)]
    language: Option<String>,

    /// 1-100 (default 1)
    #[clap(long, allow_negative_numbers = true)]
    level: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the next word of a deck as JSON
    Next(DeckArgs),
    /// print several consecutive words as JSON
    Batch {
        #[clap(flatten)]
        deck: DeckArgs,
        /// 1-50 (default 10)
        #[clap(short, long, allow_negative_numbers = true)]
        count: Option<i64>,
    },
    /// reshuffle a deck and print its progress
    Restart(DeckArgs),
    /// print a deck's progress as JSON
    Stats(DeckArgs),
    /// show or clear the high-score boards
    Scores {
        #[clap(short, long, value_enum)]
        tier: Option<Tier>,
        #[clap(short, long, value_enum)]
        language: Option<Language>,
        /// remove the selected boards instead of listing them
        #[clap(long)]
        clear: bool,
        /// per-tier game totals instead of the boards
        #[clap(long)]
        summary: bool,
    },
    /// play in the terminal
    Play {
        #[clap(short, long, value_enum)]
        tier: Option<Tier>,
        #[clap(short, long, value_enum)]
        language: Option<Language>,
        /// name recorded on the high-score board
        #[clap(short, long)]
        player: Option<String>,
        /// allow correcting the last letter
        #[clap(long)]
        backspace: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).context("installing log subscriber")?;

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut cfg = store.load();
    if cli.db.is_some() {
        cfg.database_path = cli.db.clone();
    }
    if cli.scores_db.is_some() {
        cfg.scores_path = cli.scores_db.clone();
    }
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }

    match cli.command {
        Command::Next(args) => {
            let svc = service(&cfg);
            print_json(&svc.next_word(&args.tier, args.language.as_deref(), args.level)?)
        }
        Command::Batch { deck, count } => {
            let svc = service(&cfg);
            let words =
                svc.batch_words(&deck.tier, deck.language.as_deref(), deck.level, count)?;
            print_json(&words)
        }
        Command::Restart(args) => {
            let svc = service(&cfg);
            print_json(&svc.restart(&args.tier, args.language.as_deref(), args.level)?)
        }
        Command::Stats(args) => {
            let svc = service(&cfg);
            print_json(&svc.list_stats(&args.tier, args.language.as_deref(), args.level)?)
        }
        Command::Scores {
            tier,
            language,
            clear,
            summary,
        } => scores(&cfg, tier, language, clear, summary),
        Command::Play {
            tier,
            language,
            player,
            backspace,
        } => {
            if backspace {
                cfg.allow_backspace = true;
            }
            play(
                &cfg,
                tier.unwrap_or(cfg.tier),
                language.unwrap_or(cfg.language),
                player,
            )
        }
    }
}

fn service(cfg: &Config) -> WordService {
    WordService::new(Arc::new(cfg.deck_manager()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn scores(
    cfg: &Config,
    tier: Option<Tier>,
    language: Option<Language>,
    clear: bool,
    summary: bool,
) -> anyhow::Result<()> {
    let path = cfg.scores_db();
    let db = HighScoreDb::open(&path)
        .with_context(|| format!("opening high scores at {}", path.display()))?;

    if summary {
        if clear {
            println!("reset {} tier total(s)", db.reset_totals()?);
            return Ok(());
        }
        for s in db.summaries()? {
            if tier.is_some_and(|t| t != s.tier) {
                continue;
            }
            println!(
                "{:<7} {:>4} games  avg score {:>7.1}  {:>5} words  {:>5.1} wpm",
                s.tier.to_string(),
                s.games,
                s.average_score,
                s.total_words,
                s.average_wpm,
            );
        }
        return Ok(());
    }

    if clear {
        let removed = db.clear(language, tier)?;
        println!("removed {removed} score(s)");
        return Ok(());
    }

    let languages = language.map_or(Language::ALL.to_vec(), |l| vec![l]);
    let tiers = tier.map_or(Tier::ALL.to_vec(), |t| vec![t]);
    for language in &languages {
        for tier in &tiers {
            let board = db.top(*language, *tier)?;
            println!("{language} {tier}");
            if board.is_empty() {
                println!("  -");
            }
            for (rank, s) in board.iter().enumerate() {
                println!(
                    "  {}. {:<12} {:>6}  {:>3} wpm  {:>3}%  {} words  {}",
                    rank + 1,
                    s.player,
                    s.score,
                    s.wpm,
                    s.accuracy,
                    s.words_typed,
                    s.date.format("%Y-%m-%d"),
                );
            }
        }
    }
    Ok(())
}

fn play(
    cfg: &Config,
    tier: Tier,
    language: Language,
    player: Option<String>,
) -> anyhow::Result<()> {
    if !stdin().is_tty() {
        bail!("play needs an interactive terminal");
    }

    let manager = Arc::new(cfg.deck_manager());
    manager.prewarm(tier, language);
    let mut engine = Engine::new(cfg.engine_config(), ThreadedFeed::new(manager));

    let mut board = match HighScoreDb::open(cfg.scores_db()) {
        Ok(db) => Some(db),
        Err(e) => {
            warn!(error = %e, "high scores unavailable");
            None
        }
    };
    let player = player
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "player".to_string());

    enable_raw_mode()?;
    let result = run_session(&mut engine, cfg.tick_rate(), tier, language, |engine| {
        if let Some(db) = board.as_mut() {
            record_score(db, engine, &player, tier, language);
        }
    });
    disable_raw_mode()?;
    println!();
    result?;

    let stats = engine.stats();
    println!(
        "score {}  words {}  errors {}  wpm {}  accuracy {}%",
        stats.score, stats.words_typed, stats.errors_count, stats.wpm, stats.accuracy
    );
    Ok(())
}

/// Drive the engine until the player quits. `on_game_over` runs once per finished session.
fn run_session<F: WordFeed>(
    engine: &mut Engine<F>,
    tick_rate: Duration,
    tier: Tier,
    language: Language,
    mut on_game_over: impl FnMut(&Engine<F>),
) -> anyhow::Result<()> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick_rate));
    let mut out = io::stdout();
    let mut last_tick = Instant::now();
    let mut reported = false;

    engine.start(tier, language);
    loop {
        let event = runner.step();
        let dt = match event {
            GameEvent::Tick => {
                let now = Instant::now();
                let dt = now - last_tick;
                last_tick = now;
                dt
            }
            _ => Duration::ZERO,
        };
        if dispatch(engine, &event, dt) == Control::Quit {
            break;
        }

        match (engine.is_over(), reported) {
            (true, false) => {
                on_game_over(engine);
                reported = true;
            }
            (false, true) => reported = false,
            _ => {}
        }

        queue!(
            out,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(status_line(engine))
        )?;
        out.flush()?;
    }

    if !reported {
        on_game_over(engine);
    }
    Ok(())
}

fn record_score<F: WordFeed>(
    db: &mut HighScoreDb,
    engine: &Engine<F>,
    player: &str,
    tier: Tier,
    language: Language,
) {
    let stats = engine.stats();
    if stats.words_typed == 0 {
        return;
    }
    let entry = HighScore::from_session(player, stats, tier, language);
    if let Err(e) = db.record_game(&entry) {
        warn!(error = %e, "could not update game totals");
    }
    match db.is_high_score(stats.score, language, tier) {
        Ok(true) => {
            if let Err(e) = db.add(&entry) {
                warn!(error = %e, "could not save high score");
            } else {
                info!(score = stats.score, "new high score");
            }
        }
        Ok(false) => {}
        Err(e) => warn!(error = %e, "could not read high scores"),
    }
}

fn status_line<F: WordFeed>(engine: &Engine<F>) -> String {
    let s = engine.stats();
    let head = format!(
        "score {}  lvl {}  speed {:.1}  acc {}%",
        s.score, s.level, s.current_speed, s.accuracy
    );
    let tail = match engine.phase() {
        Phase::Idle => "idle".to_string(),
        Phase::Paused(_) => "paused (esc to resume)".to_string(),
        Phase::GameOver(GameOverReason::WordEscaped) => {
            "game over: a word escaped (enter to retry, ctrl-c to quit)".to_string()
        }
        Phase::GameOver(GameOverReason::Stopped) => "stopped".to_string(),
        Phase::Playing(round) => match &round.slot {
            Slot::Waiting { .. } => "...".to_string(),
            Slot::Active(word) => format!(
                "[{}|{}] {:>3.0}%",
                word.typed_text(),
                word.remaining_text(),
                word.position
            ),
        },
    };
    format!("{head}  |  {tail}")
}
