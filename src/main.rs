//! Arcade simulator entry point
//!
//! Runs one headless match driven by the autoplay bot and prints the final
//! snapshot plus the progression record. The browser build enters through
//! the library's wasm start function instead.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::error::Error;
    use std::path::PathBuf;

    use arcade_runtime::autoplay::Autoplay;
    use arcade_runtime::persistence::{FileStore, KvStore, MemoryStore};
    use arcade_runtime::{Arcade, GameKind, Screen, Settings};
    use clap::Parser;
    use serde::Serialize;

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Play one arcade match headless with the autoplay bot")]
    pub struct Cli {
        /// Game to play (catch, gallery, basketball, batting, dice, snake, beach-ball, arm-wrestle, tunnel)
        #[arg(long, default_value = "catch")]
        game: String,
        #[arg(long, default_value_t = 0)]
        opponent: usize,
        #[arg(long, default_value_t = 1)]
        level: u8,
        #[arg(long)]
        seed: Option<u64>,
        /// Give up after this many simulated seconds
        #[arg(long, default_value_t = 300)]
        max_secs: u32,
        /// Persist progression as JSON files here (in-memory otherwise)
        #[arg(long)]
        store_dir: Option<PathBuf>,
        #[arg(long)]
        unlock_all: bool,
        /// Bot accuracy, 0..1
        #[arg(long, default_value_t = 0.8)]
        skill: f32,
        /// Print a single JSON document instead of text
        #[arg(long)]
        json: bool,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct RunOutput<'a> {
        finished: bool,
        ticks: u64,
        report: Option<&'a arcade_runtime::MatchReport>,
        snapshot: Option<arcade_runtime::Snapshot>,
        progression: &'a arcade_runtime::ProgressionRecord,
    }

    pub fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
        let game = GameKind::from_name(&cli.game).ok_or_else(|| format!("unknown game {:?}", cli.game))?;

        let store: Box<dyn KvStore> = match &cli.store_dir {
            Some(dir) => Box::new(FileStore::open(dir)?),
            None => Box::new(MemoryStore::new()),
        };
        let mut settings = Settings::load(store.as_ref());
        if cli.seed.is_some() {
            settings.seed = cli.seed;
        }
        settings.unlock_all |= cli.unlock_all;
        let tick_hz = settings.tick_hz;

        let mut arcade = Arcade::with_settings(store, settings);
        arcade.start_match(game, cli.opponent, cli.level)?;

        let mut bot = Autoplay::new(cli.skill, cli.seed.unwrap_or(0));
        let max_ticks = u64::from(cli.max_secs) * u64::from(tick_hz);
        let mut ticks = 0;
        while arcade.is_playing() && ticks < max_ticks {
            arcade.on_tick();
            ticks += 1;
            if let Some(event) = arcade.snapshot().and_then(|s| bot.choose(&s)) {
                if let Err(rejected) = arcade.on_input(&event) {
                    log::debug!("Bot input {event:?} rejected: {rejected}");
                }
            }
            for event in arcade.drain_events() {
                log::debug!("{event:?}");
            }
        }

        let finished = matches!(arcade.screen(), Screen::Report(_));
        if !finished {
            log::warn!("Match still running after {} s", cli.max_secs);
        }

        let output = RunOutput {
            finished,
            ticks,
            report: arcade.report(),
            snapshot: arcade.snapshot(),
            progression: arcade.ledger(game).record(),
        };

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        match output.report {
            Some(report) => {
                println!("{game} vs opponent {} level {}", report.opponent, report.level);
                println!("Result: {:?}", report.result);
                println!("Score: {} (target {})", report.score, report.target);
                println!("Best combo: {}", report.best_combo);
                println!("Star points: +{} -> {} ({} stars)", report.points_earned, report.star_points, report.stars);
                if report.unlocked_next {
                    println!("Next opponent unlocked!");
                }
            }
            None => println!("{game}: no result after {ticks} ticks"),
        }
        let record = output.progression;
        println!("Runs: {}, wins: {}", record.total_runs, record.total_wins);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::init();
    log::info!("Arcade simulator starting...");

    if let Err(err) = cli::run(cli::Cli::parse()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser build starts from arcade_runtime::web::start
}
