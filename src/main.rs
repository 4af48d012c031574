//! Terminal front end for the maze chase simulation.
mod render;

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use maze_chase::config::SimConfig;
use maze_chase::constants::{DEFAULT_FPS, DEFAULT_GRID_H, DEFAULT_GRID_W};
use maze_chase::level::{Control, Level, TickEvent};
use maze_chase::maze::generate::generate_maze;
use maze_chase::maze::{Dir, Maze, TileGrid};
use render::Renderer;

const INPUT_HOLD_MS: u64 = 160;
const FRAME_MS: u64 = 8;

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal maze chase", long_about = None)]
struct Args {
    /// Maze width in tiles (generated mazes only)
    #[arg(long, default_value_t = DEFAULT_GRID_W)]
    width: i32,

    /// Maze height in tiles (generated mazes only)
    #[arg(long, default_value_t = DEFAULT_GRID_H)]
    height: i32,

    /// Simulation ticks per second of game time
    #[arg(long, env = "MAZE_CHASE_FPS", default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Wall-clock milliseconds per tick, defaults to 1000 / fps
    #[arg(long, env = "MAZE_CHASE_TICK_MS")]
    tick_ms: Option<u64>,

    /// Seed for maze generation and every random choice
    #[arg(long, env = "MAZE_CHASE_SEED")]
    seed: Option<u64>,

    /// Let the built-in agent steer
    #[arg(long, default_value_t = false)]
    autopilot: bool,

    /// Read the maze from a text file instead of generating one
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Run this many ticks without a terminal and print the result
    #[arg(long)]
    headless: Option<u64>,
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        SimConfig {
            fps: self.fps,
            seed: self.seed,
            ..SimConfig::default()
        }
    }

    fn tick_interval(&self) -> Duration {
        let ms = self
            .tick_ms
            .filter(|ms| *ms > 0)
            .unwrap_or(1000 / u64::from(self.fps.max(1)));
        Duration::from_millis(ms.max(1))
    }
}

/// Supplies one maze per level: the same parsed layout every time, or a
/// fresh random one.
enum MazeSource {
    Layout(TileGrid),
    Generated { rng: StdRng, width: i32, height: i32 },
}

impl MazeSource {
    fn from_args(args: &Args) -> Result<Self> {
        if let Some(path) = &args.layout {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading layout {}", path.display()))?;
            let grid = TileGrid::parse(&text)
                .with_context(|| format!("parsing layout {}", path.display()))?;
            return Ok(Self::Layout(grid));
        }
        let rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::Generated {
            rng,
            width: args.width,
            height: args.height,
        })
    }

    fn next_maze(&mut self) -> Result<TileGrid> {
        match self {
            Self::Layout(grid) => Ok(grid.clone()),
            Self::Generated { rng, width, height } => {
                generate_maze(rng, *width, *height).context("generating maze")
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = setup_logging()?;

    let mut source = MazeSource::from_args(&args)?;
    let level = Level::new(source.next_maze()?, args.sim_config()).context("starting level")?;
    info!(?args, "starting");

    if let Some(ticks) = args.headless {
        return run_headless(level, &mut source, ticks);
    }

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &args, level, &mut source);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

/// Log to a file; the terminal belongs to the game while it runs.
fn setup_logging() -> Result<WorkerGuard> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "maze-chase.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_env("MAZE_CHASE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    info!("Log file: {}/maze-chase.log", log_dir.display());
    Ok(guard)
}

fn log_directory() -> PathBuf {
    if let Some(xdg_cache) = std::env::var_os("XDG_CACHE_HOME") {
        return PathBuf::from(xdg_cache).join("maze-chase");
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".cache").join("maze-chase");
    }
    std::env::temp_dir().join("maze-chase")
}

fn run_headless(mut level: Level<TileGrid>, source: &mut MazeSource, ticks: u64) -> Result<()> {
    let mut depth = 1;
    for _ in 0..ticks {
        let events = level.tick(Control::Autopilot);
        if events.iter().any(|event| matches!(event, TickEvent::Cleared { .. })) {
            level = level.next_level(source.next_maze()?)?;
            depth += 1;
        }
        if level.is_over() {
            break;
        }
    }
    println!(
        "score {} lives {} level {} ticks {}",
        level.player().score(),
        level.lives(),
        depth,
        level.ticks()
    );
    Ok(())
}

fn run(
    stdout: &mut Stdout,
    args: &Args,
    mut level: Level<TileGrid>,
    source: &mut MazeSource,
) -> Result<()> {
    let tick_interval = args.tick_interval();
    let frame_time = Duration::from_millis(FRAME_MS);
    let mut renderer = Renderer::new(level.maze().width() as usize, level.maze().height() as usize);
    let mut keys = HeldKeys::default();
    let mut autopilot = args.autopilot;
    let mut depth = 1;
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('a') if key.kind == KeyEventKind::Press => {
                    autopilot = !autopilot;
                    info!(autopilot, "control switched");
                }
                KeyCode::Char('k') | KeyCode::Up => keys.press(Dir::Up),
                KeyCode::Char('j') | KeyCode::Down => keys.press(Dir::Down),
                KeyCode::Char('h') | KeyCode::Left => keys.press(Dir::Left),
                KeyCode::Char('l') | KeyCode::Right => keys.press(Dir::Right),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_interval {
            last_tick = Instant::now();
            let control = if autopilot {
                Control::Autopilot
            } else {
                Control::Manual(keys.active())
            };

            let events = level.tick(control);
            let spent = last_tick.elapsed();
            if spent > tick_interval {
                warn!(?spent, budget = ?tick_interval, "slow tick");
            }

            if events.iter().any(|event| matches!(event, TickEvent::Cleared { .. })) {
                level = level.next_level(source.next_maze()?)?;
                depth += 1;
                renderer.resize(level.maze().width() as usize, level.maze().height() as usize);
            }
            renderer.render(stdout, &level, depth, autopilot)?;
            if level.is_over() {
                renderer.render_game_over(stdout, &level)?;
                return Ok(());
            }
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

/// Terminals report key presses but not releases, so a direction counts as
/// held while it keeps repeating within [`INPUT_HOLD_MS`].
#[derive(Default)]
struct HeldKeys {
    last_seen: [Option<Instant>; 4],
    last_pressed: Option<Dir>,
}

impl HeldKeys {
    const ORDER: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    fn slot(dir: Dir) -> usize {
        match dir {
            Dir::Up => 0,
            Dir::Down => 1,
            Dir::Left => 2,
            Dir::Right => 3,
        }
    }

    fn press(&mut self, dir: Dir) {
        self.last_seen[Self::slot(dir)] = Some(Instant::now());
        self.last_pressed = Some(dir);
    }

    fn active(&self) -> Option<Dir> {
        let now = Instant::now();
        let hold = Duration::from_millis(INPUT_HOLD_MS);
        let fresh = |dir: Dir| {
            self.last_seen[Self::slot(dir)].filter(|seen| now.duration_since(*seen) <= hold)
        };

        if let Some(dir) = self.last_pressed {
            if fresh(dir).is_some() {
                return Some(dir);
            }
        }
        Self::ORDER
            .into_iter()
            .filter_map(|dir| fresh(dir).map(|seen| (dir, seen)))
            .max_by_key(|(_, seen)| *seen)
            .map(|(dir, _)| dir)
    }
}
