//! Terminal drawing for the `maze-chase` binary.
//!
//! Each tile is two columns wide. Only cells that changed since the last
//! frame are redrawn.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use unicode_width::UnicodeWidthStr;

use maze_chase::constants::ALPHA_BLINK;
use maze_chase::entity::containing_cell;
use maze_chase::ghost::{Ghost, Rgb};
use maze_chase::level::Level;
use maze_chase::maze::{GridPos, Maze, Tile};
use maze_chase::pellets::PelletKind;

const CELL_W: usize = 2;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Player,
    Ghost,
    Frightened,
    Eyes,
    Wall,
    Empty,
    Pellet,
    Power,
    Door,
}

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    glyph: Glyph,
    color: Color,
}

impl Cell {
    const BLANK: Self = Self {
        glyph: Glyph::Empty,
        color: Color::Reset,
    };
}

pub struct Renderer {
    width: usize,
    height: usize,
    last: Vec<Cell>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            last: vec![Cell::BLANK; width * height],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    /// Size changes between levels force a full redraw.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
    }

    pub fn render<M: Maze>(
        &mut self,
        stdout: &mut Stdout,
        level: &Level<M>,
        depth: u32,
        autopilot: bool,
    ) -> io::Result<()> {
        let needed_h = (self.height + 2) as u16;
        let needed_w = (self.width * CELL_W) as u16;

        stdout.queue(MoveTo(0, 0))?;

        let (term_w, term_h) = terminal::size()?;
        if term_w < needed_w || term_h < needed_h {
            stdout.queue(Clear(ClearType::All))?;
            let msg = format!(
                "Terminal too small. Need at least {needed_w}x{needed_h} (cols x rows). Current: {term_w}x{term_h}."
            );
            stdout.queue(Print(msg))?;
            stdout.flush()?;
            self.needs_full = true;
            return Ok(());
        }

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }

        let pellets_left = level.power_pellets().len() + level.score_pellets().len();
        let hud = format!(
            "Score: {}  Lives: {}  Level: {}  Pellets: {}  {}  (a autopilot, q quit)",
            level.player().score(),
            level.lives(),
            depth,
            pellets_left,
            if autopilot { "AUTO" } else { "MANUAL" },
        );
        if self.needs_full || hud != self.last_hud {
            stdout.queue(MoveTo(self.origin_x, self.origin_y - 1))?;
            stdout.queue(SetForegroundColor(Color::White))?;
            stdout.queue(Clear(ClearType::CurrentLine))?;
            stdout.queue(Print(&hud))?;
            stdout.queue(ResetColor)?;
            self.last_hud = hud;
        }

        let frame = compose(level, self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let cell = frame[idx];
                if self.needs_full || cell != self.last[idx] {
                    self.last[idx] = cell;
                    self.draw_cell(stdout, x, y, cell)?;
                }
            }
        }
        self.needs_full = false;

        stdout.flush()
    }

    fn draw_cell(&self, stdout: &mut Stdout, x: usize, y: usize, cell: Cell) -> io::Result<()> {
        let text = match cell.glyph {
            Glyph::Player => "😃",
            Glyph::Ghost => "👻",
            Glyph::Frightened => "😱",
            Glyph::Eyes => "👀",
            Glyph::Wall => "██",
            Glyph::Empty => "  ",
            Glyph::Pellet => "· ",
            Glyph::Power => "● ",
            Glyph::Door => "==",
        };
        let x_pos = self.origin_x + (x * CELL_W) as u16;
        let y_pos = self.origin_y + y as u16;
        stdout.queue(MoveTo(x_pos, y_pos))?;
        stdout.queue(SetForegroundColor(cell.color))?;
        stdout.queue(Print(text))?;
        let w = UnicodeWidthStr::width(text);
        for _ in w..CELL_W {
            stdout.queue(Print(' '))?;
        }
        stdout.queue(ResetColor)?;
        Ok(())
    }

    pub fn render_game_over<M: Maze>(&self, stdout: &mut Stdout, level: &Level<M>) -> io::Result<()> {
        stdout.queue(MoveTo(self.origin_x, self.origin_y + self.height as u16))?;
        stdout.queue(Print(format!(
            "GAME OVER - Final Score: {} (press q to quit)",
            level.player().score()
        )))?;
        stdout.flush()?;
        loop {
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Lays out one frame: tiles, then pellets, then ghosts, then the player on top.
fn compose<M: Maze>(level: &Level<M>, width: usize, height: usize) -> Vec<Cell> {
    let maze = level.maze();
    let mut frame = vec![Cell::BLANK; width * height];
    let index = |pos: GridPos| -> Option<usize> {
        let (x, y) = (usize::try_from(pos.x).ok()?, usize::try_from(pos.y).ok()?);
        (x < width && y < height).then_some(y * width + x)
    };

    for y in 0..height {
        for x in 0..width {
            let pos = GridPos::new(x as i32, y as i32);
            frame[y * width + x] = tile_cell(maze.tile(pos));
        }
    }
    for pellet in level.score_pellets().iter().chain(level.power_pellets().iter()) {
        if let Some(idx) = index(pellet.pos) {
            frame[idx] = match pellet.kind {
                PelletKind::Score => Cell {
                    glyph: Glyph::Pellet,
                    color: Color::White,
                },
                PelletKind::Power => Cell {
                    glyph: Glyph::Power,
                    color: Color::Magenta,
                },
            };
        }
    }

    let cell_size = level.config().cell_size;
    let fps = level.config().fps;
    for ghost in level.ghosts() {
        if let Some(idx) = index(containing_cell(ghost.body().pixel(), cell_size)) {
            frame[idx] = ghost_cell(ghost, fps);
        }
    }
    if let Some(idx) = index(containing_cell(level.player().body().pixel(), cell_size)) {
        frame[idx] = Cell {
            glyph: Glyph::Player,
            color: Color::Yellow,
        };
    }
    frame
}

fn tile_cell(tile: Tile) -> Cell {
    match tile {
        Tile::Boundary | Tile::Wall => Cell {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Tile::Door => Cell {
            glyph: Glyph::Door,
            color: Color::Cyan,
        },
        Tile::Path | Tile::PowerPellet | Tile::GhostSpawn => Cell::BLANK,
    }
}

fn ghost_cell(ghost: &Ghost, fps: u32) -> Cell {
    if ghost.is_returning() {
        return Cell {
            glyph: Glyph::Eyes,
            color: Color::White,
        };
    }
    if ghost.is_vulnerable() {
        let color = if ghost.alpha(fps) == ALPHA_BLINK {
            Color::White
        } else {
            Color::Blue
        };
        return Cell {
            glyph: Glyph::Frightened,
            color,
        };
    }
    let Rgb(r, g, b) = ghost.color();
    Cell {
        glyph: Glyph::Ghost,
        color: Color::Rgb { r, g, b },
    }
}
