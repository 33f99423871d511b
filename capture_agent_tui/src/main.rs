use anyhow::{Context, Result};
use capture_agent_core::{
    Position, Team,
    config::TeamConfig,
    environment::CaptureState,
    game::{CaptureGame, MoveResult, Outcome},
    layout::{DEFAULT_LAYOUT, Layout as Maze},
    state::GameState,
};
use clap::Parser;
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Watch two reflex-agent teams play capture", long_about = None)]
struct Args {
    /// Layout file to load (built-in maze when omitted)
    #[arg(short, long, value_name = "LAYOUT_FILE")]
    layout: Option<PathBuf>,

    /// TOML team config applied to red
    #[arg(long, value_name = "CONFIG_FILE")]
    red_config: Option<PathBuf>,

    /// TOML team config applied to blue
    #[arg(long, value_name = "CONFIG_FILE")]
    blue_config: Option<PathBuf>,

    /// Overrides the seed of both teams (blue gets seed + 1)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Milliseconds between moves
    #[arg(short, long, default_value_t = 120)]
    tick_ms: u64,

    /// Moves before the game is called
    #[arg(long, default_value_t = capture_agent_core::game::DEFAULT_MOVE_LIMIT)]
    move_limit: usize,

    /// Where tracing output goes; the terminal is busy with the board
    #[arg(long, value_name = "LOG_FILE", default_value = "capture_agent.log")]
    log_file: PathBuf,
}

struct App {
    /// The running game.
    game: CaptureGame,
    /// Most recent move, shown in the status line.
    last_move: Option<MoveResult>,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Stops stepping while set.
    paused: bool,
}

impl App {
    fn new(game: CaptureGame) -> Self {
        App {
            game,
            last_move: None,
            should_quit: false,
            paused: false,
        }
    }

    /// Handles one move of the game.
    fn tick(&mut self) {
        if self.paused || matches!(self.last_move, Some(MoveResult::Over(_))) {
            return;
        }
        self.last_move = Some(self.game.step());
    }

    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<TeamConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            TeamConfig::from_toml_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(TeamConfig::default()),
    }
}

fn init_logging(path: &PathBuf) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("capture_agent_core=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let layout_text = match &args.layout {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading layout {}", path.display()))?,
        None => DEFAULT_LAYOUT.to_string(),
    };
    let layout: Maze = layout_text.parse().context("parsing layout")?;

    let mut red = load_config(args.red_config.as_ref())?;
    let mut blue = load_config(args.blue_config.as_ref())?;
    if let Some(seed) = args.seed {
        red.seed = seed;
        blue.seed = seed.wrapping_add(1);
    }

    let game = CaptureGame::from_layout(&layout, &red, &blue).with_move_limit(args.move_limit);
    tracing::info!(
        width = layout.width(),
        height = layout.height(),
        agents = game.agents.len(),
        "starting game"
    );

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    let mut app = App::new(game);
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));

    // Restore the terminal state even if the loop failed
    restore_terminal(&mut terminal)?;
    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    KeyCode::Char(' ') => app.paused = !app.paused,
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(70), // Area for the maze
            Constraint::Percentage(20), // Area for agents
            Constraint::Percentage(10), // Area for status/help
        ])
        .split(frame.area());

    render_map(frame, main_layout[0], &app.game.state);
    render_agents(frame, main_layout[1], &app.game.state);

    let status = match app.last_move {
        Some(MoveResult::Over(Outcome::Winner(team))) => format!("{team:?} wins!"),
        Some(MoveResult::Over(Outcome::Tie)) => "Tie game.".to_string(),
        Some(MoveResult::Played { agent, action }) => format!("Agent {agent} played {action:?}"),
        Some(MoveResult::FellBack { agent, action }) => {
            format!("Agent {agent} fell back to {action:?}")
        }
        None => "Ready.".to_string(),
    };
    let help_text = Paragraph::new(format!(
        "Red {}  |  move {}/{}  |  {}{}  |  space pauses, 'q' or 'Esc' quits",
        app.game.state.score(Team::Red),
        app.game.moves_played,
        app.game.move_limit,
        status,
        if app.paused { " (paused)" } else { "" },
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn team_color(team: Team) -> Color {
    match team {
        Team::Red => Color::Red,
        Team::Blue => Color::Blue,
    }
}

/// Renders each agent's mode and haul.
fn render_agents(frame: &mut Frame, area: Rect, state: &CaptureState) {
    let items: Vec<ListItem> = state
        .seats()
        .filter_map(|seat| state.agent_state(seat).map(|agent| (seat, agent)))
        .map(|(seat, agent)| {
            let mode = if agent.is_pacman { "pacman" } else { "ghost" };
            let scared = if agent.is_scared() {
                format!(" scared {}", agent.scared_timer)
            } else {
                String::new()
            };
            let position = agent
                .cell()
                .map(|cell| format!("({}, {})", cell.x, cell.y))
                .unwrap_or_else(|| "?".to_string());
            ListItem::from(Line::from(Span::styled(
                format!(
                    "Agent {seat} {mode}{scared} at {position} facing {:?}, carrying {}",
                    agent.direction, agent.num_carrying
                ),
                Style::default().fg(team_color(Team::of(seat))),
            )))
        })
        .collect();

    let widget = List::new(items).block(Block::default().borders(Borders::ALL).title("Agents"));
    frame.render_widget(widget, area);
}

/// Renders the maze onto the frame.
fn render_map(frame: &mut Frame, area: Rect, state: &CaptureState) {
    let walls = state.walls();
    let mut lines: Vec<Line> = Vec::with_capacity(walls.height());

    for y in 0..walls.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(walls.width());
        for x in 0..walls.width() {
            let position = Position { x, y };
            let agent_span = state
                .seats()
                .find(|seat| {
                    state
                        .agent_state(*seat)
                        .and_then(|agent| agent.cell())
                        .is_some_and(|cell| cell == position)
                })
                .and_then(|seat| {
                    let agent = state.agent_state(seat)?;
                    let glyph = if agent.is_pacman { "C" } else { "G" };
                    let color = if agent.is_scared() {
                        Color::White
                    } else {
                        team_color(Team::of(seat))
                    };
                    Some(Span::styled(glyph, Style::default().fg(color).bold()))
                });

            let home = if Team::Red.owns_column(x, walls.width()) {
                Team::Red
            } else {
                Team::Blue
            };
            let span = if let Some(agent_span) = agent_span {
                agent_span
            } else if walls.is_wall(position) {
                Span::styled("%", Style::default().fg(team_color(home)).dim())
            } else if state.has_capsule(position) {
                Span::styled("o", Style::default().fg(Color::Yellow).bold())
            } else if state.has_food(position) {
                Span::styled(".", Style::default().fg(Color::Yellow))
            } else {
                Span::raw(" ")
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Capture").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}
