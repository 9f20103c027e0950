use std::{
    fs::File,
    io::{self},
    sync::Mutex,
    thread::sleep,
    time::{Duration, Instant},
};

use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    terminal::supports_keyboard_enhancement,
    ExecutableCommand,
};
use ratatui::{
    layout::Alignment,
    style::Style,
    widgets::{Block, BorderType, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use tokio::runtime::{Builder, Runtime};
use tracing::{error, info};

use pong_multiplayer::{
    config::{Config, TICKS_PER_SECOND},
    game::{Game, Session},
    game_theme::GameTheme,
    render::{Key, Keyboard},
};

mod terminal;
use crate::terminal::{centered_rect, fit_field, TerminalKeyboard, TerminalSurface};

const MIN_WIDTH: u16 = 82;
const MIN_HEIGHT: u16 = 28;

struct App {
    game: Game,
    keyboard: TerminalKeyboard,
    theme: GameTheme,
}

impl App {
    fn new(game: Game, keyboard: TerminalKeyboard, theme: GameTheme) -> Self {
        Self {
            game,
            keyboard,
            theme,
        }
    }

    pub fn run(&mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
        let frame_time = Duration::from_secs(1) / TICKS_PER_SECOND as u32;
        let mut last_frame = Instant::now();
        let mut last_size: u8 = 0; // 0 -> too small | 1 -> normal

        while self.game.is_running() {
            let started = Instant::now();
            self.keyboard.poll()?;

            let size = terminal.size()?;
            if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
                if last_size == 1 {
                    info!(width = size.width, height = size.height, "terminal too small");
                    last_size = 0;
                }
                if self.keyboard.just_pressed(Key::Escape) {
                    break;
                }
                terminal.draw(|frame| self.show_terminal_resize_warning(frame))?;
            } else {
                last_size = 1;

                if let Err(e) = self.game.update(&self.keyboard) {
                    error!(error = %e, state = self.game.state_name(), "frame update failed");
                    return Err(io::Error::other(e));
                }

                let elapsed = last_frame.elapsed().as_secs_f64();
                last_frame = Instant::now();
                if elapsed > 0.0 {
                    self.game.set_fps(1.0 / elapsed);
                }

                terminal.draw(|frame| self.draw(frame))?;
            }

            if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
                sleep(rest);
            }
        }

        Ok(())
    }

    fn show_terminal_resize_warning(&self, frame: &mut Frame) {
        let colors = self.theme.colors();
        let area = frame.area();
        let popup_area = centered_rect(30, 4, area.width, area.height);
        let popup = Paragraph::new("Terminal too small!\nPlease resize.")
            .block(
                Block::default()
                    .title("Warning")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Thick),
            )
            .style(Style::default().fg(colors.ball))
            .alignment(Alignment::Center);
        frame.render_widget(popup, popup_area);
    }

    fn draw(&self, frame: &mut Frame) {
        let colors = self.theme.colors();
        let area = frame.area();

        let block = Block::default()
            .title(" pong ")
            .borders(Borders::ALL)
            .border_type(BorderType::Thick)
            .style(Style::default().fg(colors.dim).bg(colors.background))
            .title_alignment(Alignment::Center);
        let field = fit_field(block.inner(area));
        frame.render_widget(block, area);

        let mut surface = TerminalSurface::new(frame.buffer_mut(), field, self.theme);
        self.game.draw(&mut surface);
    }
}

fn init_tracing(config: &Config) -> io::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout belongs to the game screen; logs go to a file
    let file = File::create(&config.log_file)?;
    let writer = Mutex::new(file);

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
        eprintln!("{info}");
    }));

    Ok(())
}

fn build_runtime() -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .enable_all()
        .thread_name("pong-net")
        .build()
}

fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing(&config)?;

    let runtime = build_runtime()?;
    let theme = config.theme;
    info!(server = %config.server_host, max_score = config.max_score, "starting pong");

    // release events make held paddle keys precise; not every terminal has them
    let releases = matches!(supports_keyboard_enhancement(), Ok(true));

    let terminal = ratatui::init();
    let mut stdout = io::stdout();
    if releases {
        stdout.execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))?;
    }

    let session = Session::new(config, runtime.handle().clone());
    let mut app = App::new(Game::new(session), TerminalKeyboard::new(releases), theme);
    let app_result = app.run(terminal);

    app.game.shutdown();
    if releases {
        stdout.execute(PopKeyboardEnhancementFlags)?;
    }
    ratatui::restore();
    runtime.shutdown_timeout(Duration::from_secs(1));

    match &app_result {
        Ok(()) => {
            info!("bye");
            println!("Thanks for playing pong!");
        }
        Err(e) => {
            eprintln!("Game ended with error: {}", e);
        }
    }

    app_result
}
