use crate::{
    ball::Ball,
    config::{FIELD_BORDER_WIDTH, SCREEN_HEIGHT, SCREEN_WIDTH},
    geometry::{Rect, Vector},
    level::Level,
    paddle::Paddle,
    render::{Key, Keyboard, Surface, TextStyle, Tone},
};

pub const TITLE_SIZE: f64 = 80.0;
pub const SCORE_SIZE: f64 = 60.0;
pub const HEADING_SIZE: f64 = 30.0;
pub const MENU_SIZE: f64 = 20.0;
pub const SMALL_SIZE: f64 = 12.0;

const MENU_LINE_HEIGHT: f64 = 40.0;
const MARKER_SIZE: f64 = 15.0;

/// Top and bottom borders plus the dashed centre line.
pub fn draw_field(surface: &mut dyn Surface) {
    surface.fill_rect(Rect::new(0.0, 0.0, SCREEN_WIDTH, FIELD_BORDER_WIDTH), Tone::Field);
    surface.fill_rect(
        Rect::new(
            0.0,
            SCREEN_HEIGHT - FIELD_BORDER_WIDTH,
            SCREEN_WIDTH,
            FIELD_BORDER_WIDTH,
        ),
        Tone::Field,
    );

    let mut y = 15.0;
    for _ in 0..30 {
        surface.fill_rect(Rect::new(SCREEN_WIDTH / 2.0 - 5.0, y, 7.0, 7.0), Tone::Dim);
        y += 17.0;
    }
}

pub fn draw_paddle(surface: &mut dyn Surface, paddle: &Paddle) {
    surface.fill_rect(paddle.bounds(), Tone::Paddle);
}

pub fn draw_ball(surface: &mut dyn Surface, ball: &Ball) {
    surface.fill_rect(ball.bounds(), Tone::Ball);
}

/// Left score sits left of the centre line, right score right of it.
pub fn draw_scores(surface: &mut dyn Surface, left: i8, right: i8) {
    let style = TextStyle::new(SCORE_SIZE, Tone::Text);
    let (digit_width, _) = surface.measure("0", SCORE_SIZE);
    surface.draw_text(
        &left.to_string(),
        Vector::new(SCREEN_WIDTH / 2.0 - 50.0 - digit_width, 30.0),
        style,
    );
    surface.draw_text(
        &right.to_string(),
        Vector::new(SCREEN_WIDTH / 2.0 + 70.0, 30.0),
        style,
    );
}

pub fn draw_names(surface: &mut dyn Surface, left: &str, right: &str) {
    let style = TextStyle::new(SMALL_SIZE, Tone::Dim);
    let (_, score_height) = surface.measure("0", SCORE_SIZE);
    let y = score_height + 50.0;

    let (left_width, _) = surface.measure(left, SMALL_SIZE);
    surface.draw_text(left, Vector::new(SCREEN_WIDTH / 2.0 - 20.0 - left_width, y), style);
    surface.draw_text(right, Vector::new(SCREEN_WIDTH / 2.0 + 20.0, y), style);
}

pub fn metric_line(fps: f64, ball: &Ball, level: Level) -> String {
    format!(
        "FPS: {fps:.0} | Ball (bounces: {}, angle: {:.0} ) | Level: {level}",
        ball.bounces(),
        ball.angle()
    )
}

pub fn network_line(ping1: i64, ping2: i64) -> String {
    format!("ping1: {ping1:4}ms | ping2: {ping2:4}ms")
}

pub fn draw_metric(surface: &mut dyn Surface, fps: f64, ball: &Ball, level: Level) {
    surface.draw_text(
        &metric_line(fps, ball, level),
        Vector::new(15.0, 15.0),
        TextStyle::new(SMALL_SIZE, Tone::Dim),
    );
}

pub fn draw_network_info(surface: &mut dyn Surface, ping1: i64, ping2: i64) {
    surface.draw_text(
        &network_line(ping1, ping2),
        Vector::new(15.0, SCREEN_HEIGHT - FIELD_BORDER_WIDTH - 20.0),
        TextStyle::new(SMALL_SIZE, Tone::Dim),
    );
}

pub fn draw_title(surface: &mut dyn Surface) {
    surface.draw_centered("PONG", 80.0, TextStyle::new(TITLE_SIZE, Tone::Text));
}

/// What a frame of input did to an option list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuInput {
    Idle,
    Select(usize),
    Back,
}

/// Vertical list of options with a selection marker. Up/Down wrap around.
#[derive(Debug, Clone)]
pub struct OptionList {
    options: Vec<String>,
    selected: usize,
    wrap: bool,
}

impl OptionList {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            selected: 0,
            wrap: true,
        }
    }

    /// Stops at the first and last option instead of wrapping.
    pub fn clamped(mut self) -> Self {
        self.wrap = false;
        self
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn update(&mut self, keys: &dyn Keyboard) -> MenuInput {
        let count = self.options.len();
        if count == 0 {
            return if keys.just_pressed(Key::Escape) {
                MenuInput::Back
            } else {
                MenuInput::Idle
            };
        }

        if keys.just_pressed(Key::Up) {
            if self.selected > 0 {
                self.selected -= 1;
            } else if self.wrap {
                self.selected = count - 1;
            }
        }

        if keys.just_pressed(Key::Down) {
            if self.selected + 1 < count {
                self.selected += 1;
            } else if self.wrap {
                self.selected = 0;
            }
        }

        if keys.just_pressed(Key::Enter) {
            return MenuInput::Select(self.selected);
        }

        if keys.just_pressed(Key::Escape) {
            return MenuInput::Back;
        }

        MenuInput::Idle
    }

    pub fn draw(&self, surface: &mut dyn Surface, top: f64) {
        for (i, option) in self.options.iter().enumerate() {
            let y = top + i as f64 * MENU_LINE_HEIGHT;
            let tone = if i == self.selected {
                Tone::Highlight
            } else {
                Tone::Text
            };
            surface.draw_centered(option, y, TextStyle::new(MENU_SIZE, tone));

            if i == self.selected {
                let (width, height) = surface.measure(option, MENU_SIZE);
                let x = (SCREEN_WIDTH - width) / 2.0 - 30.0;
                let marker_y = y + (height - MARKER_SIZE).max(0.0) / 2.0;
                surface.fill_rect(
                    Rect::new(x, marker_y, MARKER_SIZE, MARKER_SIZE),
                    Tone::Highlight,
                );
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseChoice {
    Stay,
    Resume,
    Exit,
}

/// Resume/Exit overlay shown over a paused local match.
#[derive(Debug, Clone)]
pub struct PauseMenu {
    options: OptionList,
}

impl Default for PauseMenu {
    fn default() -> Self {
        Self {
            options: OptionList::new(["Resume", "Exit"]).clamped(),
        }
    }
}

impl PauseMenu {
    pub fn update(&mut self, keys: &dyn Keyboard) -> PauseChoice {
        match self.options.update(keys) {
            MenuInput::Select(0) | MenuInput::Back => PauseChoice::Resume,
            MenuInput::Select(_) => PauseChoice::Exit,
            MenuInput::Idle => PauseChoice::Stay,
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_rect(
            Rect::new(SCREEN_WIDTH / 2.0 - 120.0, 150.0, 240.0, 180.0),
            Tone::Overlay,
        );
        surface.draw_centered("Paused", 170.0, TextStyle::new(HEADING_SIZE, Tone::Text));
        self.options.draw(surface, 230.0);
    }
}
