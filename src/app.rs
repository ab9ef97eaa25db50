//! App: terminal init, main loop, tick, mouse and key handling.

use crate::GameConfig;
use crate::drag::{ReleaseOutcome, StepOutcome};
use crate::game::GameState;
use crate::input::{Action, Camera, MousePointer, key_to_action};
use crate::level::{LevelBook, LevelId};
use crate::presentation::Feedback;
use crate::reconcile::DropOutcome;
use crate::theme::Theme;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    LevelComplete,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    Restart,
    MainMenu,
    Exit,
}

impl QuitOption {
    fn next(self) -> Self {
        match self {
            Self::Resume => Self::Restart,
            Self::Restart => Self::MainMenu,
            Self::MainMenu => Self::Exit,
            Self::Exit => Self::Resume,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Resume => Self::Exit,
            Self::Restart => Self::Resume,
            Self::MainMenu => Self::Restart,
            Self::Exit => Self::MainMenu,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub selected: LevelId,
    pub animation_start: Instant,
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    levels: LevelBook,
    state: GameState,
    feedback: Feedback,
    pointer: MousePointer,
    camera: Camera,
    screen: Screen,
    menu_state: MenuState,
    quit_selected: QuitOption,
    /// One-line message for the sidebar or menu (check result, level errors).
    status: Option<String>,
    /// Particle flashes; dropped once done.
    effects: Vec<Effect>,
    last_frame: Instant,
    last_tick: Instant,
}

impl App {
    pub fn new(
        no_menu: bool,
        config: GameConfig,
        theme: Theme,
        levels: LevelBook,
        start: LevelId,
    ) -> Result<Self> {
        let level = levels
            .get(start)
            .with_context(|| format!("{start} is not in the level book"))?;
        let state = GameState::new(level);
        let screen = if no_menu { Screen::Playing } else { Screen::Menu };
        let now = Instant::now();
        Ok(Self {
            config,
            theme,
            levels,
            state,
            feedback: Feedback::new(),
            pointer: MousePointer::new(),
            camera: Camera::default(),
            screen,
            menu_state: MenuState {
                selected: start,
                animation_start: now,
            },
            quit_selected: QuitOption::Resume,
            status: None,
            effects: Vec::new(),
            last_frame: now,
            last_tick: now,
        })
    }

    /// Fresh board, counters and feedback for `id`; the pointer forgets any held button.
    fn load_level(&mut self, id: LevelId) -> Result<()> {
        let level = self
            .levels
            .get(id)
            .with_context(|| format!("{id} is not in the level book"))?;
        self.state = GameState::new(level);
        self.feedback = Feedback::new();
        self.pointer.reset();
        self.effects.clear();
        self.status = None;
        self.menu_state.selected = id;
        self.screen = Screen::Playing;
        Ok(())
    }

    fn open_menu(&mut self, status: Option<String>) {
        self.pointer.reset();
        self.status = status;
        self.menu_state.selected = self.state.level;
        self.menu_state.animation_start = Instant::now();
        self.screen = Screen::Menu;
    }

    /// `auto` checks run after every placement and stay quiet unless the level is won.
    fn check_win(&mut self, auto: bool) {
        match self.state.check_win(&self.levels) {
            Ok(true) => {
                tracing::info!(level = %self.state.level, "level complete");
                self.status = None;
                self.pointer.reset();
                self.screen = Screen::LevelComplete;
            }
            Ok(false) => {
                if !auto {
                    let progress = crate::win::progress(
                        &self.state.counters,
                        &self.levels,
                        self.state.level,
                    )
                    .map(|p| {
                        p.iter()
                            .map(|(t, placed, required)| format!("{t} {placed}/{required}"))
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                    self.status = Some(format!("Not yet: {progress}"));
                }
            }
            Err(e) => {
                tracing::warn!(level = %self.state.level, error = %e, "win check failed");
                self.status = Some(e.to_string());
            }
        }
    }

    /// One input tick of the level: pointer sample into the drag session, then win check.
    fn step_game(&mut self) -> Result<()> {
        let outcome = self.state.tick(&mut self.pointer, &mut self.feedback);
        if let Some(StepOutcome::Released(ReleaseOutcome::Dropped {
            outcome: DropOutcome::Placed { .. },
            ..
        })) = outcome
        {
            self.status = None;
            self.check_win(true);
        }
        if self.feedback.take_bell() && !self.config.mute {
            use crossterm::{execute, style::Print};
            execute!(std::io::stdout(), Print('\x07'))?;
        }
        Ok(())
    }

    /// Returns true when the app should exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return Ok(true),
                Action::Up | Action::Left => {
                    if let Some(prev) = self.levels.prev_before(self.menu_state.selected) {
                        self.menu_state.selected = prev.id;
                    }
                }
                Action::Down | Action::Right => {
                    if let Some(next) = self.levels.next_after(self.menu_state.selected) {
                        self.menu_state.selected = next.id;
                    }
                }
                Action::Confirm => self.load_level(self.menu_state.selected)?,
                _ => {}
            },
            Screen::Playing => match action {
                Action::Quit => {
                    self.screen = Screen::QuitMenu;
                    self.quit_selected = QuitOption::Resume;
                }
                Action::CheckWin => self.check_win(false),
                Action::Restart => self.load_level(self.state.level)?,
                _ => {}
            },
            Screen::LevelComplete => match action {
                Action::Quit => return Ok(true),
                Action::Restart => self.load_level(self.state.level)?,
                Action::NextLevel | Action::Confirm => {
                    match self.levels.next_after(self.state.level).map(|l| l.id) {
                        Some(next) => self.load_level(next)?,
                        None => {
                            tracing::info!("all levels cleared");
                            self.open_menu(Some("All levels cleared!".to_string()));
                        }
                    }
                }
                _ => {}
            },
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => self.quit_selected = self.quit_selected.next(),
                Action::Up | Action::Left => self.quit_selected = self.quit_selected.prev(),
                Action::Confirm => match self.quit_selected {
                    QuitOption::Resume => self.screen = Screen::Playing,
                    QuitOption::Restart => self.load_level(self.state.level)?,
                    QuitOption::MainMenu => self.open_menu(None),
                    QuitOption::Exit => return Ok(true),
                },
                Action::Quit => self.screen = Screen::Playing,
                _ => {}
            },
        }
        Ok(false)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let tick_interval = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        loop {
            let now = Instant::now();
            let size = terminal.size()?;
            let area = Rect::new(0, 0, size.width, size.height);
            self.camera = crate::ui::camera_for(area, &self.state);

            let delta_ms = u32::try_from(now.duration_since(self.last_frame).as_millis())
                .unwrap_or(u32::MAX);
            self.last_frame = now;
            self.feedback.tick_particles(delta_ms);
            for at in self.feedback.take_new_particles() {
                if !self.config.particles {
                    continue;
                }
                let effect = crate::ui::particle_effect(at, self.camera, &self.theme, area);
                self.effects.extend(effect);
            }
            if !self.config.particles {
                self.feedback.particles.clear();
            }

            let scene = crate::ui::Scene {
                screen: self.screen,
                state: &self.state,
                feedback: &self.feedback,
                theme: &self.theme,
                levels: &self.levels,
                camera: self.camera,
                hover: self.pointer.hover(),
                menu: &self.menu_state,
                quit_selected: self.quit_selected,
                status: self.status.as_deref(),
                now,
            };
            let effects = &mut self.effects;
            terminal.draw(|f| crate::ui::draw(f, &scene, effects, delta_ms))?;
            self.effects.retain(|e| !e.done());

            // Limit event polling to ~60 FPS rendering (16ms)
            let timeout = Duration::from_millis(16).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if self.handle_action(key_to_action(key))? {
                                return Ok(());
                            }
                        }
                        // Off the board only an ongoing drag is followed so its release lands.
                        Event::Mouse(mouse)
                            if self.screen == Screen::Playing || self.pointer.is_held() =>
                        {
                            self.pointer.feed(mouse, self.camera);
                        }
                        _ => {}
                    }
                }
            }

            if self.screen == Screen::Playing && self.last_tick.elapsed() >= tick_interval {
                self.last_tick = Instant::now();
                self.step_game()?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BrickType;
    use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

    fn app(no_menu: bool) -> App {
        let config = GameConfig {
            tick_rate: 60.0,
            mute: true,
            particles: true,
        };
        let levels = LevelBook::builtin().unwrap();
        App::new(no_menu, config, Theme::default(), levels, LevelId(1)).unwrap()
    }

    fn mouse(app: &mut App, kind: MouseEventKind, column: u16, row: u16) {
        let event = MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        app.pointer.feed(event, app.camera);
        app.step_game().unwrap();
    }

    /// Drag from a terminal cell to another with the camera at the origin.
    fn drag(app: &mut App, from: (u16, u16), to: (u16, u16)) {
        mouse(app, MouseEventKind::Down(MouseButton::Left), from.0, from.1);
        mouse(app, MouseEventKind::Drag(MouseButton::Left), to.0, to.1);
        mouse(app, MouseEventKind::Up(MouseButton::Left), to.0, to.1);
    }

    fn home_cell(app: &App, kind: BrickType) -> (u16, u16) {
        let (_, p) = app.state.tray_homes().find(|(t, _)| *t == kind).unwrap();
        (p.x as u16, p.y as u16)
    }

    fn cell_centre(app: &App, i: usize) -> (u16, u16) {
        let c = app.state.board.cells()[i].bounds.center();
        (c.x as u16, c.y as u16)
    }

    #[test]
    fn test_menu_selects_and_starts_level() {
        let mut app = app(false);
        assert_eq!(app.screen, Screen::Menu);
        app.handle_action(Action::Up).unwrap();
        assert_eq!(app.menu_state.selected, LevelId(1));
        app.handle_action(Action::Down).unwrap();
        app.handle_action(Action::Confirm).unwrap();
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.state.level, LevelId(2));
        assert!(app.handle_action(Action::Quit).is_ok_and(|exit| !exit));
        assert_eq!(app.screen, Screen::QuitMenu);
    }

    #[test]
    fn test_quit_menu_cycles_and_exits() {
        let mut app = app(true);
        app.handle_action(Action::Quit).unwrap();
        app.handle_action(Action::Up).unwrap();
        assert_eq!(app.quit_selected, QuitOption::Exit);
        assert!(app.handle_action(Action::Confirm).unwrap());
    }

    #[test]
    fn test_check_reports_progress() {
        let mut app = app(true);
        app.handle_action(Action::CheckWin).unwrap();
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.status.as_deref(), Some("Not yet: Stone 0/2, Gold 0/1"));
    }

    #[test]
    fn test_placements_complete_level_and_advance() {
        let mut app = app(true);
        let stone = home_cell(&app, BrickType::Stone);
        let gold = home_cell(&app, BrickType::Gold);
        let cells = [cell_centre(&app, 0), cell_centre(&app, 1), cell_centre(&app, 2)];

        drag(&mut app, stone, cells[0]);
        drag(&mut app, stone, cells[1]);
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.feedback.counter(BrickType::Stone), 2);
        drag(&mut app, gold, cells[2]);
        assert_eq!(app.screen, Screen::LevelComplete);

        app.handle_action(Action::NextLevel).unwrap();
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.state.level, LevelId(2));
        assert_eq!(app.feedback.counter(BrickType::Stone), 0);
    }

    #[test]
    fn test_restart_clears_board() {
        let mut app = app(true);
        let stone = home_cell(&app, BrickType::Stone);
        let target = cell_centre(&app, 0);
        drag(&mut app, stone, target);
        assert_eq!(app.state.counters.get(BrickType::Stone), 1);
        app.handle_action(Action::Restart).unwrap();
        assert_eq!(app.state.counters.get(BrickType::Stone), 0);
        assert!(app.state.board.cells().iter().all(|c| c.assigned_type().is_none()));
    }

    #[test]
    fn test_last_level_returns_to_menu() {
        let mut app = app(true);
        app.load_level(LevelId(3)).unwrap();
        app.screen = Screen::LevelComplete;
        app.handle_action(Action::Confirm).unwrap();
        assert_eq!(app.screen, Screen::Menu);
        assert_eq!(app.status.as_deref(), Some("All levels cleared!"));
    }
}
