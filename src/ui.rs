//! Layout and drawing: level menu, board, tray, counters, particles, overlays.

use crate::app::{MenuState, QuitOption, Screen};
use crate::board::{Bounds, Point, TILE_HEIGHT, TILE_WIDTH};
use crate::game::GameState;
use crate::input::Camera;
use crate::level::{LevelBook, LevelProvider};
use crate::presentation::{
    AssetKey, AssetResolver, Feedback, PARTICLE_LIFETIME_MS, should_highlight,
};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

const SIDEBAR_WIDTH: u16 = 28;
/// Directions a spark travels from the drop point.
const SPARK_RAYS: [(f32, f32); 8] = [
    (-1.0, -0.5),
    (0.0, -0.5),
    (1.0, -0.5),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 0.5),
    (0.0, 0.5),
    (1.0, 0.5),
];

/// Everything a frame needs, borrowed from the app.
pub struct Scene<'a> {
    pub screen: Screen,
    pub state: &'a GameState,
    pub feedback: &'a Feedback,
    pub theme: &'a Theme,
    pub levels: &'a LevelBook,
    pub camera: Camera,
    pub hover: Option<Point>,
    pub menu: &'a MenuState,
    pub quit_selected: QuitOption,
    pub status: Option<&'a str>,
    pub now: Instant,
}

/// Board (with border) and sidebar rects, centred in `area`.
fn scene_rects(area: Rect, state: &GameState) -> (Rect, Rect) {
    let (w, h) = state.world_extent();
    let board_w = (w.ceil() as u16).saturating_add(2);
    let board_h = (h.ceil() as u16).saturating_add(2);
    let total_w = board_w + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(board_h) / 2;
    let board = Rect::new(x, y, board_w, board_h).intersection(area);
    let sidebar = Rect::new(x + board_w, y, SIDEBAR_WIDTH, board_h.max(16)).intersection(area);
    (board, sidebar)
}

/// Camera whose world origin is the top-left inside the board border.
pub fn camera_for(area: Rect, state: &GameState) -> Camera {
    let (board, _) = scene_rects(area, state);
    Camera {
        origin_x: board.x + 1,
        origin_y: board.y + 1,
    }
}

/// Screen rect covered by world `bounds`, clipped to `clip`.
fn world_rect(camera: Camera, bounds: Bounds, clip: Rect) -> Option<Rect> {
    let ox = f32::from(camera.origin_x);
    let oy = f32::from(camera.origin_y);
    let x0 = ((ox + bounds.x).floor() as i32).max(i32::from(clip.x));
    let y0 = ((oy + bounds.y).floor() as i32).max(i32::from(clip.y));
    let x1 = ((ox + bounds.x + bounds.width).floor() as i32).min(i32::from(clip.right()));
    let y1 = ((oy + bounds.y + bounds.height).floor() as i32).min(i32::from(clip.bottom()));
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(Rect::new(x0 as u16, y0 as u16, (x1 - x0) as u16, (y1 - y0) as u16))
}

/// Screen cell of a world point, if inside `clip`.
fn world_cell(camera: Camera, p: Point, clip: Rect) -> Option<(u16, u16)> {
    let x = (f32::from(camera.origin_x) + p.x).floor() as i32;
    let y = (f32::from(camera.origin_y) + p.y).floor() as i32;
    let inside = x >= i32::from(clip.x)
        && x < i32::from(clip.right())
        && y >= i32::from(clip.y)
        && y < i32::from(clip.bottom());
    inside.then(|| (x as u16, y as u16))
}

/// Flash that fades from the spark colour back to the board over the drop's tile.
pub fn particle_effect(at: Point, camera: Camera, theme: &Theme, area: Rect) -> Option<Effect> {
    let bounds = Bounds::centered(at, TILE_WIDTH + 2.0, TILE_HEIGHT + 1.0);
    let rect = world_rect(camera, bounds, area)?;
    Some(
        fx::fade_from(
            theme.spark,
            theme.bg,
            (PARTICLE_LIFETIME_MS, Interpolation::Linear),
        )
        .with_area(rect),
    )
}

fn fill(frame: &mut Frame, rect: Rect, symbol: &str, style: Style) {
    let buf = frame.buffer_mut();
    for y in rect.top()..rect.bottom() {
        for x in rect.left()..rect.right() {
            buf[(x, y)].set_symbol(symbol).set_style(style);
        }
    }
}

/// Draw the current screen; live effects are processed on top.
pub fn draw(frame: &mut Frame, scene: &Scene<'_>, effects: &mut [Effect], delta_ms: u32) {
    let area = frame.area();
    fill(frame, area, " ", Style::default().bg(scene.theme.bg));
    match scene.screen {
        Screen::Menu => draw_menu(frame, scene, area),
        Screen::Playing => draw_game(frame, scene, area),
        Screen::LevelComplete => {
            draw_game(frame, scene, area);
            draw_level_complete(frame, scene, area);
        }
        Screen::QuitMenu => {
            draw_game(frame, scene, area);
            draw_quit_menu(frame, scene.theme, scene.quit_selected);
        }
    }
    let delta = TfxDuration::from_millis(delta_ms);
    for effect in effects.iter_mut() {
        frame.render_effect(effect, area, delta);
    }
}

fn draw_menu(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let theme = scene.theme;
    let levels = scene.levels.levels();
    let popup_w = 44u16;
    let popup_h = (levels.len() as u16 + 12).min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h,
    };

    let bold = Modifier::BOLD;
    let highlight_style = Style::default()
        .fg(theme.bg)
        .bg(theme.gold)
        .add_modifier(bold);
    let normal_style = Style::default().fg(theme.main_fg);

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" Brick ", Style::default().fg(theme.stone).add_modifier(bold)),
            Span::styled(" drop ", Style::default().fg(theme.gold).add_modifier(bold)),
        ]),
        Line::from(""),
        Line::from(Span::styled(" ─ LEVELS ─ ", Style::default().fg(theme.div_line))),
    ];
    for level in levels {
        let target = crate::board::BrickType::ALL
            .iter()
            .map(|&t| format!("{} {}", t.key(), level.target.required(t)))
            .collect::<Vec<_>>()
            .join(" · ");
        let style = if level.id == scene.menu.selected {
            highlight_style
        } else {
            normal_style
        };
        lines.push(Line::from(Span::styled(format!(" {}  {} ", level.id, target), style)));
    }
    lines.extend([
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", Style::default().fg(theme.box_outline)),
            Span::from("CHOOSE   "),
            Span::styled(" ENTER ", Style::default().fg(theme.box_outline)),
            Span::from("PLAY"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            scene.status.unwrap_or(""),
            Style::default().fg(theme.gold),
        )),
        Line::from(Span::styled(" [Q] QUIT ", Style::default().fg(Color::Rgb(255, 80, 80)))),
    ]);

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );

    // Slide in from below.
    let elapsed = scene.now.duration_since(scene.menu.animation_start).as_millis() as u32;
    let t = (elapsed as f32 / 400.0).min(1.0);
    let ease = 1.0 - (1.0 - t).powi(3);
    let mut anim_popup = popup;
    anim_popup.y += ((1.0 - ease) * 8.0) as u16;
    p.render(anim_popup.intersection(area), frame.buffer_mut());
}

fn draw_game(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let (board_outer, sidebar) = scene_rects(area, scene.state);
    draw_board(frame, scene, board_outer);
    draw_sidebar(frame, scene, sidebar);
}

fn draw_board(frame: &mut Frame, scene: &Scene<'_>, outer: Rect) {
    let theme = scene.theme;
    let state = scene.state;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(format!(" {} ", state.level), Style::default().fg(theme.title)));
    let inner = block.inner(outer);
    block.render(outer, frame.buffer_mut());

    for cell in state.board.cells() {
        let Some(rect) = world_rect(scene.camera, cell.bounds, inner) else {
            continue;
        };
        let tile = if should_highlight(scene.hover, &cell.bounds) {
            theme.highlight
        } else if cell.offset {
            theme.tile_offset
        } else {
            theme.tile_base
        };
        if cell.is_drop_valid() {
            let sprite = theme.resolve(scene.feedback.sprite(cell.id()));
            fill(frame, rect, sprite.symbol, Style::default().fg(sprite.fg).bg(tile));
        } else {
            fill(frame, rect, " ", Style::default().bg(tile));
        }
    }

    for (brick_type, home) in state.tray_homes() {
        let label = brick_type.key();
        let at = Point::new(home.x - label.len() as f32 / 2.0, home.y + 1.5);
        if let Some((x, y)) = world_cell(scene.camera, at, inner) {
            frame
                .buffer_mut()
                .set_string(x, y, label, Style::default().fg(theme.inactive_fg));
        }
    }

    let mut bricks: Vec<_> = state.board.bricks().iter().collect();
    bricks.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    for brick in bricks {
        let Some(rect) = world_rect(scene.camera, brick.bounds(), inner) else {
            continue;
        };
        let sprite = theme.resolve(AssetKey::for_brick(brick.brick_type()));
        let mut style = Style::default().fg(sprite.fg).bg(theme.bg);
        if brick.is_dragging {
            style = style.add_modifier(Modifier::BOLD);
        }
        fill(frame, rect, sprite.symbol, style);
    }

    for particle in &scene.feedback.particles {
        let reach = 1.0 + particle.age_ms as f32 / 120.0;
        let symbol = if particle.age_ms < PARTICLE_LIFETIME_MS / 2 {
            "✦"
        } else {
            "·"
        };
        for (dx, dy) in SPARK_RAYS {
            let p = Point::new(particle.at.x + dx * reach * 2.0, particle.at.y + dy * reach * 2.0);
            if let Some((x, y)) = world_cell(scene.camera, p, inner) {
                frame.buffer_mut()[(x, y)]
                    .set_symbol(symbol)
                    .set_style(Style::default().fg(theme.spark));
            }
        }
    }
}

fn draw_sidebar(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let theme = scene.theme;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2 + crate::board::BrickType::COUNT as u16 + 1), // Target
            Constraint::Length(1),                                           // gap
            Constraint::Length(7),                                           // Controls
            Constraint::Length(1),                                           // gap
            Constraint::Length(4),                                           // Status
        ])
        .split(area);

    // --- Target: displayed counters against required counts ---
    let target_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let target_inner = target_block.inner(chunks[0]);
    target_block.render(chunks[0], frame.buffer_mut());
    let mut lines = vec![Line::from(Span::styled("Target", title_style))];
    let target = scene.levels.level_target(scene.state.level).ok();
    for t in crate::board::BrickType::ALL {
        let shown = scene.feedback.counter(t);
        let (required, done) = match target {
            Some(target) => {
                let r = target.required(t);
                (r.to_string(), i64::from(shown) == i64::from(r))
            }
            None => ("?".to_string(), false),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{t:<6} "), Style::default().fg(theme.brick_color(t))),
            Span::styled(format!("{shown} / {required}"), fg_style),
            Span::styled(if done { "  ✓" } else { "" }, Style::default().fg(theme.highlight)),
        ]));
    }
    Paragraph::new(lines).render(target_inner, frame.buffer_mut());

    // --- Controls ---
    let controls_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let controls_inner = controls_block.inner(chunks[2]);
    controls_block.render(chunks[2], frame.buffer_mut());
    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("{k:<6}"), Style::default().fg(theme.box_outline)),
            Span::styled(what, fg_style),
        ])
    };
    Paragraph::new(vec![
        Line::from(Span::styled("Controls", title_style)),
        key("drag", "move a brick"),
        key("C", "check target"),
        key("R", "restart level"),
        key("Q", "menu / quit"),
    ])
    .render(controls_inner, frame.buffer_mut());

    // --- Status ---
    let status_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let status_inner = status_block.inner(chunks[4]);
    status_block.render(chunks[4], frame.buffer_mut());
    let status = match (scene.status, scene.feedback.dragging) {
        (Some(s), _) => s.to_string(),
        (None, Some(_)) => "Release over a box".to_string(),
        (None, None) => "Drag a brick onto a box".to_string(),
    };
    Paragraph::new(vec![
        Line::from(Span::styled("Status", title_style)),
        Line::from(Span::styled(status, fg_style)),
    ])
    .render(status_inner, frame.buffer_mut());
}

fn draw_level_complete(frame: &mut Frame, scene: &Scene<'_>, area: Rect) {
    let theme = scene.theme;
    let popup_w = 34u16;
    let popup_h = 7u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let next = if scene.levels.next_after(scene.state.level).is_some() {
        " [N] Next   [R] Replay "
    } else {
        " [N] Menu   [R] Replay "
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" {} complete! ", scene.state.level),
            Style::default().fg(Color::Black).bg(theme.gold),
        )),
        Line::from(""),
        Line::from(Span::styled(next, Style::default().fg(theme.main_fg))),
        Line::from(Span::styled(" [Q] Quit ", Style::default().fg(theme.main_fg))),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    fill(frame, popup, " ", Style::default().bg(theme.bg));
    p.render(popup, frame.buffer_mut());
}

pub fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 10;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw.min(area.width),
        height: qh.min(area.height),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.title))
        .title(" Quit? ");

    fill(frame, quit_rect, " ", Style::default().bg(theme.bg));
    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (QuitOption::Resume, " Resume "),
        (QuitOption::Restart, " Restart Level "),
        (QuitOption::MainMenu, " Level Menu "),
        (QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(theme.bg)
                .bg(theme.title)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.chars().count() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        if ry < inner.bottom() {
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}
