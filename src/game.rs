//! Game state: one level's board, counters, drag session and brick tray.

use crate::board::{BRICK_HEIGHT, Board, Bounds, BrickId, BrickType, Counters, Point, TILE_WIDTH};
use crate::drag::{DragSession, ReleaseOutcome, StepOutcome};
use crate::input::PointerSource;
use crate::level::{Level, LevelError, LevelId, LevelProvider};
use crate::presentation::{DragListener, Presentation};

/// Empty rows between the grid and the brick tray.
const TRAY_GAP: f32 = 2.0;

/// Tray spot where a fresh brick of one type waits to be picked.
#[derive(Debug, Clone, Copy)]
struct TraySlot {
    brick_type: BrickType,
    home: Point,
    brick: Option<BrickId>,
}

/// Session object for one level. Owned by the app; rebuilt on restart or level change.
#[derive(Debug)]
pub struct GameState {
    pub board: Board,
    pub counters: Counters,
    pub drag: DragSession,
    pub level: LevelId,
    tray: Vec<TraySlot>,
}

impl GameState {
    pub fn new(level: &Level) -> Self {
        let board = Board::from_layout(&level.rows);
        let (_, grid_h) = board.grid_extent();
        let tray_y = grid_h + TRAY_GAP + BRICK_HEIGHT / 2.0;
        let tray = BrickType::ALL
            .into_iter()
            .enumerate()
            .map(|(i, brick_type)| TraySlot {
                brick_type,
                home: Point::new(TILE_WIDTH * i as f32 + TILE_WIDTH / 2.0, tray_y),
                brick: None,
            })
            .collect();
        let mut state = Self {
            board,
            counters: Counters::new(),
            drag: DragSession::new(),
            level: level.id,
            tray,
        };
        state.refill_tray();
        tracing::info!(level = %level.id, cells = state.board.cells().len(), "level loaded");
        state
    }

    /// World size covering the grid and the tray.
    pub fn world_extent(&self) -> (f32, f32) {
        let (w, h) = self.board.grid_extent();
        let tray_w = TILE_WIDTH * BrickType::COUNT as f32;
        (w.max(tray_w), h + TRAY_GAP + BRICK_HEIGHT + 1.0)
    }

    /// Tray spots, for drawing their placeholders.
    pub fn tray_homes(&self) -> impl Iterator<Item = (BrickType, Point)> + '_ {
        self.tray.iter().map(|s| (s.brick_type, s.home))
    }

    /// One poll-loop tick: read at most one pointer sample and feed it to the drag session.
    /// A release is fully reconciled before this returns.
    pub fn tick<S, F>(&mut self, input: &mut S, feedback: &mut F) -> Option<StepOutcome>
    where
        S: PointerSource + ?Sized,
        F: Presentation + DragListener,
    {
        let sample = input.poll_pointer()?;
        let outcome = self
            .drag
            .step(sample, &mut self.board, &mut self.counters, feedback);
        if let StepOutcome::Released(ReleaseOutcome::Dropped { .. }) = outcome {
            self.refill_tray();
        }
        Some(outcome)
    }

    pub fn check_win<P: LevelProvider + ?Sized>(&self, levels: &P) -> Result<bool, LevelError> {
        crate::win::evaluate(&self.counters, levels, self.level)
    }

    /// Spawn a new brick in every tray slot whose brick was consumed. A slot brick left
    /// idle outside the world can never be picked again, so it counts as consumed.
    fn refill_tray(&mut self) {
        let (w, h) = self.world_extent();
        let world = Bounds::new(0.0, 0.0, w, h);
        for slot in &mut self.tray {
            let current = slot
                .brick
                .and_then(|id| self.board.brick(id))
                .map(|b| (b.id(), b.is_dragging || world.contains(b.position)));
            match current {
                Some((_, true)) => continue,
                Some((stray, false)) => {
                    self.board.remove_brick(stray);
                    tracing::debug!(brick = %stray, "brick released outside the world; removed");
                }
                None => {}
            }
            let id = self.board.spawn_brick(slot.brick_type, slot.home);
            tracing::debug!(brick = %id, kind = %slot.brick_type, "tray refilled");
            slot.brick = Some(id);
        }
    }
}
