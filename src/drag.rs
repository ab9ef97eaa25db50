//! Drag session: at most one held brick, driven by pointer samples.
//!
//! `Idle --pick--> Dragging --move--> Dragging --release--> Idle`. Release always
//! returns to `Idle`, whether or not the drop found a target.

use crate::board::{
    BRICK_DEPTH, Board, BrickId, Counters, DRAG_DEPTH, Hit, Layer, LayerMask, Point,
};
use crate::input::{PointerPhase, PointerSample};
use crate::presentation::{DragListener, Presentation};
use crate::reconcile::{self, DropOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        brick: BrickId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Release with nothing held. Not a fault.
    NoActiveDrag,
    Dropped {
        brick: BrickId,
        outcome: DropOutcome,
    },
}

/// What one pointer sample did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Picked(BrickId),
    Moved(BrickId),
    Released(ReleaseOutcome),
    /// Sample had no effect (down on empty space, move while idle, down while dragging).
    Ignored,
}

#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn held(&self) -> Option<BrickId> {
        match self.state() {
            DragState::Idle => None,
            DragState::Dragging { brick } => Some(brick),
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.held().is_some()
    }

    /// Feed one pointer sample.
    pub fn step<F>(
        &mut self,
        sample: PointerSample,
        board: &mut Board,
        counters: &mut Counters,
        feedback: &mut F,
    ) -> StepOutcome
    where
        F: Presentation + DragListener,
    {
        let point = sample.position;
        match sample.phase {
            PointerPhase::Down if !self.is_dragging() => self
                .pick(point, board, feedback)
                .map_or(StepOutcome::Ignored, StepOutcome::Picked),
            PointerPhase::Down => StepOutcome::Ignored,
            PointerPhase::Move => self
                .drag_to(point, board, feedback)
                .map_or(StepOutcome::Ignored, StepOutcome::Moved),
            PointerPhase::Up => {
                // Bring the brick to where the pointer let go before resolving the drop.
                self.drag_to(point, board, feedback);
                StepOutcome::Released(self.release(point, board, counters, feedback))
            }
        }
    }

    /// Start dragging the brick under `point`, if the closest collider there is a brick
    /// and nothing is already held.
    pub fn pick<L: DragListener + ?Sized>(
        &mut self,
        point: Point,
        board: &mut Board,
        listener: &mut L,
    ) -> Option<BrickId> {
        if self.is_dragging() || board.any_dragging() {
            return None;
        }
        let ray = board.raycast(point, LayerMask::ALL.without(Layer::Dragging))?;
        let Hit::Brick(id) = ray.hit else {
            return None;
        };
        let brick = board.brick_mut(id)?;
        brick.is_dragging = true;
        brick.last_position = Some(brick.position);
        brick.layer = Layer::Dragging;
        self.state = DragState::Dragging { brick: id };
        listener.on_drag_started(id);
        tracing::debug!(brick = %id, kind = %brick.brick_type(), "drag started");
        Some(id)
    }

    /// Move the held brick to `point` at drag depth.
    pub fn drag_to<L: DragListener + ?Sized>(
        &mut self,
        point: Point,
        board: &mut Board,
        listener: &mut L,
    ) -> Option<BrickId> {
        let id = self.held()?;
        match board.brick_mut(id) {
            Some(brick) => {
                brick.position = point;
                brick.depth = DRAG_DEPTH;
                Some(id)
            }
            None => {
                tracing::warn!(brick = %id, "held brick vanished; ending drag");
                self.state = DragState::Idle;
                listener.on_drag_ended(id);
                None
            }
        }
    }

    /// Drop the held brick at `point`, then return to idle unconditionally.
    pub fn release<F>(
        &mut self,
        point: Point,
        board: &mut Board,
        counters: &mut Counters,
        feedback: &mut F,
    ) -> ReleaseOutcome
    where
        F: Presentation + DragListener + ?Sized,
    {
        let Some(id) = self.held() else {
            tracing::trace!("release with no active drag");
            return ReleaseOutcome::NoActiveDrag;
        };
        self.state = DragState::Idle;

        let Some(outcome) = reconcile::drop_brick(board, counters, id, point, feedback) else {
            tracing::warn!(brick = %id, "held brick vanished before release");
            feedback.on_drag_ended(id);
            return ReleaseOutcome::NoActiveDrag;
        };
        // Missed or inert: the brick stays where it was let go and can be picked again.
        if let Some(brick) = board.brick_mut(id) {
            brick.is_dragging = false;
            brick.layer = Layer::Default;
            brick.depth = BRICK_DEPTH;
            tracing::trace!(
                brick = %id,
                from = ?brick.last_position,
                to = ?brick.position,
                "brick left where released"
            );
        }
        feedback.on_drag_ended(id);
        tracing::debug!(brick = %id, ?outcome, "drag ended");
        ReleaseOutcome::Dropped { brick: id, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BrickType, CellId, TILE_WIDTH};
    use crate::reconcile::DropMiss;
    use crate::reconcile::tests::Recorder;

    fn sample(phase: PointerPhase, x: f32, y: f32) -> PointerSample {
        PointerSample {
            position: Point::new(x, y),
            phase,
        }
    }

    struct Fixture {
        board: Board,
        counters: Counters,
        session: DragSession,
        rec: Recorder,
    }

    impl Fixture {
        /// One drop-valid box at x 0..6, one blocked tile at x 6..12, y 0..3.
        fn new() -> Self {
            Self {
                board: Board::from_layout(&["#."]),
                counters: Counters::new(),
                session: DragSession::new(),
                rec: Recorder::default(),
            }
        }

        fn step(&mut self, phase: PointerPhase, x: f32, y: f32) -> StepOutcome {
            self.session.step(
                sample(phase, x, y),
                &mut self.board,
                &mut self.counters,
                &mut self.rec,
            )
        }
    }

    #[test]
    fn test_pick_move_release_places_brick() {
        let mut f = Fixture::new();
        let brick = f.board.spawn_brick(BrickType::Stone, Point::new(3.0, 10.0));

        assert_eq!(f.step(PointerPhase::Down, 3.0, 10.0), StepOutcome::Picked(brick));
        let held = f.board.brick(brick).unwrap();
        assert!(held.is_dragging);
        assert_eq!(held.layer, Layer::Dragging);
        assert_eq!(held.last_position, Some(Point::new(3.0, 10.0)));
        assert_eq!(f.rec.started, vec![brick]);

        assert_eq!(f.step(PointerPhase::Move, 2.0, 1.5), StepOutcome::Moved(brick));
        let held = f.board.brick(brick).unwrap();
        assert_eq!(held.position, Point::new(2.0, 1.5));
        assert_eq!(held.depth, DRAG_DEPTH);

        let outcome = f.step(PointerPhase::Up, 2.0, 1.5);
        assert!(matches!(
            outcome,
            StepOutcome::Released(ReleaseOutcome::Dropped {
                outcome: DropOutcome::Placed { cell: CellId(0), .. },
                ..
            })
        ));
        assert_eq!(f.session.state(), DragState::Idle);
        assert!(f.board.brick(brick).is_none());
        assert_eq!(f.counters.get(BrickType::Stone), 1);
        assert_eq!(f.rec.audio, 1);
        assert_eq!(f.rec.ended, vec![brick]);
    }

    #[test]
    fn test_drop_on_blocked_tile_leaves_brick() {
        let mut f = Fixture::new();
        let brick = f.board.spawn_brick(BrickType::Gold, Point::new(3.0, 10.0));
        f.step(PointerPhase::Down, 3.0, 10.0);
        f.step(PointerPhase::Move, TILE_WIDTH + 2.0, 1.0);
        let outcome = f.step(PointerPhase::Up, TILE_WIDTH + 2.0, 1.0);

        assert_eq!(
            outcome,
            StepOutcome::Released(ReleaseOutcome::Dropped {
                brick,
                outcome: DropOutcome::Missed(DropMiss::WrongTag(CellId(1)))
            })
        );
        let left = f.board.brick(brick).unwrap();
        assert!(!left.is_dragging);
        assert_eq!(left.layer, Layer::Default);
        assert_eq!(left.position, Point::new(TILE_WIDTH + 2.0, 1.0));
        assert_eq!(f.counters, Counters::new());
        assert_eq!(f.rec.ended, vec![brick]);
        assert_eq!(f.rec.audio, 0);
    }

    #[test]
    fn test_missed_brick_can_be_picked_again() {
        let mut f = Fixture::new();
        let brick = f.board.spawn_brick(BrickType::Gold, Point::new(3.0, 10.0));
        f.step(PointerPhase::Down, 3.0, 10.0);
        f.step(PointerPhase::Up, 30.0, 30.0);
        assert_eq!(f.step(PointerPhase::Down, 30.0, 30.0), StepOutcome::Picked(brick));
    }

    #[test]
    fn test_release_without_drag_is_noop() {
        let mut f = Fixture::new();
        f.board.spawn_brick(BrickType::Stone, Point::new(3.0, 10.0));
        let before = f.board.bricks().to_vec();
        assert_eq!(
            f.step(PointerPhase::Up, 3.0, 1.0),
            StepOutcome::Released(ReleaseOutcome::NoActiveDrag)
        );
        assert_eq!(f.counters, Counters::new());
        assert_eq!(f.board.bricks()[0].position, before[0].position);
        assert!(f.rec.ended.is_empty());
    }

    #[test]
    fn test_down_on_cell_does_not_pick() {
        let mut f = Fixture::new();
        f.board.spawn_brick(BrickType::Stone, Point::new(3.0, 10.0));
        assert_eq!(f.step(PointerPhase::Down, 1.0, 1.0), StepOutcome::Ignored);
        assert_eq!(f.step(PointerPhase::Move, 2.0, 2.0), StepOutcome::Ignored);
        assert!(!f.session.is_dragging());
    }

    #[test]
    fn test_second_down_while_dragging_is_ignored() {
        let mut f = Fixture::new();
        let a = f.board.spawn_brick(BrickType::Stone, Point::new(3.0, 10.0));
        let b = f.board.spawn_brick(BrickType::Gold, Point::new(20.0, 10.0));
        f.step(PointerPhase::Down, 3.0, 10.0);
        assert_eq!(f.step(PointerPhase::Down, 20.0, 10.0), StepOutcome::Ignored);
        assert_eq!(f.session.held(), Some(a));
        assert!(!f.board.brick(b).unwrap().is_dragging);
    }

    #[test]
    fn test_vanished_brick_ends_drag_on_move() {
        let mut f = Fixture::new();
        let brick = f.board.spawn_brick(BrickType::Stone, Point::new(3.0, 10.0));
        f.step(PointerPhase::Down, 3.0, 10.0);
        f.board.remove_brick(brick);
        assert_eq!(f.step(PointerPhase::Move, 2.0, 1.5), StepOutcome::Ignored);
        assert_eq!(f.session.state(), DragState::Idle);
        assert_eq!(f.rec.ended, vec![brick]);
    }

    #[test]
    fn test_vanished_brick_ends_drag_on_release() {
        let mut f = Fixture::new();
        let brick = f.board.spawn_brick(BrickType::Gold, Point::new(3.0, 10.0));
        f.step(PointerPhase::Down, 3.0, 10.0);
        f.board.remove_brick(brick);
        let outcome = f.session.release(
            Point::new(2.0, 1.5),
            &mut f.board,
            &mut f.counters,
            &mut f.rec,
        );
        assert_eq!(outcome, ReleaseOutcome::NoActiveDrag);
        assert!(!f.session.is_dragging());
        assert_eq!(f.rec.ended, vec![brick]);
        assert_eq!(f.counters, Counters::new());
    }

    #[test]
    fn test_held_brick_does_not_block_pick_raycast() {
        let mut board = Board::new();
        let under = board.spawn_brick(BrickType::Stone, Point::new(5.0, 5.0));
        let mut session = DragSession::new();
        let mut rec = Recorder::default();
        let top = board.spawn_brick(BrickType::Gold, Point::new(5.0, 5.0));
        board.brick_mut(top).unwrap().is_dragging = true;
        // Someone else is already dragging: no pick.
        assert_eq!(session.pick(Point::new(5.0, 5.0), &mut board, &mut rec), None);

        let held = board.brick_mut(top).unwrap();
        held.is_dragging = false;
        held.layer = Layer::Dragging;
        assert_eq!(
            session.pick(Point::new(5.0, 5.0), &mut board, &mut rec),
            Some(under)
        );
    }
}
