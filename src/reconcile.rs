//! Assignment reconciliation: what happens when a held brick is let go over the board.
//!
//! Counters and the target cell change together in one call so that
//! `counts[T]` always equals the number of cells assigned `T`.

use crate::board::{Board, BrickId, BrickType, CellId, Counters, Hit, Layer, LayerMask, Point, Tag};
use crate::presentation::{AssetKey, Presentation};

/// Drop rays further than this from the camera plane miss.
pub const DROP_RAY_LENGTH: f32 = 20.0;

/// Why a drop did not land on a valid target. Misses are normal outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropMiss {
    NoCollider,
    /// Hit a drop-surface collider without the `DropValid` tag.
    WrongTag(CellId),
    OutOfRange(CellId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Placed {
        cell: CellId,
        previous: Option<BrickType>,
        placed: BrickType,
    },
    /// Cell already holds the brick's type: nothing changes and the brick survives.
    Inert { cell: CellId },
    Missed(DropMiss),
}

/// Resolve the drop target under `point` on the drop surface layer.
pub fn resolve_target(board: &Board, point: Point) -> Result<CellId, DropMiss> {
    let ray = board
        .raycast(point, LayerMask::only(Layer::DropSurface))
        .ok_or(DropMiss::NoCollider)?;
    let Hit::Cell(cell_id) = ray.hit else {
        return Err(DropMiss::NoCollider);
    };
    if ray.distance > DROP_RAY_LENGTH {
        return Err(DropMiss::OutOfRange(cell_id));
    }
    match board.cell(cell_id).map(|c| c.tag) {
        Some(Tag::DropValid) => Ok(cell_id),
        Some(Tag::Untagged) => Err(DropMiss::WrongTag(cell_id)),
        None => Err(DropMiss::NoCollider),
    }
}

/// Drop `brick` at `point`. Returns `None` if the brick does not exist.
///
/// On a placement the previous type (if any) loses one, the brick's type gains one,
/// the cell takes the brick's type, presentation is told about every change and the
/// brick is destroyed. Same-type drops and misses leave all state untouched.
pub fn drop_brick<P: Presentation + ?Sized>(
    board: &mut Board,
    counters: &mut Counters,
    brick: BrickId,
    point: Point,
    presentation: &mut P,
) -> Option<DropOutcome> {
    let brick_type = board.brick(brick)?.brick_type();
    let cell_id = match resolve_target(board, point) {
        Ok(id) => id,
        Err(miss) => {
            tracing::debug!(%brick, ?miss, "drop missed");
            return Some(DropOutcome::Missed(miss));
        }
    };

    let cell = board.cell_mut(cell_id)?;
    let previous = cell.assigned_type();
    let (col, row) = (cell.col, cell.row);
    if previous == Some(brick_type) {
        tracing::debug!(%brick, cell = %cell_id, "same-type drop is inert");
        return Some(DropOutcome::Inert { cell: cell_id });
    }
    cell.assign(brick_type);

    let lost = previous.map(|prev| (prev, counters.decrement(prev)));
    let gained = counters.increment(brick_type);

    if let Some((prev, value)) = lost {
        if value < 0 {
            tracing::error!(%prev, value, "counter went negative; cell state was inconsistent");
        }
        presentation.update_counter_display(prev, value);
    }
    presentation.update_counter_display(brick_type, gained);
    presentation.on_cell_updated(cell_id, brick_type, AssetKey::for_brick(brick_type));
    presentation.play_drop_audio();
    presentation.play_drop_particle(point);

    board.remove_brick(brick);
    tracing::info!(
        %brick,
        cell = %cell_id,
        col,
        row,
        ?previous,
        placed = %brick_type,
        "brick placed"
    );
    Some(DropOutcome::Placed {
        cell: cell_id,
        previous,
        placed: brick_type,
    })
}
