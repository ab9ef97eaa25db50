//! Win check: live counters against the level's required counts.

use crate::board::{BrickType, Counters};
use crate::level::{LevelError, LevelId, LevelProvider};

/// True iff every brick type's count equals the level's requirement.
/// Unknown levels are an error, never a silent `false`.
pub fn evaluate<P: LevelProvider + ?Sized>(
    counters: &Counters,
    provider: &P,
    level: LevelId,
) -> Result<bool, LevelError> {
    let target = provider.level_target(level)?;
    Ok(BrickType::ALL
        .into_iter()
        .all(|t| i64::from(counters.get(t)) == i64::from(target.required(t))))
}

/// Per-type `(placed, required)` pairs for display.
pub fn progress<P: LevelProvider + ?Sized>(
    counters: &Counters,
    provider: &P,
    level: LevelId,
) -> Result<Vec<(BrickType, i32, u32)>, LevelError> {
    let target = provider.level_target(level)?;
    Ok(BrickType::ALL
        .into_iter()
        .map(|t| (t, counters.get(t), target.required(t)))
        .collect())
}
