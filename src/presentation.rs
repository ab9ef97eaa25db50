//! Presentation seam: traits the core calls into, plus the terminal host's implementation.

use crate::board::{Bounds, BrickId, BrickType, CellId, Point};
use std::collections::HashMap;

/// How long a drop particle burst lives.
pub const PARTICLE_LIFETIME_MS: u32 = 450;

/// Typed visual asset keys; resolved to concrete visuals by an [`AssetResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKey {
    TransparentBox,
    StoneTile,
    GoldTile,
}

impl AssetKey {
    pub const fn for_brick(brick_type: BrickType) -> Self {
        match brick_type {
            BrickType::Stone => Self::StoneTile,
            BrickType::Gold => Self::GoldTile,
        }
    }

    pub const fn for_cell(assigned: Option<BrickType>) -> Self {
        match assigned {
            Some(t) => Self::for_brick(t),
            None => Self::TransparentBox,
        }
    }
}

pub trait AssetResolver {
    type Asset;

    fn resolve(&self, key: AssetKey) -> Self::Asset;
}

/// Visual/audio feedback driven by reconciliation.
pub trait Presentation {
    fn on_cell_updated(&mut self, cell: CellId, brick_type: BrickType, asset: AssetKey);
    fn play_drop_audio(&mut self);
    fn play_drop_particle(&mut self, at: Point);
    fn update_counter_display(&mut self, brick_type: BrickType, value: i32);
}

/// Fire-and-forget drag lifecycle notifications.
pub trait DragListener {
    fn on_drag_started(&mut self, _brick: BrickId) {}
    fn on_drag_ended(&mut self, _brick: BrickId) {}
}

/// Hover highlight: true when the pointer is over the cell.
pub fn should_highlight(pointer: Option<Point>, cell: &Bounds) -> bool {
    pointer.is_some_and(|p| cell.contains(p))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub at: Point,
    pub age_ms: u32,
}

/// Terminal host's view of presentation state: sprite per cell, counter texts,
/// pending bell and live particles. The UI renders only from this.
#[derive(Debug, Default)]
pub struct Feedback {
    sprites: HashMap<CellId, AssetKey>,
    counters: [i32; BrickType::COUNT],
    bell_pending: bool,
    pub particles: Vec<Particle>,
    /// Particles spawned since the renderer last looked; it attaches effects to them.
    new_particles: Vec<Point>,
    pub dragging: Option<BrickId>,
}

impl Feedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sprite(&self, cell: CellId) -> AssetKey {
        self.sprites
            .get(&cell)
            .copied()
            .unwrap_or(AssetKey::for_cell(None))
    }

    pub fn counter(&self, brick_type: BrickType) -> i32 {
        self.counters[brick_type.index()]
    }

    /// Returns true once per pending drop sound.
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell_pending)
    }

    pub fn take_new_particles(&mut self) -> Vec<Point> {
        std::mem::take(&mut self.new_particles)
    }

    pub fn tick_particles(&mut self, delta_ms: u32) {
        self.particles.retain_mut(|p| {
            p.age_ms += delta_ms;
            p.age_ms < PARTICLE_LIFETIME_MS
        });
    }
}

impl Presentation for Feedback {
    fn on_cell_updated(&mut self, cell: CellId, _brick_type: BrickType, asset: AssetKey) {
        self.sprites.insert(cell, asset);
    }

    fn play_drop_audio(&mut self) {
        self.bell_pending = true;
    }

    fn play_drop_particle(&mut self, at: Point) {
        self.particles.push(Particle { at, age_ms: 0 });
        self.new_particles.push(at);
    }

    fn update_counter_display(&mut self, brick_type: BrickType, value: i32) {
        self.counters[brick_type.index()] = value;
    }
}

impl DragListener for Feedback {
    fn on_drag_started(&mut self, brick: BrickId) {
        self.dragging = Some(brick);
    }

    fn on_drag_ended(&mut self, _brick: BrickId) {
        self.dragging = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_highlight() {
        let bounds = Bounds::new(0.0, 0.0, 6.0, 3.0);
        assert!(should_highlight(Some(Point::new(0.5, 0.5)), &bounds));
        assert!(!should_highlight(Some(Point::new(6.5, 0.5)), &bounds));
        assert!(!should_highlight(None, &bounds));
    }

    #[test]
    fn test_asset_key_for_cell() {
        assert_eq!(AssetKey::for_cell(None), AssetKey::TransparentBox);
        assert_eq!(AssetKey::for_cell(Some(BrickType::Gold)), AssetKey::GoldTile);
        assert_eq!(AssetKey::for_brick(BrickType::Stone), AssetKey::StoneTile);
    }

    #[test]
    fn test_feedback_sprite_defaults_to_empty_box() {
        let mut fb = Feedback::new();
        assert_eq!(fb.sprite(CellId(3)), AssetKey::for_cell(None));
        fb.on_cell_updated(CellId(3), BrickType::Stone, AssetKey::StoneTile);
        assert_eq!(fb.sprite(CellId(3)), AssetKey::for_cell(Some(BrickType::Stone)));
        assert_eq!(fb.sprite(CellId(4)), AssetKey::TransparentBox);
    }

    #[test]
    fn test_feedback_bell_fires_once() {
        let mut fb = Feedback::new();
        assert!(!fb.take_bell());
        fb.play_drop_audio();
        assert!(fb.take_bell());
        assert!(!fb.take_bell());
    }

    #[test]
    fn test_feedback_particles_expire() {
        let mut fb = Feedback::new();
        fb.play_drop_particle(Point::new(1.0, 1.0));
        assert_eq!(fb.take_new_particles().len(), 1);
        assert!(fb.take_new_particles().is_empty());
        fb.tick_particles(PARTICLE_LIFETIME_MS / 2);
        assert_eq!(fb.particles.len(), 1);
        fb.tick_particles(PARTICLE_LIFETIME_MS);
        assert!(fb.particles.is_empty());
    }

    #[test]
    fn test_feedback_tracks_sprites_and_counters() {
        let mut fb = Feedback::new();
        assert_eq!(fb.sprite(CellId(3)), AssetKey::TransparentBox);
        fb.on_cell_updated(CellId(3), BrickType::Stone, AssetKey::StoneTile);
        fb.update_counter_display(BrickType::Stone, 2);
        assert_eq!(fb.sprite(CellId(3)), AssetKey::StoneTile);
        assert_eq!(fb.counter(BrickType::Stone), 2);
        assert_eq!(fb.counter(BrickType::Gold), 0);
    }
}
