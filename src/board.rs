//! Board model: brick types, bricks, grid cells, counters and raycasts.
//!
//! World units are terminal cells: x grows to the right, y grows downwards.
//! Depth grows towards the camera, so a larger depth draws on top and is hit first.

use std::fmt;

/// Depth of the camera plane. Raycast distance is measured from here.
pub const CAMERA_DEPTH: f32 = 10.0;
/// Resting depth of grid cells.
pub const CELL_DEPTH: f32 = 0.0;
/// Resting depth of bricks (above cells).
pub const BRICK_DEPTH: f32 = 1.0;
/// Held bricks float at this depth so they render above everything else.
pub const DRAG_DEPTH: f32 = 5.0;

/// Grid tile footprint in world units.
pub const TILE_WIDTH: f32 = 6.0;
pub const TILE_HEIGHT: f32 = 3.0;
/// Brick footprint in world units.
pub const BRICK_WIDTH: f32 = 4.0;
pub const BRICK_HEIGHT: f32 = 2.0;

/// Brick kinds. Closed set; per-type tables iterate [`BrickType::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrickType {
    Stone,
    Gold,
}

impl BrickType {
    pub const ALL: [Self; 2] = [Self::Stone, Self::Gold];
    pub const COUNT: usize = Self::ALL.len();

    /// Index into per-type tables.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Stone => 0,
            Self::Gold => 1,
        }
    }

    /// Lowercase key used in level files.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Stone => "stone",
            Self::Gold => "gold",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for BrickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stone => f.pad("Stone"),
            Self::Gold => f.pad("Gold"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in world units. Left/top edges inclusive, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn centered(center: Point, width: f32, height: f32) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    #[cfg(test)]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Collision layers. Raycasts filter colliders through a [`LayerMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Default,
    /// Held bricks; ignored by pick raycasts.
    Dragging,
    /// Grid cells that may receive a drop.
    DropSurface,
}

impl Layer {
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask(u8);

impl LayerMask {
    pub const ALL: Self = Self(u8::MAX);

    pub const fn only(layer: Layer) -> Self {
        Self(layer.bit())
    }

    pub const fn without(self, layer: Layer) -> Self {
        Self(self.0 & !layer.bit())
    }

    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & layer.bit() != 0
    }
}

/// Collider tag. Only `DropValid` colliders accept bricks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Untagged,
    DropValid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BrickId(pub u32);

impl fmt::Display for BrickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "brick#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub usize);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell#{}", self.0)
    }
}

/// A draggable brick with a fixed type.
#[derive(Debug, Clone)]
pub struct Brick {
    id: BrickId,
    brick_type: BrickType,
    pub is_dragging: bool,
    /// Centre of the brick in world space.
    pub position: Point,
    pub depth: f32,
    pub layer: Layer,
    /// Where the brick was when the current (or last) drag began.
    pub last_position: Option<Point>,
}

impl Brick {
    pub fn id(&self) -> BrickId {
        self.id
    }

    pub fn brick_type(&self) -> BrickType {
        self.brick_type
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::centered(self.position, BRICK_WIDTH, BRICK_HEIGHT)
    }
}

/// A placement target. Unassigned cells render as transparent boxes.
#[derive(Debug, Clone)]
pub struct GridCell {
    id: CellId,
    pub col: u16,
    pub row: u16,
    pub bounds: Bounds,
    pub depth: f32,
    pub layer: Layer,
    pub tag: Tag,
    /// Checkerboard parity: odd cells use the offset tile colour.
    pub offset: bool,
    assigned: Option<BrickType>,
}

impl GridCell {
    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn assigned_type(&self) -> Option<BrickType> {
        self.assigned
    }

    pub fn is_drop_valid(&self) -> bool {
        self.tag == Tag::DropValid
    }

    /// Only the reconciler assigns cells; counters must move in the same step.
    pub(crate) fn assign(&mut self, brick_type: BrickType) {
        self.assigned = Some(brick_type);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Brick(BrickId),
    Cell(CellId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub hit: Hit,
    /// Distance from the camera plane.
    pub distance: f32,
}

/// Cells and bricks of one level.
#[derive(Debug, Clone, Default)]
pub struct Board {
    cells: Vec<GridCell>,
    bricks: Vec<Brick>,
    next_brick_id: u32,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build cells from layout rows: `#` is a drop-valid box, `.` a blocked tile,
    /// anything else leaves the slot empty.
    pub fn from_layout<S: AsRef<str>>(rows: &[S]) -> Self {
        let mut board = Self::new();
        for (row, line) in rows.iter().enumerate() {
            for (col, ch) in line.as_ref().chars().enumerate() {
                let tag = match ch {
                    '#' => Tag::DropValid,
                    '.' => Tag::Untagged,
                    _ => continue,
                };
                let bounds = Bounds::new(
                    col as f32 * TILE_WIDTH,
                    row as f32 * TILE_HEIGHT,
                    TILE_WIDTH,
                    TILE_HEIGHT,
                );
                board.push_cell(col as u16, row as u16, bounds, tag);
            }
        }
        board
    }

    /// Add a cell on the drop surface layer at cell depth.
    pub fn push_cell(&mut self, col: u16, row: u16, bounds: Bounds, tag: Tag) -> CellId {
        let id = CellId(self.cells.len());
        self.cells.push(GridCell {
            id,
            col,
            row,
            bounds,
            depth: CELL_DEPTH,
            layer: Layer::DropSurface,
            tag,
            offset: (col + row) % 2 == 1,
            assigned: None,
        });
        id
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&GridCell> {
        self.cells.get(id.0)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut GridCell> {
        self.cells.get_mut(id.0)
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn brick(&self, id: BrickId) -> Option<&Brick> {
        self.bricks.iter().find(|b| b.id == id)
    }

    pub fn brick_mut(&mut self, id: BrickId) -> Option<&mut Brick> {
        self.bricks.iter_mut().find(|b| b.id == id)
    }

    pub fn spawn_brick(&mut self, brick_type: BrickType, at: Point) -> BrickId {
        let id = BrickId(self.next_brick_id);
        self.next_brick_id += 1;
        self.bricks.push(Brick {
            id,
            brick_type,
            is_dragging: false,
            position: at,
            depth: BRICK_DEPTH,
            layer: Layer::Default,
            last_position: None,
        });
        id
    }

    pub fn remove_brick(&mut self, id: BrickId) -> Option<Brick> {
        let idx = self.bricks.iter().position(|b| b.id == id)?;
        Some(self.bricks.remove(idx))
    }

    pub fn any_dragging(&self) -> bool {
        self.bricks.iter().any(|b| b.is_dragging)
    }

    #[cfg(test)]
    /// Number of cells currently assigned `brick_type`.
    pub fn assigned_count(&self, brick_type: BrickType) -> usize {
        self.cells
            .iter()
            .filter(|c| c.assigned == Some(brick_type))
            .count()
    }

    /// Extent of the grid (right/bottom edge of the furthest cell).
    pub fn grid_extent(&self) -> (f32, f32) {
        self.cells.iter().fold((0.0, 0.0), |(w, h), c| {
            (
                f32::max(w, c.bounds.x + c.bounds.width),
                f32::max(h, c.bounds.y + c.bounds.height),
            )
        })
    }

    /// Closest collider under `point` whose layer is in `mask`.
    /// Colliders behind the camera are never hit. On equal distance the later one wins
    /// (it was drawn last).
    pub fn raycast(&self, point: Point, mask: LayerMask) -> Option<RayHit> {
        let bricks = self
            .bricks
            .iter()
            .map(|b| (Hit::Brick(b.id), b.layer, b.depth, b.bounds()));
        let cells = self
            .cells
            .iter()
            .map(|c| (Hit::Cell(c.id), c.layer, c.depth, c.bounds));

        let mut best: Option<RayHit> = None;
        for (hit, layer, depth, bounds) in cells.chain(bricks) {
            if !mask.contains(layer) || !bounds.contains(point) {
                continue;
            }
            let distance = CAMERA_DEPTH - depth;
            if distance < 0.0 {
                continue;
            }
            if best.is_none_or(|b| distance <= b.distance) {
                best = Some(RayHit { hit, distance });
            }
        }
        best
    }
}

/// Running per-type placement counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    counts: [i32; BrickType::COUNT],
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, brick_type: BrickType) -> i32 {
        self.counts[brick_type.index()]
    }

    pub(crate) fn increment(&mut self, brick_type: BrickType) -> i32 {
        let slot = &mut self.counts[brick_type.index()];
        *slot += 1;
        *slot
    }

    pub(crate) fn decrement(&mut self, brick_type: BrickType) -> i32 {
        let slot = &mut self.counts[brick_type.index()];
        *slot -= 1;
        *slot
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (BrickType, i32)> + '_ {
        BrickType::ALL.into_iter().map(|t| (t, self.get(t)))
    }

    #[cfg(test)]
    /// True when every counter equals the number of cells assigned that type.
    pub fn matches_board(&self, board: &Board) -> bool {
        self.iter()
            .all(|(t, n)| usize::try_from(n).is_ok_and(|n| n == board.assigned_count(t)))
    }
}
