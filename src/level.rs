//! Level metadata: targets and layouts, loaded from `level[ID].key = value` files.

use crate::board::BrickType;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Levels shipped with the game; used when no level file is given.
const BUILTIN_LEVELS: &str = r#"
# Level 1: warm-up.
level[1].stone = 2
level[1].gold = 1
level[1].row = "###"

# Level 2: blocked tiles in the middle.
level[2].stone = 3
level[2].gold = 2
level[2].row = "#.#"
level[2].row = "###"
level[2].row = "#.."

# Level 3: swap-heavy.
level[3].stone = 2
level[3].gold = 4
level[3].row = "####"
level[3].row = "#..#"
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LevelId(pub u32);

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {}", self.0)
    }
}

/// Accepts `"3"` or a scene-style name such as `"Level 3"` (last token is the number).
impl FromStr for LevelId {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .last()
            .and_then(|n| n.parse().ok())
            .map(Self)
            .ok_or_else(|| LevelError::InvalidId(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level metadata not found for {0}")]
    NotFound(LevelId),
    #[error("invalid level id: {0:?}")]
    InvalidId(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("{0} has no layout rows")]
    EmptyLayout(LevelId),
    #[error("{id} needs {required} placements but has only {cells} drop-valid cells")]
    Unreachable {
        id: LevelId,
        required: u32,
        cells: usize,
    },
    #[error("no levels defined")]
    Empty,
}

/// Required count per brick type. Types without an entry require zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelTarget {
    required: [u32; BrickType::COUNT],
}

impl LevelTarget {
    #[cfg(test)]
    pub fn new(pairs: &[(BrickType, u32)]) -> Self {
        let mut target = Self::default();
        for &(t, n) in pairs {
            target.required[t.index()] = n;
        }
        target
    }

    pub fn required(&self, brick_type: BrickType) -> u32 {
        self.required[brick_type.index()]
    }

    pub fn total(&self) -> u32 {
        self.required.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub id: LevelId,
    pub target: LevelTarget,
    /// Layout rows: `#` drop-valid box, `.` blocked tile, space for no cell.
    pub rows: Vec<String>,
}

impl Level {
    pub fn drop_valid_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.chars().filter(|&c| c == '#').count())
            .sum()
    }
}

/// Source of level targets for the win check.
pub trait LevelProvider {
    fn level_target(&self, id: LevelId) -> Result<&LevelTarget, LevelError>;
}

/// All levels of a session, ordered by id.
#[derive(Debug, Clone)]
pub struct LevelBook {
    levels: Vec<Level>,
}

impl LevelBook {
    pub fn builtin() -> Result<Self, LevelError> {
        Self::parse(BUILTIN_LEVELS)
    }

    /// Load from a level file, or the built-in book if `path` is None.
    pub fn load(path: Option<&Path>) -> Result<Self, LevelError> {
        match path {
            Some(p) => Self::parse(&std::fs::read_to_string(p)?),
            None => Self::builtin(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, LevelError> {
        let mut levels: BTreeMap<LevelId, Level> = BTreeMap::new();
        for (idx, raw) in s.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |message: &str| LevelError::Parse {
                line: idx + 1,
                message: message.to_string(),
            };
            let (id, key, value) =
                parse_level_line(line).ok_or_else(|| err("expected level[ID].key = value"))?;
            let level = levels.entry(id).or_insert_with(|| Level {
                id,
                target: LevelTarget::default(),
                rows: Vec::new(),
            });
            if key == "row" {
                level.rows.push(value.to_string());
            } else if let Some(t) = BrickType::from_key(key) {
                let n = value
                    .parse::<u32>()
                    .map_err(|_| err(&format!("invalid count {value:?} for {key}")))?;
                level.target.required[t.index()] = n;
            } else {
                return Err(err(&format!("unknown key {key:?}")));
            }
        }

        for level in levels.values() {
            if level.rows.is_empty() {
                return Err(LevelError::EmptyLayout(level.id));
            }
            let cells = level.drop_valid_cells();
            if level.target.total() as usize > cells {
                return Err(LevelError::Unreachable {
                    id: level.id,
                    required: level.target.total(),
                    cells,
                });
            }
        }
        if levels.is_empty() {
            return Err(LevelError::Empty);
        }
        Ok(Self {
            levels: levels.into_values().collect(),
        })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn get(&self, id: LevelId) -> Option<&Level> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn first(&self) -> Option<&Level> {
        self.levels.first()
    }

    /// Level following `id` in book order.
    pub fn next_after(&self, id: LevelId) -> Option<&Level> {
        self.levels.iter().find(|l| l.id > id)
    }

    /// Level preceding `id` in book order.
    pub fn prev_before(&self, id: LevelId) -> Option<&Level> {
        self.levels.iter().rev().find(|l| l.id < id)
    }
}

impl LevelProvider for LevelBook {
    fn level_target(&self, id: LevelId) -> Result<&LevelTarget, LevelError> {
        self.get(id)
            .map(|l| &l.target)
            .ok_or(LevelError::NotFound(id))
    }
}

/// Split `level[ID].key = value` into its parts. Value quotes are stripped; inner
/// spaces of a quoted row are kept.
fn parse_level_line(line: &str) -> Option<(LevelId, &str, &str)> {
    let rest = line.strip_prefix("level[")?;
    let end = rest.find(']')?;
    let id = LevelId(rest[..end].trim().parse().ok()?);
    let rest = rest[end + 1..].strip_prefix('.')?;
    let eq = rest.find('=')?;
    let key = rest[..eq].trim();
    let value = rest[eq + 1..].trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    if key.is_empty() {
        return None;
    }
    Some((id, key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_parse() {
        let book = LevelBook::builtin().unwrap();
        assert_eq!(book.levels().len(), 3);
        let first = book.first().unwrap();
        assert_eq!(first.id, LevelId(1));
        assert_eq!(first.target.required(BrickType::Stone), 2);
        assert_eq!(first.target.required(BrickType::Gold), 1);
        assert_eq!(first.rows, vec!["###".to_string()]);
    }

    #[test]
    fn test_level_id_from_scene_name() {
        assert_eq!("Level 3".parse::<LevelId>().unwrap(), LevelId(3));
        assert_eq!("7".parse::<LevelId>().unwrap(), LevelId(7));
        assert!(matches!(
            "Level three".parse::<LevelId>(),
            Err(LevelError::InvalidId(_))
        ));
        assert!("".parse::<LevelId>().is_err());
    }

    #[test]
    fn test_parse_quoted_row_keeps_spaces() {
        let book = LevelBook::parse("level[4].row = ' # '\nlevel[4].gold = 1").unwrap();
        let level = book.get(LevelId(4)).unwrap();
        assert_eq!(level.rows, vec![" # ".to_string()]);
        assert_eq!(level.target.required(BrickType::Stone), 0);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = LevelBook::parse("level[1].row = \"#\"\nlevel[1].clay = 2").unwrap_err();
        assert!(matches!(err, LevelError::Parse { line: 2, .. }));
        let err = LevelBook::parse("level[1].row = \"#\"\nlevel[1].stone = many").unwrap_err();
        assert!(matches!(err, LevelError::Parse { line: 2, .. }));
        let err = LevelBook::parse("lvl[1].stone = 1").unwrap_err();
        assert!(matches!(err, LevelError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_books() {
        assert!(matches!(
            LevelBook::parse("level[2].stone = 0"),
            Err(LevelError::EmptyLayout(LevelId(2)))
        ));
        assert!(matches!(
            LevelBook::parse("level[1].stone = 2\nlevel[1].row = \"#.\""),
            Err(LevelError::Unreachable { required: 2, cells: 1, .. })
        ));
        assert!(matches!(LevelBook::parse("# nothing"), Err(LevelError::Empty)));
    }

    #[test]
    fn test_navigation_and_provider() {
        let book = LevelBook::builtin().unwrap();
        assert_eq!(book.next_after(LevelId(1)).map(|l| l.id), Some(LevelId(2)));
        assert_eq!(book.next_after(LevelId(3)), None);
        assert_eq!(book.prev_before(LevelId(2)).map(|l| l.id), Some(LevelId(1)));
        assert!(book.level_target(LevelId(2)).is_ok());
        assert!(matches!(
            book.level_target(LevelId(42)),
            Err(LevelError::NotFound(LevelId(42)))
        ));
    }
}
