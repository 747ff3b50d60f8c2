//! Board files.
//!
//! A board is described in TOML: dimensions, the goal cell for slot 0,
//! optional interchangeable groups and one `[[pieces]]` table per slot.
//!
//! ```
//! use klotski::config::BoardFile;
//!
//! let file = BoardFile::from_toml_str(r#"
//!     name = "gate"
//!     width = 3
//!     height = 3
//!     target = [0, 0]
//!
//!     [[pieces]]
//!     name = "target"
//!     width = 1
//!     height = 1
//!     col = 1
//!     row = 2
//!
//!     [[pieces]]
//!     name = "blocker"
//!     width = 2
//!     height = 1
//!     col = 0
//!     row = 1
//! "#).unwrap();
//!
//! let puzzle = file.puzzle().unwrap();
//! assert_eq!(puzzle.num_pieces(), 2);
//! ```
//!
//! When `groups` is omitted, every shape shared by two or more pieces other
//! than slot 0 forms a group.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PuzzleError;
use crate::pieces::{shape_groups, Board, Goal, PieceSpec, Preset, Puzzle};

/// Board file error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
}

/// One `[[pieces]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PieceEntry {
    pub name: String,
    pub width: u8,
    pub height: u8,
    pub col: i32,
    pub row: i32,
}

/// A board as written in a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BoardFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub width: u8,
    pub height: u8,
    /// Goal anchor `[col, row]` for slot 0.
    pub target: [i32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Vec<usize>>>,
    pub pieces: Vec<PieceEntry>,
}

impl BoardFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Writes a built-in board out in file form, groups included.
    pub fn from_preset(preset: &Preset) -> Self {
        Self {
            name: Some(preset.name.to_string()),
            width: preset.board.width,
            height: preset.board.height,
            target: [preset.target.0, preset.target.1],
            groups: Some(preset.groups.iter().map(|g| g.to_vec()).collect()),
            pieces: preset
                .pieces
                .iter()
                .map(|&(name, width, height, col, row)| PieceEntry {
                    name: name.to_string(),
                    width,
                    height,
                    col,
                    row,
                })
                .collect(),
        }
    }

    /// Builds and validates the puzzle, target cell included.
    pub fn puzzle(&self) -> Result<Puzzle, ConfigError> {
        let board = Board::new(self.width, self.height);
        let pieces: Vec<PieceSpec> = self
            .pieces
            .iter()
            .map(|p| PieceSpec::new(p.name.clone(), p.width, p.height, p.col, p.row))
            .collect();
        let groups = match &self.groups {
            Some(groups) => groups.clone(),
            None => shape_groups(&pieces),
        };
        let puzzle = Puzzle::new(board, pieces, groups)?;

        let goal = self.goal();
        let fits = puzzle
            .pieces()
            .first()
            .is_some_and(|target| crate::geometry::fits(board, goal.anchor, target.shape));
        if !fits {
            return Err(PuzzleError::InvalidConfig(format!(
                "target {:?} does not fit slot 0 on the {}x{} board",
                goal.anchor, self.width, self.height
            ))
            .into());
        }
        Ok(puzzle)
    }

    pub fn goal(&self) -> Goal {
        Goal::new((self.target[0], self.target[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::{HENG_DAO_LI_MA, PRESETS};

    const GATE: &str = r#"
        width = 3
        height = 3
        target = [0, 0]

        [[pieces]]
        name = "target"
        width = 1
        height = 1
        col = 1
        row = 2

        [[pieces]]
        name = "left"
        width = 1
        height = 1
        col = 0
        row = 1

        [[pieces]]
        name = "right"
        width = 1
        height = 1
        col = 2
        row = 1
    "#;

    #[test]
    fn test_groups_derived_when_omitted() {
        let file = BoardFile::from_toml_str(GATE).unwrap();
        assert_eq!(file.name, None);
        assert_eq!(file.groups, None);
        let puzzle = file.puzzle().unwrap();
        assert_eq!(puzzle.groups(), &[vec![1, 2]]);
        assert_eq!(file.goal(), Goal::new((0, 0)));
    }

    #[test]
    fn test_presets_survive_export() {
        for preset in PRESETS {
            let text = BoardFile::from_preset(preset).to_toml_string().unwrap();
            let file = BoardFile::from_toml_str(&text).unwrap();
            let puzzle = file.puzzle().unwrap();
            let expected = preset.puzzle().unwrap();
            assert_eq!(puzzle.pieces(), expected.pieces(), "{}", preset.name);
            assert_eq!(puzzle.groups(), expected.groups(), "{}", preset.name);
            assert_eq!(file.goal(), preset.goal());
        }
    }

    #[test]
    fn test_exported_reference_board() {
        let text = BoardFile::from_preset(&HENG_DAO_LI_MA)
            .to_toml_string()
            .unwrap();
        assert!(text.starts_with("name = \"heng-dao-li-ma\"\n"));
        assert!(text.contains("target = [1, 0]"));
        assert_eq!(text.matches("[[pieces]]").count(), 10);
    }

    #[test]
    fn test_overlapping_pieces_are_rejected() {
        let text = GATE.replace("col = 2\n        row = 1", "col = 0\n        row = 1");
        let err = BoardFile::from_toml_str(&text).unwrap().puzzle().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Puzzle(PuzzleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_target_must_fit() {
        let text = GATE.replace("target = [0, 0]", "target = [3, 0]");
        let err = BoardFile::from_toml_str(&text).unwrap().puzzle().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Puzzle(PuzzleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = BoardFile::from_toml_str("width = \"four\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = BoardFile::load("no/such/board.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
