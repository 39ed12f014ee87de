//! A1-notation cell and range addressing
//!
//! Rows and columns are 1-based, matching spreadsheet conventions:
//! `A1` is `(row 1, col 1)`, `B5` is `(row 5, col 2)`, `AA10` is `(row 10, col 27)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A single cell address (1-based row and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Render as A1 notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }

    /// Parse A1 notation (case-insensitive column letters)
    pub fn parse_a1(input: &str) -> Result<Self> {
        let s = input.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| Error::InvalidInput(format!("Cell reference without row: '{}'", input)))?;
        let (letters, digits) = s.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidInput(format!("Invalid column in '{}'", input)));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            let value = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
            col = col
                .checked_mul(26)
                .and_then(|v| v.checked_add(value))
                .ok_or_else(|| Error::InvalidInput(format!("Column out of range in '{}'", input)))?;
        }

        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Invalid row in '{}'", input)))?;
        if row == 0 {
            return Err(Error::InvalidInput(format!("Row must be >= 1 in '{}'", input)));
        }

        Ok(Self { row, col })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_a1(s)
    }
}

/// Rectangular range between two cells (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    pub fn new(start: CellRef, end: CellRef) -> Self {
        Self {
            start: CellRef::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellRef::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Parse `"C5:K200"` style ranges
    pub fn parse(input: &str) -> Result<Self> {
        let (a, b) = input
            .split_once(':')
            .ok_or_else(|| Error::InvalidInput(format!("Range without ':' separator: '{}'", input)))?;
        Ok(Self::new(CellRef::parse_a1(a)?, CellRef::parse_a1(b)?))
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Convert a 1-based column index to letters (`1 → A`, `27 → AA`)
pub fn column_letters(mut col: u32) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        col = (col - 1) / 26;
    }
    out.iter().rev().collect()
}
