//! The flag/mask filter shared by every query that narrows rows on a bitmask.
//!
//! | flags   | mask    | predicate                       |
//! |---------|---------|---------------------------------|
//! | `None`  | `None`  | none, every row matches         |
//! | `Some`  | `None`  | `column = flags`                |
//! | `None`  | `Some`  | `(column & mask) = 0`           |
//! | `Some`  | `Some`  | `(column & mask) = flags`       |
//!
//! A missing mask means all bits, which makes a lone flag value an exact match.

use rusqlite::types::Value;

use crate::builder::Clause;

const ALL_BITS: i64 = -1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlagFilter {
    flags: Option<i64>,
    mask: Option<i64>,
}

impl FlagFilter {
    pub const fn new(flags: Option<i64>, mask: Option<i64>) -> Self {
        Self { flags, mask }
    }
    /// Matches every row.
    pub const fn any() -> Self {
        Self { flags: None, mask: None }
    }
    pub fn exact(flags: impl Into<i64>) -> Self {
        Self { flags: Some(flags.into()), mask: None }
    }
    pub fn masked(flags: impl Into<i64>, mask: impl Into<i64>) -> Self {
        Self { flags: Some(flags.into()), mask: Some(mask.into()) }
    }
    /// Matches rows with none of the `mask` bits set.
    pub fn cleared(mask: impl Into<i64>) -> Self {
        Self { flags: None, mask: Some(mask.into()) }
    }

    pub fn flags(&self) -> Option<i64> {
        self.flags
    }
    pub fn mask(&self) -> Option<i64> {
        self.mask
    }
    pub fn is_empty(&self) -> bool {
        self.flags.is_none() && self.mask.is_none()
    }

    fn resolved(&self) -> (i64, i64) {
        (self.flags.unwrap_or(0), self.mask.unwrap_or(ALL_BITS))
    }

    /// The same test the rendered clause performs, applied to one value.
    pub fn matches(&self, value: i64) -> bool {
        if self.is_empty() {
            return true;
        }
        let (flags, mask) = self.resolved();
        value & mask == flags
    }

    /// Renders the predicate against `column`, or `None` when nothing is filtered.
    pub fn clause(&self, column: &'static str) -> Option<Clause> {
        if self.is_empty() {
            return None;
        }
        let (flags, mask) = self.resolved();
        Some(Clause::new(
            format!("({column} & ?) = ?"),
            vec![Value::Integer(mask), Value::Integer(flags)],
        ))
    }
}
