use std::fmt;

use bitflags::bitflags;

use crate::table::{Cell, Row};

bitflags! {
    /// Conversions that still succeed for every cell of a column seen so far.
    /// Intersected cell by cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct TypeGuesses: u32 {
        const BOOLEAN  = 1 << 0;
        const UNSIGNED = 1 << 1;
        const SIGNED   = 1 << 2;
        const FLOAT    = 1 << 3;
        const TEXT     = 1 << 4;
    }
}

// narrowest first; `TEXT` is always set for a non-empty cell
const NARROWEST_FIRST: [(TypeGuesses, Type); 5] = [
    (TypeGuesses::BOOLEAN, Type::Boolean),
    (TypeGuesses::UNSIGNED, Type::Unsigned),
    (TypeGuesses::SIGNED, Type::Signed),
    (TypeGuesses::FLOAT, Type::Float),
    (TypeGuesses::TEXT, Type::Text),
];

impl TypeGuesses {
    /// The narrowest `Type` whose conversion accepted every cell.
    pub(crate) fn best(&self) -> Type {
        NARROWEST_FIRST
            .iter()
            .find(|&&(flag, _)| self.contains(flag))
            .map_or(Type::Text, |&(_, ty)| ty)
    }
}

/// Guesses for a single cell, using the same rules as `Cell::to`.
pub(crate) fn infer_types(cell: Cell<'_>) -> TypeGuesses {
    if cell.is_empty() {
        // says nothing about the column
        return TypeGuesses::all();
    }
    let mut guesses = TypeGuesses::TEXT;
    if cell.to::<u64>().is_ok() { guesses |= TypeGuesses::UNSIGNED; }
    if cell.to::<i64>().is_ok() { guesses |= TypeGuesses::SIGNED; }
    if cell.to::<bool>().is_ok() { guesses |= TypeGuesses::BOOLEAN; }
    if cell.to::<f64>().is_ok() { guesses |= TypeGuesses::FLOAT; }
    guesses
}

/// Narrowest type of each of the first `width` columns over `rows`. Cells past the end of a
/// short row count as empty; a column with no non-empty cell at all is `Text`.
pub(crate) fn infer_column_types<'t, I>(rows: I, width: usize) -> Vec<Type>
where
    I: Iterator<Item = Row<'t>>,
{
    let mut guesses = vec![TypeGuesses::all(); width];
    let mut seen = vec![false; width];
    for row in rows {
        for (col, cell) in row.cells().take(width).enumerate() {
            if !cell.is_empty() {
                guesses[col] &= infer_types(cell);
                seen[col] = true;
            }
        }
    }
    guesses
        .iter()
        .zip(seen)
        .map(|(guess, seen)| if seen { guess.best() } else { Type::Text })
        .collect()
}

/// Column type reported by [`Table::column_types`](crate::Table::column_types).
///
/// Each variant names the [`Cell::to`](crate::Cell::to) target that accepts every
/// non-empty cell of the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    /// `true` / `false` only.
    Boolean,
    /// Fits `u64`.
    Unsigned,
    /// Fits `i64`, with at least one negative cell.
    Signed,
    /// Fits `f64` but not an integer type.
    Float,
    /// Anything else. Also reported for a column whose cells are all empty.
    Text,
}

impl Type {
    fn name(&self) -> &'static str {
        match *self {
            Type::Boolean => "Boolean",
            Type::Unsigned => "Unsigned",
            Type::Signed => "Signed",
            Type::Float => "Float",
            Type::Text => "Text",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
