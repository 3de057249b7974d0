use std::borrow::Cow;
use std::fmt;
use std::io::Read;
use std::iter::FusedIterator;
use std::path::Path;
use std::slice;

use crate::convert::FromCell;
use crate::error::*;
use crate::field_type::{infer_column_types, Type};
use crate::parser::{self, CellSpan, Parsed, RowSpan};
use crate::source;

/// Label used in diagnostics for tables built from in-memory text.
pub const MEMORY_LABEL: &str = "memory";

/// A fully parsed CSV document.
///
/// The table holds the source text (owned, or borrowed for `'src`) together with the
/// positions of every row and cell in it. [`Row`] and [`Cell`] are views borrowing the
/// table, so none of them can outlive it, and none of them copy any text.
///
/// ```
/// use csv_view::Table;
///
/// let table = Table::from_text("1,2\n3,4\n8,2\n")?;
/// assert_eq!(table.height(), 3);
/// assert_eq!(table.width(), 2);
/// assert_eq!(table.cell(1, 1).unwrap().as_str(), "4");
/// # Ok::<(), csv_view::error::Error>(())
/// ```
pub struct Table<'src> {
    buffer: Cow<'src, str>,
    label: String,
    rows: Vec<RowSpan>,
    cells: Vec<CellSpan>,
}

impl Table<'static> {
    /// Loads and parses the file at `path`.
    ///
    /// Line endings are normalized to `\n` before parsing. Fails with [`Error::Io`] if the
    /// file cannot be read (or is not UTF-8) and with [`Error::MalformedQuotedField`] if
    /// the content does not parse.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Table<'static>> {
        let path = path.as_ref();
        let text = source::read_path(path)?;
        Table::build(Cow::Owned(text), path.display().to_string())
    }

    /// Reads `reader` to the end, normalizes its line endings and parses it.
    pub fn from_reader<R: Read, L: Into<String>>(reader: R, label: L) -> Result<Table<'static>> {
        let label = label.into();
        let text = source::read_normalized(reader, &label)?;
        Table::build(Cow::Owned(text), label)
    }
}

impl<'src> Table<'src> {
    /// Parses `text` as is, labelled `"memory"` in diagnostics.
    ///
    /// The text is used directly as the buffer: borrowed text stays borrowed, and line
    /// endings are not normalized.
    pub fn from_text<T: Into<Cow<'src, str>>>(text: T) -> Result<Table<'src>> {
        Table::build(text.into(), MEMORY_LABEL.to_string())
    }

    /// Same as [`Table::from_text`] with a custom diagnostic label.
    pub fn from_text_with_label<T, L>(text: T, label: L) -> Result<Table<'src>>
    where
        T: Into<Cow<'src, str>>,
        L: Into<String>,
    {
        Table::build(text.into(), label.into())
    }

    fn build(buffer: Cow<'src, str>, label: String) -> Result<Table<'src>> {
        let Parsed { rows, cells } = parser::parse(&buffer, &label)?;
        Ok(Table { buffer, label, rows, cells })
    }

    /// The path or label this table was built from.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The whole source buffer.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows. Blank lines are not rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of cells in the first row, or `0` for an empty table. Other rows may be
    /// shorter or longer.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |row| row.n_cells)
    }

    /// Rows in document order.
    pub fn rows(&self) -> Rows<'_> {
        Rows { buffer: &self.buffer, cells: &self.cells, inner: self.rows.iter() }
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|span| Row::new(&self.buffer, &self.cells, span))
    }

    /// The cell at `row`, `col` (both 0-based).
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell<'_>> {
        self.row(row).and_then(|row| row.get(col))
    }

    /// Infers the narrowest type fitting every cell of each of the first `width()`
    /// columns. With `has_header_row`, the first row is left out.
    pub fn column_types(&self, has_header_row: bool) -> Vec<Type> {
        let skip = usize::from(has_header_row);
        infer_column_types(self.rows().skip(skip), self.width())
    }
}

impl fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Table")
            .field("label", &self.label)
            .field("height", &self.height())
            .field("width", &self.width())
            .finish()
    }
}

impl<'t> IntoIterator for &'t Table<'_> {
    type Item = Row<'t>;
    type IntoIter = Rows<'t>;

    fn into_iter(self) -> Rows<'t> {
        self.rows()
    }
}

/// Iterator over the rows of a [`Table`].
#[derive(Debug, Clone)]
pub struct Rows<'t> {
    buffer: &'t str,
    cells: &'t [CellSpan],
    inner: slice::Iter<'t, RowSpan>,
}

impl<'t> Iterator for Rows<'t> {
    type Item = Row<'t>;

    fn next(&mut self) -> Option<Row<'t>> {
        self.inner.next().map(|span| Row::new(self.buffer, self.cells, span))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Rows<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|span| Row::new(self.buffer, self.cells, span))
    }
}

impl ExactSizeIterator for Rows<'_> {}
impl FusedIterator for Rows<'_> {}

/// One non-blank line of the document.
#[derive(Clone, Copy)]
pub struct Row<'t> {
    buffer: &'t str,
    cells: &'t [CellSpan],
    source: &'t str,
    line: usize,
}

impl<'t> Row<'t> {
    fn new(buffer: &'t str, cells: &'t [CellSpan], span: &RowSpan) -> Row<'t> {
        Row {
            buffer,
            cells: &cells[span.first_cell..span.first_cell + span.n_cells],
            source: &buffer[span.source.start..span.source.end()],
            line: span.line,
        }
    }

    /// Number of cells in this row. Never zero.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Cell<'t>> {
        self.cells.get(index).map(|cell| Cell::new(self.buffer, cell))
    }

    /// The cell at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn cell(&self, index: usize) -> Cell<'t> {
        match self.get(index) {
            Some(cell) => cell,
            None => panic!(
                "cell index {} out of range for row of {} cells (line {})",
                index,
                self.len(),
                self.line
            ),
        }
    }

    pub fn cells(&self) -> Cells<'t> {
        Cells { buffer: self.buffer, inner: self.cells.iter() }
    }

    /// The raw text of the line, without its terminator.
    pub fn source(&self) -> &'t str {
        self.source
    }

    /// 1-based line number of this row in the (normalized) document.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Row")
            .field("line", &self.line)
            .field("cells", &self.cells().collect::<Vec<_>>())
            .finish()
    }
}

impl<'t> IntoIterator for Row<'t> {
    type Item = Cell<'t>;
    type IntoIter = Cells<'t>;

    fn into_iter(self) -> Cells<'t> {
        self.cells()
    }
}

/// Iterator over the cells of a [`Row`].
#[derive(Debug, Clone)]
pub struct Cells<'t> {
    buffer: &'t str,
    inner: slice::Iter<'t, CellSpan>,
}

impl<'t> Iterator for Cells<'t> {
    type Item = Cell<'t>;

    fn next(&mut self) -> Option<Cell<'t>> {
        self.inner.next().map(|cell| Cell::new(self.buffer, cell))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Cells<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|cell| Cell::new(self.buffer, cell))
    }
}

impl ExactSizeIterator for Cells<'_> {}
impl FusedIterator for Cells<'_> {}

/// One field of a row, as a view into the table's buffer.
///
/// For a quoted field the text excludes the enclosing quotes and keeps any `\"` escape
/// as written; see [`Cell::unescape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell<'t> {
    text: &'t str,
    quoted: bool,
}

impl<'t> Cell<'t> {
    fn new(buffer: &'t str, cell: &CellSpan) -> Cell<'t> {
        Cell { text: &buffer[cell.span.start..cell.span.end()], quoted: cell.quoted }
    }

    pub fn as_str(&self) -> &'t str {
        self.text
    }

    /// Same as [`Cell::as_str`].
    pub fn content(&self) -> &'t str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the field was enclosed in quotes in the source.
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// The text with every `\"` of a quoted field collapsed to `"`. Borrows unless
    /// something had to be collapsed.
    pub fn unescape(&self) -> Cow<'t, str> {
        if self.quoted && self.text.contains("\\\"") {
            Cow::Owned(self.text.replace("\\\"", "\""))
        } else {
            Cow::Borrowed(self.text)
        }
    }

    /// Converts the text to `T`, consuming all of it.
    ///
    /// ```
    /// use csv_view::{error::Error, Table};
    ///
    /// let table = Table::from_text("42,abc,300\n")?;
    /// let row = table.row(0).unwrap();
    /// assert_eq!(row.cell(0).to::<i32>()?, 42);
    /// assert!(matches!(row.cell(1).to::<i32>(), Err(Error::InvalidFormat { .. })));
    /// assert!(matches!(row.cell(2).to::<u8>(), Err(Error::OutOfRange { .. })));
    /// # Ok::<(), Error>(())
    /// ```
    pub fn to<T: FromCell<'t>>(&self) -> Result<T> {
        T::from_cell(self.text)
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.text)
    }
}

impl AsRef<str> for Cell<'_> {
    fn as_ref(&self) -> &str {
        self.text
    }
}

impl PartialEq<str> for Cell<'_> {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Cell<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}
