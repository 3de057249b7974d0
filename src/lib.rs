//! A zero-copy CSV table parser.
//!
//! A document is loaded once into a single buffer and parsed in one pass. Every
//! [`Row`] and [`Cell`] handed out afterwards is a view into that buffer, tied to the
//! [`Table`] by its lifetime.
//!
//! ```
//! use csv_view::Table;
//!
//! let table = Table::from_text("name,qty\n\"bolt\",12\nnut,7,\n")?;
//! assert_eq!(table.width(), 2);
//! let row = table.row(2).unwrap();
//! assert_eq!(row.source(), "nut,7,");
//! assert_eq!(row.len(), 3);
//! assert_eq!(table.cell(1, 0).unwrap().as_str(), "bolt");
//! assert_eq!(table.cell(1, 1).unwrap().to::<u32>()?, 12);
//! # Ok::<(), csv_view::error::Error>(())
//! ```
//!
//! Only `,`, `"` and `\n` are structural. A field is quoted only if `"` is its first
//! byte, `\"` is the only escape inside quotes (kept as written in the cell text), and a
//! closing quote must be followed by `,` or the end of the row. Quoted fields cannot
//! span lines. Blank lines are skipped.

pub mod error;
pub use error::{Error, QuoteFault, Result};

mod parser;

pub mod source;

mod table;
pub use table::{Cell, Cells, Row, Rows, Table, MEMORY_LABEL};

pub mod convert;
pub use convert::FromCell;

mod field_type;
pub use field_type::Type;
