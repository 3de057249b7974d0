use std::env;
use std::io::{self, Write};

use csv_view::Table;
use tabwriter::TabWriter;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let (path, show_types) = match args.as_slice() {
        [_, path] => (path, false),
        [_, path, flag] if flag == "--types" => (path, true),
        _ => {
            eprintln!("Usage: {} <file> [--types]", args[0]);
            ::std::process::exit(1);
        }
    };

    let table = match Table::open(path) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            ::std::process::exit(1);
        }
    };

    if let Err(err) = print_table(&table, show_types) {
        eprintln!("ERROR: {}", err);
        ::std::process::exit(1);
    }
}

fn print_table(table: &Table, show_types: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut tw = TabWriter::new(stdout.lock());
    for row in table {
        let line: Vec<&str> = row.cells().map(|cell| cell.as_str()).collect();
        writeln!(tw, "{}", line.join("\t"))?;
    }
    tw.flush()?;
    drop(tw);

    let mut out = stdout.lock();
    writeln!(out)?;
    writeln!(out, "Height: {}", table.height())?;
    writeln!(out, "Width: {}", table.width())?;
    if show_types {
        writeln!(out, "Types:")?;
        for (i, ty) in table.column_types(true).iter().enumerate() {
            writeln!(out, "\t{}: {}", i, ty)?;
        }
    }
    Ok(())
}
