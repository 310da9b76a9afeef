//! CLI tool for xlreport - inspects XLSX report templates
//!
//! Usage:
//!   xlreport_cli <template.xlsx>              # Output JSON to stdout
//!   xlreport_cli <template.xlsx> -o out.json  # Output JSON to file
//!   xlreport_cli <template.xlsx> --names      # List defined names and their targets

#![allow(clippy::exit)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::env;
use std::fs;
use std::io::{self, Write};
use xlreport::cell_ref::{format_absolute_ref, quote_sheet_name};
use xlreport::{Document, NameScope, NameTarget};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: xlreport_cli <template.xlsx> [-o output.json | --names]");
        std::process::exit(1);
    }

    let input_path = &args[1];
    let doc = match Document::open(input_path) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error loading {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    if args.get(2).map(String::as_str) == Some("--names") {
        print_names(&doc);
        return;
    }

    let output_path = if args.len() > 3 && args[2] == "-o" {
        Some(&args[3])
    } else {
        None
    };

    let json = match doc.to_json() {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {}", path, e);
                std::process::exit(1);
            }
            eprintln!("Written: {}", path);
        }
        None => {
            io::stdout().write_all(json.as_bytes()).unwrap();
            println!();
        }
    }
}

fn print_names(doc: &Document) {
    let resolver = doc.resolver();
    let sheet_names: Vec<&str> = doc.sheet_names().collect();
    for name in doc.names().iter().filter(|n| !n.is_builtin()) {
        let context = match name.scope {
            NameScope::Sheet(sheet) => Some(sheet),
            NameScope::Workbook => None,
        };
        let target = match resolver.resolve(&name.name, context) {
            Ok(NameTarget::Cell(addr)) => format!(
                "{}!{}",
                quote_sheet_name(sheet_names[addr.sheet.index()]),
                format_absolute_ref(addr.row, addr.col)
            ),
            Ok(NameTarget::Area(sel)) => format!(
                "{}!{}:{}",
                quote_sheet_name(sheet_names[sel.sheet().index()]),
                format_absolute_ref(sel.top_row(), sel.left_col()),
                format_absolute_ref(sel.bottom_row(), sel.right_col())
            ),
            Err(e) => format!("<{}>", e),
        };
        println!("{}\t{}\t{}", name.name, name.refers_to, target);
    }
}
