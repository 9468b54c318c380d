//! Command-line interface for despew.
//!
//! Reads compiler output from a file or stdin, reformats the template spew
//! it recognizes, and prints either the reformatted text or the raw
//! formatting instructions as JSON. Diagnostic notes about expressions that
//! did not parse go to stderr.

use clap::{Arg, Command};
use std::io::Read;

use despew::printer::FormatInstruction;
use despew::session::{Session, SessionConfig};

fn main() {
    let matches = Command::new("despew")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reformat C++ template diagnostics for readability")
        .arg(
            Arg::new("path")
                .help("Compiler output to reformat ('-' for stdin)")
                .default_value("-")
                .index(1),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .short('w')
                .help("Target maximum column count")
                .value_parser(clap::value_parser!(usize))
                .default_value("78"),
        )
        .arg(
            Arg::new("indent")
                .long("indent")
                .help("Columns added per nesting level")
                .value_parser(clap::value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new("fold")
                .long("fold")
                .help("Collapse groups nested at this depth or deeper")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format ('text' or 'json')")
                .default_value("text"),
        )
        .get_matches();

    let path = matches.get_one::<String>("path").unwrap();
    let width = *matches.get_one::<usize>("width").unwrap();
    let indent = *matches.get_one::<usize>("indent").unwrap();
    let fold = matches.get_one::<usize>("fold").copied();
    let format = matches.get_one::<String>("format").unwrap();

    let input = read_input(path).unwrap_or_else(|e| {
        eprintln!("Error reading input: {}", e);
        std::process::exit(1);
    });
    // the final line is only processed once newline-terminated
    let buffer = if input.ends_with('\n') || input.is_empty() {
        input
    } else {
        format!("{}\n", input)
    };

    let mut session = Session::new(SessionConfig {
        fill_width: width,
        indent_unit: indent,
        ..Default::default()
    });
    let reports = session.process(&buffer);
    for report in &reports {
        for note in &report.notes {
            eprintln!("despew: {}", note);
        }
    }

    if let Some(depth) = fold {
        let starts: Vec<usize> = session.records().iter().map(|r| r.quoted.start).collect();
        for start in starts {
            let _ = session.fold_at(start, Some(depth));
        }
    }

    match format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(session.records()).unwrap_or_else(|e| {
                eprintln!("Serialization error: {}", e);
                std::process::exit(1);
            });
            println!("{}", json);
        }
        _ => print!("{}", render_stream(&buffer, &session)),
    }
}

fn read_input(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

/// Apply the decoration overlay to the whole stream: line breaks with
/// indentation at each instruction, and an ellipsis placeholder over each
/// folded region. Instructions falling inside a hidden region are dropped.
fn render_stream(buffer: &str, session: &Session) -> String {
    let mut breaks: Vec<FormatInstruction> = Vec::new();
    let mut cuts: Vec<(usize, usize)> = Vec::new();
    for record in session.records() {
        breaks.extend(record.instructions.iter().copied());
        for fold in &record.folds {
            if fold.placeholder {
                cuts.push((fold.region.start, fold.region.end));
            }
        }
    }
    breaks.sort_by_key(|b| b.offset);
    cuts.sort_unstable();
    breaks.retain(|b| {
        !cuts
            .iter()
            .any(|&(start, end)| start < b.offset && b.offset < end)
    });

    let mut out = String::with_capacity(buffer.len());
    let mut pos = 0;
    let mut cut_idx = 0;
    for ins in &breaks {
        while cut_idx < cuts.len() && cuts[cut_idx].0 < ins.offset {
            let (start, end) = cuts[cut_idx];
            out.push_str(&buffer[pos..start]);
            out.push_str("...");
            pos = end;
            cut_idx += 1;
        }
        out.push_str(&buffer[pos..ins.offset]);
        out.push('\n');
        for _ in 0..ins.indent {
            out.push(' ');
        }
        pos = ins.offset;
    }
    while cut_idx < cuts.len() {
        let (start, end) = cuts[cut_idx];
        out.push_str(&buffer[pos..start]);
        out.push_str("...");
        pos = end;
        cut_idx += 1;
    }
    out.push_str(&buffer[pos..]);
    out
}
