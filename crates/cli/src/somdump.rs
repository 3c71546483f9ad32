//! somdump - Reconstruct and dump the semantic structure of page snapshots
//!
//! Reads page snapshots in JSON (one snapshot object, or an array of them)
//! and prints the reconstructed semantic object model as an outline, as
//! plain paragraph text or as JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use fixsom_core::som::{Page, SemanticBox};
use fixsom_core::{PageConstructor, PageSnapshot, SomParams};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output type for the reconstructed model.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
enum OutputType {
    /// Indented box outline (default)
    #[default]
    Outline,
    /// Paragraph text, one block per paragraph
    Text,
    /// Full model as JSON
    Json,
}

/// Reconstruct paragraphs, tables and reading-order groups from page
/// snapshots.
#[derive(Parser, Debug)]
#[command(name = "somdump")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// One or more page snapshot JSON files
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON file with reconstruction parameters; missing fields keep defaults
    #[arg(short = 'p', long)]
    params: Option<PathBuf>,

    /// Coordinate tolerance of table detection
    #[arg(long = "table-tolerance")]
    table_tolerance: Option<f64>,

    /// Vertical margin within which boxes share a group
    #[arg(long = "group-margin")]
    group_margin: Option<f64>,

    /// Output file name (- for stdout)
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,

    /// Type of output to generate
    #[arg(short = 't', long = "output-type", value_enum, default_value = "outline")]
    output_type: OutputType,

    /// Print per-page reconstruction statistics to stderr
    #[arg(short = 's', long, action = ArgAction::SetTrue)]
    stats: bool,

    /// Debug logging (same as RUST_LOG=debug)
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

/// A snapshot file holds one page or a list of pages.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    One(PageSnapshot),
    Many(Vec<PageSnapshot>),
}

fn parse_snapshots(json: &str) -> serde_json::Result<Vec<PageSnapshot>> {
    Ok(match serde_json::from_str(json)? {
        SnapshotFile::One(page) => vec![page],
        SnapshotFile::Many(pages) => pages,
    })
}

fn load_snapshots(path: &Path) -> Result<Vec<PageSnapshot>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_snapshots(&json).with_context(|| format!("invalid page snapshot in {}", path.display()))
}

/// Builds SomParams from the params file and command line overrides.
fn build_params(args: &Args) -> Result<SomParams> {
    let mut params = match &args.params {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("invalid parameters in {}", path.display()))?
        }
        None => SomParams::default(),
    };
    if let Some(v) = args.table_tolerance {
        params.table_tolerance = v;
    }
    if let Some(v) = args.group_margin {
        params.group_inflate_vertical = v;
    }
    params.validate()?;
    Ok(params)
}

fn write_text<W: Write>(out: &mut W, item: &SemanticBox) -> io::Result<()> {
    match item {
        SemanticBox::FixedBlock(block) if !block.is_floating_image => {
            writeln!(out, "{}", block.text())?;
            writeln!(out)?;
        }
        SemanticBox::Group(group) => {
            for child in &group.children {
                write_text(out, child)?;
            }
        }
        SemanticBox::Table(table) => {
            for cell in table.cells() {
                for child in &cell.children {
                    write_text(out, child)?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn write_page<W: Write>(
    out: &mut W,
    page: &Page,
    pageno: usize,
    output_type: OutputType,
) -> Result<()> {
    match output_type {
        OutputType::Outline => {
            writeln!(out, "Page {pageno}")?;
            write!(out, "{}", page.outline())?;
        }
        OutputType::Text => {
            for item in page.boxes() {
                write_text(out, item)?;
            }
            // form feed between pages, as pdf2txt does
            write!(out, "\x0c")?;
        }
        OutputType::Json => {
            serde_json::to_writer_pretty(&mut *out, page)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let constructor = PageConstructor::new(build_params(&args)?)?;

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    let mut pageno = 0;
    for path in &args.files {
        let snapshots = load_snapshots(path)?;
        info!(file = %path.display(), pages = snapshots.len(), "reconstructing");
        let pages = constructor.reconstruct_pages(&snapshots);
        for page in &pages {
            pageno += 1;
            if args.stats {
                eprintln!("page {pageno}: {:?}", page.stats());
            }
            write_page(&mut output, page, pageno, args.output_type)?;
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixsom_core::model::SnapshotBuilder;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["somdump", "page.json"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn single_and_list_snapshots_parse() {
        let mut b = SnapshotBuilder::new();
        b.add_text("hi", 0.0, 0.0, 10.0);
        let page = b.finish();
        let one = serde_json::to_string(&page).unwrap();
        let many = serde_json::to_string(&vec![page.clone(), page.clone()]).unwrap();
        assert_eq!(parse_snapshots(&one).unwrap(), vec![page.clone()]);
        assert_eq!(parse_snapshots(&many).unwrap().len(), 2);
        assert!(parse_snapshots("{\"pages\": 3}").is_err());
    }

    #[test]
    fn overrides_apply_and_are_validated() {
        let params = build_params(&args(&["--table-tolerance", "2.5"])).unwrap();
        assert_eq!(params.table_tolerance, 2.5);
        assert_eq!(params.group_inflate_vertical, SomParams::default().group_inflate_vertical);
        assert!(build_params(&args(&["--group-margin=-1"])).is_err());
    }

    #[test]
    fn text_output_lists_paragraphs() {
        let mut b = SnapshotBuilder::new();
        b.add_text("first line", 0.0, 0.0, 10.0);
        b.add_text("second line", 0.0, 12.0, 10.0);
        let page = fixsom_core::reconstruct(&b.finish());
        let mut out = Vec::new();
        write_page(&mut out, &page, 1, OutputType::Text).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "first line\nsecond line\n\n\x0c");
    }
}
