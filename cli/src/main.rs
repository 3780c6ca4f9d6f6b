//! refont CLI - XLSX font replacement tool
//!
//! Rewrites font names and optionally removes protection in Excel workbooks,
//! replacing each file in place.

use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use refont::{ConversionContext, ConversionReport, DEFAULT_FROM_FONT, DEFAULT_TO_FONT};
use std::io::{self, Write};
use std::path::PathBuf;

/// Replace fonts and strip protection in XLSX spreadsheets
#[derive(Parser, Debug)]
#[command(
    name = "refont",
    author = "iyulab",
    version,
    about = "Replace fonts in Excel workbooks",
    long_about = "refont - Replace a font in XLSX styles and shared strings.\n\n\
                  Each file is rewritten in place. The original is only replaced \
                  once the new workbook has been written completely."
)]
struct Cli {
    /// Font name to replace
    #[arg(long, value_name = "NAME", default_value = DEFAULT_FROM_FONT)]
    from: String,

    /// Replacement font name
    #[arg(long, value_name = "NAME", default_value = DEFAULT_TO_FONT)]
    to: String,

    /// Also remove workbook and worksheet protection
    #[arg(long)]
    unprotect: bool,

    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Print one JSON report per file
    #[arg(long)]
    json: bool,

    /// Spreadsheet files to convert, in order
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

impl Cli {
    fn context(&self) -> ConversionContext {
        ConversionContext::new()
            .with_from(self.from.as_str())
            .with_to(self.to.as_str())
            .with_unprotect(self.unprotect)
    }
}

fn main() {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
    );

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Convert every file in argument order, stopping at the first failure.
fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = cli.context();
    log::debug!("converting {} file(s) with {:?}", cli.files.len(), ctx);

    for path in &cli.files {
        let pb = create_spinner(&format!("Converting {}...", path.display()));

        let result = if cli.dry_run {
            refont::preview_file(path, &ctx)
        } else {
            refont::process_file(path, &ctx)
        };

        pb.finish_and_clear();
        let report = result?;

        if cli.json {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", serde_json::to_string(&report)?)?;
        } else {
            print_report(&report);
        }
    }

    Ok(())
}

fn print_report(report: &ConversionReport) {
    let summary = &report.summary;
    let detail = format!(
        "{} font(s) replaced, {} protection element(s) removed",
        summary.fonts_replaced, summary.protections_removed
    );

    if !report.committed {
        println!(
            "{} {} (dry run): {}",
            "~".yellow().bold(),
            report.path.display(),
            detail
        );
    } else if summary.changes() == 0 {
        println!(
            "{} {}: nothing to change",
            "!".yellow().bold(),
            report.path.display()
        );
    } else {
        println!("{} {}: {}", "✓".green().bold(), report.path.display(), detail);
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::{Read, Write};
    use std::path::Path;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const STYLES: &str = r#"<styleSheet><fonts><font><name val="Geneva"/></font></fonts></styleSheet>"#;

    fn write_package(path: &Path, styles: &str) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        zip.start_file("xl/styles.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(styles.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    fn read_styles(path: &Path) -> String {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entry = archive.by_name("xl/styles.xml").unwrap();
        let mut data = String::new();
        entry.read_to_string(&mut data).unwrap();
        data
    }

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["refont", "a.xlsx"]).unwrap();
        let ctx = cli.context();
        assert_eq!(ctx, ConversionContext::new());
        assert!(!cli.dry_run);
        assert_eq!(cli.files, vec![PathBuf::from("a.xlsx")]);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "refont",
            "--from",
            "Monaco",
            "--to",
            "Courier New",
            "--unprotect",
            "a.xlsx",
            "b.xlsx",
        ])
        .unwrap();
        let ctx = cli.context();
        assert_eq!(ctx.from, "Monaco");
        assert_eq!(ctx.to, "Courier New");
        assert!(ctx.unprotect);
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn test_files_required() {
        assert!(Cli::try_parse_from(["refont"]).is_err());
        assert!(Cli::try_parse_from(["refont", "--unprotect"]).is_err());
    }

    #[test]
    fn test_run_converts_all_files() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.xlsx");
        let second = dir.path().join("second.xlsx");
        write_package(&first, STYLES);
        write_package(&second, STYLES);

        let cli = Cli::try_parse_from([
            Path::new("refont"),
            first.as_path(),
            second.as_path(),
        ])
        .unwrap();
        run(&cli).unwrap();

        assert!(read_styles(&first).contains(r#"val="Arial""#));
        assert!(read_styles(&second).contains(r#"val="Arial""#));
    }

    #[test]
    fn test_run_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("broken.xlsx");
        let good = dir.path().join("good.xlsx");
        write_package(&broken, "<styleSheet><fonts></styleSheet>");
        write_package(&good, STYLES);
        let good_before = fs::read(&good).unwrap();

        let cli = Cli::try_parse_from([
            Path::new("refont"),
            broken.as_path(),
            good.as_path(),
        ])
        .unwrap();
        let err = run(&cli).unwrap_err();

        assert!(err.to_string().contains("broken.xlsx"));
        assert_eq!(fs::read(&good).unwrap(), good_before);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        write_package(&path, STYLES);
        let before = fs::read(&path).unwrap();

        let cli = Cli::try_parse_from([
            Path::new("refont"),
            Path::new("--dry-run"),
            path.as_path(),
        ])
        .unwrap();
        run(&cli).unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
    }
}
