//! CLI argument parsing using clap

use clap::Parser;

/// Migrate legacy `check(fn, expected)` polling calls to `retry(fn)`
#[derive(Parser, Debug)]
#[command(name = "retrofit")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Rewrite every e2e test in place
    retrofit "test/e2e/**/*.test.ts"

    # Preview without writing anything
    retrofit "test/**/*.ts" --dry-run

    # Machine-readable summary for CI
    retrofit "test/**/*.ts" --dry-run --json

    # Migrate a differently named helper
    retrofit "test/**/*.ts" --module my-utils --from poll --to retry
"#)]
pub struct Args {
    /// Files to process (supports glob patterns like "test/**/*.ts")
    #[arg()]
    pub files: Vec<String>,

    /// Module the legacy helper is imported from
    #[arg(long = "module", default_value = "next-test-utils")]
    pub module: String,

    /// Name of the helper to migrate away from
    #[arg(long = "from", default_value = "check")]
    pub from: String,

    /// Name of the replacement helper
    #[arg(long = "to", default_value = "retry")]
    pub to: String,

    /// Force a language instead of detecting it from the extension
    /// (javascript, typescript, tsx)
    #[arg(short = 'l', long = "lang")]
    pub lang: Option<String>,

    /// Report what would change without writing any file
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Color output: auto (default), always, never
    #[arg(long = "color", default_value = "auto")]
    pub color: String,

    /// Disable color output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Number of parallel workers
    #[arg(short = 'c', long = "concurrency")]
    pub concurrency: Option<usize>,

    /// Show verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
