use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Coloured status lines for one run. All output goes to stdout.
pub struct RunTUI {
    quiet: bool,
    spinner: Option<ProgressBar>,
}

impl RunTUI {
    pub fn new() -> Self {
        Self {
            quiet: false,
            spinner: None,
        }
    }

    /// A TUI that prints nothing, for library callers and tests.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            spinner: None,
        }
    }

    fn line(&self, color: Color, text: impl Display) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        execute!(
            io::stdout(),
            SetForegroundColor(color),
            Print(text),
            Print("\n"),
            ResetColor
        )
    }

    pub fn show_header(&self, area: &str, status: &str) -> io::Result<()> {
        self.line(Color::White, format_args!("🏠 Zillow listings for {} ({})", area, status))
    }

    pub fn show_cache_hit(&self, path: &Path) -> io::Result<()> {
        self.line(Color::DarkGrey, format_args!("📁 Loaded cached data from {}", path.display()))
    }

    pub fn show_cache_miss(&self, path: &Path) -> io::Result<()> {
        self.line(Color::Yellow, format_args!("⚠ Existing file not found: {}", path.display()))
    }

    pub fn start_fetching(&mut self, url: &str) {
        if self.quiet {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Fetching {}", url));
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    pub fn finish_fetching(&mut self, succeeded: bool) {
        if let Some(spinner) = self.spinner.take() {
            if succeeded {
                spinner.finish_with_message("✓ Page fetched");
            } else {
                spinner.abandon_with_message("✗ Fetch failed");
            }
        }
    }

    pub fn show_cached_to(&self, path: &Path) -> io::Result<()> {
        self.line(Color::DarkGrey, format_args!("💾 Cached raw data at {}", path.display()))
    }

    pub fn show_mapped(&self, mapped: usize, skipped: usize, total_pages: u64) -> io::Result<()> {
        self.line(
            Color::Green,
            format_args!("✓ Mapped {} listings (page 1 of {})", mapped, total_pages),
        )?;
        if skipped > 0 {
            self.line(Color::Yellow, format_args!("⚠ Skipped {} incomplete listings", skipped))?;
        }
        Ok(())
    }

    pub fn show_saved(&self, count: usize, path: &Path) -> io::Result<()> {
        self.line(Color::Green, format_args!("✓ Saved {} rows to {}", count, path.display()))
    }
}

impl Default for RunTUI {
    fn default() -> Self {
        Self::new()
    }
}
