use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use once_cell::unsync::OnceCell;
use pdfium_render::prelude::Pdfium;
use tracing::{info, warn};

use crate::config::Config;
use crate::dump::load_dump;
use crate::error::OutlineError;
use crate::outline::OutlineExtractor;
use crate::types::{Outline, Page};
use crate::{layout, pdf};

/// Wall-clock allowance for one document.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    start: Instant,
    limit: Option<Duration>,
}

impl Budget {
    pub fn new(limit: Option<Duration>) -> Self {
        Self { start: Instant::now(), limit }
    }

    pub fn check(&self) -> Result<(), OutlineError> {
        let Some(budget) = self.limit else {
            return Ok(());
        };
        let elapsed = self.start.elapsed();
        if elapsed >= budget {
            return Err(OutlineError::Budget { budget, elapsed });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    LayoutDump,
}

impl InputKind {
    pub fn of(path: &Path) -> Result<Self, OutlineError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(InputKind::Pdf),
            "json" => Ok(InputKind::LayoutDump),
            _ => Err(OutlineError::UnsupportedInput(path.to_path_buf())),
        }
    }
}

/// Expand directories (one level, `.pdf`/`.json` only, sorted by name) and
/// drop paths that do not exist.
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let entries = match fs::read_dir(path) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), "cannot list directory: {e}");
                    continue;
                }
            };
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && InputKind::of(p).is_ok())
                .collect();
            found.sort();
            inputs.extend(found);
        } else if path.exists() {
            inputs.push(path.clone());
        } else {
            warn!(path = %path.display(), "input not found, skipped");
        }
    }
    inputs
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub output_dir: Option<PathBuf>,
    pub pretty: bool,
    pub debug_layout: bool,
    pub pdfium_path: Option<String>,
    pub budget: Option<Duration>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
}

/// Runs the outline pipeline once per input. A failing document is logged
/// and counted; the batch carries on.
pub struct Batch<'a> {
    config: &'a Config,
    options: BatchOptions,
    /// Bound on first PDF input; a failed bind is remembered.
    pdfium: OnceCell<Result<Pdfium, String>>,
}

impl<'a> Batch<'a> {
    pub fn new(config: &'a Config, options: BatchOptions) -> Self {
        Self { config, options, pdfium: OnceCell::new() }
    }

    pub fn run(&self, inputs: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        for path in inputs {
            match self.process(path) {
                Ok(()) => report.processed += 1,
                Err(e) => {
                    warn!(path = %path.display(), "failed: {e:#}");
                    report.failed += 1;
                }
            }
        }
        report
    }

    fn process(&self, path: &Path) -> Result<()> {
        let budget = Budget::new(self.options.budget);
        let pages = self.load_pages(path, &budget)?;

        if self.options.debug_layout {
            crate::print_debug_layout(path, &pages, self.config);
            return Ok(());
        }

        let mut outline = OutlineExtractor::new(self.config).extract(&pages);
        budget.check()?;

        if outline.title.is_empty() && self.config.title.filename_fallback {
            outline.title = file_stem(path);
        }
        info!(
            path = %path.display(),
            pages = pages.len(),
            headings = outline.outline.len(),
            title = %outline.title,
            "outline extracted"
        );
        self.write(path, &outline)
    }

    fn load_pages(&self, path: &Path, budget: &Budget) -> Result<Vec<Page>> {
        match InputKind::of(path)? {
            InputKind::LayoutDump => Ok(load_dump(path)?),
            InputKind::Pdf => {
                let pdfium = self.pdfium()?;
                let chars = pdf::extract_chars(pdfium, path, budget)?;
                Ok(chars.iter().map(layout::build_page).collect())
            }
        }
    }

    fn pdfium(&self) -> Result<&Pdfium> {
        self.pdfium
            .get_or_init(|| {
                pdf::bind_pdfium(self.options.pdfium_path.as_deref()).map_err(|e| format!("{e:#}"))
            })
            .as_ref()
            .map_err(|e| OutlineError::Pdfium(e.clone()).into())
    }

    fn write(&self, path: &Path, outline: &Outline) -> Result<()> {
        let json = if self.options.pretty {
            serde_json::to_string_pretty(outline)?
        } else {
            serde_json::to_string(outline)?
        };
        let Some(dir) = &self.options.output_dir else {
            println!("{json}");
            return Ok(());
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        let target = dir.join(format!("{}.json", file_stem(path)));
        fs::write(&target, json)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "outline".to_string())
}
