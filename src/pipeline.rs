use crate::cache;
use crate::error::ScrapeError;
use crate::export;
use crate::fetcher::{self, ListingStatus, PageFetcher};
use crate::locator;
use crate::mapper::{self, MappingPolicy};
use crate::models::{ListingField, ListingPage, ListingRecord};
use crate::tui::RunTUI;
use crate::debug_println;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// What to do when loading from cache was requested but no dump exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMissPolicy {
    Fail,
    /// Ask the caller-supplied confirmation hook before fetching.
    #[default]
    Prompt,
    Fetch,
}

impl std::str::FromStr for CacheMissPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(CacheMissPolicy::Fail),
            "prompt" => Ok(CacheMissPolicy::Prompt),
            "fetch" => Ok(CacheMissPolicy::Fetch),
            other => Err(format!(
                "unknown cache miss policy '{}' (expected fail, prompt or fetch)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub area: String,
    pub status: ListingStatus,
    pub output_dir: PathBuf,
    /// File name inside `output_dir`; derived from area and status when unset.
    pub output_name: Option<String>,
    pub cache_dir: PathBuf,
    pub load: bool,
    pub on_cache_miss: CacheMissPolicy,
    pub write_cache: bool,
    /// Columns to export; the meaningful fields when unset.
    pub fields: Option<Vec<ListingField>>,
    pub mapping_policy: MappingPolicy,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            area: String::new(),
            status: ListingStatus::default(),
            output_dir: PathBuf::from("."),
            output_name: None,
            cache_dir: PathBuf::from("."),
            load: false,
            on_cache_miss: CacheMissPolicy::default(),
            write_cache: true,
            fields: None,
            mapping_policy: MappingPolicy::default(),
        }
    }
}

impl ScrapingOptions {
    pub fn output_path(&self) -> PathBuf {
        let name = self.output_name.clone().unwrap_or_else(|| {
            format!("{}_{}.csv", fetcher::area_slug(&self.area), self.status)
        });
        self.output_dir.join(name)
    }

    pub fn cache_path(&self) -> PathBuf {
        cache::cache_path(&self.cache_dir, &self.area, self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    Cache,
    Network,
}

pub struct ScrapingResult {
    pub records: Vec<ListingRecord>,
    pub fields: Vec<ListingField>,
    pub skipped: usize,
    pub total_pages: u64,
    pub source: DocumentSource,
    pub output_path: PathBuf,
}

fn fetch_document<F: PageFetcher>(
    fetcher: &F,
    options: &ScrapingOptions,
    tui: &mut RunTUI,
) -> Result<Value> {
    let url = fetcher::search_url(options.status, &options.area);

    tui.start_fetching(&url);
    let html = fetcher.fetch(&url);
    tui.finish_fetching(html.is_ok());
    let html = html.context(format!("Failed to fetch {}", url))?;

    let document = locator::extract_json(&html)
        .context(format!("Failed to extract listing data from {}", url))?;

    if options.write_cache {
        let path = options.cache_path();
        cache::save_document(&path, &document)?;
        tui.show_cached_to(&path)?;
    }

    Ok(document)
}

/// Get the search document from the cache or the network, as configured.
///
/// `confirm` is only consulted under [`CacheMissPolicy::Prompt`]; returning
/// `false` turns the miss into an error.
pub fn acquire_document<F, C>(
    fetcher: &F,
    options: &ScrapingOptions,
    mut confirm: C,
    tui: &mut RunTUI,
) -> Result<(Value, DocumentSource)>
where
    F: PageFetcher,
    C: FnMut(&Path) -> Result<bool>,
{
    if options.load {
        match cache::load_document(&options.cache_path()) {
            Ok(document) => {
                tui.show_cache_hit(&options.cache_path())?;
                return Ok((document, DocumentSource::Cache));
            }
            Err(ScrapeError::CacheMiss(path)) => {
                tui.show_cache_miss(&path)?;
                let fetch = match options.on_cache_miss {
                    CacheMissPolicy::Fail => false,
                    CacheMissPolicy::Prompt => confirm(&path)?,
                    CacheMissPolicy::Fetch => true,
                };
                if !fetch {
                    return Err(ScrapeError::CacheMiss(path).into());
                }
                debug_println!("Cache miss, fetching fresh data");
            }
            Err(e) => return Err(e).context("Failed to load cached data"),
        }
    }

    let document = fetch_document(fetcher, options, tui)?;
    Ok((document, DocumentSource::Network))
}

/// One full run: acquire, parse, map, export.
pub fn run_with_options<F, C>(
    fetcher: &F,
    options: &ScrapingOptions,
    confirm: C,
    tui: &mut RunTUI,
) -> Result<ScrapingResult>
where
    F: PageFetcher,
    C: FnMut(&Path) -> Result<bool>,
{
    tui.show_header(&options.area, options.status.as_str())?;

    let (document, source) = acquire_document(fetcher, options, confirm, tui)?;
    let page = ListingPage::from_document(&document)?;
    debug_println!(
        "Search page holds {} listings, {} pages total",
        page.listings.len(),
        page.total_pages
    );

    let outcome = mapper::map_listings(&page.listings, options.mapping_policy)?;
    tui.show_mapped(outcome.records.len(), outcome.skipped, page.total_pages)?;

    let fields = options
        .fields
        .clone()
        .unwrap_or_else(ListingField::meaningful);
    let output_path = options.output_path();
    export::save_records_to_csv(&outcome.records, &fields, &output_path)?;
    tui.show_saved(outcome.records.len(), &output_path)?;

    Ok(ScrapingResult {
        records: outcome.records,
        fields,
        skipped: outcome.skipped,
        total_pages: page.total_pages,
        source,
        output_path,
    })
}
