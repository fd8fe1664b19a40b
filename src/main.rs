use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use zillowfinder::debug;
use zillowfinder::fetcher::{HttpFetcher, ListingStatus};
use zillowfinder::mapper::MappingPolicy;
use zillowfinder::models::ListingField;
use zillowfinder::pipeline::{run_with_options, CacheMissPolicy, DocumentSource, ScrapingOptions};
use zillowfinder::tui::RunTUI;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Zillowfinder - export Zillow search results to CSV")]
struct Args {
    /// Area name (e.g. "New York, NY", a zipcode, etc.)
    area: String,

    /// Filename to save the CSV as (default: <area>_<status>.csv)
    #[clap(short, long)]
    name: Option<String>,

    /// Path of the output directory
    #[clap(short, long, default_value = ".")]
    output: PathBuf,

    /// Listing status to search: for_sale, for_rent or recently_sold
    #[clap(short, long, default_value = "for_sale")]
    status: ListingStatus,

    /// Load data from a previous JSON dump instead of fetching
    #[clap(short, long)]
    load: bool,

    /// Directory holding the JSON dumps
    #[clap(long, default_value = ".")]
    cache_dir: PathBuf,

    /// What to do when --load finds no dump: fail, prompt or fetch
    #[clap(long, default_value = "prompt")]
    on_cache_miss: CacheMissPolicy,

    /// Do not write the fetched JSON document to the cache directory
    #[clap(long)]
    no_cache_write: bool,

    /// Comma-separated fields to export (default: all meaningful fields)
    #[clap(short, long, conflicts_with = "summary")]
    fields: Option<String>,

    /// Export the compact summary column set
    #[clap(long)]
    summary: bool,

    /// Skip listings with missing required fields instead of aborting
    #[clap(long)]
    skip_invalid: bool,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn confirm_fetch(path: &Path) -> Result<bool> {
    print!(
        "No data at {}. Retrieve data from Zillow? (y/n) ",
        path.display()
    );
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    debug::set_debug(args.debug);

    let fields = if args.summary {
        Some(ListingField::SUMMARY.to_vec())
    } else {
        args.fields
            .as_deref()
            .map(ListingField::parse_list)
            .transpose()?
    };

    let options = ScrapingOptions {
        area: args.area,
        status: args.status,
        output_dir: args.output,
        output_name: args.name,
        cache_dir: args.cache_dir,
        load: args.load,
        on_cache_miss: args.on_cache_miss,
        write_cache: !args.no_cache_write,
        fields,
        mapping_policy: if args.skip_invalid {
            MappingPolicy::Skip
        } else {
            MappingPolicy::Abort
        },
    };

    let fetcher = HttpFetcher::new()?;
    let mut tui = RunTUI::new();
    let result = run_with_options(&fetcher, &options, confirm_fetch, &mut tui)?;

    println!("\n=== Summary ===");
    println!(
        "Source: {}",
        match result.source {
            DocumentSource::Cache => "cached JSON dump",
            DocumentSource::Network => "zillow.com",
        }
    );
    println!("Listings exported: {}", result.records.len());
    if result.skipped > 0 {
        println!("Listings skipped: {}", result.skipped);
    }
    println!("Pages available: {}", result.total_pages);
    println!("Columns: {}", result.fields.len());
    println!("Saved to: {}", result.output_path.display());

    Ok(())
}
