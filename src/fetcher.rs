use crate::debug_println;
use crate::error::ScrapeError;
use reqwest::blocking::Client;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};
use std::fmt;
use std::str::FromStr;

const BASE_URL: &str = "https://www.zillow.com/homes";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36";
const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,image/apng,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.8";
const BROWSER_ACCEPT_ENCODING: &str = "gzip, deflate, br";

/// Which listing category to search, as it appears in the URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingStatus {
    #[default]
    ForSale,
    ForRent,
    RecentlySold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::ForSale => "for_sale",
            ListingStatus::ForRent => "for_rent",
            ListingStatus::RecentlySold => "recently_sold",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "for_sale" | "sale" => Ok(ListingStatus::ForSale),
            "for_rent" | "rent" => Ok(ListingStatus::ForRent),
            "recently_sold" | "sold" => Ok(ListingStatus::RecentlySold),
            other => Err(format!(
                "unknown listing status '{}' (expected for_sale, for_rent or recently_sold)",
                other
            )),
        }
    }
}

/// The area as it appears in the URL: spaces become hyphens, nothing else changes.
pub fn area_slug(area: &str) -> String {
    area.replace(' ', "-")
}

pub fn search_url(status: ListingStatus, area: &str) -> String {
    format!("{}/{}/{}", BASE_URL, status, area_slug(area))
}

/// Fixed header set that makes the request look like a desktop browser.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(BROWSER_ACCEPT_ENCODING));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

/// Source of raw page bodies. The pipeline only ever asks for one page.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .default_headers(browser_headers())
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        debug_println!("Fetching search page: {}", url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        debug_println!("Response status: {}", status);

        if !status.is_success() {
            return Err(ScrapeError::Transport(format!(
                "GET {} returned HTTP {}",
                url, status
            )));
        }

        let body = response.text()?;
        debug_println!("Received {} bytes", body.len());
        Ok(body)
    }
}
