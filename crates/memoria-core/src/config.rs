//! Configuration module
//!
//! Upload engine and HTTP client settings, read from the environment with defaults.

use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS, MAX_FILE_SIZE_MB,
    PREVIEW_MAX_DIMENSION, SLIDESHOW_BATCH_SIZE, SLIDESHOW_MAX_PHOTOS,
};

/// Which backend route resolves a document link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkLookup {
    /// `GET /interments/{documentNo}`
    #[default]
    Interments,
    /// `GET /intermentsReviewLink/{documentNo}`
    ReviewLink,
    /// `GET /for-slide-show/{documentNo}`
    Slideshow,
}

impl LinkLookup {
    pub fn path_prefix(self) -> &'static str {
        match self {
            LinkLookup::Interments => "/interments",
            LinkLookup::ReviewLink => "/intermentsReviewLink",
            LinkLookup::Slideshow => "/for-slide-show",
        }
    }
}

impl FromStr for LinkLookup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interments" => Ok(LinkLookup::Interments),
            "review-link" | "review_link" | "reviewlink" => Ok(LinkLookup::ReviewLink),
            "slideshow" | "for-slide-show" => Ok(LinkLookup::Slideshow),
            other => Err(anyhow::anyhow!(
                "MEMORIA_LINK_LOOKUP must be one of interments, review-link, slideshow (got '{}')",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub http_timeout_secs: u64,
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub slideshow_batch_size: usize,
    pub slideshow_max_photos: usize,
    pub preview_max_dimension: u32,
    pub link_lookup: LinkLookup,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            slideshow_batch_size: SLIDESHOW_BATCH_SIZE,
            slideshow_max_photos: SLIDESHOW_MAX_PHOTOS,
            preview_max_dimension: PREVIEW_MAX_DIMENSION,
            link_lookup: LinkLookup::default(),
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = UploadConfig::default();

        let max_file_size_mb = get("MEMORIA_MAX_FILE_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_content_types = get("MEMORIA_ALLOWED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|ct| ct.trim().to_lowercase())
                    .filter(|ct| !ct.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_content_types);

        let link_lookup = match get("MEMORIA_LINK_LOOKUP") {
            Some(s) => s.parse()?,
            None => LinkLookup::default(),
        };

        let config = UploadConfig {
            api_url: get("MEMORIA_API_URL")
                .or_else(|| get("API_URL"))
                .unwrap_or(defaults.api_url)
                .trim_end_matches('/')
                .to_string(),
            api_token: get("MEMORIA_API_TOKEN").filter(|s| !s.is_empty()),
            http_timeout_secs: get("MEMORIA_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types,
            slideshow_batch_size: get("MEMORIA_SLIDESHOW_BATCH_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SLIDESHOW_BATCH_SIZE),
            slideshow_max_photos: get("MEMORIA_SLIDESHOW_MAX_PHOTOS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SLIDESHOW_MAX_PHOTOS),
            preview_max_dimension: get("MEMORIA_PREVIEW_MAX_DIMENSION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PREVIEW_MAX_DIMENSION),
            link_lookup,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "MEMORIA_API_URL must be an http(s) URL (got '{}')",
                self.api_url
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MEMORIA_MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "MEMORIA_ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }

        if self.slideshow_batch_size == 0 {
            return Err(anyhow::anyhow!(
                "MEMORIA_SLIDESHOW_BATCH_SIZE must be greater than 0"
            ));
        }

        if self.slideshow_max_photos == 0 {
            return Err(anyhow::anyhow!(
                "MEMORIA_SLIDESHOW_MAX_PHOTOS must be greater than 0"
            ));
        }

        if self.preview_max_dimension == 0 {
            return Err(anyhow::anyhow!(
                "MEMORIA_PREVIEW_MAX_DIMENSION must be greater than 0"
            ));
        }

        Ok(())
    }
}
