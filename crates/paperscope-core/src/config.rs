use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root configuration, loaded from `~/.config/paperscope/config.toml`.
///
/// A crawler runs only when its section is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub lookup: LookupConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageCrawlerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedCrawlerConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<RestCrawlerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
    pub batch_size: usize,
    /// Wipe every table before the run starts.
    pub reset_on_start: bool,
}

/// Bibliographic metadata API used for DOI, venue and citation lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polite_email: Option<String>,
    pub timeout_ms: u64,
    pub min_interval_ms: u64,
}

/// Browser-driven search engine crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageCrawlerConfig {
    pub database: String,
    pub start_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,
    pub citation_count_filter: u32,
    pub timeout_secs: u64,
    pub max_queries: usize,
    pub depth_limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pub_year_filter: Option<i32>,
    pub sub_page_citation_limit: u32,
    pub follow_recommendations: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_category: Option<String>,
    /// Headless flag for the list context and the detail context.
    pub headless: [bool; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_file: Option<String>,
    pub nb_keywords: usize,
    pub layout: PageLayout,
}

/// CSS selectors (and bare class names for waits) of the search engine UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub search_box_class: String,
    pub interstitial_class: String,
    pub dismiss_interstitial: String,
    pub search_input: String,
    pub results_class: String,
    pub publication_type_checkbox: String,
    pub publication_type_caption: String,
    pub year_dropdown: String,
    pub year_item: String,
    pub year_value: String,
    /// One search result; `result_link` and `result_citation` are looked up
    /// inside it.
    pub result_row: String,
    pub result_link: String,
    pub result_citation: String,
    pub next_page: String,
    pub detail_class: String,
    pub detail_tags_more: String,
    pub detail_authors_class: String,
    pub detail_authors_more: String,
    pub title: String,
    pub year: String,
    pub venue: String,
    pub doi: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub tags: String,
    pub authors: String,
    pub url: String,
    /// Same layout as `result_row`, for the recommendations of a detail page.
    pub related_row: String,
    pub related_link: String,
    pub related_citation: String,
}

/// Atom feed API crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedCrawlerConfig {
    pub database: String,
    pub base_url: String,
    pub nb_queries: usize,
    pub paper_limit_per_query: u32,
    pub nb_keywords: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
}

/// Publisher search REST API crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RestCrawlerConfig {
    pub database: String,
    pub base_url: String,
    pub article_url: String,
    pub api_key_env: String,
    pub nb_queries: usize,
    pub page_size: u32,
    pub truncate: u32,
    pub date_range: String,
    pub request_delay_ms: u64,
    pub allowed_pub_types: Vec<String>,
    pub nb_keywords: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
}

// ─── Defaults ──────────────────────────────────────────────

const DEFAULT_EXPORT_DIR: &str = "csv_exports";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            lookup: LookupConfig::default(),
            page: None,
            feed: Some(FeedCrawlerConfig::default()),
            rest: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("paperscope");

        Self {
            database_path: data_dir.join("papers.db").to_string_lossy().to_string(),
            batch_size: 100,
            reset_on_start: false,
        }
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.crossref.org".to_string(),
            polite_email: None,
            timeout_ms: 1000,
            min_interval_ms: 100,
        }
    }
}

impl Default for PageCrawlerConfig {
    fn default() -> Self {
        Self {
            database: "microsoft_academics".to_string(),
            start_url: "https://academic.microsoft.com/home".to_string(),
            page_limit: Some(2),
            citation_count_filter: 5,
            timeout_secs: 10,
            max_queries: 2,
            depth_limit: 0,
            pub_year_filter: Some(2005),
            sub_page_citation_limit: 500,
            follow_recommendations: false,
            publication_category: Some("Journal publications".to_string()),
            headless: [false, true],
            export_dir: Some(DEFAULT_EXPORT_DIR.to_string()),
            keyword_file: None,
            nb_keywords: 3,
            layout: PageLayout::default(),
        }
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        let type_row = "ma-publication-type-filter > compose > div.filter-card > \
                        div.data-bar-item.au-target > ma-data-bar > div.au-target.ma-data-bar";
        Self {
            search_box_class: "suggestion-box".to_string(),
            interstitial_class: "hp-suggestions".to_string(),
            dismiss_interstitial: ".hp-suggestions > h1.title".to_string(),
            search_input: "div.suggestion-box > input#search-input".to_string(),
            results_class: "primary_paper".to_string(),
            publication_type_checkbox: format!(
                "{type_row} div.field > div.checkbox.shadowed > span.checkmark"
            ),
            publication_type_caption: format!("{type_row} div.data > div.values > div.caption"),
            year_dropdown: "div.au-target.ma-year-range-dropdown".to_string(),
            year_item: "div.au-target.year-item".to_string(),
            year_value: "div.au-target.year-item div.year-value".to_string(),
            result_row: "ma-card".to_string(),
            result_link: "div.primary_paper > a.title".to_string(),
            result_citation: "div.citation > a > span".to_string(),
            next_page: "i.icon-up.right".to_string(),
            detail_class: "name-section".to_string(),
            detail_tags_more: "div.tag-cloud > div.show-more".to_string(),
            detail_authors_class: "authors".to_string(),
            detail_authors_more: "div.authors > div.show-more".to_string(),
            title: "div.name-section > h1.name".to_string(),
            year: "div.name-section > a.publication > span.year".to_string(),
            venue: "div.name-section > a.publication > span.pub-name".to_string(),
            doi: "div.name-section > a.doiLink".to_string(),
            abstract_text: "div.name-section > p".to_string(),
            tags: "ma-link-tag > a.ma-tag > div.text".to_string(),
            authors: "div.authors > div.author-item > a.author.link".to_string(),
            url: "div.ma-link-collection > a.ma-link-collection-item".to_string(),
            related_row: "ma-paper-results ma-card".to_string(),
            related_link: "div.primary_paper > a.title".to_string(),
            related_citation: "div.citation > a > span".to_string(),
        }
    }
}

impl Default for FeedCrawlerConfig {
    fn default() -> Self {
        Self {
            database: "arxiv".to_string(),
            base_url: "http://export.arxiv.org/api/query".to_string(),
            nb_queries: 10,
            paper_limit_per_query: 10,
            nb_keywords: 3,
            keyword_file: None,
            export_dir: Some(DEFAULT_EXPORT_DIR.to_string()),
        }
    }
}

impl Default for RestCrawlerConfig {
    fn default() -> Self {
        Self {
            database: "sciencedirect".to_string(),
            base_url: "https://api.elsevier.com/content/search/sciencedirect".to_string(),
            article_url: "https://api.elsevier.com/content/article/doi".to_string(),
            api_key_env: "ELSEVIER_API_KEY".to_string(),
            nb_queries: 3,
            page_size: 100,
            truncate: 3000,
            date_range: "2005-2020".to_string(),
            request_delay_ms: 2000,
            allowed_pub_types: ["rev", "fla", "crp", "chp", "dat"]
                .into_iter()
                .map(String::from)
                .collect(),
            nb_keywords: 3,
            keyword_file: None,
            export_dir: Some(DEFAULT_EXPORT_DIR.to_string()),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/paperscope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PAPERSCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("paperscope")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.database_path)
    }
}
