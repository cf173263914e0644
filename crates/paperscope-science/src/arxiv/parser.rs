use quick_xml::de::from_str;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{Result, ScienceError};
use crate::normalize::RawRecord;

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: String,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@title")]
    title: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
}

/// A feed entry reduced to the fields the normalizer consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub summary: String,
    pub published: String,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    pub doi: Option<String>,
    pub links: Vec<FeedLink>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedLink {
    pub href: String,
    pub title: Option<String>,
    pub rel: Option<String>,
    pub link_type: Option<String>,
}

pub fn parse_atom_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| ScienceError::Parse(format!("invalid atom xml: {e}")))?;

    Ok(feed.entries.into_iter().map(parse_entry).collect())
}

fn parse_entry(entry: AtomEntry) -> FeedEntry {
    let links = entry
        .links
        .into_iter()
        .filter_map(|link| {
            Some(FeedLink {
                href: link.href?.trim().to_string(),
                title: clean_optional(link.title),
                rel: clean_optional(link.rel),
                link_type: clean_optional(link.link_type),
            })
        })
        .collect();

    FeedEntry {
        title: clean_text(&entry.title),
        summary: clean_text(&entry.summary),
        published: entry.published.trim().to_string(),
        authors: entry.authors.into_iter().map(|a| clean_text(&a.name)).collect(),
        tags: entry
            .categories
            .into_iter()
            .filter_map(|c| clean_optional(c.term))
            .collect(),
        doi: clean_optional(entry.doi),
        links,
    }
}

impl FeedEntry {
    /// The page link: the `alternate` link, else the first one.
    pub fn link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| self.links.first())
            .map(|l| l.href.as_str())
    }

    pub fn into_raw(self) -> RawRecord {
        let link = self.link().map(str::to_string);
        let links: Vec<Value> = self
            .links
            .iter()
            .map(|l| {
                json!({
                    "href": l.href,
                    "title": l.title,
                    "rel": l.rel,
                    "type": l.link_type,
                })
            })
            .collect();

        let mut raw = RawRecord::new();
        raw.insert("title".into(), json!(self.title));
        raw.insert(
            "authors".into(),
            Value::Array(self.authors.iter().map(|name| json!({ "name": name })).collect()),
        );
        raw.insert("links".into(), Value::Array(links));
        raw.insert("link".into(), json!(link));
        raw.insert("published".into(), json!(self.published));
        raw.insert("summary".into(), json!(self.summary));
        raw.insert(
            "tags".into(),
            Value::Array(self.tags.iter().map(|term| json!({ "term": term })).collect()),
        );
        raw.insert("arxiv_doi".into(), json!(self.doi));
        raw
    }
}

fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.map(|v| clean_text(&v)).filter(|v| !v.is_empty())
}
