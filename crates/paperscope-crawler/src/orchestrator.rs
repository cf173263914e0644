//! Query-to-papers state machine over a result-list context and a detail
//! context.
//!
//! One query runs `Idle -> QuerySubmitted -> ResultsLoaded -> PageParsed ->
//! (NextPage -> PageParsed)* -> Exhausted`. Result links are walked depth
//! first with an explicit stack; recommendations found on a detail page are
//! pushed on top of it so they are visited before the next sibling.

use std::time::Duration;

use paperscope_core::{PageCrawlerConfig, PageLayout, Recovery};
use paperscope_science::RawRecord;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::driver::{
    DriverResult, PageDriver, ResultRow, WaitCondition, click_step, lookup_step, wait_and_click,
    wait_step,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    QuerySubmitted,
    ResultsLoaded,
    PageParsed,
    NextPage,
    Exhausted,
}

/// Orchestrator knobs, taken from [`PageCrawlerConfig`].
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub start_url: String,
    pub page_limit: Option<u32>,
    pub citation_count_filter: u32,
    pub sub_page_citation_limit: u32,
    pub depth_limit: u32,
    pub follow_recommendations: bool,
    pub pub_year_filter: Option<i32>,
    pub publication_category: Option<String>,
    pub timeout: Duration,
}

impl From<&PageCrawlerConfig> for CrawlSettings {
    fn from(config: &PageCrawlerConfig) -> Self {
        Self {
            start_url: config.start_url.clone(),
            page_limit: config.page_limit,
            citation_count_filter: config.citation_count_filter,
            sub_page_citation_limit: config.sub_page_citation_limit,
            depth_limit: config.depth_limit,
            follow_recommendations: config.follow_recommendations,
            pub_year_filter: config.pub_year_filter,
            publication_category: config.publication_category.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// A paper read from a detail page, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedPaper {
    pub raw: RawRecord,
    /// 0 for result-list entries, +1 per recommendation hop.
    pub depth: u32,
}

#[derive(Debug, Clone)]
struct WorkItem {
    link: String,
    citation_count: u32,
    depth: u32,
    threshold: u32,
}

pub struct CrawlOrchestrator<L, D> {
    list: L,
    detail: D,
    layout: PageLayout,
    settings: CrawlSettings,
}

impl<L: PageDriver, D: PageDriver> CrawlOrchestrator<L, D> {
    pub fn new(list: L, detail: D, layout: PageLayout, settings: CrawlSettings) -> Self {
        Self {
            list,
            detail,
            layout,
            settings,
        }
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Papers found for one query. Failures end the query early and keep
    /// whatever was collected up to that point.
    pub async fn crawl_query(&mut self, query: &str) -> Vec<ScrapedPaper> {
        let mut papers = Vec::new();
        let mut state = CrawlState::Idle;
        let mut page_count = 1u32;

        loop {
            let next = match state {
                CrawlState::Idle => self.submit(query).await.map(|_| CrawlState::QuerySubmitted),
                CrawlState::QuerySubmitted => {
                    self.apply_filters().await.map(|_| CrawlState::ResultsLoaded)
                }
                CrawlState::ResultsLoaded | CrawlState::NextPage => {
                    if self.within_page_limit(page_count) {
                        let parsed = self.parse_page(&mut papers).await;
                        page_count += 1;
                        parsed.map(|_| CrawlState::PageParsed)
                    } else {
                        Ok(CrawlState::Exhausted)
                    }
                }
                CrawlState::PageParsed => self.next_page().await,
                CrawlState::Exhausted => break,
            };

            match next {
                Ok(next) => state = next,
                Err(e) => {
                    warn!(query, ?state, error = %e, "query ended early");
                    break;
                }
            }
        }

        info!(query, papers = papers.len(), pages = page_count - 1, "query crawled");
        papers
    }

    /// Close both browser contexts.
    pub async fn shutdown(&mut self) {
        for result in [self.list.quit().await, self.detail.quit().await] {
            if let Err(e) = result {
                warn!(error = %e, "failed to close browser context");
            }
        }
    }

    fn within_page_limit(&self, page_count: u32) -> bool {
        self.settings.page_limit.is_none_or(|limit| page_count <= limit)
    }

    async fn submit(&mut self, query: &str) -> DriverResult<()> {
        let layout = &self.layout;
        let timeout = self.settings.timeout;

        self.list.open(&self.settings.start_url).await?;
        wait_and_click(
            &mut self.list,
            WaitCondition::Present,
            &layout.search_box_class,
            &layout.dismiss_interstitial,
            timeout,
            [Recovery::Propagate, Recovery::Propagate],
        )
        .await?;
        self.list
            .wait_until(WaitCondition::Clickable, &layout.interstitial_class, timeout)
            .await?;
        self.list.submit_query(&layout.search_input, query).await?;
        self.list
            .wait_until(WaitCondition::Visible, &layout.results_class, timeout)
            .await?;
        Ok(())
    }

    async fn apply_filters(&mut self) -> DriverResult<()> {
        if let Some(category) = self.settings.publication_category.clone() {
            self.filter_publication_category(&category).await?;
        }
        if let Some(year) = self.settings.pub_year_filter {
            self.filter_year(year).await?;
        }
        Ok(())
    }

    async fn filter_publication_category(&mut self, category: &str) -> DriverResult<()> {
        let layout = &self.layout;
        let captions = self.list.text_list(&layout.publication_type_caption).await;
        let captions = lookup_step(Vec::new()).recover(captions, Recovery::Fallback)?;

        let Some(index) = captions.iter().position(|c| c.trim() == category) else {
            debug!(category, "publication category filter not offered");
            return Ok(());
        };
        let clicked = self.list.click_nth(&layout.publication_type_checkbox, index).await;
        if click_step().recover(clicked, Recovery::Fallback)? {
            let loaded = self
                .list
                .wait_until(WaitCondition::Visible, &layout.results_class, self.settings.timeout)
                .await;
            wait_step().recover(loaded, Recovery::Fallback)?;
        }
        Ok(())
    }

    /// Select the first and last offered years at or after `year`.
    async fn filter_year(&mut self, year: i32) -> DriverResult<()> {
        let layout = &self.layout;
        let timeout = self.settings.timeout;

        let opened = wait_and_click(
            &mut self.list,
            WaitCondition::Visible,
            &layout.results_class,
            &layout.year_dropdown,
            timeout,
            [Recovery::Propagate, Recovery::Fallback],
        )
        .await?;
        if !opened {
            debug!("year filter not offered");
            return Ok(());
        }

        let values = self.list.text_list(&layout.year_value).await;
        let values = lookup_step(Vec::new()).recover(values, Recovery::Fallback)?;
        let eligible: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.trim().parse::<i32>().is_ok_and(|y| y >= year))
            .map(|(i, _)| i)
            .collect();

        let (Some(&first), Some(&last)) = (eligible.first(), eligible.last()) else {
            debug!(year, "no year at or after the filter");
            return Ok(());
        };
        for index in [first, last] {
            let clicked = self.list.click_nth(&layout.year_item, index).await;
            click_step().recover(clicked, Recovery::Fallback)?;
        }

        self.list
            .wait_until(WaitCondition::Visible, &layout.results_class, timeout)
            .await?;
        Ok(())
    }

    async fn next_page(&mut self) -> DriverResult<CrawlState> {
        if !self.list.advance_page(&self.layout.next_page).await? {
            return Ok(CrawlState::Exhausted);
        }
        self.list
            .wait_until(
                WaitCondition::Visible,
                &self.layout.results_class,
                self.settings.timeout,
            )
            .await?;
        Ok(CrawlState::NextPage)
    }

    async fn parse_page(&mut self, papers: &mut Vec<ScrapedPaper>) -> DriverResult<()> {
        let layout = &self.layout;
        let rows = self
            .list
            .link_rows(&layout.result_row, &layout.result_link, &layout.result_citation)
            .await?;
        debug!(results = rows.len(), "parsing result page");

        let roots = rows
            .iter()
            .map(|row| WorkItem {
                link: row.href.clone(),
                citation_count: row_citations(row),
                depth: 0,
                threshold: self.settings.citation_count_filter,
            })
            .collect();
        self.walk(roots, papers).await
    }

    /// A transient failure on one detail page skips that paper; anything
    /// else ends the page.
    async fn walk(&mut self, roots: Vec<WorkItem>, papers: &mut Vec<ScrapedPaper>) -> DriverResult<()> {
        let mut stack: Vec<WorkItem> = roots.into_iter().rev().collect();

        while let Some(item) = stack.pop() {
            if item.citation_count < item.threshold {
                debug!(link = %item.link, citations = item.citation_count, "below citation gate");
                continue;
            }

            let (raw, related) = match self.read_detail(&item).await {
                Ok(found) => found,
                Err(e) if e.is_transient() => {
                    warn!(link = %item.link, error = %e, "skipping paper");
                    continue;
                }
                Err(e) => return Err(e),
            };
            papers.push(ScrapedPaper {
                raw,
                depth: item.depth,
            });

            let children = related.into_iter().map(|(link, citation_count)| WorkItem {
                link,
                citation_count,
                depth: item.depth + 1,
                threshold: self.settings.sub_page_citation_limit,
            });
            stack.extend(children.rev());
        }
        Ok(())
    }

    fn follows_from(&self, depth: u32) -> bool {
        self.settings.follow_recommendations && depth < self.settings.depth_limit
    }

    /// Paper fields of one detail page plus the recommendations to follow.
    async fn read_detail(&mut self, item: &WorkItem) -> DriverResult<(RawRecord, Vec<(String, u32)>)> {
        let follow = self.follows_from(item.depth);
        let layout = &self.layout;
        let timeout = self.settings.timeout;
        let detail = &mut self.detail;

        detail.open(&item.link).await?;
        wait_and_click(
            detail,
            WaitCondition::Visible,
            &layout.detail_class,
            &layout.detail_tags_more,
            timeout,
            [Recovery::Propagate, Recovery::Fallback],
        )
        .await?;
        wait_and_click(
            detail,
            WaitCondition::Visible,
            &layout.detail_authors_class,
            &layout.detail_authors_more,
            timeout,
            [Recovery::Propagate, Recovery::Fallback],
        )
        .await?;
        detail
            .wait_until(WaitCondition::Visible, &layout.detail_authors_class, timeout)
            .await?;

        let text = lookup_step(None::<String>);
        let list = lookup_step(Vec::<String>::new());

        let title = detail.text(&layout.title).await?;
        let year = detail.text(&layout.year).await?;
        let venue = detail.text(&layout.venue).await?;
        let doi = text.recover(detail.text(&layout.doi).await.map(Some), Recovery::Fallback)?;
        let abstract_text = detail.text(&layout.abstract_text).await?;
        let tags = list.recover(detail.text_list(&layout.tags).await, Recovery::Fallback)?;
        let authors = list.recover(detail.text_list(&layout.authors).await, Recovery::Fallback)?;
        let url = text.recover(detail.href(&layout.url).await.map(Some), Recovery::Fallback)?;

        let related = if follow {
            let rows = detail
                .link_rows(&layout.related_row, &layout.related_link, &layout.related_citation)
                .await;
            lookup_step(Vec::<ResultRow>::new())
                .recover(rows, Recovery::Fallback)?
                .iter()
                .map(|row| (row.href.clone(), row_citations(row)))
                .collect()
        } else {
            Vec::new()
        };

        let mut raw = RawRecord::new();
        raw.insert("title".into(), json!(title));
        raw.insert("publication_date".into(), json!(year));
        raw.insert("source".into(), json!(venue));
        raw.insert(
            "doi".into(),
            doi.map(|d| json!(d.trim().trim_start_matches("DOI:").trim()))
                .unwrap_or(Value::Null),
        );
        raw.insert("abstract".into(), json!(abstract_text));
        raw.insert("tags".into(), json!(tags));
        raw.insert("authors".into(), json!(authors));
        raw.insert("url".into(), url.map(Value::from).unwrap_or(Value::Null));
        raw.insert("citation_count".into(), json!(item.citation_count));
        Ok((raw, related))
    }
}

fn row_citations(row: &ResultRow) -> u32 {
    row.label.as_deref().map_or(0, parse_citation_count)
}

/// First token of a citation label, thousands separators removed. Unreadable
/// labels count as zero.
fn parse_citation_count(label: &str) -> u32 {
    label
        .split_whitespace()
        .next()
        .map(|token| token.replace(',', ""))
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::scripted::{ScriptedDriver, ScriptedPage};
    use crate::error::DriverErrorKind;

    const START: &str = "http://search/home";

    fn layout() -> PageLayout {
        PageLayout::default()
    }

    fn settings() -> CrawlSettings {
        CrawlSettings {
            start_url: START.into(),
            page_limit: None,
            citation_count_filter: 5,
            sub_page_citation_limit: 0,
            depth_limit: 0,
            follow_recommendations: false,
            pub_year_filter: None,
            publication_category: None,
            timeout: Duration::from_millis(10),
        }
    }

    fn home(l: &PageLayout) -> ScriptedPage {
        ScriptedPage::new()
            .with_class(&l.search_box_class)
            .with_class(&l.interstitial_class)
            .with_texts(&l.dismiss_interstitial, &["Explore"])
            .with_texts(&l.search_input, &[""])
            .submits_to("http://search/results/1")
    }

    fn results(l: &PageLayout, rows: &[(&str, &str)]) -> ScriptedPage {
        ScriptedPage::new()
            .with_class(&l.results_class)
            .with_rows(&l.result_row, rows)
    }

    fn detail(l: &PageLayout, title: &str) -> ScriptedPage {
        ScriptedPage::new()
            .with_class(&l.detail_class)
            .with_class(&l.detail_authors_class)
            .with_texts(&l.title, &[title])
            .with_texts(&l.year, &["2019"])
            .with_texts(&l.venue, &["Land Use Policy"])
            .with_texts(&l.doi, &["DOI: 10.1016/j.landusepol.2019.01.001"])
            .with_texts(&l.abstract_text, &["An abstract."])
            .with_texts(&l.tags, &["Carbon", "Soil"])
            .with_texts(&l.authors, &["A. Author", "B. Author"])
            .with_hrefs(&l.url, &["http://publisher/paper"])
    }

    fn titles(papers: &[ScrapedPaper]) -> Vec<&str> {
        papers.iter().map(|p| p.raw["title"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn citation_gate_runs_before_detail_open() {
        let l = layout();
        let list = ScriptedDriver::new()
            .with_page(START, home(&l))
            .with_page(
                "http://search/results/1",
                results(
                    &l,
                    &[("http://d/1", "12 citations"), ("http://d/2", "4"), ("http://d/3", "1,204")],
                ),
            );
        let detail = ScriptedDriver::new()
            .with_page("http://d/1", detail(&l, "One"))
            .with_page("http://d/2", detail(&l, "Two"))
            .with_page("http://d/3", detail(&l, "Three"));
        let opened = detail.opened.clone();

        let mut orchestrator = CrawlOrchestrator::new(list, detail, l, settings());
        let papers = orchestrator.crawl_query("soil AND carbon").await;

        assert_eq!(titles(&papers), vec!["One", "Three"]);
        assert_eq!(*opened.lock().unwrap(), vec!["http://d/1", "http://d/3"]);
        assert_eq!(papers[1].raw["citation_count"], json!(1204));
        assert_eq!(papers[0].raw["doi"], json!("10.1016/j.landusepol.2019.01.001"));
        assert_eq!(papers[0].raw["publication_date"], json!("2019"));
        assert_eq!(papers[0].raw["source"], json!("Land Use Policy"));
        assert_eq!(papers[0].raw["authors"], json!(["A. Author", "B. Author"]));
    }

    #[tokio::test]
    async fn recommendations_stop_at_depth_limit() {
        let l = layout();
        let list = ScriptedDriver::new()
            .with_page(START, home(&l))
            .with_page("http://search/results/1", results(&l, &[("http://d/root", "50")]));

        let chain = |title: &str, child: &str| {
            detail(&l, title)
                .with_rows(&l.related_row, &[(child, "900")])
        };
        let detail = ScriptedDriver::new()
            .with_page("http://d/root", chain("Root", "http://d/child"))
            .with_page("http://d/child", chain("Child", "http://d/grandchild"))
            .with_page("http://d/grandchild", chain("Grandchild", "http://d/leaf"));
        let opened = detail.opened.clone();

        let mut s = settings();
        s.follow_recommendations = true;
        s.depth_limit = 1;
        s.sub_page_citation_limit = 500;
        let mut orchestrator = CrawlOrchestrator::new(list, detail, l, s);
        let papers = orchestrator.crawl_query("q").await;

        assert_eq!(titles(&papers), vec!["Root", "Child"]);
        assert_eq!(papers.iter().map(|p| p.depth).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(opened.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn recommendations_are_visited_before_siblings() {
        let l = layout();
        let list = ScriptedDriver::new().with_page(START, home(&l)).with_page(
            "http://search/results/1",
            results(&l, &[("http://d/a", "10"), ("http://d/b", "10")]),
        );
        let detail = ScriptedDriver::new()
            .with_page(
                "http://d/a",
                detail(&l, "A")
                    .with_rows(&l.related_row, &[("http://d/a1", "600"), ("http://d/a2", "20")]),
            )
            .with_page("http://d/a1", detail(&l, "A1"))
            .with_page("http://d/a2", detail(&l, "A2"))
            .with_page("http://d/b", detail(&l, "B"));

        let mut s = settings();
        s.follow_recommendations = true;
        s.depth_limit = 2;
        s.sub_page_citation_limit = 500;
        let mut orchestrator = CrawlOrchestrator::new(list, detail, l, s);
        let papers = orchestrator.crawl_query("q").await;

        assert_eq!(titles(&papers), vec!["A", "A1", "B"]);
    }

    #[tokio::test]
    async fn page_limit_bounds_pagination() {
        let l = layout();
        let list = ScriptedDriver::new()
            .with_page(START, home(&l))
            .with_page(
                "http://search/results/1",
                results(&l, &[("http://d/1", "10")]).with_next("http://search/results/2"),
            )
            .with_page(
                "http://search/results/2",
                results(&l, &[("http://d/2", "10")]).with_next("http://search/results/3"),
            )
            .with_page("http://search/results/3", results(&l, &[("http://d/3", "10")]));
        let detail = ScriptedDriver::new()
            .with_page("http://d/1", detail(&l, "One"))
            .with_page("http://d/2", detail(&l, "Two"))
            .with_page("http://d/3", detail(&l, "Three"));

        let mut s = settings();
        s.page_limit = Some(2);
        let mut orchestrator = CrawlOrchestrator::new(list.clone(), detail.clone(), l.clone(), s);
        assert_eq!(titles(&orchestrator.crawl_query("q").await), vec!["One", "Two"]);

        let mut unbounded = CrawlOrchestrator::new(list, detail, l, settings());
        assert_eq!(
            titles(&unbounded.crawl_query("q").await),
            vec!["One", "Two", "Three"]
        );
    }

    #[tokio::test]
    async fn page_failure_keeps_earlier_papers() {
        let l = layout();
        let list = ScriptedDriver::new()
            .with_page(START, home(&l))
            .with_page(
                "http://search/results/1",
                results(&l, &[("http://d/1", "10")]).with_next("http://search/results/2"),
            )
            .with_page(
                "http://search/results/2",
                results(&l, &[("http://d/2", "10")])
                    .failing(&l.result_row, DriverErrorKind::Browser),
            );
        let detail = ScriptedDriver::new()
            .with_page("http://d/1", detail(&l, "One"))
            .with_page("http://d/2", detail(&l, "Two"));

        let mut orchestrator = CrawlOrchestrator::new(list, detail, l, settings());
        assert_eq!(titles(&orchestrator.crawl_query("q").await), vec!["One"]);
    }

    #[tokio::test]
    async fn broken_detail_page_skips_only_that_paper() {
        let l = layout();
        let list = ScriptedDriver::new().with_page(START, home(&l)).with_page(
            "http://search/results/1",
            results(&l, &[("http://d/1", "10"), ("http://d/2", "10")]),
        );
        let broken = ScriptedPage::new().with_class(&l.detail_class);
        let no_doi = ScriptedPage::new()
            .with_class(&l.detail_class)
            .with_class(&l.detail_authors_class)
            .with_texts(&l.title, &["Two"])
            .with_texts(&l.year, &["2020"])
            .with_texts(&l.venue, &["Geoderma"])
            .with_texts(&l.abstract_text, &["Text."]);
        let detail = ScriptedDriver::new()
            .with_page("http://d/1", broken)
            .with_page("http://d/2", no_doi);

        let mut orchestrator = CrawlOrchestrator::new(list, detail, l, settings());
        let papers = orchestrator.crawl_query("q").await;

        assert_eq!(titles(&papers), vec!["Two"]);
        assert_eq!(papers[0].raw["doi"], Value::Null);
        assert_eq!(papers[0].raw["tags"], json!([]));
    }

    #[tokio::test]
    async fn blank_citation_label_stays_with_its_own_result() {
        let l = layout();
        let list = ScriptedDriver::new().with_page(START, home(&l)).with_page(
            "http://search/results/1",
            results(&l, &[("http://d/1", "12"), ("http://d/2", ""), ("http://d/3", "1,204")]),
        );
        let detail = ScriptedDriver::new()
            .with_page("http://d/1", detail(&l, "One"))
            .with_page("http://d/2", detail(&l, "Two"))
            .with_page("http://d/3", detail(&l, "Three"));
        let opened = detail.opened.clone();

        let mut orchestrator = CrawlOrchestrator::new(list, detail, l, settings());
        let papers = orchestrator.crawl_query("q").await;

        assert_eq!(*opened.lock().unwrap(), vec!["http://d/1", "http://d/3"]);
        assert_eq!(titles(&papers), vec!["One", "Three"]);
        assert_eq!(papers[0].raw["citation_count"], json!(12));
        assert_eq!(papers[1].raw["citation_count"], json!(1204));
    }

    #[tokio::test]
    async fn browser_failure_on_detail_ends_the_page() {
        let l = layout();
        let list = ScriptedDriver::new().with_page(START, home(&l)).with_page(
            "http://search/results/1",
            results(&l, &[("http://d/1", "10"), ("http://d/2", "10"), ("http://d/3", "10")]),
        );
        let detail = ScriptedDriver::new()
            .with_page("http://d/1", detail(&l, "One"))
            .with_page(
                "http://d/2",
                detail(&l, "Two").failing(&l.title, DriverErrorKind::Browser),
            )
            .with_page("http://d/3", detail(&l, "Three"));
        let opened = detail.opened.clone();

        let mut orchestrator = CrawlOrchestrator::new(list, detail, l, settings());
        let papers = orchestrator.crawl_query("q").await;

        assert_eq!(titles(&papers), vec!["One"]);
        assert_eq!(*opened.lock().unwrap(), vec!["http://d/1", "http://d/2"]);
    }

    #[tokio::test]
    async fn failed_submission_returns_nothing() {
        let l = layout();
        let home = ScriptedPage::new().with_class(&l.search_box_class);
        let list = ScriptedDriver::new().with_page(START, home);
        let mut orchestrator = CrawlOrchestrator::new(list, ScriptedDriver::new(), l, settings());
        assert!(orchestrator.crawl_query("q").await.is_empty());
    }

    #[tokio::test]
    async fn filters_click_matching_category_and_years() {
        let l = layout();
        let results_page = results(&l, &[])
            .with_texts(&l.publication_type_caption, &["Conference", "Journal publications"])
            .with_texts(&l.publication_type_checkbox, &["", ""])
            .with_texts(&l.year_dropdown, &[""])
            .with_texts(&l.year_value, &["2001", "2004", "2008", "2015"])
            .with_texts(&l.year_item, &["", "", "", ""]);
        let list = ScriptedDriver::new()
            .with_page(START, home(&l))
            .with_page("http://search/results/1", results_page);
        let clicks = list.clicks.clone();

        let mut s = settings();
        s.publication_category = Some("Journal publications".into());
        s.pub_year_filter = Some(2005);
        let mut orchestrator = CrawlOrchestrator::new(list, ScriptedDriver::new(), l.clone(), s);
        orchestrator.crawl_query("q").await;

        let clicks = clicks.lock().unwrap();
        assert!(clicks.contains(&format!("{}#1", l.publication_type_checkbox)));
        assert!(clicks.contains(&format!("{}#2", l.year_item)));
        assert!(clicks.contains(&format!("{}#3", l.year_item)));
        assert!(!clicks.contains(&format!("{}#1", l.year_item)));
    }

    #[test]
    fn citation_labels() {
        assert_eq!(parse_citation_count("1,204 citations"), 1204);
        assert_eq!(parse_citation_count("7"), 7);
        assert_eq!(parse_citation_count(""), 0);
        assert_eq!(parse_citation_count("n/a"), 0);
    }
}
