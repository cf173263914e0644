//! In-memory [`PageDriver`] serving canned pages for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{DriverResult, PageDriver, ResultRow, WaitCondition};
use crate::error::{DriverError, DriverErrorKind};

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedPage {
    classes: HashSet<String>,
    texts: HashMap<String, Vec<String>>,
    hrefs: HashMap<String, Vec<String>>,
    rows: HashMap<String, Vec<ResultRow>>,
    failures: HashMap<String, DriverErrorKind>,
    next: Option<String>,
    submit_to: Option<String>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    pub fn with_texts(mut self, selector: &str, texts: &[&str]) -> Self {
        self.texts
            .insert(selector.to_string(), texts.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_hrefs(mut self, selector: &str, hrefs: &[&str]) -> Self {
        self.hrefs
            .insert(selector.to_string(), hrefs.iter().map(|h| h.to_string()).collect());
        self
    }

    /// Result rows under `row`; an empty label stands for a blank one.
    pub fn with_rows(mut self, row: &str, rows: &[(&str, &str)]) -> Self {
        let rows = rows
            .iter()
            .map(|(href, label)| ResultRow {
                href: href.to_string(),
                label: Some(label.trim().to_string()).filter(|l| !l.is_empty()),
            })
            .collect();
        self.rows.insert(row.to_string(), rows);
        self
    }

    /// Every operation on `target` fails with `kind`.
    pub fn failing(mut self, target: &str, kind: DriverErrorKind) -> Self {
        self.failures.insert(target.to_string(), kind);
        self
    }

    pub fn with_next(mut self, url: &str) -> Self {
        self.next = Some(url.to_string());
        self
    }

    pub fn submits_to(mut self, url: &str) -> Self {
        self.submit_to = Some(url.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedDriver {
    pages: HashMap<String, ScriptedPage>,
    pub current: Option<String>,
    /// URLs passed to `open`, in order. Shared so tests can inspect it after
    /// the driver has been moved.
    pub opened: Arc<Mutex<Vec<String>>>,
    pub clicks: Arc<Mutex<Vec<String>>>,
    /// Failures consumed by the first operation on their target, whatever
    /// the page.
    fail_once: Arc<Mutex<HashMap<String, DriverErrorKind>>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn failing_once(self, target: &str, kind: DriverErrorKind) -> Self {
        if let Ok(mut pending) = self.fail_once.lock() {
            pending.insert(target.to_string(), kind);
        }
        self
    }

    fn page(&self, target: &str) -> DriverResult<&ScriptedPage> {
        let pending = self.fail_once.lock().ok().and_then(|mut p| p.remove(target));
        if let Some(kind) = pending {
            return Err(DriverError::new(kind, target));
        }
        let page = self
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .ok_or_else(|| DriverError::new(DriverErrorKind::Navigation, target))?;
        if let Some(kind) = page.failures.get(target) {
            return Err(DriverError::new(*kind, target));
        }
        Ok(page)
    }

    fn navigate(&mut self, url: &str) -> DriverResult<()> {
        if !self.pages.contains_key(url) {
            return Err(DriverError::new(DriverErrorKind::Navigation, url));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    fn record_click(&self, what: String) {
        if let Ok(mut clicks) = self.clicks.lock() {
            clicks.push(what);
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn open(&mut self, url: &str) -> DriverResult<()> {
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(url.to_string());
        }
        self.navigate(url)
    }

    async fn wait_until(
        &mut self,
        _condition: WaitCondition,
        class: &str,
        _timeout: Duration,
    ) -> DriverResult<bool> {
        if self.page(class)?.classes.contains(class) {
            Ok(true)
        } else {
            Err(DriverError::timeout(class))
        }
    }

    async fn click_first_matching(&mut self, selector: &str) -> DriverResult<bool> {
        let page = self.page(selector)?;
        if page.texts.contains_key(selector) || page.hrefs.contains_key(selector) {
            self.record_click(selector.to_string());
            Ok(true)
        } else {
            Err(DriverError::no_such_element(selector))
        }
    }

    async fn click_nth(&mut self, selector: &str, index: usize) -> DriverResult<bool> {
        let found = self
            .page(selector)?
            .texts
            .get(selector)
            .is_some_and(|texts| index < texts.len());
        if !found {
            return Err(DriverError::no_such_element(selector));
        }
        self.record_click(format!("{selector}#{index}"));
        Ok(true)
    }

    async fn submit_query(&mut self, selector: &str, text: &str) -> DriverResult<()> {
        let page = self.page(selector)?;
        if !page.texts.contains_key(selector) {
            return Err(DriverError::no_such_element(selector));
        }
        let target = page.submit_to.clone();
        self.record_click(format!("{selector}<{text}"));
        match target {
            Some(url) => self.navigate(&url),
            None => Ok(()),
        }
    }

    async fn text(&mut self, selector: &str) -> DriverResult<String> {
        self.page(selector)?
            .texts
            .get(selector)
            .and_then(|texts| texts.first().cloned())
            .ok_or_else(|| DriverError::no_such_element(selector))
    }

    async fn text_list(&mut self, selector: &str) -> DriverResult<Vec<String>> {
        Ok(self.page(selector)?.texts.get(selector).cloned().unwrap_or_default())
    }

    async fn href(&mut self, selector: &str) -> DriverResult<String> {
        self.page(selector)?
            .hrefs
            .get(selector)
            .and_then(|hrefs| hrefs.first().cloned())
            .ok_or_else(|| DriverError::no_such_element(selector))
    }

    async fn href_list(&mut self, selector: &str) -> DriverResult<Vec<String>> {
        Ok(self.page(selector)?.hrefs.get(selector).cloned().unwrap_or_default())
    }

    async fn link_rows(
        &mut self,
        row: &str,
        _link: &str,
        _label: &str,
    ) -> DriverResult<Vec<ResultRow>> {
        Ok(self.page(row)?.rows.get(row).cloned().unwrap_or_default())
    }

    async fn advance_page(&mut self, selector: &str) -> DriverResult<bool> {
        match self.page(selector)?.next.clone() {
            Some(url) => {
                self.record_click(selector.to_string());
                self.navigate(&url)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
