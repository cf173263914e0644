//! [`PageDriver`] backed by a Chromium instance over CDP.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::{DriverResult, PageDriver, ResultRow, WaitCondition};
use crate::error::{DriverError, DriverErrorKind};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// One browser with a single tab.
pub struct ChromiumDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

fn browser_error(target: &str, err: CdpError) -> DriverError {
    DriverError::new(DriverErrorKind::Browser, format!("{target} ({err})"))
}

fn lookup_error(target: &str, err: CdpError) -> DriverError {
    match err {
        CdpError::NotFound => DriverError::no_such_element(target),
        CdpError::ChromeMessage(ref msg) if msg.contains("find node") => {
            DriverError::no_such_element(target)
        }
        CdpError::ChromeMessage(ref msg) if msg.contains("detached") => {
            DriverError::new(DriverErrorKind::StaleElement, target)
        }
        other => browser_error(target, other),
    }
}

impl ChromiumDriver {
    pub async fn launch(headless: bool, request_timeout: Duration) -> DriverResult<Self> {
        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(request_timeout)
            .window_size(1920, 1080);
        builder = if headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };
        let config = builder
            .arg("--no-first-run")
            .arg("--disable-notifications")
            .build()
            .map_err(|e| DriverError::new(DriverErrorKind::Browser, e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| browser_error("launch", e))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    trace!(error = %e, "browser handler event failed");
                }
            }
            debug!("browser handler finished");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error("new page", e))?;
        info!(headless, "browser launched");

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    async fn find(&self, selector: &str) -> DriverResult<Element> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| lookup_error(selector, e))
    }

    async fn find_all(&self, selector: &str) -> DriverResult<Vec<Element>> {
        match self.page.find_elements(selector).await {
            Ok(elements) => Ok(elements),
            Err(e) => match lookup_error(selector, e) {
                err if err.kind == DriverErrorKind::NoSuchElement => Ok(Vec::new()),
                err => Err(err),
            },
        }
    }

    async fn find_within(parent: &Element, selector: &str) -> DriverResult<Option<Element>> {
        match parent.find_element(selector).await {
            Ok(element) => Ok(Some(element)),
            Err(e) => match lookup_error(selector, e) {
                err if err.kind == DriverErrorKind::NoSuchElement => Ok(None),
                err => Err(err),
            },
        }
    }

    async fn condition_met(&self, condition: WaitCondition, class: &str) -> DriverResult<bool> {
        let selector = format!(".{class}");
        let script = match condition {
            WaitCondition::Present => format!("document.querySelector('{selector}') !== null"),
            WaitCondition::Visible => format!(
                "(() => {{ const e = document.querySelector('{selector}'); \
                 return e !== null && e.offsetParent !== null; }})()"
            ),
            WaitCondition::Clickable => format!(
                "(() => {{ const e = document.querySelector('{selector}'); \
                 return e !== null && e.offsetParent !== null && !e.disabled; }})()"
            ),
        };
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| browser_error(class, e))?;
        result
            .into_value::<bool>()
            .map_err(|e| DriverError::new(DriverErrorKind::Browser, format!("{class} ({e})")))
    }

    async fn click_element(element: &Element, target: &str) -> DriverResult<bool> {
        element
            .click()
            .await
            .map_err(|e| DriverError::new(DriverErrorKind::ClickIntercepted, format!("{target} ({e})")))?;
        Ok(true)
    }
}

#[async_trait]
impl PageDriver for ChromiumDriver {
    async fn open(&mut self, url: &str) -> DriverResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::new(DriverErrorKind::Navigation, format!("{url} ({e})")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| DriverError::new(DriverErrorKind::Navigation, format!("{url} ({e})")))?;
        Ok(())
    }

    async fn wait_until(
        &mut self,
        condition: WaitCondition,
        class: &str,
        timeout: Duration,
    ) -> DriverResult<bool> {
        let start = Instant::now();
        loop {
            if self.condition_met(condition, class).await? {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::timeout(class));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click_first_matching(&mut self, selector: &str) -> DriverResult<bool> {
        let element = self.find(selector).await?;
        Self::click_element(&element, selector).await
    }

    async fn click_nth(&mut self, selector: &str, index: usize) -> DriverResult<bool> {
        let elements = self.find_all(selector).await?;
        let element = elements
            .get(index)
            .ok_or_else(|| DriverError::no_such_element(format!("{selector}[{index}]")))?;
        Self::click_element(element, selector).await
    }

    async fn submit_query(&mut self, selector: &str, text: &str) -> DriverResult<()> {
        let input = self.find(selector).await?;
        Self::click_element(&input, selector).await?;
        input
            .type_str(text)
            .await
            .map_err(|e| lookup_error(selector, e))?;
        input
            .press_key("Enter")
            .await
            .map_err(|e| lookup_error(selector, e))?;
        Ok(())
    }

    async fn text(&mut self, selector: &str) -> DriverResult<String> {
        let element = self.find(selector).await?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| lookup_error(selector, e))?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn text_list(&mut self, selector: &str) -> DriverResult<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.find_all(selector).await? {
            if let Some(text) = element
                .inner_text()
                .await
                .map_err(|e| lookup_error(selector, e))?
            {
                let text = text.trim();
                if !text.is_empty() {
                    texts.push(text.to_string());
                }
            }
        }
        Ok(texts)
    }

    async fn href(&mut self, selector: &str) -> DriverResult<String> {
        let element = self.find(selector).await?;
        element
            .attribute("href")
            .await
            .map_err(|e| lookup_error(selector, e))?
            .ok_or_else(|| DriverError::no_such_element(format!("{selector}[href]")))
    }

    async fn href_list(&mut self, selector: &str) -> DriverResult<Vec<String>> {
        let mut hrefs = Vec::new();
        for element in self.find_all(selector).await? {
            if let Some(href) = element
                .attribute("href")
                .await
                .map_err(|e| lookup_error(selector, e))?
            {
                hrefs.push(href);
            }
        }
        Ok(hrefs)
    }

    async fn link_rows(
        &mut self,
        row: &str,
        link: &str,
        label: &str,
    ) -> DriverResult<Vec<ResultRow>> {
        let mut rows = Vec::new();
        for element in self.find_all(row).await? {
            let Some(anchor) = Self::find_within(&element, link).await? else {
                continue;
            };
            let Some(href) = anchor
                .attribute("href")
                .await
                .map_err(|e| lookup_error(link, e))?
            else {
                continue;
            };
            let text = match Self::find_within(&element, label).await? {
                Some(node) => node
                    .inner_text()
                    .await
                    .map_err(|e| lookup_error(label, e))?
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
                None => None,
            };
            rows.push(ResultRow { href, label: text });
        }
        Ok(rows)
    }

    async fn advance_page(&mut self, selector: &str) -> DriverResult<bool> {
        let Some(next) = self.find_all(selector).await?.into_iter().next() else {
            return Ok(false);
        };
        Self::click_element(&next, selector).await
    }

    async fn quit(&mut self) -> DriverResult<()> {
        let closed = self.browser.close().await;
        self.handler.abort();
        closed.map(|_| ()).map_err(|e| browser_error("close", e))
    }
}
