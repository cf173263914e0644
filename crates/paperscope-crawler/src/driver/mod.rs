//! Browser automation seam used by the page crawler.

use std::time::Duration;

use async_trait::async_trait;
use paperscope_core::{FaultTolerantStep, Recovery};

use crate::error::DriverError;

#[cfg(feature = "chromium")]
pub mod chromium;
#[cfg(test)]
pub(crate) mod scripted;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// What [`PageDriver::wait_until`] waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    Present,
    Visible,
    Clickable,
}

/// One entry of a result list: its link and, when the entry shows one, its
/// label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub href: String,
    pub label: Option<String>,
}

/// Element lookup, click and wait primitives over one browser context.
///
/// Selectors are CSS selectors, except for `wait_until` which takes a bare
/// class name. Every failure is a [`DriverError`]; call sites decide through
/// a [`FaultTolerantStep`] whether it is absorbed.
#[async_trait]
pub trait PageDriver: Send {
    async fn open(&mut self, url: &str) -> DriverResult<()>;

    /// `Ok(true)` once an element with `class` meets `condition`; a
    /// `Timeout` error after `timeout`.
    async fn wait_until(
        &mut self,
        condition: WaitCondition,
        class: &str,
        timeout: Duration,
    ) -> DriverResult<bool>;

    async fn click_first_matching(&mut self, selector: &str) -> DriverResult<bool>;

    /// Click the `index`-th element matching `selector`.
    async fn click_nth(&mut self, selector: &str, index: usize) -> DriverResult<bool>;

    /// Focus the input at `selector`, type `text` and press Enter.
    async fn submit_query(&mut self, selector: &str, text: &str) -> DriverResult<()>;

    async fn text(&mut self, selector: &str) -> DriverResult<String>;

    /// Non-empty texts of all matching elements; no match is an empty list.
    async fn text_list(&mut self, selector: &str) -> DriverResult<Vec<String>>;

    async fn href(&mut self, selector: &str) -> DriverResult<String>;

    async fn href_list(&mut self, selector: &str) -> DriverResult<Vec<String>>;

    /// One [`ResultRow`] per element matching `row`, with `link` and `label`
    /// looked up inside that element. A blank or missing label is `None`;
    /// rows without a link are skipped.
    async fn link_rows(&mut self, row: &str, link: &str, label: &str)
    -> DriverResult<Vec<ResultRow>>;

    /// Click the next-page control. `Ok(false)` when there is none.
    async fn advance_page(&mut self, selector: &str) -> DriverResult<bool>;

    async fn quit(&mut self) -> DriverResult<()> {
        Ok(())
    }
}

/// Absorbs missing and stale elements.
pub fn lookup_step<T: Clone>(default: T) -> FaultTolerantStep<T, DriverError> {
    FaultTolerantStep::new(DriverError::is_lookup, default)
}

/// Absorbs lookup failures and intercepted clicks; the default is "not clicked".
pub fn click_step() -> FaultTolerantStep<bool, DriverError> {
    FaultTolerantStep::new(DriverError::is_click, false)
}

/// Absorbs every transient failure, timeouts included.
pub fn wait_step() -> FaultTolerantStep<bool, DriverError> {
    FaultTolerantStep::new(DriverError::is_transient, false)
}

/// Wait for `class`, then click `selector`. `recovery` applies to the wait
/// and the click respectively.
pub async fn wait_and_click<D>(
    driver: &mut D,
    condition: WaitCondition,
    class: &str,
    selector: &str,
    timeout: Duration,
    recovery: [Recovery; 2],
) -> DriverResult<bool>
where
    D: PageDriver + ?Sized,
{
    let waited = driver.wait_until(condition, class, timeout).await;
    wait_step().recover(waited, recovery[0])?;

    let clicked = driver.click_first_matching(selector).await;
    click_step().recover(clicked, recovery[1])
}
