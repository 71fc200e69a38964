//! In-memory `PageReader` over a scripted listing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{ButtonInfo, PageReader, PagerItem};
use crate::error::{ScrapeError, ScrapeResult};

#[derive(Debug, Clone)]
pub enum FakeTable {
    Rows(Vec<Vec<String>>),
    NeverRenders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Click(u32),
    Read(u32),
    Next,
}

#[derive(Default)]
struct State {
    tables: Vec<FakeTable>,
    /// Page the pager reports as active.
    current: usize,
    /// Page whose rows the table shows.
    shown: usize,
    /// Rows switch to this page once the instant passes.
    pending: Option<(usize, Instant)>,
    render_delay: Duration,
    failing_next: bool,
    missing_controls: HashSet<u32>,
    flaky_controls: HashMap<u32, u32>,
    custom_pager: Option<Vec<PagerItem>>,
    pager_error: bool,
    next_buttons: bool,
    events: Vec<Event>,
}

pub struct FakePage {
    state: Mutex<State>,
}

/// `n` rows for page `page`, named `p{page}-r{i}`.
pub fn rows(page: u32, n: usize) -> FakeTable {
    FakeTable::Rows(
        (0..n)
            .map(|i| {
                vec![
                    format!("p{}-r{}", page, i),
                    format!("id-{}-{}", page, i),
                    "Active".to_string(),
                    "01/15/2024 10:00:00".to_string(),
                ]
            })
            .collect(),
    )
}

impl FakePage {
    pub fn new(tables: Vec<FakeTable>) -> Self {
        FakePage {
            state: Mutex::new(State {
                tables,
                ..Default::default()
            }),
        }
    }

    /// A listing of `pages` pages with `per_page` rows each.
    pub fn uniform(pages: u32, per_page: usize) -> Self {
        Self::new((1..=pages).map(|p| rows(p, per_page)).collect())
    }

    /// The "Page N" control for `page` is absent.
    pub fn missing_control(self, page: u32) -> Self {
        self.state.lock().unwrap().missing_controls.insert(page);
        self
    }

    /// The "Page N" control for `page` is absent for the first `times`
    /// `pager_items()` lookups (discovery counts as one).
    pub fn flaky_control(self, page: u32, times: u32) -> Self {
        self.state.lock().unwrap().flaky_controls.insert(page, times);
        self
    }

    /// Replace the generated pager with fixed controls.
    pub fn with_pager(self, items: Vec<PagerItem>) -> Self {
        self.state.lock().unwrap().custom_pager = Some(items);
        self
    }

    pub fn broken_pager(self) -> Self {
        self.state.lock().unwrap().pager_error = true;
        self
    }

    /// Render a "Prev" and an icon-only "Next" button.
    pub fn with_next_buttons(self) -> Self {
        self.state.lock().unwrap().next_buttons = true;
        self
    }

    /// After a navigation the pager updates at once but the rows only
    /// follow `delay` later.
    pub fn render_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().render_delay = delay;
        self
    }

    /// Clicking the next button errors.
    pub fn failing_next(self) -> Self {
        self.state.lock().unwrap().failing_next = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn reads(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Read(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn clicks(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Click(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

/// Build the pager. Only a `pager_items()` lookup (`consume`) uses up a
/// flaky control's absences.
fn generated_pager(state: &mut State, consume: bool) -> Vec<PagerItem> {
    let mut items = Vec::new();
    for n in 1..=state.tables.len() as u32 {
        if state.missing_controls.contains(&n) {
            continue;
        }
        if let Some(left) = state.flaky_controls.get_mut(&n) {
            if *left > 0 {
                if consume {
                    *left -= 1;
                }
                continue;
            }
        }
        items.push(PagerItem {
            text: n.to_string(),
            aria_label: Some(format!("Page {}", n)),
            active: n as usize == state.current + 1,
        });
    }
    items
}

fn navigate_to(state: &mut State, page: usize) {
    state.current = page;
    if state.render_delay.is_zero() {
        state.shown = page;
        state.pending = None;
    } else {
        state.pending = Some((page, Instant::now() + state.render_delay));
    }
}

/// Index of the page whose rows are rendered right now.
fn shown(state: &mut State) -> usize {
    if let Some((page, at)) = state.pending {
        if Instant::now() >= at {
            state.shown = page;
            state.pending = None;
        }
    }
    state.shown
}

fn current_buttons(state: &State) -> Vec<ButtonInfo> {
    if !state.next_buttons {
        return Vec::new();
    }
    vec![
        ButtonInfo {
            text: "Prev".into(),
            disabled: state.current == 0,
            ..Default::default()
        },
        ButtonInfo {
            text: String::new(),
            aria_label: None,
            next_icon: true,
            disabled: state.current + 1 >= state.tables.len(),
        },
    ]
}

#[async_trait]
impl PageReader for FakePage {
    async fn exists(&self, selector: &str) -> ScrapeResult<bool> {
        let mut state = self.state.lock().unwrap();
        let index = shown(&mut state);
        let rendered = matches!(state.tables.get(index), Some(FakeTable::Rows(_)));
        Ok(rendered && selector.starts_with("table"))
    }

    async fn cell_rows(&self, _rows: &str, _cells: &str) -> ScrapeResult<Vec<Vec<String>>> {
        let mut state = self.state.lock().unwrap();
        let index = shown(&mut state);
        state.events.push(Event::Read(index as u32 + 1));
        match state.tables.get(index) {
            Some(FakeTable::Rows(rows)) => Ok(rows.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn first_row(&self, _rows: &str, _cells: &str) -> ScrapeResult<Option<Vec<String>>> {
        let mut state = self.state.lock().unwrap();
        let index = shown(&mut state);
        match state.tables.get(index) {
            Some(FakeTable::Rows(rows)) => Ok(rows.first().cloned()),
            _ => Ok(None),
        }
    }

    async fn pager_items(&self) -> ScrapeResult<Vec<PagerItem>> {
        let mut state = self.state.lock().unwrap();
        if state.pager_error {
            return Err(ScrapeError::Browser("pager detached".into()));
        }
        match &state.custom_pager {
            Some(items) => Ok(items.clone()),
            None => Ok(generated_pager(&mut state, true)),
        }
    }

    async fn click_pager_item(&self, index: usize) -> ScrapeResult<()> {
        let mut state = self.state.lock().unwrap();
        let items = match &state.custom_pager {
            Some(items) => items.clone(),
            None => generated_pager(&mut state, false),
        };
        let target = items
            .get(index)
            .and_then(|i| i.aria_label.as_deref())
            .and_then(|l| l.strip_prefix("Page "))
            .and_then(|n| n.parse::<u32>().ok())
            .ok_or_else(|| ScrapeError::Browser(format!("no pager item {}", index)))?;
        state.events.push(Event::Click(target));
        navigate_to(&mut state, target as usize - 1);
        Ok(())
    }

    async fn buttons(&self) -> ScrapeResult<Vec<ButtonInfo>> {
        Ok(current_buttons(&self.state.lock().unwrap()))
    }

    async fn click_button(&self, index: usize) -> ScrapeResult<()> {
        let mut state = self.state.lock().unwrap();
        let buttons = current_buttons(&state);
        match buttons.get(index) {
            Some(b) if b.next_icon && state.failing_next => {
                Err(ScrapeError::Browser("next button detached".into()))
            }
            Some(b) if b.next_icon && !b.disabled => {
                state.events.push(Event::Next);
                let next = state.current + 1;
                navigate_to(&mut state, next);
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(ScrapeError::Browser(format!("no button {}", index))),
        }
    }
}
