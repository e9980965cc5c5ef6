//! Tabbed presentation of the latest query result.
//!
//! The presenter tracks which result it last showed by pointer identity, so
//! a new result (even one equal in content) moves the view back to the
//! table while a re-sync of the same result keeps the user's tab.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::api::models::QueryResult;
use crate::display::chart::ChartView;
use crate::display::summary::SummaryView;
use crate::display::table::TableView;
use crate::error::{AppError, CliError};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultTab {
    #[default]
    Table,
    Charts,
    Summary,
}

impl ResultTab {
    pub const ALL: [ResultTab; 3] = [ResultTab::Table, ResultTab::Charts, ResultTab::Summary];

    pub fn label(&self) -> &'static str {
        match self {
            ResultTab::Table => "Table",
            ResultTab::Charts => "Charts",
            ResultTab::Summary => "Summary",
        }
    }

    /// Following tab, wrapping around
    pub fn next(&self) -> ResultTab {
        match self {
            ResultTab::Table => ResultTab::Charts,
            ResultTab::Charts => ResultTab::Summary,
            ResultTab::Summary => ResultTab::Table,
        }
    }
}

impl fmt::Display for ResultTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResultTab {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" | "t" => Ok(ResultTab::Table),
            "charts" | "chart" | "c" => Ok(ResultTab::Charts),
            "summary" | "s" => Ok(ResultTab::Summary),
            other => Err(CliError::InvalidArguments(format!(
                "unknown tab '{}' (expected table, charts or summary)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterEvent {
    ResultChanged,
    TabChanged(ResultTab),
}

pub struct ResultPresenter {
    active_tab: ResultTab,
    current: Option<Arc<QueryResult>>,
    table: TableView,
    charts: ChartView,
    summary: SummaryView,
    events: broadcast::Sender<PresenterEvent>,
}

impl ResultPresenter {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            active_tab: ResultTab::Table,
            current: None,
            table: TableView::new(),
            charts: ChartView::new(),
            summary: SummaryView::new(),
            events,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.table = self.table.with_colors(use_colors);
        self.charts = self.charts.with_colors(use_colors);
        self.summary = self.summary.with_colors(use_colors);
        self
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.table = self.table.with_max_width(width);
        self
    }

    pub fn active_tab(&self) -> ResultTab {
        self.active_tab
    }

    pub fn current(&self) -> Option<&Arc<QueryResult>> {
        self.current.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PresenterEvent> {
        self.events.subscribe()
    }

    /// Track the session's latest result. Returns whether it changed.
    pub fn sync(&mut self, result: Option<&Arc<QueryResult>>) -> bool {
        let changed = match (&self.current, result) {
            (Some(seen), Some(incoming)) => !Arc::ptr_eq(seen, incoming),
            (None, None) => false,
            _ => true,
        };
        if !changed {
            return false;
        }

        self.current = result.cloned();
        if self.active_tab != ResultTab::Table {
            log::debug!("New result, returning to the table tab");
        }
        self.active_tab = ResultTab::Table;
        self.notify(PresenterEvent::ResultChanged);
        true
    }

    pub fn select(&mut self, tab: ResultTab) {
        if self.active_tab != tab {
            self.active_tab = tab;
            self.notify(PresenterEvent::TabChanged(tab));
        }
    }

    /// Header, tab strip and the active tab's body; `None` without a result
    pub fn render(&self) -> Result<Option<String>, AppError> {
        let Some(result) = self.current.as_deref() else {
            return Ok(None);
        };

        let mut output = String::from("Query Results");
        let row_count = result
            .table()
            .map(|table| table.row_count)
            .or_else(|| result.summary().map(|summary| summary.row_count));
        if let Some(count) = row_count.filter(|count| *count > 0) {
            let noun = if count == 1 { "row" } else { "rows" };
            output.push_str(&format!(" ({} {})", count, noun));
        }
        output.push('\n');
        output.push_str(&self.tab_strip());
        output.push_str("\n\n");

        let body = match self.active_tab {
            ResultTab::Table => self.table.render(result.table())?,
            ResultTab::Charts => self.charts.render(result.charts()),
            ResultTab::Summary => self.summary.render(result.summary())?,
        };
        output.push_str(&body);

        Ok(Some(output))
    }

    fn tab_strip(&self) -> String {
        ResultTab::ALL
            .iter()
            .map(|tab| {
                if *tab == self.active_tab {
                    format!("[{}]", tab.label())
                } else {
                    format!(" {} ", tab.label())
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn notify(&self, event: PresenterEvent) {
        let _ = self.events.send(event);
    }
}

impl Default for ResultPresenter {
    fn default() -> Self {
        Self::new()
    }
}
