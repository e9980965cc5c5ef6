//! Terminal rendering: the tabbed result views, the chat transcript and
//! progress feedback.

pub mod chart;
pub mod presenter;
pub mod progress;
pub mod summary;
pub mod table;
pub mod transcript;

pub use chart::ChartView;
pub use presenter::{PresenterEvent, ResultPresenter, ResultTab};
pub use progress::{OperationStatus, ProgressSpinner, display_status};
pub use summary::SummaryView;
pub use table::TableView;
pub use transcript::TranscriptView;

/// Colors only make sense on a terminal
pub fn colors_supported() -> bool {
    atty::is(atty::Stream::Stdout)
}
