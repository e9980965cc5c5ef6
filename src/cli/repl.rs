//! Interactive chat loop.
//!
//! Reads stdin lines and the session's settlements concurrently, so the
//! prompt stays responsive while a query runs. A question typed while one
//! is in flight is refused by the session and reported as busy.

use std::io::{self, Write};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::cli::command_handlers::render_connection_list;
use crate::core::catalog::ConnectionCatalog;
use crate::core::session::{ConversationSession, RejectReason, SessionEvent, SubmitOutcome};
use crate::display::{ProgressSpinner, ResultPresenter, ResultTab, TranscriptView};
use crate::error::AppError;

const PROMPT: &str = "askdb> ";

const HELP: &str = "\
Commands:
  /tab [table|charts|summary]  switch result view (no argument: next view)
  /use <connection-id>         query a different connection
  /connections                 list connections
  /history                     show the whole conversation
  /help                        show this help
  /quit                        leave
Anything else is sent as a question.";

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Repl {
    session: ConversationSession,
    catalog: ConnectionCatalog,
    presenter: ResultPresenter,
    transcript_view: TranscriptView,
    events: broadcast::Receiver<SessionEvent>,
    spinner: Option<ProgressSpinner>,
    spinner_enabled: bool,
    use_colors: bool,
    /// Transcript entries already on screen
    printed: usize,
}

impl Repl {
    pub fn new(
        session: ConversationSession,
        catalog: ConnectionCatalog,
        presenter: ResultPresenter,
        use_colors: bool,
        spinner_enabled: bool,
    ) -> Self {
        let events = session.subscribe();
        Self {
            session,
            catalog,
            presenter,
            transcript_view: TranscriptView::new().with_colors(use_colors),
            events,
            spinner: None,
            spinner_enabled,
            use_colors,
            printed: 0,
        }
    }

    pub async fn run(mut self) -> Result<(), AppError> {
        println!("{}", TranscriptView::empty_hint());
        match self.catalog.selected() {
            Some(connection) => println!(
                "Connected to '{}' ({}). Type /help for commands.",
                connection.name, connection.id
            ),
            None => println!("No connection selected. Use /connections and /use <id>."),
        }
        prompt()?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = crate::map_display_error!(line, "read input")?;
                    let Some(line) = line else {
                        break;
                    };
                    if self.handle_line(&line).await? == Flow::Quit {
                        break;
                    }
                    if !self.session.is_pending() {
                        prompt()?;
                    }
                }
                settled = self.session.settle_next(), if self.session.is_pending() => {
                    if settled {
                        self.stop_spinner();
                        self.drain_events()?;
                        prompt()?;
                    }
                }
            }
        }

        self.stop_spinner();
        println!();
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow, AppError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        if let Some(command) = line.strip_prefix('/') {
            return self.handle_command(command).await;
        }

        match self.session.submit_active(line) {
            SubmitOutcome::Dispatched => {
                // the user's own turn is already on screen
                self.printed = self.session.transcript().len();
                self.drain_events()?;
                self.start_spinner();
            }
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                println!("A query is already running; wait for its answer.");
            }
            SubmitOutcome::Rejected(RejectReason::NoConnection) => {
                println!("No connection selected. Use /connections and /use <id>.");
            }
            SubmitOutcome::Rejected(RejectReason::EmptyMessage) => {}
        }
        Ok(Flow::Continue)
    }

    async fn handle_command(&mut self, command: &str) -> Result<Flow, AppError> {
        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let argument = parts.next();

        match name {
            "quit" | "exit" | "q" => return Ok(Flow::Quit),
            "help" | "h" => println!("{}", HELP),
            "tab" => {
                let tab = match argument {
                    Some(arg) => match arg.parse::<ResultTab>() {
                        Ok(tab) => tab,
                        Err(e) => {
                            println!("{}", e);
                            return Ok(Flow::Continue);
                        }
                    },
                    None => self.presenter.active_tab().next(),
                };
                self.presenter.select(tab);
                self.show_result()?;
            }
            "use" => match argument {
                Some(id) => self.use_connection(id).await,
                None => println!("Usage: /use <connection-id>"),
            },
            "connections" => match self.catalog.refresh().await {
                Ok(connections) => println!(
                    "{}",
                    render_connection_list(
                        connections,
                        self.session.active_connection(),
                        self.use_colors
                    )
                ),
                Err(e) => println!("{} {}", e.severity().emoji(), e.display_friendly()),
            },
            "history" => println!(
                "{}",
                self.transcript_view
                    .render(self.session.transcript(), self.session.is_pending())
            ),
            other => println!("Unknown command '/{}'. Type /help for commands.", other),
        }
        Ok(Flow::Continue)
    }

    async fn use_connection(&mut self, id: &str) {
        if self.catalog.get(id).is_none() {
            if let Err(e) = self.catalog.refresh().await {
                println!("{} {}", e.severity().emoji(), e.display_friendly());
                return;
            }
        }
        match self.catalog.select(id) {
            Ok(connection) => {
                println!("Now querying '{}' ({})", connection.name, connection.id);
                self.session.set_active_connection(Some(id.to_string()));
            }
            Err(e) => println!("{}", e),
        }
    }

    /// React to session notifications since the last drain
    fn drain_events(&mut self) -> Result<(), AppError> {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::AssistantTurn { .. }) => self.print_new_turns(),
                Ok(SessionEvent::ResultReplaced) => {
                    self.presenter.sync(self.session.last_result());
                    self.show_result()?;
                }
                Ok(SessionEvent::UserTurn | SessionEvent::PendingChanged(_)) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    log::debug!("Missed {} session event(s)", skipped);
                    self.print_new_turns();
                }
                Err(_) => break,
            }
        }
        Ok(())
    }

    fn print_new_turns(&mut self) {
        let transcript = self.session.transcript();
        for message in transcript.iter().skip(self.printed) {
            println!("\n{}", self.transcript_view.render_message(message));
        }
        self.printed = transcript.len();
    }

    fn show_result(&self) -> Result<(), AppError> {
        match self.presenter.render()? {
            Some(view) => println!("\n{}", view),
            None => println!("No results yet. Ask a question first."),
        }
        Ok(())
    }

    fn start_spinner(&mut self) {
        let mut spinner = ProgressSpinner::new("Thinking...").with_enabled(self.spinner_enabled);
        spinner.start();
        self.spinner = Some(spinner);
    }

    fn stop_spinner(&mut self) {
        if let Some(mut spinner) = self.spinner.take() {
            spinner.stop(None);
        }
    }
}

fn prompt() -> Result<(), AppError> {
    print!("{}", PROMPT);
    crate::map_display_error!(io::stdout().flush(), "flush prompt")?;
    Ok(())
}
