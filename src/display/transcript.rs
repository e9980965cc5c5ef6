use crate::core::transcript::{Message, Role, Transcript};
use crate::utils::text::indent_lines;
use crossterm::style::Stylize;

pub const EXAMPLE_QUESTIONS: [&str; 4] = [
    "Show me all customers",
    "How many orders are there?",
    "What are the top 10 products by sales?",
    "Show me users where status is active",
];

pub const PENDING_LINE: &str = "Assistant: ⏳ Thinking...";

/// Chat history renderer
pub struct TranscriptView {
    use_colors: bool,
    show_timestamps: bool,
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            show_timestamps: false,
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_timestamps(mut self, show_timestamps: bool) -> Self {
        self.show_timestamps = show_timestamps;
        self
    }

    /// Whole transcript, a trailing pending line while a query is in flight,
    /// or the getting-started hint for an idle empty chat
    pub fn render(&self, transcript: &Transcript, pending: bool) -> String {
        if transcript.is_empty() && !pending {
            return Self::empty_hint();
        }

        let mut blocks: Vec<String> = transcript.iter().map(|m| self.render_message(m)).collect();
        if pending {
            blocks.push(PENDING_LINE.to_string());
        }
        blocks.join("\n\n")
    }

    pub fn render_message(&self, message: &Message) -> String {
        let mut header = String::new();
        if self.show_timestamps {
            header.push_str(&format!("[{}] ", message.timestamp.format("%H:%M:%S")));
        }
        let label = match (message.role, message.is_error) {
            (Role::Assistant, true) => format!("❌ {}", message.role.label()),
            (role, _) => role.label().to_string(),
        };
        if self.use_colors {
            let styled = match message.role {
                Role::User => label.cyan().bold(),
                Role::Assistant if message.is_error => label.red().bold(),
                Role::Assistant => label.green().bold(),
            };
            header.push_str(&format!("{}:", styled));
        } else {
            header.push_str(&format!("{}:", label));
        }

        let mut block = format!("{} {}", header, message.content);

        // An empty statement is not worth a SQL section
        if let Some(sql) = message.sql_query.as_deref().filter(|sql| !sql.trim().is_empty()) {
            let sql = indent_lines(sql, "    ");
            if self.use_colors {
                block.push_str(&format!("\n  {}\n{}", "SQL:".dark_grey(), sql.dark_grey()));
            } else {
                block.push_str(&format!("\n  SQL:\n{}", sql));
            }
        }

        block
    }

    pub fn empty_hint() -> String {
        let mut hint = String::from("💬 Start a conversation\n");
        hint.push_str("Ask questions about your database in plain English.\n\n");
        hint.push_str("Example questions:\n");
        for question in EXAMPLE_QUESTIONS {
            hint.push_str(&format!("  • \"{}\"\n", question));
        }
        hint
    }
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> TranscriptView {
        TranscriptView::new().with_colors(false)
    }

    #[test]
    fn test_empty_idle_transcript_shows_hint() {
        let output = view().render(&Transcript::new(), false);
        assert!(output.contains("Start a conversation"));
        for question in EXAMPLE_QUESTIONS {
            assert!(output.contains(question));
        }
    }

    #[test]
    fn test_empty_pending_transcript_shows_indicator() {
        let output = view().render(&Transcript::new(), true);
        assert_eq!(output, PENDING_LINE);
    }

    #[test]
    fn test_turns_in_order_with_sql() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("How many orders are there?"));
        transcript.push(Message::assistant(
            "There are 42 orders.",
            Some("SELECT COUNT(*) FROM orders".to_string()),
        ));

        let output = view().render(&transcript, false);
        let user_at = output.find("You: How many orders").unwrap();
        let reply_at = output.find("Assistant: There are 42 orders.").unwrap();
        assert!(user_at < reply_at);
        assert!(output.contains("  SQL:\n    SELECT COUNT(*) FROM orders"));
        assert!(!output.contains("Thinking"));
    }

    #[test]
    fn test_error_turn_is_marked() {
        let message = Message::assistant_error("Error: connection refused");
        let output = view().render_message(&message);
        assert_eq!(output, "❌ Assistant: Error: connection refused");
    }

    #[test]
    fn test_blank_sql_is_hidden() {
        let message = Message::assistant("No query needed", Some("  ".to_string()));
        assert!(!view().render_message(&message).contains("SQL:"));
    }

    #[test]
    fn test_timestamps() {
        let message = Message::user("hi");
        let output = view().with_timestamps(true).render_message(&message);
        let expected = format!("[{}] You: hi", message.timestamp.format("%H:%M:%S"));
        assert_eq!(output, expected);
    }
}
