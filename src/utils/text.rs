use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn truncate_text_unicode(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    const ELLIPSIS: &str = "...";
    let ellipsis_width = ELLIPSIS.width();

    if max_width <= ellipsis_width {
        return ELLIPSIS[..max_width].to_string();
    }

    let target_width = max_width - ellipsis_width;
    let mut result = String::new();
    let mut current_width = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if current_width + ch_width > target_width {
            break;
        }
        result.push(ch);
        current_width += ch_width;
    }

    result.push_str(ELLIPSIS);
    result
}

pub fn pad_to_width(text: &str, width: usize) -> String {
    let text_width = text.width();
    if text_width >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - text_width))
    }
}

/// Prefix every line of `text` with `indent`
pub fn indent_lines(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Widest display width among `items`, capped at `max`
pub fn max_display_width<'a>(items: impl IntoIterator<Item = &'a str>, max: usize) -> usize {
    items
        .into_iter()
        .map(|item| item.width())
        .max()
        .unwrap_or(0)
        .min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_unicode() {
        assert_eq!(truncate_text_unicode("Hello", 10), "Hello");
        assert_eq!(truncate_text_unicode("Hello World!", 8), "Hello...");
        assert_eq!(truncate_text_unicode("", 5), "");
        assert_eq!(truncate_text_unicode("東京都渋谷区", 7), "東京...");
    }

    #[test]
    fn test_pad_to_width() {
        assert_eq!(pad_to_width("Hello", 10), "Hello     ");
        assert_eq!(pad_to_width("Hello World", 5), "Hello World");
        assert_eq!(pad_to_width("東京", 6), "東京  ");
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(
            indent_lines("SELECT *\nFROM customers", "    "),
            "    SELECT *\n    FROM customers"
        );
        assert_eq!(indent_lines("", "  "), "");
    }

    #[test]
    fn test_max_display_width() {
        assert_eq!(max_display_width(["a", "abcd", "ab"], 10), 4);
        assert_eq!(max_display_width(["a very long label"], 5), 5);
        assert_eq!(max_display_width(Vec::<&str>::new(), 5), 0);
    }
}
