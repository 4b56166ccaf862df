use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cut `text` to at most `max_width` terminal columns, ending with "...".
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

/// Collapse line breaks so a value fits on one table row.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip the HTML entities the paginator puts in link labels.
pub fn clean_link_label(label: &str) -> String {
    label
        .replace("&laquo;", "«")
        .replace("&raquo;", "»")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
