use chrono::NaiveDateTime;

pub fn truncate_string(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let total: usize = s
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .sum();
    if total <= max_width {
        return s.to_string();
    }

    // 预留 "..." 的宽度
    let budget = max_width.saturating_sub(3);
    let mut width = 0;
    let mut result = String::new();
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        result.push(c);
    }
    if max_width >= 3 {
        result.push_str("...");
    }
    result
}

pub fn format_created(created: &NaiveDateTime) -> String {
    created.format("%Y-%m-%d %H:%M").to_string()
}
