use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cut `s` to at most `max_width` display columns, ending in an ellipsis when cut.
pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

/// Left-align `s` in a field exactly `width` columns wide.
pub fn fit_column(s: &str, width: usize) -> String {
    let mut cell = truncate_unicode(s, width);
    let used = cell.width();
    cell.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    cell
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_unicode("bash", 20), "bash");
    }

    #[test]
    fn long_text_gets_ellipsis_within_width() {
        let out = truncate_unicode("a-very-long-process-name-indeed", 20);
        assert_eq!(out.width(), 20);
        assert!(out.ends_with('\u{2026}'));
    }

    #[test]
    fn wide_chars_are_measured_by_columns() {
        let out = fit_column("進程監視器進程監視器進程", 20);
        assert_eq!(out.width(), 20);
    }

    #[test]
    fn fit_column_pads() {
        assert_eq!(fit_column("sh", 5), "sh   ");
        assert_eq!(fit_column("", 3), "   ");
    }
}
