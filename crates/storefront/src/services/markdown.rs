//! Markdown rendering for article bodies.
//!
//! Articles are written in the admin panel. Raw HTML in them is escaped,
//! so a compromised admin account cannot inject scripts into the blog.

use comrak::{Options, markdown_to_html};

/// Average reading speed used for the "N мин чтения" label.
const WORDS_PER_MINUTE: usize = 200;

/// Render markdown to HTML with GitHub Flavored Markdown extensions.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());

    options.render.r#unsafe = false;

    markdown_to_html(content, &options)
}

/// Estimated reading time in whole minutes, never less than one.
#[must_use]
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Plain-text teaser: markdown markers stripped, cut at a word boundary.
#[must_use]
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let plain: String = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("![") && !line.starts_with("```"))
        .map(|line| line.trim_start_matches(['#', '>', '-', '*', ' ']))
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !matches!(c, '*' | '_' | '`'))
        .collect();

    if plain.chars().count() <= max_chars {
        return plain;
    }

    let cut: String = plain.chars().take(max_chars).collect();
    let trimmed = cut
        .rfind(' ')
        .and_then(|idx| cut.get(..idx))
        .unwrap_or(cut.as_str())
        .trim_end_matches([',', '.', ';', ':']);
    format!("{trimmed}…")
}
