//! Page names derived from URL paths

const HOME_PAGE: &str = "Home Page";

/// Format a URL path as a display name.
///
/// `/` becomes `Home Page`; `/test-path/menu` becomes `Test Path / Menu`.
/// Dynamic `:id` segments are kept as authored.
pub fn format_path(path: &str) -> String {
    if path == "/" {
        return HOME_PAGE.to_string();
    }

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(format_segment)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

fn format_segment(segment: &str) -> String {
    segment
        .split('-')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
