//! Release-name parsing: extract a title and year from torrent file names.

/// Title and optional year parsed from a release file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub title: String,
    pub year: Option<u32>,
}

const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "mpg", "mpeg", "3gp", "rmvb", "ts",
    "m2ts",
];

/// Parse names like `Some.Movie.2019.1080p.BluRay.mkv` or
/// `Some Movie (2019).mp4` into a searchable title and year.
pub fn parse_release_name(filename: &str) -> ParsedName {
    let mut name = filename.trim().to_string();

    // Drop a trailing media extension.
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if MEDIA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) && !stem.is_empty() {
            name = stem.to_string();
        }
    }

    // `(YYYY)` form.
    if let Some(open) = name.rfind('(') {
        let rest = &name[open + 1..];
        if let Some(close) = rest.find(')') {
            if let Some(year) = parse_year(&rest[..close]) {
                let title = clean_title(&name[..open]);
                if !title.is_empty() {
                    return ParsedName {
                        title,
                        year: Some(year),
                    };
                }
            }
        }
    }

    // Dotted/spaced release form: the year token splits title from the
    // quality tags that follow it. Scan from the right so a title that is
    // itself a year ("2012") survives.
    let tokens: Vec<&str> = name.split(['.', ' ', '_']).filter(|t| !t.is_empty()).collect();
    for i in (1..tokens.len()).rev() {
        if let Some(year) = parse_year(tokens[i]) {
            return ParsedName {
                title: clean_title(&tokens[..i].join(" ")),
                year: Some(year),
            };
        }
    }

    ParsedName {
        title: clean_title(&tokens.join(" ")),
        year: None,
    }
}

fn parse_year(token: &str) -> Option<u32> {
    if token.len() != 4 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: u32 = token.parse().ok()?;
    (1900..=2099).contains(&year).then_some(year)
}

fn clean_title(raw: &str) -> String {
    raw.split(['.', ' ', '_'])
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dotted_release_name() {
        let parsed = parse_release_name("The.Matrix.1999.1080p.BluRay.x264.mkv");
        assert_eq!(parsed.title, "The Matrix");
        assert_eq!(parsed.year, Some(1999));
    }

    #[test]
    fn test_parenthesized_year() {
        let parsed = parse_release_name("The Matrix (1999).mp4");
        assert_eq!(parsed.title, "The Matrix");
        assert_eq!(parsed.year, Some(1999));
    }

    #[test]
    fn test_no_year() {
        let parsed = parse_release_name("Some Home Video.mkv");
        assert_eq!(parsed.title, "Some Home Video");
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn test_extension_only_stripped_for_media() {
        let parsed = parse_release_name("archive.zip");
        assert_eq!(parsed.title, "archive zip");
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn test_year_not_taken_from_first_token() {
        // A title that *is* a year (e.g. "2012") keeps its name.
        let parsed = parse_release_name("2012.2009.720p.mkv");
        assert_eq!(parsed.title, "2012");
        assert_eq!(parsed.year, Some(2009));
    }

    #[test]
    fn test_underscores_and_spaces() {
        let parsed = parse_release_name("Blade_Runner_2049_2017_2160p.mkv");
        assert_eq!(parsed.title, "Blade Runner 2049");
        assert_eq!(parsed.year, Some(2017));
    }

    #[test]
    fn test_bogus_year_ignored() {
        let parsed = parse_release_name("Movie.1234p.mkv");
        assert_eq!(parsed.year, None);
    }
}
