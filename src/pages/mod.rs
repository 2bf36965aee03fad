pub mod comments;
pub mod details;
pub mod listing;
pub mod person;

/// Primary mirror the scraped markup links against.
pub const MIRROR_URL: &str = "https://rezka.ag";
pub const MIRROR_HOST: &str = "rezka.ag";
/// Host substituted for the primary mirror inside comment links.
pub const REDIRECT_HOST: &str = "hdrezka.me";

/// Turns a card's `data-url` (or an `<a href>`) into the path-like movie id:
/// mirror prefix, the optional `collections/` segment, surrounding slashes
/// and the `.html` suffix are all stripped.
pub fn extract_id(url: &str) -> String {
    let mut id = url.trim();

    if let Some(rest) = id.strip_prefix(MIRROR_URL) {
        id = rest;
    }
    id = id.trim_matches('/');
    if let Some(rest) = id.strip_prefix("collections/") {
        id = rest;
    }

    id.strip_suffix(".html").unwrap_or(id).to_owned()
}

/// A detail-page id must be `type/genre/slug`. Malformed ids are a caller
/// error; the detail parser itself never sees them.
pub fn is_valid_movie_id(id: &str) -> bool {
    let segments: Vec<&str> = id.split('/').collect();
    segments.len() == 3 && segments.iter().all(|s| !s.is_empty())
}

pub fn movie_url(id: &str) -> String {
    format!("{MIRROR_URL}/{id}.html")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_extract_id_from_mirror_url() {
        assert_eq!(
            extract_id("https://rezka.ag/films/drama/101-title-2020.html"),
            "films/drama/101-title-2020"
        );
        assert_eq!(
            extract_id("/series/thriller/42-show-2021/"),
            "series/thriller/42-show-2021"
        );
        assert_eq!(
            extract_id("https://rezka.ag/collections/films/drama/7-x.html"),
            "films/drama/7-x"
        );
    }

    #[test]
    fn should_validate_three_segment_ids() {
        assert!(is_valid_movie_id("films/drama/101-title-2020"));
        assert!(!is_valid_movie_id("films/101-title-2020"));
        assert!(!is_valid_movie_id("films//101"));
        assert!(!is_valid_movie_id(""));
    }
}
