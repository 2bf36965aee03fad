//! Thin transport layer over the parsers. Every function here fetches one
//! resource and hands the raw body to a pure parser; no parsing logic lives
//! in this module.

use anyhow::{anyhow, Context};
use url::Url;

use crate::models::*;
use crate::pages::{self, comments, details, listing, person};
use crate::utils::{create_ajax_client, create_client};
use crate::video::{self, hls};
use crate::vtt;

pub async fn search(query: &str, page: u16) -> anyhow::Result<Vec<MovieSimple>> {
    let page = page.to_string();
    let body = create_client()
        .get(format!("{}/search/", pages::MIRROR_URL))
        .query(&[
            ("do", "search"),
            ("subaction", "search"),
            ("q", query),
            ("page", page.as_str()),
        ])
        .send()
        .await?
        .text()
        .await?;

    Ok(listing::parse_search(&body)?)
}

/// Category listings (`films/`, `series/best/` and so on) paginate with a
/// path segment, not a query parameter.
pub async fn load_category(path: &str, page: u16) -> anyhow::Result<Vec<MovieSimple>> {
    let path = path.trim_matches('/');
    let url = if page <= 1 {
        format!("{}/{path}/", pages::MIRROR_URL)
    } else {
        format!("{}/{path}/page/{page}/", pages::MIRROR_URL)
    };

    let body = create_client().get(url).send().await?.text().await?;
    Ok(listing::parse_movie_list(&body)?)
}

pub async fn load_collections(page: u16) -> anyhow::Result<Vec<MovieCollection>> {
    load_collections_at("collections", page).await
}

pub async fn load_collections_at(
    path: &str,
    page: u16,
) -> anyhow::Result<Vec<MovieCollection>> {
    let path = path.trim_matches('/');
    let url = if page <= 1 {
        format!("{}/{path}/", pages::MIRROR_URL)
    } else {
        format!("{}/{path}/page/{page}/", pages::MIRROR_URL)
    };

    let body = create_client().get(url).send().await?.text().await?;
    Ok(listing::parse_collections(&body)?)
}

pub async fn load_bookmarks(catalog: u32, page: u16) -> anyhow::Result<Vec<MovieSimple>> {
    let url = if page <= 1 {
        format!("{}/favorites/{catalog}/", pages::MIRROR_URL)
    } else {
        format!("{}/favorites/{catalog}/page/{page}/", pages::MIRROR_URL)
    };

    let body = create_client().get(url).send().await?.text().await?;
    Ok(listing::parse_bookmarks(&body)?)
}

pub async fn get_movie_details(id: &str) -> anyhow::Result<MovieDetailed> {
    if !pages::is_valid_movie_id(id) {
        return Err(anyhow!("malformed movie id: {id}"));
    }

    let body = create_client()
        .get(pages::movie_url(id))
        .send()
        .await?
        .text()
        .await?;

    Ok(details::parse_details(&body, id)?)
}

pub async fn get_person(id: &str) -> anyhow::Result<PersonDetailed> {
    let body = create_client()
        .get(format!("{}/{id}/", pages::MIRROR_URL))
        .send()
        .await?
        .text()
        .await?;

    Ok(person::parse_person(&body, id)?)
}

/// Comment pages arrive as a JSON envelope whose `comments` field holds the
/// rendered tree markup.
pub async fn load_comments(news_id: u32, page: u16) -> anyhow::Result<Vec<Comment>> {
    let news_id = news_id.to_string();
    let page = page.to_string();
    let body: serde_json::Value = create_ajax_client()
        .get(format!("{}/ajax/get_comments/", pages::MIRROR_URL))
        .query(&[
            ("t", "1"),
            ("news_id", news_id.as_str()),
            ("cstart", page.as_str()),
            ("type", "0"),
            ("comment_id", "0"),
            ("skin", "hdrezka"),
        ])
        .send()
        .await?
        .json()
        .await?;

    let markup = body
        .get("comments")
        .and_then(serde_json::Value::as_str)
        .context("comments field missing in ajax envelope")?;

    Ok(comments::parse_comments(markup)?)
}

/// The numeric id the ajax endpoints key on is the leading digit run of the
/// detail id's slug segment.
pub fn news_id(movie_id: &str) -> anyhow::Result<u32> {
    movie_id
        .rsplit('/')
        .next()
        .and_then(|slug| {
            let digits: String = slug.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .ok_or_else(|| anyhow!("movie id carries no numeric slug prefix: {movie_id}"))
}

pub async fn load_movie_stream(
    news_id: u32,
    translator_id: &str,
) -> anyhow::Result<MovieVideo> {
    load_stream(&[
        ("id", news_id.to_string()),
        ("translator_id", translator_id.to_owned()),
        ("action", "get_movie".to_owned()),
    ])
    .await
}

pub async fn load_episode_stream(
    news_id: u32,
    translator_id: &str,
    season: &str,
    episode: &str,
) -> anyhow::Result<MovieVideo> {
    load_stream(&[
        ("id", news_id.to_string()),
        ("translator_id", translator_id.to_owned()),
        ("season", season.to_owned()),
        ("episode", episode.to_owned()),
        ("action", "get_stream".to_owned()),
    ])
    .await
}

/// Re-fetches the season/episode lists for one translator. The endpoint
/// answers with a JSON envelope whose `seasons` and `episodes` fields hold
/// HTML fragments in the detail-page markup.
pub async fn load_translator_episodes(
    news_id: u32,
    translator_id: &str,
) -> anyhow::Result<Vec<MovieSeason>> {
    let body: serde_json::Value = create_ajax_client()
        .post(format!("{}/ajax/get_cdn_series/", pages::MIRROR_URL))
        .form(&[
            ("id", news_id.to_string()),
            ("translator_id", translator_id.to_owned()),
            ("action", "get_episodes".to_owned()),
        ])
        .send()
        .await?
        .json()
        .await?;

    seasons_from_envelope(&body)
}

fn seasons_from_envelope(body: &serde_json::Value) -> anyhow::Result<Vec<MovieSeason>> {
    let seasons = body
        .get("seasons")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    let episodes = body
        .get("episodes")
        .and_then(serde_json::Value::as_str)
        .context("episodes field missing in ajax envelope")?;

    Ok(details::parse_season_fragments(seasons, episodes))
}

async fn load_stream(form: &[(&str, String)]) -> anyhow::Result<MovieVideo> {
    let body = create_ajax_client()
        .post(format!("{}/ajax/get_cdn_series/", pages::MIRROR_URL))
        .form(form)
        .send()
        .await?
        .text()
        .await?;

    Ok(video::parse_video_manifest(&body)?)
}

pub async fn load_trailer_id(news_id: u32) -> anyhow::Result<String> {
    let body = create_ajax_client()
        .post(format!(
            "{}/engine/ajax/gettrailervideo.php",
            pages::MIRROR_URL
        ))
        .form(&[("id", news_id.to_string())])
        .send()
        .await?
        .text()
        .await?;

    Ok(video::parse_trailer_id(&body)?)
}

/// Fetches the thumbnail sidecar named by `MovieVideo::thumbnails` and
/// parses it into cues. Relative sprite URLs resolve against the sidecar's
/// own location.
pub async fn load_thumbnails(path: &str) -> anyhow::Result<WebVtt> {
    let url = Url::parse(pages::MIRROR_URL)?.join(path)?;
    let body = create_client().get(url.clone()).send().await?.text().await?;

    Ok(vtt::parse(&body, &url)?)
}

/// Fetches the real variant playlist behind the virtual fragments resource
/// and rewrites its segment URIs to absolute form. Returns the playlist text
/// together with the summed segment duration for the subtitle playlist.
pub async fn load_variant_playlist(manifest_url: &Url) -> anyhow::Result<(String, f64)> {
    let body = create_client()
        .get(manifest_url.clone())
        .send()
        .await?
        .text()
        .await?;

    Ok(hls::rewrite_variant_playlist(&body, manifest_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translator_envelope_routes_fragments_through_season_parser() {
        let body = serde_json::json!({
            "success": true,
            "seasons": "<li class=\"b-simple_season__item active\" data-tab_id=\"1\">1 сезон</li>",
            "episodes": "<li class=\"b-simple_episode__item\" data-season_id=\"1\" data-episode_id=\"1\">1 серия</li><li class=\"b-simple_episode__item\" data-season_id=\"1\" data-episode_id=\"2\">2 серия</li>",
        });

        let seasons = seasons_from_envelope(&body).unwrap();

        assert_eq!(seasons.len(), 1);
        assert!(seasons[0].selected);
        assert_eq!(seasons[0].episodes.len(), 2);
        assert_eq!(seasons[0].episodes[1].id, "2");
    }

    #[test]
    fn translator_envelope_without_episodes_is_an_error() {
        let body = serde_json::json!({ "success": false, "message": "oops" });
        assert!(seasons_from_envelope(&body).is_err());
    }

    #[test]
    fn news_id_comes_from_slug_prefix() {
        assert_eq!(news_id("series/thriller/42-dark-2017").unwrap(), 42);
        assert_eq!(news_id("films/drama/101-title-2020").unwrap(), 101);
        assert!(news_id("films/drama/title").is_err());
    }

    #[test_log::test(tokio::test)]
    #[ignore = "network"]
    async fn load_films_category() {
        let movies = load_category("films", 1).await.unwrap();
        println!("{movies:#?}");
        assert!(!movies.is_empty());
    }

    #[test_log::test(tokio::test)]
    #[ignore = "network"]
    async fn search_smoke() {
        let movies = search("матрица", 1).await.unwrap();
        println!("{movies:#?}");
        assert!(!movies.is_empty());
    }
}
