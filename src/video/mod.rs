pub mod hls;

use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;
use url::Url;

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{MovieSubtitles, MovieVideo, SkippedLink};
use crate::utils::crypto;
use crate::utils::scanner::TextScanner;
use crate::utils::text::decode_entities;

const PARSER: &str = "video_manifest";

/// Shared secret the stream endpoint keys its payloads with.
const STREAM_SECRET: &str = "bMFYdyvZGGTJDvZq";

/// Substring of the "must sign in" message the endpoint answers with for
/// premium-gated requests.
const SIGN_IN_MESSAGE: &str = "авториз";

const HLS_SUFFIX: &str = ":hls:manifest.m3u8";
const CANDIDATE_SEPARATOR: &str = " or ";

/// Resolves the stream endpoint's response into a quality map plus subtitle
/// tracks. The response is strict JSON, or the same JSON wrapped into a JS
/// statement; both shapes occur in the wild, in that order of likelihood.
pub fn parse_video_manifest(body: &str) -> ScrapeResult<MovieVideo> {
    let value = parse_json_payload(body)?;

    let encoded = ["url", "streams"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty());

    let Some(encoded) = encoded else {
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            if message.to_lowercase().contains(SIGN_IN_MESSAGE) {
                return Err(ScrapeError::AuthRequired);
            }
        }
        return Err(ScrapeError::structure(PARSER, "url|streams"));
    };

    let plain =
        crypto::decrypt(encoded, STREAM_SECRET).map_err(|e| ScrapeError::Decrypt(e.to_string()))?;

    let mut qualities: IndexMap<String, Option<Url>> = IndexMap::new();
    let mut skipped: Vec<SkippedLink> = vec![];

    for chunk in plain.split(',') {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }

        let Some((label, candidates)) = split_quality_chunk(chunk) else {
            debug!("{PARSER}: unlabeled stream chunk skipped");
            continue;
        };

        match resolve_candidate(candidates) {
            Candidate::Stream(link) => {
                qualities.insert(label, Some(link));
            }
            Candidate::Absent => {
                qualities.insert(label, None);
            }
            Candidate::Rejected(link) => {
                warn!("{PARSER}: skipping non-stream link for {label}: {link}");
                skipped.push(SkippedLink {
                    quality: label.clone(),
                    link,
                });
                qualities.insert(label, None);
            }
        }
    }

    Ok(MovieVideo {
        qualities,
        skipped,
        subtitles: parse_subtitles(&value),
        need_premium: value.get("premium_content").and_then(Value::as_i64) == Some(1),
        thumbnails: value
            .get("thumbnails")
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

fn parse_json_payload(body: &str) -> ScrapeResult<Value> {
    if let Ok(value) = serde_json::from_str(body) {
        return Ok(value);
    }

    // Fallback: the payload wrapped into a JS call, `{"id": ... });`.
    // Kept as a second step on purpose; never merged with the strict parse.
    let start = body
        .find("{\"id\":")
        .ok_or_else(|| ScrapeError::structure(PARSER, "json payload"))?;
    let end = body[start..]
        .find("});")
        .ok_or_else(|| ScrapeError::structure(PARSER, "json payload"))?;

    serde_json::from_str(&body[start..start + end + 1])
        .map_err(|_| ScrapeError::structure(PARSER, "json payload"))
}

/// `[label]candidate or candidate or ...`
fn split_quality_chunk(chunk: &str) -> Option<(String, &str)> {
    let rest = chunk.strip_prefix('[')?;
    let close = rest.find(']')?;

    let label = decode_entities(&rest[..close]);
    Some((label, &rest[close + 1..]))
}

enum Candidate {
    Stream(Url),
    Absent,
    Rejected(String),
}

/// Only the first candidate is ever used; the alternates mirror it.
fn resolve_candidate(candidates: &str) -> Candidate {
    let first = candidates
        .split(CANDIDATE_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = first.strip_suffix(HLS_SUFFIX).unwrap_or(first);

    if trimmed == "null" || trimmed.is_empty() {
        return Candidate::Absent;
    }

    let Ok(link) = Url::parse(trimmed) else {
        return Candidate::Absent;
    };

    // Non-mp4 and local-file entries are decoys, never playable streams.
    // Deliberate anti-breakage logic; other extensions stay rejected.
    let is_remote = matches!(link.scheme(), "http" | "https") && link.host_str().is_some();
    if !is_remote || !link.path().ends_with(".mp4") {
        return Candidate::Rejected(trimmed.to_owned());
    }

    Candidate::Stream(link)
}

/// `subtitle` lists `[name]link` pairs; `subtitle_lns` maps names to
/// language tags. Entries without a language match are dropped.
fn parse_subtitles(value: &Value) -> Vec<MovieSubtitles> {
    let (Some(subtitle), Some(lns)) = (
        value.get("subtitle").and_then(Value::as_str),
        value.get("subtitle_lns").and_then(Value::as_object),
    ) else {
        return vec![];
    };

    subtitle
        .split(',')
        .filter_map(|pair| {
            let rest = pair.trim().strip_prefix('[')?;
            let close = rest.find(']')?;

            let name = decode_entities(&rest[..close]);
            let link = rest[close + 1..].trim();
            if link.is_empty() {
                return None;
            }

            let lang = lns.get(&name).and_then(Value::as_str)?;

            Some(MovieSubtitles {
                name,
                link: link.to_owned(),
                lang: lang.to_owned(),
            })
        })
        .collect()
}

/// Trailer payloads carry a player embed snippet; the video id sits between
/// the last path segment and the query string.
pub fn parse_trailer_id(body: &str) -> ScrapeResult<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| ScrapeError::structure(PARSER, "trailer json"))?;

    let code = value
        .get("code")
        .and_then(Value::as_str)
        .ok_or_else(|| ScrapeError::structure(PARSER, "code"))?;

    let at = code
        .find("/embed/")
        .ok_or_else(|| ScrapeError::structure(PARSER, "embed url"))?;

    let mut scanner = TextScanner::new(&code[at + "/embed/".len()..]);
    scanner
        .scan_up_to(&['?', '"', '\'', '&'])
        .ok_or_else(|| ScrapeError::structure(PARSER, "embed url"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &[u8; 8] = b"\x11\x22\x33\x44\x55\x66\x77\x88";

    fn encode(plain: &str) -> String {
        crypto::encrypt(plain, STREAM_SECRET, SALT)
    }

    #[test]
    fn should_resolve_quality_map_in_source_order() {
        let plain = "[360p]https://cdn.example.com/v/360.mp4:hls:manifest.m3u8 or null,[720p]https://cdn.example.com/v/720.mp4,[1080p]null";
        let body = format!("{{\"id\":\"cdn\",\"url\":\"{}\"}}", encode(plain));

        let video = parse_video_manifest(&body).unwrap();

        let labels: Vec<&String> = video.qualities.keys().collect();
        assert_eq!(labels, ["360p", "720p", "1080p"]);
        assert_eq!(
            video.qualities["360p"].as_ref().unwrap().as_str(),
            "https://cdn.example.com/v/360.mp4"
        );
        assert!(video.qualities["1080p"].is_none());
        assert!(video.skipped.is_empty());
        assert!(!video.need_premium);
    }

    #[test]
    fn non_mp4_and_local_links_are_skipped_not_hidden() {
        let plain = "[720p]https://cdn.example.com/v/720.mkv,[1080p]file:///tmp/leak.mp4";
        let body = format!("{{\"id\":\"cdn\",\"url\":\"{}\"}}", encode(plain));

        let video = parse_video_manifest(&body).unwrap();

        assert!(video.qualities["720p"].is_none());
        assert!(video.qualities["1080p"].is_none());
        assert_eq!(video.skipped.len(), 2);
        assert_eq!(video.skipped[0].quality, "720p");
        assert_eq!(video.skipped[0].link, "https://cdn.example.com/v/720.mkv");
    }

    #[test]
    fn should_parse_js_wrapped_payload() {
        let plain = "[480p]https://cdn.example.com/v/480.mp4";
        let body = format!(
            "$(function () {{ sof.tv.initCDNSeriesEvents(77, {{\"id\":\"cdn\",\"streams\":\"{}\",\"subtitle_lns\":{{\"a\":\"b\"}}}});}});",
            encode(plain)
        );

        let video = parse_video_manifest(&body).unwrap();
        assert!(video.qualities["480p"].is_some());
    }

    #[test]
    fn sign_in_message_maps_to_auth_required() {
        let body = r#"{"success":false,"message":"Для просмотра необходимо авторизоваться"}"#;
        assert!(matches!(
            parse_video_manifest(body),
            Err(ScrapeError::AuthRequired)
        ));
    }

    #[test]
    fn missing_stream_field_is_structural() {
        let body = r#"{"id":"cdn","success":true}"#;
        assert!(matches!(
            parse_video_manifest(body),
            Err(ScrapeError::Structure { .. })
        ));
    }

    #[test]
    fn subtitles_require_language_match() {
        let plain = "[720p]https://cdn.example.com/v/720.mp4";
        let body = format!(
            "{{\"id\":\"cdn\",\"url\":\"{}\",\"subtitle\":\"[Русский]https://cdn.example.com/s/ru.vtt,[Klingon]https://cdn.example.com/s/tlh.vtt\",\"subtitle_lns\":{{\"Русский\":\"ru\"}},\"premium_content\":1,\"thumbnails\":\"/thumbs/77.vtt\"}}",
            encode(plain)
        );

        let video = parse_video_manifest(&body).unwrap();

        assert_eq!(video.subtitles.len(), 1);
        assert_eq!(video.subtitles[0].name, "Русский");
        assert_eq!(video.subtitles[0].lang, "ru");
        assert!(video.need_premium);
        assert_eq!(video.thumbnails.as_deref(), Some("/thumbs/77.vtt"));
    }

    #[test]
    fn quality_labels_are_entity_decoded() {
        let plain = "[1080p Ultra &amp; HDR]https://cdn.example.com/v/u.mp4";
        let body = format!("{{\"id\":\"cdn\",\"url\":\"{}\"}}", encode(plain));

        let video = parse_video_manifest(&body).unwrap();
        assert!(video.qualities.contains_key("1080p Ultra & HDR"));
    }

    #[test]
    fn should_extract_trailer_id() {
        let body = r#"{"success":true,"code":"<iframe src=\"https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0\"></iframe>"}"#;
        assert_eq!(parse_trailer_id(body).unwrap(), "dQw4w9WgXcQ");
    }
}
