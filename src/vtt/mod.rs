use url::Url;

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{CropRect, Cue, WebVtt};
use crate::utils::scanner::TextScanner;

const PARSER: &str = "vtt";
const SIGNATURE: &str = "WEBVTT";

// Block kinds that are headers, never cues.
const NON_CUE_KEYWORDS: &[&str] = &["NOTE", "STYLE", "REGION"];

/// Parses a thumbnail-cue sidecar. `sidecar_url` is the URL the file itself
/// was fetched from; relative image references resolve against it.
///
/// Malformed timing lines and crop fragments drop the affected cue or crop,
/// they never fail the whole file. Only a missing signature is fatal.
pub fn parse(source: &str, sidecar_url: &Url) -> ScrapeResult<WebVtt> {
    let mut scanner = TextScanner::new(source.trim_start_matches('\u{feff}'));

    let signature_line = scanner
        .scan_line()
        .ok_or_else(|| ScrapeError::structure(PARSER, "signature"))?;
    if !signature_line.starts_with(SIGNATURE) {
        return Err(ScrapeError::structure(PARSER, "signature"));
    }

    let mut cues: Vec<Cue> = vec![];

    while let Some(block) = next_block(&mut scanner) {
        let seen_cue = !cues.is_empty();

        if !seen_cue && starts_with_non_cue_keyword(&block[0]) {
            continue;
        }

        let timing_at = if parse_timing_line(&block[0]).is_some() {
            Some(0)
        } else if block.len() > 1 && parse_timing_line(&block[1]).is_some() {
            // First line is the optional cue identifier.
            Some(1)
        } else {
            None
        };

        let Some(timing_at) = timing_at else {
            continue;
        };
        let Some((start_ms, end_ms)) = parse_timing_line(&block[timing_at]) else {
            continue;
        };
        if start_ms > end_ms {
            continue;
        }

        let payload = block[timing_at + 1..].join("\n");
        let (image, rect) = parse_payload(&payload, sidecar_url);

        cues.push(Cue {
            start_ms,
            end_ms,
            image,
            rect,
        });
    }

    Ok(WebVtt { cues })
}

/// A block is a maximal run of non-blank lines.
fn next_block(scanner: &mut TextScanner) -> Option<Vec<String>> {
    let mut lines: Vec<String> = vec![];

    while let Some(line) = scanner.scan_line() {
        if line.trim().is_empty() {
            if lines.is_empty() {
                continue;
            }
            break;
        }
        lines.push(line);
    }

    if lines.is_empty() {
        return None;
    }
    Some(lines)
}

fn starts_with_non_cue_keyword(line: &str) -> bool {
    NON_CUE_KEYWORDS.iter().any(|kw| line.starts_with(kw))
}

/// `hh:mm:ss.mmm --> hh:mm:ss.mmm`, hour and minute components optional.
fn parse_timing_line(line: &str) -> Option<(u64, u64)> {
    let mut scanner = TextScanner::new(line.trim());

    let start = scan_timestamp(&mut scanner)?;

    skip_spaces(&mut scanner);
    if scanner.peek(3)? != "-->" {
        return None;
    }
    scanner.skip(3);
    skip_spaces(&mut scanner);

    let end = scan_timestamp(&mut scanner)?;

    Some((start, end))
}

/// `SS.mmm`, `MM:SS.mmm` or `HH:MM:SS.mmm` as total milliseconds.
fn scan_timestamp(scanner: &mut TextScanner) -> Option<u64> {
    let mut components: Vec<u64> = vec![scanner.scan_int(false)?];

    while components.len() < 3 && scanner.peek_one() == Some(':') {
        scanner.skip(1);
        components.push(scanner.scan_int(false)?);
    }

    if scanner.peek_one() != Some('.') {
        return None;
    }
    scanner.skip(1);
    let millis = scanner.scan_int(false)?;

    let mut total: u64 = 0;
    for component in &components {
        total = total * 60 + component;
    }

    Some(total * 1000 + millis)
}

fn skip_spaces(scanner: &mut TextScanner) {
    while scanner.peek_one() == Some(' ') {
        scanner.skip(1);
    }
}

fn parse_payload(payload: &str, sidecar_url: &Url) -> (Option<String>, Option<CropRect>) {
    let payload = payload.trim();
    if payload.is_empty() {
        return (None, None);
    }

    let (reference, fragment) = match payload.split_once('#') {
        Some((reference, fragment)) => (reference, Some(fragment)),
        None => (payload, None),
    };

    let image = resolve_image(reference, sidecar_url);
    let rect = fragment.and_then(parse_xywh_fragment);

    (image, rect)
}

fn resolve_image(reference: &str, sidecar_url: &Url) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    if reference.starts_with("http://") || reference.starts_with("https://") {
        return Some(reference.to_owned());
    }

    if reference.starts_with('/') {
        let mut resolved = sidecar_url.clone();
        resolved.set_path(reference);
        resolved.set_query(None);
        resolved.set_fragment(None);
        return Some(resolved.to_string());
    }

    sidecar_url.join(reference).ok().map(|u| u.to_string())
}

/// `xywh=x,y,w,h`; anything other than exactly four numeric fields yields no
/// crop rectangle.
fn parse_xywh_fragment(fragment: &str) -> Option<CropRect> {
    let values = fragment.strip_prefix("xywh=")?;

    let fields: Vec<&str> = values.split(',').collect();
    if fields.len() != 4 {
        return None;
    }

    let mut parsed = [0f64; 4];
    for (slot, field) in parsed.iter_mut().zip(&fields) {
        *slot = field.trim().parse().ok()?;
    }

    Some(CropRect {
        x: parsed[0],
        y: parsed[1],
        width: parsed[2],
        height: parsed[3],
    })
}
