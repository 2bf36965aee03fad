use std::fmt::Write;

use url::Url;

use crate::models::MovieSubtitles;

/// Virtual URL schemes the transport layer intercepts and routes back into
/// the synthesis functions below.
pub const MAIN_SCHEME: &str = "main";
pub const FRAGMENTS_SCHEME: &str = "fragments";
pub const SUBTITLES_SCHEME: &str = "subtitles";

const EXTINF_PREFIX: &str = "#EXTINF:";
const SUBTITLE_GROUP: &str = "subs";

/// The source tags Ukrainian tracks with a non-standard code.
fn remap_language(lang: &str) -> &str {
    match lang {
        "ua" => "uk",
        other => other,
    }
}

/// Minimal master playlist: one media line per subtitle track plus a single
/// stream entry pointing at the virtual fragments resource. The SUBTITLES
/// attribute is omitted entirely when there are no tracks, some players
/// reject a group reference with no members.
pub fn build_master_playlist(subtitles: &[MovieSubtitles]) -> String {
    let mut playlist = String::from("#EXTM3U\n");

    for (index, track) in subtitles.iter().enumerate() {
        let _ = writeln!(
            playlist,
            "#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"{SUBTITLE_GROUP}\",NAME=\"{}\",DEFAULT=NO,FORCED=NO,LANGUAGE=\"{}\",URI=\"{SUBTITLES_SCHEME}://{index}\"",
            track.name,
            remap_language(&track.lang),
        );
    }

    if subtitles.is_empty() {
        playlist.push_str("#EXT-X-STREAM-INF:BANDWIDTH=828672\n");
    } else {
        let _ = writeln!(
            playlist,
            "#EXT-X-STREAM-INF:BANDWIDTH=828672,SUBTITLES=\"{SUBTITLE_GROUP}\""
        );
    }

    let _ = writeln!(playlist, "{FRAGMENTS_SCHEME}://video");
    playlist
}

/// Rewrites a fetched variant playlist so every segment URI is absolute,
/// resolved against the playlist's own location. Returns the rewritten text
/// together with the summed segment duration, which the subtitle playlist
/// needs afterwards.
pub fn rewrite_variant_playlist(content: &str, base: &Url) -> (String, f64) {
    let mut playlist = String::with_capacity(content.len());
    let mut total_duration = 0.0;
    let mut expect_uri = false;

    for line in content.lines() {
        let line = line.trim_end();

        if let Some(info) = line.strip_prefix(EXTINF_PREFIX) {
            let duration = info
                .split(',')
                .next()
                .and_then(|d| d.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            total_duration += duration;
            expect_uri = true;

            playlist.push_str(line);
            playlist.push('\n');
            continue;
        }

        if expect_uri && !line.starts_with('#') && !line.is_empty() {
            expect_uri = false;
            match base.join(line) {
                Ok(absolute) => playlist.push_str(absolute.as_str()),
                Err(_) => playlist.push_str(line),
            }
            playlist.push('\n');
            continue;
        }

        playlist.push_str(line);
        playlist.push('\n');
    }

    (playlist, total_duration)
}

/// One-segment VOD playlist wrapping an external subtitle file so it plays
/// as a synchronized text track spanning the whole stream.
pub fn build_subtitle_playlist(link: &str, total_duration: f64) -> String {
    format!(
        "#EXTM3U\n\
         #EXT-X-VERSION:3\n\
         #EXT-X-MEDIA-SEQUENCE:0\n\
         #EXT-X-TARGETDURATION:{:.0}\n\
         #EXTINF:{:.3},\n\
         {link}\n\
         #EXT-X-ENDLIST\n",
        total_duration.ceil(),
        total_duration,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, lang: &str) -> MovieSubtitles {
        MovieSubtitles {
            name: name.into(),
            link: format!("https://cdn.example.com/s/{lang}.vtt"),
            lang: lang.into(),
        }
    }

    #[test]
    fn master_playlist_lists_tracks_and_remaps_language() {
        let playlist =
            build_master_playlist(&[track("Русский", "ru"), track("Українська", "ua")]);

        assert!(playlist.starts_with("#EXTM3U\n"));
        assert!(playlist.contains("NAME=\"Русский\",DEFAULT=NO,FORCED=NO,LANGUAGE=\"ru\",URI=\"subtitles://0\""));
        assert!(playlist.contains("LANGUAGE=\"uk\",URI=\"subtitles://1\""));
        assert!(!playlist.contains("\"ua\""));
        assert!(playlist.contains("SUBTITLES=\"subs\""));
        assert!(playlist.ends_with("fragments://video\n"));
    }

    #[test]
    fn master_playlist_omits_subtitle_group_without_tracks() {
        let playlist = build_master_playlist(&[]);

        assert!(!playlist.contains("SUBTITLES"));
        assert!(!playlist.contains("#EXT-X-MEDIA"));
        assert!(playlist.contains("#EXT-X-STREAM-INF:BANDWIDTH=828672\n"));
    }

    #[test]
    fn variant_rewrite_absolutizes_each_segment_and_sums_durations() {
        let base = Url::parse("https://cdn.example.com/v/42/index.m3u8").unwrap();
        let content = "#EXTM3U\n\
                       #EXT-X-VERSION:3\n\
                       #EXT-X-TARGETDURATION:11\n\
                       #EXTINF:10.010,\n\
                       seg0.ts\n\
                       #EXTINF:10.010,\n\
                       seg1.ts\n\
                       #EXTINF:4.200,\n\
                       ../41/seg2.ts\n\
                       #EXT-X-ENDLIST\n";

        let (rewritten, total) = rewrite_variant_playlist(content, &base);

        assert!(rewritten.contains("https://cdn.example.com/v/42/seg0.ts\n"));
        assert!(rewritten.contains("https://cdn.example.com/v/42/seg1.ts\n"));
        assert!(rewritten.contains("https://cdn.example.com/v/41/seg2.ts\n"));
        assert_eq!(rewritten.matches("https://cdn.example.com/").count(), 3);
        assert!((total - 24.22).abs() < 1e-9);
    }

    #[test]
    fn variant_rewrite_keeps_absolute_segments() {
        let base = Url::parse("https://cdn.example.com/v/index.m3u8").unwrap();
        let content = "#EXTINF:6.0,\nhttps://other.example.com/seg.ts\n";

        let (rewritten, total) = rewrite_variant_playlist(content, &base);

        assert!(rewritten.contains("https://other.example.com/seg.ts\n"));
        assert!((total - 6.0).abs() < 1e-9);
    }

    #[test]
    fn subtitle_playlist_spans_accumulated_duration() {
        let playlist =
            build_subtitle_playlist("https://cdn.example.com/s/ru.vtt", 24.22);

        assert!(playlist.contains("#EXT-X-TARGETDURATION:25\n"));
        assert!(playlist.contains("#EXTINF:24.220,\n"));
        assert!(playlist.contains("https://cdn.example.com/s/ru.vtt\n"));
        assert!(playlist.ends_with("#EXT-X-ENDLIST\n"));
    }
}
