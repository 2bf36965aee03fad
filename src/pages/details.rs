use std::collections::HashMap;
use std::sync::OnceLock;

use base64::{
    prelude::{BASE64_STANDARD, BASE64_STANDARD_NO_PAD},
    Engine,
};
use percent_encoding::percent_decode_str;
use scraper::{ElementRef, Html};

use crate::error::ScrapeResult;
use crate::models::{
    FranchisePart, MovieDetailed, MovieEpisode, MovieListMembership, MovieSeason,
    MovieTranslations, MovieVoiceActing, PersonSimple, RatingSource, ScheduleGroup, ScheduleItem,
};
use crate::utils::html::{
    optional_attr, optional_text, require_attr, require_first, require_text, select_all,
    select_first, text_of,
};
use crate::utils::scanner::TextScanner;
use crate::utils::text::extract_digits;

const PARSER: &str = "movie_details";

/// Rating permalinks hide the real target behind this redirect path.
const DEEP_LINK_MARKER: &str = "/go/";

/// JS event calls that reveal the server-selected translator on pages
/// without a static translator list.
const CDN_EVENT_PREFIXES: &[&str] = &["initCDNMoviesEvents(", "initCDNSeriesEvents("];

/// Parses one detail page. `id` is supplied by the caller (it also encodes
/// the `type/genre/slug` used by other calls) and is stored verbatim.
pub fn parse_details(page: &str, id: &str) -> ScrapeResult<MovieDetailed> {
    let document = Html::parse_document(page);
    let root = document.root_element();

    let post = require_first(root, ".b-post", PARSER)?;

    let name = require_text(post, ".b-post__title h1", PARSER)?;
    let original_name = optional_text(post, ".b-post__origtitle");

    let poster = require_attr(post, ".b-sidecover img", "src", PARSER)?;
    let hposter = optional_attr(post, ".b-sidecover a", "href").unwrap_or_else(|| poster.clone());

    let description = optional_text(post, ".b-post__description_text");
    let rating_summary = optional_text(post, ".b-post__rating");

    let available = select_first(root, "#cdnplayer-container").is_some();
    let coming_soon = select_first(post, ".b-post__status").is_some();

    let comments_count = optional_text(root, ".comments-title .count")
        .map(|t| extract_digits(&t))
        .unwrap_or(0);
    let favs_token = optional_attr(root, "#ctrl_favs", "value");

    let mut fields = InfoFields::default();
    walk_info_table(post, &mut fields);

    let (translations, seasons) = if available && !coming_soon {
        (
            parse_translations(root, page, fields.in_translation.as_deref()),
            parse_seasons(root),
        )
    } else {
        (None, vec![])
    };

    Ok(MovieDetailed {
        id: id.to_owned(),
        name,
        original_name,
        poster,
        hposter,
        description,
        rating_summary,
        ratings: fields.ratings,
        release_date: fields.release_date,
        year: fields.year,
        countries: fields.countries,
        genres: fields.genres,
        age_rating: fields.age_rating,
        runtime_minutes: fields.runtime_minutes,
        tagline: fields.tagline,
        directors: fields.directors,
        actors: fields.actors,
        lists: fields.lists,
        collections: fields.collections,
        franchise: parse_franchise(root, id),
        schedule: parse_schedule(root),
        translations,
        seasons,
        comments_count,
        available,
        coming_soon,
        favs_token,
    })
}

// Label -> value table

#[derive(Default)]
struct InfoFields {
    ratings: Vec<RatingSource>,
    release_date: Option<String>,
    year: Option<u32>,
    countries: Vec<String>,
    genres: Vec<String>,
    age_rating: Option<String>,
    runtime_minutes: Option<u32>,
    tagline: Option<String>,
    directors: Vec<PersonSimple>,
    actors: Vec<PersonSimple>,
    lists: Vec<MovieListMembership>,
    collections: Vec<MovieListMembership>,
    in_translation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfoField {
    Ratings,
    ReleaseDate,
    Directors,
    AgeRating,
    Countries,
    Genres,
    Runtime,
    InLists,
    FromCollection,
    Tagline,
    InTranslation,
    /// The cast row carries no distinguishing label in some layouts, so any
    /// unrecognized (or absent) label routes here.
    Cast,
}

fn info_field(label: &str) -> InfoField {
    static LABELS: OnceLock<HashMap<&'static str, InfoField>> = OnceLock::new();
    let labels = LABELS.get_or_init(|| {
        HashMap::from([
            ("Рейтинги", InfoField::Ratings),
            ("Дата выхода", InfoField::ReleaseDate),
            ("Режиссер", InfoField::Directors),
            ("Возраст", InfoField::AgeRating),
            ("Страна", InfoField::Countries),
            ("Жанр", InfoField::Genres),
            ("Время", InfoField::Runtime),
            ("Входит в списки", InfoField::InLists),
            ("Из серии", InfoField::FromCollection),
            ("Слоган", InfoField::Tagline),
            ("В переводе", InfoField::InTranslation),
        ])
    });

    let normalized = label.trim().trim_end_matches(':').trim();
    labels.get(normalized).copied().unwrap_or(InfoField::Cast)
}

/// Rows come as label cell + value cell pairs; single-cell rows are the
/// unlabeled cast layout and route through the default case.
fn walk_info_table(post: ElementRef<'_>, fields: &mut InfoFields) {
    for row in select_all(post, ".b-post__info tr") {
        let cells = select_all(row, "td");

        let (field, value) = match cells.len() {
            2 => (info_field(&text_of(cells[0])), cells[1]),
            1 => (InfoField::Cast, cells[0]),
            _ => continue,
        };

        match field {
            InfoField::Ratings => fields.ratings = parse_ratings(value),
            InfoField::ReleaseDate => {
                let date = text_of(value);
                fields.year = find_year(&date);
                fields.release_date = Some(date);
            }
            InfoField::Directors => fields.directors = parse_person_links(value),
            InfoField::AgeRating => fields.age_rating = Some(text_of(value)),
            InfoField::Countries => {
                fields.countries = text_of(value)
                    .split(", ")
                    .map(str::to_owned)
                    .filter(|c| !c.is_empty())
                    .collect()
            }
            InfoField::Genres => {
                fields.genres = select_all(value, "a")
                    .into_iter()
                    .map(text_of)
                    .filter(|g| !g.is_empty())
                    .collect()
            }
            InfoField::Runtime => fields.runtime_minutes = Some(extract_digits(&text_of(value))),
            InfoField::InLists => fields.lists = parse_memberships(value, true),
            InfoField::FromCollection => fields.collections = parse_memberships(value, false),
            InfoField::Tagline => fields.tagline = Some(text_of(value)),
            InfoField::InTranslation => fields.in_translation = Some(text_of(value)),
            InfoField::Cast => fields.actors = parse_person_links(value),
        }
    }
}

fn parse_ratings(cell: ElementRef<'_>) -> Vec<RatingSource> {
    select_all(cell, ".b-post__info_rates")
        .into_iter()
        .filter_map(|rate| {
            let name = optional_text(rate, "a").or_else(|| optional_text(rate, ".name"))?;
            let value: f64 = optional_text(rate, ".bold")?.parse().ok()?;
            // Vote counts are kept exactly as printed, parentheses stripped.
            let votes = optional_text(rate, "i")
                .map(|v| v.trim_matches(|c| c == '(' || c == ')').to_owned())
                .unwrap_or_default();
            let link = optional_attr(rate, "a", "href").and_then(|href| decode_deep_link(&href));

            Some(RatingSource {
                name,
                value,
                votes,
                link,
            })
        })
        .collect()
}

/// Strip trailing slashes, take everything past the last redirect marker,
/// base64-decode, then percent-decode.
fn decode_deep_link(href: &str) -> Option<String> {
    let trimmed = href.trim_end_matches('/');
    let at = trimmed.rfind(DEEP_LINK_MARKER)?;
    let payload = &trimmed[at + DEEP_LINK_MARKER.len()..];

    let raw = BASE64_STANDARD
        .decode(payload)
        .or_else(|_| BASE64_STANDARD_NO_PAD.decode(payload.trim_end_matches('=')))
        .ok()?;
    let encoded = String::from_utf8(raw).ok()?;

    Some(percent_decode_str(&encoded).decode_utf8().ok()?.into_owned())
}

fn find_year(date: &str) -> Option<u32> {
    let mut scanner = TextScanner::new(date);
    loop {
        match scanner.scan_int(false) {
            Some(value) if (1800..=2200).contains(&value) => return Some(value as u32),
            Some(_) => {}
            None => {
                if scanner.at_end() {
                    return None;
                }
                scanner.skip(1);
            }
        }
    }
}

fn parse_person_links(cell: ElementRef<'_>) -> Vec<PersonSimple> {
    select_all(cell, "a[href]")
        .into_iter()
        .filter_map(super::listing::parse_person_link)
        .collect()
}

/// List memberships render as anchors, each optionally followed by a text
/// node like `(3 место)` holding the 1-based position.
fn parse_memberships(cell: ElementRef<'_>, with_positions: bool) -> Vec<MovieListMembership> {
    select_all(cell, "a[href]")
        .into_iter()
        .filter_map(|a| {
            let name = text_of(a);
            if name.is_empty() {
                return None;
            }

            let position = if with_positions {
                trailing_position(a)
            } else {
                None
            };

            Some(MovieListMembership {
                id: super::extract_id(a.attr("href")?),
                name,
                position,
            })
        })
        .collect()
}

fn trailing_position(anchor: ElementRef<'_>) -> Option<u32> {
    for sibling in anchor.next_siblings() {
        if let Some(text) = sibling.value().as_text() {
            let chunk = text.trim();
            if chunk.is_empty() {
                continue;
            }
            let open = chunk.find('(')?;
            let digits = extract_digits(&chunk[open..]);
            return if digits > 0 { Some(digits) } else { None };
        }
        if sibling.value().is_element() {
            break;
        }
    }
    None
}

// Voice tracks (two page shapes)

fn parse_translations(
    root: ElementRef<'_>,
    page: &str,
    in_translation: Option<&str>,
) -> Option<MovieTranslations> {
    let items = select_all(root, "#translators-list .b-translator__item");
    if !items.is_empty() {
        let tracks = items.into_iter().filter_map(parse_voice_acting).collect();
        return Some(MovieTranslations::FullList(tracks));
    }

    // No static list: the only recoverable track is the server-selected one
    // named by the CDN event call embedded in the page scripts.
    let translator_id = extract_cdn_event_argument(page)?;
    Some(MovieTranslations::SingleInferred(MovieVoiceActing {
        id: translator_id,
        name: in_translation.unwrap_or("Оригинал").to_owned(),
        is_camrip: false,
        is_ads: false,
        is_director: false,
        is_premium: false,
        selected: true,
        deep_link: None,
    }))
}

fn parse_voice_acting(el: ElementRef<'_>) -> Option<MovieVoiceActing> {
    let id = el.attr("data-translator_id")?.to_owned();
    let classes = el.attr("class").unwrap_or_default();

    Some(MovieVoiceActing {
        id,
        name: text_of(el),
        is_camrip: el.attr("data-camrip") == Some("1"),
        is_ads: el.attr("data-ads") == Some("1"),
        is_director: el.attr("data-director") == Some("1"),
        is_premium: classes.contains("b-prem_translator"),
        selected: classes.contains("active"),
        deep_link: el.attr("data-url").map(str::to_owned),
    })
}

/// Numeric argument following one of the known CDN event call prefixes,
/// up to the next comma.
fn extract_cdn_event_argument(page: &str) -> Option<String> {
    for prefix in CDN_EVENT_PREFIXES {
        if let Some(at) = page.find(prefix) {
            let mut scanner = TextScanner::new(&page[at + prefix.len()..]);
            let argument = scanner.scan_up_to(&[','])?;
            let digits: String = argument.chars().filter(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                return Some(digits);
            }
        }
    }
    None
}

// Seasons (two page shapes)

fn parse_seasons(root: ElementRef<'_>) -> Vec<MovieSeason> {
    let tabs = select_all(root, "#simple-seasons-tabs .b-simple_season__item");
    let episode_items = select_all(root, ".b-simple_episode__item");
    build_seasons(&tabs, &episode_items)
}

/// Switching the translator re-delivers seasons and episodes as two HTML
/// fragments inside a JSON envelope; the markup inside them matches the
/// detail page's season tabs and episode rows.
pub fn parse_season_fragments(seasons_html: &str, episodes_html: &str) -> Vec<MovieSeason> {
    let seasons_doc = Html::parse_fragment(seasons_html);
    let episodes_doc = Html::parse_fragment(episodes_html);

    let tabs = select_all(seasons_doc.root_element(), ".b-simple_season__item");
    let episode_items = select_all(episodes_doc.root_element(), ".b-simple_episode__item");
    build_seasons(&tabs, &episode_items)
}

/// Tabs pair with episode rows through the season id each row carries; ids
/// are compared literally, never interpolated into a selector.
fn build_seasons(tabs: &[ElementRef<'_>], episode_items: &[ElementRef<'_>]) -> Vec<MovieSeason> {
    if !tabs.is_empty() {
        return tabs
            .iter()
            .filter_map(|tab| {
                let id = tab.attr("data-tab_id")?.to_owned();
                let episodes = episode_items
                    .iter()
                    .filter(|e| e.attr("data-season_id") == Some(id.as_str()))
                    .filter_map(|e| parse_episode(*e))
                    .collect();

                Some(MovieSeason {
                    name: text_of(*tab),
                    selected: tab.attr("class").unwrap_or_default().contains("active"),
                    id,
                    episodes,
                })
            })
            .collect();
    }

    // Episode list without season tabs: synthesize the one season its
    // episodes reference.
    if episode_items.is_empty() {
        return vec![];
    }

    let season_id = episode_items[0]
        .attr("data-season_id")
        .unwrap_or("1")
        .to_owned();
    let episodes = episode_items
        .iter()
        .filter_map(|e| parse_episode(*e))
        .collect();

    vec![MovieSeason {
        name: format!("{season_id} сезон"),
        selected: true,
        id: season_id,
        episodes,
    }]
}

fn parse_episode(el: ElementRef<'_>) -> Option<MovieEpisode> {
    Some(MovieEpisode {
        id: el.attr("data-episode_id")?.to_owned(),
        name: text_of(el),
        selected: el.attr("class").unwrap_or_default().contains("active"),
        deep_link: el.attr("data-cdn_url").map(str::to_owned),
    })
}

// Optional page sections

fn parse_franchise(root: ElementRef<'_>, page_id: &str) -> Vec<FranchisePart> {
    select_all(root, ".b-post__partcontent_item")
        .into_iter()
        .filter_map(|item| {
            // The source sometimes emits a decorative empty row; such parts
            // are dropped even when their numeric fields are well-formed.
            let name = optional_text(item, ".title")?;

            // The current part links nowhere, it is the page itself.
            let id = item
                .attr("data-url")
                .map(str::to_owned)
                .or_else(|| optional_attr(item, ".title a", "href"))
                .map(|href| super::extract_id(&href))
                .unwrap_or_else(|| page_id.to_owned());

            Some(FranchisePart {
                id,
                name,
                year: optional_text(item, ".year"),
                rating: optional_text(item, ".rating").and_then(|r| r.parse().ok()),
                current: item.attr("class").unwrap_or_default().contains("current"),
            })
        })
        .collect()
}

fn parse_schedule(root: ElementRef<'_>) -> Vec<ScheduleGroup> {
    select_all(root, ".b-post__schedule_block")
        .into_iter()
        .map(|block| {
            let name = optional_text(block, ".title").unwrap_or_default();
            // Rows without a title are placeholders; groups are kept even
            // when every row is filtered out.
            let items = select_all(block, "tr")
                .into_iter()
                .filter_map(parse_schedule_item)
                .collect();

            ScheduleGroup { name, items }
        })
        .collect()
}

fn parse_schedule_item(row: ElementRef<'_>) -> Option<ScheduleItem> {
    let title = optional_text(row, ".td-2 b")?;
    if title.is_empty() {
        return None;
    }

    Some(ScheduleItem {
        episode: optional_text(row, ".td-1").unwrap_or_default(),
        title,
        original_title: optional_text(row, ".td-2 span"),
        date: optional_text(row, ".td-4"),
        released: select_first(row, ".watched").is_some(),
    })
}
