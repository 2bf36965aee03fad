use scraper::{ElementRef, Html};

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{
    CategoryKind, MovieCategory, MovieCollection, MovieSimple, PersonSimple, ReleaseStatus,
};
use crate::utils::html::{
    optional_attr, optional_text, require_attr, require_text, select_all, select_first, text_of,
};
use crate::utils::text::extract_digits;

const CARD_SELECTOR: &str = ".b-content__inline_item";
const COLLECTION_SELECTOR: &str = ".b-content__collections_item";
const PERSON_SELECTOR: &str = ".b-person__card";

/// Category pages, search results and bookmark pages all render the same
/// repeated card markup.
pub fn parse_movie_list(page: &str) -> ScrapeResult<Vec<MovieSimple>> {
    let document = Html::parse_document(page);
    select_all(document.root_element(), CARD_SELECTOR)
        .into_iter()
        .map(parse_movie_card)
        .collect()
}

pub fn parse_search(page: &str) -> ScrapeResult<Vec<MovieSimple>> {
    parse_movie_list(page)
}

pub fn parse_bookmarks(page: &str) -> ScrapeResult<Vec<MovieSimple>> {
    parse_movie_list(page)
}

pub fn parse_collections(page: &str) -> ScrapeResult<Vec<MovieCollection>> {
    let document = Html::parse_document(page);
    select_all(document.root_element(), COLLECTION_SELECTOR)
        .into_iter()
        .map(parse_collection_card)
        .collect()
}

pub fn parse_people(page: &str) -> ScrapeResult<Vec<PersonSimple>> {
    let document = Html::parse_document(page);
    select_all(document.root_element(), PERSON_SELECTOR)
        .into_iter()
        .map(parse_person_card)
        .collect()
}

pub(crate) fn parse_movie_card(el: ElementRef<'_>) -> ScrapeResult<MovieSimple> {
    const PARSER: &str = "movie_card";

    let id = el
        .attr("data-url")
        .map(super::extract_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ScrapeError::structure(PARSER, "data-url"))?;

    let name = require_text(el, ".b-content__inline_item-link > a", PARSER)?;
    let details = optional_text(el, ".b-content__inline_item-link > div").unwrap_or_default();
    let poster = require_attr(el, ".b-content__inline_item-cover img", "src", PARSER)?;

    let category = select_first(el, ".cat").map(|cat| MovieCategory {
        kind: category_kind(cat),
        rating: optional_text(el, ".b-category-bestrating").and_then(|r| r.parse().ok()),
    });

    let status = select_first(el, ".info")
        .map(|info| info.inner_html())
        .and_then(|html| parse_release_status(&html));

    Ok(MovieSimple {
        id,
        name,
        details,
        poster,
        category,
        status,
    })
}

fn category_kind(cat: ElementRef<'_>) -> CategoryKind {
    let classes = cat.attr("class").unwrap_or_default();

    if classes.contains("series") {
        CategoryKind::Series
    } else if classes.contains("cartoon") {
        CategoryKind::Cartoon
    } else if classes.contains("anime") {
        CategoryKind::Anime
    } else if classes.contains("show") {
        CategoryKind::Show
    } else {
        CategoryKind::Film
    }
}

/// Status keyword groups are mutually exclusive in the source markup.
/// The season/episode form must split on `", "` or `<br>` into exactly two
/// digit-bearing fields; any other shape means "no status", never an error.
pub(crate) fn parse_release_status(inline_html: &str) -> Option<ReleaseStatus> {
    let lowered = inline_html.to_lowercase();

    if lowered.contains("завершен") {
        return Some(ReleaseStatus::Completed);
    }
    if lowered.contains("ожидается") {
        return Some(ReleaseStatus::Awaiting);
    }

    let fields: Vec<&str> = if inline_html.contains(", ") {
        inline_html.split(", ").collect()
    } else if inline_html.contains("<br>") {
        inline_html.split("<br>").collect()
    } else {
        return None;
    };

    if fields.len() != 2 {
        return None;
    }
    if fields.iter().any(|f| !f.chars().any(|c| c.is_ascii_digit())) {
        return None;
    }

    Some(ReleaseStatus::Ongoing {
        season: extract_digits(fields[0]),
        episode: extract_digits(fields[1]),
    })
}

fn parse_collection_card(el: ElementRef<'_>) -> ScrapeResult<MovieCollection> {
    const PARSER: &str = "collection_card";

    let id = el
        .attr("data-url")
        .map(super::extract_id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ScrapeError::structure(PARSER, "data-url"))?;

    let name = require_text(el, ".title", PARSER)?;
    let poster = require_attr(el, "img", "src", PARSER)?;

    // The count is structurally guaranteed whenever the card renders, so a
    // non-numeric value is markup drift, not an optional field.
    let count_text = require_text(el, ".num", PARSER)?;
    let count = count_text
        .parse()
        .map_err(|_| ScrapeError::structure(PARSER, ".num"))?;

    Ok(MovieCollection {
        id,
        name,
        poster,
        count,
    })
}

fn parse_person_card(el: ElementRef<'_>) -> ScrapeResult<PersonSimple> {
    const PARSER: &str = "person_card";

    let id = require_attr(el, "a", "href", PARSER).map(|href| super::extract_id(&href))?;
    let name = require_text(el, ".name", PARSER)?;
    let photo = optional_attr(el, "img", "src");

    Ok(PersonSimple { id, name, photo })
}

/// Person name helper shared with the detail page's cast links, which render
/// the photo and name inside one anchor.
pub(crate) fn parse_person_link(el: ElementRef<'_>) -> Option<PersonSimple> {
    let href = el.attr("href")?;
    let name = text_of(el);
    if name.is_empty() {
        return None;
    }

    Some(PersonSimple {
        id: super::extract_id(href),
        name,
        photo: optional_attr(el, "img", "src"),
    })
}
