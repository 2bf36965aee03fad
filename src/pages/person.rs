use scraper::Html;

use crate::error::ScrapeResult;
use crate::models::{PersonCareer, PersonDetailed};
use crate::utils::html::{
    optional_attr, optional_text, require_first, require_text, select_all, text_of,
};

const PARSER: &str = "person_details";

/// Parses a person page: biography header plus one movie-card strip per
/// career category.
pub fn parse_person(page: &str, id: &str) -> ScrapeResult<PersonDetailed> {
    let document = Html::parse_document(page);
    let root = document.root_element();

    let post = require_first(root, ".b-post__infotable", PARSER)?;

    let name = require_text(post, ".b-post__title h1", PARSER)?;
    let original_name = optional_text(post, ".b-post__origtitle");
    let photo = optional_attr(post, ".b-sidecover img", "src");

    let mut birth_date = None;
    let mut birth_place = None;
    let mut height = None;

    for row in select_all(post, ".b-post__info tr") {
        let cells = select_all(row, "td");
        if cells.len() != 2 {
            continue;
        }

        let label = text_of(cells[0]);
        let value = text_of(cells[1]);
        match label.trim_end_matches(':') {
            "Дата рождения" => birth_date = Some(value),
            "Место рождения" => birth_place = Some(value),
            "Рост" => height = Some(value),
            _ => {}
        }
    }

    let careers = select_all(root, ".b-person__career")
        .into_iter()
        .map(|block| {
            let movies = select_all(block, ".b-content__inline_item")
                .into_iter()
                .map(super::listing::parse_movie_card)
                .collect::<ScrapeResult<Vec<_>>>()?;

            Ok(PersonCareer {
                name: optional_text(block, "h2").unwrap_or_default(),
                movies,
            })
        })
        .collect::<ScrapeResult<Vec<_>>>()?;

    Ok(PersonDetailed {
        id: id.to_owned(),
        name,
        original_name,
        photo,
        birth_date,
        birth_place,
        height,
        careers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERSON_PAGE: &str = r##"
    <div class="b-post__infotable">
      <div class="b-sidecover"><img src="/i/actor.jpg" /></div>
      <div class="b-post__title"><h1>Питер Динклэйдж</h1></div>
      <div class="b-post__origtitle">Peter Dinklage</div>
      <table class="b-post__info"><tbody>
        <tr><td class="l">Дата рождения:</td><td>11 июня 1969</td></tr>
        <tr><td class="l">Место рождения:</td><td>Морристаун, США</td></tr>
        <tr><td class="l">Рост:</td><td>1.35 м</td></tr>
      </tbody></table>
    </div>
    <div class="b-person__career">
      <h2>Актер</h2>
      <div class="b-content__inline_item" data-url="/series/fantasy/1-got-2011.html">
        <div class="b-content__inline_item-cover"><img src="/i/got.jpg" /></div>
        <div class="b-content__inline_item-link"><a href="#">Игра престолов</a><div>2011</div></div>
      </div>
    </div>
    <div class="b-person__career">
      <h2>Продюсер</h2>
    </div>"##;

    #[test]
    fn should_parse_person_page() {
        let person = parse_person(PERSON_PAGE, "person/551-peter-dinklage").unwrap();

        assert_eq!(person.name, "Питер Динклэйдж");
        assert_eq!(person.original_name.as_deref(), Some("Peter Dinklage"));
        assert_eq!(person.photo.as_deref(), Some("/i/actor.jpg"));
        assert_eq!(person.birth_date.as_deref(), Some("11 июня 1969"));
        assert_eq!(person.birth_place.as_deref(), Some("Морристаун, США"));
        assert_eq!(person.height.as_deref(), Some("1.35 м"));

        assert_eq!(person.careers.len(), 2);
        assert_eq!(person.careers[0].name, "Актер");
        assert_eq!(person.careers[0].movies.len(), 1);
        assert_eq!(person.careers[0].movies[0].id, "series/fantasy/1-got-2011");
        assert!(person.careers[1].movies.is_empty());
    }
}
