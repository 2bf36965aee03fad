use scraper::{ElementRef, Html};

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::{Comment, StyleRun, StyledText, TextRange, TextStyle};
use crate::utils::html::{optional_attr, optional_text, require_first, select_all, select_first};
use crate::utils::text::extract_digits;

use super::{MIRROR_HOST, REDIRECT_HOST};

const PARSER: &str = "comments";

/// Parses a comments page (or an ajax comments fragment) into a rose tree.
/// Nesting follows the explicit `data-indent` attribute; every subtree is
/// fully resolved before its parent record is built.
pub fn parse_comments(page: &str) -> ScrapeResult<Vec<Comment>> {
    let document = Html::parse_document(page);
    let root = document.root_element();

    select_all(root, ".comments-tree-item[data-indent=\"0\"]")
        .into_iter()
        .map(|item| parse_comment_item(item, 0))
        .collect()
}

fn parse_comment_item(item: ElementRef<'_>, indent: u32) -> ScrapeResult<Comment> {
    let id = item
        .attr("data-id")
        .map(str::to_owned)
        .ok_or_else(|| ScrapeError::structure(PARSER, "data-id"))?;

    // The item's own message block precedes any nested reply list, so the
    // first match in subtree order is always this comment's.
    let message = require_first(item, ".b-comment", PARSER)?;

    let author = optional_text(message, ".name").unwrap_or_default();
    let date = optional_text(message, ".date").unwrap_or_default();
    let avatar = optional_attr(message, ".ava img", "src").unwrap_or_default();

    let like = select_first(message, ".b-comment__like_it");
    let likes = like
        .and_then(|l| l.attr("data-likes_num"))
        .map(extract_digits)
        .unwrap_or(0);
    let self_liked = like
        .map(|l| l.attr("class").unwrap_or_default().contains("active"))
        .unwrap_or(false);

    let is_admin = message
        .attr("class")
        .unwrap_or_default()
        .contains("b-comment__admin");

    let delete_hash = optional_attr(message, ".actions .delete", "data-hash");

    let body_el = require_first(message, ".comment_text", PARSER)?;
    let mut body = BodyAccumulator::default();
    walk_body(body_el, &[], None, &mut body);

    // Replies of this comment are exactly the subtree items one indent
    // level deeper; resolve them before constructing the parent.
    let children = select_all(
        item,
        &format!(".comments-tree-item[data-indent=\"{}\"]", indent + 1),
    )
    .into_iter()
    .map(|child| parse_comment_item(child, indent + 1))
    .collect::<ScrapeResult<Vec<_>>>()?;

    Ok(Comment {
        id,
        date,
        author,
        avatar,
        body: StyledText {
            text: body.text,
            runs: body.runs,
        },
        spoilers: body.spoilers,
        children,
        likes,
        self_liked,
        likeable: like.is_some(),
        is_admin,
        delete_hash,
    })
}

#[derive(Default)]
struct BodyAccumulator {
    text: String,
    runs: Vec<StyleRun>,
    spoilers: Vec<TextRange>,
}

impl BodyAccumulator {
    fn append(&mut self, chunk: &str, styles: &[TextStyle]) {
        if chunk.is_empty() {
            return;
        }

        let start = self.text.len();
        self.text.push_str(chunk);

        for style in styles {
            self.runs.push(StyleRun {
                range: TextRange {
                    start,
                    len: chunk.len(),
                },
                style: style.clone(),
            });
        }
    }
}

/// Recursive walk with an immutable inherited style set. `link` carries the
/// (original, rewritten) pair of the innermost anchor so visible text equal
/// to the original target follows the host substitution.
fn walk_body(
    el: ElementRef<'_>,
    styles: &[TextStyle],
    link: Option<&(String, String)>,
    out: &mut BodyAccumulator,
) {
    for node in el.children() {
        if let Some(text) = node.value().as_text() {
            let mut chunk = normalize_inline_text(text, &out.text);
            if let Some((original, rewritten)) = link {
                if chunk.trim() == original {
                    chunk = rewritten.clone();
                }
            }
            out.append(&chunk, styles);
            continue;
        }

        let Some(child) = ElementRef::wrap(node) else {
            continue;
        };
        let element = child.value();

        if element.name() == "br" {
            out.text.push('\n');
            continue;
        }

        if element.classes().any(|c| c == "text_spoiler") {
            let start = out.text.len();
            walk_body(child, styles, link, out);
            out.spoilers.push(TextRange {
                start,
                len: out.text.len() - start,
            });
            continue;
        }

        let added = match element.name() {
            "b" | "strong" => Some(TextStyle::Bold),
            "i" | "em" => Some(TextStyle::Italic),
            "u" => Some(TextStyle::Underline),
            "s" | "del" | "strike" => Some(TextStyle::Strikethrough),
            "a" => element.attr("href").map(|href| {
                let rewritten = rewrite_mirror_link(href);
                TextStyle::Link(rewritten)
            }),
            _ => None,
        };

        match added {
            Some(style) => {
                let mut inherited = styles.to_vec();
                inherited.push(style.clone());

                let inner_link = if let TextStyle::Link(rewritten) = &style {
                    Some((element.attr("href").unwrap_or_default().to_owned(), rewritten.clone()))
                } else {
                    None
                };

                walk_body(child, &inherited, inner_link.as_ref().or(link), out);
            }
            None => walk_body(child, styles, link, out),
        }
    }
}

/// Link targets on the primary mirror are rewritten to the redirect host.
fn rewrite_mirror_link(href: &str) -> String {
    match url::Url::parse(href) {
        Ok(url) if url.host_str() == Some(MIRROR_HOST) => {
            href.replacen(MIRROR_HOST, REDIRECT_HOST, 1)
        }
        _ => href.to_owned(),
    }
}

/// Collapses whitespace runs the way a renderer would, keeping a single
/// boundary space between inline chunks.
fn normalize_inline_text(raw: &str, accumulated: &str) -> String {
    let collapsed = crate::utils::text::sanitize_text(raw);
    let boundary = accumulated.ends_with([' ', '\n']);

    if collapsed.is_empty() {
        // Whitespace-only node between inline elements still separates them.
        if !raw.is_empty() && !accumulated.is_empty() && !boundary {
            return " ".into();
        }
        return String::new();
    }

    let mut chunk = String::new();
    if raw.starts_with(char::is_whitespace) && !accumulated.is_empty() && !boundary {
        chunk.push(' ');
    }
    chunk.push_str(&collapsed);
    if raw.ends_with(char::is_whitespace) {
        chunk.push(' ');
    }
    chunk
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMENTS_PAGE: &str = r#"
    <ol class="comments-tree-list">
      <li class="comments-tree-item" data-indent="0" data-id="101">
        <div class="b-comment clearfix">
          <div class="ava"><img src="/i/u1.png" /></div>
          <div class="message">
            <span class="name">Алиса</span><span class="date">2 часа назад</span>
            <div class="text"><div class="comment_text">Сильный <b>финал</b>,<br>но <span class="text_spoiler">все умирают</span> увы</div></div>
            <span class="b-comment__like_it active" data-likes_num="12"></span>
            <div class="actions"><a class="delete" data-hash="d41d8cd9"></a></div>
          </div>
        </div>
        <ol class="comments-tree-list">
          <li class="comments-tree-item" data-indent="1" data-id="102">
            <div class="b-comment b-comment__admin">
              <div class="ava"><img src="/i/u2.png" /></div>
              <span class="name">Модератор</span><span class="date">час назад</span>
              <div class="text"><div class="comment_text">Спойлеры под кат</div></div>
            </div>
            <ol class="comments-tree-list">
              <li class="comments-tree-item" data-indent="2" data-id="103">
                <div class="b-comment">
                  <span class="name">Боб</span>
                  <div class="text"><div class="comment_text"><a href="https://rezka.ag/films/drama/1-x.html">https://rezka.ag/films/drama/1-x.html</a></div></div>
                </div>
              </li>
            </ol>
          </li>
          <li class="comments-tree-item" data-indent="1" data-id="104">
            <div class="b-comment">
              <span class="name">Ева</span>
              <div class="text"><div class="comment_text"><i>не</i> <s>соглашусь</s></div></div>
            </div>
          </li>
        </ol>
      </li>
    </ol>"#;

    #[test]
    fn should_build_tree_matching_indents() {
        let comments = parse_comments(COMMENTS_PAGE).unwrap();

        assert_eq!(comments.len(), 1);
        let root = &comments[0];
        assert_eq!(root.id, "101");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].id, "102");
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].id, "103");
        assert!(root.children[0].children[0].children.is_empty());
        assert_eq!(root.children[1].id, "104");
    }

    #[test]
    fn should_collect_metadata() {
        let comments = parse_comments(COMMENTS_PAGE).unwrap();
        let root = &comments[0];

        assert_eq!(root.author, "Алиса");
        assert_eq!(root.date, "2 часа назад");
        assert_eq!(root.avatar, "/i/u1.png");
        assert_eq!(root.likes, 12);
        assert!(root.self_liked);
        assert!(root.likeable);
        assert!(!root.is_admin);
        assert_eq!(root.delete_hash.as_deref(), Some("d41d8cd9"));

        let admin = &root.children[0];
        assert!(admin.is_admin);
        assert!(!admin.likeable);
        assert_eq!(admin.likes, 0);
    }

    #[test]
    fn body_styles_and_spoiler_ranges() {
        let comments = parse_comments(COMMENTS_PAGE).unwrap();
        let body = &comments[0].body;

        assert_eq!(body.text, "Сильный финал,\nно все умирают увы");

        let bold: Vec<_> = body
            .runs
            .iter()
            .filter(|r| r.style == TextStyle::Bold)
            .collect();
        assert_eq!(bold.len(), 1);
        assert_eq!(
            &body.text[bold[0].range.start..bold[0].range.start + bold[0].range.len],
            "финал"
        );

        let spoilers = &comments[0].spoilers;
        assert_eq!(spoilers.len(), 1);
        assert_eq!(
            &body.text[spoilers[0].start..spoilers[0].start + spoilers[0].len],
            "все умирают"
        );
        assert_eq!(spoilers[0].len, "все умирают".len());
    }

    #[test]
    fn mirror_links_are_substituted_in_href_and_text() {
        let comments = parse_comments(COMMENTS_PAGE).unwrap();
        let link_comment = &comments[0].children[0].children[0];

        assert_eq!(
            link_comment.body.text,
            "https://hdrezka.me/films/drama/1-x.html"
        );
        let link_run = link_comment
            .body
            .runs
            .iter()
            .find(|r| matches!(r.style, TextStyle::Link(_)))
            .unwrap();
        assert_eq!(
            link_run.style,
            TextStyle::Link("https://hdrezka.me/films/drama/1-x.html".into())
        );
    }

    #[test]
    fn inherited_styles_stack() {
        let comments = parse_comments(COMMENTS_PAGE).unwrap();
        let body = &comments[0].children[1].body;

        assert_eq!(body.text, "не соглашусь");
        assert!(body
            .runs
            .iter()
            .any(|r| r.style == TextStyle::Italic));
        assert!(body
            .runs
            .iter()
            .any(|r| r.style == TextStyle::Strikethrough));
    }

    #[test]
    fn missing_comment_id_is_a_hard_error() {
        let page = r#"<li class="comments-tree-item" data-indent="0">
          <div class="b-comment"><div class="comment_text">x</div></div></li>"#;

        assert!(matches!(
            parse_comments(page),
            Err(ScrapeError::Structure { .. })
        ));
    }
}
