use indexmap::IndexMap;
use url::Url;

// Catalog cards

#[derive(Debug, Clone, PartialEq)]
pub struct MovieSimple {
    /// Path-like key (`type/genre/slug`) addressing the detail page.
    pub id: String,
    pub name: String,
    pub details: String,
    pub poster: String,
    pub category: Option<MovieCategory>,
    pub status: Option<ReleaseStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Film,
    Series,
    Cartoon,
    Anime,
    Show,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCategory {
    pub kind: CategoryKind,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStatus {
    Completed,
    Awaiting,
    Ongoing { season: u32, episode: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieCollection {
    pub id: String,
    pub name: String,
    pub poster: String,
    pub count: u32,
}

// Detail page

#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetailed {
    pub id: String,
    pub name: String,
    pub original_name: Option<String>,
    pub poster: String,
    pub hposter: String,
    pub description: Option<String>,
    pub rating_summary: Option<String>,
    pub ratings: Vec<RatingSource>,
    pub release_date: Option<String>,
    pub year: Option<u32>,
    pub countries: Vec<String>,
    pub genres: Vec<String>,
    pub age_rating: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub tagline: Option<String>,
    pub directors: Vec<PersonSimple>,
    pub actors: Vec<PersonSimple>,
    pub lists: Vec<MovieListMembership>,
    pub collections: Vec<MovieListMembership>,
    pub franchise: Vec<FranchisePart>,
    pub schedule: Vec<ScheduleGroup>,
    pub translations: Option<MovieTranslations>,
    pub seasons: Vec<MovieSeason>,
    pub comments_count: u32,
    pub available: bool,
    pub coming_soon: bool,
    /// Server-issued token required by favorites API calls.
    pub favs_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatingSource {
    pub name: String,
    pub value: f64,
    /// Vote count exactly as printed by the source, e.g. "12 345".
    pub votes: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieListMembership {
    pub id: String,
    pub name: String,
    /// 1-based position inside the list, when the source prints one.
    pub position: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FranchisePart {
    pub id: String,
    pub name: String,
    pub year: Option<String>,
    pub rating: Option<f64>,
    /// Marks the part whose page the franchise block was scraped from.
    pub current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGroup {
    pub name: String,
    pub items: Vec<ScheduleItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleItem {
    pub episode: String,
    pub title: String,
    pub original_title: Option<String>,
    pub date: Option<String>,
    pub released: bool,
}

/// Which page shape the voice-track list was recovered from.
///
/// The static translator list gives the full set. Pages without it only
/// reveal the server-selected track through an embedded JS event call, so a
/// single entry is synthesized and the rest of the set is unknown.
#[derive(Debug, Clone, PartialEq)]
pub enum MovieTranslations {
    FullList(Vec<MovieVoiceActing>),
    SingleInferred(MovieVoiceActing),
}

impl MovieTranslations {
    pub fn tracks(&self) -> &[MovieVoiceActing] {
        match self {
            MovieTranslations::FullList(tracks) => tracks,
            MovieTranslations::SingleInferred(track) => std::slice::from_ref(track),
        }
    }

    pub fn selected(&self) -> Option<&MovieVoiceActing> {
        self.tracks().iter().find(|t| t.selected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieVoiceActing {
    pub id: String,
    pub name: String,
    pub is_camrip: bool,
    pub is_ads: bool,
    pub is_director: bool,
    pub is_premium: bool,
    pub selected: bool,
    pub deep_link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieSeason {
    pub id: String,
    pub name: String,
    pub selected: bool,
    pub episodes: Vec<MovieEpisode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieEpisode {
    pub id: String,
    pub name: String,
    pub selected: bool,
    pub deep_link: Option<String>,
}

// Streams

#[derive(Debug, Clone, PartialEq)]
pub struct MovieVideo {
    /// Quality label to URL, in source order. `None` means the quality is
    /// advertised by the server but has no link right now.
    pub qualities: IndexMap<String, Option<Url>>,
    /// Candidates rejected by the mp4/remote-file sanity check. Kept so
    /// callers can show the quality as unavailable instead of hiding it.
    pub skipped: Vec<SkippedLink>,
    pub subtitles: Vec<MovieSubtitles>,
    pub need_premium: bool,
    pub thumbnails: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    pub quality: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieSubtitles {
    pub name: String,
    pub link: String,
    pub lang: String,
}

// Thumbnail / caption cues

#[derive(Debug, Clone, PartialEq)]
pub struct WebVtt {
    pub cues: Vec<Cue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub image: Option<String>,
    pub rect: Option<CropRect>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

// Comments

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub date: String,
    pub author: String,
    pub avatar: String,
    pub body: StyledText,
    pub spoilers: Vec<TextRange>,
    pub children: Vec<Comment>,
    pub likes: u32,
    pub self_liked: bool,
    pub likeable: bool,
    pub is_admin: bool,
    pub delete_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    pub text: String,
    pub runs: Vec<StyleRun>,
}

/// Byte range into [`StyledText::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRun {
    pub range: TextRange,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link(String),
}

// People

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonSimple {
    pub id: String,
    pub name: String,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonDetailed {
    pub id: String,
    pub name: String,
    pub original_name: Option<String>,
    pub photo: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub height: Option<String>,
    pub careers: Vec<PersonCareer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonCareer {
    pub name: String,
    pub movies: Vec<MovieSimple>,
}
