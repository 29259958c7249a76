//! Filter query compilation: turns a [`FilterRequest`] into the matching,
//! deduplicated and ordered list of films.
//!
//! Structured filters (country, genre, keyword set, director, year range,
//! type) are AND-ed together; an absent or unparseable field adds no
//! constraint. A free-text query goes through [`Strategy::TEXT_CASCADE`]: each
//! strategy narrows the structured conjunction further and the first one that
//! yields rows wins. Results of different strategies are never merged.

use std::collections::HashSet;

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, LikeExpr, SimpleExpr},
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    entities::{film, keyword},
    error::CatalogueResult,
    images::ImageStore,
    links::Link,
    models::FilmSummary,
};

const LIKE_ESCAPE: char = '!';

/// Raw search/filter criteria as submitted by the search form or the JSON
/// endpoint. Every field is optional and empty strings mean "absent".
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterRequest {
    pub query: Option<String>,
    pub country_id: Option<String>,
    pub genre_id: Option<String>,
    pub keyword_ids: Vec<String>,
    pub director_id: Option<String>,
    pub start_year: Option<String>,
    pub end_year: Option<String>,
    #[serde(rename = "type")]
    pub film_type: Option<String>,
}

/// Inclusive release-year bounds; either side may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct YearRange {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl YearRange {
    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Lexicographic `[lower, upper)` bounds on `release_date`. Dates start
    /// with their year, so `"1999-12-31" < "2000"`; the open defaults `"0"`
    /// and `":"` (the character after `'9'`) keep non-numeric dates out.
    pub fn bounds(&self) -> (String, String) {
        let lower = self.start.map(|y| format!("{y:04}")).unwrap_or_else(|| "0".into());
        let upper = self.end.map(|y| format!("{:04}", y + 1)).unwrap_or_else(|| ":".into());
        (lower, upper)
    }

    fn condition(&self) -> Option<Condition> {
        if self.is_open() {
            return None;
        }
        let (lower, upper) = self.bounds();
        Some(
            Condition::all()
                .add(film::Column::ReleaseDate.gte(lower))
                .add(film::Column::ReleaseDate.lt(upper)),
        )
    }
}

/// A [`FilterRequest`] after normalization: trimmed, parsed, with every
/// invalid value dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Criteria {
    pub text: Option<String>,
    pub country_id: Option<i32>,
    pub genre_id: Option<i32>,
    pub keyword_ids: Vec<i32>,
    pub director_id: Option<i32>,
    pub years: YearRange,
    pub film_type: Option<String>,
}

impl From<&FilterRequest> for Criteria {
    fn from(req: &FilterRequest) -> Self {
        let mut keyword_ids: Vec<i32> =
            req.keyword_ids.iter().filter_map(|raw| parse_id("keywordIds", Some(raw))).collect();
        keyword_ids.sort_unstable();
        keyword_ids.dedup();

        Self {
            text: present(req.query.as_deref()).map(str::to_string),
            country_id: parse_id("countryId", req.country_id.as_deref()),
            genre_id: parse_id("genreId", req.genre_id.as_deref()),
            keyword_ids,
            director_id: parse_id("directorId", req.director_id.as_deref()),
            years: YearRange {
                start: parse_year("startYear", req.start_year.as_deref()),
                end: parse_year("endYear", req.end_year.as_deref()),
            },
            film_type: present(req.film_type.as_deref()).map(str::to_string),
        }
    }
}

impl Criteria {
    pub fn for_genre(genre_id: i32) -> Self {
        Self { genre_id: Some(genre_id), ..Default::default() }
    }

    /// AND of every structured dimension that is present.
    fn structured(&self) -> Condition {
        Condition::all()
            .add_option(self.country_id.map(|id| Link::Country.films_linked_to([id])))
            .add_option(self.genre_id.map(|id| Link::Genre.films_linked_to([id])))
            .add_option(
                (!self.keyword_ids.is_empty())
                    .then(|| Link::Keyword.films_linked_to(self.keyword_ids.iter().copied())),
            )
            .add_option(self.director_id.map(|id| Link::Director.films_linked_to([id])))
            .add_option(self.years.condition())
            .add_option(self.film_type.clone().map(|t| film::Column::FilmType.eq(t)))
    }
}

/// Search strategies for the free-text box, tried in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    TitleMatch,
    KeywordMatch,
}

impl Strategy {
    pub const TEXT_CASCADE: [Strategy; 2] = [Strategy::TitleMatch, Strategy::KeywordMatch];

    /// Extra condition this strategy puts on films, or `None` when it cannot
    /// match anything at all.
    async fn narrow<C: ConnectionTrait>(
        self,
        db: &C,
        text: &str,
    ) -> CatalogueResult<Option<SimpleExpr>> {
        match self {
            Strategy::TitleMatch => Ok(Some(contains_ci(film::Column::TitleSearch, text))),
            Strategy::KeywordMatch => {
                let keyword_ids: Vec<i32> = keyword::Entity::find()
                    .select_only()
                    .column(keyword::Column::Id)
                    .filter(contains_ci(keyword::Column::NameSearch, text))
                    .into_tuple()
                    .all(db)
                    .await?;

                debug!(matched_keywords = keyword_ids.len(), "keyword lookup");
                if keyword_ids.is_empty() {
                    return Ok(None);
                }
                Ok(Some(Link::Keyword.films_linked_to(keyword_ids)))
            },
        }
    }
}

/// Films matching `criteria`, newest first, at most `limit` of them.
pub async fn find_films<C: ConnectionTrait>(
    db: &C,
    criteria: &Criteria,
    limit: u64,
) -> CatalogueResult<Vec<film::Model>> {
    let base = criteria.structured();

    let Some(text) = criteria.text.as_deref() else {
        return fetch(db, base, limit).await;
    };

    for strategy in Strategy::TEXT_CASCADE {
        let Some(narrowing) = strategy.narrow(db, text).await? else {
            debug!(?strategy, "strategy cannot match");
            continue;
        };
        let films = fetch(db, base.clone().add(narrowing), limit).await?;
        debug!(?strategy, matched = films.len(), "strategy finished");
        if !films.is_empty() {
            return Ok(films);
        }
    }

    Ok(Vec::new())
}

/// Which relations to attach to each summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Include {
    pub directors: bool,
    pub genres: bool,
    pub keywords: bool,
}

impl Include {
    pub const NONE: Include = Include { directors: false, genres: false, keywords: false };
    pub const DIRECTORS: Include = Include { directors: true, genres: false, keywords: false };
    pub const ALL: Include = Include { directors: true, genres: true, keywords: true };
}

/// Projects films into summaries, dropping repeated ids and keeping order.
pub async fn shape<C: ConnectionTrait>(
    db: &C,
    images: &ImageStore,
    mut films: Vec<film::Model>,
    include: Include,
) -> CatalogueResult<Vec<FilmSummary>> {
    let mut seen = HashSet::new();
    films.retain(|f| seen.insert(f.id));
    let ids: Vec<i32> = films.iter().map(|f| f.id).collect();

    let mut directors =
        if include.directors { Some(Link::Director.names_for(db, &ids).await?) } else { None };
    let mut genres =
        if include.genres { Some(Link::Genre.names_for(db, &ids).await?) } else { None };
    let mut keywords =
        if include.keywords { Some(Link::Keyword.names_for(db, &ids).await?) } else { None };

    Ok(films
        .into_iter()
        .map(|f| FilmSummary {
            id: f.id,
            image_url: images.url_for(f.image_url.as_deref()),
            directors: directors.as_mut().map(|m| m.remove(&f.id).unwrap_or_default()),
            genres: genres.as_mut().map(|m| m.remove(&f.id).unwrap_or_default()),
            keywords: keywords.as_mut().map(|m| m.remove(&f.id).unwrap_or_default()),
            title: f.title,
            release_date: f.release_date,
        })
        .collect())
}

/// Runs a full filter request: normalize, compile, execute, shape.
pub async fn search<C: ConnectionTrait>(
    db: &C,
    images: &ImageStore,
    request: &FilterRequest,
    limit: u64,
    include: Include,
) -> CatalogueResult<Vec<FilmSummary>> {
    let criteria = Criteria::from(request);
    let films = find_films(db, &criteria, limit).await?;
    shape(db, images, films, include).await
}

async fn fetch<C: ConnectionTrait>(
    db: &C,
    condition: Condition,
    limit: u64,
) -> CatalogueResult<Vec<film::Model>> {
    Ok(film::Entity::find()
        .filter(condition)
        .order_by_desc(film::Column::CreatedAt)
        .order_by_desc(film::Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

/// Folded form of a title or keyword name, stored next to it and matched by
/// free-text search. SQLite's `lower()` only folds ASCII, so folding happens
/// here on both sides.
pub fn search_key(text: &str) -> String {
    text.to_lowercase()
}

/// Case-insensitive substring match of `text` against a column holding
/// [`search_key`] values, with LIKE wildcards in `text` matched literally.
fn contains_ci<C: ColumnTrait>(folded_column: C, text: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&search_key(text)));
    Expr::col((folded_column.entity_name(), folded_column))
        .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id(field: &str, raw: Option<&str>) -> Option<i32> {
    let raw = present(raw)?;
    match raw.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            debug!(field, value = raw, "ignoring invalid filter value");
            None
        },
    }
}

fn parse_year(field: &str, raw: Option<&str>) -> Option<i32> {
    let raw = present(raw)?;
    match raw.parse::<i32>() {
        Ok(year) if (1..=9998).contains(&year) => Some(year),
        _ => {
            debug!(field, value = raw, "ignoring invalid filter value");
            None
        },
    }
}

/// Year a release date starts with, if it starts with four digits. Read the
/// same way as the year bounds compare, so a year listed here always filters.
pub fn year_of(release_date: &str) -> Option<i32> {
    let head = release_date.get(..4)?;
    if head.bytes().all(|b| b.is_ascii_digit()) { head.parse().ok() } else { None }
}
