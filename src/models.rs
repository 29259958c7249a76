use serde::Serialize;

use crate::{entities::film, error::CatalogueError};

/// An `(id, name)` row from one of the reference tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}

/// Display-ready projection of a film returned by searches and listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilmSummary {
    pub id: i32,
    pub title: String,
    pub image_url: String,
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<NamedRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<NamedRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directors: Option<Vec<NamedRef>>,
}

#[derive(Clone, Debug)]
pub struct FilmDetail {
    pub film: film::Model,
    pub image_url: String,
    pub directors: Vec<NamedRef>,
    pub countries: Vec<NamedRef>,
    pub genres: Vec<NamedRef>,
    pub keywords: Vec<NamedRef>,
}

#[derive(Clone, Debug)]
pub struct GenreRow {
    pub genre: NamedRef,
    pub films: Vec<FilmSummary>,
}

#[derive(Clone, Debug)]
pub struct HomePage {
    pub featured: Vec<FilmSummary>,
    pub by_genre: Vec<GenreRow>,
    pub latest: Vec<FilmSummary>,
}

/// How many films link to one genre or keyword.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, sea_orm::FromQueryResult)]
pub struct UsageStat {
    pub id: i32,
    pub name: String,
    pub films: i64,
}

#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Validated input of the admin create/edit form.
#[derive(Clone, Debug, Default)]
pub struct FilmInput {
    pub title: String,
    pub description: Option<String>,
    pub release_date: Option<String>,
    pub language: Option<String>,
    pub runtime: Option<i32>,
    pub film_type: Option<String>,
    pub boost: bool,
    pub directors: Vec<String>,
    pub countries: Vec<String>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    pub image: Option<ImageUpload>,
}

impl FilmInput {
    /// Builds the input from raw form fields. Relation fields hold
    /// comma-separated names.
    pub fn from_fields<'a>(
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
        image: Option<ImageUpload>,
    ) -> Result<Self, CatalogueError> {
        let mut input = FilmInput { image, ..Default::default() };

        for (name, value) in fields {
            match name {
                "title" => input.title = value.trim().to_string(),
                "description" => input.description = non_blank(value),
                "release_date" => input.release_date = non_blank(value),
                "language" => input.language = non_blank(value),
                "film_type" => input.film_type = non_blank(value),
                "runtime" => {
                    input.runtime = non_blank(value)
                        .map(|raw| raw.parse::<i32>())
                        .transpose()
                        .map_err(|_| {
                            CatalogueError::Invalid("runtime must be a number of minutes".into())
                        })?;
                },
                "boost" => input.boost = matches!(value, "on" | "true" | "1"),
                "directors" => input.directors = split_names(value),
                "countries" => input.countries = split_names(value),
                "genres" => input.genres = split_names(value),
                "keywords" => input.keywords = split_names(value),
                _ => {},
            }
        }

        if input.title.is_empty() {
            return Err(CatalogueError::Invalid("title is required".into()));
        }
        Ok(input)
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Splits a comma-separated list, dropping blanks and repeated names while
/// keeping the first-seen order.
pub fn split_names(value: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_form() {
        let input = FilmInput::from_fields(
            [
                ("title", "  L'amour fou "),
                ("release_date", "1969-01-15"),
                ("runtime", "252"),
                ("boost", "on"),
                ("directors", "Jacques Rivette"),
                ("genres", "Drama, Romance, drama"),
                ("keywords", " theatre ,, rehearsal "),
                ("description", "   "),
            ],
            None,
        )
        .unwrap();

        assert_eq!(input.title, "L'amour fou");
        assert_eq!(input.runtime, Some(252));
        assert!(input.boost);
        assert_eq!(input.directors, vec!["Jacques Rivette"]);
        assert_eq!(input.genres, vec!["Drama", "Romance", "drama"]);
        assert_eq!(input.keywords, vec!["theatre", "rehearsal"]);
        assert_eq!(input.description, None);
    }

    #[test]
    fn missing_title_is_rejected() {
        let err = FilmInput::from_fields([("title", "   ")], None).unwrap_err();
        assert!(matches!(err, CatalogueError::Invalid(_)));
    }

    #[test]
    fn non_numeric_runtime_is_rejected_but_blank_is_absent() {
        let err = FilmInput::from_fields([("title", "x"), ("runtime", "long")], None).unwrap_err();
        assert!(matches!(err, CatalogueError::Invalid(_)));

        let input = FilmInput::from_fields([("title", "x"), ("runtime", " ")], None).unwrap();
        assert_eq!(input.runtime, None);
    }

    #[test]
    fn summary_serializes_camel_case_and_skips_absent_relations() {
        let summary = FilmSummary {
            id: 7,
            title: "Foo".into(),
            image_url: "/images/foo.jpg".into(),
            release_date: Some("2001".into()),
            genres: None,
            keywords: Some(vec![NamedRef { id: 1, name: "xyz123-core".into() }]),
            directors: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["imageUrl"], "/images/foo.jpg");
        assert_eq!(json["releaseDate"], "2001");
        assert_eq!(json["keywords"][0]["name"], "xyz123-core");
        assert!(json.get("genres").is_none());
    }
}
