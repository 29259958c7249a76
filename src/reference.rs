//! Lookup tables that populate the search form controls.

use std::collections::BTreeSet;

use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder, QuerySelect};

use crate::{
    entities::{country, director, film, genre, keyword},
    error::CatalogueResult,
    models::NamedRef,
    search::year_of,
};

/// Everything the search form needs, loaded in one go.
#[derive(Clone, Debug, Default)]
pub struct FilterOptions {
    pub countries: Vec<NamedRef>,
    pub genres: Vec<NamedRef>,
    pub keywords: Vec<NamedRef>,
    pub directors: Vec<NamedRef>,
    pub years: Vec<i32>,
}

pub async fn list_countries<C: ConnectionTrait>(db: &C) -> CatalogueResult<Vec<NamedRef>> {
    let rows = country::Entity::find().order_by_asc(country::Column::Name).all(db).await?;
    Ok(rows.into_iter().map(|c| NamedRef { id: c.id, name: c.name }).collect())
}

pub async fn list_genres<C: ConnectionTrait>(db: &C) -> CatalogueResult<Vec<NamedRef>> {
    let rows = genre::Entity::find().order_by_asc(genre::Column::Name).all(db).await?;
    Ok(rows.into_iter().map(|g| NamedRef { id: g.id, name: g.name }).collect())
}

pub async fn list_keywords<C: ConnectionTrait>(db: &C) -> CatalogueResult<Vec<NamedRef>> {
    let rows = keyword::Entity::find().order_by_asc(keyword::Column::Name).all(db).await?;
    Ok(rows.into_iter().map(|k| NamedRef { id: k.id, name: k.name }).collect())
}

pub async fn list_directors<C: ConnectionTrait>(db: &C) -> CatalogueResult<Vec<NamedRef>> {
    let rows = director::Entity::find().order_by_asc(director::Column::Name).all(db).await?;
    Ok(rows.into_iter().map(|d| NamedRef { id: d.id, name: d.name }).collect())
}

/// Distinct years found at the start of release dates, newest first.
pub async fn list_release_years<C: ConnectionTrait>(db: &C) -> CatalogueResult<Vec<i32>> {
    let dates: Vec<Option<String>> = film::Entity::find()
        .select_only()
        .column(film::Column::ReleaseDate)
        .distinct()
        .into_tuple()
        .all(db)
        .await?;

    let years: BTreeSet<i32> = dates.iter().flatten().filter_map(|d| year_of(d)).collect();
    Ok(years.into_iter().rev().collect())
}

pub async fn filter_options<C: ConnectionTrait>(db: &C) -> CatalogueResult<FilterOptions> {
    let (countries, genres, keywords, directors, years) = futures::try_join!(
        list_countries(db),
        list_genres(db),
        list_keywords(db),
        list_directors(db),
        list_release_years(db),
    )?;
    Ok(FilterOptions { countries, genres, keywords, directors, years })
}
