//! Many-to-many traversal between films and their genres, keywords, directors
//! and countries.
//!
//! Every relation is a `(film_id, <target>_id)` link table next to an
//! `(id, name)` target table, so a single [`Link`] value describes the whole
//! traversal in either direction.

use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, FromQueryResult,
    sea_query::{Alias, DynIden, Expr, IntoIden, Order, Query, SelectStatement, SimpleExpr},
};
use tracing::debug;

use crate::{
    entities::{
        country, director, film, film_country, film_director, film_genre, film_keyword, genre,
        keyword,
    },
    models::{NamedRef, UsageStat},
    search::search_key,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Link {
    Genre,
    Keyword,
    Director,
    Country,
}

struct Tables {
    link: DynIden,
    film_col: DynIden,
    target_col: DynIden,
    target: DynIden,
    target_id: DynIden,
    target_name: DynIden,
    /// Folded copy of the name, for targets that free text can match.
    target_search: Option<DynIden>,
}

#[derive(Debug, FromQueryResult)]
struct LinkedName {
    film_id: i32,
    id: i32,
    name: String,
}

#[derive(Debug, FromQueryResult)]
struct LinkedId {
    target_id: i32,
}

impl Link {
    pub const ALL: [Link; 4] = [Link::Genre, Link::Keyword, Link::Director, Link::Country];

    fn tables(self) -> Tables {
        match self {
            Link::Genre => Tables {
                link: film_genre::Entity.into_iden(),
                film_col: film_genre::Column::FilmId.into_iden(),
                target_col: film_genre::Column::GenreId.into_iden(),
                target: genre::Entity.into_iden(),
                target_id: genre::Column::Id.into_iden(),
                target_name: genre::Column::Name.into_iden(),
                target_search: None,
            },
            Link::Keyword => Tables {
                link: film_keyword::Entity.into_iden(),
                film_col: film_keyword::Column::FilmId.into_iden(),
                target_col: film_keyword::Column::KeywordId.into_iden(),
                target: keyword::Entity.into_iden(),
                target_id: keyword::Column::Id.into_iden(),
                target_name: keyword::Column::Name.into_iden(),
                target_search: Some(keyword::Column::NameSearch.into_iden()),
            },
            Link::Director => Tables {
                link: film_director::Entity.into_iden(),
                film_col: film_director::Column::FilmId.into_iden(),
                target_col: film_director::Column::DirectorId.into_iden(),
                target: director::Entity.into_iden(),
                target_id: director::Column::Id.into_iden(),
                target_name: director::Column::Name.into_iden(),
                target_search: None,
            },
            Link::Country => Tables {
                link: film_country::Entity.into_iden(),
                film_col: film_country::Column::FilmId.into_iden(),
                target_col: film_country::Column::CountryId.into_iden(),
                target: country::Entity.into_iden(),
                target_id: country::Column::Id.into_iden(),
                target_name: country::Column::Name.into_iden(),
                target_search: None,
            },
        }
    }

    /// Ids of films linked to any of `target_ids`, as a subquery.
    pub fn film_ids_linked_to(self, target_ids: impl IntoIterator<Item = i32>) -> SelectStatement {
        let t = self.tables();
        Query::select()
            .column((t.link.clone(), t.film_col))
            .from(t.link.clone())
            .and_where(Expr::col((t.link, t.target_col)).is_in(target_ids))
            .to_owned()
    }

    /// Condition on `films.id` matching films linked to any of `target_ids`.
    /// An `IN` over the link table never yields the same film twice, however
    /// many of the ids it links to.
    pub fn films_linked_to(self, target_ids: impl IntoIterator<Item = i32>) -> SimpleExpr {
        film::Column::Id.in_subquery(self.film_ids_linked_to(target_ids))
    }

    /// Names linked to each of `film_ids`, sorted by name.
    pub async fn names_for<C: ConnectionTrait>(
        self,
        db: &C,
        film_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<NamedRef>>, DbErr> {
        let mut out: HashMap<i32, Vec<NamedRef>> = HashMap::new();
        if film_ids.is_empty() {
            return Ok(out);
        }

        let t = self.tables();
        let stmt = Query::select()
            .expr_as(Expr::col((t.link.clone(), t.film_col.clone())), Alias::new("film_id"))
            .expr_as(Expr::col((t.target.clone(), t.target_id.clone())), Alias::new("id"))
            .expr_as(Expr::col((t.target.clone(), t.target_name.clone())), Alias::new("name"))
            .from(t.link.clone())
            .inner_join(
                t.target.clone(),
                Expr::col((t.target.clone(), t.target_id.clone()))
                    .equals((t.link.clone(), t.target_col)),
            )
            .and_where(Expr::col((t.link, t.film_col)).is_in(film_ids.iter().copied()))
            .order_by((t.target.clone(), t.target_name), Order::Asc)
            .order_by((t.target, t.target_id), Order::Asc)
            .to_owned();

        let rows = LinkedName::find_by_statement(db.get_database_backend().build(&stmt))
            .all(db)
            .await?;

        for row in rows {
            out.entry(row.film_id).or_default().push(NamedRef { id: row.id, name: row.name });
        }
        Ok(out)
    }

    /// Target ids currently linked to one film.
    pub async fn linked_ids<C: ConnectionTrait>(
        self,
        db: &C,
        film_id: i32,
    ) -> Result<BTreeSet<i32>, DbErr> {
        let t = self.tables();
        let stmt = Query::select()
            .expr_as(Expr::col(t.target_col), Alias::new("target_id"))
            .from(t.link)
            .and_where(Expr::col(t.film_col).eq(film_id))
            .to_owned();

        let rows =
            LinkedId::find_by_statement(db.get_database_backend().build(&stmt)).all(db).await?;
        Ok(rows.into_iter().map(|r| r.target_id).collect())
    }

    /// Ids of the named targets, creating the missing ones. Ids come back in
    /// the order of `names`.
    pub async fn ensure_named<C: ConnectionTrait>(
        self,
        db: &C,
        names: &[String],
    ) -> Result<Vec<i32>, DbErr> {
        let t = self.tables();
        let backend = db.get_database_backend();
        let mut ids = Vec::with_capacity(names.len());

        for name in names {
            let find = Query::select()
                .column(t.target_id.clone())
                .from(t.target.clone())
                .and_where(Expr::col(t.target_name.clone()).eq(name.as_str()))
                .limit(1)
                .to_owned();

            let row = match db.query_one(backend.build(&find)).await? {
                Some(row) => row,
                None => {
                    let mut columns = vec![t.target_name.clone()];
                    let mut values: Vec<SimpleExpr> = vec![name.as_str().into()];
                    if let Some(search) = &t.target_search {
                        columns.push(search.clone());
                        values.push(search_key(name).into());
                    }

                    let mut insert = Query::insert();
                    insert
                        .into_table(t.target.clone())
                        .columns(columns)
                        .values(values)
                        .map_err(|e| DbErr::Custom(e.to_string()))?;
                    insert.returning_col(t.target_id.clone());

                    debug!(link = ?self, name = %name, "creating reference row");
                    db.query_one(backend.build(&insert)).await?.ok_or(DbErr::RecordNotInserted)?
                },
            };
            ids.push(row.try_get::<i32>("", "id")?);
        }

        Ok(ids)
    }

    /// Makes the film's links match `wanted`, touching only the rows that
    /// differ.
    pub async fn replace<C: ConnectionTrait>(
        self,
        db: &C,
        film_id: i32,
        wanted: &[i32],
    ) -> Result<(), DbErr> {
        let current = self.linked_ids(db, film_id).await?;
        let (added, removed) = diff_links(&current, wanted);
        if added.is_empty() && removed.is_empty() {
            return Ok(());
        }

        let t = self.tables();
        let backend = db.get_database_backend();

        if !removed.is_empty() {
            let delete = Query::delete()
                .from_table(t.link.clone())
                .and_where(Expr::col(t.film_col.clone()).eq(film_id))
                .and_where(Expr::col(t.target_col.clone()).is_in(removed.iter().copied()))
                .to_owned();
            db.execute(backend.build(&delete)).await?;
        }

        if !added.is_empty() {
            let mut insert = Query::insert();
            insert.into_table(t.link).columns([t.film_col, t.target_col]);
            for id in &added {
                insert
                    .values([film_id.into(), (*id).into()])
                    .map_err(|e| DbErr::Custom(e.to_string()))?;
            }
            db.execute(backend.build(&insert)).await?;
        }

        debug!(link = ?self, film_id, added = added.len(), removed = removed.len(), "links reconciled");
        Ok(())
    }

    /// Drops every link of one film.
    pub async fn clear<C: ConnectionTrait>(self, db: &C, film_id: i32) -> Result<(), DbErr> {
        let t = self.tables();
        let delete = Query::delete()
            .from_table(t.link)
            .and_where(Expr::col(t.film_col).eq(film_id))
            .to_owned();
        db.execute(db.get_database_backend().build(&delete)).await?;
        Ok(())
    }

    /// Number of films per target, most used first; unused targets count 0.
    pub async fn usage<C: ConnectionTrait>(self, db: &C) -> Result<Vec<UsageStat>, DbErr> {
        let t = self.tables();
        let films = Alias::new("films");
        let stmt = Query::select()
            .expr_as(Expr::col((t.target.clone(), t.target_id.clone())), Alias::new("id"))
            .expr_as(Expr::col((t.target.clone(), t.target_name.clone())), Alias::new("name"))
            .expr_as(Expr::col((t.link.clone(), t.film_col)).count(), films.clone())
            .from(t.target.clone())
            .left_join(
                t.link.clone(),
                Expr::col((t.link, t.target_col)).equals((t.target.clone(), t.target_id.clone())),
            )
            .group_by_col((t.target.clone(), t.target_id.clone()))
            .group_by_col((t.target.clone(), t.target_name.clone()))
            .order_by(films, Order::Desc)
            .order_by((t.target, t.target_name), Order::Asc)
            .to_owned();

        UsageStat::find_by_statement(db.get_database_backend().build(&stmt)).all(db).await
    }
}

/// Splits the difference between the current and wanted link targets into
/// `(to_insert, to_delete)`. Repeated wanted ids are inserted once.
pub fn diff_links(current: &BTreeSet<i32>, wanted: &[i32]) -> (Vec<i32>, Vec<i32>) {
    let wanted: BTreeSet<i32> = wanted.iter().copied().collect();
    let added = wanted.difference(current).copied().collect();
    let removed = current.difference(&wanted).copied().collect();
    (added, removed)
}
