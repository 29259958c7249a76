use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250301_000001_create_catalogue::{Countries, Directors, Films, Genres, Keywords};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_link(
            manager,
            "idx_film_genres_genre_id",
            FilmGenres::Table,
            FilmGenres::GenreId,
            Genres::Table,
            Genres::Id,
        )
        .await?;
        create_link(
            manager,
            "idx_film_keywords_keyword_id",
            FilmKeywords::Table,
            FilmKeywords::KeywordId,
            Keywords::Table,
            Keywords::Id,
        )
        .await?;
        create_link(
            manager,
            "idx_film_directors_director_id",
            FilmDirectors::Table,
            FilmDirectors::DirectorId,
            Directors::Table,
            Directors::Id,
        )
        .await?;
        create_link(
            manager,
            "idx_film_countries_country_id",
            FilmCountries::Table,
            FilmCountries::CountryId,
            Countries::Table,
            Countries::Id,
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(FilmCountries::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmDirectors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmKeywords::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmGenres::Table).to_owned()).await?;
        Ok(())
    }
}

/// Creates a `(film_id, <target>_id)` link table with a composite primary key,
/// cascading deletes from both sides and an index on the target column.
async fn create_link<T, C, R, K>(
    manager: &SchemaManager<'_>,
    index_name: &str,
    table: T,
    target_col: C,
    target_table: R,
    target_key: K,
) -> Result<(), DbErr>
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
    R: IntoIden + 'static,
    K: IntoIden + 'static,
{
    let table = table.into_iden();
    let target_col = target_col.into_iden();
    let film_col = Alias::new("film_id").into_iden();

    manager
        .create_table(
            Table::create()
                .table(table.clone())
                .if_not_exists()
                .col(integer(film_col.clone()))
                .col(integer(target_col.clone()))
                .primary_key(Index::create().col(film_col.clone()).col(target_col.clone()))
                .foreign_key(
                    ForeignKey::create()
                        .from(table.clone(), film_col.clone())
                        .to(Films::Table, Films::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .from(table.clone(), target_col.clone())
                        .to(target_table, target_key)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(index_name)
                .table(table)
                .col(target_col)
                .to_owned(),
        )
        .await?;

    Ok(())
}

#[derive(DeriveIden)]
enum FilmGenres {
    Table,
    GenreId,
}

#[derive(DeriveIden)]
enum FilmKeywords {
    Table,
    KeywordId,
}

#[derive(DeriveIden)]
enum FilmDirectors {
    Table,
    DirectorId,
}

#[derive(DeriveIden)]
enum FilmCountries {
    Table,
    CountryId,
}
