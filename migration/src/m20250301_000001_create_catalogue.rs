use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Films::Table)
                    .if_not_exists()
                    .col(pk_auto(Films::Id))
                    .col(string(Films::Title))
                    .col(string(Films::TitleSearch))
                    .col(text_null(Films::Description))
                    .col(string_null(Films::ReleaseDate))
                    .col(string_null(Films::Language))
                    .col(integer_null(Films::Runtime))
                    .col(string_null(Films::ImageUrl))
                    .col(string_null(Films::FilmType))
                    .col(boolean(Films::Boost).default(false))
                    .col(big_integer(Films::CreatedAt))
                    .col(big_integer(Films::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_created_at")
                    .table(Films::Table)
                    .col(Films::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_boost")
                    .table(Films::Table)
                    .col(Films::Boost)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Directors::Table)
                    .if_not_exists()
                    .col(pk_auto(Directors::Id))
                    .col(string_uniq(Directors::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Countries::Table)
                    .if_not_exists()
                    .col(pk_auto(Countries::Id))
                    .col(string_uniq(Countries::Name))
                    .col(string_null(Countries::Code))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string_uniq(Genres::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Keywords::Table)
                    .if_not_exists()
                    .col(pk_auto(Keywords::Id))
                    .col(string_uniq(Keywords::Name))
                    .col(string(Keywords::NameSearch))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Keywords::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Countries::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Directors::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Films::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Films {
    Table,
    Id,
    Title,
    /// Unicode-lowercased title, matched by free-text search.
    TitleSearch,
    Description,
    ReleaseDate,
    Language,
    Runtime,
    ImageUrl,
    FilmType,
    Boost,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Directors {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Countries {
    Table,
    Id,
    Name,
    Code,
}

#[derive(DeriveIden)]
pub(crate) enum Genres {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Keywords {
    Table,
    Id,
    Name,
    NameSearch,
}
