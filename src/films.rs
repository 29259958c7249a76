use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, warn};

use crate::{
    entities::film,
    error::{CatalogueError, CatalogueResult},
    images::ImageStore,
    links::Link,
    models::{FilmDetail, FilmInput, FilmSummary, GenreRow, HomePage, UsageStat},
    reference,
    search::{self, Criteria, FilterRequest, Include, search_key},
};

const FEATURED_COUNT: u64 = 3;
const GENRE_ROW_COUNT: u64 = 15;
const LATEST_COUNT: u64 = 28;

#[derive(Clone, Debug)]
pub struct FilmStore {
    db: DatabaseConnection,
    images: ImageStore,
    max_results: u64,
}

impl FilmStore {
    pub fn new(db: DatabaseConnection, images: ImageStore, max_results: u64) -> Self {
        Self { db, images, max_results }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub async fn search(
        &self,
        request: &FilterRequest,
        include: Include,
    ) -> CatalogueResult<Vec<FilmSummary>> {
        search::search(&self.db, &self.images, request, self.max_results, include).await
    }

    pub async fn home(&self) -> CatalogueResult<HomePage> {
        let featured = film::Entity::find()
            .filter(film::Column::Boost.eq(true))
            .order_by_desc(film::Column::CreatedAt)
            .order_by_desc(film::Column::Id)
            .limit(FEATURED_COUNT)
            .all(&self.db)
            .await?;
        let featured = search::shape(&self.db, &self.images, featured, Include::DIRECTORS).await?;

        let mut by_genre = Vec::new();
        for genre in reference::list_genres(&self.db).await? {
            let films =
                search::find_films(&self.db, &Criteria::for_genre(genre.id), GENRE_ROW_COUNT)
                    .await?;
            if films.is_empty() {
                continue;
            }
            let films = search::shape(&self.db, &self.images, films, Include::NONE).await?;
            by_genre.push(GenreRow { genre, films });
        }

        let latest = search::find_films(&self.db, &Criteria::default(), LATEST_COUNT).await?;
        let latest = search::shape(&self.db, &self.images, latest, Include::DIRECTORS).await?;

        Ok(HomePage { featured, by_genre, latest })
    }

    pub async fn detail(&self, id: i32) -> CatalogueResult<FilmDetail> {
        let film = film::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CatalogueError::NotFound(id))?;

        let ids = [id];
        let mut directors = Link::Director.names_for(&self.db, &ids).await?;
        let mut countries = Link::Country.names_for(&self.db, &ids).await?;
        let mut genres = Link::Genre.names_for(&self.db, &ids).await?;
        let mut keywords = Link::Keyword.names_for(&self.db, &ids).await?;

        Ok(FilmDetail {
            image_url: self.images.url_for(film.image_url.as_deref()),
            directors: directors.remove(&id).unwrap_or_default(),
            countries: countries.remove(&id).unwrap_or_default(),
            genres: genres.remove(&id).unwrap_or_default(),
            keywords: keywords.remove(&id).unwrap_or_default(),
            film,
        })
    }

    pub async fn create(&self, input: FilmInput) -> CatalogueResult<i32> {
        let image_url = self.store_upload(&input).await?;

        match self.insert_film(&input, image_url.clone()).await {
            Ok(id) => {
                info!(film_id = id, title = %input.title, "film created");
                Ok(id)
            },
            Err(err) => {
                self.discard_upload(image_url.as_deref()).await;
                Err(err)
            },
        }
    }

    pub async fn update(&self, id: i32, input: FilmInput) -> CatalogueResult<()> {
        let existing = film::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CatalogueError::NotFound(id))?;

        let new_image = self.store_upload(&input).await?;

        if let Err(err) = self.update_film(existing.clone(), &input, new_image.clone()).await {
            self.discard_upload(new_image.as_deref()).await;
            return Err(err);
        }

        if let (Some(_), Some(old)) = (&new_image, &existing.image_url) {
            self.remove_image(old).await;
        }

        info!(film_id = id, "film updated");
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> CatalogueResult<()> {
        let existing = film::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CatalogueError::NotFound(id))?;

        let txn = self.db.begin().await?;
        for link in Link::ALL {
            link.clear(&txn, id).await?;
        }
        film::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        if let Some(reference) = &existing.image_url {
            self.remove_image(reference).await;
        }

        info!(film_id = id, title = %existing.title, "film deleted");
        Ok(())
    }

    pub async fn keyword_usage(&self) -> CatalogueResult<Vec<UsageStat>> {
        Ok(Link::Keyword.usage(&self.db).await?)
    }

    pub async fn genre_usage(&self) -> CatalogueResult<Vec<UsageStat>> {
        Ok(Link::Genre.usage(&self.db).await?)
    }

    async fn insert_film(
        &self,
        input: &FilmInput,
        image_url: Option<String>,
    ) -> CatalogueResult<i32> {
        let now = now_sec();
        let txn = self.db.begin().await?;

        let model = film::ActiveModel {
            id: Default::default(),
            title: Set(input.title.clone()),
            title_search: Set(search_key(&input.title)),
            description: Set(input.description.clone()),
            release_date: Set(input.release_date.clone()),
            language: Set(input.language.clone()),
            runtime: Set(input.runtime),
            image_url: Set(image_url),
            film_type: Set(input.film_type.clone()),
            boost: Set(input.boost),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        link_relations(&txn, model.id, input).await?;
        txn.commit().await?;
        Ok(model.id)
    }

    async fn update_film(
        &self,
        existing: film::Model,
        input: &FilmInput,
        new_image: Option<String>,
    ) -> CatalogueResult<()> {
        let id = existing.id;
        let txn = self.db.begin().await?;

        let mut model: film::ActiveModel = existing.into();
        model.title = Set(input.title.clone());
        model.title_search = Set(search_key(&input.title));
        model.description = Set(input.description.clone());
        model.release_date = Set(input.release_date.clone());
        model.language = Set(input.language.clone());
        model.runtime = Set(input.runtime);
        model.film_type = Set(input.film_type.clone());
        model.boost = Set(input.boost);
        model.updated_at = Set(now_sec());
        if let Some(reference) = new_image {
            model.image_url = Set(Some(reference));
        }
        model.update(&txn).await?;

        link_relations(&txn, id, input).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn store_upload(&self, input: &FilmInput) -> CatalogueResult<Option<String>> {
        match &input.image {
            Some(upload) => Ok(Some(self.images.put(&upload.file_name, &upload.bytes).await?)),
            None => Ok(None),
        }
    }

    /// Drops an image stored for a save that did not go through.
    async fn discard_upload(&self, reference: Option<&str>) {
        if let Some(reference) = reference {
            self.remove_image(reference).await;
        }
    }

    async fn remove_image(&self, reference: &str) {
        if let Err(err) = self.images.remove(reference).await {
            warn!(reference = %reference, error = %err, "failed to remove image");
        }
    }
}

async fn link_relations(
    txn: &DatabaseTransaction,
    film_id: i32,
    input: &FilmInput,
) -> CatalogueResult<()> {
    let relations = [
        (Link::Director, &input.directors),
        (Link::Country, &input.countries),
        (Link::Genre, &input.genres),
        (Link::Keyword, &input.keywords),
    ];
    for (link, names) in relations {
        let ids = link.ensure_named(txn, names).await?;
        link.replace(txn, film_id, &ids).await?;
    }
    Ok(())
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
