//! Shared fixture for the integration tests: an in-memory catalogue, a
//! temporary image directory and the full router on top of them.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use cinematheque::{
    AppState, build_state,
    config::Config,
    entities::film,
    films::FilmStore,
    links::Link,
    router,
    search::search_key,
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, Set};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "let-me-in";

/// A film to insert directly, bypassing the admin form.
#[derive(Clone, Debug, Default)]
pub struct SeedFilm {
    pub title: &'static str,
    pub release_date: Option<&'static str>,
    pub film_type: Option<&'static str>,
    pub boost: bool,
    pub created_at: i64,
    pub genres: Vec<&'static str>,
    pub keywords: Vec<&'static str>,
    pub directors: Vec<&'static str>,
    pub countries: Vec<&'static str>,
}

impl SeedFilm {
    pub fn new(title: &'static str, created_at: i64) -> Self {
        Self { title, created_at, ..Default::default() }
    }

    pub fn released(mut self, date: &'static str) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn genres(mut self, names: &[&'static str]) -> Self {
        self.genres = names.to_vec();
        self
    }

    pub fn keywords(mut self, names: &[&'static str]) -> Self {
        self.keywords = names.to_vec();
        self
    }

    pub fn directors(mut self, names: &[&'static str]) -> Self {
        self.directors = names.to_vec();
        self
    }

    pub fn countries(mut self, names: &[&'static str]) -> Self {
        self.countries = names.to_vec();
        self
    }

    pub fn kind(mut self, film_type: &'static str) -> Self {
        self.film_type = Some(film_type);
        self
    }

    pub fn boosted(mut self) -> Self {
        self.boost = true;
        self
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is not JSON")
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    pub image_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_max_results(101).await
    }

    pub async fn with_max_results(max_results: u64) -> Self {
        Self::with_env(&[("SEARCH_MAX_RESULTS", &max_results.to_string())]).await
    }

    /// Fixture with some environment values replaced.
    pub async fn with_env(overrides: &[(&str, &str)]) -> Self {
        let image_dir = TempDir::new().expect("failed to create image dir");
        let root = image_dir.path().to_string_lossy().into_owned();
        let defaults = [
            ("DATABASE_URL", "sqlite::memory:".to_string()),
            ("IMAGE_DIR", root),
            ("IMAGE_BASE_URL", "/images".to_string()),
            ("PLACEHOLDER_IMAGE_URL", "/placeholder.png".to_string()),
            ("ADMIN_PASSWORD", ADMIN_PASSWORD.to_string()),
            ("SESSION_SECRET", "0123456789abcdef0123456789abcdef".to_string()),
            ("LOGIN_ATTEMPTS_PER_MINUTE", "3".to_string()),
        ];
        let config = Config::from_lookup(|key| {
            overrides
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
                .or_else(|| defaults.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone()))
        })
        .expect("test config is valid");

        let state = build_state(config).await.expect("failed to build state");
        let router = router(state.clone());
        Self { state, router, image_dir }
    }

    pub fn store(&self) -> &FilmStore {
        &self.state.films
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.state.films.db()
    }

    /// Inserts a film with a fixed creation time and links it by name.
    pub async fn seed(&self, seed: SeedFilm) -> i32 {
        let model = film::ActiveModel {
            id: Default::default(),
            title: Set(seed.title.to_string()),
            title_search: Set(search_key(seed.title)),
            description: Set(None),
            release_date: Set(seed.release_date.map(str::to_string)),
            language: Set(None),
            runtime: Set(None),
            image_url: Set(None),
            film_type: Set(seed.film_type.map(str::to_string)),
            boost: Set(seed.boost),
            created_at: Set(seed.created_at),
            updated_at: Set(seed.created_at),
        }
        .insert(self.db())
        .await
        .expect("failed to insert film");

        let relations = [
            (Link::Genre, &seed.genres),
            (Link::Keyword, &seed.keywords),
            (Link::Director, &seed.directors),
            (Link::Country, &seed.countries),
        ];
        for (link, names) in relations {
            let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
            let ids = link.ensure_named(self.db(), &names).await.expect("failed to name targets");
            link.replace(self.db(), model.id, &ids).await.expect("failed to link film");
        }
        model.id
    }

    /// Breaks the store underneath the app by dropping one of its tables.
    pub async fn drop_table(&self, table: &str) {
        self.db()
            .execute_unprepared(&format!("DROP TABLE {table}"))
            .await
            .expect("failed to drop table");
    }

    /// Names of the files currently in the image directory, sorted.
    pub fn image_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.image_dir.path())
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Id of an existing genre, keyword, director or country by name.
    pub async fn id_of(&self, link: Link, name: &str) -> i32 {
        let ids = link.ensure_named(self.db(), &[name.to_string()]).await.expect("lookup failed");
        ids[0]
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Request::get(path).body(Body::empty()).unwrap()).await
    }

    pub async fn get_with_cookie(&self, path: &str, cookie: &str) -> TestResponse {
        let request =
            Request::get(path).header(header::COOKIE, cookie).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&self, path: &str, body: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Posts a multipart form of text fields plus an optional image file.
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &[u8])>,
        cookie: &str,
    ) -> TestResponse {
        const BOUNDARY: &str = "----cinematheque-test-boundary";
        let mut body: Vec<u8> = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, bytes)) = image {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::post(path)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Logs in with the fixture password and returns the session cookie pair.
    pub async fn login(&self) -> String {
        let response = self.post_form("/login", &format!("password={ADMIN_PASSWORD}"), None).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        let set_cookie = response.set_cookie.expect("login did not set a cookie");
        set_cookie.split(';').next().unwrap_or_default().to_string()
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.expect("request failed");
        let status = response.status();
        let header_str = |name: header::HeaderName| {
            response.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
        };
        let location = header_str(header::LOCATION);
        let set_cookie = header_str(header::SET_COOKIE);
        let bytes = response.into_body().collect().await.expect("failed to read body").to_bytes();
        TestResponse {
            status,
            location,
            set_cookie,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

pub fn titles(films: &[cinematheque::models::FilmSummary]) -> Vec<&str> {
    films.iter().map(|f| f.title.as_str()).collect()
}
