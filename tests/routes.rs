mod common;

use axum::http::StatusCode;
use cinematheque::links::Link;
use common::{SeedFilm, TestApp};

#[tokio::test]
async fn home_renders_sections() {
    let app = TestApp::new().await;
    app.seed(SeedFilm::new("Sans Soleil", 1).boosted().genres(&["Documentary"])).await;

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Sans Soleil"));
    assert!(response.body.contains("Documentary"));
    assert!(response.body.contains("Log in"));
}

#[tokio::test]
async fn search_page_filters_by_query_string() {
    let app = TestApp::new().await;
    app.seed(SeedFilm::new("Alphaville", 1).keywords(&["dystopia"])).await;
    app.seed(SeedFilm::new("Le Samouraï", 2)).await;

    let response = app.get("/films?query=alpha").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Alphaville"));
    assert!(!response.body.contains("Le Samouraï"));
}

#[tokio::test]
async fn api_returns_summaries_as_json() {
    let app = TestApp::new().await;
    app.seed(SeedFilm::new("A", 1).keywords(&["one"]).released("1961")).await;
    app.seed(SeedFilm::new("B", 2).keywords(&["two"])).await;
    app.seed(SeedFilm::new("C", 3).keywords(&["three"])).await;
    let one = app.id_of(Link::Keyword, "one").await;
    let two = app.id_of(Link::Keyword, "two").await;

    let response = app.get(&format!("/api/films?keywordIds={one}&keywordIds={two}")).await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    let films = body.as_array().expect("an array of films");
    let titles: Vec<&str> = films.iter().map(|f| f["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["B", "A"]);
    assert_eq!(films[1]["releaseDate"], "1961");
    assert_eq!(films[1]["imageUrl"], "/placeholder.png");
    assert_eq!(films[1]["keywords"][0]["name"], "one");
    assert!(films[1]["directors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn api_ignores_malformed_filters() {
    let app = TestApp::new().await;
    app.seed(SeedFilm::new("Only", 1)).await;

    let response = app.get("/api/films?genreId=abc&startYear=&type=").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_film_is_404() {
    let app = TestApp::new().await;
    let response = app.get("/films/999").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("film 999 not found"));
}

#[tokio::test]
async fn film_page_lists_relations() {
    let app = TestApp::new().await;
    let id = app
        .seed(SeedFilm::new("Jeanne Dielman", 1).directors(&["Chantal Akerman"]).countries(&["Belgium"]))
        .await;

    let response = app.get(&format!("/films/{id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Chantal Akerman"));
    assert!(response.body.contains("Belgium"));
    assert!(!response.body.contains("/edit"));
}

#[tokio::test]
async fn stats_page_renders() {
    let app = TestApp::new().await;
    app.seed(SeedFilm::new("A", 1).genres(&["Drama"]).keywords(&["rain"])).await;

    let response = app.get("/stats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Drama"));
    assert!(response.body.contains("rain"));
}

#[tokio::test]
async fn admin_pages_redirect_anonymous_visitors() {
    let app = TestApp::new().await;
    let id = app.seed(SeedFilm::new("Protected", 1)).await;

    for path in ["/films/new".to_string(), format!("/films/{id}/edit")] {
        let response = app.get(&path).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{path}");
        assert_eq!(response.location.as_deref(), Some("/login"));
    }

    let response = app.post_form(&format!("/films/{id}/delete"), "", None).await;
    assert_eq!(response.location.as_deref(), Some("/login"));
    assert_eq!(app.get(&format!("/films/{id}")).await.status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;
    let response = app.post_form("/login", "password=nope", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.set_cookie.is_none());
}

#[tokio::test]
async fn repeated_logins_are_throttled() {
    let app = TestApp::new().await;
    for _ in 0..3 {
        app.post_form("/login", "password=nope", None).await;
    }
    let response = app.post_form("/login", "password=let-me-in", None).await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn forged_cookie_is_not_a_session() {
    let app = TestApp::new().await;
    let response = app.get_with_cookie("/films/new", "cinematheque_admin=1700000000").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn admin_creates_edits_and_deletes_a_film() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let form = app.get_with_cookie("/films/new", &cookie).await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Log out"));

    let created = app
        .post_multipart(
            "/films",
            &[
                ("title", "Le Bonheur"),
                ("release_date", "1965-02-10"),
                ("runtime", "80"),
                ("genres", "Drama, Romance"),
                ("directors", "Agnès Varda"),
                ("boost", "on"),
            ],
            Some(("sunflowers.jpg", b"not really a jpeg".as_slice())),
            &cookie,
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    let location = created.location.expect("redirect to the new film");
    let id: i32 = location.trim_start_matches("/films/").parse().unwrap();

    let detail = app.store().detail(id).await.unwrap();
    assert!(detail.film.boost);
    assert_eq!(detail.film.runtime, Some(80));
    assert_eq!(detail.genres.len(), 2);
    let stored = detail.film.image_url.clone().unwrap();
    let image = app.get(&format!("/images/{stored}")).await;
    assert_eq!(image.status, StatusCode::OK);
    assert_eq!(image.body, "not really a jpeg");

    let page = app.get_with_cookie(&location, &cookie).await;
    assert!(page.body.contains(&format!("/films/{id}/edit")));

    let updated = app
        .post_multipart(
            &location,
            &[("title", "Le Bonheur"), ("genres", "Drama"), ("keywords", "summer")],
            None,
            &cookie,
        )
        .await;
    assert_eq!(updated.status, StatusCode::SEE_OTHER);
    let detail = app.store().detail(id).await.unwrap();
    assert_eq!(detail.genres.len(), 1);
    assert_eq!(detail.keywords[0].name, "summer");
    assert!(!detail.film.boost);
    assert_eq!(detail.film.image_url.as_deref(), Some(stored.as_str()));

    let deleted = app.post_form(&format!("/films/{id}/delete"), "", Some(&cookie)).await;
    assert_eq!(deleted.status, StatusCode::SEE_OTHER);
    assert_eq!(deleted.location.as_deref(), Some("/films"));
    assert_eq!(app.get(&location).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_form_is_shown_again() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response =
        app.post_multipart("/films", &[("title", "  "), ("runtime", "80")], None, &cookie).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("title is required"));

    let response = app
        .post_multipart("/films", &[("title", "Bad runtime"), ("runtime", "long")], None, &cookie)
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("runtime must be a number of minutes"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let response = app.post_form("/logout", "", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let cleared = response.set_cookie.expect("logout resets the cookie");
    assert!(cleared.starts_with("cinematheque_admin="));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn posters_above_two_mebibytes_are_accepted() {
    let app = TestApp::new().await;
    let cookie = app.login().await;
    let poster = vec![0xFFu8; 3 * 1024 * 1024];

    let response = app
        .post_multipart(
            "/films",
            &[("title", "Big poster")],
            Some(("poster.jpg", poster.as_slice())),
            &cookie,
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);
    assert_eq!(app.image_files().len(), 1);
}

#[tokio::test]
async fn uploads_over_the_limit_are_too_large() {
    let app = TestApp::with_env(&[("UPLOAD_MAX_BYTES", "1024")]).await;
    let cookie = app.login().await;
    let poster = vec![0xFFu8; 4096];

    let response = app
        .post_multipart(
            "/films",
            &[("title", "Too big")],
            Some(("poster.jpg", poster.as_slice())),
            &cookie,
        )
        .await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.image_files().is_empty());
}

#[tokio::test]
async fn api_reports_store_failures_as_json() {
    let app = TestApp::new().await;
    app.seed(SeedFilm::new("A", 1).keywords(&["one"])).await;
    let one = app.id_of(Link::Keyword, "one").await;
    app.drop_table("film_keywords").await;

    let response = app.get(&format!("/api/films?keywordIds={one}")).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = response.json()["error"].as_str().unwrap_or_default().to_string();
    assert!(message.contains("film_keywords"), "{message}");

    let page = app.get(&format!("/films?keywordIds={one}")).await;
    assert_eq!(page.status, StatusCode::INTERNAL_SERVER_ERROR);
}
