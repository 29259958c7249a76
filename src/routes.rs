use std::sync::Arc;

use axum::{
    Json,
    extract::{Form, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Query;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    AppState,
    auth::{self, Admin, LoginOutcome, Viewer},
    error::{AppResult, CatalogueError},
    models::{FilmInput, ImageUpload},
    reference,
    search::{FilterRequest, Include},
    templates,
};

pub async fn index(State(state): State<Arc<AppState>>, viewer: Viewer) -> AppResult<Html<String>> {
    let home = state.films.home().await?;
    Ok(Html(templates::home_page(viewer, &home)))
}

pub async fn search_films(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(request): Query<FilterRequest>,
) -> AppResult<Html<String>> {
    let films = state.films.search(&request, Include::DIRECTORS).await?;
    let options = reference::filter_options(state.films.db()).await?;
    Ok(Html(templates::search_page(viewer, &request, &options, &films)))
}

pub async fn search_films_json(
    State(state): State<Arc<AppState>>,
    Query(request): Query<FilterRequest>,
) -> Response {
    match state.films.search(&request, Include::ALL).await {
        Ok(films) => Json(films).into_response(),
        Err(err) => {
            warn!(error = %err, "search failed");
            let body = serde_json::json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        },
    }
}

pub async fn show_film(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let detail = state.films.detail(id).await?;
    Ok(Html(templates::film_page(viewer, &detail)))
}

pub async fn stats(State(state): State<Arc<AppState>>, viewer: Viewer) -> AppResult<Html<String>> {
    let keywords = state.films.keyword_usage().await?;
    let genres = state.films.genre_usage().await?;
    Ok(Html(templates::stats_page(viewer, &keywords, &genres)))
}

pub async fn new_film(_: Admin) -> Html<String> {
    Html(templates::film_form_page(Viewer { is_admin: true }, None, None))
}

pub async fn create_film(
    State(state): State<Arc<AppState>>,
    _: Admin,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = match read_film_form(multipart).await? {
        Ok(input) => input,
        Err(message) => {
            let page = templates::film_form_page(Viewer { is_admin: true }, None, Some(&message));
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        },
    };
    let id = state.films.create(input).await?;
    Ok(Redirect::to(&format!("/films/{id}")).into_response())
}

pub async fn edit_film(
    State(state): State<Arc<AppState>>,
    _: Admin,
    Path(id): Path<i32>,
) -> AppResult<Html<String>> {
    let detail = state.films.detail(id).await?;
    Ok(Html(templates::film_form_page(Viewer { is_admin: true }, Some(&detail), None)))
}

pub async fn update_film(
    State(state): State<Arc<AppState>>,
    _: Admin,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = match read_film_form(multipart).await? {
        Ok(input) => input,
        Err(message) => {
            let detail = state.films.detail(id).await?;
            let page =
                templates::film_form_page(Viewer { is_admin: true }, Some(&detail), Some(&message));
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        },
    };
    state.films.update(id, input).await?;
    Ok(Redirect::to(&format!("/films/{id}")).into_response())
}

pub async fn delete_film(
    State(state): State<Arc<AppState>>,
    _: Admin,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.films.delete(id).await?;
    Ok(Redirect::to("/films"))
}

pub async fn login_form(viewer: Viewer) -> Html<String> {
    Html(templates::login_page(viewer, None))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    password: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(req): Form<LoginRequest>,
) -> Response {
    let viewer = Viewer { is_admin: false };
    let (status, message) = match auth::check_login(&state, &req.password) {
        LoginOutcome::Accepted => {
            info!("admin logged in");
            let jar = auth::session_jar(&headers, &state);
            return (auth::start_session(jar), Redirect::to("/")).into_response();
        },
        LoginOutcome::Rejected => (StatusCode::UNAUTHORIZED, "Wrong password."),
        LoginOutcome::Throttled => {
            warn!("login attempts throttled");
            (StatusCode::TOO_MANY_REQUESTS, "Too many attempts, try again in a minute.")
        },
        LoginOutcome::Disabled => (StatusCode::FORBIDDEN, "Administration is disabled."),
    };
    (status, Html(templates::login_page(viewer, Some(message)))).into_response()
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let jar = auth::session_jar(&headers, &state);
    (auth::end_session(jar), Redirect::to("/"))
}

/// Reads the admin film form. The outer error is a broken upload; the inner
/// one is a validation message to show next to the form.
async fn read_film_form(mut multipart: Multipart) -> AppResult<Result<FilmInput, String>> {
    let mut fields: Vec<(String, String)> = Vec::new();
    let mut image = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            if !file_name.is_empty() && !bytes.is_empty() {
                image = Some(ImageUpload { file_name, bytes: bytes.to_vec() });
            }
        } else {
            fields.push((name, field.text().await?));
        }
    }

    let pairs = fields.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    match FilmInput::from_fields(pairs, image) {
        Ok(input) => Ok(Ok(input)),
        Err(CatalogueError::Invalid(message)) => Ok(Err(message)),
        Err(err) => Err(err.into()),
    }
}
