use maud::{DOCTYPE, Markup, html};

use crate::{
    auth::Viewer,
    entities::film,
    models::{FilmDetail, FilmSummary, HomePage, NamedRef, UsageStat},
    reference::FilterOptions,
    search::FilterRequest,
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

pub fn home_page(viewer: Viewer, home: &HomePage) -> String {
    page(
        "Cinémathèque",
        viewer,
        html! {
            @if !home.featured.is_empty() {
                section class="grid gap-4 md:grid-cols-3" {
                    @for film in &home.featured {
                        a class="relative block h-96 overflow-hidden rounded-lg" href=(film_href(film.id)) {
                            img class="absolute inset-0 h-full w-full object-cover" src=(film.image_url) alt=(film.title);
                            div class="absolute inset-0 flex flex-col justify-end bg-black/40 p-6 text-white" {
                                h2 class="text-2xl font-bold uppercase" { (film.title) }
                                @if let Some(directors) = &film.directors {
                                    p class="font-light" { (names(directors)) }
                                }
                            }
                        }
                    }
                }
            }

            @for row in &home.by_genre {
                section class="mt-12" {
                    h2 class="text-xl text-rose-500" {
                        a href=(format!("/films?genreId={}", row.genre.id)) { (row.genre.name) }
                    }
                    div class="mt-4 flex gap-4 overflow-x-auto pb-2" {
                        @for film in &row.films {
                            div class="w-48 shrink-0" { (film_card(film)) }
                        }
                    }
                }
            }

            section class="mt-12" {
                h2 class="text-xl text-rose-500" { "Catalogue" }
                (film_grid(&home.latest, "The catalogue is empty."))
            }
        },
    )
}

pub fn search_page(
    viewer: Viewer,
    request: &FilterRequest,
    options: &FilterOptions,
    films: &[FilmSummary],
) -> String {
    let selected_keywords: Vec<&str> = request.keyword_ids.iter().map(String::as_str).collect();

    page(
        "Search",
        viewer,
        html! {
            h1 class="text-xl text-rose-500" { "Search" }
            form class="mt-6 grid gap-4 md:grid-cols-4" method="get" action="/films" {
                input class="md:col-span-4 w-full rounded border bg-gray-200 px-4 py-3 text-gray-700"
                    type="text" name="query" value=[request.query.as_deref()]
                    placeholder="Type a title or a keyword...";
                (ref_select("Country", "countryId", &options.countries, request.country_id.as_deref()))
                (ref_select("Genre", "genreId", &options.genres, request.genre_id.as_deref()))
                (ref_select("Director", "directorId", &options.directors, request.director_id.as_deref()))
                label class="block text-sm" {
                    "Keywords"
                    select class="mt-2 block w-full rounded bg-gray-900 p-2.5" name="keywordIds" multiple size="4" {
                        @for kw in &options.keywords {
                            @let value = kw.id.to_string();
                            option value=(value) selected[selected_keywords.contains(&value.as_str())] { (kw.name) }
                        }
                    }
                }
                (year_select("From", "startYear", &options.years, request.start_year.as_deref()))
                (year_select("To", "endYear", &options.years, request.end_year.as_deref()))
                label class="block text-sm" {
                    "Type"
                    input class="mt-2 block w-full rounded bg-gray-900 p-2.5" type="text" name="type" value=[request.film_type.as_deref()];
                }
                div class="flex items-end gap-4" {
                    button class="rounded-md bg-rose-500 px-4 py-2 font-semibold text-white hover:bg-rose-600" type="submit" { "Search" }
                    a class="text-sm text-gray-400 hover:text-white" href="/films" { "Reset" }
                }
            }
            (film_grid(films, "No films match these filters."))
        },
    )
}

pub fn film_page(viewer: Viewer, detail: &FilmDetail) -> String {
    let film = &detail.film;
    let mut facts: Vec<String> = Vec::new();
    if !detail.countries.is_empty() {
        facts.push(names(&detail.countries));
    }
    if let Some(date) = &film.release_date {
        facts.push(date.clone());
    }
    if let Some(runtime) = film.runtime {
        facts.push(format!("{runtime}'"));
    }

    page(
        &film.title,
        viewer,
        html! {
            div class="relative h-96 overflow-hidden rounded-lg" {
                img class="absolute inset-0 h-full w-full object-cover" src=(detail.image_url) alt=(film.title);
                div class="absolute inset-0 flex items-end justify-between bg-black/30 p-10 text-white" {
                    div {
                        h1 class="text-3xl font-bold uppercase" { (film.title) }
                        p class="text-lg font-light" { (names(&detail.directors)) }
                    }
                    @if viewer.is_admin {
                        div class="flex gap-2" {
                            a class="rounded-md bg-pink-400 px-4 py-2 hover:bg-pink-600" href=(format!("/films/{}/edit", film.id)) { "Edit" }
                            form method="post" action=(format!("/films/{}/delete", film.id))
                                onsubmit="return confirm('Delete this film? This cannot be undone.')" {
                                button class="rounded-md bg-gray-800 px-4 py-2 hover:bg-gray-700" type="submit" { "Delete" }
                            }
                        }
                    }
                }
            }

            div class="flex flex-col gap-3 py-10" {
                p class="font-semibold" { (facts.join(", ")) }
                @if let Some(description) = &film.description {
                    p class="font-light" { (description) }
                }
                p class="font-bold" {
                    "Genre: "
                    @for (i, genre) in detail.genres.iter().enumerate() {
                        @if i > 0 { ", " }
                        a class="font-light hover:underline" href=(format!("/films?genreId={}", genre.id)) { (genre.name) }
                    }
                }
                div class="flex flex-wrap items-center gap-2 font-bold" {
                    "Keywords:"
                    @for kw in &detail.keywords {
                        a class="rounded-full border p-1.5 text-sm font-light" href=(format!("/films?keywordIds={}", kw.id)) { (kw.name) }
                    }
                }
            }
        },
    )
}

pub fn film_form_page(viewer: Viewer, existing: Option<&FilmDetail>, error: Option<&str>) -> String {
    let film: Option<&film::Model> = existing.map(|d| &d.film);
    let (title, action) = match film {
        Some(f) => ("Edit film", format!("/films/{}", f.id)),
        None => ("Add a film to the catalogue", "/films".to_string()),
    };
    let directors = existing.map(|d| names(&d.directors));
    let countries = existing.map(|d| names(&d.countries));
    let genres = existing.map(|d| names(&d.genres));
    let keywords = existing.map(|d| names(&d.keywords));
    let runtime = film.and_then(|f| f.runtime).map(|r| r.to_string());

    page(
        title,
        viewer,
        html! {
            h1 class="text-2xl text-rose-500" { (title) }
            @if let Some(error) = error {
                p class="mt-4 text-red-500" { (error) }
            }
            form class="mt-6 flex flex-col gap-4 sm:w-3/4" method="post" action=(action) enctype="multipart/form-data" {
                (text_input("Title", "title", film.map(|f| f.title.as_str())))
                label class="block" {
                    "Description"
                    textarea class="mt-2 block w-full border-b bg-neutral-950 p-2 font-light" name="description" rows="5" {
                        (film.and_then(|f| f.description.as_deref()).unwrap_or_default())
                    }
                }
                (text_input("Release date", "release_date", film.and_then(|f| f.release_date.as_deref())))
                (text_input("Language", "language", film.and_then(|f| f.language.as_deref())))
                (text_input("Runtime (minutes)", "runtime", runtime.as_deref()))
                (text_input("Type", "film_type", film.and_then(|f| f.film_type.as_deref())))
                (text_input("Directors (comma separated)", "directors", directors.as_deref()))
                (text_input("Countries (comma separated)", "countries", countries.as_deref()))
                (text_input("Genres (comma separated)", "genres", genres.as_deref()))
                (text_input("Keywords (comma separated)", "keywords", keywords.as_deref()))
                label class="flex items-center gap-2" {
                    input type="checkbox" name="boost" checked[film.is_some_and(|f| f.boost)];
                    "Feature on the homepage"
                }
                @if let Some(detail) = existing {
                    img class="w-48 rounded" src=(detail.image_url) alt=(detail.film.title);
                }
                label class="block" {
                    "Image"
                    input class="mt-2 block" type="file" name="image" accept="image/*";
                }
                button class="rounded-md bg-rose-500 px-4 py-2 font-semibold text-white hover:bg-rose-600" type="submit" { "Save" }
            }
        },
    )
}

pub fn login_page(viewer: Viewer, error: Option<&str>) -> String {
    page(
        "Log in",
        viewer,
        html! {
            div class="mx-auto max-w-md" {
                h1 class="text-2xl text-rose-500" { "Log in" }
                @if let Some(error) = error {
                    p class="mt-4 text-red-500" { (error) }
                }
                form class="mt-6 space-y-4" method="post" action="/login" {
                    label class="block" {
                        "Password"
                        input class="mt-2 w-full rounded border bg-gray-200 px-3 py-2 text-gray-700" type="password" name="password" required;
                    }
                    button class="w-full rounded-md bg-rose-500 px-4 py-2 font-semibold text-white hover:bg-rose-600" type="submit" { "Log in" }
                }
            }
        },
    )
}

pub fn stats_page(viewer: Viewer, keywords: &[UsageStat], genres: &[UsageStat]) -> String {
    page(
        "Statistics",
        viewer,
        html! {
            h1 class="text-2xl text-rose-500" { "Statistics" }
            div class="mt-6 grid gap-10 md:grid-cols-2" {
                (usage_table("Keywords", "keywordIds", keywords))
                (usage_table("Genres", "genreId", genres))
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        Viewer { is_admin: false },
        html! {
            div class="mx-auto max-w-xl rounded-lg bg-gray-900 p-8" {
                h1 class="text-2xl font-bold" { "Error" }
                p class="mt-4 text-gray-300" { (message) }
                a class="mt-6 inline-block text-rose-400 hover:text-rose-300" href="/" { "Back" }
            }
        },
    )
}

fn page(title: &str, viewer: Viewer, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-neutral-950 text-white" {
                nav class="flex items-center justify-between px-10 py-4" {
                    a class="text-lg tracking-wide text-rose-500" href="/" { "Cinémathèque" }
                    div class="flex items-center gap-6 text-sm" {
                        a href="/films" { "Search" }
                        a href="/stats" { "Statistics" }
                        @if viewer.is_admin {
                            a href="/films/new" { "Add a film" }
                            form method="post" action="/logout" {
                                button type="submit" { "Log out" }
                            }
                        } @else {
                            a href="/login" { "Log in" }
                        }
                    }
                }
                main class="mx-auto max-w-[100rem] px-10 pb-20" { (body) }
            }
        }
    }
    .into_string()
}

fn film_grid(films: &[FilmSummary], empty: &str) -> Markup {
    html! {
        @if films.is_empty() {
            p class="mt-10 text-gray-400" { (empty) }
        } @else {
            div class="mt-6 grid grid-cols-1 gap-5 md:grid-cols-2 lg:grid-cols-3 xl:grid-cols-4" {
                @for film in films {
                    (film_card(film))
                }
            }
        }
    }
}

fn film_card(film: &FilmSummary) -> Markup {
    html! {
        a class="block overflow-hidden rounded-lg bg-gray-900 hover:bg-gray-800" href=(film_href(film.id)) {
            img class="h-64 w-full object-cover" src=(film.image_url) alt=(film.title);
            div class="p-4" {
                h3 class="font-semibold" { (film.title) }
                @if let Some(date) = &film.release_date {
                    p class="text-sm text-gray-400" { (date) }
                }
                @if let Some(directors) = film.directors.as_ref().filter(|d| !d.is_empty()) {
                    p class="text-sm font-light" { (names(directors)) }
                }
            }
        }
    }
}

fn ref_select(label: &str, name: &str, options: &[NamedRef], current: Option<&str>) -> Markup {
    html! {
        label class="block text-sm" {
            (label)
            select class="mt-2 block w-full rounded bg-gray-900 p-2.5" name=(name) {
                option value="" { "Select..." }
                @for opt in options {
                    @let value = opt.id.to_string();
                    option value=(value) selected[current == Some(value.as_str())] { (opt.name) }
                }
            }
        }
    }
}

fn year_select(label: &str, name: &str, years: &[i32], current: Option<&str>) -> Markup {
    html! {
        label class="block text-sm" {
            (label)
            select class="mt-2 block w-full rounded bg-gray-900 p-2.5" name=(name) {
                option value="" { "Any year" }
                @for year in years {
                    @let value = year.to_string();
                    option value=(value) selected[current == Some(value.as_str())] { (year) }
                }
            }
        }
    }
}

fn text_input(label: &str, name: &str, value: Option<&str>) -> Markup {
    html! {
        label class="block" {
            (label)
            input class="mt-2 block w-full border-b bg-neutral-950 p-2 font-light" type="text" name=(name) value=[value];
        }
    }
}

fn usage_table(title: &str, param: &str, stats: &[UsageStat]) -> Markup {
    html! {
        section {
            h2 class="text-lg" { (title) }
            table class="mt-4 w-full text-sm" {
                @for stat in stats {
                    tr class="border-b border-gray-800" {
                        td class="py-1" {
                            a class="hover:underline" href=(format!("/films?{}={}", param, stat.id)) { (stat.name) }
                        }
                        td class="py-1 text-right" { (stat.films) }
                    }
                }
            }
        }
    }
}

fn film_href(id: i32) -> String {
    format!("/films/{id}")
}

fn names(refs: &[NamedRef]) -> String {
    refs.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", ")
}
