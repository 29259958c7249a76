pub mod country;
pub mod director;
pub mod film;
pub mod film_country;
pub mod film_director;
pub mod film_genre;
pub mod film_keyword;
pub mod genre;
pub mod keyword;
