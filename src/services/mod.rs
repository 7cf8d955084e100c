pub mod admin;
pub mod cache;
pub mod edition_weather;
pub mod geo;
pub mod open_meteo;
pub mod weather;
