pub mod config;
pub mod embedding;
pub mod stripe;
pub mod youtube;
