pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod images;
pub mod listings;
pub mod profiles;
pub mod state;
pub mod storage;
pub mod users;
