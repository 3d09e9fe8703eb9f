pub mod app;
pub mod auth;
pub mod github;
pub mod setup;
pub mod shared;
