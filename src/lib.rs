pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod cv;
pub mod db;
pub mod error;
pub mod genai;
pub mod models;
pub mod routes;
pub mod s3;
pub mod schema;
pub mod scoring;
pub mod state;
pub mod storage;
pub mod utils;
