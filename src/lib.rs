pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod flash;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod storage;
pub mod views;
