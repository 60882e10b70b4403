pub mod api;
pub mod board;
pub mod config;
pub mod db;
pub mod models;
pub mod render;
pub mod store;
pub mod views;
