pub mod api;
pub mod api_docs;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod models;
pub mod notify;
pub mod realtime;
pub mod seed;
pub mod services;
