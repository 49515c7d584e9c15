// src/lib.rs

pub mod access;
pub mod api;
pub mod auth;
pub mod chatbot;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod folder;
pub mod indexing;
pub mod page;
pub mod project;
pub mod state;
pub mod storage;
pub mod users;
