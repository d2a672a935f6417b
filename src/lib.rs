pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod ops;
pub mod output;
pub mod reminders;
pub mod validate;
pub mod web;
