pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod map;
pub mod ui;
