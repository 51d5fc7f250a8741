pub mod app;
pub mod input;
pub mod render;
pub mod view;
