pub mod backend;
pub mod commands;
pub mod page;
pub mod render;
