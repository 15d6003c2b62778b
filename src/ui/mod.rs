pub mod render;
pub mod time_parser;
