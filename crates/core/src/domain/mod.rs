pub mod instrument;
pub mod news;
pub mod ranking;
pub mod universe;
