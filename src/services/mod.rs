pub mod collaborative;
pub mod content;
