pub mod dump;
pub mod glob;
pub mod import;
