pub mod filters;
pub mod format;
pub mod models;
pub mod saved;
pub mod sort;
pub mod store;
pub mod tasks;
