pub mod error;

// Tabular import module
pub mod import;
