pub mod classify_types;
pub mod organize_types;
