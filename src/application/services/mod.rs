//! Application services

pub mod tree_file;

pub use tree_file::TreeFileService;
