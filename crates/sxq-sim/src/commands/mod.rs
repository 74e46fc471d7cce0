pub mod analyze;
pub mod codes;
pub mod demo;
pub mod summary;
