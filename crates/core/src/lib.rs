//! Domain types, validation rules and error kinds shared by every crate in
//! the syllabus service.

pub mod error;
pub mod ids;
pub mod pagination;
pub mod syllabus;
pub mod types;
pub mod upload;
