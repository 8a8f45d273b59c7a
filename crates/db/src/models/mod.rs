pub mod reaction;
pub mod syllabus;
