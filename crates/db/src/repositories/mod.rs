//! Repository layer: one zero-sized struct per table with associated async
//! functions taking the pool (or an open connection for work that must join
//! a caller's transaction).

pub mod reaction_repo;
pub mod syllabus_repo;
pub mod syllabus_view_repo;

pub use reaction_repo::ReactionRepo;
pub use syllabus_repo::SyllabusRepo;
pub use syllabus_view_repo::SyllabusViewRepo;
