pub mod repository;
pub mod dependency_checker;

// Re-export the traits and core types
pub use repository::{FindById, HardDeletable};
pub use dependency_checker::{DependencyChecker, Dependency, SqliteDependencyChecker};
