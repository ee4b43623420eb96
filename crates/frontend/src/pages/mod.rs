pub mod dashboard;
pub mod project;
pub mod projects;
