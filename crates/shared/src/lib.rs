pub mod filter;
pub mod form;
pub mod models;
pub mod placement;
pub mod stats;
pub mod view;
