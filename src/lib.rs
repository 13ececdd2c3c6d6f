pub mod cli;
pub mod engine;
pub mod form;
pub mod schema;
pub mod store;
pub mod trace;
