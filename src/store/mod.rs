pub mod form_store;
pub mod ids;
