pub mod defaults;
pub mod editor;
pub mod field_model;
pub mod form_model;
