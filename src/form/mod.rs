pub mod action;
pub mod submit;
pub mod validation;
