pub mod form;
pub mod render;
