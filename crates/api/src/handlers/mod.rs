pub mod catalog;
pub mod custody;
pub mod directors;
pub mod folios;
