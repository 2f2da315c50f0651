pub mod convert;
pub mod fetch;
pub mod motifs;
pub mod table;
pub mod view;
