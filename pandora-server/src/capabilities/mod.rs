pub mod generate;
pub mod refine;
pub mod stories;
