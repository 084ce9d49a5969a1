//! Run resolution and zone disambiguation

pub mod disambiguator;
pub mod resolver;

pub use disambiguator::{select_inputs, InputQuery};
pub use resolver::RunResolver;
