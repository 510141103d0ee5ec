mod mappings;

pub use mappings::*;
