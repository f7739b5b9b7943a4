pub mod grammar_fixtures;
pub mod tree_assertions;
