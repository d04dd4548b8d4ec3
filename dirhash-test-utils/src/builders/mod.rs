//! Test data builders for creating test scenarios

mod test_tree;

pub use test_tree::{TestTree, TestTreeBuilder};
