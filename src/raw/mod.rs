mod arena;
mod handle;
mod node;
mod store;
mod traversal;
mod tree;

pub(crate) use store::NodeStore;
pub(crate) use traversal::{FrozenPath, Traversal};
pub(crate) use tree::RawBPlusTree;
