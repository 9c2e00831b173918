mod walk;

pub use walk::{DirFilter, DirListing, TreeWalker};
