//! Post-build hooks that add files next to the converted documents.

mod assets;
mod graph;
mod index;

pub use assets::AssetsHook;
pub use graph::GraphHook;
pub use index::IndexHook;
