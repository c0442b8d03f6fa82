//! Loading `.vox` files into renderer-ready brick structures.
//!
//! [`load_vox_file`] / [`load_vox_bytes`] convert a single file.
//! [`VoxelModelLibrary`] keeps the models of many files together under one
//! global model index.

mod error;
mod library;
mod loader;

pub use error::AssetError;
pub use library::{LibraryModel, VoxelModelLibrary};
pub use loader::{VoxAsset, load_vox_bytes, load_vox_file};
