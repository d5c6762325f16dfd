mod error;
mod key;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemFileStore;
pub use key::{StorageKey, validate_key};
pub use traits::FileStore;
