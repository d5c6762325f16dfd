pub mod handle;
pub mod hash;
pub mod jwt;
pub mod lookup;
pub mod upload;
