pub mod participation;
pub mod push;
pub mod scoring;
