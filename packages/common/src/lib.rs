pub mod push;
pub mod storage;
