pub mod error;

pub mod storage;

pub mod buffer;

pub mod config;
