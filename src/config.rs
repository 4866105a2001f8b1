use serde::Deserialize;

use crate::buffer::replacer::DEFAULT_K;
use crate::error::Result;
use crate::storage::{StorageType, BLOCK_SIZE};

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    pub pool_size: usize,
    pub replacer_k: usize,
    pub max_wait_ms: u64,
    pub block_size: usize,

    pub storage_type: StorageType,
    pub data_dir: String,
}

impl Config {
    pub const DEFAULT_MAX_WAIT_MS: u64 = 10_000;

    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("pool_size", 8)?
            .set_default("replacer_k", DEFAULT_K as i64)?
            .set_default("max_wait_ms", Self::DEFAULT_MAX_WAIT_MS as i64)?
            .set_default("block_size", BLOCK_SIZE as i64)?
            .set_default("storage_type", "memory")?
            .set_default("data_dir", "data")?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("LRUKPOOL"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}
