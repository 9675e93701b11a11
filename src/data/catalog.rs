use std::fs;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::info;

use crate::config::service::{DataConfig, DataList};

/// Read-only SKU and buyer data shared by every virtual user.
#[derive(Debug, Clone)]
pub struct Catalog {
    skus: Arc<[String]>,
    blocks: Vec<Arc<[String]>>,
    buyer_codes: Arc<[String]>,
}

impl Catalog {
    /// Build the catalog, chunking SKUs into blocks of `block_size` (last block may be shorter).
    pub fn new(skus: Vec<String>, buyer_codes: Vec<String>, block_size: usize) -> Result<Self> {
        if skus.is_empty() {
            bail!("SKU list is empty");
        }
        if buyer_codes.is_empty() {
            bail!("buyer code list is empty");
        }
        if block_size == 0 {
            bail!("SKU block size must be > 0");
        }

        let blocks = skus
            .chunks(block_size)
            .map(Arc::from)
            .collect::<Vec<Arc<[String]>>>();

        Ok(Self {
            skus: Arc::from(skus),
            blocks,
            buyer_codes: Arc::from(buyer_codes),
        })
    }

    pub fn from_config(cfg: &DataConfig, block_size: usize) -> Result<Self> {
        let skus = load_list(&cfg.skus).map_err(|e| anyhow!("data.skus: {}", e))?;
        let buyer_codes = load_list(&cfg.buyer_codes).map_err(|e| anyhow!("data.buyer_codes: {}", e))?;
        let catalog = Self::new(skus, buyer_codes, block_size)?;
        info!(
            "catalog loaded: {} SKUs in {} blocks, {} buyer codes",
            catalog.skus.len(),
            catalog.blocks.len(),
            catalog.buyer_codes.len()
        );
        Ok(catalog)
    }

    pub fn skus(&self) -> Arc<[String]> {
        self.skus.clone()
    }

    pub fn blocks(&self) -> &[Arc<[String]>] {
        &self.blocks
    }

    pub fn buyer_codes(&self) -> &[String] {
        &self.buyer_codes
    }

    pub fn random_block<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<[String]>> {
        self.blocks.choose(rng).cloned()
    }

    pub fn random_buyer_code<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        self.buyer_codes.choose(rng).cloned()
    }
}

/// Inline list, or a text file with one value per line (`#` comments and blank lines skipped).
pub fn load_list(list: &DataList) -> Result<Vec<String>> {
    match list {
        DataList::Inline(values) => Ok(values.iter().map(|v| v.trim().to_owned()).collect()),
        DataList::FromFile { path } => {
            let content = fs::read_to_string(path).map_err(|err| anyhow!("file '{}': {}", path, err))?;
            Ok(parse_lines(&content))
        }
    }
}

fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}
