//! Conversions from `extcal_config` types into core types.

use crate::family::supported_product_ids;
use crate::session::ReadingMode;

impl From<extcal_config::ModeCfg> for ReadingMode {
    fn from(m: extcal_config::ModeCfg) -> Self {
        match m {
            extcal_config::ModeCfg::Simulated => ReadingMode::Simulated,
            extcal_config::ModeCfg::Device => ReadingMode::Device,
        }
    }
}

/// Product IDs to search for; an empty list in the config means the whole family.
pub fn product_ids(cfg: &extcal_config::DeviceCfg) -> Vec<u16> {
    if cfg.product_ids.is_empty() {
        supported_product_ids()
    } else {
        cfg.product_ids.clone()
    }
}
