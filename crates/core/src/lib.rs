pub mod config;
pub mod path_utils;

use tracing::info;

pub fn init() {
    info!("📋 Rollcall core initialized (root: {:?})", path_utils::get_app_root());
}
