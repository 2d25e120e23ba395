use camino::{Utf8Path, Utf8PathBuf};
use dirs::home_dir;

pub const DEFAULT_ATTEST_HOME: &str = ".gatt-attest";

pub fn default_home_dir() -> Utf8PathBuf {
    home_dir()
        .as_deref()
        .and_then(Utf8Path::from_path)
        .map_or_else(Utf8PathBuf::default, |home| home.join(DEFAULT_ATTEST_HOME))
}
