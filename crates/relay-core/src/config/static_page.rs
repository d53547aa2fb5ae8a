//! Static document configuration.

use serde::{Deserialize, Serialize};

/// Settings for the single HTML document served on `/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticPageConfig {
    /// Path to an HTML file that replaces the built-in page.
    /// Read once at startup.
    #[serde(default)]
    pub index_file: Option<String>,
}
