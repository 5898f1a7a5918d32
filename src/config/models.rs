use serde::Deserialize;

/// Flattened reader configuration; the on-disk form is grouped into tables.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_locations_chunk_size")]
    pub locations_chunk_size: usize,
    #[serde(default = "crate::config::defaults::default_max_selection_chars")]
    pub max_selection_chars: usize,
    #[serde(default = "crate::config::defaults::default_tooltip_edge_margin")]
    pub tooltip_edge_margin: f64,
    #[serde(default = "crate::config::defaults::default_tooltip_min_top")]
    pub tooltip_min_top: f64,
    #[serde(default = "crate::config::defaults::default_tooltip_vertical_offset")]
    pub tooltip_vertical_offset: f64,
    #[serde(default = "crate::config::defaults::default_target_language")]
    pub target_language: String,
    #[serde(default = "crate::config::defaults::default_max_gloss_chars")]
    pub max_gloss_chars: usize,
    #[serde(default = "crate::config::defaults::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "crate::config::defaults::default_wiktionary_url")]
    pub wiktionary_url: String,
    #[serde(default = "crate::config::defaults::default_free_dictionary_url")]
    pub free_dictionary_url: String,
    #[serde(default = "crate::config::defaults::default_libretranslate_url")]
    pub libretranslate_url: String,
    #[serde(default = "crate::config::defaults::default_data_dir")]
    pub data_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
    #[serde(default = "crate::config::defaults::default_key_next_page")]
    pub key_next_page: String,
    #[serde(default = "crate::config::defaults::default_key_prev_page")]
    pub key_prev_page: String,
    #[serde(default = "crate::config::defaults::default_key_open_navigation")]
    pub key_open_navigation: String,
    #[serde(default = "crate::config::defaults::default_key_close_panels")]
    pub key_close_panels: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            locations_chunk_size: crate::config::defaults::default_locations_chunk_size(),
            max_selection_chars: crate::config::defaults::default_max_selection_chars(),
            tooltip_edge_margin: crate::config::defaults::default_tooltip_edge_margin(),
            tooltip_min_top: crate::config::defaults::default_tooltip_min_top(),
            tooltip_vertical_offset: crate::config::defaults::default_tooltip_vertical_offset(),
            target_language: crate::config::defaults::default_target_language(),
            max_gloss_chars: crate::config::defaults::default_max_gloss_chars(),
            request_timeout_secs: crate::config::defaults::default_request_timeout_secs(),
            wiktionary_url: crate::config::defaults::default_wiktionary_url(),
            free_dictionary_url: crate::config::defaults::default_free_dictionary_url(),
            libretranslate_url: crate::config::defaults::default_libretranslate_url(),
            data_dir: crate::config::defaults::default_data_dir(),
            log_level: crate::config::defaults::default_log_level(),
            key_next_page: crate::config::defaults::default_key_next_page(),
            key_prev_page: crate::config::defaults::default_key_prev_page(),
            key_open_navigation: crate::config::defaults::default_key_open_navigation(),
            key_close_panels: crate::config::defaults::default_key_close_panels(),
        }
    }
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Default, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
