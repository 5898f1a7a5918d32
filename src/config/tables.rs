use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    pagination: PaginationConfig,
    #[serde(default)]
    selection: SelectionConfig,
    #[serde(default)]
    translation: TranslationConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    keys: KeysConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            locations_chunk_size: tables.pagination.locations_chunk_size,
            max_selection_chars: tables.selection.max_selection_chars,
            tooltip_edge_margin: tables.selection.tooltip_edge_margin,
            tooltip_min_top: tables.selection.tooltip_min_top,
            tooltip_vertical_offset: tables.selection.tooltip_vertical_offset,
            target_language: tables.translation.target_language,
            max_gloss_chars: tables.translation.max_gloss_chars,
            request_timeout_secs: tables.translation.request_timeout_secs,
            wiktionary_url: tables.translation.wiktionary_url,
            free_dictionary_url: tables.translation.free_dictionary_url,
            libretranslate_url: tables.translation.libretranslate_url,
            data_dir: tables.storage.data_dir,
            log_level: tables.logging.log_level,
            key_next_page: tables.keys.next_page,
            key_prev_page: tables.keys.prev_page,
            key_open_navigation: tables.keys.open_navigation,
            key_close_panels: tables.keys.close_panels,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            pagination: PaginationConfig {
                locations_chunk_size: config.locations_chunk_size,
            },
            selection: SelectionConfig {
                max_selection_chars: config.max_selection_chars,
                tooltip_edge_margin: config.tooltip_edge_margin,
                tooltip_min_top: config.tooltip_min_top,
                tooltip_vertical_offset: config.tooltip_vertical_offset,
            },
            translation: TranslationConfig {
                target_language: config.target_language.clone(),
                max_gloss_chars: config.max_gloss_chars,
                request_timeout_secs: config.request_timeout_secs,
                wiktionary_url: config.wiktionary_url.clone(),
                free_dictionary_url: config.free_dictionary_url.clone(),
                libretranslate_url: config.libretranslate_url.clone(),
            },
            storage: StorageConfig {
                data_dir: config.data_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
            keys: KeysConfig {
                next_page: config.key_next_page.clone(),
                prev_page: config.key_prev_page.clone(),
                open_navigation: config.key_open_navigation.clone(),
                close_panels: config.key_close_panels.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PaginationConfig {
    #[serde(default = "defaults::default_locations_chunk_size")]
    locations_chunk_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            locations_chunk_size: defaults::default_locations_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct SelectionConfig {
    #[serde(default = "defaults::default_max_selection_chars")]
    max_selection_chars: usize,
    #[serde(default = "defaults::default_tooltip_edge_margin")]
    tooltip_edge_margin: f64,
    #[serde(default = "defaults::default_tooltip_min_top")]
    tooltip_min_top: f64,
    #[serde(default = "defaults::default_tooltip_vertical_offset")]
    tooltip_vertical_offset: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            max_selection_chars: defaults::default_max_selection_chars(),
            tooltip_edge_margin: defaults::default_tooltip_edge_margin(),
            tooltip_min_top: defaults::default_tooltip_min_top(),
            tooltip_vertical_offset: defaults::default_tooltip_vertical_offset(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct TranslationConfig {
    #[serde(default = "defaults::default_target_language")]
    target_language: String,
    #[serde(default = "defaults::default_max_gloss_chars")]
    max_gloss_chars: usize,
    #[serde(default = "defaults::default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "defaults::default_wiktionary_url")]
    wiktionary_url: String,
    #[serde(default = "defaults::default_free_dictionary_url")]
    free_dictionary_url: String,
    #[serde(default = "defaults::default_libretranslate_url")]
    libretranslate_url: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        TranslationConfig {
            target_language: defaults::default_target_language(),
            max_gloss_chars: defaults::default_max_gloss_chars(),
            request_timeout_secs: defaults::default_request_timeout_secs(),
            wiktionary_url: defaults::default_wiktionary_url(),
            free_dictionary_url: defaults::default_free_dictionary_url(),
            libretranslate_url: defaults::default_libretranslate_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_data_dir")]
    data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: defaults::default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct KeysConfig {
    #[serde(default = "defaults::default_key_next_page")]
    next_page: String,
    #[serde(default = "defaults::default_key_prev_page")]
    prev_page: String,
    #[serde(default = "defaults::default_key_open_navigation")]
    open_navigation: String,
    #[serde(default = "defaults::default_key_close_panels")]
    close_panels: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        KeysConfig {
            next_page: defaults::default_key_next_page(),
            prev_page: defaults::default_key_prev_page(),
            open_navigation: defaults::default_key_open_navigation(),
            close_panels: defaults::default_key_close_panels(),
        }
    }
}
