pub(crate) fn default_locations_chunk_size() -> usize {
    1650
}

pub(crate) fn default_max_selection_chars() -> usize {
    50
}

pub(crate) fn default_tooltip_edge_margin() -> f64 {
    160.0
}

pub(crate) fn default_tooltip_min_top() -> f64 {
    50.0
}

pub(crate) fn default_tooltip_vertical_offset() -> f64 {
    10.0
}

pub(crate) fn default_target_language() -> String {
    "en".to_string()
}

pub(crate) fn default_max_gloss_chars() -> usize {
    200
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    8
}

pub(crate) fn default_wiktionary_url() -> String {
    "https://en.wiktionary.org/api/rest_v1/page/definition".to_string()
}

pub(crate) fn default_free_dictionary_url() -> String {
    "https://api.dictionaryapi.dev/api/v2/entries/en".to_string()
}

pub(crate) fn default_libretranslate_url() -> String {
    "https://libretranslate.de/translate".to_string()
}

pub(crate) fn default_data_dir() -> String {
    ".cache/library".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_key_next_page() -> String {
    "arrowright".to_string()
}

pub(crate) fn default_key_prev_page() -> String {
    "arrowleft".to_string()
}

pub(crate) fn default_key_open_navigation() -> String {
    "ctrl+g".to_string()
}

pub(crate) fn default_key_close_panels() -> String {
    "escape".to_string()
}
