use super::ReaderCommand;
use crate::config::AppConfig;

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub logo: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        logo: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };
}

/// Reader command bound to `key`, if any.
pub(crate) fn command_for_key(
    config: &AppConfig,
    key: &str,
    modifiers: Modifiers,
) -> Option<ReaderCommand> {
    let lowered = key.trim().to_ascii_lowercase();
    let pressed = canonical_key(&lowered);

    if shortcut_matches(&config.key_next_page, "arrowright", pressed, modifiers) {
        Some(ReaderCommand::NextPage)
    } else if shortcut_matches(&config.key_prev_page, "arrowleft", pressed, modifiers) {
        Some(ReaderCommand::PrevPage)
    } else if shortcut_matches(&config.key_open_navigation, "ctrl+g", pressed, modifiers) {
        Some(ReaderCommand::SetNavigationOpen(true))
    } else if shortcut_matches(&config.key_close_panels, "escape", pressed, modifiers) {
        Some(ReaderCommand::ClosePanels)
    } else {
        None
    }
}

pub(crate) fn shortcut_matches(
    raw: &str,
    fallback: &str,
    pressed: &str,
    modifiers: Modifiers,
) -> bool {
    let normalized = normalize_shortcut_token(raw, fallback);

    let mut required = Modifiers::NONE;
    let mut required_key: Option<&str> = None;

    for token in normalized
        .split('+')
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        match token {
            "ctrl" | "control" => required.ctrl = true,
            "alt" | "option" => required.alt = true,
            "logo" | "meta" | "super" | "cmd" | "command" => required.logo = true,
            "shift" => required.shift = true,
            key => required_key = Some(canonical_key(key)),
        }
    }

    let Some(required_key) = required_key else {
        return false;
    };
    pressed == required_key && modifiers == required
}

pub(crate) fn normalize_shortcut_token(raw: &str, fallback: &str) -> String {
    let normalized = raw.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        fallback.to_string()
    } else {
        normalized
    }
}

fn canonical_key(key: &str) -> &str {
    match key {
        "esc" => "escape",
        "left" => "arrowleft",
        "right" => "arrowright",
        "spacebar" | " " => "space",
        other => other,
    }
}
