use dioxus::logger::tracing;
use dioxus::prelude::*;

const STORAGE_KEY: &str = "yacht-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Theme remembered from the last visit, if any.
pub fn load() -> Theme {
    local_storage()
        .and_then(|s| s.get_item(STORAGE_KEY).ok()?)
        .and_then(|raw| Theme::parse(&raw))
        .unwrap_or_default()
}

pub fn save(theme: Theme) {
    if let Some(storage) = local_storage() {
        if storage.set_item(STORAGE_KEY, theme.as_str()).is_err() {
            tracing::warn!("Could not persist theme");
        }
    }
}

/// Provide the theme signal to the whole tree. Call once at the root.
pub fn use_theme_provider() -> Signal<Theme> {
    use_context_provider(|| Signal::new(load()))
}

pub fn use_theme() -> Signal<Theme> {
    use_context::<Signal<Theme>>()
}
