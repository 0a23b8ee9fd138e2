pub mod en;
pub mod zh_cn;

use regional_pulse_shared::Language;

/// Labels for strings rendered by the frontend itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub lang_switch: &'static str,
    pub lang_switch_aria: &'static str,
    pub no_archive_data: &'static str,
}

pub fn labels(lang: Language) -> &'static Labels {
    match lang {
        Language::Zh => &zh_cn::LABELS,
        Language::En => &en::LABELS,
    }
}
