//! Site language state.
//!
//! The store is an explicitly owned object: construct it once at startup and
//! hand clones to whoever needs to read or watch the language.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

/// localStorage key holding the selected language code.
pub const LANGUAGE_STORAGE_KEY: &str = "site_language";

/// Name of the DOM event broadcast on every language change.
pub const LANGUAGE_CHANGED_EVENT: &str = "languageChanged";

/// Languages the site is published in.
///
/// Chinese is the authored (source) language, English is produced by
/// translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Simplified Chinese, the language pages are written in.
    #[default]
    Zh,
    /// English, produced by translation.
    En,
}

impl Language {
    /// Language the static pages are authored in.
    pub const SOURCE: Language = Language::Zh;
    /// Language reached through translation.
    pub const TARGET: Language = Language::En;

    /// Short code used in storage, URLs and the wire format.
    pub fn code(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }

    /// Parse an exact code. Anything but `zh`/`en` is rejected.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "zh" => Some(Language::Zh),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// The other language.
    pub fn toggled(self) -> Self {
        match self {
            Language::Zh => Language::En,
            Language::En => Language::Zh,
        }
    }

    /// Value for the `<html lang>` attribute.
    pub fn html_lang(self) -> &'static str {
        match self {
            Language::Zh => "zh-CN",
            Language::En => "en",
        }
    }

    /// English name, as used in translation prompts.
    pub fn english_name(self) -> &'static str {
        match self {
            Language::Zh => "Chinese",
            Language::En => "English",
        }
    }

    /// Whether this is the authored language.
    pub fn is_source(self) -> bool {
        self == Self::SOURCE
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for codes other than `zh`/`en`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code `{0}`")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_code(s).ok_or_else(|| UnknownLanguage(s.to_string()))
    }
}

/// Payload of a language change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageChange {
    /// Language now in effect.
    pub lang: Language,
    /// Language in effect before the change.
    pub old_lang: Language,
}

type Listener = Rc<dyn Fn(&LanguageChange)>;
type ListenerList = RefCell<Vec<(u64, Listener)>>;

struct Inner<S> {
    storage: S,
    current: Cell<Language>,
    listeners: Rc<ListenerList>,
    next_listener_id: Cell<u64>,
}

/// Current language, persisted to a [`KeyValueStore`], with change
/// notifications.
///
/// Cloning yields another handle to the same state.
pub struct LanguageStore<S> {
    inner: Rc<Inner<S>>,
}

impl<S> Clone for LanguageStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S> PartialEq for LanguageStore<S> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<S> fmt::Debug for LanguageStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageStore")
            .field("current", &self.inner.current.get())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<S: KeyValueStore> LanguageStore<S> {
    /// Restore the persisted language, or the default when nothing valid is
    /// stored.
    pub fn load(storage: S) -> Self {
        let stored = match storage.get(LANGUAGE_STORAGE_KEY) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("failed to read persisted language: {err}");
                None
            },
        };
        let current = stored
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or_default();

        Self {
            inner: Rc::new(Inner {
                storage,
                current: Cell::new(current),
                listeners: Rc::new(RefCell::new(Vec::new())),
                next_listener_id: Cell::new(0),
            }),
        }
    }

    /// Language currently in effect.
    pub fn current(&self) -> Language {
        self.inner.current.get()
    }

    /// Switch to `lang`, persist it and notify subscribers.
    ///
    /// Subscribers are notified even when `lang` is already current.
    pub fn set_language(&self, lang: Language) {
        let old_lang = self.inner.current.replace(lang);
        self.persist(lang);
        self.notify(LanguageChange {
            lang,
            old_lang,
        });
    }

    /// Like [`set_language`](Self::set_language) for a raw code; unknown
    /// codes are ignored without persisting or notifying.
    pub fn set_language_code(&self, code: &str) {
        if let Some(lang) = Language::from_code(code) {
            self.set_language(lang);
        }
    }

    /// Flip between the two languages. Returns the new language.
    pub fn toggle(&self) -> Language {
        let next = self.current().toggled();
        self.set_language(next);
        next
    }

    /// Register `listener` for change notifications until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, listener: impl Fn(&LanguageChange) + 'static) -> Subscription {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));

        Subscription {
            id,
            listeners: Rc::downgrade(&self.inner.listeners),
        }
    }

    fn persist(&self, lang: Language) {
        if let Err(err) = self.inner.storage.set(LANGUAGE_STORAGE_KEY, lang.code()) {
            tracing::warn!("failed to persist language `{lang}`: {err}");
        }
    }

    fn notify(&self, change: LanguageChange) {
        // Snapshot so listeners may subscribe, unsubscribe or read the store.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&change);
        }
    }
}

/// Keeps a language listener registered. Dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerList>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Subscription {
    /// Keep the listener registered for as long as the store lives.
    pub fn detach(mut self) {
        self.listeners = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}
