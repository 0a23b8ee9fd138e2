use std::rc::Rc;

use regional_pulse_shared::{
    language::LANGUAGE_CHANGED_EVENT, Language, LanguageChange, LanguageStore,
};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{CustomEvent, CustomEventInit, Document, Element};

use crate::{dom::query_all, i18n, storage::BrowserStorage};

pub type PageLanguage = LanguageStore<Rc<BrowserStorage>>;

const SWITCH_SELECTOR: &str = ".lang-switch";

/// Reflect `lang` on `<html>` and on every language switch button.
pub fn sync_page(document: &Document, lang: Language) {
    if let Some(root) = document.document_element() {
        let _ = root.set_attribute("lang", lang.html_lang());
        let _ = root.set_attribute("data-lang", lang.code());
    }

    let labels = i18n::labels(lang);
    for button in query_all(document, SWITCH_SELECTOR) {
        // Only touch the text when it changed, the button may be mid-transition.
        if button.text_content().as_deref() != Some(labels.lang_switch) {
            button.set_text_content(Some(labels.lang_switch));
        }
        let _ = button.set_attribute("aria-label", labels.lang_switch_aria);
    }
}

/// Fire `languageChanged` on `document` for scripts outside the app.
pub fn dispatch_change(document: &Document, change: &LanguageChange) {
    let detail = match serde_json::to_string(change)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
    {
        Some(detail) => detail,
        None => JsValue::NULL,
    };

    let init = CustomEventInit::new();
    init.set_detail(&detail);
    match CustomEvent::new_with_event_init_dict(LANGUAGE_CHANGED_EVENT, &init) {
        Ok(event) => {
            let _ = document.dispatch_event(&event);
        },
        Err(err) => web_sys::console::error_1(&err),
    }
}

/// Make every `.lang-switch` toggle the language. The listeners live as long
/// as the page.
pub fn bind_switches(document: &Document, store: &PageLanguage) {
    for button in query_all(document, SWITCH_SELECTOR) {
        bind_switch(&button, store.clone());
    }
}

fn bind_switch(button: &Element, store: PageLanguage) {
    let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
        event.prevent_default();
        store.toggle();
    }) as Box<dyn Fn(web_sys::Event)>);

    if let Err(err) =
        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
    {
        web_sys::console::error_1(&err);
    }
    closure.forget();
}
