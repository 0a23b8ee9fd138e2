//! Browser side of the Regional Pulse site.

mod api;
mod components;
mod config;
mod dom;
mod i18n;
mod language;
mod loaders;
mod motion;
mod storage;

use std::rc::Rc;

use regional_pulse_shared::{
    orchestrator::{SelectorRules, SiteTranslator},
    translation::TranslationCache,
    Language, LanguageStore, TranslationPipeline,
};
use wasm_bindgen_futures::spawn_local;

use crate::{
    api::HttpTranslator, dom::BrowserDocument, language::PageLanguage, loaders::ContentLoaders,
    storage::BrowserStorage,
};

type PageTranslator = SiteTranslator<BrowserDocument, Rc<BrowserStorage>, HttpTranslator>;

/// Bring loader content and page text into `lang`.
async fn apply_language(
    loaders: Rc<ContentLoaders>,
    translator: Rc<PageTranslator>,
    lang: Language,
) {
    futures::join!(loaders.refresh(lang), translator.apply(lang));
}

fn main() {
    let Some(page) = BrowserDocument::current() else {
        web_sys::console::error_1(&"No document to attach to".into());
        return;
    };
    let document = page.inner().clone();

    // Startup order: storage, language, pipeline, translator, loaders, motion.
    let storage = Rc::new(BrowserStorage::open());
    let store: PageLanguage = LanguageStore::load(Rc::clone(&storage));
    let pipeline = TranslationPipeline::new(
        TranslationCache::new(Rc::clone(&storage)),
        HttpTranslator::default(),
    );
    let translator: Rc<PageTranslator> =
        Rc::new(SiteTranslator::new(page, SelectorRules::site_default(), pipeline));
    let loaders = Rc::new(ContentLoaders::new(document.clone()));

    let initial = store.current();
    language::sync_page(&document, initial);
    language::bind_switches(&document, &store);

    {
        let document = document.clone();
        let loaders = Rc::clone(&loaders);
        let translator = Rc::clone(&translator);
        store
            .subscribe(move |change| {
                language::sync_page(&document, change.lang);
                language::dispatch_change(&document, change);
                spawn_local(apply_language(
                    Rc::clone(&loaders),
                    Rc::clone(&translator),
                    change.lang,
                ));
            })
            .detach();
    }

    if initial.is_source() {
        spawn_local(async move { loaders.refresh(initial).await });
    } else {
        spawn_local(apply_language(loaders, translator, initial));
    }

    motion::init(&document);
}
