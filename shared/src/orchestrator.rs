//! Whole-page translation.
//!
//! [`SiteTranslator`] finds translatable elements through [`SelectorRules`],
//! remembers their original text on the element itself, translates them in
//! one batch and restores them when the page switches back to Chinese.

use std::cell::Cell;

use crate::{
    language::Language,
    storage::KeyValueStore,
    translation::{TranslationBackend, TranslationPipeline},
};

/// Attribute holding an element's first-observed text.
pub const ORIGINAL_TEXT_ATTR: &str = "data-original-text";
/// Attribute holding the last translation applied to an element.
pub const TRANSLATED_TEXT_ATTR: &str = "data-translated-text";
/// Attribute marking an element that currently shows translated text.
pub const TRANSLATED_FLAG_ATTR: &str = "data-translated";

/// Which elements take part in page translation.
///
/// Exclusion wins: an element matched by an excluded selector, or nested in
/// one, is never collected even if a translatable selector matches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRules {
    /// CSS selectors of elements whose text is translated.
    pub translatable: Vec<String>,
    /// CSS selectors of elements (and their subtrees) left alone.
    pub excluded: Vec<String>,
}

const SITE_TRANSLATABLE: &[&str] = &[
    "main h1",
    "main h2",
    "main h3",
    "main h4",
    "main p",
    "main li",
    "main .section-title",
    "main .accent-title",
    "main .course-scroll-item h3",
    "main .course-scroll-item p",
    "main .cooperation-group h3",
    "main .cooperation-group p",
    "main .cooperation-group li",
    "main .motion-group-item",
    "main .highlight-item p",
    "main .media-title",
    "main .media-source",
    "nav a",
];

const SITE_EXCLUDED: &[&str] = &[
    ".lang-switch",
    ".motion-group-item a",
    "footer",
    "header .company-name",
    "#malaysia-news",
    "#singapore-news",
    "#industry-news",
    ".archive-list",
];

impl SelectorRules {
    /// Rules from explicit selector lists.
    pub fn new<T, E>(translatable: T, excluded: E) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            translatable: translatable.into_iter().map(Into::into).collect(),
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// Rules for the Regional Pulse pages. News and archive lists are
    /// rendered per language by the loaders and stay excluded.
    pub fn site_default() -> Self {
        Self::new(SITE_TRANSLATABLE.iter().copied(), SITE_EXCLUDED.iter().copied())
    }
}

/// Minimal view of a document the translator needs.
///
/// The browser implementation wraps `web_sys::Document`; tests use an
/// in-memory tree.
pub trait PageDocument {
    /// Element handle. Equality is identity.
    type Element: Clone + PartialEq;

    /// Elements matching `selector` in document order. An invalid selector
    /// yields nothing.
    fn select_all(&self, selector: &str) -> Vec<Self::Element>;
    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &Self::Element, node: &Self::Element) -> bool;
    /// Upper-case tag name, e.g. `A`.
    fn tag_name(&self, element: &Self::Element) -> String;
    /// Full text content.
    fn text(&self, element: &Self::Element) -> String;
    /// Replace the element's content with `text`.
    fn set_text(&self, element: &Self::Element, text: &str);
    /// Attribute value, `None` when absent.
    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    /// Set an attribute.
    fn set_attribute(&self, element: &Self::Element, name: &str, value: &str);
    /// Remove an attribute if present.
    fn remove_attribute(&self, element: &Self::Element, name: &str);
    /// Number of element children.
    fn child_element_count(&self, element: &Self::Element) -> usize;
    /// Whether the element has a non-blank text node as a direct child.
    fn has_direct_text(&self, element: &Self::Element) -> bool;
}

/// Translates and restores a page according to [`SelectorRules`].
pub struct SiteTranslator<D, S, B> {
    document: D,
    rules: SelectorRules,
    pipeline: TranslationPipeline<S, B>,
    /// Language of the most recent request. A batch finishing after the
    /// page moved on only records its translations.
    requested: Cell<Language>,
}

impl<D, S, B> SiteTranslator<D, S, B>
where
    D: PageDocument,
    S: KeyValueStore,
    B: TranslationBackend,
{
    /// Translator over `document`.
    pub fn new(document: D, rules: SelectorRules, pipeline: TranslationPipeline<S, B>) -> Self {
        Self {
            document,
            rules,
            pipeline,
            requested: Cell::new(Language::SOURCE),
        }
    }

    /// The wrapped document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// The translation pipeline.
    pub fn pipeline(&self) -> &TranslationPipeline<S, B> {
        &self.pipeline
    }

    /// Bring the page into `lang`.
    pub async fn apply(&self, lang: Language) {
        if lang.is_source() {
            self.restore_originals();
        } else {
            self.translate_page(lang).await;
        }
    }

    /// Put every remembered original back. Untouched elements stay as they
    /// are; running it twice changes nothing.
    pub fn restore_originals(&self) {
        self.requested.set(Language::SOURCE);
        let doc = &self.document;
        for element in self.remembered() {
            if let Some(original) = doc.attribute(&element, ORIGINAL_TEXT_ATTR) {
                doc.set_text(&element, &original);
                doc.remove_attribute(&element, TRANSLATED_FLAG_ATTR);
            }
        }
    }

    /// Translate the page into `target`.
    ///
    /// Elements translated earlier get their remembered translation back
    /// without a network call, replacing whatever text they show now; newly
    /// found elements are translated in one batch.
    ///
    /// When another language is requested while the batch is in flight, the
    /// translations are remembered on the elements but not shown.
    pub async fn translate_page(&self, target: Language) {
        self.requested.set(target);
        self.reapply_translations();

        let elements = self.collect();
        if elements.is_empty() {
            return;
        }

        let doc = &self.document;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            let original = doc.text(element);
            texts.push(original.trim().to_string());
            doc.set_attribute(element, ORIGINAL_TEXT_ATTR, &original);
        }

        tracing::debug!("translating {} page elements into {target}", elements.len());
        let translations = self.pipeline.translate_batch(&texts, target).await;

        let current = self.requested.get() == target;
        if !current {
            tracing::debug!("page left {target} during translation, keeping originals");
        }
        for (element, translation) in elements.iter().zip(&translations) {
            doc.set_attribute(element, TRANSLATED_TEXT_ATTR, translation);
            if current {
                doc.set_text(element, translation);
                doc.set_attribute(element, TRANSLATED_FLAG_ATTR, "true");
            }
        }
    }

    /// Elements that should be translated now: matched, not excluded, with
    /// text, and not remembered yet. Document order per selector, no
    /// duplicates.
    pub fn collect(&self) -> Vec<D::Element> {
        let doc = &self.document;
        let excluded: Vec<D::Element> = self
            .rules
            .excluded
            .iter()
            .flat_map(|selector| doc.select_all(selector))
            .collect();

        let mut collected: Vec<D::Element> = Vec::new();
        for selector in &self.rules.translatable {
            for element in doc.select_all(selector) {
                if collected.contains(&element) {
                    continue;
                }
                if excluded.iter().any(|root| doc.contains(root, &element)) {
                    continue;
                }
                if self.is_skipped_element(&element) {
                    continue;
                }
                if doc.text(&element).trim().is_empty() {
                    continue;
                }
                if doc.attribute(&element, ORIGINAL_TEXT_ATTR).is_some() {
                    continue;
                }
                collected.push(element);
            }
        }
        collected
    }

    fn reapply_translations(&self) {
        let doc = &self.document;
        for element in self.remembered() {
            if let Some(translation) = doc.attribute(&element, TRANSLATED_TEXT_ATTR) {
                doc.set_text(&element, &translation);
                doc.set_attribute(&element, TRANSLATED_FLAG_ATTR, "true");
            }
        }
    }

    fn remembered(&self) -> Vec<D::Element> {
        self.document
            .select_all(&format!("[{ORIGINAL_TEXT_ATTR}]"))
    }

    fn is_skipped_element(&self, element: &D::Element) -> bool {
        let doc = &self.document;
        match doc.tag_name(element).as_str() {
            "BUTTON" => true,
            // Links wrapping other elements are translated through their
            // children.
            "A" => doc.child_element_count(element) > 0 && !doc.has_direct_text(element),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::{BTreeMap, HashMap},
        rc::Rc,
    };

    use async_trait::async_trait;
    use futures::{
        channel::oneshot,
        executor::{block_on, LocalPool},
        task::LocalSpawnExt,
    };

    use super::*;
    use crate::{
        storage::MemoryStore,
        translation::{TranslateError, TranslationCache},
    };

    #[derive(Debug, Default)]
    struct Node {
        tag: String,
        parent: Option<usize>,
        text: String,
        children: usize,
        direct_text: bool,
        attrs: BTreeMap<String, String>,
    }

    /// Tiny document: selectors are resolved from a fixed table, attribute
    /// selectors `[name]` are evaluated live.
    #[derive(Default)]
    struct FakeDocument {
        nodes: RefCell<Vec<Node>>,
        selectors: RefCell<HashMap<String, Vec<usize>>>,
    }

    impl FakeDocument {
        fn add(&self, tag: &str, parent: Option<usize>, text: &str) -> usize {
            let mut nodes = self.nodes.borrow_mut();
            if let Some(parent) = parent {
                nodes[parent].children += 1;
            }
            nodes.push(Node {
                tag: tag.to_string(),
                parent,
                text: text.to_string(),
                direct_text: !text.trim().is_empty(),
                ..Node::default()
            });
            nodes.len() - 1
        }

        fn bind(&self, selector: &str, ids: &[usize]) {
            self.selectors
                .borrow_mut()
                .insert(selector.to_string(), ids.to_vec());
        }

        fn text_of(&self, id: usize) -> String {
            self.nodes.borrow()[id].text.clone()
        }

        fn attr_of(&self, id: usize, name: &str) -> Option<String> {
            self.nodes.borrow()[id].attrs.get(name).cloned()
        }

        fn set_text_externally(&self, id: usize, text: &str) {
            self.nodes.borrow_mut()[id].text = text.to_string();
        }
    }

    impl PageDocument for FakeDocument {
        type Element = usize;

        fn select_all(&self, selector: &str) -> Vec<usize> {
            if let Some(name) = selector.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                return self
                    .nodes
                    .borrow()
                    .iter()
                    .enumerate()
                    .filter(|(_, node)| node.attrs.contains_key(name))
                    .map(|(id, _)| id)
                    .collect();
            }
            self.selectors
                .borrow()
                .get(selector)
                .cloned()
                .unwrap_or_default()
        }

        fn contains(&self, ancestor: &usize, node: &usize) -> bool {
            let nodes = self.nodes.borrow();
            let mut cursor = Some(*node);
            while let Some(id) = cursor {
                if id == *ancestor {
                    return true;
                }
                cursor = nodes[id].parent;
            }
            false
        }

        fn tag_name(&self, element: &usize) -> String {
            self.nodes.borrow()[*element].tag.to_uppercase()
        }

        fn text(&self, element: &usize) -> String {
            self.text_of(*element)
        }

        fn set_text(&self, element: &usize, text: &str) {
            self.set_text_externally(*element, text);
        }

        fn attribute(&self, element: &usize, name: &str) -> Option<String> {
            self.attr_of(*element, name)
        }

        fn set_attribute(&self, element: &usize, name: &str, value: &str) {
            self.nodes.borrow_mut()[*element]
                .attrs
                .insert(name.to_string(), value.to_string());
        }

        fn remove_attribute(&self, element: &usize, name: &str) {
            self.nodes.borrow_mut()[*element].attrs.remove(name);
        }

        fn child_element_count(&self, element: &usize) -> usize {
            self.nodes.borrow()[*element].children
        }

        fn has_direct_text(&self, element: &usize) -> bool {
            self.nodes.borrow()[*element].direct_text
        }
    }

    /// Prefixes every text with `EN:` and counts batches. A batch waits on
    /// `gate` when one is set.
    #[derive(Default)]
    struct PrefixBackend {
        batches: RefCell<Vec<Vec<String>>>,
        gate: RefCell<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait(?Send)]
    impl TranslationBackend for PrefixBackend {
        async fn translate(
            &self,
            texts: &[String],
            _target: Language,
        ) -> Result<Vec<String>, TranslateError> {
            self.batches.borrow_mut().push(texts.to_vec());
            let gate = self.gate.borrow_mut().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(texts.iter().map(|text| format!("EN:{text}")).collect())
        }
    }

    type Translator = SiteTranslator<FakeDocument, Rc<MemoryStore>, PrefixBackend>;

    fn translator(document: FakeDocument, rules: SelectorRules) -> Translator {
        let cache = TranslationCache::new(Rc::new(MemoryStore::new()));
        let pipeline = TranslationPipeline::new(cache, PrefixBackend::default());
        SiteTranslator::new(document, rules, pipeline)
    }

    fn batches(translator: &Translator) -> Vec<Vec<String>> {
        translator.pipeline().backend().batches.borrow().clone()
    }

    /// `main > (h1, p, ul#malaysia-news > li, button)` plus `nav > a`.
    fn sample_page() -> (FakeDocument, [usize; 6]) {
        let doc = FakeDocument::default();
        let main = doc.add("main", None, "");
        let h1 = doc.add("h1", Some(main), "  区域脉动 ");
        let p = doc.add("p", Some(main), "东南亚观察");
        let news = doc.add("ul", Some(main), "");
        let news_item = doc.add("li", Some(news), "新闻");
        let button = doc.add("button", Some(main), "按钮");
        let nav = doc.add("nav", None, "");
        let link = doc.add("a", Some(nav), "首页");

        doc.bind("main h1", &[h1]);
        doc.bind("main p", &[p]);
        doc.bind("main li", &[news_item]);
        doc.bind("main .btn", &[button]);
        doc.bind("nav a", &[link]);
        doc.bind("#malaysia-news", &[news]);
        (doc, [h1, p, news, news_item, button, link])
    }

    fn sample_rules() -> SelectorRules {
        SelectorRules::new(
            ["main h1", "main p", "main li", "main .btn", "nav a", "main h1"],
            ["#malaysia-news"],
        )
    }

    #[test]
    fn collects_matching_elements_once_and_skips_excluded() {
        let (doc, [h1, p, _, news_item, button, link]) = sample_page();
        let translator = translator(doc, sample_rules());

        let collected = translator.collect();
        assert_eq!(collected, vec![h1, p, link]);
        assert!(!collected.contains(&news_item));
        assert!(!collected.contains(&button));
    }

    #[test]
    fn element_matched_by_both_lists_is_excluded() {
        let doc = FakeDocument::default();
        let main = doc.add("main", None, "");
        let item = doc.add("li", Some(main), "新加坡");
        doc.bind("main li", &[item]);
        doc.bind(".lang-switch", &[item]);
        let translator = translator(doc, SelectorRules::new(["main li"], [".lang-switch"]));
        assert!(translator.collect().is_empty());
    }

    #[test]
    fn wrapper_links_without_direct_text_are_skipped() {
        let doc = FakeDocument::default();
        let nav = doc.add("nav", None, "");
        let wrapper = doc.add("a", Some(nav), "");
        let inner = doc.add("p", Some(wrapper), "关于我们");
        doc.nodes.borrow_mut()[wrapper].text = "关于我们".to_string();
        doc.bind("nav a", &[wrapper]);
        doc.bind("main p", &[inner]);
        let rules = SelectorRules::new(["nav a", "main p"], Vec::<String>::new());
        let translator = translator(doc, rules);
        assert_eq!(translator.collect(), vec![inner]);
    }

    #[test]
    fn translate_then_restore_roundtrips_exactly() {
        let (doc, [h1, p, _, news_item, _, link]) = sample_page();
        let translator = translator(doc, sample_rules());

        block_on(translator.apply(Language::En));
        let doc = translator.document();
        assert_eq!(doc.text_of(h1), "EN:区域脉动");
        assert_eq!(doc.text_of(p), "EN:东南亚观察");
        assert_eq!(doc.text_of(link), "EN:首页");
        assert_eq!(doc.text_of(news_item), "新闻");
        assert_eq!(doc.attr_of(h1, TRANSLATED_FLAG_ATTR).as_deref(), Some("true"));
        assert_eq!(
            batches(&translator),
            vec![vec![
                "区域脉动".to_string(),
                "东南亚观察".to_string(),
                "首页".to_string()
            ]]
        );

        block_on(translator.apply(Language::Zh));
        let doc = translator.document();
        assert_eq!(doc.text_of(h1), "  区域脉动 ");
        assert_eq!(doc.text_of(p), "东南亚观察");
        assert_eq!(doc.attr_of(h1, TRANSLATED_FLAG_ATTR), None);

        // Second trip: translations come back without recollecting.
        block_on(translator.apply(Language::En));
        block_on(translator.apply(Language::En));
        assert_eq!(translator.document().text_of(p), "EN:东南亚观察");
        assert_eq!(batches(&translator).len(), 1);

        block_on(translator.apply(Language::Zh));
        assert_eq!(translator.document().text_of(h1), "  区域脉动 ");
    }

    /// Starts `apply(En)` on `pool` and leaves it waiting on the backend.
    fn start_gated_translation(
        pool: &mut LocalPool,
        translator: &Rc<Translator>,
    ) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *translator.pipeline().backend().gate.borrow_mut() = Some(gate);
        let pending = Rc::clone(translator);
        pool.spawner()
            .spawn_local(async move { pending.apply(Language::En).await })
            .unwrap();
        pool.run_until_stalled();
        release
    }

    #[test]
    fn late_batch_does_not_undo_a_switch_back() {
        let (doc, [h1, p, ..]) = sample_page();
        let translator = Rc::new(translator(doc, sample_rules()));
        let mut pool = LocalPool::new();

        let release = start_gated_translation(&mut pool, &translator);
        pool.run_until(translator.apply(Language::Zh));
        assert_eq!(translator.document().text_of(h1), "  区域脉动 ");

        release.send(()).unwrap();
        pool.run();
        let doc = translator.document();
        assert_eq!(doc.text_of(h1), "  区域脉动 ");
        assert_eq!(doc.text_of(p), "东南亚观察");
        assert_eq!(doc.attr_of(h1, TRANSLATED_FLAG_ATTR), None);
        assert_eq!(doc.attr_of(h1, TRANSLATED_TEXT_ATTR).as_deref(), Some("EN:区域脉动"));

        // The finished batch is reused on the next switch.
        pool.run_until(translator.apply(Language::En));
        assert_eq!(translator.document().text_of(h1), "EN:区域脉动");
        assert_eq!(batches(&translator).len(), 1);
    }

    #[test]
    fn late_batch_is_shown_when_english_was_requested_again() {
        let (doc, [h1, ..]) = sample_page();
        let translator = Rc::new(translator(doc, sample_rules()));
        let mut pool = LocalPool::new();

        let release = start_gated_translation(&mut pool, &translator);
        pool.run_until(translator.apply(Language::Zh));
        pool.run_until(translator.apply(Language::En));
        assert_eq!(translator.document().text_of(h1), "  区域脉动 ");

        release.send(()).unwrap();
        pool.run();
        assert_eq!(translator.document().text_of(h1), "EN:区域脉动");
        assert_eq!(
            translator.document().attr_of(h1, TRANSLATED_FLAG_ATTR).as_deref(),
            Some("true")
        );
        assert_eq!(batches(&translator).len(), 1);
    }

    #[test]
    fn restore_is_idempotent_and_leaves_untouched_elements() {
        let (doc, [h1, ..]) = sample_page();
        let translator = translator(doc, sample_rules());
        translator.restore_originals();
        translator.restore_originals();
        assert_eq!(translator.document().text_of(h1), "  区域脉动 ");
        assert_eq!(translator.document().attr_of(h1, ORIGINAL_TEXT_ATTR), None);
    }

    #[test]
    fn remembered_original_is_never_overwritten() {
        let (doc, [h1, ..]) = sample_page();
        let translator = translator(doc, sample_rules());
        block_on(translator.apply(Language::En));

        translator.document().set_text_externally(h1, "别处改写");
        block_on(translator.apply(Language::En));
        assert_eq!(
            translator.document().attr_of(h1, ORIGINAL_TEXT_ATTR).as_deref(),
            Some("  区域脉动 ")
        );

        block_on(translator.apply(Language::Zh));
        assert_eq!(translator.document().text_of(h1), "  区域脉动 ");
    }

    #[test]
    fn new_content_is_picked_up_on_later_switches() {
        let (doc, [h1, ..]) = sample_page();
        let translator = translator(doc, sample_rules());
        block_on(translator.apply(Language::En));

        let doc = translator.document();
        let late = doc.add("h1", Some(0), "新增");
        doc.bind("main h1", &[h1, late]);
        block_on(translator.apply(Language::En));

        assert_eq!(translator.document().text_of(late), "EN:新增");
        assert_eq!(batches(&translator).len(), 2);
        assert_eq!(batches(&translator)[1], vec!["新增".to_string()]);
    }

    #[test]
    fn site_rules_exclude_loader_containers() {
        let rules = SelectorRules::site_default();
        for selector in ["#malaysia-news", "#singapore-news", "#industry-news", ".archive-list"] {
            assert!(rules.excluded.iter().any(|s| s == selector), "{selector} not excluded");
        }
        assert!(rules.translatable.iter().any(|s| s == "nav a"));
        assert!(rules
            .translatable
            .iter()
            .all(|selector| !rules.excluded.contains(selector)));
    }
}
