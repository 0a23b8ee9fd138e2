use std::cell::RefCell;

use futures::future::join_all;
use regional_pulse_shared::{
    content::{
        archive_columns, archive_dates, archive_url, insights_items, merge_snapshots,
        plan_archive_update, ArchiveColumns, ArchiveUpdate, NewsSnapshot, RefreshGeneration,
        ARCHIVE_DAYS, ARCHIVE_DIR, INSIGHTS_URL, REGION_MALAYSIA, REGION_SINGAPORE,
    },
    Language,
};
use web_sys::{Document, Element};
use yew::{AppHandle, AttrValue, Renderer};

use crate::{
    api::fetch_json,
    components::news_list::{NewsList, NewsListProps},
    config::asset_path,
    dom::query_all,
    i18n,
};

const ARCHIVE_LIST_SELECTOR: &str = ".archive-list";

/// Insights container ids and the list each one shows. `None` is the
/// industry list.
const INSIGHTS_SLOTS: [(&str, Option<&str>); 3] = [
    ("malaysia-news", Some(REGION_MALAYSIA)),
    ("singapore-news", Some(REGION_SINGAPORE)),
    ("industry-news", None),
];

/// Renders the archive page and the insights feed into their static
/// containers and re-renders them on language changes.
///
/// Overlapping refreshes may fetch concurrently, but only the most recently
/// started one renders.
pub struct ContentLoaders {
    document: Document,
    generation: RefreshGeneration,
    archive: RefCell<Option<[AppHandle<NewsList>; 2]>>,
    insights: RefCell<Vec<(&'static str, AppHandle<NewsList>)>>,
}

impl ContentLoaders {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            generation: RefreshGeneration::default(),
            archive: RefCell::new(None),
            insights: RefCell::new(Vec::new()),
        }
    }

    /// Fetch and render everything present on this page in `lang`.
    pub async fn refresh(&self, lang: Language) {
        let ticket = self.generation.begin();
        futures::join!(self.refresh_archive(lang, ticket), self.refresh_insights(lang, ticket));
    }

    async fn refresh_archive(&self, lang: Language, ticket: u64) {
        let containers = query_all(&self.document, ARCHIVE_LIST_SELECTOR);
        let [policy_root, industry_root] = match containers.as_slice() {
            [first, second, ..] => [first.clone(), second.clone()],
            _ => return,
        };

        let loaded = load_archive().await;
        if !self.generation.is_current(ticket) {
            return;
        }
        let rendered = self.archive.borrow().is_some();
        let (columns, notice) = match plan_archive_update(loaded, rendered) {
            ArchiveUpdate::Keep => {
                web_sys::console::warn_1(&"Archive refetch failed, keeping current list".into());
                return;
            },
            ArchiveUpdate::Render {
                columns,
                notice,
            } => (columns, notice),
        };

        let empty_notice = notice.then(|| AttrValue::from(i18n::labels(lang).no_archive_data));
        let policy = NewsListProps {
            items: columns.policy,
            lang,
            with_summary: false,
            empty_notice,
        };
        let industry = NewsListProps {
            items: columns.industry,
            lang,
            with_summary: false,
            empty_notice: None,
        };

        let mut archive = self.archive.borrow_mut();
        match archive.as_mut() {
            Some([policy_handle, industry_handle]) => {
                policy_handle.update(policy);
                industry_handle.update(industry);
            },
            None => {
                *archive = Some([mount(policy_root, policy), mount(industry_root, industry)]);
            },
        }
    }

    async fn refresh_insights(&self, lang: Language, ticket: u64) {
        let present = INSIGHTS_SLOTS
            .iter()
            .any(|(id, _)| self.document.get_element_by_id(id).is_some());
        if !present {
            return;
        }

        let snapshot = match fetch_json::<NewsSnapshot>(&asset_path(INSIGHTS_URL)).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                web_sys::console::error_1(&format!("Failed to load insights: {}", e).into());
                return;
            },
        };
        if !self.generation.is_current(ticket) {
            return;
        }

        let mut insights = self.insights.borrow_mut();
        for (id, region) in INSIGHTS_SLOTS {
            let Some(items) = insights_items(&snapshot, region) else {
                continue;
            };
            let props = NewsListProps {
                items,
                lang,
                with_summary: true,
                empty_notice: None,
            };

            match insights.iter().position(|(mounted, _)| *mounted == id) {
                Some(index) => insights[index].1.update(props),
                None => {
                    if let Some(root) = self.document.get_element_by_id(id) {
                        insights.push((id, mount(root, props)));
                    }
                },
            }
        }
    }
}

/// Merge every archive day that loads. `None` when not a single day did.
async fn load_archive() -> Option<ArchiveColumns> {
    let today = chrono::Local::now().date_naive();
    let urls: Vec<String> = archive_dates(today, ARCHIVE_DAYS)
        .iter()
        .map(|date| asset_path(&archive_url(ARCHIVE_DIR, date)))
        .collect();

    let results = join_all(urls.iter().map(|url| fetch_json::<NewsSnapshot>(url))).await;
    let snapshots: Vec<NewsSnapshot> = results.into_iter().filter_map(Result::ok).collect();
    if snapshots.is_empty() {
        return None;
    }
    Some(archive_columns(&merge_snapshots(snapshots)))
}

/// Replace the container's static markup with a live list.
fn mount(root: Element, props: NewsListProps) -> AppHandle<NewsList> {
    root.set_inner_html("");
    Renderer::<NewsList>::with_root_and_props(root, props).render()
}
