//! News feed data: the dated archive files and the insights feed.
//!
//! Fetching and rendering happen in the browser crate; merging, ordering and
//! per-language text selection are here, as are the render decisions the
//! loaders act on.

use std::{cell::Cell, collections::BTreeMap, sync::OnceLock};

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Directory holding one archive file per day.
pub const ARCHIVE_DIR: &str = "assets/data/archive";
/// Number of days the archive page loads, today included.
pub const ARCHIVE_DAYS: u32 = 30;
/// Insights feed file.
pub const INSIGHTS_URL: &str = "assets/data/insights-data.json";

/// Region keys of `recent_observations`, in display order.
pub const REGIONS: [&str; 2] = [REGION_MALAYSIA, REGION_SINGAPORE];
/// Malaysia region key.
pub const REGION_MALAYSIA: &str = "马来西亚";
/// Singapore region key.
pub const REGION_SINGAPORE: &str = "新加坡";

/// One headline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// English headline, usually prefixed with a `[DD-MM-YY]` date tag.
    #[serde(default)]
    pub text: String,
    /// Chinese headline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_zh: Option<String>,
    /// English summary, may contain HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Chinese summary, may contain HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_zh: Option<String>,
    /// Source article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Contents of an archive day file or of the insights feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsSnapshot {
    /// Policy observations keyed by region.
    #[serde(default)]
    pub recent_observations: BTreeMap<String, Vec<NewsItem>>,
    /// Industry and market observations.
    #[serde(default)]
    pub industry_observations: Vec<NewsItem>,
    /// Generation time, set on the insights feed only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl NewsSnapshot {
    /// Items of one region, empty when the region is missing.
    pub fn region(&self, region: &str) -> &[NewsItem] {
        self.recent_observations
            .get(region)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Whether no region and no industry item is present.
    pub fn is_empty(&self) -> bool {
        self.industry_observations.is_empty()
            && self.recent_observations.values().all(Vec::is_empty)
    }
}

/// The two columns of the archive page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveColumns {
    /// All region items, region by region in [`REGIONS`] order.
    pub policy: Vec<NewsItem>,
    /// Industry items.
    pub industry: Vec<NewsItem>,
}

impl ArchiveColumns {
    /// Whether both columns are empty.
    pub fn is_empty(&self) -> bool {
        self.policy.is_empty() && self.industry.is_empty()
    }
}

/// `YYYY-MM-DD` strings for `today` and the `days - 1` days before it,
/// newest first.
pub fn archive_dates(today: NaiveDate, days: u32) -> Vec<String> {
    (0..days)
        .map(|offset| today - Duration::days(i64::from(offset)))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .collect()
}

/// Location of the archive file for `date`.
pub fn archive_url(dir: &str, date: &str) -> String {
    format!("{}/{date}.json", dir.trim_end_matches('/'))
}

/// Concatenate day files (in the given order) and sort every list newest
/// first. Missing days are simply absent from the input.
pub fn merge_snapshots(snapshots: impl IntoIterator<Item = NewsSnapshot>) -> NewsSnapshot {
    let mut merged = NewsSnapshot::default();
    for snapshot in snapshots {
        for (region, items) in snapshot.recent_observations {
            merged.recent_observations.entry(region).or_default().extend(items);
        }
        merged.industry_observations.extend(snapshot.industry_observations);
    }

    for items in merged.recent_observations.values_mut() {
        sort_newest_first(items);
    }
    sort_newest_first(&mut merged.industry_observations);
    merged
}

/// Split a merged archive into the page's two columns.
pub fn archive_columns(snapshot: &NewsSnapshot) -> ArchiveColumns {
    ArchiveColumns {
        policy: REGIONS
            .iter()
            .flat_map(|region| snapshot.region(region).iter().cloned())
            .collect(),
        industry: snapshot.industry_observations.clone(),
    }
}

/// What the archive page shows after a fetch round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveUpdate {
    /// Leave the rendered lists as they are.
    Keep,
    /// Render `columns`; `notice` asks for the "no archive data" entry.
    Render {
        /// Lists to render.
        columns: ArchiveColumns,
        /// Both lists are empty.
        notice: bool,
    },
}

/// Decide the archive render. `loaded` is `None` when not a single day file
/// loaded; that keeps a list already on the page and otherwise shows the
/// empty notice.
pub fn plan_archive_update(loaded: Option<ArchiveColumns>, rendered: bool) -> ArchiveUpdate {
    match loaded {
        None if rendered => ArchiveUpdate::Keep,
        loaded => {
            let columns = loaded.unwrap_or_default();
            let notice = columns.is_empty();
            ArchiveUpdate::Render {
                columns,
                notice,
            }
        },
    }
}

/// Items for one insights container: a region's list, or the industry list
/// for `None`. An empty list yields `None` so the container keeps its
/// current content.
pub fn insights_items(snapshot: &NewsSnapshot, region: Option<&str>) -> Option<Vec<NewsItem>> {
    let items = match region {
        Some(region) => snapshot.region(region),
        None => snapshot.industry_observations.as_slice(),
    };
    (!items.is_empty()).then(|| items.to_vec())
}

/// Orders overlapping loader rounds: only the most recently started round
/// may render.
#[derive(Debug, Default)]
pub struct RefreshGeneration {
    latest: Cell<u64>,
}

impl RefreshGeneration {
    /// Start a round and return its ticket.
    pub fn begin(&self) -> u64 {
        let ticket = self.latest.get().wrapping_add(1);
        self.latest.set(ticket);
        ticket
    }

    /// Whether no round started after `ticket`.
    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.get() == ticket
    }
}

fn date_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[(\d{2}-\d{2}-\d{2})").expect("valid date token regex"))
}

fn html_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid html tag regex"))
}

/// The `NN-NN-NN` date tag of a headline, e.g. `24-01-05` in
/// `[24-01-05] Budget passed`.
pub fn date_token(text: &str) -> Option<&str> {
    date_token_pattern()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
}

/// Sort by date token, descending as strings. Untagged items go last; ties
/// keep their order.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| {
        match (date_token(&a.text), date_token(&b.text)) {
            (Some(left), Some(right)) => right.cmp(left),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

fn pick<'a>(lang: Language, english: &'a str, chinese: Option<&'a str>) -> &'a str {
    let chinese = chinese.filter(|value| !value.is_empty());
    let english = Some(english).filter(|value| !value.is_empty());
    let ordered = match lang {
        Language::Zh => chinese.or(english),
        Language::En => english.or(chinese),
    };
    ordered.unwrap_or_default()
}

/// Headline for `lang`: that language's field, then the other one, then "".
pub fn display_text(item: &NewsItem, lang: Language) -> &str {
    pick(lang, &item.text, item.text_zh.as_deref())
}

/// Summary for `lang` as plain text (tags stripped, trimmed). Empty when
/// neither summary is present.
pub fn display_summary(item: &NewsItem, lang: Language) -> String {
    let raw = pick(
        lang,
        item.summary.as_deref().unwrap_or_default(),
        item.summary_zh.as_deref(),
    );
    strip_tags(raw)
}

/// Remove HTML tags and surrounding whitespace.
pub fn strip_tags(html: &str) -> String {
    html_tag_pattern().replace_all(html, "").trim().to_string()
}

/// Link target for an item; `#` when the item has none.
pub fn item_href(item: &NewsItem) -> &str {
    item.link
        .as_deref()
        .filter(|link| !link.is_empty())
        .unwrap_or("#")
}
