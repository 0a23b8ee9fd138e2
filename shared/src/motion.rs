//! Entrance animation timing.
//!
//! The browser crate observes elements; this module decides which of them
//! to reveal and with what delay.

/// Fraction of an element that must be visible to trigger its entrance.
pub const ENTRANCE_THRESHOLD: f64 = 0.1;
/// Observer root margin: trigger slightly before the bottom edge.
pub const ROOT_MARGIN: &str = "0px 0px -20px 0px";
/// Delay between consecutive items of a group.
pub const GROUP_DELAY_BASE_MS: u32 = 80;
/// Extra delay for supplementary content (list items, highlights).
pub const SUPPLEMENTARY_DELAY_MS: u32 = 120;
/// Flag-class that starts the CSS transition.
pub const VISIBLE_CLASS: &str = "visible";
/// Flag-class of the section that defines the page.
pub const PAGE_DEFINITION_CLASS: &str = "motion-page-definition";

/// Single elements revealed on their own.
pub const ENTRANCE_SELECTOR: &str = ".motion-entrance";
/// Elements revealed in sequence as they enter together.
pub const GROUP_SELECTOR: &str = ".motion-group";

/// A container whose items appear one after another once the container
/// scrolls into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemGroup {
    /// Selector of the observed container.
    pub container: &'static str,
    /// Selector of the items, relative to the container.
    pub item: &'static str,
}

/// Item groups present on the site.
pub const ITEM_GROUPS: [ItemGroup; 2] = [
    ItemGroup {
        container: ".motion-group-container",
        item: ".motion-group-item",
    },
    ItemGroup {
        container: ".highlights-track",
        item: ".highlight-item",
    },
];

/// Delay of the `index`-th element of a sequence.
pub fn stagger_delay_ms(index: usize, supplementary: bool) -> u32 {
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    let base = if supplementary { SUPPLEMENTARY_DELAY_MS } else { 0 };
    base.saturating_add(index.saturating_mul(GROUP_DELAY_BASE_MS))
}

/// Reveal plan for one batch of `.motion-group` observer entries.
///
/// `entries` pairs each target with its intersecting flag in delivery order.
/// Intersecting targets are delayed by their position within the batch, so
/// elements entering together cascade.
pub fn plan_group_batch<T>(entries: impl IntoIterator<Item = (T, bool)>) -> Vec<(T, u32)> {
    entries
        .into_iter()
        .enumerate()
        .filter(|(_, (_, intersecting))| *intersecting)
        .map(|(index, (target, _))| (target, stagger_delay_ms(index, false)))
        .collect()
}

/// Delays for the items of an [`ItemGroup`] whose container just came into
/// view.
pub fn plan_item_group(item_count: usize) -> Vec<u32> {
    (0..item_count)
        .map(|index| stagger_delay_ms(index, true))
        .collect()
}

/// CSS `transition-delay` value.
pub fn transition_delay(delay_ms: u32) -> String {
    format!("{delay_ms}ms")
}
