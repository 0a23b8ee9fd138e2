use gloo_timers::callback::Timeout;
use regional_pulse_shared::motion::{
    plan_group_batch, plan_item_group, transition_delay, ItemGroup, ENTRANCE_SELECTOR,
    ENTRANCE_THRESHOLD, GROUP_SELECTOR, ITEM_GROUPS, PAGE_DEFINITION_CLASS, ROOT_MARGIN,
    VISIBLE_CLASS,
};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverInit,
};

use crate::dom::{elements, query_all};

/// Wire every entrance animation on the page.
pub fn init(document: &Document) {
    mark_page_definition(document);
    observe_entrances(document);
    observe_groups(document);
    for group in ITEM_GROUPS {
        observe_item_group(document, group);
    }
}

/// The section holding the page's `h1` is shown right away.
fn mark_page_definition(document: &Document) {
    let definition = query_all(document, &format!("main {ENTRANCE_SELECTOR}"))
        .into_iter()
        .find(|section| matches!(section.query_selector("h1"), Ok(Some(_))));
    if let Some(section) = definition {
        let _ = section
            .class_list()
            .add_2(PAGE_DEFINITION_CLASS, VISIBLE_CLASS);
    }
}

fn observe_entrances(document: &Document) {
    let targets: Vec<Element> = query_all(document, ENTRANCE_SELECTOR)
        .into_iter()
        .filter(|element| !element.class_list().contains(VISIBLE_CLASS))
        .collect();
    if targets.is_empty() {
        return;
    }

    let observer = new_observer(|batch, observer| {
        for (target, intersecting) in batch {
            if intersecting {
                reveal(&target);
                observer.unobserve(&target);
            }
        }
    });
    watch(observer, &targets);
}

fn observe_groups(document: &Document) {
    let targets = query_all(document, GROUP_SELECTOR);
    if targets.is_empty() {
        return;
    }

    let observer = new_observer(|batch, observer| {
        for (target, delay) in plan_group_batch(batch) {
            if let Some(html) = target.dyn_ref::<HtmlElement>() {
                let _ = html
                    .style()
                    .set_property("transition-delay", &transition_delay(delay));
            }
            reveal(&target);
            observer.unobserve(&target);
        }
    });
    watch(observer, &targets);
}

/// Each container gets its own observer so containers never wait on each
/// other.
fn observe_item_group(document: &Document, group: ItemGroup) {
    for container in query_all(document, group.container) {
        let item_selector = group.item;
        let observer = new_observer(move |batch, observer| {
            for (target, intersecting) in batch {
                if !intersecting {
                    continue;
                }
                observer.unobserve(&target);
                let items = query_all_in(&target, item_selector);
                let delays = plan_item_group(items.len());
                for (item, delay) in items.into_iter().zip(delays) {
                    Timeout::new(delay, move || reveal(&item)).forget();
                }
            }
        });
        match observer {
            Some(observer) => observer.observe(&container),
            None => query_all_in(&container, item_selector).iter().for_each(reveal),
        }
    }
}

fn query_all_in(container: &Element, selector: &str) -> Vec<Element> {
    container
        .query_selector_all(selector)
        .map(|list| elements(&list))
        .unwrap_or_default()
}

fn reveal(element: &Element) {
    let _ = element.class_list().add_1(VISIBLE_CLASS);
}

fn new_observer(
    mut handler: impl FnMut(Vec<(Element, bool)>, &IntersectionObserver) + 'static,
) -> Option<IntersectionObserver> {
    let callback = Closure::wrap(Box::new(
        move |entries: js_sys::Array, observer: IntersectionObserver| {
            let batch = entries
                .iter()
                .filter_map(|entry| entry.dyn_into::<IntersectionObserverEntry>().ok())
                .map(|entry| (entry.target(), entry.is_intersecting()))
                .collect();
            handler(batch, &observer);
        },
    ) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(ENTRANCE_THRESHOLD));
    options.set_root_margin(ROOT_MARGIN);

    match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
        Ok(observer) => {
            callback.forget();
            Some(observer)
        },
        Err(err) => {
            web_sys::console::warn_1(&err);
            None
        },
    }
}

/// Observe `targets`, or show them at once when observers are unsupported.
fn watch(observer: Option<IntersectionObserver>, targets: &[Element]) {
    match observer {
        Some(observer) => targets.iter().for_each(|target| observer.observe(target)),
        None => targets.iter().for_each(reveal),
    }
}
