use regional_pulse_shared::orchestrator::PageDocument;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Node, NodeList};

/// The live page as seen by the site translator.
#[derive(Clone)]
pub struct BrowserDocument {
    document: Document,
}

impl BrowserDocument {
    pub fn current() -> Option<Self> {
        let document = web_sys::window()?.document()?;
        Some(Self {
            document,
        })
    }

    pub fn inner(&self) -> &Document {
        &self.document
    }
}

pub fn elements(list: &NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|index| list.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// `querySelectorAll` that treats an invalid selector as "no match".
pub fn query_all(root: &Document, selector: &str) -> Vec<Element> {
    match root.query_selector_all(selector) {
        Ok(list) => elements(&list),
        Err(_) => {
            web_sys::console::warn_1(&format!("Invalid selector: {selector}").into());
            Vec::new()
        },
    }
}

impl PageDocument for BrowserDocument {
    type Element = Element;

    fn select_all(&self, selector: &str) -> Vec<Element> {
        query_all(&self.document, selector)
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &Node = node;
        ancestor.contains(Some(node))
    }

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name().to_ascii_uppercase()
    }

    fn text(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn set_text(&self, element: &Element, text: &str) {
        element.set_text_content(Some(text));
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&self, element: &Element, name: &str, value: &str) {
        let _ = element.set_attribute(name, value);
    }

    fn remove_attribute(&self, element: &Element, name: &str) {
        let _ = element.remove_attribute(name);
    }

    fn child_element_count(&self, element: &Element) -> usize {
        element.child_element_count() as usize
    }

    fn has_direct_text(&self, element: &Element) -> bool {
        let children = element.child_nodes();
        (0..children.length())
            .filter_map(|index| children.item(index))
            .any(|child| {
                child.node_type() == Node::TEXT_NODE
                    && child
                        .text_content()
                        .is_some_and(|text| !text.trim().is_empty())
            })
    }
}
