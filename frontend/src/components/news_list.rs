use regional_pulse_shared::{
    content::{display_summary, display_text, item_href, NewsItem},
    Language,
};
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct NewsListProps {
    pub items: Vec<NewsItem>,
    pub lang: Language,
    /// Render each item's summary as a hover tooltip.
    #[prop_or_default]
    pub with_summary: bool,
    /// Shown as a single entry when `items` is empty.
    #[prop_or_default]
    pub empty_notice: Option<AttrValue>,
}

#[function_component(NewsList)]
pub fn news_list(props: &NewsListProps) -> Html {
    let NewsListProps {
        items,
        lang,
        with_summary,
        empty_notice,
    } = props;

    if items.is_empty() {
        return match empty_notice {
            Some(notice) => html! {
                <li class="motion-group-item visible">{ notice.clone() }</li>
            },
            None => html! {},
        };
    }

    items
        .iter()
        .map(|item| {
            let summary = with_summary
                .then(|| display_summary(item, *lang))
                .filter(|summary| !summary.is_empty());

            html! {
                <li class="motion-group-item visible">
                    <a
                        href={item_href(item).to_string()}
                        target="_blank"
                        rel="noopener noreferrer"
                    >
                        { display_text(item, *lang).to_string() }
                    </a>
                    if let Some(summary) = summary {
                        <div class="news-item-tooltip">{ summary }</div>
                    }
                </li>
            }
        })
        .collect::<Html>()
}
