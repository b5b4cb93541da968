use crate::config::TargetConfig;

/// JavaScript snippets evaluated in the page
///
/// Both are built from the configured item selector so that the probe counts
/// exactly the elements the extractor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScripts {
    /// Returns `{itemCount, scrollOffset, viewportHeight}`
    pub probe: String,

    /// Returns `[{href, text}]` for every matching element
    pub extract: String,
}

impl PageScripts {
    pub fn new(item_selector: &str) -> Self {
        // A JSON string literal is also a valid JS string literal.
        let selector = serde_json::Value::String(item_selector.to_string()).to_string();

        let probe = format!(
            "(() => ({{ \
                itemCount: document.querySelectorAll({selector}).length, \
                scrollOffset: Math.round(window.scrollY), \
                viewportHeight: Math.round(window.innerHeight) \
            }}))()"
        );

        let extract = format!(
            "Array.from(document.querySelectorAll({selector})).map(el => ({{ \
                href: el.href || el.getAttribute('href') || '', \
                text: el.innerText || '' \
            }}))"
        );

        Self { probe, extract }
    }

    pub fn for_target(target: &TargetConfig) -> Self {
        Self::new(&target.item_selector)
    }
}
