//! Rich-text description helpers.
//!
//! Descriptions arrive as HTML produced by a rich-text editor. Two things
//! are needed from them:
//!
//! - [`sanitize`]: the markup a presentation layer may render. Only
//!   `p strong em u ol ul li a br` survive, `script`/`style` bodies are
//!   dropped, and `a` keeps nothing but an `http`, `https` or `mailto`
//!   `href`. Cleaning is done by `ammonia`.
//! - [`to_plain_text`]: the text the search engine matches against. The
//!   description is first reduced by `ammonia` to block elements only, then
//!   read with `quick_xml` to collect text and decode entities.

use std::collections::{HashMap, HashSet};

use ammonia::Builder;
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

const ALLOWED_TAGS: [&str; 9] = ["p", "strong", "em", "u", "ol", "ul", "li", "a", "br"];
const LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];
const BLOCK_TAGS: [&str; 14] = [
    "p", "br", "li", "ol", "ul", "div", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "blockquote",
];

fn description_policy() -> Builder<'static> {
    let mut builder = Builder::default();
    builder
        .tags(HashSet::from(ALLOWED_TAGS))
        .generic_attributes(HashSet::<&str>::new())
        .tag_attributes(HashMap::from([("a", HashSet::from(["href"]))]))
        .url_schemes(HashSet::from(LINK_SCHEMES))
        .link_rel(None);
    builder
}

/// Block elements only, no attributes. Every element boundary becomes a
/// word break in [`to_plain_text`].
fn text_policy() -> Builder<'static> {
    let mut builder = Builder::default();
    builder
        .tags(HashSet::from(BLOCK_TAGS))
        .generic_attributes(HashSet::<&str>::new())
        .tag_attributes(HashMap::<&str, HashSet<&str>>::new())
        .link_rel(None);
    builder
}

/// Reduce rich-text HTML to the allowed tag set.
pub fn sanitize(html: &str) -> String {
    description_policy().clean(html).to_string()
}

/// Strip all markup and decode entities, collapsing whitespace.
pub fn to_plain_text(html: &str) -> String {
    let skeleton = text_policy().clean(html).to_string();

    let mut reader = Reader::from_str(&skeleton);
    // `<br>` has no end tag in serialized HTML.
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    let mut raw = String::with_capacity(skeleton.len());
    loop {
        match reader.read_event() {
            Ok(Event::Text(text)) => match text.unescape_with(resolve_html5_entity) {
                Ok(decoded) => raw.push_str(&decoded),
                Err(e) => {
                    debug!(error = %e, "undecodable text in description");
                    raw.push_str(&String::from_utf8_lossy(&text));
                }
            },
            Ok(Event::Start(_) | Event::End(_) | Event::Empty(_)) => raw.push(' '),
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, "stopped reading description markup");
                break;
            }
            _ => {}
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
