//! Link URI sanitizing.

use crate::tree::Node;

/// Replacement for URIs with an unsafe scheme.
pub const NEUTRALIZED_URI: &str = "javascript:void(0)";

const SAFE_PROTOCOLS: &[&str] = &["http", "https", "mailto", "tel"];

/// Sanitize a link or image URI.
///
/// `app://` deep links are returned untouched. Otherwise the URI is trimmed
/// and kept when it is relative or uses `http`, `https`, `mailto` or `tel`;
/// anything else becomes [`NEUTRALIZED_URI`].
///
/// # Examples
///
/// ```
/// use rw_message::transform_link_uri;
///
/// assert_eq!(transform_link_uri("app://channel/42"), "app://channel/42");
/// assert_eq!(transform_link_uri(" https://a.io "), "https://a.io");
/// assert_eq!(transform_link_uri("javascript:alert(1)"), "javascript:void(0)");
/// ```
#[must_use]
pub fn transform_link_uri(uri: &str) -> &str {
    if uri.starts_with("app://") {
        return uri;
    }
    let url = uri.trim();
    if url.starts_with('#') || url.starts_with('/') {
        return url;
    }
    let Some(colon) = url.find(':') else {
        return url;
    };
    let scheme = &url[..colon];
    if SAFE_PROTOCOLS.iter().any(|safe| scheme.eq_ignore_ascii_case(safe)) {
        return url;
    }
    // A colon inside the query or fragment does not start a scheme.
    let before_colon = |c: char| url.find(c).is_some_and(|index| index < colon);
    if before_colon('?') || before_colon('#') {
        return url;
    }
    tracing::debug!(uri, "Neutralizing link with unsafe scheme");
    NEUTRALIZED_URI
}

/// Apply [`transform_link_uri`] to every `a[href]` and `img[src]`.
pub(crate) fn sanitize_links(nodes: &mut [Node]) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        let attr = match element.tag.as_str() {
            "a" => Some("href"),
            "img" => Some("src"),
            _ => None,
        };
        if let Some(attr) = attr
            && let Some(value) = element.attrs.get_mut(attr)
        {
            let sanitized = transform_link_uri(value).to_owned();
            if sanitized != *value {
                *value = sanitized;
            }
        }
        sanitize_links(&mut element.children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Element;

    #[test]
    fn test_safe_schemes_pass() {
        for uri in ["http://a.io", "HTTPS://a.io", "mailto:a@b.io", "tel:+123"] {
            assert_eq!(transform_link_uri(uri), uri);
        }
    }

    #[test]
    fn test_relative_uris_pass() {
        for uri in ["/path", "#frag", "page.html", "a/b?x=1:2", "a#b:c"] {
            assert_eq!(transform_link_uri(uri), uri);
        }
    }

    #[test]
    fn test_unsafe_schemes_neutralized() {
        for uri in ["javascript:alert(1)", "JavaScript:x", "data:text/html,x", "vbscript:x"] {
            assert_eq!(transform_link_uri(uri), NEUTRALIZED_URI);
        }
    }

    #[test]
    fn test_app_scheme_untouched() {
        assert_eq!(transform_link_uri("app://open?id=1"), "app://open?id=1");
    }

    #[test]
    fn test_sanitize_links_in_tree() {
        let mut nodes = vec![
            Element::new("p")
                .with_child(
                    Element::new("a")
                        .with_attr("href", "javascript:alert(1)")
                        .with_text("x"),
                )
                .with_child(Element::new("img").with_attr("src", "vbscript:x"))
                .with_child(Element::new("a").with_attr("href", "app://x").with_text("y"))
                .into(),
        ];
        sanitize_links(&mut nodes);
        let Node::Element(p) = &nodes[0] else {
            panic!("expected paragraph");
        };
        let attrs: Vec<Option<&str>> = p
            .children
            .iter()
            .filter_map(Node::as_element)
            .map(|el| el.attr("href").or_else(|| el.attr("src")))
            .collect();
        assert_eq!(
            attrs,
            vec![Some(NEUTRALIZED_URI), Some(NEUTRALIZED_URI), Some("app://x")]
        );
    }
}
