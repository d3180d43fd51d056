//! Link extraction from XML model text.
//!
//! The scanner walks the raw text and records byte spans; it never builds a
//! tree, so a rewrite can replace exactly the link bytes and nothing else.
//!
//! Link sites:
//! - `href` attributes: the whole value is one link.
//! - other attributes: whitespace-separated `path#id` tokens whose path has a
//!   file extension (cross-fragment references).
//! - text of link elements such as `<semanticResources>`.

use crate::error::ModelParseError;
use crate::paths::{basename, normalize};
use crate::target::LinkTarget;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::ops::Range;

/// Knobs for the extractor.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Elements whose text content is a link.
    pub link_elements: Vec<String>,
    /// Prefixes that merge tools inject in front of otherwise local links.
    pub stale_prefixes: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            link_elements: vec!["semanticResources".to_string()],
            stale_prefixes: vec!["index:/".to_string()],
        }
    }
}

/// Where in the markup a link was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkSite {
    Attribute {
        element: String,
        attribute: String,
        quote: char,
    },
    ElementText {
        element: String,
    },
}

impl LinkSite {
    /// Quote character delimiting the link text, if it sits in an attribute.
    pub fn quote(&self) -> Option<char> {
        match self {
            LinkSite::Attribute { quote, .. } => Some(*quote),
            LinkSite::ElementText { .. } => None,
        }
    }
}

impl fmt::Display for LinkSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkSite::Attribute {
                element, attribute, ..
            } => write!(f, "{element}@{attribute}"),
            LinkSite::ElementText { element } => write!(f, "<{element}>"),
        }
    }
}

/// One link occurrence inside a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    /// Link text exactly as written in the model.
    pub raw: String,
    /// Byte range of `raw` within the model content.
    pub span: Range<usize>,
    pub site: LinkSite,
    pub target: LinkTarget,
    /// Repo-relative, normalized target path.
    ///
    /// `None` for external links and for paths that climb above the root.
    pub target_path: Option<Utf8PathBuf>,
}

impl LinkReference {
    /// Basename of the target, used to look for moved files.
    pub fn target_basename(&self) -> Option<&str> {
        match (&self.target_path, &self.target) {
            (Some(path), _) => path.file_name(),
            (None, LinkTarget::Local { path, .. }) => {
                Some(basename(path)).filter(|name| !name.is_empty() && *name != "..")
            }
            (None, LinkTarget::External { .. }) => None,
        }
    }
}

/// Extract every link of the model at `model_path` (repo-relative) from `content`, in document order.
///
/// Text that is not markup yields no links. Markup too damaged to rewrite
/// safely is an error.
pub fn extract_links(
    model_path: &Utf8Path,
    content: &str,
    opts: &ExtractOptions,
) -> Result<Vec<LinkReference>, ModelParseError> {
    let body = content.trim_start_matches('\u{feff}').trim_start();
    if !body.starts_with('<') {
        return Ok(vec![]);
    }

    let model_dir = model_path.parent().unwrap_or(Utf8Path::new(""));
    let mut scanner = Scanner {
        content,
        model_dir,
        opts,
        links: Vec::new(),
    };
    scanner.run(content.len() - body.len())?;
    Ok(scanner.links)
}

struct Scanner<'a> {
    content: &'a str,
    model_dir: &'a Utf8Path,
    opts: &'a ExtractOptions,
    links: Vec<LinkReference>,
}

struct OpenLinkElement {
    name: String,
    tag_offset: usize,
    text_start: usize,
}

impl<'a> Scanner<'a> {
    fn run(&mut self, start: usize) -> Result<(), ModelParseError> {
        let content = self.content;
        let mut pos = start;
        let mut open: Option<OpenLinkElement> = None;

        while let Some(rel) = content[pos..].find('<') {
            let at = pos + rel;
            let rest = &content[at..];

            if rest.starts_with("<!--") {
                pos = self.skip_past(at, "<!--", "-->", "comment")?;
            } else if rest.starts_with("<![CDATA[") {
                pos = self.skip_past(at, "<![CDATA[", "]]>", "CDATA section")?;
            } else if rest.starts_with("<?") {
                pos = self.skip_past(at, "<?", "?>", "processing instruction")?;
            } else if rest.starts_with("<!") {
                pos = self.skip_declaration(at)?;
            } else if rest.starts_with("</") {
                let end = self.find_from(at, ">", "end tag")?;
                let name = content[at + 2..end].trim();
                if let Some(el) = open.take_if(|el| el.name == name) {
                    self.element_text(&el, at);
                }
                pos = end + 1;
            } else {
                let tag = self.start_tag(at)?;
                if !tag.self_closing
                    && open.is_none()
                    && self.opts.link_elements.iter().any(|e| e == local_name(&tag.name))
                {
                    open = Some(OpenLinkElement {
                        name: tag.name,
                        tag_offset: at,
                        text_start: tag.end,
                    });
                }
                pos = tag.end;
            }
        }

        match open {
            Some(el) => Err(ModelParseError::UnclosedLinkElement {
                element: el.name,
                offset: el.tag_offset,
            }),
            None => Ok(()),
        }
    }

    fn find_from(
        &self,
        at: usize,
        needle: &str,
        construct: &'static str,
    ) -> Result<usize, ModelParseError> {
        self.content[at..]
            .find(needle)
            .map(|rel| at + rel)
            .ok_or(ModelParseError::Unterminated {
                construct,
                offset: at,
            })
    }

    fn skip_past(
        &self,
        at: usize,
        opener: &str,
        terminator: &str,
        construct: &'static str,
    ) -> Result<usize, ModelParseError> {
        // Search after the opener so `<!-->` is not its own terminator.
        let from = at + opener.len();
        self.content[from..]
            .find(terminator)
            .map(|rel| from + rel + terminator.len())
            .ok_or(ModelParseError::Unterminated {
                construct,
                offset: at,
            })
    }

    /// `<!DOCTYPE ...>`, including an internal subset in brackets.
    fn skip_declaration(&self, at: usize) -> Result<usize, ModelParseError> {
        let bytes = self.content.as_bytes();
        let mut depth = 0usize;
        for (i, &b) in bytes.iter().enumerate().skip(at + 2) {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Ok(i + 1),
                _ => {}
            }
        }
        Err(ModelParseError::Unterminated {
            construct: "declaration",
            offset: at,
        })
    }

    fn start_tag(&mut self, at: usize) -> Result<StartTag, ModelParseError> {
        let content = self.content;
        let bytes = content.as_bytes();
        let unterminated = || ModelParseError::Unterminated {
            construct: "tag",
            offset: at,
        };

        let name_start = at + 1;
        let mut i = name_start;
        while i < bytes.len() && !is_name_end(bytes[i]) {
            i += 1;
        }
        if i == name_start {
            return Err(ModelParseError::MalformedTag { offset: at });
        }
        let name = content[name_start..i].to_string();

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                None => return Err(unterminated()),
                Some(b'>') => {
                    return Ok(StartTag {
                        name,
                        end: i + 1,
                        self_closing: false,
                    });
                }
                Some(b'/') if bytes.get(i + 1) == Some(&b'>') => {
                    return Ok(StartTag {
                        name,
                        end: i + 2,
                        self_closing: true,
                    });
                }
                Some(b'/') | Some(b'<') => return Err(ModelParseError::MalformedTag { offset: i }),
                Some(_) => {}
            }

            let attr_start = i;
            while i < bytes.len() && !is_name_end(bytes[i]) && bytes[i] != b'=' {
                i += 1;
            }
            if i == attr_start {
                return Err(ModelParseError::MalformedTag { offset: i });
            }
            let attribute = &content[attr_start..i];

            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if bytes.get(i) != Some(&b'=') {
                // Valueless attribute; not XML, but harmless to step over.
                continue;
            }
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }

            let quote = match bytes.get(i) {
                Some(&q) if q == b'"' || q == b'\'' => q,
                None => return Err(unterminated()),
                Some(_) => return Err(ModelParseError::MalformedTag { offset: i }),
            };
            let value_start = i + 1;
            let value_end = content[value_start..]
                .find(quote as char)
                .map(|rel| value_start + rel)
                .ok_or_else(|| ModelParseError::UnterminatedAttribute {
                    attribute: attribute.to_string(),
                    offset: attr_start,
                })?;

            self.attribute_links(&name, attribute, quote as char, value_start..value_end);
            i = value_end + 1;
        }
    }

    fn attribute_links(&mut self, element: &str, attribute: &str, quote: char, value: Range<usize>) {
        let site = || LinkSite::Attribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
            quote,
        };

        if local_name(attribute) == "href" {
            let span = trimmed(self.content, value);
            if !span.is_empty() {
                self.push(span, site());
            }
            return;
        }

        // All or nothing: prose such as an HTML `description` yields no links.
        let mut links = Vec::new();
        let mut after_type = false;
        for token in tokens(self.content, value) {
            let text = &self.content[token.clone()];
            if is_intra_document(text) {
                after_type = false;
            } else if looks_like_cross_reference(text) {
                links.push(token);
                after_type = false;
            } else if !after_type && looks_like_type_prefix(text) {
                after_type = true;
            } else {
                return;
            }
        }
        if after_type {
            return;
        }
        for token in links {
            self.push(token, site());
        }
    }

    fn element_text(&mut self, el: &OpenLinkElement, close_at: usize) {
        let text = &self.content[el.text_start..close_at];
        if text.contains('<') {
            return;
        }
        let span = trimmed(self.content, el.text_start..close_at);
        if !span.is_empty() {
            self.push(
                span,
                LinkSite::ElementText {
                    element: el.name.clone(),
                },
            );
        }
    }

    fn push(&mut self, span: Range<usize>, site: LinkSite) {
        let raw = &self.content[span.clone()];
        let Some(target) = LinkTarget::parse(raw, &self.opts.stale_prefixes) else {
            return;
        };

        let target_path = match &target {
            LinkTarget::Local { path, .. } => match path.strip_prefix('/') {
                Some(rooted) => normalize(Utf8Path::new(rooted)),
                None => normalize(&self.model_dir.join(path)),
            },
            LinkTarget::External { .. } => None,
        };

        self.links.push(LinkReference {
            raw: raw.to_string(),
            span,
            site,
            target,
            target_path,
        });
    }
}

struct StartTag {
    name: String,
    end: usize,
    self_closing: bool,
}

fn is_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'>' | b'/' | b'<')
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn trimmed(content: &str, range: Range<usize>) -> Range<usize> {
    let text = &content[range.clone()];
    let lead = text.len() - text.trim_start().len();
    let trail = text.len() - text.trim_end().len();
    if lead == text.len() {
        return range.start..range.start;
    }
    range.start + lead..range.end - trail
}

fn tokens(content: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let text = &content[range.clone()];
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push(range.start + s..range.start + i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(range.start + s..range.end);
    }
    out
}

/// `path#id` where `path` ends in a file name with an extension.
fn looks_like_cross_reference(token: &str) -> bool {
    let Some((path, id)) = token.split_once('#') else {
        return false;
    };
    let name = basename(path);
    !path.is_empty()
        && is_identifier(id)
        && name.contains('.')
        && !name.starts_with('.')
        && !path.contains(['"', '<', '>', '&', '='])
}

/// `#id` pointing into the same document.
fn is_intra_document(token: &str) -> bool {
    token.strip_prefix('#').is_some_and(is_identifier)
}

/// Element type such as `org.polarsys.capella.core.data.cs:Part`, written
/// in front of the link it qualifies.
fn looks_like_type_prefix(token: &str) -> bool {
    let Some((package, class)) = token.split_once(':') else {
        return false;
    };
    !package.is_empty()
        && package
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && class.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && class.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_identifier(id: &str) -> bool {
    !id.is_empty()
        && !id.contains(['"', '\'', '<', '>', '&', '#'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(model: &str, content: &str) -> Vec<LinkReference> {
        extract_links(Utf8Path::new(model), content, &ExtractOptions::default()).unwrap()
    }

    fn raws(links: &[LinkReference]) -> Vec<&str> {
        links.iter().map(|l| l.raw.as_str()).collect()
    }

    #[test]
    fn non_markup_yields_nothing() {
        assert!(extract("docs/a.aird", "plain text, no markup").is_empty());
        assert!(extract("docs/a.aird", "").is_empty());
    }

    #[test]
    fn href_attribute_is_one_link() {
        let content = r#"<?xml version="1.0"?>
<root><ref href="../old/b.res"/></root>"#;
        let links = extract("docs/a.aird", content);
        assert_eq!(raws(&links), vec!["../old/b.res"]);
        assert_eq!(&content[links[0].span.clone()], "../old/b.res");
        assert_eq!(links[0].target_path, Some(Utf8PathBuf::from("old/b.res")));
        assert_eq!(links[0].site.to_string(), "ref@href");
    }

    #[test]
    fn cross_references_in_other_attributes() {
        let content = r#"<data xmi:id="_1" target="frag/a.capellafragment#_x #_local frag/b.capellafragment#_y" name="C# tools #1"/>"#;
        let links = extract("m.capella", content);
        assert_eq!(
            raws(&links),
            vec!["frag/a.capellafragment#_x", "frag/b.capellafragment#_y"]
        );
        for link in &links {
            assert_eq!(&content[link.span.clone()], link.raw);
        }
    }

    #[test]
    fn html_descriptions_are_not_links() {
        let content = r#"<ownedLogicalComponents xmi:id="_c" description="&lt;p&gt;See &lt;a href=&quot;https://example.com/guide.html#intro&quot;&gt;the guide&lt;/a&gt;&lt;/p&gt;"/>"#;
        assert!(extract("docs/a.capella", content).is_empty());

        let content = r#"<data summary="see guide.html#intro for details"/>"#;
        assert!(extract("docs/a.capella", content).is_empty());
    }

    #[test]
    fn type_prefixed_references_are_links() {
        let content = r#"<ownedParts abstractType="org.polarsys.capella.core.data.la:LogicalComponent frag/la.capellafragment#_lc1"/>"#;
        let links = extract("m.capella", content);
        assert_eq!(raws(&links), vec!["frag/la.capellafragment#_lc1"]);

        let dangling = r#"<ownedParts abstractType="frag/la.capellafragment#_lc1 org.polarsys.capella.core.data.la:LogicalComponent"/>"#;
        assert!(extract("m.capella", dangling).is_empty());
    }

    #[test]
    fn semantic_resources_text_is_a_link() {
        let content = "<diagram>\n  <semanticResources> model.capella </semanticResources>\n  <semanticResources></semanticResources>\n</diagram>";
        let links = extract("m/x.aird", content);
        assert_eq!(raws(&links), vec!["model.capella"]);
        assert_eq!(
            links[0].site,
            LinkSite::ElementText {
                element: "semanticResources".to_string()
            }
        );
        assert_eq!(links[0].target_path, Some(Utf8PathBuf::from("m/model.capella")));
    }

    #[test]
    fn duplicates_are_preserved_in_document_order() {
        let content = r#"<a><b href="x.res"/><c href="y.res"/><d href="x.res"/></a>"#;
        let links = extract("a.aird", content);
        assert_eq!(raws(&links), vec!["x.res", "y.res", "x.res"]);
        assert!(links[0].span.start < links[2].span.start);
    }

    #[test]
    fn comments_and_cdata_are_skipped() {
        let content = r#"<a><!-- <b href="no.res"/> --><![CDATA[<c href="no2.res"/>]]><d href='yes.res'/></a>"#;
        let links = extract("a.aird", content);
        assert_eq!(raws(&links), vec!["yes.res"]);
        assert_eq!(links[0].site.quote(), Some('\''));
    }

    #[test]
    fn external_links_are_reported() {
        let content = r#"<a><b href="platform:/plugin/x/y.ecore#//T"/></a>"#;
        let links = extract("a.aird", content);
        assert_eq!(links.len(), 1);
        assert!(links[0].target.is_external());
        assert_eq!(links[0].target_path, None);
    }

    #[test]
    fn rooted_paths_resolve_from_repository_root() {
        let content = r#"<a href="/shared/lib.capella"/>"#;
        let links = extract("deep/dir/a.aird", content);
        assert_eq!(links[0].target_path, Some(Utf8PathBuf::from("shared/lib.capella")));
    }

    #[test]
    fn escaping_root_has_no_target_path_but_keeps_basename() {
        let content = r#"<a href="../../b.res"/>"#;
        let links = extract("docs/a.aird", content);
        assert_eq!(links[0].target_path, None);
        assert_eq!(links[0].target_basename(), Some("b.res"));
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let err = extract_links(
            Utf8Path::new("a.aird"),
            "<a><!-- never closed",
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelParseError::Unterminated {
                construct: "comment",
                offset: 3
            }
        );
    }

    #[test]
    fn unterminated_attribute_is_an_error() {
        let err = extract_links(
            Utf8Path::new("a.aird"),
            r#"<a href="x.res/>"#,
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ModelParseError::UnterminatedAttribute { .. }));
    }

    #[test]
    fn unclosed_link_element_is_an_error() {
        let err = extract_links(
            Utf8Path::new("a.aird"),
            "<a><semanticResources>model.capella",
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelParseError::UnclosedLinkElement {
                element: "semanticResources".to_string(),
                offset: 3
            }
        );
    }

    #[test]
    fn bom_and_leading_whitespace_are_tolerated() {
        let content = "\u{feff}\n  <a href=\"x.res\"/>";
        let links = extract("a.aird", content);
        assert_eq!(&content[links[0].span.clone()], "x.res");
    }
}
