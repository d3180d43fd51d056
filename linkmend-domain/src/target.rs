use crate::paths::{percent_decode, xml_unescape};

/// What a link's text points at, once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// A path inside the repository.
    Local {
        /// Decoded path as written in the link (no fragment, no stale prefix).
        path: String,
        /// Raw `#...` suffix, kept verbatim when the link is rewritten.
        fragment: Option<String>,
        /// Stale prefix that was stripped off, if any.
        stripped_prefix: Option<String>,
    },
    /// A URI with a scheme; never touched.
    External { scheme: String },
}

impl LinkTarget {
    /// Decode raw link text as it appears in the model.
    ///
    /// Returns `None` for text that does not name another file at all: empty
    /// values and intra-document references such as `#_a1b2`.
    pub fn parse(raw: &str, stale_prefixes: &[String]) -> Option<Self> {
        let (raw_path, fragment) = match fragment_start(raw) {
            Some(idx) => (&raw[..idx], Some(raw[idx..].to_string())),
            None => (raw, None),
        };

        let unescaped = xml_unescape(raw_path);
        let mut path = unescaped.as_str();
        let mut stripped_prefix = None;
        for prefix in stale_prefixes {
            if !prefix.is_empty()
                && let Some(rest) = path.strip_prefix(prefix.as_str())
            {
                stripped_prefix = Some(prefix.clone());
                path = rest;
                break;
            }
        }

        if path.is_empty() {
            return None;
        }

        if let Some(scheme) = uri_scheme(path).or_else(|| drive_letter(path)) {
            return Some(LinkTarget::External {
                scheme: scheme.to_string(),
            });
        }

        let decoded = percent_decode(path).unwrap_or_else(|| path.to_string());
        Some(LinkTarget::Local {
            path: decoded,
            fragment,
            stripped_prefix,
        })
    }

    pub fn is_external(&self) -> bool {
        matches!(self, LinkTarget::External { .. })
    }
}

/// Index of the `#` that starts the fragment, skipping `&#NN;` character references.
fn fragment_start(raw: &str) -> Option<usize> {
    raw.match_indices('#')
        .map(|(idx, _)| idx)
        .find(|&idx| idx == 0 || raw.as_bytes()[idx - 1] != b'&')
}

/// `C:` of an absolute Windows path such as `C:/models/x.aird`.
fn drive_letter(s: &str) -> Option<&str> {
    match s.as_bytes() {
        [d, b':'] | [d, b':', b'/' | b'\\', ..] if d.is_ascii_alphabetic() => Some(&s[..2]),
        _ => None,
    }
}

/// `scheme` of `scheme:rest`, per RFC 3986 syntax.
///
/// Single-letter schemes are left to `drive_letter`.
fn uri_scheme(s: &str) -> Option<&str> {
    let colon = s.find(':')?;
    let scheme = &s[..colon];
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if scheme.len() < 2 || !first.is_ascii_alphabetic() {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        Some(scheme)
    } else {
        None
    }
}
