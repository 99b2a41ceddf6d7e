//! Magnet URI synthesis with a fixed parameter order and encoding
//!
//! Downstream consumers compare magnet strings byte-for-byte, so emission
//! order and the encoding of each parameter class are part of the wire
//! contract, not cosmetic choices.

const CANONICAL_KEYS: [&str; 5] = ["xt", "dn", "kt", "tr", "ws"];

/// Input fields for magnet URI synthesis.
///
/// Convenience fields map onto their 2-letter magnet parameters: the info
/// hash becomes `xt`, `name` becomes `dn`, `keywords` become `kt`,
/// `announce` entries become `tr`, and `url_list` entries become `ws`.
/// `extra` carries literal 2-letter parameters (such as `xs`) that have no
/// convenience field; entries there named after a canonical parameter are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct MagnetFields {
    /// Hex info hash, emitted verbatim. Takes priority over the buffer.
    pub info_hash: Option<String>,
    /// Raw 20-byte hash, hex-encoded when no string hash is present.
    pub info_hash_buffer: Option<[u8; 20]>,
    /// Display name.
    pub name: Option<String>,
    /// Keyword topics, joined with `+` under a single `kt=`.
    pub keywords: Vec<String>,
    /// Tracker URLs, one `tr=` each.
    pub announce: Vec<String>,
    /// Web seed URLs, one `ws=` each.
    pub url_list: Vec<String>,
    /// Literal 2-letter parameters in input order.
    pub extra: Vec<(String, String)>,
}

impl MagnetFields {
    /// Builds the magnet URI string.
    ///
    /// Emission order is fixed: `xt`, `dn`, `kt`, `tr`, `ws`, then the
    /// remaining `extra` parameters in input order. With no fields set the
    /// result is the literal `magnet:?`.
    pub fn build(&self) -> String {
        let mut params: Vec<String> = Vec::new();

        if let Some(hash) = self.info_hash.as_deref() {
            params.push(format!("xt=urn:btih:{hash}"));
        } else if let Some(buffer) = &self.info_hash_buffer {
            params.push(format!("xt=urn:btih:{}", hex::encode(buffer)));
        }

        if let Some(name) = self.name.as_deref() {
            params.push(format!("dn={}", encode_display_name(name)));
        }

        if !self.keywords.is_empty() {
            let joined = self
                .keywords
                .iter()
                .map(|keyword| urlencoding::encode(keyword).into_owned())
                .collect::<Vec<_>>()
                .join("+");
            params.push(format!("kt={joined}"));
        }

        for tracker in &self.announce {
            params.push(format!("tr={}", urlencoding::encode(tracker)));
        }

        for web_seed in &self.url_list {
            params.push(format!("ws={}", urlencoding::encode(web_seed)));
        }

        for (key, value) in &self.extra {
            if key.len() != 2 || CANONICAL_KEYS.contains(&key.as_str()) {
                continue;
            }
            // Web seeds replace any acceptable-source parameter.
            if key == "as" && !self.url_list.is_empty() {
                continue;
            }
            if matches!(key.as_str(), "xs" | "as") {
                params.push(format!("{key}={}", urlencoding::encode(value)));
            } else {
                params.push(format!("{key}={value}"));
            }
        }

        format!("magnet:?{}", params.join("&"))
    }
}

/// Percent-encodes a display name, with spaces rendered as `+`.
pub fn encode_display_name(name: &str) -> String {
    urlencoding::encode(name).replace("%20", "+")
}

/// Extracts the first occurrence of a query parameter from a magnet URI.
///
/// Returns the raw (still percent-encoded) value, or `None` when the
/// parameter is absent.
pub fn magnet_param(magnet: &str, name: &str) -> Option<String> {
    let query = magnet.split_once('?').map_or(magnet, |(_, query)| query);
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
