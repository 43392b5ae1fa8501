//! Minimal HTML scanning for the rating table.
//!
//! This is not a parser. It finds tag blocks by case-insensitive string search,
//! which is enough for the flat, server-rendered table on the rating site.

/// An HTML string together with its ASCII-lowercased copy.
///
/// Only ASCII is lowercased, so byte offsets are the same in both strings and
/// an index found in `lower` can slice `raw`.
pub struct Document<'a> {
    raw: &'a str,
    lower: String,
}

impl<'a> Document<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lower: raw.to_ascii_lowercase(),
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Byte range `(start, end)` of the next `<tag ...>...</tag>` block at or
    /// after `from`. `end` points past the closing tag.
    pub fn next_block(&self, tag: &str, from: usize) -> Option<(usize, usize)> {
        let open = format!("<{}", tag.to_ascii_lowercase());
        let close = format!("</{}>", tag.to_ascii_lowercase());

        let mut search_from = from;
        let start = loop {
            let candidate = self.lower.get(search_from..)?.find(&open)? + search_from;
            // Reject longer tag names sharing the prefix, e.g. `<tdx` for `<td`.
            match self.lower.as_bytes().get(candidate + open.len()) {
                Some(b'>') | Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'/') => {
                    break candidate;
                }
                _ => search_from = candidate + open.len(),
            }
        };
        let open_end = self.lower[start..].find('>')? + start + 1;
        let close_start = self.lower[open_end..].find(&close)? + open_end;
        Some((start, close_start + close.len()))
    }

    /// Iterates over every `tag` block within `range`, in document order.
    pub fn blocks(&self, tag: &str, range: (usize, usize)) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let mut pos = range.0;
        while let Some((start, end)) = self.next_block(tag, pos) {
            if end > range.1 {
                break;
            }
            out.push((start, end));
            pos = end;
        }
        out
    }

    /// Visible text of the block at `range`: inner HTML with tags stripped,
    /// entities decoded and whitespace collapsed.
    pub fn text(&self, range: (usize, usize)) -> String {
        let block = &self.raw[range.0..range.1];
        strip_tags(&decode_entities(inner_after_open_tag(block)))
    }
}

/// Given a complete block like `<td ...>INNER</td>`, returns `INNER`.
pub fn inner_after_open_tag(block: &str) -> &str {
    match (block.find('>'), block.rfind('<')) {
        (Some(open_end), Some(close_start)) if close_start > open_end => {
            &block[open_end + 1..close_start]
        }
        _ => "",
    }
}

/// Removes every `<...>` tag, then collapses whitespace.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&out)
}

/// Decodes the handful of entities the rating site emits.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
