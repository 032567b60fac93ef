//! Minimal wikitext template handling: locate `{{Name|...}}` occurrences on a
//! page, edit their parameters, and write them back without disturbing the
//! surrounding text.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// `None` for positional parameters.
    pub name: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    params: Vec<Param>,
    multiline: bool,
}

/// One parsed template occurrence and its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub start: usize,
    pub end: usize,
    pub template: Template,
}

impl Template {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            params: Vec::new(),
            multiline: false,
        }
    }

    pub fn new_multiline(name: &str) -> Self {
        Self {
            multiline: true,
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|param| param.name.as_deref() == Some(name))
            .map(|param| param.value.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Named parameter names in document order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().filter_map(|param| param.name.as_deref())
    }

    /// Replace the value of `name` in place, or append it when missing.
    /// Values are trimmed the same way MediaWiki trims named arguments.
    pub fn set(&mut self, name: &str, value: &str) {
        let value = value.trim();
        match self
            .params
            .iter_mut()
            .find(|param| param.name.as_deref() == Some(name))
        {
            Some(param) => {
                if param.value != value {
                    param.value = value.to_string();
                }
            }
            None => self.params.push(Param {
                name: Some(name.to_string()),
                value: value.to_string(),
            }),
        }
    }

    pub fn push_positional(&mut self, value: &str) {
        self.params.push(Param {
            name: None,
            value: value.to_string(),
        });
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .params
            .iter()
            .position(|param| param.name.as_deref() == Some(name))?;
        Some(self.params.remove(index).value)
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + self.params.len() * 16 + 4);
        out.push_str("{{");
        out.push_str(&self.name);
        for param in &self.params {
            if self.multiline {
                out.push('\n');
            }
            out.push('|');
            if let Some(name) = &param.name {
                out.push_str(name);
                out.push('=');
            }
            out.push_str(&param.value);
        }
        if self.multiline {
            out.push('\n');
        }
        out.push_str("}}");
        out
    }

    /// Parse a single `{{...}}` block. Returns `None` if `source` is not one
    /// balanced template.
    pub fn parse(source: &str) -> Option<Self> {
        let end = match_braces(source, 0)?;
        if end != source.len() {
            return None;
        }
        Some(parse_inner(&source[2..source.len() - 2]))
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Every occurrence of template `name` in `text`, in document order. Templates
/// nested inside other templates are found too; occurrences nested inside a
/// matching occurrence are not.
pub fn find_all(text: &str, name: &str) -> Vec<Occurrence> {
    let mut out = Vec::new();
    collect_occurrences(text, 0, text.len(), name, &mut out);
    out
}

/// Apply `edit` to every occurrence of `name` and return the rewritten text
/// plus the number of occurrences visited. Occurrences left unchanged by
/// `edit` keep their original source text byte for byte.
pub fn replace_all<F>(text: &str, name: &str, mut edit: F) -> (String, usize)
where
    F: FnMut(&mut Template),
{
    let occurrences = find_all(text, name);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for occurrence in &occurrences {
        out.push_str(&text[cursor..occurrence.start]);
        let mut template = occurrence.template.clone();
        edit(&mut template);
        if template == occurrence.template {
            out.push_str(&text[occurrence.start..occurrence.end]);
        } else {
            out.push_str(&template.render());
        }
        cursor = occurrence.end;
    }
    out.push_str(&text[cursor..]);
    (out, occurrences.len())
}

/// MediaWiki title comparison for template names: underscores equal spaces,
/// an optional `Template:` prefix is ignored and the first letter is
/// case-insensitive.
pub fn names_match(left: &str, right: &str) -> bool {
    let left = canonical_template_name(left);
    let right = canonical_template_name(right);
    let mut left_chars = left.chars();
    let mut right_chars = right.chars();
    match (left_chars.next(), right_chars.next()) {
        (Some(a), Some(b)) => {
            a.to_lowercase().eq(b.to_lowercase()) && left_chars.as_str() == right_chars.as_str()
        }
        (None, None) => true,
        _ => false,
    }
}

fn canonical_template_name(name: &str) -> String {
    let collapsed = name
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    match collapsed.split_once(':') {
        Some((prefix, rest)) if prefix.trim().eq_ignore_ascii_case("template") => {
            rest.trim().to_string()
        }
        _ => collapsed,
    }
}

fn collect_occurrences(text: &str, from: usize, to: usize, name: &str, out: &mut Vec<Occurrence>) {
    let bytes = text.as_bytes();
    let mut index = from;
    while index + 1 < to {
        if let Some(skip) = comment_end(text, index) {
            index = skip;
            continue;
        }
        if bytes[index] == b'{' && bytes[index + 1] == b'{' {
            let Some(end) = match_braces(text, index) else {
                index += 2;
                continue;
            };
            if end > to {
                break;
            }
            let template = parse_inner(&text[index + 2..end - 2]);
            if names_match(template.name(), name) {
                out.push(Occurrence {
                    start: index,
                    end,
                    template,
                });
            } else {
                collect_occurrences(text, index + 2, end - 2, name, out);
            }
            index = end;
            continue;
        }
        index += 1;
    }
}

/// Given `start` pointing at `{{`, return the byte offset one past the
/// matching `}}`.
fn match_braces(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes[start..].starts_with(b"{{") {
        return None;
    }
    let mut depth = 1usize;
    let mut index = start + 2;
    while index < bytes.len() {
        if let Some(skip) = comment_end(text, index) {
            index = skip;
            continue;
        }
        if bytes[index..].starts_with(b"{{") {
            depth += 1;
            index += 2;
        } else if bytes[index..].starts_with(b"}}") {
            depth -= 1;
            index += 2;
            if depth == 0 {
                return Some(index);
            }
        } else {
            index += 1;
        }
    }
    None
}

fn comment_end(text: &str, index: usize) -> Option<usize> {
    if !text.as_bytes()[index..].starts_with(b"<!--") {
        return None;
    }
    Some(
        text[index + 4..]
            .find("-->")
            .map(|offset| index + 4 + offset + 3)
            .unwrap_or(text.len()),
    )
}

fn parse_inner(inner: &str) -> Template {
    let parts = split_top_level(inner, '|');
    let mut parts = parts.into_iter();
    let name = parts.next().unwrap_or_default();
    let mut template = Template {
        name: name.trim().to_string(),
        params: Vec::new(),
        multiline: inner.contains('\n'),
    };
    for part in parts {
        match split_top_level_once(part, '=') {
            Some((key, value)) => template.params.push(Param {
                name: Some(key.trim().to_string()),
                value: value.trim().to_string(),
            }),
            None => template.params.push(Param {
                name: None,
                value: part.to_string(),
            }),
        }
    }
    template
}

fn split_top_level(inner: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut last = 0;
    for index in top_level_positions(inner, separator) {
        parts.push(&inner[last..index]);
        last = index + separator.len_utf8();
    }
    parts.push(&inner[last..]);
    parts
}

fn split_top_level_once(part: &str, separator: char) -> Option<(&str, &str)> {
    let index = top_level_positions(part, separator).into_iter().next()?;
    Some((&part[..index], &part[index + separator.len_utf8()..]))
}

/// Byte offsets of `separator` outside nested `{{ }}`, `[[ ]]` and comments.
fn top_level_positions(text: &str, separator: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut braces = 0usize;
    let mut brackets = 0usize;
    let mut index = 0;
    while index < text.len() {
        if let Some(skip) = comment_end(text, index) {
            index = skip;
            continue;
        }
        let rest = &text[index..];
        if rest.starts_with("{{") {
            braces += 1;
            index += 2;
        } else if rest.starts_with("}}") && braces > 0 {
            braces -= 1;
            index += 2;
        } else if rest.starts_with("[[") {
            brackets += 1;
            index += 2;
        } else if rest.starts_with("]]") && brackets > 0 {
            brackets -= 1;
            index += 2;
        } else {
            let Some(ch) = rest.chars().next() else {
                break;
            };
            if ch == separator && braces == 0 && brackets == 0 {
                positions.push(index);
            }
            index += ch.len_utf8();
        }
    }
    positions
}
