// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component A: replaces string literals, quoted identifiers, named
//! parameters and balanced parenthesized spans with opaque `$NNNNNN`
//! placeholder tokens, so the recursive-descent parser can split on
//! whitespace and keywords without risk of cutting through quoted content
//! or unbalanced parentheses.

use crate::error::MaskError;

lazy_static::lazy_static! {
    static ref STRING_LIT: regex::Regex = regex::Regex::new(r"'(?:[^']|'')*'").unwrap();
    static ref DOUBLE_QUOTED: regex::Regex = regex::Regex::new("\"[^\"]*\"").unwrap();
    static ref BACKTICK_QUOTED: regex::Regex = regex::Regex::new("`[^`]*`").unwrap();
    static ref PARAMETER: regex::Regex = regex::Regex::new(r":\w*").unwrap();
    static ref WHITESPACE_RUN: regex::Regex = regex::Regex::new(r"[ \t\n]+").unwrap();
    static ref PLACEHOLDER_TOKEN: regex::Regex = regex::Regex::new(r"\$[0-9]{6}").unwrap();
}

/// What kind of text a placeholder token stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    StringLit,
    QuotedIdent,
    Backtick,
    Parameter,
    /// A balanced `(...)` span, stored including its parentheses.
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub text: String,
}

/// Owns the placeholder side table produced by [`mask`] for one parse.
/// Threaded by `&mut` reference through the whole recursive descent so
/// every nested call shares the same monotonic naming counter.
#[derive(Debug, Default)]
pub struct Masker {
    placeholders: Vec<Placeholder>,
}

impl Masker {
    fn push(&mut self, kind: PlaceholderKind, text: String) -> String {
        let name = format!("${:06}", self.placeholders.len());
        self.placeholders.push(Placeholder { kind, text });
        name
    }

    fn get(&self, name: &str) -> Result<&Placeholder, MaskError> {
        let idx: usize = name
            .trim_start_matches('$')
            .parse()
            .map_err(|_| MaskError::PlaceholderNotFound(name.to_string()))?;
        self.placeholders
            .get(idx)
            .ok_or_else(|| MaskError::PlaceholderNotFound(name.to_string()))
    }

    pub fn placeholder(&self, name: &str) -> Result<&Placeholder, MaskError> {
        self.get(name)
    }

    /// Returns the placeholder `s` resolves to, if `s` (once trimmed) is
    /// exactly one placeholder token and nothing else.
    pub fn as_single_placeholder(&self, s: &str) -> Option<&Placeholder> {
        let trimmed = s.trim();
        let m = PLACEHOLDER_TOKEN.find(trimmed)?;
        if m.start() != 0 || m.end() != trimmed.len() {
            return None;
        }
        self.get(trimmed).ok()
    }

    /// Replaces every `$NNNNNN` token in `s` with its stored text (one
    /// level, not recursively) and also returns the placeholders that were
    /// resolved, in the order they were found.
    pub fn unmask_once<'a>(&'a self, s: &str) -> Result<(String, Vec<&'a Placeholder>), MaskError> {
        let mut resolved = Vec::new();
        let mut err = None;
        let out = PLACEHOLDER_TOKEN.replace_all(s, |caps: &regex::Captures| {
            match self.get(&caps[0]) {
                Ok(ph) => {
                    resolved.push(ph);
                    ph.text.clone()
                }
                Err(e) => {
                    err.get_or_insert(e);
                    String::new()
                }
            }
        });
        if let Some(e) = err {
            return Err(e);
        }
        Ok((out.into_owned(), resolved))
    }
}

fn replace_with_placeholders(masker: &mut Masker, s: &str, re: &regex::Regex, kind: PlaceholderKind) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for m in re.find_iter(s) {
        out.push_str(&s[last..m.start()]);
        out.push_str(&masker.push(kind, m.as_str().to_string()));
        last = m.end();
    }
    out.push_str(&s[last..]);
    out
}

/// Masks the innermost balanced parenthesized span, repeatedly, from the
/// inside out, matching a stack-based bracket walk: find the first `)`,
/// mask back to its matching `(`, and restart on the shortened string.
fn mask_parentheses(masker: &mut Masker, mut s: String) -> Result<String, MaskError> {
    loop {
        let mut depth_starts: Vec<usize> = Vec::new();
        let mut replaced = false;
        let bytes: Vec<(usize, char)> = s.char_indices().collect();
        for &(idx, c) in &bytes {
            match c {
                '(' => depth_starts.push(idx),
                ')' => {
                    let Some(start) = depth_starts.pop() else {
                        return Err(MaskError::MissingLeftParen);
                    };
                    let end = idx + c.len_utf8();
                    let name = masker.push(PlaceholderKind::Group, s[start..end].to_string());
                    let mut next = String::with_capacity(s.len());
                    next.push_str(&s[..start]);
                    next.push_str(&name);
                    next.push_str(&s[end..]);
                    s = next;
                    replaced = true;
                    break;
                }
                _ => {}
            }
        }
        if !replaced {
            if !depth_starts.is_empty() {
                return Err(MaskError::MissingRightParen);
            }
            return Ok(s);
        }
    }
}

/// Runs the full masking pipeline on raw SQL text: masks string/quoted/
/// parameter literals, uppercases, normalizes whitespace around
/// parentheses, then masks every balanced parenthesized span from the
/// inside out.
pub fn mask(sql: &str) -> Result<(String, Masker), MaskError> {
    let mut masker = Masker::default();
    let mut s = sql.trim().to_string();

    s = replace_with_placeholders(&mut masker, &s, &STRING_LIT, PlaceholderKind::StringLit);
    s = replace_with_placeholders(&mut masker, &s, &DOUBLE_QUOTED, PlaceholderKind::QuotedIdent);
    s = replace_with_placeholders(&mut masker, &s, &BACKTICK_QUOTED, PlaceholderKind::Backtick);
    s = replace_with_placeholders(&mut masker, &s, &PARAMETER, PlaceholderKind::Parameter);

    s = s.to_uppercase();
    s = s.replace('(', " (").replace("( ", "(");
    s = s.replace(')', ") ").replace(" )", ")");
    s = WHITESPACE_RUN.replace_all(&s, " ").trim().to_string();

    let s = mask_parentheses(&mut masker, s)?;

    log::trace!("masked {} chars into {} placeholders", sql.len(), masker.placeholders.len());
    Ok((s, masker))
}

/// A pure-text sibling of [`mask`]'s parameter step: returns every `:\w*`
/// token found in `sql`, in source order, without building an AST. Strings
/// and quoted identifiers are masked first so a literal containing `:foo`
/// is not mistaken for a parameter.
pub fn find_params_by_string(sql: &str) -> Vec<String> {
    let mut masker = Masker::default();
    let mut s = sql.trim().to_string();
    s = replace_with_placeholders(&mut masker, &s, &STRING_LIT, PlaceholderKind::StringLit);
    s = replace_with_placeholders(&mut masker, &s, &DOUBLE_QUOTED, PlaceholderKind::QuotedIdent);
    s = replace_with_placeholders(&mut masker, &s, &BACKTICK_QUOTED, PlaceholderKind::Backtick);
    PARAMETER.find_iter(&s).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn masks_string_literals_before_uppercasing() {
        let (masked, masker) = mask("select 'abc' from dual").unwrap();
        assert!(masked.contains("$000000"));
        assert_eq!(masker.placeholder("$000000").unwrap().text, "'abc'");
        assert!(masked.starts_with("SELECT"));
    }

    #[test]
    fn masks_balanced_parens_innermost_first() {
        let (masked, masker) = mask("SELECT F((A+B)*C) FROM T").unwrap();
        // The innermost group is masked first and stores the literal span.
        let inner = masker
            .placeholders
            .iter()
            .find(|p| p.kind == PlaceholderKind::Group && p.text == "(A+B)")
            .unwrap();
        // The outer group is masked second; since it is a slice of the
        // already-partially-masked string at that point, its stored text
        // embeds the inner group's placeholder token rather than the
        // original "(A+B)" text.
        let outer = masker
            .placeholders
            .iter()
            .find(|p| p.kind == PlaceholderKind::Group && p.text.contains('*'))
            .unwrap();
        assert!(outer.text.starts_with('(') && outer.text.ends_with("*C)"));
        assert_ne!(inner as *const _, outer as *const _);
        assert!(masked.contains('$'));
    }

    #[test]
    fn unbalanced_parens_is_an_error() {
        assert_eq!(mask("SELECT F(A FROM T").unwrap_err(), MaskError::MissingRightParen);
        assert_eq!(mask("SELECT F)A FROM T").unwrap_err(), MaskError::MissingLeftParen);
    }

    #[test]
    fn finds_params_ignoring_string_literals() {
        let pars = find_params_by_string("SELECT * FROM T WHERE A = :x AND B = ':not_a_param'");
        assert_eq!(pars, vec![":x".to_string()]);
    }
}
