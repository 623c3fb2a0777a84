//! Whole-word identifier substitution.

use std::collections::HashMap;

/// Maps identifiers to replacement text.
///
/// Replacement works on whole identifier tokens, so a name is never replaced
/// inside a longer identifier (`e` inside `result`), after a `.` (a member
/// name), or inside string and character literals. Each token is replaced
/// at most once, so replacement text is never substituted again.
#[derive(Debug, Clone, Default)]
pub struct NameReplacementMap {
    map: HashMap<String, String>,
}

impl NameReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, replacement: &str) {
        self.map.insert(name.to_string(), replacement.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn replace_names(&self, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        let mut prev_significant: Option<char> = None;
        while i < chars.len() {
            let c = chars[i];
            if c == '"' || c == '\'' {
                let end = literal_end(&chars, i);
                out.extend(&chars[i..end]);
                prev_significant = Some(c);
                i = end;
            } else if is_ident_start(c) {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let token: String = chars[start..i].iter().collect();
                match self.map.get(&token) {
                    Some(replacement) if prev_significant != Some('.') => out.push_str(replacement),
                    _ => out.push_str(&token),
                }
                prev_significant = Some('a');
            } else if c.is_ascii_digit() {
                // Numeric literals like `1e5` must not expose `e5` as a token.
                while i < chars.len() && (is_ident_part(chars[i]) || chars[i] == '.') {
                    out.push(chars[i]);
                    i += 1;
                }
                prev_significant = Some('0');
            } else {
                out.push(c);
                if !c.is_whitespace() {
                    prev_significant = Some(c);
                }
                i += 1;
            }
        }
        out
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Index one past the closing quote of the literal opening at `start`.
fn literal_end(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    chars.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> NameReplacementMap {
        let mut m = NameReplacementMap::new();
        for (k, v) in pairs {
            m.add(k, v);
        }
        m
    }

    #[test]
    fn does_not_replace_inside_identifiers() {
        let m = map(&[("e", "x1"), ("result", "x2")]);
        assert_eq!(m.replace_names("result.equals(e)"), "x2.equals(x1)");
    }

    #[test]
    fn replacement_is_not_substituted_again() {
        let m = map(&[("a", "b"), ("b", "a")]);
        assert_eq!(m.replace_names("a + b"), "b + a");
    }

    #[test]
    fn member_names_and_literals_are_left_alone() {
        let m = map(&[("value", "x1"), ("receiver", "x0")]);
        assert_eq!(
            m.replace_names("receiver.value == value && \"value\".length() > 0 && 'v' != 1e5"),
            "x0.value == x1 && \"value\".length() > 0 && 'v' != 1e5"
        );
        assert_eq!(m.replace_names("receiver . value"), "x0 . value");
    }

    #[test]
    fn longer_names_win() {
        let m = map(&[("val", "x1"), ("value", "x2")]);
        assert_eq!(m.replace_names("value + val + values"), "x2 + x1 + values");
    }
}
