//! Statement splitting and argument tokenization for the scene DSL.
//!
//! Nothing here fails: malformed input yields fewer statements, `None` calls,
//! or `0` numbers.

/// Largest range a `base[a..b]` token may expand to.
pub const MAX_RANGE_LEN: usize = 4096;

/// One `name(arg, ...)` statement. Arguments keep their quotes; use
/// [`unquote`] / [`num`] to read them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

impl<'a> Call<'a> {
    pub fn arg(&self, i: usize) -> Option<&'a str> {
        self.args.get(i).copied()
    }

    pub fn num(&self, i: usize) -> f64 {
        self.arg(i).map(num).unwrap_or(0.0)
    }

    pub fn opt_num(&self, i: usize) -> Option<f64> {
        self.arg(i).filter(|s| !s.trim().is_empty()).map(num)
    }

    pub fn text(&self, i: usize) -> Option<String> {
        self.arg(i).map(unquote)
    }

    pub fn opt_text(&self, i: usize) -> Option<String> {
        self.text(i).filter(|s| !s.is_empty())
    }
}

pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Splits source into trimmed, non-empty statements on newlines and on `;`
/// outside quotes. Comment lines are dropped.
pub fn split_statements(src: &str) -> Vec<&str> {
    src.lines()
        .filter(|line| !is_comment(line))
        .flat_map(split_line)
        .collect()
}

/// Splits one line on `;` outside quotes.
pub fn split_line(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            ';' => {
                out.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&line[start..]);

    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parses `name(args)`. Whitespace between the name and `(` is allowed; the
/// statement must end with `)`.
pub fn parse_call(stmt: &str) -> Option<Call<'_>> {
    let stmt = stmt.trim();
    let name_end = stmt
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
        .map(|(i, _)| i)?;
    let name = &stmt[..name_end];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let rest = stmt[name_end..].trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    let args = if inner.trim().is_empty() {
        Vec::new()
    } else {
        split_args(inner)
    };
    Some(Call { name, args })
}

/// Splits on commas outside single or double quotes. Tokens are trimmed but
/// keep their quotes.
pub fn split_args(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            ',' => {
                out.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(s[start..].trim());
    out
}

/// Strips one pair of matching quotes and resolves `\"`, `\'` and `\\`.
/// Unquoted text is returned trimmed.
pub fn unquote(s: &str) -> String {
    let s = s.trim();
    let mut chars = s.chars();
    let (Some(first), Some(last)) = (chars.next(), s.chars().last()) else {
        return String::new();
    };
    if s.len() < 2 || !(first == '"' || first == '\'') || first != last {
        return s.to_owned();
    }

    let body = &s[1..s.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut it = body.chars();
    while let Some(c) = it.next() {
        if c == '\\' {
            match it.next() {
                Some(n @ ('"' | '\'' | '\\')) => out.push(n),
                Some(n) => {
                    out.push('\\');
                    out.push(n);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Permissive number: decimal or `0x` hex, anything else is `0`.
pub fn num(s: &str) -> f64 {
    let s = unquote(s);
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok().map(|v| v as f64)
    } else {
        s.parse::<f64>().ok()
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

pub fn flag(s: &str) -> bool {
    unquote(s).eq_ignore_ascii_case("true")
}

/// `base[a..b]` reference to a run of lanes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeRef<'a> {
    pub base: &'a str,
    pub from: usize,
    pub to: usize,
}

impl<'a> RangeRef<'a> {
    pub fn parse(token: &'a str) -> Option<Self> {
        let token = token.trim();
        let open = token.find('[')?;
        let base = &token[..open];
        if !is_ident(base) {
            return None;
        }
        let inner = token[open + 1..].strip_suffix(']')?;
        let (a, b) = inner.split_once("..")?;
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(a) || !all_digits(b) {
            return None;
        }
        Some(Self {
            base,
            from: a.parse().ok()?,
            to: b.parse().ok()?,
        })
    }

    /// Lane indices in written order; `v[3..1]` counts down. Capped at
    /// [`MAX_RANGE_LEN`] entries.
    pub fn indices(&self) -> Vec<usize> {
        if self.from <= self.to {
            (self.from..=self.to).take(MAX_RANGE_LEN).collect()
        } else {
            (self.to..=self.from).rev().take(MAX_RANGE_LEN).collect()
        }
    }

    /// `base[i]` display ids.
    pub fn ids(&self) -> Vec<String> {
        self.indices()
            .into_iter()
            .map(|i| lane_id(self.base, i))
            .collect()
    }
}

/// Expands a range token into `base[i]` ids, or returns the trimmed token.
pub fn explode_range(token: &str) -> Vec<String> {
    match RangeRef::parse(token) {
        Some(r) => r.ids(),
        None => vec![token.trim().to_owned()],
    }
}

pub fn lane_id(base: &str, i: usize) -> String {
    format!("{base}[{i}]")
}

pub fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_split_on_newline_and_semicolon() {
        let src = "step(s1,\"a;b\"); rect(a,1,1,0,0)\n# rect(x,1,1,0,0)\n\n  appear(a, s1) ;";
        assert_eq!(
            split_statements(src),
            vec!["step(s1,\"a;b\")", "rect(a,1,1,0,0)", "appear(a, s1)"]
        );
    }

    #[test]
    fn call_respects_quoted_commas() {
        let c = parse_call("vec4(v, 0, 0, \"1,2,3,4\", teal, x, 0.2)").unwrap();
        assert_eq!(c.name, "vec4");
        assert_eq!(c.args.len(), 7);
        assert_eq!(c.text(3).unwrap(), "1,2,3,4");
    }

    #[test]
    fn call_requires_parens() {
        assert!(parse_call("rect a 1 1").is_none());
        assert!(parse_call("rect(a, 1").is_none());
        assert!(parse_call("(a)").is_none());
        assert!(parse_call("9x(a)").is_none());
        assert_eq!(parse_call("STEP (s1, \"x\")").unwrap().name, "STEP");
        assert!(parse_call("foo()").unwrap().args.is_empty());
    }

    #[test]
    fn unquote_handles_escapes_and_bare_words() {
        assert_eq!(unquote("\"a \\\"b\\\"\""), "a \"b\"");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("  teal "), "teal");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote(""), "");
    }

    #[test]
    fn num_is_permissive() {
        assert_eq!(num("1.5"), 1.5);
        assert_eq!(num(" -2 "), -2.0);
        assert_eq!(num("0x10"), 16.0);
        assert_eq!(num("abc"), 0.0);
        assert_eq!(num(""), 0.0);
        assert_eq!(num("inf"), 0.0);
    }

    #[test]
    fn range_tokens_expand_inclusively() {
        assert_eq!(
            explode_range("dst[0..3]"),
            vec!["dst[0]", "dst[1]", "dst[2]", "dst[3]"]
        );
        assert_eq!(explode_range("v[2..1]"), vec!["v[2]", "v[1]"]);
        assert_eq!(explode_range(" plain "), vec!["plain"]);
        assert_eq!(explode_range("v[2]"), vec!["v[2]"]);
        assert!(RangeRef::parse("1v[0..2]").is_none());
        assert!(RangeRef::parse("v[a..2]").is_none());
    }

    #[test]
    fn huge_ranges_are_capped() {
        let r = RangeRef::parse("v[0..99999999]").unwrap();
        assert_eq!(r.indices().len(), MAX_RANGE_LEN);
    }
}
