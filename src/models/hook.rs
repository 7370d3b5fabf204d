//! Cucumber hooks (`Before`, `Around`, ...) read from Ruby support files.
//!
//! A hook block is scanned into a token stream (header, body lines, footer)
//! and the `Hook` model is assembled from those tokens. Predicates used by
//! the rule catalog are computed on demand from the stored fields.

use crate::error::{Error, Result};
use crate::models::ruby::{split_block, BodyLine};
use crate::models::target::{RuleTarget, TargetInfo, TargetKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HookType {
    Before,
    After,
    Around,
    BeforeStep,
    AfterStep,
    AfterConfiguration,
    AtExit,
}

impl HookType {
    fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "Before" => HookType::Before,
            "After" => HookType::After,
            "Around" => HookType::Around,
            "BeforeStep" => HookType::BeforeStep,
            "AfterStep" => HookType::AfterStep,
            "AfterConfiguration" => HookType::AfterConfiguration,
            "AtExit" | "at_exit" => HookType::AtExit,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookToken<'a> {
    Header {
        hook_type: HookType,
        tag_args: Vec<String>,
        parameters: Vec<String>,
    },
    Comment(&'a str),
    Code(&'a str),
    Footer,
}

/// Character cursor over a hook header.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn keyword(&mut self, word: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(word) {
            return false;
        }
        let follows_ident = rest[word.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        if follows_ident {
            return false;
        }
        self.pos += word.len();
        true
    }

    fn quoted(&mut self) -> std::result::Result<String, String> {
        let quote = match self.rest().chars().next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err("tag arguments must be quoted strings".to_string()),
        };
        self.pos += 1;
        let rest = self.rest();
        let end = rest
            .find(quote)
            .ok_or_else(|| "unterminated string in tag arguments".to_string())?;
        self.pos += end + 1;
        Ok(rest[..end].to_string())
    }
}

fn scan_header<'a>(header: &str) -> std::result::Result<HookToken<'a>, String> {
    let mut cur = Cursor::new(header);
    let ident = cur.ident();
    let hook_type =
        HookType::from_ident(ident).ok_or_else(|| format!("unknown hook type '{}'", ident))?;
    cur.skip_ws();

    let mut tag_args = Vec::new();
    if cur.eat('(') {
        loop {
            cur.skip_ws();
            if cur.eat(')') {
                break;
            }
            tag_args.push(cur.quoted()?);
            cur.skip_ws();
            if cur.eat(',') {
                continue;
            }
            if cur.eat(')') {
                break;
            }
            return Err("expected ',' or ')' in tag arguments".to_string());
        }
        cur.skip_ws();
    }

    if !cur.keyword("do") {
        return Err("expected `do` after hook declaration".to_string());
    }
    cur.skip_ws();

    let mut parameters = Vec::new();
    if cur.eat('|') {
        let rest = cur.rest();
        let end = rest
            .find('|')
            .ok_or_else(|| "unterminated block parameter list".to_string())?;
        parameters = rest[..end]
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        cur.pos += end + 1;
        cur.skip_ws();
    }
    if !cur.rest().is_empty() && !cur.rest().starts_with('#') {
        return Err(format!("unexpected text after `do`: '{}'", cur.rest()));
    }

    Ok(HookToken::Header {
        hook_type,
        tag_args,
        parameters,
    })
}

/// Scan one hook block, header through matching `end`.
pub fn tokenize(lines: &[String]) -> std::result::Result<Vec<HookToken<'_>>, String> {
    let parts = split_block(lines)?;
    let mut tokens = vec![scan_header(parts.header)?];
    tokens.extend(parts.body.into_iter().map(|line| match line {
        BodyLine::Comment(text) => HookToken::Comment(text),
        BodyLine::Code(text) => HookToken::Code(text),
    }));
    tokens.push(HookToken::Footer);
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hook {
    #[serde(flatten)]
    pub info: TargetInfo,
    pub hook_type: HookType,
    pub parameters: Vec<String>,
    /// Trimmed body lines, comments and blanks removed.
    pub code: Vec<String>,
    /// Pure comment lines of the body.
    pub comments: Vec<String>,
}

impl Hook {
    /// Build a hook from its raw lines. A header that does not follow
    /// `<Type>('tag', ...) do |params|` or a missing `end` is an error.
    pub fn parse(location: impl Into<String>, lines: &[String]) -> Result<Self> {
        let info = TargetInfo::new(location);
        let tokens = tokenize(lines).map_err(|message| Error::HookSyntax {
            location: info.location.clone(),
            message,
        })?;
        let mut hook = Hook {
            info,
            hook_type: HookType::Before,
            parameters: Vec::new(),
            code: Vec::new(),
            comments: Vec::new(),
        };
        for token in tokens {
            match token {
                HookToken::Header {
                    hook_type,
                    tag_args,
                    parameters,
                } => {
                    hook.hook_type = hook_type;
                    hook.info.tags = tag_args;
                    hook.parameters = parameters;
                }
                HookToken::Comment(text) => hook.comments.push(text.to_string()),
                HookToken::Code(text) => hook.code.push(text.to_string()),
                HookToken::Footer => {}
            }
        }
        Ok(hook)
    }

    pub fn around(&self) -> bool {
        self.hook_type == HookType::Around
    }

    /// True when the second block parameter is invoked with `.call`.
    pub fn calls_block(&self) -> bool {
        let Some(block) = self.parameters.get(1) else {
            return false;
        };
        let needle = format!("{}.call", block);
        let is_ident = |c: char| c.is_alphanumeric() || c == '_';
        self.code.iter().any(|line| {
            line.match_indices(&needle).any(|(at, _)| {
                let before = line[..at].chars().next_back().map_or(true, |c| !is_ident(c));
                let after = line[at + needle.len()..]
                    .chars()
                    .next()
                    .map_or(true, |c| !is_ident(c));
                before && after
            })
        })
    }

    /// Individual tag tokens, OR-lists split on commas.
    pub fn tag_tokens(&self) -> Vec<&str> {
        self.info
            .tags
            .iter()
            .flat_map(|expr| expr.split(','))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn conflicting_tags(&self) -> bool {
        let tokens = self.tag_tokens();
        tokens.iter().any(|t| {
            !t.starts_with('~') && tokens.iter().any(|o| o.strip_prefix('~') == Some(*t))
        })
    }

    pub fn duplicate_tags(&self) -> bool {
        let tokens = self.tag_tokens();
        tokens
            .iter()
            .enumerate()
            .any(|(i, t)| tokens[i + 1..].contains(t))
    }

    /// A `begin` line followed later by a `rescue` line.
    pub fn has_exception_guard(&self) -> bool {
        let Some(begin) = self
            .code
            .iter()
            .position(|l| l == "begin" || l.ends_with(" begin"))
        else {
            return false;
        };
        self.code[begin + 1..]
            .iter()
            .any(|l| l == "rescue" || l.starts_with("rescue "))
    }

    pub fn rescues(&self) -> bool {
        self.code.is_empty() || self.has_exception_guard()
    }

    /// Same declaration and body, wherever it lives.
    pub fn same_definition(&self, other: &Hook) -> bool {
        self.hook_type == other.hook_type
            && self.info.tags == other.info.tags
            && self.parameters == other.parameters
            && self.code == other.code
    }
}

impl RuleTarget for Hook {
    fn kind(&self) -> TargetKind {
        TargetKind::Hook
    }

    fn info(&self) -> &TargetInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hook(lines: &[&str]) -> Hook {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        Hook::parse("location.rb:1", &lines).unwrap()
    }

    #[test]
    fn test_breaks_down_content() {
        let h = hook(&["AfterConfiguration do", "1+1", "end"]);
        assert_eq!(h.hook_type, HookType::AfterConfiguration);
        assert_eq!(h.code, vec!["1+1"]);
        assert!(h.info.tags.is_empty());
        assert_eq!(h.info.location, "location.rb:1");
        assert!(h.parameters.is_empty());
    }

    #[test]
    fn test_parses_tag_filter() {
        let h = hook(&["Before(\"@tag1\", '@tag2,@tag3', '~@tag4') do", "end"]);
        assert_eq!(h.hook_type, HookType::Before);
        assert!(h.code.is_empty());
        assert_eq!(h.info.tags, vec!["@tag1", "@tag2,@tag3", "~@tag4"]);
        assert!(h.parameters.is_empty());
    }

    #[test]
    fn test_parses_parameters() {
        let h = hook(&["Before do |scenario, block|", "end"]);
        assert_eq!(h.parameters, vec!["scenario", "block"]);
    }

    #[test]
    fn test_token_stream() {
        let lines: Vec<String> = ["Around do |s, b|", "# why", "b.call", "end"]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let tokens = tokenize(&lines).unwrap();
        assert_eq!(
            tokens,
            vec![
                HookToken::Header {
                    hook_type: HookType::Around,
                    tag_args: vec![],
                    parameters: vec!["s".into(), "b".into()],
                },
                HookToken::Comment("# why"),
                HookToken::Code("b.call"),
                HookToken::Footer,
            ]
        );
    }

    #[test]
    fn test_around_and_calls_block() {
        let h = hook(&["Around do |scenario, block|", "end"]);
        assert!(h.around());
        assert!(!h.calls_block());
        let h = hook(&["Around do |scenario, block|", "block.call", "end"]);
        assert!(h.calls_block());
        let h = hook(&["Around do |scenario, block|", "myblock.call", "end"]);
        assert!(!h.calls_block());
        assert!(!hook(&["Before do", "end"]).around());
        assert!(!hook(&["Before do", "end"]).calls_block());
    }

    #[test]
    fn test_conflicting_tags() {
        assert!(hook(&["Before('@tag1', '~@tag1') do", "end"]).conflicting_tags());
        assert!(hook(&["Before('@tag,~@tag') do", "end"]).conflicting_tags());
        assert!(!hook(&["Before('@tag1', '~@tag2') do", "end"]).conflicting_tags());
        assert!(!hook(&["Before do", "end"]).conflicting_tags());
    }

    #[test]
    fn test_duplicate_tags() {
        assert!(hook(&["Before('@tag,@tag') do", "end"]).duplicate_tags());
        assert!(!hook(&["Before('@a,@b') do", "end"]).duplicate_tags());
    }

    #[test]
    fn test_rescues() {
        assert!(hook(&["Before do", "end"]).rescues());
        assert!(hook(&[
            "Before do",
            "begin",
            "something that might throw an exception",
            "rescue Exception => e",
            "do something with the exception",
            "end",
            "end",
        ])
        .rescues());
        assert!(!hook(&["Before do", "non rescue block code", "end"]).rescues());
    }

    #[test]
    fn test_assigned_begin_guards_but_block_comment_does_not() {
        assert!(hook(&["Before do", "@x = begin", "risky", "rescue => e", "end", "end"])
            .has_exception_guard());
        assert!(!hook(&["Before do", "=begin", "notes", "=end", "rescue_all", "end"])
            .has_exception_guard());
    }

    #[test]
    fn test_malformed_header_fails_fast() {
        let lines: Vec<String> = ["Before('@open do", "end"]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let err = Hook::parse("hooks.rb:4", &lines).unwrap_err();
        assert!(matches!(err, Error::HookSyntax { ref location, .. } if location == "hooks.rb:4"));

        let lines: Vec<String> = ["Before do"].iter().map(|l| l.to_string()).collect();
        assert!(Hook::parse("hooks.rb:1", &lines).is_err());

        let lines: Vec<String> = ["Setup do", "end"].iter().map(|l| l.to_string()).collect();
        assert!(Hook::parse("hooks.rb:1", &lines).is_err());
    }

    #[test]
    fn test_same_definition_ignores_location() {
        let lines: Vec<String> = ["After do", "cleanup", "end"]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let a = Hook::parse("a.rb:1", &lines).unwrap();
        let b = Hook::parse("b.rb:9", &lines).unwrap();
        assert_ne!(a, b);
        assert!(a.same_definition(&b));
    }
}
