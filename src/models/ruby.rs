//! Ruby support files: locating hook and step definition blocks.
//!
//! This is not a Ruby parser. Blocks are found by their header line and
//! closed by counting `do`/`end` style nesting, which is enough for the
//! shape hooks and step definitions take in practice.

use once_cell::sync::Lazy;
use regex::Regex;

static HOOK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(Before|After|Around|BeforeStep|AfterStep|AfterConfiguration|AtExit|at_exit)\b.*\bdo\b",
    )
    .unwrap()
});
static STEP_DEFINITION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Given|When|Then|And|But)\s*\(?\s*(/|'|\x22).*\bdo\b").unwrap());
static TRAILING_DO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bdo\s*(\|[^|]*\|)?\s*(#.*)?$").unwrap());
static OPENING_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(if|unless|while|until|case|begin|def|class|module|for)\b").unwrap()
});
static ASSIGNED_OPENING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(=|<<|\()\s*(if|unless|case|begin|while|until)\b").unwrap()
});
static CLOSING_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^end\b").unwrap());
static TRAILING_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bend\s*(#.*)?$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Hook,
    StepDefinition,
}

/// One block found in a support file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RubyBlock {
    pub kind: BlockKind,
    /// 1-indexed header line.
    pub line: usize,
    pub lines: Vec<String>,
}

/// A body line between header and footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyLine<'a> {
    Comment(&'a str),
    Code(&'a str),
}

/// Header, trimmed body lines and footer of one block.
pub(crate) struct BlockParts<'a> {
    pub header: &'a str,
    pub body: Vec<BodyLine<'a>>,
}

fn nesting_delta(trimmed: &str) -> i32 {
    if trimmed.starts_with('#') {
        return 0;
    }
    let mut delta = 0;
    let opens = OPENING_KEYWORD.is_match(trimmed) || ASSIGNED_OPENING.is_match(trimmed);
    if opens {
        delta += 1;
    }
    if TRAILING_DO.is_match(trimmed) {
        delta += 1;
    }
    if CLOSING_KEYWORD.is_match(trimmed) || (opens && TRAILING_END.is_match(trimmed)) {
        delta -= 1;
    }
    delta
}

/// Split a support file into hook and step definition blocks.
///
/// A block left open at end of file is still returned so the caller can
/// report it.
pub fn extract_blocks(source: &str) -> Vec<RubyBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<(RubyBlock, i32)> = None;
    for (idx, raw) in source.lines().enumerate() {
        let trimmed = raw.trim();
        if let Some((mut block, depth)) = open.take() {
            block.lines.push(raw.to_string());
            let depth = depth + nesting_delta(trimmed);
            if depth <= 0 {
                blocks.push(block);
            } else {
                open = Some((block, depth));
            }
            continue;
        }
        let kind = if HOOK_HEADER.is_match(trimmed) {
            BlockKind::Hook
        } else if STEP_DEFINITION_HEADER.is_match(trimmed) {
            BlockKind::StepDefinition
        } else {
            continue;
        };
        let block = RubyBlock {
            kind,
            line: idx + 1,
            lines: vec![raw.to_string()],
        };
        let depth = nesting_delta(trimmed);
        if depth <= 0 {
            blocks.push(block);
        } else {
            open = Some((block, depth));
        }
    }
    if let Some((block, _)) = open {
        blocks.push(block);
    }
    blocks
}

/// Separate header, body and footer. The footer must be a bare `end`.
pub(crate) fn split_block(lines: &[String]) -> Result<BlockParts<'_>, String> {
    let mut content: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if content.is_empty() {
        return Err("empty block".to_string());
    }
    let header = content.remove(0);
    match content.pop() {
        Some(footer) if footer == "end" || footer.starts_with("end #") => {}
        _ => return Err("missing closing `end`".to_string()),
    }
    let body = content
        .into_iter()
        .map(|l| {
            if l.starts_with('#') {
                BodyLine::Comment(l)
            } else {
                BodyLine::Code(l)
            }
        })
        .collect();
    Ok(BlockParts { header, body })
}
