//! Step definitions (`Given /^...$/ do |x| ... end`) read from support files.

use crate::error::{Error, Result};
use crate::models::ruby::{split_block, BodyLine};
use crate::models::target::{RuleTarget, TargetInfo, TargetKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?P<keyword>Given|When|Then|And|But)\s*\(?\s*(?P<pattern>/.*/[a-z]*|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')\s*\)?\s*do\s*(?:\|(?P<params>[^|]*)\|)?\s*(?:#.*)?$"#,
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    #[serde(flatten)]
    pub info: TargetInfo,
    pub keyword: String,
    /// Pattern source as written, delimiters included.
    pub pattern: String,
    pub parameters: Vec<String>,
    pub code: Vec<String>,
    pub comments: Vec<String>,
}

impl StepDefinition {
    pub fn parse(location: impl Into<String>, lines: &[String]) -> Result<Self> {
        let mut info = TargetInfo::new(location);
        let parts = split_block(lines).map_err(|message| Error::StepDefinitionSyntax {
            location: info.location.clone(),
            message,
        })?;
        let caps = HEADER
            .captures(parts.header)
            .ok_or_else(|| Error::StepDefinitionSyntax {
                location: info.location.clone(),
                message: format!("unrecognized step definition header '{}'", parts.header),
            })?;
        let pattern = caps["pattern"].to_string();
        let parameters = caps
            .name("params")
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        info.name = pattern.clone();

        let mut code = Vec::new();
        let mut comments = Vec::new();
        for line in parts.body {
            match line {
                BodyLine::Comment(text) => comments.push(text.to_string()),
                BodyLine::Code(text) => code.push(text.to_string()),
            }
        }
        Ok(StepDefinition {
            info,
            keyword: caps["keyword"].to_string(),
            pattern,
            parameters,
            code,
            comments,
        })
    }
}

impl RuleTarget for StepDefinition {
    fn kind(&self) -> TargetKind {
        TargetKind::StepDefinition
    }

    fn info(&self) -> &TargetInfo {
        &self.info
    }

    fn class_name(&self) -> &'static str {
        "Step definition"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_parse_regex_step_definition() {
        let sd = StepDefinition::parse(
            "steps.rb:4",
            &lines(&[
                "Given /^I have (\\d+) items in (\\w+)$/ do |count, place|",
                "  # setup",
                "  @items = count.to_i",
                "end",
            ]),
        )
        .unwrap();
        assert_eq!(sd.keyword, "Given");
        assert_eq!(sd.pattern, "/^I have (\\d+) items in (\\w+)$/");
        assert_eq!(sd.info.name, sd.pattern);
        assert_eq!(sd.parameters, vec!["count", "place"]);
        assert_eq!(sd.code, vec!["@items = count.to_i"]);
        assert_eq!(sd.comments, vec!["# setup"]);
    }

    #[test]
    fn test_parse_string_step_definition_without_params() {
        let sd = StepDefinition::parse("steps.rb:1", &lines(&["When('I log out') do", "end"]))
            .unwrap();
        assert_eq!(sd.pattern, "'I log out'");
        assert!(sd.parameters.is_empty());
        assert!(sd.code.is_empty());
    }

    #[test]
    fn test_bad_header_is_an_error() {
        let err = StepDefinition::parse("steps.rb:1", &lines(&["Given do", "end"])).unwrap_err();
        assert!(matches!(err, Error::StepDefinitionSyntax { .. }));
    }
}
