//! Rendered blocks and block splitting

use crate::data::parse::parse_error;
use crate::data::tokenize::is_content;
use crate::models::SchemaPath;
use crate::validation::DataError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static BEGIN_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*BEGIN\s+([A-Za-z0-9_]+)(?:\s+(\d+))?\s*$").unwrap());
static END_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*END\s+([A-Za-z0-9_]+)(?:\s+(\d+))?\s*$").unwrap());

/// One `BEGIN` ... `END` section of a package file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub name: String,
    /// Stress period of a repeating block
    pub index: Option<u32>,
    pub lines: Vec<String>,
}

impl Block {
    pub fn new(name: impl Into<String>, index: Option<u32>, lines: Vec<String>) -> Self {
        Self {
            name: name.into(),
            index,
            lines,
        }
    }

    /// Block name with its period index, e.g. `period 1`
    pub fn header(&self) -> String {
        match self.index {
            Some(index) => format!("{} {}", self.name, index),
            None => self.name.clone(),
        }
    }

    pub fn render(&self) -> String {
        let header = self.header();
        let mut out = format!("BEGIN {}\n", header);
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&format!("END {}\n", header));
        out
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Block as read from a file, content lines with their line numbers
#[derive(Debug, Clone)]
pub(crate) struct RawBlock {
    pub name: String,
    pub index: Option<u32>,
    pub line: usize,
    pub lines: Vec<(usize, String)>,
}

/// Split package file text into its blocks
pub(crate) fn split_blocks(path: &SchemaPath, text: &str) -> Result<Vec<RawBlock>, DataError> {
    let mut blocks = Vec::new();
    let mut current: Option<RawBlock> = None;

    for (idx, line) in text.lines().enumerate() {
        let no = idx + 1;
        if !is_content(line) {
            continue;
        }
        if let Some(caps) = BEGIN_BLOCK.captures(line) {
            if let Some(open) = &current {
                return Err(parse_error(
                    path,
                    no,
                    &format!("BEGIN inside block '{}' opened at line {}", open.name, open.line),
                ));
            }
            let index = caps
                .get(2)
                .map(|m| {
                    m.as_str()
                        .parse::<u32>()
                        .map_err(|e| parse_error(path, no, &format!("invalid block index: {}", e)))
                })
                .transpose()?;
            current = Some(RawBlock {
                name: caps[1].to_lowercase(),
                index,
                line: no,
                lines: Vec::new(),
            });
            continue;
        }
        if let Some(caps) = END_BLOCK.captures(line) {
            match current.take() {
                Some(block) if block.name.eq_ignore_ascii_case(&caps[1]) => blocks.push(block),
                Some(block) => {
                    return Err(parse_error(
                        path,
                        no,
                        &format!("END {} closes block '{}'", &caps[1], block.name),
                    ));
                }
                None => return Err(parse_error(path, no, "END without BEGIN")),
            }
            continue;
        }
        match current.as_mut() {
            Some(block) => block.lines.push((no, line.to_string())),
            None => return Err(parse_error(path, no, "data outside of a block")),
        }
    }

    if let Some(open) = current {
        return Err(parse_error(
            path,
            open.line,
            &format!("block '{}' is never closed", open.name),
        ));
    }
    Ok(blocks)
}
