//! Textual color rules.
//!
//! One rule per line: `<key> <color>`. The key is a value, a percentage of
//! the domain (`25%`), `nv` (no-data color) or `default` (color for values
//! outside the table). Colors are written `R G B`, `R:G:B`, `#RRGGBB` or by
//! name. Blank lines and `#` comments are skipped; `end` stops reading.
//!
//! On a single-value domain every percentage resolves to that value. Rules
//! landing on the same value there keep the first one in file order, as
//! long as at least one of them is a percentage; two explicit values are
//! still duplicates.

use crate::domain::model::{ColorBreakpoint, ColorTable, Rgb, RuleInput, TableKind, ValueDomain};
use crate::utils::error::{ColorError, Result};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::LazyLock;

static RGB_TRIPLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}):(\d{1,3}):(\d{1,3})$").unwrap());
static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").unwrap());

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("white", Rgb { r: 255, g: 255, b: 255 }),
    ("black", Rgb { r: 0, g: 0, b: 0 }),
    ("red", Rgb { r: 255, g: 0, b: 0 }),
    ("green", Rgb { r: 0, g: 255, b: 0 }),
    ("blue", Rgb { r: 0, g: 0, b: 255 }),
    ("yellow", Rgb { r: 255, g: 255, b: 0 }),
    ("magenta", Rgb { r: 255, g: 0, b: 255 }),
    ("cyan", Rgb { r: 0, g: 255, b: 255 }),
    ("aqua", Rgb { r: 100, g: 128, b: 255 }),
    ("grey", Rgb { r: 128, g: 128, b: 128 }),
    ("gray", Rgb { r: 128, g: 128, b: 128 }),
    ("orange", Rgb { r: 255, g: 128, b: 0 }),
    ("brown", Rgb { r: 180, g: 77, b: 25 }),
    ("purple", Rgb { r: 128, g: 0, b: 255 }),
    ("violet", Rgb { r: 128, g: 0, b: 255 }),
    ("indigo", Rgb { r: 0, g: 128, b: 255 }),
];

pub fn named_color(name: &str) -> Option<Rgb> {
    NAMED_COLORS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, c)| *c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RuleKey {
    Value(u64),
    Percent(u64),
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Value(f64),
    Percent(f64),
}

struct RuleLine {
    line: usize,
    anchor: Anchor,
    color: Rgb,
}

fn parse_error(line: usize, message: impl Into<String>) -> ColorError {
    ColorError::RuleFileParseError {
        line,
        message: message.into(),
    }
}

fn parse_channel(line: usize, token: &str) -> Result<u8> {
    token
        .parse::<u16>()
        .ok()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| parse_error(line, format!("invalid color component '{}'", token)))
}

fn parse_color(line: usize, tokens: &[&str]) -> Result<Rgb> {
    match tokens {
        [r, g, b] => Ok(Rgb::new(
            parse_channel(line, r)?,
            parse_channel(line, g)?,
            parse_channel(line, b)?,
        )),
        [single] => {
            if let Some(caps) = RGB_TRIPLET.captures(single) {
                return Ok(Rgb::new(
                    parse_channel(line, &caps[1])?,
                    parse_channel(line, &caps[2])?,
                    parse_channel(line, &caps[3])?,
                ));
            }
            if let Some(caps) = HEX_COLOR.captures(single) {
                let hex = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
                return Ok(Rgb::new(hex(&caps[1]), hex(&caps[2]), hex(&caps[3])));
            }
            named_color(single).ok_or_else(|| parse_error(line, format!("unknown color '{}'", single)))
        }
        _ => Err(parse_error(line, "expected a color")),
    }
}

fn parse_number(line: usize, token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| parse_error(line, format!("invalid value '{}'", token)))
}

/// Reads rules and resolves percentages against `domain`.
pub fn parse_rules<R: BufRead>(reader: R, domain: &ValueDomain) -> Result<ColorTable> {
    let mut rules = Vec::new();
    let mut seen = HashSet::new();
    let mut no_data = None;
    let mut default = None;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("end") {
            break;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let (key, color_tokens) = tokens
            .split_first()
            .ok_or_else(|| parse_error(line_no, "empty rule"))?;
        let color = parse_color(line_no, color_tokens)?;

        if key.eq_ignore_ascii_case("nv") {
            no_data = Some(color);
            continue;
        }
        if key.eq_ignore_ascii_case("default") {
            default = Some(color);
            continue;
        }

        let (rule_key, anchor) = match key.strip_suffix('%') {
            Some(percent) => {
                let p = parse_number(line_no, percent)?;
                (RuleKey::Percent(p.to_bits()), Anchor::Percent(p))
            }
            None => {
                let v = parse_number(line_no, key)?;
                (RuleKey::Value(v.to_bits()), Anchor::Value(v))
            }
        };
        if !seen.insert(rule_key) {
            return Err(ColorError::DuplicateBreakpointError {
                value: key.to_string(),
            });
        }

        rules.push(RuleLine {
            line: line_no,
            anchor,
            color,
        });
    }

    if rules.is_empty() {
        return Err(parse_error(0, "no color rules found"));
    }

    let mut breakpoints: Vec<ColorBreakpoint> = Vec::with_capacity(rules.len());
    // value bits -> whether a percentage placed it
    let mut placed: HashMap<u64, bool> = HashMap::new();
    for rule in rules {
        let (value, is_percent) = match rule.anchor {
            Anchor::Value(v) => (v, false),
            Anchor::Percent(p) => (domain.at_percent(p), true),
        };
        if let Some(earlier_percent) = placed.get(&value.to_bits()).copied() {
            // 單值範圍時百分比會落在同一點，保留第一條
            if domain.is_degenerate() && (is_percent || earlier_percent) {
                tracing::debug!("Rule on line {} collapses onto value {}", rule.line, value);
                continue;
            }
            return Err(ColorError::DuplicateBreakpointError {
                value: value.to_string(),
            });
        }
        placed.insert(value.to_bits(), is_percent);
        breakpoints.push(ColorBreakpoint::new(value, rule.color));
    }

    let table = ColorTable::new(breakpoints, TableKind::Continuous)?
        .with_no_data_color(no_data.unwrap_or(ColorTable::DEFAULT_NO_DATA))
        .with_default_color(default);
    Ok(table)
}

pub fn parse_rules_str(text: &str, domain: &ValueDomain) -> Result<ColorTable> {
    parse_rules(text.as_bytes(), domain)
}

pub fn read_rules(input: &RuleInput, domain: &ValueDomain) -> Result<ColorTable> {
    match input {
        RuleInput::Path(path) => {
            tracing::debug!("Reading color rules from {}", path.display());
            let file = File::open(path)?;
            parse_rules(BufReader::new(file), domain)
        }
        RuleInput::Stdin => {
            tracing::info!("⌨️  Reading color rules from standard input");
            let stdin = std::io::stdin();
            parse_rules(stdin.lock(), domain)
        }
        RuleInput::Text(text) => parse_rules_str(text, domain),
    }
}

/// Writes `table` back as absolute rules, readable by [`parse_rules`].
pub fn render_rules(table: &ColorTable) -> String {
    let fmt = |c: Rgb| format!("{}:{}:{}", c.r, c.g, c.b);
    let mut lines: Vec<String> = table
        .breakpoints()
        .iter()
        .map(|bp| format!("{} {}", bp.value, fmt(bp.color)))
        .collect();
    lines.push(format!("nv {}", fmt(table.no_data_color())));
    if let Some(default) = table.default_color() {
        lines.push(format!("default {}", fmt(default)));
    }
    lines.join("\n")
}
