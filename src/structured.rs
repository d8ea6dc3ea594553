//! Best-effort recognition of structured data in assistant text
//!
//! Line-oriented heuristics, not a grammar: a markdown table, or failing
//! that inline `label: number` pairs, plus numeric summaries derived from a
//! recognized table. Exotic formatting is allowed to fall through
//! unrecognized; absence of structure is a valid result, never an error.

use regex::Regex;
use std::collections::HashSet;

/// One label/value pair driving a metric bar
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMetric {
    pub label: String,
    pub value: f64,
}

/// A recognized markdown table. Rows stay as ragged as the source text;
/// no padding is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Column-sum summary derived from a table
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedKpi {
    pub label: String,
    pub value: f64,
}

/// Placeholder for rows whose label cell is missing or empty
const MISSING_LABEL: &str = "N/D";

const MAX_KPIS: usize = 3;
const MAX_SERIES: usize = 8;

/// Parse a locale-tolerant number: currency, percent and whitespace are
/// stripped, dots are thousands separators, a comma is the decimal mark.
/// Anything non-numeric after cleanup is not a number.
pub fn parse_number(value: &str) -> Option<f64> {
    let mut cleaned = String::new();
    for c in value.chars() {
        match c {
            '€' | '$' | '%' | '.' => {}
            ',' => cleaned.push('.'),
            c if c.is_whitespace() => {}
            c => cleaned.push(c),
        }
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Recognize the first markdown table in the text: a `|`-delimited header
/// line, a separator line, and at least one `|`-prefixed data row. Blank
/// lines are skipped; collection stops at the first non-`|` line.
pub fn parse_markdown_table(text: &str) -> Option<ParsedTable> {
    let separator_pattern = Regex::new(r"^\|?\s*:?-{2,}").unwrap();

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let start = lines
        .iter()
        .position(|l| l.starts_with('|') && l.ends_with('|'))?;
    if start + 2 >= lines.len() {
        return None;
    }
    if !separator_pattern.is_match(lines[start + 1]) {
        return None;
    }

    let headers = split_cells(lines[start]);
    let mut rows = Vec::new();
    for line in &lines[start + 2..] {
        if !line.starts_with('|') {
            break;
        }
        let cells = split_cells(line);
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    if headers.is_empty() || rows.is_empty() {
        return None;
    }
    Some(ParsedTable { headers, rows })
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Scan text for `label: number` pairs: inline, or a label-only line whose
/// value terminates the following line. First occurrence wins per label.
pub fn parse_metrics(text: &str) -> Vec<ParsedMetric> {
    let inline_pattern = Regex::new(r"^([^:]{2,32}):\s*([0-9]+(?:[.,][0-9]+)?)\s*$").unwrap();
    let label_only_pattern = Regex::new(r"^([^:]{2,32}):\s*$").unwrap();
    let trailing_number_pattern = Regex::new(r"([0-9]+(?:[.,][0-9]+)?)\s*$").unwrap();

    let lines: Vec<&str> = text.lines().collect();
    let mut metrics: Vec<ParsedMetric> = Vec::new();

    for (i, raw_line) in lines.iter().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = inline_pattern.captures(line) {
            if let Some(value) = decimal_value(&caps[2]) {
                metrics.push(ParsedMetric {
                    label: caps[1].trim().to_string(),
                    value,
                });
            }
            continue;
        }

        let Some(caps) = label_only_pattern.captures(line) else {
            continue;
        };
        let Some(next) = lines.get(i + 1) else {
            continue;
        };
        if let Some(number) = trailing_number_pattern.captures(next.trim()) {
            if let Some(value) = decimal_value(&number[1]) {
                metrics.push(ParsedMetric {
                    label: caps[1].trim().to_string(),
                    value,
                });
            }
        }
    }

    let mut seen = HashSet::new();
    metrics
        .into_iter()
        .filter(|m| m.value.is_finite() && seen.insert(m.label.clone()))
        .collect()
}

fn decimal_value(digits: &str) -> Option<f64> {
    digits
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Sum each column whose cells parse as numbers, keeping the first
/// qualifying columns. A column qualifies when at least one cell parses.
pub fn kpis_from_table(table: &ParsedTable) -> Vec<ParsedKpi> {
    let mut kpis = Vec::new();
    for (c, header) in table.headers.iter().enumerate() {
        let nums: Vec<f64> = table
            .rows
            .iter()
            .filter_map(|row| parse_number(row.get(c).map(String::as_str).unwrap_or("")))
            .collect();
        if nums.is_empty() {
            continue;
        }
        kpis.push(ParsedKpi {
            label: header.clone(),
            value: nums.iter().sum(),
        });
        if kpis.len() == MAX_KPIS {
            break;
        }
    }
    kpis
}

/// Label/value series for bar rendering: column 0 labels each row, the
/// value comes from the first column after it whose first-row cell parses
/// as a number. No such column means no series.
pub fn series_from_table(table: &ParsedTable) -> Vec<ParsedMetric> {
    if table.headers.len() < 2 {
        return Vec::new();
    }
    let Some(first_row) = table.rows.first() else {
        return Vec::new();
    };
    let Some(value_idx) = (1..first_row.len())
        .find(|&idx| parse_number(first_row[idx].as_str()).is_some())
    else {
        return Vec::new();
    };

    table
        .rows
        .iter()
        .map(|row| ParsedMetric {
            label: row
                .first()
                .map(String::as_str)
                .filter(|l| !l.is_empty())
                .unwrap_or(MISSING_LABEL)
                .to_string(),
            value: row
                .get(value_idx)
                .and_then(|cell| parse_number(cell))
                .unwrap_or(0.0),
        })
        .filter(|m| m.value.is_finite())
        .take(MAX_SERIES)
        .collect()
}

/// Structured render data derived from one formatted assistant message:
/// a table drives KPI cards and the bar series; without a table, inline
/// metric pairs drive the bars. Recomputed from the text on every pass,
/// never mutated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredView {
    pub table: Option<ParsedTable>,
    pub kpis: Vec<ParsedKpi>,
    pub metrics: Vec<ParsedMetric>,
}

impl StructuredView {
    pub fn extract(formatted: &str) -> Self {
        match parse_markdown_table(formatted) {
            Some(table) => {
                let kpis = kpis_from_table(&table);
                let metrics = series_from_table(&table);
                Self {
                    table: Some(table),
                    kpis,
                    metrics,
                }
            }
            None => Self {
                table: None,
                kpis: Vec::new(),
                metrics: parse_metrics(formatted),
            },
        }
    }
}
