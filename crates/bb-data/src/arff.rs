//! ARFF (Attribute-Relation File Format) reader.
//!
//! Supports the dense data section with `numeric`/`real`/`integer`, nominal
//! (`{a,b,c}`), `string` and `date` attributes. Nominal, string and date
//! values are decoded to text. `?` marks a missing value. Sparse rows and
//! relational attributes are rejected.

use crate::dataset::{Column, Dataset};
use crate::error::DataError;

#[derive(Debug, Clone, PartialEq)]
enum AttributeKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone)]
struct Attribute {
    name: String,
    kind: AttributeKind,
}

/// Parse ARFF text into a dataset.
pub fn parse_arff(text: &str) -> Result<Dataset, DataError> {
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut in_data = false;
    let mut numeric: Vec<Vec<f64>> = Vec::new();
    let mut textual: Vec<Vec<Option<String>>> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if !in_data {
            let lower = line.to_ascii_lowercase();
            if lower.starts_with("@relation") {
                continue;
            }
            if lower.starts_with("@attribute") {
                attributes.push(parse_attribute(&line["@attribute".len()..], line_no)?);
                continue;
            }
            if lower.starts_with("@data") {
                if attributes.is_empty() {
                    return Err(malformed(line_no, "@data before any @attribute"));
                }
                numeric = vec![Vec::new(); attributes.len()];
                textual = vec![Vec::new(); attributes.len()];
                in_data = true;
                continue;
            }
            return Err(malformed(line_no, format!("unexpected header line: {}", line)));
        }

        if line.starts_with('{') {
            return Err(malformed(line_no, "sparse ARFF rows are not supported"));
        }
        let values = split_values(line, line_no)?;
        if values.len() != attributes.len() {
            return Err(malformed(
                line_no,
                format!(
                    "expected {} values, found {}",
                    attributes.len(),
                    values.len()
                ),
            ));
        }
        for (col, (attr, value)) in attributes.iter().zip(values).enumerate() {
            match attr.kind {
                AttributeKind::Numeric => {
                    let v = match value {
                        None => f64::NAN,
                        Some(s) => s.trim().parse::<f64>().map_err(|_| {
                            malformed(
                                line_no,
                                format!("attribute {} expects a number, got '{}'", attr.name, s),
                            )
                        })?,
                    };
                    numeric[col].push(v);
                }
                AttributeKind::Text => textual[col].push(value),
            }
        }
    }

    if !in_data {
        return Err(malformed(text.lines().count(), "missing @data section"));
    }

    let mut columns = Vec::with_capacity(attributes.len());
    for (col, attr) in attributes.into_iter().enumerate() {
        let column = match attr.kind {
            AttributeKind::Numeric => Column::Numeric(std::mem::take(&mut numeric[col])),
            AttributeKind::Text => Column::Categorical(std::mem::take(&mut textual[col])),
        };
        columns.push((attr.name, column));
    }
    Dataset::from_columns(columns)
}

fn malformed(line: usize, message: impl Into<String>) -> DataError {
    DataError::Malformed {
        line,
        message: message.into(),
    }
}

/// Parse the remainder of an `@attribute` line: `<name> <type>`.
fn parse_attribute(rest: &str, line_no: usize) -> Result<Attribute, DataError> {
    let rest = rest.trim();
    let (name, type_spec) = match rest.chars().next() {
        Some(q @ ('\'' | '"')) => {
            let close = rest[1..]
                .find(q)
                .ok_or_else(|| malformed(line_no, "unterminated attribute name"))?;
            (rest[1..=close].to_string(), rest[close + 2..].trim())
        }
        Some(_) => {
            let end = rest
                .find(char::is_whitespace)
                .ok_or_else(|| malformed(line_no, "attribute without type"))?;
            (rest[..end].to_string(), rest[end..].trim())
        }
        None => return Err(malformed(line_no, "empty attribute declaration")),
    };

    let lower = type_spec.to_ascii_lowercase();
    let kind = if lower.starts_with('{') {
        AttributeKind::Text
    } else if lower == "numeric" || lower == "real" || lower == "integer" {
        AttributeKind::Numeric
    } else if lower == "string" || lower.starts_with("date") {
        AttributeKind::Text
    } else {
        return Err(malformed(
            line_no,
            format!("unsupported attribute type '{}' for {}", type_spec, name),
        ));
    };
    Ok(Attribute { name, kind })
}

/// Split a data row on commas, honoring single and double quotes.
///
/// Unquoted `?` becomes `None`.
fn split_values(line: &str, line_no: usize) -> Result<Vec<Option<String>>, DataError> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut was_quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                } else {
                    return Err(malformed(line_no, format!("dangling escape in {}-quoted value", q)));
                }
            }
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                was_quoted = true;
            }
            None if c == ',' => {
                out.push(finish_value(&current, was_quoted));
                current.clear();
                was_quoted = false;
            }
            None => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(malformed(line_no, "unterminated quoted value"));
    }
    out.push(finish_value(&current, was_quoted));
    Ok(out)
}

fn finish_value(raw: &str, quoted: bool) -> Option<String> {
    if quoted {
        return Some(raw.to_string());
    }
    let trimmed = raw.trim();
    if trimmed == "?" {
        None
    } else {
        Some(trimmed.to_string())
    }
}
