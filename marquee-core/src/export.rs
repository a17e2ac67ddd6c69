//! Line-oriented `.tlf` export of marker text and geometry
//!
//! ```text
//! 1:first marker text
//! 2:second marker text
//!
//! 1{0,0}/{10,20};2{5,5}/{1,1};
//! ```
//!
//! The text block holds one `<id>:<text>` line per marker in ascending id
//! order (text may itself span several lines), then a single blank line,
//! then the geometry block of `<id>{x,y}/{w,h};` tokens.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Annotations, Entry, Geometry, MarkerId};

/// File formats offered by the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Tlf,
    /// Extended format; declared but not implemented
    Xtlf,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[ExportFormat::Tlf, ExportFormat::Xtlf]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Tlf => "tlf",
            ExportFormat::Xtlf => "xtlf",
        }
    }

    pub fn from_extension(ext: &str) -> Option<ExportFormat> {
        Self::all()
            .iter()
            .copied()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }
}

pub fn export(annotations: &Annotations, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Tlf => Ok(to_tlf(annotations)),
        ExportFormat::Xtlf => {
            warn!("xTLF export requested");
            Err(Error::Unsupported("xTLF export"))
        }
    }
}

pub fn import(input: &str, format: ExportFormat) -> Result<Annotations> {
    match format {
        ExportFormat::Tlf => from_tlf(input),
        ExportFormat::Xtlf => {
            warn!("xTLF import requested");
            Err(Error::Unsupported("xTLF import"))
        }
    }
}

/// Serialize every entry except id 0, in ascending id order
pub fn to_tlf(annotations: &Annotations) -> String {
    let mut text_block = String::new();
    let mut geometry_block = String::new();

    for (id, entry) in annotations.iter().filter(|(id, _)| id.is_some()) {
        let g = &entry.geometry;
        let _ = writeln!(text_block, "{}:{}", id, entry.text);
        let _ = write!(
            geometry_block,
            "{}{{{},{}}}/{{{},{}}};",
            id, g.origin.x, g.origin.y, g.extent.width, g.extent.height
        );
    }

    debug!(entries = annotations.len(), "serialized annotations");
    format!("{}\n{}", text_block, geometry_block)
}

/// Parse the output of [`to_tlf`] back into annotations
pub fn from_tlf(input: &str) -> Result<Annotations> {
    if input.trim().is_empty() {
        return Ok(Annotations::new());
    }

    let (text_block, geometry_block) = match input.rfind("\n\n") {
        Some(pos) => (&input[..pos + 1], &input[pos + 2..]),
        None if input.starts_with('\n') => ("", &input[1..]),
        None => {
            return Err(Error::parse(
                1,
                "missing blank line between text and geometry blocks",
            ))
        }
    };

    let geometry_line = text_block.lines().count() + 2;
    let geometries = parse_geometry_block(geometry_block.trim_end(), geometry_line)?;
    let texts = parse_text_block(text_block, &geometries)?;

    Ok(geometries
        .into_iter()
        .map(|(id, geometry)| {
            let text = texts.get(&id).cloned().unwrap_or_default();
            (id, Entry::new(text, geometry))
        })
        .collect())
}

fn parse_geometry_block(block: &str, line: usize) -> Result<BTreeMap<MarkerId, Geometry>> {
    let mut geometries = BTreeMap::new();
    if block.is_empty() {
        return Ok(geometries);
    }

    let mut tokens: Vec<&str> = block.split(';').collect();
    if tokens.pop() != Some("") {
        return Err(Error::parse(line, "geometry block must end with ';'"));
    }

    for token in tokens {
        let (id, geometry) = parse_geometry_token(token.trim(), line)?;
        if geometries.insert(id, geometry).is_some() {
            return Err(Error::DuplicateId(id));
        }
    }
    Ok(geometries)
}

fn parse_geometry_token(token: &str, line: usize) -> Result<(MarkerId, Geometry)> {
    let brace = token
        .find('{')
        .ok_or_else(|| Error::parse(line, format!("expected '{{' in `{}`", token)))?;
    let id = parse_id(&token[..brace])
        .ok_or_else(|| Error::parse(line, format!("bad id in `{}`", token)))?;
    if !id.is_valid() {
        return Err(Error::InvalidId(id));
    }

    let (point, extent) = token[brace..]
        .split_once('/')
        .ok_or_else(|| Error::parse(line, format!("expected '/' in `{}`", token)))?;
    let (x, y) = parse_pair(point, line)?;
    let (width, height) = parse_pair(extent, line)?;

    Ok((id, Geometry::new(x, y, width, height)))
}

fn parse_pair(s: &str, line: usize) -> Result<(f64, f64)> {
    let inner = s
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| Error::parse(line, format!("expected `{{a,b}}`, found `{}`", s)))?;
    let (a, b) = inner
        .split_once(',')
        .ok_or_else(|| Error::parse(line, format!("expected two coordinates in `{}`", s)))?;

    let number = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| Error::parse(line, format!("`{}` is not a number", v)))
    };
    Ok((number(a)?, number(b)?))
}

fn parse_id(s: &str) -> Option<MarkerId> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().map(MarkerId)
}

/// A text line opens a new entry when it starts with `<id>:` for a known id
/// greater than the previous entry's; anything else continues the previous text.
fn parse_text_block(
    block: &str,
    geometries: &BTreeMap<MarkerId, Geometry>,
) -> Result<BTreeMap<MarkerId, String>> {
    let mut texts: BTreeMap<MarkerId, String> = BTreeMap::new();
    let Some(block) = block.strip_suffix('\n') else {
        return Ok(texts);
    };

    let mut current: Option<MarkerId> = None;
    for (index, line) in block.split('\n').enumerate() {
        let opened = line.split_once(':').and_then(|(prefix, rest)| {
            let id = parse_id(prefix)?;
            let known = geometries.contains_key(&id);
            let ascending = current.map_or(true, |prev| id > prev);
            (known && ascending).then_some((id, rest))
        });

        match (opened, current) {
            (Some((id, rest)), _) => {
                texts.insert(id, rest.to_string());
                current = Some(id);
            }
            (None, Some(id)) => {
                if let Some(text) = texts.get_mut(&id) {
                    text.push('\n');
                    text.push_str(line);
                }
            }
            (None, None) => {
                return Err(Error::parse(
                    index + 1,
                    format!("`{}` does not start with a known marker id", line),
                ));
            }
        }
    }
    Ok(texts)
}
