//! Cross-reference table parsing.
//!
//! The xref maps object numbers to byte offsets, giving random access into
//! the file. Both classic `xref` tables and PDF 1.5 cross-reference streams
//! are read; incremental-update chains are followed through /Prev.

use crate::error::{Error, Result};
use crate::object::Object;
use crate::parser::parse_indirect_object;
use std::collections::HashMap;

/// Where an object lives according to the xref.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Free entry; `next_free` is the head of the free list
    Free {
        /// Object number of the next free object
        next_free: u64,
        /// Generation to use if the number is reused
        gen: u16,
    },
    /// Object stored directly in the file at a byte offset
    Uncompressed {
        /// Byte offset of the `n g obj` header
        offset: u64,
        /// Generation number
        gen: u16,
    },
    /// Object stored inside an object stream
    Compressed {
        /// Object number of the containing stream
        stream_id: u32,
        /// Index of the object within the stream
        index: u16,
    },
}

/// Merged view of all cross-reference sections in a file.
#[derive(Debug, Clone, Default)]
pub struct CrossRefTable {
    entries: HashMap<u32, XRefEntry>,
    trailer: Option<HashMap<String, Object>>,
}

impl CrossRefTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The trailer dictionary of the newest section, if any.
    pub fn trailer(&self) -> Option<&HashMap<String, Object>> {
        self.trailer.as_ref()
    }

    /// Set the trailer dictionary.
    pub fn set_trailer(&mut self, trailer: HashMap<String, Object>) {
        self.trailer = Some(trailer);
    }

    /// Record an entry for an object number.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// Look up an object number.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Iterate over all object numbers in the table.
    pub fn object_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    /// Merge entries from an older section. Existing entries win, so newer
    /// sections shadow the chain they point back to.
    pub fn merge_from(&mut self, older: CrossRefTable) {
        for (num, entry) in older.entries {
            self.entries.entry(num).or_insert(entry);
        }
        if self.trailer.is_none() {
            self.trailer = older.trailer;
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Longest tail of the file scanned for `startxref`.
const STARTXREF_SCAN_WINDOW: usize = 2048;

/// Find the offset of the newest xref section by scanning the file tail for
/// the `startxref` keyword.
pub fn find_startxref(bytes: &[u8]) -> Result<u64> {
    let window_start = bytes.len().saturating_sub(STARTXREF_SCAN_WINDOW);
    let tail = &bytes[window_start..];

    let keyword = b"startxref";
    let pos = tail
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .ok_or_else(|| Error::MalformedDocument("startxref keyword not found".to_string()))?;

    let after = &tail[pos + keyword.len()..];
    let digits: Vec<u8> = after
        .iter()
        .copied()
        .skip_while(|c| c.is_ascii_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        return Err(Error::MalformedDocument(
            "no offset after startxref".to_string(),
        ));
    }

    std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| Error::MalformedDocument("invalid startxref offset".to_string()))
}

/// Parse the xref section at `offset` and every older section it chains to.
pub fn parse_xref(bytes: &[u8], offset: u64) -> Result<CrossRefTable> {
    parse_xref_chain(bytes, offset, 0)
}

fn parse_xref_chain(bytes: &[u8], offset: u64, depth: u32) -> Result<CrossRefTable> {
    // Circular /Prev chains must terminate
    if depth > 64 {
        return Err(Error::MalformedDocument(
            "xref /Prev chain too deep".to_string(),
        ));
    }
    if offset as usize >= bytes.len() {
        return Err(Error::MalformedDocument(format!(
            "xref offset {} beyond end of file",
            offset
        )));
    }

    let section = &bytes[offset as usize..];
    let trimmed = section
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .map(|i| &section[i..])
        .unwrap_or(&[]);

    let mut xref = if trimmed.starts_with(b"xref") {
        log::debug!("classic xref section at offset {}", offset);
        parse_classic_xref(section)?
    } else if trimmed.first().is_some_and(|c| c.is_ascii_digit()) {
        log::debug!("xref stream at offset {}", offset);
        parse_xref_stream(section)?
    } else {
        return Err(Error::MalformedDocument(format!(
            "no xref section at offset {}",
            offset
        )));
    };

    let prev = xref
        .trailer()
        .and_then(|t| t.get("Prev"))
        .and_then(|o| o.as_integer());
    if let Some(prev_offset) = prev {
        if prev_offset < 0 {
            return Err(Error::MalformedDocument("negative /Prev offset".to_string()));
        }
        let older = parse_xref_chain(bytes, prev_offset as u64, depth + 1)?;
        xref.merge_from(older);
    }

    Ok(xref)
}

/// Parse a classic `xref` table with its subsection headers and trailer.
fn parse_classic_xref(section: &[u8]) -> Result<CrossRefTable> {
    let text = String::from_utf8_lossy(section);
    let lines = split_lines(&text);

    let mut xref = CrossRefTable::new();
    let mut idx = 0;

    // Skip blank lines, expect the xref keyword
    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }
    if idx >= lines.len() || !lines[idx].trim().starts_with("xref") {
        return Err(Error::MalformedDocument("missing xref keyword".to_string()));
    }
    idx += 1;

    let mut trailer_text: Option<String> = None;
    while idx < lines.len() {
        let line = lines[idx].trim();
        idx += 1;

        if let Some(rest) = line.strip_prefix("trailer") {
            // The dictionary may share the trailer keyword's line
            let mut text = rest.to_string();
            for tail in &lines[idx..] {
                text.push('\n');
                text.push_str(tail);
            }
            trailer_text = Some(text);
            break;
        }
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        // Subsection header: "first count"
        let mut parts = line.split_whitespace();
        let (start, count) = match (parts.next(), parts.next()) {
            (Some(a), Some(b)) => {
                let start: u32 = a.parse().map_err(|_| {
                    Error::MalformedDocument(format!("bad xref subsection header: {:?}", line))
                })?;
                let count: u32 = b.parse().map_err(|_| {
                    Error::MalformedDocument(format!("bad xref subsection header: {:?}", line))
                })?;
                (start, count)
            },
            _ => {
                return Err(Error::MalformedDocument(format!(
                    "bad xref subsection header: {:?}",
                    line
                )));
            },
        };

        if count > 1_000_000 {
            return Err(Error::MalformedDocument(
                "xref subsection count exceeds limit".to_string(),
            ));
        }

        let mut parsed = 0;
        while parsed < count && idx < lines.len() {
            let entry_line = lines[idx].trim();
            idx += 1;
            if entry_line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = entry_line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(Error::MalformedDocument(format!(
                    "bad xref entry: {:?}",
                    entry_line
                )));
            }
            let value: u64 = fields[0].parse().map_err(|_| {
                Error::MalformedDocument(format!("bad xref entry offset: {:?}", fields[0]))
            })?;
            let gen: u16 = fields[1].parse().map_err(|_| {
                Error::MalformedDocument(format!("bad xref entry generation: {:?}", fields[1]))
            })?;
            let entry = match fields[2] {
                "n" => XRefEntry::Uncompressed { offset: value, gen },
                "f" => XRefEntry::Free {
                    next_free: value,
                    gen,
                },
                other => {
                    return Err(Error::MalformedDocument(format!(
                        "bad xref entry type: {:?}",
                        other
                    )));
                },
            };
            xref.add_entry(start + parsed, entry);
            parsed += 1;
        }
    }

    let trailer_text = trailer_text
        .ok_or_else(|| Error::MalformedDocument("xref table has no trailer".to_string()))?;

    let (_, trailer) = crate::parser::parse_object(trailer_text.as_bytes())
        .map_err(|_| Error::MalformedDocument("unparseable trailer dictionary".to_string()))?;
    let trailer = match trailer {
        Object::Dictionary(d) => d,
        other => {
            return Err(Error::MalformedDocument(format!(
                "trailer is not a dictionary: {}",
                other.type_name()
            )));
        },
    };
    xref.set_trailer(trailer);

    Ok(xref)
}

/// Parse a cross-reference stream object.
///
/// The stream dictionary carries /W field widths, /Size, and optional /Index
/// subsection ranges. Each binary entry has three fields: type, offset or
/// stream number, and generation or index within the stream.
fn parse_xref_stream(section: &[u8]) -> Result<CrossRefTable> {
    let (_, (_, obj)) = parse_indirect_object(section)
        .map_err(|_| Error::MalformedDocument("unparseable xref stream object".to_string()))?;

    let dict = match &obj {
        Object::Stream { dict, .. } => dict.clone(),
        other => {
            return Err(Error::MalformedDocument(format!(
                "xref stream is not a stream object: {}",
                other.type_name()
            )));
        },
    };

    if let Some(type_name) = dict.get("Type").and_then(|o| o.as_name()) {
        if type_name != "XRef" {
            return Err(Error::MalformedDocument(format!(
                "expected /Type /XRef, got /{}",
                type_name
            )));
        }
    }

    let w = dict
        .get("W")
        .and_then(|o| o.as_array())
        .ok_or_else(|| Error::MalformedDocument("xref stream missing /W".to_string()))?;
    if w.len() != 3 {
        return Err(Error::MalformedDocument("xref stream /W must have 3 fields".to_string()));
    }
    let widths: Vec<usize> = w
        .iter()
        .map(|o| {
            o.as_integer()
                .filter(|&v| (0..=8).contains(&v))
                .map(|v| v as usize)
                .ok_or_else(|| Error::MalformedDocument("invalid /W field width".to_string()))
        })
        .collect::<Result<_>>()?;
    let entry_size = widths.iter().sum::<usize>();
    if entry_size == 0 {
        return Err(Error::MalformedDocument("zero-width xref stream entries".to_string()));
    }

    let size = dict
        .get("Size")
        .and_then(|o| o.as_integer())
        .ok_or_else(|| Error::MalformedDocument("xref stream missing /Size".to_string()))?
        as u32;

    let index_ranges: Vec<(u32, u32)> = match dict.get("Index").and_then(|o| o.as_array()) {
        Some(index) => {
            if index.len() % 2 != 0 {
                return Err(Error::MalformedDocument("odd /Index array".to_string()));
            }
            index
                .chunks(2)
                .map(|pair| {
                    let start = pair[0].as_integer().ok_or_else(|| {
                        Error::MalformedDocument("invalid /Index start".to_string())
                    })? as u32;
                    let count = pair[1].as_integer().ok_or_else(|| {
                        Error::MalformedDocument("invalid /Index count".to_string())
                    })? as u32;
                    Ok((start, count))
                })
                .collect::<Result<_>>()?
        },
        None => vec![(0, size)],
    };

    let decoded = obj.decode_stream_data()?;

    let mut xref = CrossRefTable::new();
    let mut pos = 0;

    for (start, count) in index_ranges {
        for i in 0..count {
            if pos + entry_size > decoded.len() {
                return Err(Error::MalformedDocument(
                    "truncated xref stream data".to_string(),
                ));
            }
            let raw = &decoded[pos..pos + entry_size];
            pos += entry_size;

            // A zero-width type field defaults to type 1
            let entry_type = if widths[0] > 0 {
                read_be_int(&raw[..widths[0]])
            } else {
                1
            };
            let field2 = read_be_int(&raw[widths[0]..widths[0] + widths[1]]);
            let field3 = read_be_int(&raw[widths[0] + widths[1]..]);

            let entry = match entry_type {
                0 => XRefEntry::Free {
                    next_free: field2,
                    gen: field3 as u16,
                },
                1 => XRefEntry::Uncompressed {
                    offset: field2,
                    gen: field3 as u16,
                },
                2 => XRefEntry::Compressed {
                    stream_id: field2 as u32,
                    index: field3 as u16,
                },
                other => {
                    return Err(Error::MalformedDocument(format!(
                        "invalid xref stream entry type: {}",
                        other
                    )));
                },
            };
            xref.add_entry(start + i, entry);
        }
    }

    xref.set_trailer(dict);
    Ok(xref)
}

/// Big-endian integer of up to 8 bytes.
fn read_be_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Split on CR, LF, or CRLF. `str::lines` misses bare CR, which classic
/// xref tables are allowed to use.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => lines.push(std::mem::take(&mut current)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(std::mem::take(&mut current));
            },
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
