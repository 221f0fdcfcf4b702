//! Reading the first worksheet of a workbook as a grid of display text

use std::collections::HashMap;
use std::io::{BufReader, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use zip::ZipArchive;

use super::cell_ref::parse_cell_ref;
use super::number_format::{builtin_kind, custom_kind, render_number, render_serial, DateKind};
use crate::error::{SheetError, SheetResult};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// First worksheet of a workbook
#[derive(Debug, Clone)]
pub(crate) struct SheetContents {
    /// Worksheet name as shown on the tab
    pub name: String,
    /// Zip entry holding the worksheet XML
    pub part: String,
    /// Cell text; `grid[0]` is sheet row 1
    pub grid: Vec<Vec<String>>,
}

/// Decode Excel's `_xHHHH_` escape sequences in strings.
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);
        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Read the first worksheet listed in the workbook
pub(crate) fn read_first_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> SheetResult<SheetContents> {
    if archive.by_name("[Content_Types].xml").is_err() {
        return Err(SheetError::InvalidFormat(
            "Missing [Content_Types].xml".into(),
        ));
    }

    let shared_strings = read_shared_strings(archive)?;
    let date_styles = read_date_styles(archive)?;
    let workbook = read_workbook_xml(archive)?;
    let rels = read_workbook_rels(archive)?;

    let (name, r_id) = workbook
        .sheets
        .into_iter()
        .next()
        .ok_or_else(|| SheetError::InvalidFormat("Workbook has no worksheets".into()))?;
    let part = rels
        .get(&r_id)
        .cloned()
        .ok_or_else(|| SheetError::MissingPart(format!("relationship {r_id} for sheet '{name}'")))?;

    let cells = CellContext {
        shared_strings: &shared_strings,
        date_styles: &date_styles,
        date1904: workbook.date1904,
    };
    let grid = read_worksheet(archive, &part, &cells)?;
    tracing::debug!(sheet = %name, part = %part, rows = grid.len(), "Read worksheet");

    Ok(SheetContents { name, part, grid })
}

fn open_xml<'a, R: Read + Seek>(
    archive: &'a mut ZipArchive<R>,
    part: &str,
) -> Option<Reader<BufReader<zip::read::ZipFile<'a, R>>>> {
    let file = archive.by_name(part).ok()?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.trim_text(false);
    Some(reader)
}

pub(super) fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> SheetResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Read the shared strings table
fn read_shared_strings<R: Read + Seek>(archive: &mut ZipArchive<R>) -> SheetResult<Vec<String>> {
    let mut strings = Vec::new();
    let Some(mut xml_reader) = open_xml(archive, "xl/sharedStrings.xml") else {
        return Ok(strings);
    };

    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    // Phonetic runs (<rPh>) repeat the text in another script
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(decode_excel_escapes(&current));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Text(e) if in_t => current.push_str(&e.unescape()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// Per cellXfs index: the date kind of its number format, if any
fn read_date_styles<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> SheetResult<Vec<Option<DateKind>>> {
    let mut styles = Vec::new();
    let Some(mut xml_reader) = open_xml(archive, "xl/styles.xml") else {
        return Ok(styles);
    };

    let mut buf = Vec::new();
    let mut custom: HashMap<u32, Option<DateKind>> = HashMap::new();
    let mut xf_ids: Vec<u32> = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let id = attr_value(&e, b"numFmtId")?.and_then(|s| s.parse::<u32>().ok());
                    let code = attr_value(&e, b"formatCode")?;
                    if let (Some(id), Some(code)) = (id, code) {
                        custom.insert(id, custom_kind(&code));
                    }
                }
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let id = attr_value(&e, b"numFmtId")?
                        .and_then(|s| s.parse::<u32>().ok())
                        .unwrap_or(0);
                    xf_ids.push(id);
                }
                _ => {}
            },
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    styles.extend(xf_ids.into_iter().map(|id| match custom.get(&id) {
        Some(kind) => *kind,
        None => builtin_kind(id),
    }));
    Ok(styles)
}

struct WorkbookInfo {
    /// (name, relationship id) in tab order
    sheets: Vec<(String, String)>,
    date1904: bool,
}

/// Read workbook.xml to get sheet names, rIds and the date system
fn read_workbook_xml<R: Read + Seek>(archive: &mut ZipArchive<R>) -> SheetResult<WorkbookInfo> {
    let mut xml_reader = open_xml(archive, WORKBOOK_PART)
        .ok_or_else(|| SheetError::MissingPart(WORKBOOK_PART.into()))?;

    let mut buf = Vec::new();
    let mut info = WorkbookInfo {
        sheets: Vec::new(),
        date1904: false,
    };

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"name" {
                            name = Some(attr.unescape_value()?.into_owned());
                        } else if attr.key.local_name().as_ref() == b"id"
                            && attr.key.prefix().is_some()
                        {
                            r_id = Some(attr.unescape_value()?.into_owned());
                        }
                    }
                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        info.sheets.push((name, r_id));
                    }
                }
                b"workbookPr" => {
                    info.date1904 = attr_value(&e, b"date1904")?
                        .map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true"));
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(info)
}

/// Read workbook.xml.rels to get worksheet part paths by relationship id
fn read_workbook_rels<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> SheetResult<HashMap<String, String>> {
    let mut xml_reader = open_xml(archive, WORKBOOK_RELS_PART)
        .ok_or_else(|| SheetError::MissingPart(WORKBOOK_RELS_PART.into()))?;

    let mut buf = Vec::new();
    let mut rels = HashMap::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id")?;
                let target = attr_value(&e, b"Target")?;
                let rel_type = attr_value(&e, b"Type")?;

                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        // Target is relative to the xl/ folder unless absolute
                        let full_path = match target.strip_prefix('/') {
                            Some(absolute) => absolute.to_string(),
                            None => format!("xl/{}", target),
                        };
                        rels.insert(id, full_path);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

struct CellContext<'a> {
    shared_strings: &'a [String],
    date_styles: &'a [Option<DateKind>],
    date1904: bool,
}

impl CellContext<'_> {
    fn display(&self, cell: &PendingCell) -> SheetResult<String> {
        let value = cell.value.as_str();
        let text = match cell.cell_type.as_deref() {
            Some("s") => {
                let idx: usize = value.trim().parse().map_err(|_| {
                    SheetError::Parse(format!("Invalid shared string index: {}", value))
                })?;
                self.shared_strings.get(idx).cloned().ok_or_else(|| {
                    SheetError::Parse(format!("Shared string index {} out of bounds", idx))
                })?
            }
            Some("inlineStr") | Some("str") => decode_excel_escapes(value),
            Some("b") => {
                if value == "1" || value.eq_ignore_ascii_case("true") {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            None | Some("n") => match value.trim().parse::<f64>() {
                Ok(n) => {
                    let kind = cell
                        .style
                        .and_then(|s| self.date_styles.get(s))
                        .copied()
                        .flatten();
                    kind.and_then(|kind| render_serial(n, kind, self.date1904))
                        .unwrap_or_else(|| render_number(n))
                }
                Err(_) => value.to_string(),
            },
            // Errors (#N/A), ISO dates and anything unknown are shown as stored
            Some(_) => value.to_string(),
        };
        Ok(text)
    }
}

#[derive(Default)]
struct PendingCell {
    row: u32,
    col: u32,
    cell_type: Option<String>,
    style: Option<usize>,
    value: String,
}

/// Read one worksheet into a grid of display text
fn read_worksheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    context: &CellContext<'_>,
) -> SheetResult<Vec<Vec<String>>> {
    let mut xml_reader =
        open_xml(archive, part).ok_or_else(|| SheetError::MissingPart(part.to_string()))?;

    let mut buf = Vec::new();
    let mut grid: Vec<Vec<String>> = Vec::new();

    let mut current_row: u32 = 0;
    let mut last_col: Option<u32> = None;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_inline_text = false;
    let mut in_phonetic = false;

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_number(&e)?.unwrap_or(current_row + 1);
                    last_col = None;
                }
                b"c" => {
                    let pending = start_cell(&e, current_row, last_col)?;
                    last_col = Some(pending.col);
                    cell = Some(pending);
                }
                b"v" if cell.is_some() => in_value = true,
                b"is" if cell.is_some() => in_inline = true,
                b"rPh" => in_phonetic = true,
                b"t" if in_inline && !in_phonetic => in_inline_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = row_number(&e)?.unwrap_or(current_row + 1);
                    last_col = None;
                }
                b"c" => {
                    let pending = start_cell(&e, current_row, last_col)?;
                    last_col = Some(pending.col);
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"c" => {
                    if let Some(done) = cell.take() {
                        let text = context.display(&done)?;
                        if !text.is_empty() {
                            put(&mut grid, done.row, done.col, text);
                        }
                    }
                    in_value = false;
                    in_inline = false;
                }
                b"v" => in_value = false,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                b"t" => in_inline_text = false,
                _ => {}
            },
            Event::Text(t) if in_value || in_inline_text => {
                if let Some(pending) = cell.as_mut() {
                    pending.value.push_str(&t.unescape()?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

fn row_number(e: &BytesStart<'_>) -> SheetResult<Option<u32>> {
    Ok(attr_value(e, b"r")?.and_then(|s| s.trim().parse::<u32>().ok()))
}

fn start_cell(e: &BytesStart<'_>, current_row: u32, last_col: Option<u32>) -> SheetResult<PendingCell> {
    let mut pending = PendingCell {
        row: current_row.max(1),
        col: last_col.map_or(0, |c| c + 1),
        ..Default::default()
    };
    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"r" => {
                let reference = attr.unescape_value()?;
                let (row, col) = parse_cell_ref(&reference).ok_or_else(|| {
                    SheetError::Parse(format!("Invalid cell reference '{}'", reference))
                })?;
                pending.row = row;
                pending.col = col;
            }
            b"t" => pending.cell_type = Some(attr.unescape_value()?.into_owned()),
            b"s" => pending.style = attr.unescape_value()?.trim().parse::<usize>().ok(),
            _ => {}
        }
    }
    Ok(pending)
}

fn put(grid: &mut Vec<Vec<String>>, row: u32, col: u32, text: String) {
    let r = row as usize - 1;
    let c = col as usize;
    if grid.len() <= r {
        grid.resize_with(r + 1, Vec::new);
    }
    let cells = &mut grid[r];
    if cells.len() <= c {
        cells.resize(c + 1, String::new());
    }
    cells[c] = text;
}
