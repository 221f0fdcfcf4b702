//! In-place cell updates of a worksheet part
//!
//! The worksheet XML is streamed through unchanged except for the edited
//! cells, which are replaced (or inserted in column order) as inline strings.
//! Cell styles, formulas elsewhere, merged ranges, validations and every
//! other element are written back byte for byte.

use std::collections::BTreeMap;
use std::mem;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

use super::cell_ref::{cell_ref, parse_cell_ref};
use super::reader::attr_value;
use crate::error::{SheetError, SheetResult};

/// Staged values: 1-based sheet row -> 0-based column -> text
pub(crate) type CellEdits = BTreeMap<u32, BTreeMap<u32, String>>;

/// Apply `edits` to a worksheet part and return the new XML
pub(crate) fn patch_sheet(xml: &[u8], edits: &CellEdits) -> SheetResult<Vec<u8>> {
    let mut patcher = Patcher::new(xml.len(), edits.clone());
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            event => patcher.handle(event)?,
        }
        buf.clear();
    }
    patcher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    SheetData,
    Row,
    Cell,
    Dimension,
    Other,
}

impl Tag {
    fn of(local_name: &[u8]) -> Self {
        match local_name {
            b"sheetData" => Tag::SheetData,
            b"row" => Tag::Row,
            b"c" => Tag::Cell,
            b"dimension" => Tag::Dimension,
            _ => Tag::Other,
        }
    }
}

struct OpenRow {
    number: u32,
    last_col: Option<u32>,
    cells: BTreeMap<u32, String>,
}

struct Patcher {
    writer: Writer<Vec<u8>>,
    pending: CellEdits,
    /// Bottom-right corner touched by the edits
    extent: Option<(u32, u32)>,
    /// Namespace prefix of the sheet elements, with its colon
    prefix: String,
    in_sheet_data: bool,
    last_row: u32,
    row: Option<OpenRow>,
    /// Nesting depth inside a replaced cell whose old content is dropped
    skip_depth: usize,
}

impl Patcher {
    fn new(capacity: usize, pending: CellEdits) -> Self {
        let max_row = pending.keys().next_back().copied();
        let max_col = pending
            .values()
            .filter_map(|cells| cells.keys().next_back().copied())
            .max();
        Self {
            writer: Writer::new(Vec::with_capacity(capacity + 256)),
            extent: max_row.zip(max_col),
            pending,
            prefix: String::new(),
            in_sheet_data: false,
            last_row: 0,
            row: None,
            skip_depth: 0,
        }
    }

    fn handle(&mut self, event: Event<'_>) -> SheetResult<()> {
        if self.skip_depth > 0 {
            match event {
                Event::Start(_) => self.skip_depth += 1,
                Event::End(_) => self.skip_depth -= 1,
                _ => {}
            }
            return Ok(());
        }
        match event {
            Event::Start(e) => self.on_start(e),
            Event::Empty(e) => self.on_empty(e),
            Event::End(e) => self.on_end(e),
            other => self.write(other),
        }
    }

    fn finish(self) -> SheetResult<Vec<u8>> {
        if self.skip_depth > 0 || self.row.is_some() {
            return Err(SheetError::Parse("Worksheet XML ends inside a row".into()));
        }
        if !self.pending.is_empty() {
            return Err(SheetError::Parse("Worksheet has no sheetData element".into()));
        }
        Ok(self.writer.into_inner())
    }

    fn on_start(&mut self, e: BytesStart<'_>) -> SheetResult<()> {
        let tag = Tag::of(e.local_name().as_ref());
        match tag {
            Tag::SheetData => {
                self.prefix = prefix_of(e.name().as_ref());
                self.in_sheet_data = true;
                self.write(Event::Start(e))
            }
            Tag::Row if self.in_sheet_data && self.row.is_none() => {
                let number = self.row_number(&e)?;
                self.flush_rows_before(number)?;
                let cells = self.pending.remove(&number).unwrap_or_default();
                let start = if cells.is_empty() {
                    e
                } else {
                    without_spans(&e)?
                };
                self.row = Some(OpenRow {
                    number,
                    last_col: None,
                    cells,
                });
                self.write(Event::Start(start))
            }
            Tag::Cell if self.row.is_some() => self.on_cell(e, false),
            _ => self.write(Event::Start(e)),
        }
    }

    fn on_empty(&mut self, e: BytesStart<'_>) -> SheetResult<()> {
        let tag = Tag::of(e.local_name().as_ref());
        match tag {
            Tag::SheetData if !self.pending.is_empty() => {
                self.prefix = prefix_of(e.name().as_ref());
                let rows = mem::take(&mut self.pending);
                self.writer.write_event(Event::Start(e.borrow()))?;
                self.write_rows(rows)?;
                self.writer.write_event(Event::End(e.to_end()))?;
                Ok(())
            }
            Tag::Row if self.in_sheet_data && self.row.is_none() => {
                let number = self.row_number(&e)?;
                self.flush_rows_before(number)?;
                match self.pending.remove(&number) {
                    Some(cells) => {
                        self.writer.write_event(Event::Start(without_spans(&e)?))?;
                        self.write_cells(number, cells)?;
                        self.writer.write_event(Event::End(e.to_end()))?;
                        Ok(())
                    }
                    None => self.write(Event::Empty(e)),
                }
            }
            Tag::Cell if self.row.is_some() => self.on_cell(e, true),
            Tag::Dimension => match self.widened_dimension(&e)? {
                Some(widened) => self.write(Event::Empty(widened)),
                None => self.write(Event::Empty(e)),
            },
            _ => self.write(Event::Empty(e)),
        }
    }

    fn on_end(&mut self, e: BytesEnd<'_>) -> SheetResult<()> {
        let tag = Tag::of(e.local_name().as_ref());
        match tag {
            Tag::Row if self.row.is_some() => {
                if let Some(open) = self.row.take() {
                    self.write_cells(open.number, open.cells)?;
                }
                self.write(Event::End(e))
            }
            Tag::SheetData if self.in_sheet_data => {
                self.in_sheet_data = false;
                let rest = mem::take(&mut self.pending);
                self.write_rows(rest)?;
                self.write(Event::End(e))
            }
            _ => self.write(Event::End(e)),
        }
    }

    fn on_cell(&mut self, e: BytesStart<'_>, empty: bool) -> SheetResult<()> {
        let reference = attr_value(&e, b"r")?;
        let Some(row) = self.row.as_mut() else {
            return self.write(if empty { Event::Empty(e) } else { Event::Start(e) });
        };

        let col = match reference.as_deref().and_then(parse_cell_ref) {
            Some((_, col)) => col,
            None => row.last_col.map_or(0, |c| c + 1),
        };
        row.last_col = Some(col);

        let later = row.cells.split_off(&col);
        let before = mem::replace(&mut row.cells, later);
        let replacement = row.cells.remove(&col);
        let number = row.number;

        self.write_cells(number, before)?;
        match replacement {
            Some(value) => {
                let style = attr_value(&e, b"s")?;
                self.write_cell(number, col, style.as_deref(), &value)?;
                if !empty {
                    self.skip_depth = 1;
                }
                Ok(())
            }
            None => self.write(if empty { Event::Empty(e) } else { Event::Start(e) }),
        }
    }

    fn row_number(&mut self, e: &BytesStart<'_>) -> SheetResult<u32> {
        let number = attr_value(e, b"r")?
            .and_then(|r| r.trim().parse::<u32>().ok())
            .unwrap_or(self.last_row + 1);
        self.last_row = number;
        Ok(number)
    }

    fn widened_dimension(&self, e: &BytesStart<'_>) -> SheetResult<Option<BytesStart<'static>>> {
        let Some((max_row, max_col)) = self.extent else {
            return Ok(None);
        };
        let Some(reference) = attr_value(e, b"ref")? else {
            return Ok(None);
        };
        let (first, last) = reference
            .split_once(':')
            .unwrap_or((reference.as_str(), reference.as_str()));
        let Some((row, col)) = parse_cell_ref(last) else {
            return Ok(None);
        };
        if row >= max_row && col >= max_col {
            return Ok(None);
        }

        let widened = format!("{}:{}", first, cell_ref(row.max(max_row), col.max(max_col)));
        let mut start = BytesStart::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"ref" {
                start.push_attribute(("ref", widened.as_str()));
            } else {
                start.push_attribute(attr);
            }
        }
        Ok(Some(start))
    }

    fn flush_rows_before(&mut self, number: u32) -> SheetResult<()> {
        let later = self.pending.split_off(&number);
        let earlier = mem::replace(&mut self.pending, later);
        self.write_rows(earlier)
    }

    fn write_rows(&mut self, rows: CellEdits) -> SheetResult<()> {
        for (number, cells) in rows {
            if cells.is_empty() {
                continue;
            }
            let mut start = BytesStart::new(self.qualified("row"));
            start.push_attribute(("r", number.to_string().as_str()));
            self.write(Event::Start(start))?;
            self.write_cells(number, cells)?;
            self.write(Event::End(BytesEnd::new(self.qualified("row"))))?;
        }
        Ok(())
    }

    fn write_cells(&mut self, row: u32, cells: BTreeMap<u32, String>) -> SheetResult<()> {
        for (col, value) in cells {
            self.write_cell(row, col, None, &value)?;
        }
        Ok(())
    }

    fn write_cell(&mut self, row: u32, col: u32, style: Option<&str>, value: &str) -> SheetResult<()> {
        let mut start = BytesStart::new(self.qualified("c"));
        start.push_attribute(("r", cell_ref(row, col).as_str()));
        if let Some(style) = style {
            start.push_attribute(("s", style));
        }
        start.push_attribute(("t", "inlineStr"));

        let mut text = BytesStart::new(self.qualified("t"));
        if value.trim() != value {
            text.push_attribute(("xml:space", "preserve"));
        }

        self.write(Event::Start(start))?;
        self.write(Event::Start(BytesStart::new(self.qualified("is"))))?;
        self.write(Event::Start(text))?;
        self.write(Event::Text(BytesText::new(value)))?;
        self.write(Event::End(BytesEnd::new(self.qualified("t"))))?;
        self.write(Event::End(BytesEnd::new(self.qualified("is"))))?;
        self.write(Event::End(BytesEnd::new(self.qualified("c"))))
    }

    fn qualified(&self, local: &str) -> String {
        format!("{}{}", self.prefix, local)
    }

    fn write(&mut self, event: Event<'_>) -> SheetResult<()> {
        self.writer.write_event(event)?;
        Ok(())
    }
}

fn prefix_of(name: &[u8]) -> String {
    match name.iter().position(|&b| b == b':') {
        Some(colon) => String::from_utf8_lossy(&name[..=colon]).into_owned(),
        None => String::new(),
    }
}

/// Copy of a row start without its `spans` hint, which edits may invalidate
fn without_spans(e: &BytesStart<'_>) -> SheetResult<BytesStart<'static>> {
    let mut start = BytesStart::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() != b"spans" {
            start.push_attribute(attr);
        }
    }
    Ok(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edits(cells: &[(u32, u32, &str)]) -> CellEdits {
        let mut edits = CellEdits::new();
        for &(row, col, value) in cells {
            edits.entry(row).or_default().insert(col, value.to_string());
        }
        edits
    }

    fn patch(xml: &str, cells: &[(u32, u32, &str)]) -> String {
        String::from_utf8(patch_sheet(xml.as_bytes(), &edits(cells)).unwrap()).unwrap()
    }

    #[test]
    fn test_replace_existing_cell_keeps_style() {
        let xml = r#"<worksheet><sheetData><row r="2"><c r="A2" t="s"><v>0</v></c><c r="B2" s="3"><v>1</v></c></row></sheetData></worksheet>"#;
        assert_eq!(
            patch(xml, &[(2, 1, "Sent")]),
            r#"<worksheet><sheetData><row r="2"><c r="A2" t="s"><v>0</v></c><c r="B2" s="3" t="inlineStr"><is><t>Sent</t></is></c></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_insert_cell_between_and_after() {
        let xml = r#"<worksheet><sheetData><row r="1" spans="1:3"><c r="A1"><v>1</v></c><c r="C1"><v>3</v></c></row></sheetData></worksheet>"#;
        assert_eq!(
            patch(xml, &[(1, 1, "b"), (1, 4, "e")]),
            r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c><c r="B1" t="inlineStr"><is><t>b</t></is></c><c r="C1"><v>3</v></c><c r="E1" t="inlineStr"><is><t>e</t></is></c></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_insert_missing_rows_in_order() {
        let xml = r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="4"><c r="A4"><v>4</v></c></row></sheetData></worksheet>"#;
        assert_eq!(
            patch(xml, &[(2, 0, "two"), (6, 0, "six")]),
            r#"<worksheet><sheetData><row r="1"><c r="A1"><v>1</v></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>two</t></is></c></row><row r="4"><c r="A4"><v>4</v></c></row><row r="6"><c r="A6" t="inlineStr"><is><t>six</t></is></c></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_empty_sheet_data_and_empty_row() {
        assert_eq!(
            patch("<worksheet><sheetData/></worksheet>", &[(1, 0, "x")]),
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>x</t></is></c></row></sheetData></worksheet>"#
        );
        assert_eq!(
            patch(r#"<worksheet><sheetData><row r="1"/></sheetData></worksheet>"#, &[(1, 0, "x")]),
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>x</t></is></c></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_cells_without_references() {
        let xml = r#"<worksheet><sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData></worksheet>"#;
        assert_eq!(
            patch(xml, &[(2, 1, "Sent")]),
            r#"<worksheet><sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c><c r="B2" t="inlineStr"><is><t>Sent</t></is></c></row></sheetData></worksheet>"#
        );
    }

    #[test]
    fn test_dimension_is_widened() {
        let xml = r#"<worksheet><dimension ref="A1:B2"/><sheetData><row r="2"><c r="A2"><v>1</v></c></row></sheetData></worksheet>"#;
        let out = patch(xml, &[(2, 4, "Sent")]);
        assert!(out.starts_with(r#"<worksheet><dimension ref="A1:E2"/>"#));
    }

    #[test]
    fn test_prefixed_elements_and_escaping() {
        let xml = r#"<x:worksheet xmlns:x="urn:s"><x:sheetData><x:row r="1"><x:c r="A1"><x:v>1</x:v></x:c></x:row></x:sheetData></x:worksheet>"#;
        assert_eq!(
            patch(xml, &[(1, 0, "a<b & c")]),
            r#"<x:worksheet xmlns:x="urn:s"><x:sheetData><x:row r="1"><x:c r="A1" t="inlineStr"><x:is><x:t>a&lt;b &amp; c</x:t></x:is></x:c></x:row></x:sheetData></x:worksheet>"#
        );
    }

    #[test]
    fn test_untouched_content_is_preserved() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<worksheet>\n  <sheetData>\n    <row r=\"1\"><c r=\"A1\" t=\"inlineStr\"><is><t xml:space=\"preserve\"> a &amp; b </t></is></c></row>\n  </sheetData>\n  <mergeCells count=\"1\"><mergeCell ref=\"A1:B1\"/></mergeCells>\n</worksheet>";
        assert_eq!(patch(xml, &[]), xml);
    }

    #[test]
    fn test_missing_sheet_data_is_an_error() {
        let result = patch_sheet(b"<worksheet/>", &edits(&[(1, 0, "x")]));
        assert!(result.is_err());
    }
}
