use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::config::{SchemaVersion, FIELDS, FIELD_PREFIX, ISSUER_FIELD};
use crate::error::{Error, Result};
use crate::models::ExtractedRow;

/// Which of the two bound namespaces an element lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Head,
    Auth,
    Other,
}

enum Target {
    Instrument,
    Field(usize),
}

pub fn parse_file(path: &Path, schema: &SchemaVersion) -> Result<Vec<ExtractedRow>> {
    let file = File::open(path)?;
    let mut xml_reader = NsReader::from_reader(BufReader::new(file));
    parse_xml(&mut xml_reader, schema)
}

/// Flattens every `BizData/Pyld/Document/FinInstrmRptgRefDataDltaRpt/FinInstrm`
/// element into one row, in document order.
///
/// Row count always equals instrument count: an instrument carrying none of
/// the fields still yields an empty row. Any XML error aborts the whole read.
pub fn parse_xml<R: BufRead>(reader: &mut NsReader<R>, schema: &SchemaVersion) -> Result<Vec<ExtractedRow>> {
    let mut buf = Vec::new();
    let mut path: Vec<(Ns, String)> = Vec::new();
    let mut seen_root = false;

    let mut rows: Vec<ExtractedRow> = Vec::new();

    // field index -> text, filled while inside a FinInstrm
    let mut current: Option<BTreeMap<usize, Option<String>>> = None;
    // field receiving character data right now
    let mut capture: Option<usize> = None;

    loop {
        let (ns, event) = {
            let (resolved, event) = reader.read_resolved_event_into(&mut buf)?;
            (classify(&resolved, schema), event)
        };

        match event {
            Event::Start(e) => {
                if seen_root && path.is_empty() {
                    return Err(Error::junk_after_root());
                }
                capture = None;
                seen_root = true;
                path.push((ns, local_name(&e)));

                match target(&path) {
                    Some(Target::Instrument) => current = Some(BTreeMap::new()),
                    Some(Target::Field(idx)) => {
                        if let Some(fields) = current.as_mut() {
                            if !fields.contains_key(&idx) {
                                fields.insert(idx, None);
                                capture = Some(idx);
                            }
                        }
                    }
                    None => {}
                }
            }

            Event::Empty(e) => {
                if seen_root && path.is_empty() {
                    return Err(Error::junk_after_root());
                }
                capture = None;
                seen_root = true;
                path.push((ns, local_name(&e)));

                match target(&path) {
                    Some(Target::Instrument) => rows.push(ExtractedRow::new()),
                    Some(Target::Field(idx)) => {
                        if let Some(fields) = current.as_mut() {
                            fields.entry(idx).or_insert(None);
                        }
                    }
                    None => {}
                }

                path.pop();
            }

            Event::Text(e) => {
                if seen_root && path.is_empty() && !e.iter().all(u8::is_ascii_whitespace) {
                    return Err(Error::junk_after_root());
                }
                if let Some(idx) = capture {
                    let text = e.unescape()?;
                    append(&mut current, idx, &text);
                }
            }

            Event::CData(e) => {
                if seen_root && path.is_empty() {
                    return Err(Error::junk_after_root());
                }
                if let Some(idx) = capture {
                    append(&mut current, idx, &String::from_utf8_lossy(&e));
                }
            }

            Event::End(_) => {
                capture = None;
                if let Some(Target::Instrument) = target(&path) {
                    rows.push(finish_row(current.take().unwrap_or_default()));
                }
                path.pop();
            }

            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    if !seen_root {
        return Err(Error::Parse("no element found".to_string()));
    }
    if let Some((_, open)) = path.last() {
        return Err(Error::Parse(format!("unclosed element <{open}> at end of document")));
    }

    Ok(rows)
}

fn classify(resolved: &ResolveResult, schema: &SchemaVersion) -> Ns {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) if *uri == schema.head.as_bytes() => Ns::Head,
        ResolveResult::Bound(Namespace(uri)) if *uri == schema.auth.as_bytes() => Ns::Auth,
        _ => Ns::Other,
    }
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

// What the element at the top of `path` is, if it is one we collect
fn target(path: &[(Ns, String)]) -> Option<Target> {
    let path_ref: Vec<(Ns, &str)> = path.iter().map(|(ns, name)| (*ns, name.as_str())).collect();

    match path_ref.as_slice() {
        [_, (Ns::Head, "Pyld"), (Ns::Auth, "Document"), (Ns::Auth, "FinInstrmRptgRefDataDltaRpt"), (Ns::Auth, "FinInstrm")] => {
            Some(Target::Instrument)
        }

        [_, (Ns::Head, "Pyld"), (Ns::Auth, "Document"), (Ns::Auth, "FinInstrmRptgRefDataDltaRpt"), (Ns::Auth, "FinInstrm"), (Ns::Auth, "TermntdRcrd"), (Ns::Auth, field)]
            if *field == ISSUER_FIELD =>
        {
            field_index(field).map(Target::Field)
        }

        [_, (Ns::Head, "Pyld"), (Ns::Auth, "Document"), (Ns::Auth, "FinInstrmRptgRefDataDltaRpt"), (Ns::Auth, "FinInstrm"), (Ns::Auth, "TermntdRcrd"), (Ns::Auth, "FinInstrmGnlAttrbts"), (Ns::Auth, field)]
            if *field != ISSUER_FIELD =>
        {
            field_index(field).map(Target::Field)
        }

        _ => None,
    }
}

fn field_index(name: &str) -> Option<usize> {
    FIELDS.iter().position(|f| *f == name)
}

fn append(current: &mut Option<BTreeMap<usize, Option<String>>>, idx: usize, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(slot) = current.as_mut().and_then(|fields| fields.get_mut(&idx)) {
        slot.get_or_insert_with(String::new).push_str(text);
    }
}

// Keys follow the order of FIELDS, not the order the elements appeared in
fn finish_row(fields: BTreeMap<usize, Option<String>>) -> ExtractedRow {
    let mut row = ExtractedRow::new();
    for (idx, value) in fields {
        row.insert(format!("{}.{}", FIELD_PREFIX, FIELDS[idx]), value);
    }
    row
}
