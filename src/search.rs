use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::logger::{logged, PipelineLogger};

const FILE_TYPE_ATTR: &str = "file_type";
const DOWNLOAD_LINK_ATTR: &str = "download_link";

/// Fields read from one `<doc>` under `<result>`. The outer `Option` records
/// whether the element was seen, the inner one whether it had text.
#[derive(Debug, Default)]
struct Entry {
    file_type: Option<Option<String>>,
    download_link: Option<Option<String>>,
}

impl Entry {
    fn is_type(&self, file_type: &str) -> bool {
        self.file_type.as_ref().and_then(|v| v.as_deref()) == Some(file_type)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    FileType,
    DownloadLink,
}

/// Reads the search result and returns the `download_link` of the first entry
/// whose `file_type` equals `file_type`, logging the outcome.
pub fn extract_download_link(logger: &dyn PipelineLogger, xml: &str, file_type: &str) -> Result<String> {
    let link = logged(logger, find_download_link(xml, file_type))?;
    logger.info(&format!("{file_type} Download Link Extraction Successful"));
    Ok(link)
}

/// First match in document order wins. The whole document is still read so
/// that malformed XML after the match is reported.
pub fn find_download_link(xml: &str, file_type: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<String> = Vec::new();
    let mut seen_root = false;
    // only the first <result> under the root is searched
    let mut result_depth: Option<usize> = None;
    let mut result_done = false;

    let mut entry = Entry::default();
    let mut capture: Option<(Capture, String)> = None;
    let mut matched: Option<Entry> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if seen_root && path.is_empty() {
                    return Err(Error::junk_after_root());
                }
                capture = None;
                path.push(qualified_name(&e));
                seen_root = true;

                let depth = path.len();
                if depth == 2 && path[1] == "result" && !result_done && result_depth.is_none() {
                    result_depth = Some(depth);
                } else if result_depth.map(|d| depth == d + 1).unwrap_or(false) {
                    entry = Entry::default();
                } else if result_depth.map(|d| depth == d + 2).unwrap_or(false) && path[depth - 1] == "str" {
                    capture = field_for(&e).map(|field| (field, String::new()));
                }
            }

            Event::Empty(e) => {
                if seen_root && path.is_empty() {
                    return Err(Error::junk_after_root());
                }
                capture = None;
                seen_root = true;
                let depth = path.len() + 1;
                if depth == 2 && qualified_name(&e) == "result" && !result_done && result_depth.is_none() {
                    // <result/> has no entries
                    result_done = true;
                } else if result_depth.map(|d| depth == d + 2).unwrap_or(false) && qualified_name(&e) == "str" {
                    // <str name="file_type"/> is present but has no text
                    if let Some(field) = field_for(&e) {
                        store(&mut entry, field, None);
                    }
                }
            }

            Event::Text(e) => {
                if seen_root && path.is_empty() && !e.iter().all(u8::is_ascii_whitespace) {
                    return Err(Error::junk_after_root());
                }
                if let Some((_, text)) = capture.as_mut() {
                    text.push_str(&e.unescape()?);
                }
            }

            Event::CData(e) => {
                if seen_root && path.is_empty() {
                    return Err(Error::junk_after_root());
                }
                if let Some((_, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
            }

            Event::End(_) => {
                if let Some((field, text)) = capture.take() {
                    let value = if text.is_empty() { None } else { Some(text) };
                    store(&mut entry, field, value);
                }

                let depth = path.len();
                if let Some(d) = result_depth {
                    if depth == d + 1 && matched.is_none() && entry.is_type(file_type) {
                        matched = Some(std::mem::take(&mut entry));
                    } else if depth == d {
                        result_depth = None;
                        result_done = true;
                    }
                }
                path.pop();
            }

            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(Error::Parse("no element found".to_string()));
    }
    if let Some(open) = path.last() {
        return Err(Error::Parse(format!("unclosed element <{open}> at end of document")));
    }
    if !result_done {
        return Err(Error::Parse("search response has no <result> element".to_string()));
    }

    matched
        .and_then(|entry| entry.download_link.flatten())
        .ok_or_else(|| Error::LinkNotFound {
            file_type: file_type.to_string(),
        })
}

fn qualified_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

// Which entry field a <str name="..."> element carries, if any
fn field_for(e: &BytesStart) -> Option<Capture> {
    for a in e.attributes().flatten() {
        if a.key.as_ref() == b"name" {
            return match a.unescape_value().ok()?.as_ref() {
                FILE_TYPE_ATTR => Some(Capture::FileType),
                DOWNLOAD_LINK_ATTR => Some(Capture::DownloadLink),
                _ => None,
            };
        }
    }
    None
}

// The first element of each name counts, as with a find() on the entry
fn store(entry: &mut Entry, field: Capture, value: Option<String>) {
    let slot = match field {
        Capture::FileType => &mut entry.file_type,
        Capture::DownloadLink => &mut entry.download_link,
    };
    if slot.is_none() {
        *slot = Some(value);
    }
}
