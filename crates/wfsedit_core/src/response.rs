//! Classification of WFS-T transaction responses.

use crate::constants::UNKNOWN_FEATURE_ID;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// What a transaction response says happened.
///
/// `Unrecognized` is a soft outcome: the write may still have been applied, so
/// callers refetch regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    InsertOk { feature_id: String },
    UpdateOk,
    DeleteOk,
    Unrecognized { raw_text: String },
}

impl TransactionOutcome {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized { .. })
    }
}

#[derive(Debug, Default)]
struct Findings {
    insert_result: bool,
    update_result: bool,
    delete_result: bool,
    feature_id: Option<String>,
}

impl Findings {
    fn observe(&mut self, element: &BytesStart<'_>) {
        match element.local_name().as_ref() {
            b"InsertResult" => self.insert_result = true,
            b"UpdateResult" => self.update_result = true,
            b"DeleteResult" => self.delete_result = true,
            b"FeatureId" if self.feature_id.is_none() => {
                self.feature_id = element
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.local_name().as_ref() == b"fid")
                    .and_then(|attr| attr.unescape_value().ok())
                    .map(|value| value.into_owned())
                    .filter(|value| !value.is_empty());
            }
            _ => {}
        }
    }
}

/// Classify a raw transaction response body.
///
/// Checks for an insert result first (taking the first `FeatureId` as the
/// assigned id, or `"unknown"`), then an update result, then a delete result.
/// Elements are matched by local name so any namespace prefix is accepted.
/// Malformed XML never fails; it yields [`TransactionOutcome::Unrecognized`].
pub fn interpret(raw_text: &str) -> TransactionOutcome {
    let unrecognized = || TransactionOutcome::Unrecognized {
        raw_text: raw_text.to_string(),
    };
    let mut reader = Reader::from_str(raw_text);
    let mut findings = Findings::default();
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(_) => return unrecognized(),
        };
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if depth == 0 {
                    roots += 1;
                    // A well-formed document has exactly one root element.
                    if roots > 1 {
                        return unrecognized();
                    }
                }
                if matches!(event, Event::Start(_)) {
                    depth += 1;
                }
                findings.observe(e);
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
    }

    // Truncated bodies reach Eof with elements still open.
    if roots == 0 || depth != 0 {
        unrecognized()
    } else if findings.insert_result {
        TransactionOutcome::InsertOk {
            feature_id: findings
                .feature_id
                .unwrap_or_else(|| UNKNOWN_FEATURE_ID.to_string()),
        }
    } else if findings.update_result {
        TransactionOutcome::UpdateOk
    } else if findings.delete_result {
        TransactionOutcome::DeleteOk
    } else {
        unrecognized()
    }
}
