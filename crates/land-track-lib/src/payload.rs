//! Multipart submission payloads
//!
//! A form submission is one JSON part holding the record followed by one file
//! part per attached document, encoded as `multipart/form-data`.

use crate::{DataError, DocumentStatus, LandRecord, Result, parse_track_bytes};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the part carrying the serialized record
pub const DATA_PART: &str = "data";

/// Prefix of generated boundaries
const BOUNDARY_PREFIX: &str = "----LandRegistryFormBoundary";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Document slots on the registration forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentField {
    /// Letter of intent (PDF)
    LoiDocument,
    /// Memorandum of understanding (PDF)
    MouDocument,
    /// GPS track of the land boundary (GPX)
    GisDetails,
}

impl AttachmentField {
    pub const ALL: [AttachmentField; 3] = [
        AttachmentField::LoiDocument,
        AttachmentField::MouDocument,
        AttachmentField::GisDetails,
    ];

    /// Form field name
    pub fn form_name(self) -> &'static str {
        match self {
            AttachmentField::LoiDocument => "loiDocument",
            AttachmentField::MouDocument => "mouDocument",
            AttachmentField::GisDetails => "gisDetails",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            AttachmentField::LoiDocument | AttachmentField::MouDocument => "application/pdf",
            AttachmentField::GisDetails => "application/gpx+xml",
        }
    }

    /// Look up a field by its form name (case-insensitive)
    pub fn from_form_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.form_name().eq_ignore_ascii_case(name.trim()))
    }

    fn status_slot(self, record: &mut LandRecord) -> &mut DocumentStatus {
        match self {
            AttachmentField::LoiDocument => &mut record.loi_document,
            AttachmentField::MouDocument => &mut record.mou_document,
            AttachmentField::GisDetails => &mut record.gis_details,
        }
    }
}

/// A file selected for one of the form's document slots
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub field: AttachmentField,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(field: AttachmentField, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            field,
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Attachment named after the file its bytes were read from
    ///
    /// Paths without a file name fall back to the slot's form name.
    pub fn from_file(field: AttachmentField, path: impl AsRef<Path>, bytes: Vec<u8>) -> Self {
        let file_name = path
            .as_ref()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| field.form_name().to_string());
        Self::new(field, file_name, bytes)
    }

    /// Check the file matches what the slot accepts
    ///
    /// PDF slots take a `.pdf` name or PDF magic bytes. The GIS slot takes a
    /// `.gpx` file with at least one track point.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| DataError::InvalidAttachment {
            field: self.field.form_name(),
            reason: reason.to_string(),
        };

        match self.field {
            AttachmentField::LoiDocument | AttachmentField::MouDocument => {
                if has_extension(&self.file_name, "pdf") || self.bytes.starts_with(PDF_MAGIC) {
                    Ok(())
                } else {
                    Err(invalid("expected a PDF document"))
                }
            }
            AttachmentField::GisDetails => {
                if !has_extension(&self.file_name, "gpx") {
                    return Err(invalid("expected a .gpx file"));
                }
                parse_track_bytes(&self.bytes)
                    .map(|track| {
                        tracing::debug!(
                            "GIS attachment {} has {} track points",
                            self.file_name,
                            track.len()
                        );
                    })
                    .map_err(|e| invalid(&e.to_string()))
            }
        }
    }
}

fn has_extension(file_name: &str, extension: &str) -> bool {
    Path::new(file_name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Validated JSON-plus-files submission for the records backend
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    endpoint: &'static str,
    record: LandRecord,
    parts: Vec<Part>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl SubmissionPayload {
    /// Validate a record and its attachments and lay out the parts
    ///
    /// Attached slots are marked uploaded on the submitted record. When the
    /// same slot is attached twice the later file wins.
    pub fn build(mut record: LandRecord, attachments: Vec<Attachment>) -> Result<Self> {
        record.validate()?;

        let mut by_field: BTreeMap<AttachmentField, Attachment> = BTreeMap::new();
        for attachment in attachments {
            attachment.validate()?;
            if let Some(previous) = by_field.insert(attachment.field, attachment) {
                tracing::debug!(
                    "Replacing attachment {} for {}",
                    previous.file_name,
                    previous.field.form_name()
                );
            }
        }

        for (field, attachment) in &by_field {
            *field.status_slot(&mut record) = DocumentStatus::Uploaded {
                file_name: attachment.file_name.clone(),
            };
        }

        let mut parts = Vec::with_capacity(by_field.len() + 1);
        parts.push(Part {
            name: DATA_PART.to_string(),
            file_name: None,
            content_type: "application/json",
            body: serde_json::to_vec(&record)?,
        });
        parts.extend(by_field.into_values().map(|attachment| Part {
            name: attachment.field.form_name().to_string(),
            file_name: Some(attachment.file_name),
            content_type: attachment.field.content_type(),
            body: attachment.bytes,
        }));

        let endpoint = if record.is_representative() {
            "/api/forms/representative-form"
        } else {
            "/api/forms/add-form-dialog"
        };

        Ok(Self {
            endpoint,
            record,
            parts,
        })
    }

    /// REST path the payload is posted to
    #[inline]
    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    /// The record as submitted, with document slots updated
    #[inline]
    pub fn record(&self) -> &LandRecord {
        &self.record
    }

    #[inline]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `Content-Type` header value for a body encoded with `boundary`
    pub fn content_type(boundary: &str) -> String {
        format!("multipart/form-data; boundary={}", boundary)
    }

    /// A boundary that does not occur in any part body
    pub fn boundary(&self) -> String {
        let mut suffix: u32 = 0;
        loop {
            let candidate = format!("{}{:08x}", BOUNDARY_PREFIX, suffix);
            let clashes = self
                .parts
                .iter()
                .any(|part| contains_bytes(&part.body, candidate.as_bytes()));
            if !clashes {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Encode the body as `multipart/form-data` with CRLF line endings
    pub fn encode(&self, boundary: &str) -> Vec<u8> {
        let capacity = self
            .parts
            .iter()
            .map(|part| part.body.len() + 128)
            .sum::<usize>()
            + boundary.len()
            + 8;
        let mut out = Vec::with_capacity(capacity);

        for part in &self.parts {
            out.extend_from_slice(b"--");
            out.extend_from_slice(boundary.as_bytes());
            out.extend_from_slice(b"\r\n");

            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quoted(&part.name)
            );
            if let Some(file_name) = &part.file_name {
                disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(file_name)));
            }
            out.extend_from_slice(disposition.as_bytes());
            out.extend_from_slice(b"\r\n");
            out.extend_from_slice(
                format!("Content-Type: {}\r\n\r\n", part.content_type).as_bytes(),
            );
            out.extend_from_slice(&part.body);
            out.extend_from_slice(b"\r\n");
        }

        out.extend_from_slice(b"--");
        out.extend_from_slice(boundary.as_bytes());
        out.extend_from_slice(b"--\r\n");
        out
    }
}

/// Percent-encode the characters that would break a quoted header parameter
fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Member, RecordSource};
    use chrono::NaiveDate;

    const GPX: &str = r#"<gpx><trk><trkseg><trkpt lat="-1.29" lon="36.82"/></trkseg></trk></gpx>"#;

    fn individual() -> LandRecord {
        LandRecord {
            community_member: "John Doe".into(),
            id_number: "123456789".into(),
            phone_number: "+1234567890".into(),
            land_size_acres: Some(50.0),
            community_name: "Community A".into(),
            sublocation: "Subloc A".into(),
            location: "Loc A".into(),
            field_coordinator: "Jane Smith".into(),
            date_signed: NaiveDate::from_ymd_opt(2023, 10, 1),
            signed_local: "Yes".into(),
            signed_org: "No".into(),
            witness_local: "Witness A".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_attachment_named_after_file() {
        let attachment =
            Attachment::from_file(AttachmentField::MouDocument, "docs/signed mou.pdf", Vec::new());
        assert_eq!(attachment.file_name, "signed mou.pdf");

        let unnamed = Attachment::from_file(AttachmentField::MouDocument, "..", Vec::new());
        assert_eq!(unnamed.file_name, "mouDocument");
    }

    #[test]
    fn test_build_marks_uploaded_slots() {
        let payload = SubmissionPayload::build(
            individual(),
            vec![
                Attachment::new(AttachmentField::GisDetails, "boundary.gpx", GPX.into()),
                Attachment::new(AttachmentField::LoiDocument, "loi.pdf", b"%PDF-1.4".to_vec()),
            ],
        )
        .unwrap();

        assert_eq!(payload.endpoint(), "/api/forms/add-form-dialog");
        let names: Vec<&str> = payload.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["data", "loiDocument", "gisDetails"]);

        let record = payload.record();
        assert!(record.loi_document.is_uploaded());
        assert!(record.gis_details.is_uploaded());
        assert!(!record.mou_document.is_uploaded());

        let json: serde_json::Value = serde_json::from_slice(&payload.parts()[0].body).unwrap();
        assert_eq!(json["loiDocument"]["fileName"], "loi.pdf");
        assert_eq!(json["source"], "Other");
    }

    #[test]
    fn test_later_attachment_replaces_earlier() {
        let payload = SubmissionPayload::build(
            individual(),
            vec![
                Attachment::new(AttachmentField::MouDocument, "old.pdf", Vec::new()),
                Attachment::new(AttachmentField::MouDocument, "new.pdf", Vec::new()),
            ],
        )
        .unwrap();
        assert_eq!(payload.parts().len(), 2);
        assert_eq!(payload.parts()[1].file_name.as_deref(), Some("new.pdf"));
    }

    #[test]
    fn test_rejects_wrong_attachment_kinds() {
        let not_pdf = Attachment::new(AttachmentField::LoiDocument, "loi.docx", b"PK".to_vec());
        assert!(matches!(
            SubmissionPayload::build(individual(), vec![not_pdf]),
            Err(DataError::InvalidAttachment {
                field: "loiDocument",
                ..
            })
        ));

        let empty_track =
            Attachment::new(AttachmentField::GisDetails, "empty.gpx", b"<gpx></gpx>".to_vec());
        assert!(matches!(
            SubmissionPayload::build(individual(), vec![empty_track]),
            Err(DataError::InvalidAttachment {
                field: "gisDetails",
                ..
            })
        ));

        let wrong_name = Attachment::new(AttachmentField::GisDetails, "track.kml", GPX.into());
        assert!(wrong_name.validate().is_err());

        // PDF magic is enough without the extension
        let magic = Attachment::new(AttachmentField::MouDocument, "scan", b"%PDF-1.7".to_vec());
        assert!(magic.validate().is_ok());
    }

    #[test]
    fn test_invalid_record_is_not_built() {
        let result = SubmissionPayload::build(LandRecord::default(), Vec::new());
        assert!(matches!(result, Err(DataError::Validation { .. })));
    }

    #[test]
    fn test_representative_endpoint() {
        let record = LandRecord {
            source: RecordSource::RepresentativeForm {
                group_name: "Group".into(),
                members: vec![Member {
                    member_name: "Alice".into(),
                    member_phone_number: "+1".into(),
                    ..Default::default()
                }],
            },
            ..Default::default()
        };
        let payload = SubmissionPayload::build(record, Vec::new()).unwrap();
        assert_eq!(payload.endpoint(), "/api/forms/representative-form");
    }

    #[test]
    fn test_encode_layout() {
        let payload = SubmissionPayload::build(
            individual(),
            vec![Attachment::new(
                AttachmentField::LoiDocument,
                "letter \"final\".pdf",
                b"%PDF-1.4".to_vec(),
            )],
        )
        .unwrap();
        let body = String::from_utf8(payload.encode("XyZ")).unwrap();

        assert!(body.starts_with(
            "--XyZ\r\nContent-Disposition: form-data; name=\"data\"\r\nContent-Type: application/json\r\n\r\n{"
        ));
        assert!(body.contains(
            "--XyZ\r\nContent-Disposition: form-data; name=\"loiDocument\"; filename=\"letter %22final%22.pdf\"\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n"
        ));
        assert!(body.ends_with("\r\n--XyZ--\r\n"));
        assert_eq!(body.matches("--XyZ\r\n").count(), 2);
        assert_eq!(
            SubmissionPayload::content_type("XyZ"),
            "multipart/form-data; boundary=XyZ"
        );
    }

    #[test]
    fn test_boundary_avoids_body_content() {
        let clash = format!("{}{:08x}", BOUNDARY_PREFIX, 0);
        let payload = SubmissionPayload::build(
            individual(),
            vec![Attachment::new(
                AttachmentField::LoiDocument,
                "loi.pdf",
                clash.clone().into_bytes(),
            )],
        )
        .unwrap();
        let boundary = payload.boundary();
        assert_ne!(boundary, clash);
        assert!(boundary.starts_with(BOUNDARY_PREFIX));
    }
}
