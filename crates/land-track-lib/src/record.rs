//! Land registration records
//!
//! A record is either filed by an individual land owner or by a representative
//! on behalf of a community group. Both share the land, location and signing
//! details; only groups carry a name and a member list.

use crate::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier assigned by the record table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member of a representative's community group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    pub member_name: String,
    pub member_phone_number: String,
    pub member_id_number: String,
    pub title_number: String,
}

/// Which form produced the record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum RecordSource {
    /// Individual land owner
    #[default]
    Other,
    /// Community group filed by a representative
    #[serde(rename_all = "camelCase")]
    RepresentativeForm {
        #[serde(default)]
        group_name: String,
        #[serde(default)]
        members: Vec<Member>,
    },
}

/// Upload state of a document slot on a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DocumentStatus {
    #[default]
    NotUploaded,
    #[serde(rename_all = "camelCase")]
    Uploaded { file_name: String },
}

impl DocumentStatus {
    #[inline]
    pub fn is_uploaded(&self) -> bool {
        matches!(self, DocumentStatus::Uploaded { .. })
    }

    /// Table label for a document slot
    pub fn label(&self) -> &'static str {
        if self.is_uploaded() {
            "Uploaded"
        } else {
            "Not Uploaded"
        }
    }

    /// Table label for the GIS slot
    pub fn gis_label(&self) -> &'static str {
        if self.is_uploaded() {
            "Available"
        } else {
            "Not Available"
        }
    }
}

/// Table columns, in the order the filter panel lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    CommunityMember,
    IdNumber,
    PhoneNumber,
    LandSize,
    CommunityName,
    Sublocation,
    Location,
    FieldCoordinator,
    DateSigned,
    SignedLocal,
    SignedOrg,
    WitnessLocal,
    LoiDocument,
    MouDocument,
    GisDetails,
    GroupName,
}

impl Column {
    pub const ALL: [Column; 16] = [
        Column::CommunityMember,
        Column::IdNumber,
        Column::PhoneNumber,
        Column::LandSize,
        Column::CommunityName,
        Column::Sublocation,
        Column::Location,
        Column::FieldCoordinator,
        Column::DateSigned,
        Column::SignedLocal,
        Column::SignedOrg,
        Column::WitnessLocal,
        Column::LoiDocument,
        Column::MouDocument,
        Column::GisDetails,
        Column::GroupName,
    ];

    /// Field name used in forms, filters and JSON
    pub fn id(self) -> &'static str {
        match self {
            Column::CommunityMember => "communityMember",
            Column::IdNumber => "idNumber",
            Column::PhoneNumber => "phoneNumber",
            Column::LandSize => "landSize",
            Column::CommunityName => "communityName",
            Column::Sublocation => "sublocation",
            Column::Location => "location",
            Column::FieldCoordinator => "fieldCoordinator",
            Column::DateSigned => "dateSigned",
            Column::SignedLocal => "signedLocal",
            Column::SignedOrg => "signedOrg",
            Column::WitnessLocal => "witnessLocal",
            Column::LoiDocument => "loiDocument",
            Column::MouDocument => "mouDocument",
            Column::GisDetails => "gisDetails",
            Column::GroupName => "groupName",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::CommunityMember => "Community Member",
            Column::IdNumber => "ID Number",
            Column::PhoneNumber => "Phone Number",
            Column::LandSize => "Land Size",
            Column::CommunityName => "Community Name",
            Column::Sublocation => "Sublocation",
            Column::Location => "Location",
            Column::FieldCoordinator => "Field Coordinator",
            Column::DateSigned => "Date Signed",
            Column::SignedLocal => "Signed Local",
            Column::SignedOrg => "Signed Org",
            Column::WitnessLocal => "Witness Local",
            Column::LoiDocument => "LOI Document",
            Column::MouDocument => "MOU Document",
            Column::GisDetails => "GIS Details",
            Column::GroupName => "Group Name",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Column {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        Column::ALL
            .into_iter()
            .find(|column| column.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DataError::UnknownColumn(s.to_string()))
    }
}

/// Fields an individual record cannot be submitted without, in form order
const INDIVIDUAL_REQUIRED: [Column; 11] = [
    Column::CommunityMember,
    Column::IdNumber,
    Column::PhoneNumber,
    Column::CommunityName,
    Column::LandSize,
    Column::Sublocation,
    Column::Location,
    Column::FieldCoordinator,
    Column::WitnessLocal,
    Column::SignedLocal,
    Column::SignedOrg,
];

/// A single land registration row
///
/// For group records `community_member`, `id_number` and `phone_number` hold
/// the representative's details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub community_member: String,
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, rename = "landSize")]
    pub land_size_acres: Option<f64>,
    #[serde(default)]
    pub community_name: String,
    #[serde(default)]
    pub sublocation: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub field_coordinator: String,
    #[serde(default)]
    pub date_signed: Option<NaiveDate>,
    #[serde(default)]
    pub signed_local: String,
    #[serde(default)]
    pub signed_org: String,
    #[serde(default)]
    pub witness_local: String,
    #[serde(default)]
    pub loi_document: DocumentStatus,
    #[serde(default)]
    pub mou_document: DocumentStatus,
    #[serde(default)]
    pub gis_details: DocumentStatus,
    #[serde(flatten)]
    pub source: RecordSource,
}

impl LandRecord {
    #[inline]
    pub fn is_representative(&self) -> bool {
        matches!(self.source, RecordSource::RepresentativeForm { .. })
    }

    pub fn group_name(&self) -> Option<&str> {
        match &self.source {
            RecordSource::RepresentativeForm { group_name, .. } => Some(group_name),
            RecordSource::Other => None,
        }
    }

    pub fn members(&self) -> &[Member] {
        match &self.source {
            RecordSource::RepresentativeForm { members, .. } => members,
            RecordSource::Other => &[],
        }
    }

    /// Form name for the record kind
    pub fn kind_label(&self) -> &'static str {
        if self.is_representative() {
            "Representative"
        } else {
            "Individual"
        }
    }

    /// Display value of a column, as shown in the table and matched by filters
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::CommunityMember => self.community_member.clone(),
            Column::IdNumber => self.id_number.clone(),
            Column::PhoneNumber => self.phone_number.clone(),
            Column::LandSize => match self.land_size_acres {
                Some(acres) => format!("{} acres", acres),
                None => "N/A".to_string(),
            },
            Column::CommunityName => self.community_name.clone(),
            Column::Sublocation => self.sublocation.clone(),
            Column::Location => self.location.clone(),
            Column::FieldCoordinator => self.field_coordinator.clone(),
            Column::DateSigned => self
                .date_signed
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            Column::SignedLocal => self.signed_local.clone(),
            Column::SignedOrg => self.signed_org.clone(),
            Column::WitnessLocal => self.witness_local.clone(),
            Column::LoiDocument => self.loi_document.label().to_string(),
            Column::MouDocument => self.mou_document.label().to_string(),
            Column::GisDetails => self.gis_details.gis_label().to_string(),
            Column::GroupName => self.group_name().unwrap_or("N/A").to_string(),
        }
    }

    /// Check the record is complete enough to submit
    ///
    /// Individuals must fill every required field and a signing date; all
    /// missing fields are reported at once. Groups must give every member a
    /// name and a phone number.
    pub fn validate(&self) -> Result<()> {
        match &self.source {
            RecordSource::Other => {
                let mut missing: Vec<&'static str> = INDIVIDUAL_REQUIRED
                    .into_iter()
                    .filter(|column| self.is_blank(*column))
                    .map(Column::id)
                    .collect();
                if self.date_signed.is_none() {
                    missing.push(Column::DateSigned.id());
                }
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(DataError::Validation { missing })
                }
            }
            RecordSource::RepresentativeForm { members, .. } => {
                for (index, member) in members.iter().enumerate() {
                    let reason = if member.member_name.trim().is_empty() {
                        "missing member name"
                    } else if member.member_phone_number.trim().is_empty() {
                        "missing phone number"
                    } else {
                        continue;
                    };
                    return Err(DataError::InvalidMember {
                        index,
                        reason: reason.to_string(),
                    });
                }
                Ok(())
            }
        }
    }

    fn is_blank(&self, column: Column) -> bool {
        match column {
            Column::LandSize => self.land_size_acres.is_none(),
            other => self.cell(other).trim().is_empty(),
        }
    }
}
