//! Fixed lookup tables for upstream jurisdiction and collection codes.
//!
//! Both tables are closed: an unknown code is reported as an error instead of
//! falling back to a default, since it means the table has drifted from the
//! upstream vocabulary.

use crate::error::NormalizeError;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

const JURISDICTIONS: [(&str, &str); 52] = [
    ("US", "Federal"),
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

const COLLECTIONS: [(&str, &str); 40] = [
    ("BILLS", "Congressional Bills"),
    ("BILLSTATUS", "Congressional Bill Status"),
    ("BILLSUM", "Congressional Bill Summaries"),
    ("BUDGET", "United States Budget"),
    ("CCAL", "Congressional Calendars"),
    ("CDIR", "Congressional Directory"),
    ("CDOC", "Congressional Documents"),
    ("CFR", "Code of Federal Regulations"),
    ("CHRG", "Congressional Hearings"),
    ("CMR", "Congressionally Mandated Reports"),
    ("COMPS", "Statutes Compilations"),
    ("CPD", "Compilation of Presidential Documents"),
    ("CPRT", "Congressional Committee Prints"),
    ("CREC", "Congressional Record"),
    ("CRECB", "Congressional Record (Bound Edition)"),
    ("CRI", "Congressional Record Index"),
    ("CRPT", "Congressional Reports"),
    ("CZIC", "Coastal Zone Information Center"),
    ("ECFR", "Electronic Code of Federal Regulations"),
    ("ECONI", "Economic Indicators"),
    ("ERIC", "Education Reports from ERIC"),
    ("ERP", "Economic Report of the President"),
    ("FR", "Federal Register"),
    (
        "GAOREPORTS",
        "Government Accountability Office Reports and Comptroller General Decisions",
    ),
    ("GOVMAN", "United States Government Manual"),
    ("GOVPUB", "Bulk Submission"),
    ("GPO", "Additional Government Publications"),
    ("HJOURNAL", "Journal of the House of Representatives"),
    ("HMAN", "House Rules and Manual"),
    ("HOB", "History of Bills"),
    ("LSA", "List of CFR Sections Affected"),
    ("PAI", "Privacy Act Issuances"),
    ("PLAW", "Public and Private Laws"),
    ("PPP", "Public Papers of the Presidents of the United States"),
    ("SERIALSET", "Congressional Serial Set"),
    ("SJOURNAL", "Journal of the Senate"),
    ("SMAN", "Senate Manual"),
    ("STATUTE", "Statutes at Large"),
    ("USCODE", "United States Code"),
    ("USCOURTS", "United States Courts Opinions"),
];

const LEGISLATION: &str = "Legislation";

/// A state, territory or "Federal", stored by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Jurisdiction {
    code: &'static str,
    name: &'static str,
}

impl Jurisdiction {
    pub const FEDERAL: Jurisdiction = Jurisdiction {
        code: "US",
        name: "Federal",
    };

    pub fn from_code(code: &str) -> Result<Self, NormalizeError> {
        let wanted = code.trim();
        JURISDICTIONS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(wanted))
            .map(|&(code, name)| Self { code, name })
            .ok_or_else(|| NormalizeError::UnknownJurisdiction(code.to_string()))
    }

    pub fn from_name(name: &str) -> Result<Self, NormalizeError> {
        JURISDICTIONS
            .iter()
            .find(|(_, known)| *known == name)
            .map(|&(code, name)| Self { code, name })
            .ok_or_else(|| NormalizeError::UnknownJurisdiction(name.to_string()))
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl<'de> Deserialize<'de> for Jurisdiction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name).map_err(de::Error::custom)
    }
}

impl From<Jurisdiction> for String {
    fn from(value: Jurisdiction) -> Self {
        value.name.to_string()
    }
}

/// Category a document was collected under: "Legislation" for state and
/// federal bills, or one of the federal publishing collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct SourceCollection {
    name: &'static str,
}

impl SourceCollection {
    pub const LEGISLATION: SourceCollection = SourceCollection { name: LEGISLATION };

    pub fn from_code(code: &str) -> Result<Self, NormalizeError> {
        let wanted = code.trim();
        COLLECTIONS
            .iter()
            .find(|(known, _)| *known == wanted)
            .map(|&(_, name)| Self { name })
            .ok_or_else(|| NormalizeError::UnknownCollection(code.to_string()))
    }

    pub fn from_name(name: &str) -> Result<Self, NormalizeError> {
        if name == LEGISLATION {
            return Ok(Self::LEGISLATION);
        }

        COLLECTIONS
            .iter()
            .find(|(_, known)| *known == name)
            .map(|&(_, name)| Self { name })
            .ok_or_else(|| NormalizeError::UnknownCollection(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_legislation(&self) -> bool {
        self.name == LEGISLATION
    }
}

impl fmt::Display for SourceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl<'de> Deserialize<'de> for SourceCollection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name).map_err(de::Error::custom)
    }
}

impl From<SourceCollection> for String {
    fn from(value: SourceCollection) -> Self {
        value.name.to_string()
    }
}
