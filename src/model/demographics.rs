//! Respondent demographics: used for filtering and data-quality scoring only.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::Violation;
use crate::model::RawRecord;
use crate::parser::{parse_optional_code, parse_optional_f64, parse_optional_text};

/// Household member slots carried by the questionnaire (`c2150_k`/`c2151_k`).
pub const MEMBER_SLOTS: u8 = 10;

/// Labour-market status as coded in `emp_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    Unemployed,
    Inactive,
    Other,
    Unknown,
}

impl EmploymentStatus {
    /// Maps a questionnaire code; anything outside 1..=4 is `Unknown`.
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => EmploymentStatus::Employed,
            Some(2) => EmploymentStatus::Unemployed,
            Some(3) => EmploymentStatus::Inactive,
            Some(4) => EmploymentStatus::Other,
            _ => EmploymentStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "employed",
            EmploymentStatus::Unemployed => "unemployed",
            EmploymentStatus::Inactive => "inactive",
            EmploymentStatus::Other => "other",
            EmploymentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentStatus {
    type Err = String;

    /// Accepts either the label (`employed`) or the questionnaire code (`1`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employed" | "1" => Ok(EmploymentStatus::Employed),
            "unemployed" | "2" => Ok(EmploymentStatus::Unemployed),
            "inactive" | "3" => Ok(EmploymentStatus::Inactive),
            "other" | "4" => Ok(EmploymentStatus::Other),
            "unknown" => Ok(EmploymentStatus::Unknown),
            other => Err(format!("unknown employment status '{other}'")),
        }
    }
}

/// One household member slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HouseholdMember {
    pub slot: u8,
    pub age: Option<f64>,
    pub relation: Option<f64>,
}

/// Demographic attributes callers can filter or group on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DemographicAttribute {
    Gender,
    AgeGroup,
    HouseholdSize,
    Children,
    Education,
    Region,
    EmploymentStatus,
    HouseholdMembers,
}

impl DemographicAttribute {
    /// Attributes that count towards a record's completeness.
    pub const QUALITY_TRACKED: [DemographicAttribute; 5] = [
        DemographicAttribute::Gender,
        DemographicAttribute::AgeGroup,
        DemographicAttribute::HouseholdSize,
        DemographicAttribute::Education,
        DemographicAttribute::HouseholdMembers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DemographicAttribute::Gender => "gender",
            DemographicAttribute::AgeGroup => "age_group",
            DemographicAttribute::HouseholdSize => "household_size",
            DemographicAttribute::Children => "num_children",
            DemographicAttribute::Education => "education",
            DemographicAttribute::Region => "region",
            DemographicAttribute::EmploymentStatus => "employment_status",
            DemographicAttribute::HouseholdMembers => "household_members",
        }
    }
}

impl fmt::Display for DemographicAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DemographicAttribute {
    type Err = String;

    /// Accepts the attribute name or its source column.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gender" | "c1010" => Ok(DemographicAttribute::Gender),
            "age_group" | "age" | "c1020" => Ok(DemographicAttribute::AgeGroup),
            "household_size" | "c2110" => Ok(DemographicAttribute::HouseholdSize),
            "num_children" | "children" | "c2120" => Ok(DemographicAttribute::Children),
            "education" | "x1040_1" => Ok(DemographicAttribute::Education),
            "region" => Ok(DemographicAttribute::Region),
            "employment_status" | "emp_status" => Ok(DemographicAttribute::EmploymentStatus),
            "household_members" => Ok(DemographicAttribute::HouseholdMembers),
            other => Err(format!("unknown demographic attribute '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Demographics {
    gender: Option<i64>,
    age_group: Option<i64>,
    household_size: Option<i64>,
    num_children: Option<i64>,
    education: Option<String>,
    region: Option<String>,
    employment_status: EmploymentStatus,
    household_members: Vec<HouseholdMember>,
}

impl Demographics {
    /// Reads the demographic block of a row, pushing any bad numeric cells
    /// onto `violations`.
    pub(crate) fn from_raw(raw: &RawRecord, violations: &mut Vec<Violation>) -> Self {
        let mut code = |column: &str| {
            parse_optional_code(column, raw.get(column)).unwrap_or_else(|v| {
                violations.push(v);
                None
            })
        };

        let gender = code("c1010");
        let age_group = code("c1020");
        let household_size = code("c2110");
        let num_children = code("c2120");

        // A categorical answer: unreadable codes are Unknown, not a bad row.
        let employment_status = EmploymentStatus::from_code(
            parse_optional_code("emp_status", raw.get("emp_status"))
                .ok()
                .flatten(),
        );

        let mut household_members = Vec::new();
        for slot in 1..=MEMBER_SLOTS {
            let mut read = |column: String| {
                parse_optional_f64(&column, raw.get(&column)).unwrap_or_else(|v| {
                    violations.push(v);
                    None
                })
            };
            let age = read(format!("c2151_{slot}"));
            let relation = read(format!("c2150_{slot}"));

            if age.is_some() || relation.is_some() {
                household_members.push(HouseholdMember { slot, age, relation });
            }
        }

        Self {
            gender,
            age_group,
            household_size,
            num_children,
            education: parse_optional_text(raw.get("x1040_1")),
            region: parse_optional_text(raw.get("region")),
            employment_status,
            household_members,
        }
    }

    pub fn gender(&self) -> Option<i64> {
        self.gender
    }

    pub fn age_group(&self) -> Option<i64> {
        self.age_group
    }

    pub fn household_size(&self) -> Option<i64> {
        self.household_size
    }

    pub fn num_children(&self) -> Option<i64> {
        self.num_children
    }

    pub fn education(&self) -> Option<&str> {
        self.education.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn employment_status(&self) -> EmploymentStatus {
        self.employment_status
    }

    pub fn household_members(&self) -> &[HouseholdMember] {
        &self.household_members
    }

    /// Normalized value of an attribute, `None` when the respondent gave none.
    ///
    /// Codes print as integers, text is lowercased, household members report
    /// their count. An `Unknown` employment status counts as missing.
    pub fn attribute(&self, attribute: DemographicAttribute) -> Option<String> {
        match attribute {
            DemographicAttribute::Gender => self.gender.map(|v| v.to_string()),
            DemographicAttribute::AgeGroup => self.age_group.map(|v| v.to_string()),
            DemographicAttribute::HouseholdSize => self.household_size.map(|v| v.to_string()),
            DemographicAttribute::Children => self.num_children.map(|v| v.to_string()),
            DemographicAttribute::Education => self.education.as_deref().map(str::to_lowercase),
            DemographicAttribute::Region => self.region.as_deref().map(str::to_lowercase),
            DemographicAttribute::EmploymentStatus => match self.employment_status {
                EmploymentStatus::Unknown => None,
                status => Some(status.as_str().to_string()),
            },
            DemographicAttribute::HouseholdMembers => {
                if self.household_members.is_empty() {
                    None
                } else {
                    Some(self.household_members.len().to_string())
                }
            }
        }
    }

    pub fn is_present(&self, attribute: DemographicAttribute) -> bool {
        self.attribute(attribute).is_some()
    }

    /// All quality-tracked attributes are present.
    pub fn is_complete(&self) -> bool {
        DemographicAttribute::QUALITY_TRACKED
            .iter()
            .all(|a| self.is_present(*a))
    }
}
