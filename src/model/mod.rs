use serde::{Deserialize, Deserializer, Serialize};

/// Results per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// An employee record as served by the remote service.
///
/// The identifier is assigned by the service and is never part of a
/// request body; see [`EmployeeDraft`] for the editable subset.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(from = "EmployeeRecord")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub salary: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

/// Wire shape of a record. Search hits carry both the document `_id` and
/// the stored `employee_id`; single-record reads may carry either.
#[derive(Deserialize)]
struct EmployeeRecord {
    #[serde(rename = "_id", default)]
    doc_id: Option<String>,
    #[serde(default)]
    employee_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    last_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    department: String,
    #[serde(default, deserialize_with = "null_as_default")]
    position: String,
    #[serde(default, deserialize_with = "lenient_salary")]
    salary: f64,
    #[serde(default)]
    skills: Option<Vec<String>>,
    #[serde(default)]
    contact_number: Option<String>,
}

impl From<EmployeeRecord> for Employee {
    fn from(raw: EmployeeRecord) -> Self {
        let id = raw
            .doc_id
            .filter(|id| !id.is_empty())
            .or(raw.employee_id)
            .unwrap_or_default();
        Employee {
            id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            email: raw.email,
            department: raw.department,
            position: raw.position,
            salary: raw.salary,
            skills: raw.skills,
            contact_number: raw.contact_number,
        }
    }
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Copies the editable fields into a draft.
    pub fn to_draft(&self) -> EmployeeDraft {
        EmployeeDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            position: self.position.clone(),
            salary: Some(self.salary),
            skills: self.skills.clone(),
            contact_number: self.contact_number.clone(),
        }
    }
}

/// Editable employee fields. `Default` is the cleared form.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department: String,
    pub position: String,
    pub salary: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
}

impl EmployeeDraft {
    pub fn with_id(&self, id: &str) -> Employee {
        Employee {
            id: id.to_string(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            position: self.position.clone(),
            salary: self.salary.unwrap_or_default(),
            skills: self.skills.clone(),
            contact_number: self.contact_number.clone(),
        }
    }
}

/// One page of search results plus the total number of matches.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ResultPage {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Suggestion {
    pub text: String,
}

/// Parameters of a page request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub search: String,
    pub department: String,
    pub page: u32,
    pub size: u32,
}

impl PageQuery {
    pub fn to_params(&self) -> [(&'static str, String); 4] {
        [
            ("search", self.search.clone()),
            ("department", self.department.clone()),
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ]
    }
}

/// Number of pages needed to show `total` records, `ceil(total / size)`.
pub fn page_count(total: u64, size: u32) -> u64 {
    if size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(size))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Form-bound clients post salary as a string, so accept both shapes.
fn lenient_salary<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Null => Ok(0.0),
        Raw::Text(s) if s.trim().is_empty() => Ok(0.0),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid salary '{s}': {e}"))),
    }
}
