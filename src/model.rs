// Data shapes exchanged with the portal. Field names mirror the remote JSON
// (see the `rename` attributes); the Rust names are what the rest of the
// crate uses.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Server-assigned numeric identifier, kept as a decimal string.
///
/// The portal sends ids sometimes as JSON numbers and sometimes as strings.
/// Both are accepted as long as they hold a decimal integer; integers are
/// rendered without going through `f64` so large ids keep every digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn new(raw: impl Into<String>) -> Self {
        Id(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Converts a JSON value into an id. Returns `None` for anything that is
    /// not an integral number or a string of decimal digits.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(Id(u.to_string()))
                } else if let Some(i) = n.as_i64() {
                    Some(Id(i.to_string()))
                } else {
                    let f = n.as_f64()?;
                    if f.is_finite() && f.fract() == 0.0 {
                        Some(Id(format!("{:.0}", f)))
                    } else {
                        None
                    }
                }
            }
            Value::String(s) => {
                let t = s.trim();
                let digits = t.strip_prefix('-').unwrap_or(t);
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                    Some(Id(t.to_string()))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for Id {
    fn from(v: u64) -> Self {
        Id(v.to_string())
    }
}

impl From<&str> for Id {
    fn from(v: &str) -> Self {
        Id(v.to_string())
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Id::from_json(&value)
            .ok_or_else(|| de::Error::custom(format!("expected numeric identifier, got {}", value)))
    }
}

/// Sign-in payload. Only ever sent once per session.
#[derive(Serialize, Debug)]
pub struct SignInRequest<'a> {
    #[serde(rename = "Username")]
    pub username: &'a str,
    #[serde(rename = "Password")]
    pub password: &'a str,
}

/// The part of the sign-in response we rely on.
#[derive(Deserialize, Debug)]
pub struct SignInResponse {
    #[serde(rename = "LoginSuccessful")]
    pub login_successful: bool,
}

/// Username and password, stored after a successful sign-in.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Id,
    pub persona_id: Id,
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} (persona {})", self.user_id, self.persona_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgContext {
    pub school_name: String,
    pub school_year_label: String,
}

impl fmt::Display for OrgContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.school_name, self.school_year_label)
    }
}

/// Term and marking period the session is working in. Neither is a gate for
/// the stage machine; the marking period gates assignment fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermScope {
    pub current_duration_id: Option<Id>,
    pub current_marking_period_id: Option<Id>,
}

/// One entry of the term list endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Term {
    #[serde(rename = "CurrentInd")]
    pub current_indicator: i64,
    #[serde(rename = "DurationDescription", default)]
    pub description: String,
    #[serde(rename = "DurationId")]
    pub duration_id: Id,
    #[serde(rename = "OfferingType")]
    pub offering_type: i64,
}

impl Term {
    pub fn is_current(&self) -> bool {
        self.offering_type == 1 && self.current_indicator == 1
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.description, self.duration_id)?;
        if self.is_current() {
            write!(f, " (current)")?;
        }
        Ok(())
    }
}

/// A class/section the user is enrolled in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AcademicGroup {
    #[serde(rename = "DurationId")]
    pub duration_id: Id,
    #[serde(rename = "OwnerId")]
    pub owner_id: Id,
    #[serde(rename = "assignmentactivetoday", default)]
    pub assignments_active_today: i64,
    #[serde(rename = "assignmentassignedtoday", default)]
    pub assignments_assigned_today: i64,
    #[serde(rename = "assignmentduetoday", default)]
    pub assignments_due_today: i64,
    #[serde(rename = "coursedescription", default)]
    pub description: String,
    #[serde(rename = "cumgrade", default)]
    pub cum_grade: Option<String>,
    #[serde(rename = "groupownername", default)]
    pub owner_name: String,
    #[serde(rename = "groupowneremail", default)]
    pub owner_email: String,
    #[serde(rename = "leadsectionid")]
    pub lead_section_id: Id,
    #[serde(rename = "markingperiodid")]
    pub marking_period_id: Id,
    #[serde(rename = "sectionid")]
    pub section_id: Id,
    #[serde(rename = "sectionidentifier", default)]
    pub section_title: String,
}

impl fmt::Display for AcademicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.section_title)?;
        match self.cum_grade.as_deref() {
            Some(g) if !g.is_empty() => write!(f, " - {}", g)?,
            _ => write!(f, " - no grade")?,
        }
        if !self.owner_name.is_empty() {
            write!(f, " ({})", self.owner_name)?;
        }
        Ok(())
    }
}

/// Gradebook row for one assignment. `points` stays a string because the
/// portal uses text placeholders for work that hasn't been graded.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Assignment {
    #[serde(rename = "AssignmentShortDescription", default)]
    pub short_description: String,
    #[serde(rename = "AssignmentType", default)]
    pub assignment_type: String,
    #[serde(rename = "MaxPoints")]
    pub max_points: f64,
    #[serde(rename = "Points", default)]
    pub points: Option<String>,
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}/{}",
            self.short_description,
            self.assignment_type,
            self.points.as_deref().unwrap_or("-"),
            self.max_points
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_accepts_numbers_and_strings() {
        assert_eq!(Id::from_json(&json!(1234)), Some(Id::new("1234")));
        assert_eq!(Id::from_json(&json!("98765")), Some(Id::new("98765")));
        assert_eq!(Id::from_json(&json!(42.0)), Some(Id::new("42")));
        assert_eq!(Id::from_json(&json!(4.5)), None);
        assert_eq!(Id::from_json(&json!(" 77 ")), Some(Id::new("77")));
        assert_eq!(Id::from_json(&json!("-3")), Some(Id::new("-3")));
        assert_eq!(Id::from_json(&json!("")), None);
        assert_eq!(Id::from_json(&json!("abc")), None);
        assert_eq!(Id::from_json(&json!("Student")), None);
        assert_eq!(Id::from_json(&json!("12a")), None);
        assert_eq!(Id::from_json(&json!("-")), None);
        assert_eq!(Id::from_json(&json!(null)), None);
    }

    #[test]
    fn id_keeps_large_integers_exact() {
        let id: Id = serde_json::from_str("9007199254740993").unwrap();
        assert_eq!(id.as_str(), "9007199254740993");
    }

    #[test]
    fn credentials_debug_hides_password() {
        let c = Credentials {
            username: "sam".into(),
            password: "hunter2".into(),
        };
        let dbg = format!("{:?}", c);
        assert!(dbg.contains("sam"));
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn decodes_group_with_portal_field_names() {
        let group: AcademicGroup = serde_json::from_value(json!({
            "DurationId": 88,
            "OwnerId": 5,
            "assignmentactivetoday": 1,
            "assignmentassignedtoday": 0,
            "assignmentduetoday": 2,
            "coursedescription": "Algebra II",
            "cumgrade": "93.5",
            "groupownername": "Ms. Smith",
            "groupowneremail": "smith@example.org",
            "leadsectionid": 700,
            "markingperiodid": 42,
            "sectionid": 701,
            "sectionidentifier": "Algebra II - 3"
        }))
        .unwrap();
        assert_eq!(group.marking_period_id, Id::from(42));
        assert_eq!(group.section_id.as_str(), "701");
        assert_eq!(group.cum_grade.as_deref(), Some("93.5"));
        assert_eq!(group.to_string(), "Algebra II - 3 - 93.5 (Ms. Smith)");
    }

    #[test]
    fn assignment_points_may_be_missing() {
        let a: Assignment = serde_json::from_value(json!({
            "AssignmentShortDescription": "Quiz 1",
            "AssignmentType": "Quiz",
            "MaxPoints": 20,
            "Points": null
        }))
        .unwrap();
        assert_eq!(a.points, None);
        assert_eq!(a.max_points, 20.0);
    }

    #[test]
    fn sign_in_request_uses_portal_keys() {
        let body = serde_json::to_value(SignInRequest {
            username: "sam",
            password: "pw",
        })
        .unwrap();
        assert_eq!(body, json!({"Username": "sam", "Password": "pw"}));
    }
}
