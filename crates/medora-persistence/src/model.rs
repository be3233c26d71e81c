//! Domain model types for the persistence abstraction layer
//!
//! These types are used as arguments and return values of the persistence
//! traits, decoupled from specific storage backends.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};

use medora_common::normalize_email;

/// Current timestamp used for `created_at` and `updated_at` columns
pub fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

// ============================================================================
// Entity store records
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalInfo {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}

#[derive(Clone, Debug, Default)]
pub struct NewHospital {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub image: Option<Vec<u8>>,
}

/// Partial hospital update, `None` fields are left untouched
#[derive(Clone, Debug, Default)]
pub struct HospitalChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub image: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentInfo {
    pub id: i32,
    pub hospital_id: i32,
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}

#[derive(Clone, Debug, Default)]
pub struct NewDepartment {
    pub hospital_id: i32,
    pub name: String,
    pub description: String,
    pub image: Option<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
pub struct DepartmentChanges {
    pub hospital_id: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<Vec<u8>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInfo {
    pub id: i32,
    pub department_id: i32,
    pub hospital_id: i32,
    pub name: String,
    pub specialization: String,
    pub phone: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}

impl DoctorInfo {
    pub fn account_ref(&self) -> Option<AccountRef> {
        AccountRef::from_email(&self.email)
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewDoctor {
    pub department_id: i32,
    pub hospital_id: i32,
    pub name: String,
    pub specialization: String,
    pub phone: String,
    pub email: String,
}

/// Partial doctor update. The email is the identity join key and never changes.
#[derive(Clone, Debug, Default)]
pub struct DoctorChanges {
    pub department_id: Option<i32>,
    pub hospital_id: Option<i32>,
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}

impl AdminInfo {
    pub fn account_ref(&self) -> Option<AccountRef> {
        AccountRef::from_email(&self.email)
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Default)]
pub struct AdminChanges {
    pub name: Option<String>,
}

/// Appointment lifecycle status. Any status may move to any other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 4] = [
        AppointmentStatus::Scheduled,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            AppointmentStatus::Scheduled => 0,
            AppointmentStatus::Confirmed => 1,
            AppointmentStatus::Completed => 2,
            AppointmentStatus::Cancelled => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() as i64 == code)
    }

    /// Parses a status name case-insensitively, or its numeric code
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Ok(code) = value.parse::<i64>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentInfo {
    pub id: i32,
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub treatment_record_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version: i32,
}

#[derive(Clone, Debug)]
pub struct NewAppointment {
    pub patient_id: i32,
    pub doctor_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
}

#[derive(Clone, Debug, Default)]
pub struct AppointmentChanges {
    pub patient_id: Option<i32>,
    pub doctor_id: Option<i32>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub reason: Option<String>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentChanges {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRecordInfo {
    pub id: i32,
    pub appointment_id: i32,
    pub diagnosis: String,
    pub treatment: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Default)]
pub struct NewTreatmentRecord {
    pub appointment_id: i32,
    pub diagnosis: String,
    pub treatment: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

/// Result of a versioned write
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateOutcome<T> {
    Updated(T),
    /// No row matched both the id and the expected version
    Conflict,
}

// ============================================================================
// Identity store records
// ============================================================================

/// Typed weak reference into the identity store.
///
/// Built from an entity's stored email; resolving it may find no account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountRef(String);

impl AccountRef {
    /// Returns `None` for blank emails
    pub fn from_email(email: &str) -> Option<Self> {
        let normalized = normalize_email(email);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn email(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Basic account information returned from the identity store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub enabled: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityError {
    pub code: String,
    pub description: String,
}

/// Outcome of an identity store mutation, with per-item errors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityResult {
    pub succeeded: bool,
    pub errors: Vec<IdentityError>,
}

impl IdentityResult {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(code: &str, description: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            errors: vec![IdentityError {
                code: code.to_string(),
                description: description.into(),
            }],
        }
    }

    /// All error descriptions joined for logging and error messages
    pub fn describe(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.description.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

// ============================================================================
// Images
// ============================================================================

/// How stored image bytes are exposed in API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMode {
    /// Bytes embedded as base64
    #[default]
    Inline,
    /// A URL of the endpoint streaming the bytes
    Path,
}

impl std::str::FromStr for ImageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(ImageMode::Inline),
            "path" => Ok(ImageMode::Path),
            _ => Err(format!("Invalid image mode: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ImageRef {
    Inline(#[serde(serialize_with = "serialize_base64")] Vec<u8>),
    Path(String),
}

impl ImageRef {
    /// Builds the response reference for an entity image, `None` when no image is stored
    pub fn resolve(
        mode: ImageMode,
        bytes: Option<&[u8]>,
        context_path: &str,
        resource: &str,
        id: i32,
    ) -> Option<Self> {
        let bytes = bytes.filter(|b| !b.is_empty())?;
        Some(match mode {
            ImageMode::Inline => ImageRef::Inline(bytes.to_vec()),
            ImageMode::Path => ImageRef::Path(format!(
                "{}/{}/{}/image",
                context_path.trim_end_matches('/'),
                resource,
                id
            )),
        })
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

// ============================================================================
// Storage mode
// ============================================================================

/// Storage mode for the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    /// External database (MySQL/PostgreSQL/SQLite via SeaORM)
    ExternalDb,
    /// In-process tables, nothing survives a restart
    Memory,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::ExternalDb => write!(f, "external_db"),
            StorageMode::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external_db" => Ok(StorageMode::ExternalDb),
            "memory" => Ok(StorageMode::Memory),
            _ => Err(format!("Invalid storage mode: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            AppointmentStatus::parse("confirmed"),
            Some(AppointmentStatus::Confirmed)
        );
        assert_eq!(
            AppointmentStatus::parse(" CANCELLED "),
            Some(AppointmentStatus::Cancelled)
        );
        assert_eq!(
            AppointmentStatus::parse("2"),
            Some(AppointmentStatus::Completed)
        );
        assert_eq!(AppointmentStatus::parse("4"), None);
        assert_eq!(AppointmentStatus::parse("-1"), None);
        assert_eq!(AppointmentStatus::parse("Pending"), None);
        assert_eq!(AppointmentStatus::parse(""), None);
    }

    #[test]
    fn test_account_ref_from_email() {
        assert!(AccountRef::from_email("").is_none());
        assert!(AccountRef::from_email("   ").is_none());
        let r = AccountRef::from_email(" Doc@Example.com").unwrap();
        assert_eq!(r.email(), "doc@example.com");
    }

    #[test]
    fn test_identity_result_describe() {
        let mut result = IdentityResult::failed("Locked", "account is locked");
        result.errors.push(IdentityError {
            code: "Other".to_string(),
            description: "second".to_string(),
        });
        assert!(!result.succeeded);
        assert_eq!(result.describe(), "account is locked; second");
        assert!(IdentityResult::success().succeeded);
    }

    #[test]
    fn test_image_ref_resolve() {
        let bytes = [1u8, 2, 3];
        assert_eq!(
            ImageRef::resolve(ImageMode::Path, Some(&bytes), "/api/", "hospital", 4),
            Some(ImageRef::Path("/api/hospital/4/image".to_string()))
        );
        assert_eq!(
            ImageRef::resolve(ImageMode::Inline, Some(&[]), "/api", "hospital", 4),
            None
        );

        let inline = ImageRef::resolve(ImageMode::Inline, Some(&bytes), "/api", "department", 1);
        let json = serde_json::to_value(inline).unwrap();
        assert_eq!(json, serde_json::json!({"inline": "AQID"}));
    }

    #[test]
    fn test_storage_mode_from_str() {
        assert_eq!("memory".parse::<StorageMode>(), Ok(StorageMode::Memory));
        assert_eq!(
            "external_db".parse::<StorageMode>(),
            Ok(StorageMode::ExternalDb)
        );
        assert!("rocksdb".parse::<StorageMode>().is_err());
    }
}
