//! Emissions test result types (hasil uji)

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Numeric input of a test result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestField {
    Co,
    Co2,
    Hc,
    O2,
    LambdaVal,
    Opacity,
}

impl TestField {
    pub const ALL: [TestField; 6] = [
        TestField::Co,
        TestField::Co2,
        TestField::Hc,
        TestField::O2,
        TestField::LambdaVal,
        TestField::Opacity,
    ];

    /// Wire key in request/response bodies
    pub fn key(&self) -> &'static str {
        match self {
            TestField::Co => "co",
            TestField::Co2 => "co2",
            TestField::Hc => "hc",
            TestField::O2 => "o2",
            TestField::LambdaVal => "lambda_val",
            TestField::Opacity => "opacity",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestField::Co => "CO (%)",
            TestField::Co2 => "CO2 (%)",
            TestField::Hc => "HC (ppm)",
            TestField::O2 => "O2 (%)",
            TestField::LambdaVal => "Lambda",
            TestField::Opacity => "Opasitas (%)",
        }
    }

    pub fn from_key(key: &str) -> Option<TestField> {
        TestField::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for TestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Measured values sent to the backend.
///
/// The backend schema requires all five gas readings to be non-null, so
/// compression-ignition submissions carry `0` placeholders for them and
/// spark-ignition submissions carry `opacity: null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TestReadings {
    pub co: f64,
    pub co2: f64,
    pub hc: f64,
    pub o2: f64,
    pub lambda_val: f64,
    pub opacity: Option<f64>,
}

impl TestReadings {
    pub fn get(&self, field: TestField) -> Option<f64> {
        match field {
            TestField::Co => Some(self.co),
            TestField::Co2 => Some(self.co2),
            TestField::Hc => Some(self.hc),
            TestField::O2 => Some(self.o2),
            TestField::LambdaVal => Some(self.lambda_val),
            TestField::Opacity => self.opacity,
        }
    }
}

/// Body of `POST /api/hasil-uji/{plat}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestSubmission {
    #[serde(flatten)]
    pub readings: TestReadings,
    /// Operator identity from the authenticated session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Stored test result from `GET /api/hasil-uji/{plat}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(default)]
    pub co: f64,
    #[serde(default)]
    pub co2: f64,
    #[serde(default)]
    pub hc: f64,
    #[serde(default)]
    pub o2: f64,
    #[serde(default)]
    pub lambda_val: f64,
    #[serde(default)]
    pub opacity: Option<f64>,
    /// Readings within instrument range (server-computed)
    #[serde(default)]
    pub valid: bool,
    /// Emissions verdict (server-computed)
    #[serde(default)]
    pub lulus: bool,
    /// Username of the operator who recorded the test
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub tanggal: Option<NaiveDateTime>,
}

impl TestResult {
    pub fn readings(&self) -> TestReadings {
        TestReadings {
            co: self.co,
            co2: self.co2,
            hc: self.hc,
            o2: self.o2,
            lambda_val: self.lambda_val,
            opacity: self.opacity,
        }
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            valid: Some(self.valid),
            lulus: self.lulus,
            operator: self.operator.clone(),
        }
    }
}

/// Response of a successful save
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub lulus: bool,
    #[serde(default)]
    pub valid: Option<bool>,
    #[serde(default)]
    pub operator: Option<String>,
    /// Thresholds the backend applied, keyed by limit name (e.g. "co_max")
    #[serde(default)]
    pub limits: BTreeMap<String, f64>,
}

impl SaveOutcome {
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            valid: self.valid,
            lulus: self.lulus,
            operator: self.operator.clone(),
        }
    }
}

/// Display-only verdict shown next to a test form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub valid: Option<bool>,
    pub lulus: bool,
    pub operator: Option<String>,
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let valid = match self.valid {
            Some(v) => v.to_string(),
            None => "-".to_string(),
        };
        write!(
            f,
            "Valid: {}, Lulus: {}, Operator: {}",
            valid,
            self.lulus,
            self.operator.as_deref().unwrap_or("-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_serializes_null_opacity() {
        let submission = TestSubmission {
            readings: TestReadings {
                co: 0.5,
                co2: 14.2,
                hc: 120.0,
                o2: 0.8,
                lambda_val: 1.01,
                opacity: None,
            },
            user_id: Some(3),
        };
        let value = serde_json::to_value(submission).unwrap();
        assert!(value["opacity"].is_null());
        assert_eq!(value["hc"], 120.0);
        assert_eq!(value["user_id"], 3);
    }

    #[test]
    fn test_result_accepts_integer_hc_and_timestamp() {
        let json = r#"{
            "co": 0.4, "co2": 14.0, "hc": 150, "o2": 1.0, "lambda_val": 1.0,
            "opacity": null, "lulus": true, "valid": true, "user_id": 1,
            "tanggal": "2025-05-12T18:30:00.123456", "operator": "admin",
            "fuel_type": "bensin", "plat_nomor": "D5678AB"
        }"#;
        let result: TestResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.hc, 150.0);
        assert!(result.tanggal.is_some());
        assert_eq!(result.summary().to_string(), "Valid: true, Lulus: true, Operator: admin");
    }

    #[test]
    fn test_save_outcome_without_operator() {
        let json = r#"{"success": true, "lulus": false, "limits": {"opacity_max": 50.0}}"#;
        let outcome: SaveOutcome = serde_json::from_str(json).unwrap();
        assert!(!outcome.lulus);
        assert_eq!(outcome.limits.get("opacity_max"), Some(&50.0));
        assert_eq!(outcome.summary().to_string(), "Valid: -, Lulus: false, Operator: -");
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in TestField::ALL {
            assert_eq!(TestField::from_key(field.key()), Some(field));
        }
        assert_eq!(TestField::from_key("lambda"), None);
    }
}
