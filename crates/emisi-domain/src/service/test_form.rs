//! Test-result form shape selected by fuel type
//!
//! Exactly one of two field sets is active per vehicle. The shape decides which
//! inputs are required and how the request body is assembled.

use std::collections::BTreeMap;

use emisi_types::{FuelType, TestField, TestReadings, TestResult, ValidationErrors};

/// Form variant for a vehicle's engine type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestForm {
    /// Bensin: five gas readings required, opacity sent as null
    SparkIgnition,
    /// Solar: opacity required, gas readings sent as 0
    CompressionIgnition,
}

const SPARK_FIELDS: [TestField; 5] = [
    TestField::Co,
    TestField::Co2,
    TestField::Hc,
    TestField::O2,
    TestField::LambdaVal,
];

const COMPRESSION_FIELDS: [TestField; 1] = [TestField::Opacity];

impl TestForm {
    pub fn for_fuel(fuel: FuelType) -> Self {
        match fuel {
            FuelType::Bensin => TestForm::SparkIgnition,
            FuelType::Solar => TestForm::CompressionIgnition,
        }
    }

    /// Fields the user must fill in
    pub fn required_fields(&self) -> &'static [TestField] {
        match self {
            TestForm::SparkIgnition => &SPARK_FIELDS,
            TestForm::CompressionIgnition => &COMPRESSION_FIELDS,
        }
    }

    /// Whether `field` is an enabled input for this shape
    pub fn accepts(&self, field: TestField) -> bool {
        self.required_fields().contains(&field)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestForm::SparkIgnition => "Uji gas buang (bensin)",
            TestForm::CompressionIgnition => "Uji opasitas (solar)",
        }
    }

    /// Validate the inputs and build the request readings.
    ///
    /// Every required field must be present, numeric and non-negative.
    pub fn readings(&self, inputs: &TestInputs) -> Result<TestReadings, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut values = BTreeMap::new();

        for &field in self.required_fields() {
            let raw = inputs.get(field).trim();
            if raw.is_empty() {
                errors.push(field.key(), format!("{} wajib diisi", field.label()));
                continue;
            }
            match parse_number(raw) {
                Some(v) if v < 0.0 => {
                    errors.push(field.key(), format!("{} tidak boleh negatif", field.label()));
                }
                Some(v) => {
                    values.insert(field, v);
                }
                None => {
                    errors.push(field.key(), format!("{} harus berupa angka", field.label()));
                }
            }
        }
        errors.into_result()?;

        let value = |field: TestField| values.get(&field).copied().unwrap_or(0.0);
        Ok(match self {
            TestForm::SparkIgnition => TestReadings {
                co: value(TestField::Co),
                co2: value(TestField::Co2),
                hc: value(TestField::Hc),
                o2: value(TestField::O2),
                lambda_val: value(TestField::LambdaVal),
                opacity: None,
            },
            TestForm::CompressionIgnition => TestReadings {
                co: 0.0,
                co2: 0.0,
                hc: 0.0,
                o2: 0.0,
                lambda_val: 0.0,
                opacity: Some(value(TestField::Opacity)),
            },
        })
    }

    /// Inputs pre-populated from a stored result, restricted to this shape's fields
    pub fn prefill(&self, result: &TestResult) -> TestInputs {
        let readings = result.readings();
        let mut inputs = TestInputs::default();
        for &field in self.required_fields() {
            if let Some(v) = readings.get(field) {
                inputs.set(field, format_number(v));
            }
        }
        inputs
    }
}

/// Raw text typed into the test form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestInputs {
    values: BTreeMap<TestField, String>,
}

impl TestInputs {
    pub fn get(&self, field: TestField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: TestField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }
}

/// Accepts `.` or `,` as decimal separator
fn parse_number(raw: &str) -> Option<f64> {
    let normalized = raw.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emisi_types::TestSubmission;

    #[test]
    fn test_solar_sends_only_opacity() {
        let form = TestForm::for_fuel(FuelType::Solar);
        assert_eq!(form.required_fields(), &[TestField::Opacity]);

        let mut inputs = TestInputs::default();
        inputs.set(TestField::Opacity, "45.2");
        let readings = form.readings(&inputs).unwrap();
        let body = serde_json::to_value(TestSubmission {
            readings,
            user_id: None,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "co": 0.0, "co2": 0.0, "hc": 0.0, "o2": 0.0,
                "lambda_val": 0.0, "opacity": 45.2
            })
        );
    }

    #[test]
    fn test_solar_ignores_gas_inputs() {
        let form = TestForm::CompressionIgnition;
        let mut inputs = TestInputs::default();
        inputs.set(TestField::Co, "3.0");
        inputs.set(TestField::Opacity, "10");
        let readings = form.readings(&inputs).unwrap();
        assert_eq!(readings.co, 0.0);
        assert_eq!(readings.opacity, Some(10.0));
        assert!(!form.accepts(TestField::Co));
    }

    #[test]
    fn test_bensin_missing_hc_is_rejected() {
        let form = TestForm::for_fuel(FuelType::Bensin);
        let mut inputs = TestInputs::default();
        inputs.set(TestField::Co, "0.5");
        inputs.set(TestField::Co2, "14.1");
        inputs.set(TestField::O2, "0.9");
        inputs.set(TestField::LambdaVal, "1.02");
        let errors = form.readings(&inputs).unwrap_err();
        assert_eq!(errors.fields(), vec!["hc"]);
        assert_eq!(errors.message_for("hc"), Some("HC (ppm) wajib diisi"));
    }

    #[test]
    fn test_bensin_full_readings_send_null_opacity() {
        let form = TestForm::SparkIgnition;
        let mut inputs = TestInputs::default();
        for (field, value) in [
            (TestField::Co, "0,5"),
            (TestField::Co2, "14.1"),
            (TestField::Hc, "120"),
            (TestField::O2, "0.9"),
            (TestField::LambdaVal, "1.02"),
        ] {
            inputs.set(field, value);
        }
        let readings = form.readings(&inputs).unwrap();
        assert_eq!(readings.co, 0.5);
        assert_eq!(readings.hc, 120.0);
        assert_eq!(readings.opacity, None);
    }

    #[test]
    fn test_rejects_non_numeric_and_negative() {
        let form = TestForm::CompressionIgnition;
        let mut inputs = TestInputs::default();
        inputs.set(TestField::Opacity, "abc");
        let errors = form.readings(&inputs).unwrap_err();
        assert_eq!(errors.message_for("opacity"), Some("Opasitas (%) harus berupa angka"));

        inputs.set(TestField::Opacity, "-1");
        let errors = form.readings(&inputs).unwrap_err();
        assert_eq!(errors.message_for("opacity"), Some("Opasitas (%) tidak boleh negatif"));
    }

    #[test]
    fn test_prefill_uses_active_fields_only() {
        let result = TestResult {
            co: 0.0,
            co2: 0.0,
            hc: 0.0,
            o2: 0.0,
            lambda_val: 0.0,
            opacity: Some(38.5),
            valid: true,
            lulus: true,
            operator: Some("admin".to_string()),
            user_id: Some(1),
            tanggal: None,
        };
        let inputs = TestForm::CompressionIgnition.prefill(&result);
        assert_eq!(inputs.get(TestField::Opacity), "38.5");
        assert_eq!(inputs.get(TestField::Co), "");

        let inputs = TestForm::SparkIgnition.prefill(&result);
        assert_eq!(inputs.get(TestField::Co), "0");
        assert_eq!(inputs.get(TestField::Opacity), "");
    }
}
