//! Destructive actions that need an explicit yes from the user

use std::fmt;

/// A pending confirmation prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DeleteVehicle { plat: String },
    ClearTestResult { plat: String },
}

impl Confirmation {
    pub fn prompt(&self) -> String {
        match self {
            Confirmation::DeleteVehicle { plat } => format!("Hapus kendaraan {}?", plat),
            Confirmation::ClearTestResult { plat } => format!("Hapus data uji {}?", plat),
        }
    }

    pub fn plat(&self) -> &str {
        match self {
            Confirmation::DeleteVehicle { plat } | Confirmation::ClearTestResult { plat } => plat,
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prompt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        let delete = Confirmation::DeleteVehicle {
            plat: "B1234XYZ".to_string(),
        };
        assert_eq!(delete.prompt(), "Hapus kendaraan B1234XYZ?");
        let clear = Confirmation::ClearTestResult {
            plat: "D5678AB".to_string(),
        };
        assert_eq!(clear.to_string(), "Hapus data uji D5678AB?");
        assert_eq!(clear.plat(), "D5678AB");
    }
}
