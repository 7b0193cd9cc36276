//! CSV helpers for vehicle import and export
//!
//! The import format is the batch-upload template (`template_kendaraan.csv`).
//! Rows are numbered the way a spreadsheet shows them: the header is row 1,
//! so the first vehicle is row 2.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use emisi_domain::service::VehicleDraft;
use emisi_types::{BatchRowError, Error, FuelType, Jenis, NewVehicle, Result, Vehicle};

/// File name offered for the blank template
pub const TEMPLATE_FILE_NAME: &str = "template_kendaraan.csv";

/// Template columns, in order
pub const TEMPLATE_HEADERS: [&str; 8] = [
    "jenis",
    "plat_nomor",
    "merek",
    "tipe",
    "tahun",
    "fuel_type",
    "nama_instansi",
    "load_category",
];

/// Columns a file must have; `fuel_type` defaults to bensin and
/// `nama_instansi` to `-` when absent
const REQUIRED_COLUMNS: [&str; 6] = [
    "jenis",
    "plat_nomor",
    "merek",
    "tipe",
    "tahun",
    "load_category",
];

const EXPORT_HEADERS: [&str; 9] = [
    "plat_nomor",
    "jenis",
    "merek",
    "tipe",
    "tahun",
    "fuel_type",
    "load_category",
    "nama_instansi",
    "status_uji",
];

/// Result of checking an import file locally
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvCheck {
    /// Rows that passed, with their row number
    pub vehicles: Vec<(usize, NewVehicle)>,
    pub errors: Vec<BatchRowError>,
}

impl CsvCheck {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.vehicles.len() + self.errors.len()
    }
}

fn csv_error(e: csv::Error) -> Error {
    Error::Csv(e.to_string())
}

/// Write the header-only template
pub fn write_template<W: Write>(writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(TEMPLATE_HEADERS).map_err(csv_error)?;
    writer.flush()?;
    Ok(())
}

/// Save the template to `path`
pub fn save_template(path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_template(file)
}

/// Export loaded vehicles with their test status
pub fn write_vehicles<W: Write>(
    writer: W,
    vehicles: &[Vehicle],
    tested: &HashSet<String>,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(EXPORT_HEADERS).map_err(csv_error)?;
    for v in vehicles {
        let tahun = v.tahun.to_string();
        let status = if tested.contains(&v.plat_nomor) {
            "sudah diuji"
        } else {
            "belum diuji"
        };
        writer
            .write_record([
                v.plat_nomor.as_str(),
                v.jenis.as_str(),
                v.merek.as_str(),
                v.tipe.as_str(),
                tahun.as_str(),
                v.fuel_type.as_str(),
                v.load_category.map(|c| c.as_str()).unwrap_or(""),
                v.instansi(),
                status,
            ])
            .map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Validate an import file row by row.
///
/// Structural problems (unreadable CSV, missing columns) fail the whole
/// file; everything else is reported per row.
pub fn check_rows(content: &[u8]) -> Result<CsvCheck> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let headers = reader.headers().map_err(csv_error)?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(Error::Csv(format!("Kolom wajib tidak ada: {}", col)));
        }
    }
    let column = |name: &str| headers.iter().position(|h| h == name);
    let index: Vec<Option<usize>> = TEMPLATE_HEADERS.iter().map(|h| column(h)).collect();

    let mut check = CsvCheck::default();
    let mut seen = HashSet::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        let row = row_idx + 2;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let field = |i: usize| index[i].and_then(|c| record.get(c)).unwrap_or("");

        match parse_row(field) {
            Ok(vehicle) => {
                if seen.insert(vehicle.plat_nomor.clone()) {
                    check.vehicles.push((row, vehicle));
                } else {
                    check.errors.push(BatchRowError {
                        row,
                        error: format!("Plat nomor {} muncul lebih dari sekali", vehicle.plat_nomor),
                    });
                }
            }
            Err(error) => check.errors.push(BatchRowError { row, error }),
        }
    }
    Ok(check)
}

/// Read and check a file from disk
pub fn check_file(path: &Path) -> Result<CsvCheck> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read(path)?;
    check_rows(&content)
}

fn parse_row<'a>(field: impl Fn(usize) -> &'a str) -> std::result::Result<NewVehicle, String> {
    let jenis: Jenis = field(0).parse()?;
    let fuel_type = match field(5) {
        "" => FuelType::default(),
        raw => raw.parse()?,
    };
    let load_category = match field(7) {
        "" => None,
        raw => Some(raw.parse()?),
    };

    let mut draft = VehicleDraft {
        plat_nomor: field(1).to_string(),
        merek: field(2).to_string(),
        tipe: field(3).to_string(),
        tahun: field(4).to_string(),
        fuel_type,
        load_category,
        ..Default::default()
    };
    draft.set_jenis(jenis);
    if jenis == Jenis::Dinas {
        draft.nama_instansi = field(6).to_string();
    }
    draft.validate().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use emisi_types::LoadCategory;

    const HEADER: &str = "jenis,plat_nomor,merek,tipe,tahun,fuel_type,nama_instansi,load_category\n";

    #[test]
    fn test_template_has_all_columns() {
        let mut buf = Vec::new();
        write_template(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), HEADER);
    }

    #[test]
    fn test_save_template_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TEMPLATE_FILE_NAME);
        save_template(&path).unwrap();
        let check = check_file(&path).unwrap();
        assert_eq!(check.total_rows(), 0);
    }

    #[test]
    fn test_rows_are_numbered_from_two() {
        let csv = format!(
            "{}umum, b 1234 xyz ,Toyota,Avanza,2020,bensin,,kendaraan_penumpang\n\
             umum,D5678AB,Honda,,2019,bensin,-,kendaraan_penumpang\n\
             dinas,D9999ZZ,Isuzu,Elf,2015,solar,,>=3.5ton\n",
            HEADER
        );
        let check = check_rows(csv.as_bytes()).unwrap();
        assert_eq!(check.vehicles.len(), 1);
        assert_eq!(check.vehicles[0].0, 2);
        assert_eq!(check.vehicles[0].1.plat_nomor, "B 1234 XYZ");

        let rows: Vec<usize> = check.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![3, 4]);
        assert_eq!(check.errors[0].error, "Tipe tidak boleh kosong");
        assert_eq!(
            check.errors[1].error,
            "Nama instansi harus diisi untuk kendaraan dinas"
        );
    }

    #[test]
    fn test_fuel_mismatch_and_duplicates() {
        let csv = format!(
            "{}umum,B1,Toyota,Avanza,2020,solar,-,kendaraan_penumpang\n\
             umum,B2222BB,Toyota,Avanza,2020,diesel,-,<3.5ton\n\
             umum,b2222bb,Toyota,Avanza,2020,solar,-,<3.5ton\n",
            HEADER
        );
        let check = check_rows(csv.as_bytes()).unwrap();
        assert_eq!(check.vehicles.len(), 1);
        assert_eq!(check.vehicles[0].1.load_category, LoadCategory::BelowThreeHalfTon);
        assert_eq!(check.errors.len(), 2);
        assert!(check.errors[0].error.contains("Kategori beban tidak valid"));
        assert_eq!(check.errors[1].row, 4);
    }

    #[test]
    fn test_missing_column_fails_file() {
        let err = check_rows(b"jenis,plat_nomor,merek\numum,B1234XYZ,Toyota\n").unwrap_err();
        assert!(matches!(err, Error::Csv(msg) if msg.contains("tipe")));
    }

    #[test]
    fn test_export_marks_tested() {
        let csv = format!("{}umum,B1234XYZ,Toyota,Avanza,2020,bensin,-,kendaraan_penumpang\n", HEADER);
        let vehicles: Vec<Vehicle> = check_rows(csv.as_bytes())
            .unwrap()
            .vehicles
            .into_iter()
            .map(|(_, v)| Vehicle::from(v))
            .collect();
        let tested: HashSet<String> = ["B1234XYZ".to_string()].into_iter().collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kendaraan.csv");
        write_vehicles(File::create(&path).unwrap(), &vehicles, &tested).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "B1234XYZ,umum,Toyota,Avanza,2020,bensin,kendaraan_penumpang,-,sudah diuji"
        );
    }
}
