//! CSV loader for batches of simulation requests.
//!
//! ## CSV Format
//!
//! Column order does **not** matter (headers are matched by name). Header
//! names are case-sensitive; whitespace around headers and values is
//! trimmed.
//!
//! | Column                        | Required | Type    | Notes                                        |
//! |-------------------------------|----------|---------|----------------------------------------------|
//! | `fecha_nacimiento`            | yes      | date    | `YYYY-MM-DD`                                 |
//! | `fecha_jubilacion_deseada`    | yes      | date    | `YYYY-MM-DD`                                 |
//! | `sexo`                        | yes      | string  | `M` or `F`                                   |
//! | `carencia_generica`           | yes      | integer | total days contributed                       |
//! | `carencia_especifica`         | yes      | integer | days contributed in the last 15 years        |
//! | `base_reguladora`             | yes      | decimal | e.g. `1800.00`                               |
//! | `tipo_jubilacion`             | yes      | string  | see below                                    |
//! | `otras_rentas_anuales`        | no       | decimal | defaults to `0`                              |
//! | `parcial_porcentaje_reduccion`| no       | decimal | `parcial` only, defaults to `25`             |
//! | `parcial_contrato_relevo`     | no       | bool    | `parcial` only, defaults to `false`          |
//! | `parcial_salario_compatible`  | no       | decimal | `parcial` only                               |
//! | `parcial_antiguedad_empresa`  | no       | decimal | `parcial` only, years                        |
//! | `parcial_base_relevista`      | no       | decimal | `parcial` only, percentage                   |
//! | `parcial_meses_relevo`        | no       | integer | `parcial` only                               |
//! | `demorada_meses_retraso`      | no       | integer | `demorada` only, defaults to `12`            |
//! | `demorada_opcion_incremento`  | no       | string  | `porcentual`, `tanto_alzado` or `mixto`; defaults to `porcentual` |
//!
//! ### Retirement types
//!
//! `ordinaria`, `anticipada_voluntaria`, `anticipada_involuntaria`,
//! `parcial`, `demorada`.
//!
//! ### Minimal example
//!
//! ```csv
//! fecha_nacimiento,fecha_jubilacion_deseada,sexo,carencia_generica,carencia_especifica,base_reguladora,tipo_jubilacion
//! 1960-03-15,2027-03-15,F,13140,5000,1800.00,ordinaria
//! ```
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pension_core::{
    DeferredDetails, IncrementOption, PartialDetails, PensionRequest, RetirementType, Sex,
};
use rust_decimal::Decimal;
use serde::Deserialize;

const DEFAULT_REDUCTION_PERCENTAGE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);
const DEFAULT_MONTHS_OF_DELAY: u32 = 12;

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout exactly
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    fecha_nacimiento: NaiveDate,
    fecha_jubilacion_deseada: NaiveDate,
    sexo: String,
    carencia_generica: i32,
    carencia_especifica: i32,
    base_reguladora: Decimal,
    tipo_jubilacion: String,
    otras_rentas_anuales: Option<Decimal>,
    parcial_porcentaje_reduccion: Option<Decimal>,
    parcial_contrato_relevo: Option<bool>,
    parcial_salario_compatible: Option<Decimal>,
    parcial_antiguedad_empresa: Option<Decimal>,
    parcial_base_relevista: Option<Decimal>,
    parcial_meses_relevo: Option<u32>,
    demorada_meses_retraso: Option<u32>,
    demorada_opcion_incremento: Option<String>,
}

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or converting request CSV data.
///
/// `row` is always 1-based, counting data rows only (header = row 0).
#[derive(Debug, thiserror::Error)]
pub enum RequestCsvError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad structure, missing required column, type mismatch, etc.
    #[error("CSV parse error on row {row}: {source}")]
    Parse {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("unrecognised sex '{value}' on row {row} (expected M or F)")]
    InvalidSex { value: String, row: usize },

    #[error("unrecognised retirement type '{value}' on row {row}")]
    InvalidRetirementType { value: String, row: usize },

    #[error("unrecognised increment option '{value}' on row {row}")]
    InvalidIncrementOption { value: String, row: usize },
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

/// Convert a single CSV row into a [`PensionRequest`].
///
/// Type-specific columns are only read for their own retirement type; the
/// rest are ignored so one file can mix every type.
fn convert_row(
    row: CsvRow,
    row_number: usize,
) -> Result<PensionRequest, RequestCsvError> {
    let sex = Sex::parse(&row.sexo).ok_or_else(|| RequestCsvError::InvalidSex {
        value: row.sexo.clone(),
        row: row_number,
    })?;

    let retirement_type = RetirementType::parse(&row.tipo_jubilacion).ok_or_else(|| {
        RequestCsvError::InvalidRetirementType {
            value: row.tipo_jubilacion.clone(),
            row: row_number,
        }
    })?;

    let partial_details = (retirement_type == RetirementType::Partial).then(|| PartialDetails {
        reduction_percentage: row
            .parcial_porcentaje_reduccion
            .unwrap_or(DEFAULT_REDUCTION_PERCENTAGE),
        relay_contract: row.parcial_contrato_relevo.unwrap_or(false),
        compatible_salary: row.parcial_salario_compatible,
        seniority_years: row.parcial_antiguedad_empresa,
        relay_base_percentage: row.parcial_base_relevista,
        relay_maintenance_months: row.parcial_meses_relevo,
    });

    let deferred_details = if retirement_type == RetirementType::Deferred {
        let increment_option = match row.demorada_opcion_incremento.as_deref() {
            None | Some("") => IncrementOption::Percentage,
            Some(value) => IncrementOption::parse(value).ok_or_else(|| {
                RequestCsvError::InvalidIncrementOption {
                    value: value.to_string(),
                    row: row_number,
                }
            })?,
        };
        Some(DeferredDetails {
            months_of_delay: row.demorada_meses_retraso.unwrap_or(DEFAULT_MONTHS_OF_DELAY),
            increment_option,
        })
    } else {
        None
    };

    Ok(PensionRequest {
        birth_date: row.fecha_nacimiento,
        desired_retirement_date: row.fecha_jubilacion_deseada,
        sex,
        generic_contribution_days: row.carencia_generica,
        specific_contribution_days: row.carencia_especifica,
        regulatory_base: row.base_reguladora,
        retirement_type,
        other_annual_income: row.otras_rentas_anuales.unwrap_or(Decimal::ZERO),
        partial_details,
        deferred_details,
    })
}

/// Parse CSV text and return one request per data row, in file order.
///
/// # Errors
///
/// * [`RequestCsvError::Parse`] if the CSV is structurally invalid or a
///   field cannot be deserialised.
/// * [`RequestCsvError::InvalidSex`], [`RequestCsvError::InvalidRetirementType`]
///   or [`RequestCsvError::InvalidIncrementOption`] for unrecognised codes.
pub fn load_from_str(input: &str) -> Result<Vec<PensionRequest>, RequestCsvError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row_number = idx + 1;
            let row = result.map_err(|source| RequestCsvError::Parse {
                row: row_number,
                source,
            })?;
            convert_row(row, row_number)
        })
        .collect()
}

/// Read a file from disk and delegate to [`load_from_str`].
pub fn load_from_file(path: &Path) -> Result<Vec<PensionRequest>, RequestCsvError> {
    let contents = std::fs::read_to_string(path).map_err(|source| RequestCsvError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const HEADER: &str = "fecha_nacimiento,fecha_jubilacion_deseada,sexo,carencia_generica,carencia_especifica,base_reguladora,tipo_jubilacion";

    fn csv_with(rows: &[&str]) -> String {
        let mut csv = HEADER.to_string();
        for row in rows {
            csv.push('\n');
            csv.push_str(row);
        }
        csv.push('\n');
        csv
    }

    // -----------------------------------------------------------------------
    // Required columns only
    // -----------------------------------------------------------------------

    #[test]
    fn minimal_row_parses_required_fields() {
        let csv = csv_with(&["1960-03-15,2027-03-15,F,13140,5000,1800.00,ordinaria"]);

        let requests = load_from_str(&csv).expect("should parse minimal CSV");

        assert_eq!(requests.len(), 1);
        let r = &requests[0];
        assert_eq!(r.birth_date, NaiveDate::from_ymd_opt(1960, 3, 15).unwrap());
        assert_eq!(r.desired_retirement_date, NaiveDate::from_ymd_opt(2027, 3, 15).unwrap());
        assert_eq!(r.sex, Sex::Female);
        assert_eq!(r.generic_contribution_days, 13140);
        assert_eq!(r.specific_contribution_days, 5000);
        assert_eq!(r.regulatory_base, dec!(1800.00));
        assert_eq!(r.retirement_type, RetirementType::Ordinary);
        assert_eq!(r.other_annual_income, Decimal::ZERO);
        assert!(r.partial_details.is_none());
        assert!(r.deferred_details.is_none());
    }

    // -----------------------------------------------------------------------
    // Type-specific defaults
    // -----------------------------------------------------------------------

    #[test]
    fn partial_row_gets_default_details() {
        let csv = csv_with(&["1963-01-01,2026-12-01,M,14000,5000,2000,parcial"]);

        let requests = load_from_str(&csv).expect("should parse");

        assert_eq!(
            requests[0].partial_details,
            Some(PartialDetails {
                reduction_percentage: dec!(25),
                relay_contract: false,
                compatible_salary: None,
                seniority_years: None,
                relay_base_percentage: None,
                relay_maintenance_months: None,
            })
        );
    }

    #[test]
    fn deferred_row_gets_default_details() {
        let csv = csv_with(&["1958-03-15,2027-03-15,M,14600,5000,2000,demorada"]);

        let requests = load_from_str(&csv).expect("should parse");

        assert_eq!(
            requests[0].deferred_details,
            Some(DeferredDetails {
                months_of_delay: 12,
                increment_option: IncrementOption::Percentage,
            })
        );
    }

    #[test]
    fn optional_columns_override_defaults() {
        let csv = "\
fecha_nacimiento,fecha_jubilacion_deseada,sexo,carencia_generica,carencia_especifica,base_reguladora,tipo_jubilacion,otras_rentas_anuales,parcial_porcentaje_reduccion,parcial_contrato_relevo,parcial_antiguedad_empresa,parcial_base_relevista,demorada_meses_retraso,demorada_opcion_incremento
1963-01-01,2026-12-01,M,14000,5000,2000,parcial,1200.50,50,true,10,80,,
1958-03-15,2027-03-15,F,14600,5000,2000,demorada,,,,,,24,tanto_alzado
";

        let requests = load_from_str(csv).expect("should parse");

        assert_eq!(requests[0].other_annual_income, dec!(1200.50));
        let partial = requests[0].partial_details.as_ref().unwrap();
        assert_eq!(partial.reduction_percentage, dec!(50));
        assert!(partial.relay_contract);
        assert_eq!(partial.seniority_years, Some(dec!(10)));
        assert_eq!(partial.relay_base_percentage, Some(dec!(80)));
        assert!(requests[0].deferred_details.is_none());

        let deferred = requests[1].deferred_details.as_ref().unwrap();
        assert_eq!(deferred.months_of_delay, 24);
        assert_eq!(deferred.increment_option, IncrementOption::LumpSum);
        assert!(requests[1].partial_details.is_none());
    }

    #[test]
    fn type_specific_columns_ignored_for_other_types() {
        let csv = "\
fecha_nacimiento,fecha_jubilacion_deseada,sexo,carencia_generica,carencia_especifica,base_reguladora,tipo_jubilacion,demorada_meses_retraso
1960-03-15,2027-03-15,F,13140,5000,1800,ordinaria,24
";

        let requests = load_from_str(csv).expect("should parse");

        assert!(requests[0].deferred_details.is_none());
    }

    // -----------------------------------------------------------------------
    // Errors carry the row number
    // -----------------------------------------------------------------------

    #[test]
    fn invalid_retirement_type_on_second_row_reports_correct_row() {
        let csv = csv_with(&[
            "1960-03-15,2027-03-15,F,13140,5000,1800,ordinaria",
            "1960-03-15,2027-03-15,F,13140,5000,1800,jubilada",
        ]);

        match load_from_str(&csv).unwrap_err() {
            RequestCsvError::InvalidRetirementType { value, row } => {
                assert_eq!(value, "jubilada");
                assert_eq!(row, 2);
            }
            other => panic!("expected InvalidRetirementType, got {:?}", other),
        }
    }

    #[test]
    fn invalid_sex_returns_error() {
        let csv = csv_with(&["1960-03-15,2027-03-15,X,13140,5000,1800,ordinaria"]);

        match load_from_str(&csv).unwrap_err() {
            RequestCsvError::InvalidSex { value, row } => {
                assert_eq!(value, "X");
                assert_eq!(row, 1);
            }
            other => panic!("expected InvalidSex, got {:?}", other),
        }
    }

    #[test]
    fn invalid_increment_option_returns_error() {
        let csv = "\
fecha_nacimiento,fecha_jubilacion_deseada,sexo,carencia_generica,carencia_especifica,base_reguladora,tipo_jubilacion,demorada_opcion_incremento
1958-03-15,2027-03-15,F,14600,5000,2000,demorada,doble
";

        assert!(matches!(
            load_from_str(csv),
            Err(RequestCsvError::InvalidIncrementOption { row: 1, .. })
        ));
    }

    #[test]
    fn bad_date_is_a_parse_error_with_row() {
        let csv = csv_with(&[
            "1960-03-15,2027-03-15,F,13140,5000,1800,ordinaria",
            "1960-03-15,2027-03-15,F,13140,5000,1800,ordinaria",
            "15/03/1960,2027-03-15,F,13140,5000,1800,ordinaria",
        ]);

        match load_from_str(&csv).unwrap_err() {
            RequestCsvError::Parse { row, .. } => assert_eq!(row, 3),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_required_column_returns_parse_error() {
        let csv = "fecha_nacimiento,sexo\n1960-03-15,F\n";

        assert!(matches!(
            load_from_str(csv),
            Err(RequestCsvError::Parse { row: 1, .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Layout tolerance
    // -----------------------------------------------------------------------

    #[test]
    fn header_only_csv_yields_no_requests() {
        let requests = load_from_str(&csv_with(&[])).expect("header-only CSV is valid");

        assert!(requests.is_empty());
    }

    #[test]
    fn whitespace_and_column_order_are_tolerated() {
        let csv = "\
tipo_jubilacion , base_reguladora , sexo , fecha_jubilacion_deseada , fecha_nacimiento , carencia_especifica , carencia_generica
anticipada_voluntaria , 2100.75 , M , 2026-11-01 , 1961-03-15 , 5000 , 13870
";

        let requests = load_from_str(csv).expect("should tolerate whitespace and order");

        assert_eq!(requests[0].retirement_type, RetirementType::VoluntaryEarly);
        assert_eq!(requests[0].regulatory_base, dec!(2100.75));
        assert_eq!(requests[0].generic_contribution_days, 13870);
    }
}
