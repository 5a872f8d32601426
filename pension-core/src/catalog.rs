//! Descriptive metadata for each retirement modality.
//!
//! Static text shown to users before they simulate; nothing here is
//! computed from the policy tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::RetirementType;

/// Summary of one modality (`TipoJubilacionInfo`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementTypeInfo {
    pub tipo: RetirementType,
    pub nombre: String,
    pub descripcion: String,
    pub edad_minima: String,
    pub requisitos: Vec<String>,
}

/// Detailed requirements of one modality (`RequisitosTipo`).
///
/// `extra` holds the fields that only some modalities have; they are
/// serialized alongside the common ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRequirements {
    pub carencia_generica: String,
    pub carencia_especifica: String,
    pub edad: String,
    pub observaciones: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

const SPECIFIC_CONTRIBUTION: &str = "2 años dentro de los últimos 15 años";

/// All modalities, in presentation order.
pub fn list_retirement_types() -> Vec<RetirementTypeInfo> {
    RetirementType::ALL.iter().map(|&kind| describe(kind)).collect()
}

/// Summary of a single modality.
pub fn describe(kind: RetirementType) -> RetirementTypeInfo {
    let (descripcion, edad_minima, requisitos): (&str, &str, &[&str]) = match kind {
        RetirementType::Ordinary => (
            "Jubilación a la edad ordinaria establecida según el año y los años cotizados",
            "Entre 65 y 67 años según años cotizados",
            &[
                "Mínimo 15 años cotizados",
                "2 años cotizados dentro de los últimos 15",
                "Haber alcanzado la edad ordinaria de jubilación",
            ],
        ),
        RetirementType::VoluntaryEarly => (
            "Jubilación anticipada por voluntad del trabajador, con coeficientes reductores",
            "Hasta 2 años antes de la edad ordinaria",
            &[
                "Mínimo 35 años cotizados",
                "2 años cotizados dentro de los últimos 15",
                "La pensión resultante debe superar la pensión mínima",
            ],
        ),
        RetirementType::InvoluntaryEarly => (
            "Jubilación anticipada por cese no voluntario en el trabajo",
            "Hasta 4 años antes de la edad ordinaria",
            &[
                "Mínimo 33 años cotizados",
                "2 años cotizados dentro de los últimos 15",
                "Cese involuntario en el trabajo debidamente acreditado",
            ],
        ),
        RetirementType::Partial => (
            "Compatibiliza la pensión con un trabajo a tiempo parcial",
            "Desde los 62 años con contrato de relevo",
            &[
                "Mínimo 15 años cotizados",
                "Reducción de jornada entre el 25% y el 75%",
                "Contrato de relevo para anticipar la edad",
            ],
        ),
        RetirementType::Deferred => (
            "Jubilación posterior a la edad ordinaria con incremento de la pensión",
            "A partir de la edad ordinaria",
            &[
                "Mínimo 15 años cotizados",
                "Haber superado la edad ordinaria de jubilación",
                "Al menos un mes de demora",
            ],
        ),
    };

    RetirementTypeInfo {
        tipo: kind,
        nombre: kind.display_name().to_string(),
        descripcion: descripcion.to_string(),
        edad_minima: edad_minima.to_string(),
        requisitos: requisitos.iter().map(|r| r.to_string()).collect(),
    }
}

/// Detailed requirements of a modality.
pub fn requirements_for(kind: RetirementType) -> TypeRequirements {
    let (carencia_generica, edad, observaciones, extra): (&str, &str, &str, &[(&str, &str)]) =
        match kind {
            RetirementType::Ordinary => (
                "15 años",
                "Edad ordinaria según el año de jubilación (65 a 67 años)",
                "La edad ordinaria varía según el año de jubilación y los años cotizados; a partir de 37 años cotizados se reduce progresivamente",
                &[],
            ),
            RetirementType::VoluntaryEarly => (
                "35 años",
                "Hasta 2 años antes de la edad ordinaria",
                "Se aplican coeficientes reductores que varían según los años cotizados",
                &[
                    ("coeficiente_reductor", "Entre 1,625% y 2% por trimestre de anticipación"),
                    (
                        "pension_minima",
                        "La pensión debe superar la mínima que correspondería a la edad ordinaria",
                    ),
                ],
            ),
            RetirementType::InvoluntaryEarly => (
                "33 años",
                "Hasta 4 años antes de la edad ordinaria",
                "Coeficientes reductores más favorables que la jubilación anticipada voluntaria",
                &[
                    ("coeficiente_reductor", "Entre 1,5% y 1,875% por trimestre de anticipación"),
                    ("causa_cese", "Cese involuntario en el trabajo, que debe acreditarse"),
                ],
            ),
            RetirementType::Partial => (
                "15 años",
                "62 años con contrato de relevo; edad ordinaria sin él",
                "Permite compatibilizar la pensión con un trabajo a tiempo parcial",
                &[
                    ("reduccion_jornada", "Entre el 25% y el 75%"),
                    ("antiguedad_empresa", "6 años con contrato de relevo"),
                    ("base_relevista", "Al menos el 65% de la base de cotización del jubilado"),
                ],
            ),
            RetirementType::Deferred => (
                "15 años",
                "Superior a la edad ordinaria",
                "Incremento del 4% por cada año completo de demora, o cobro como tanto alzado",
                &[
                    ("incremento_anual", "4% por año completo de demora"),
                    ("opciones", "Porcentual, tanto alzado o mixta"),
                ],
            ),
        };

    TypeRequirements {
        carencia_generica: carencia_generica.to_string(),
        carencia_especifica: SPECIFIC_CONTRIBUTION.to_string(),
        edad: edad.to_string(),
        observaciones: observaciones.to_string(),
        extra: extra
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn lists_every_type_in_order() {
        let types: Vec<RetirementType> = list_retirement_types().iter().map(|t| t.tipo).collect();

        assert_eq!(types, RetirementType::ALL.to_vec());
    }

    #[test]
    fn info_uses_display_name() {
        let info = describe(RetirementType::Deferred);

        assert_eq!(info.nombre, "Jubilación Demorada");
        assert_eq!(info.requisitos.len(), 3);
    }

    #[test]
    fn every_type_has_requirements() {
        for kind in RetirementType::ALL {
            let requirements = requirements_for(kind);

            assert!(!requirements.carencia_generica.is_empty());
            assert!(!requirements.edad.is_empty());
            assert_eq!(requirements.carencia_especifica, SPECIFIC_CONTRIBUTION);
        }
    }

    #[test]
    fn extra_fields_are_flattened() {
        let value = serde_json::to_value(requirements_for(RetirementType::Partial)).unwrap();

        assert_eq!(value["carencia_generica"], json!("15 años"));
        assert_eq!(value["reduccion_jornada"], json!("Entre el 25% y el 75%"));
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn ordinary_has_no_extra_fields() {
        assert!(requirements_for(RetirementType::Ordinary).extra.is_empty());
    }

    #[test]
    fn info_serializes_wire_type() {
        let value = serde_json::to_value(describe(RetirementType::InvoluntaryEarly)).unwrap();

        assert_eq!(value["tipo"], json!("anticipada_involuntaria"));
    }
}
