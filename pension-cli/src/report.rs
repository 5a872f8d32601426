//! Printable simulation report.
//!
//! Lays out a [`SimulationResponse`] and the request it answers as
//! fixed-size text pages. Every figure is copied from the response; the only
//! derived value is the combined percentage shown next to its two factors.

use chrono::NaiveDate;
use pension_core::{PensionRequest, RetirementType, SimulationResponse};
use rust_decimal::Decimal;

use crate::utils::{days_as_years, format_date, format_euros, format_percentage};

pub const DEFAULT_LINES_PER_PAGE: usize = 60;
pub const PAGE_WIDTH: usize = 78;

const WATERMARK: &str = "SIMULACIÓN ORIENTATIVA";
const PAGE_SEPARATOR: &str = "\x0c\n";

/// Watermark, blank line, then after the body a blank line and two footer lines.
const RESERVED_LINES: usize = 5;
const MIN_BODY_LINES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Name printed in the issuer note and the footer.
    pub issuer: String,
    pub lines_per_page: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            issuer: "Simulador de pensiones".to_string(),
            lines_per_page: DEFAULT_LINES_PER_PAGE,
        }
    }
}

/// A laid-out report, one string per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pages: Vec<String>,
}

impl Report {
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages, separated by form feeds.
    pub fn render(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }
}

/// File name for a report, e.g. `simulacion-pension-anticipada-voluntaria-2026-10-19.txt`.
pub fn file_name(
    kind: RetirementType,
    generated_on: NaiveDate,
) -> String {
    format!(
        "simulacion-pension-{}-{}.txt",
        kind.as_str().replacen('_', "-", 1),
        generated_on.format("%Y-%m-%d")
    )
}

/// Tracks the page being filled and breaks to a new one when the next
/// block would not fit.
struct Cursor {
    pages: Vec<Vec<String>>,
    current: Vec<String>,
    capacity: usize,
}

impl Cursor {
    fn new(capacity: usize) -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            capacity,
        }
    }

    fn ensure_space(
        &mut self,
        lines: usize,
    ) {
        if !self.current.is_empty() && self.current.len() + lines > self.capacity {
            self.pages.push(std::mem::take(&mut self.current));
        }
    }

    fn line(
        &mut self,
        text: impl Into<String>,
    ) {
        self.ensure_space(1);
        self.current.push(text.into());
    }

    /// Blank separator, skipped at the top of a page.
    fn gap(&mut self) {
        if !self.current.is_empty() && self.current.len() < self.capacity {
            self.current.push(String::new());
        }
    }

    /// Word-wrapped bullet with hanging indent.
    fn bullet(
        &mut self,
        indent: usize,
        text: &str,
    ) {
        let prefix = format!("{}• ", " ".repeat(indent));
        let hanging = " ".repeat(indent + 2);
        let lines = wrap(text, PAGE_WIDTH - indent - 2);
        self.ensure_space(lines.len().min(self.capacity));
        for (i, line) in lines.into_iter().enumerate() {
            let lead = if i == 0 { &prefix } else { &hanging };
            self.line(format!("{lead}{line}"));
        }
    }

    /// Section title and rule, kept on the same page as the first
    /// `following` lines of the section.
    fn section(
        &mut self,
        title: &str,
        following: usize,
    ) {
        self.gap();
        self.ensure_space(2 + following);
        self.line(title);
        self.line("=".repeat(title.chars().count()));
    }

    fn finish(mut self) -> Vec<Vec<String>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

fn wrap(
    text: &str,
    width: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lays out the report for `response`, which must be the answer to `request`.
pub fn build_report(
    request: &PensionRequest,
    response: &SimulationResponse,
    options: &ReportOptions,
    generated_on: NaiveDate,
) -> Report {
    let capacity = options
        .lines_per_page
        .saturating_sub(RESERVED_LINES)
        .max(MIN_BODY_LINES);
    let mut cursor = Cursor::new(capacity);

    write_header(&mut cursor, response, options, generated_on);
    write_personal_data(&mut cursor, request, response);
    write_employment_data(&mut cursor, request);
    write_validation(&mut cursor, response);
    write_calculation(&mut cursor, response);

    if !response.rules_applied.is_empty() {
        cursor.section("REGLAS APLICADAS", 1);
        for rule in &response.rules_applied {
            cursor.bullet(0, rule);
        }
    }

    if !response.observations.is_empty() {
        cursor.section("OBSERVACIONES", 1);
        for observation in &response.observations {
            cursor.bullet(0, observation);
        }
    }

    let bodies = cursor.finish();
    let total = bodies.len();
    let pages = bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| decorate_page(body, i + 1, total, &options.issuer))
        .collect();

    Report { pages }
}

fn decorate_page(
    body: Vec<String>,
    number: usize,
    total: usize,
    issuer: &str,
) -> String {
    let mut lines = Vec::with_capacity(body.len() + RESERVED_LINES);
    lines.push(format!("{WATERMARK:^PAGE_WIDTH$}"));
    lines.push(String::new());
    lines.extend(body);
    lines.push(String::new());
    lines.push(format!(
        "Este documento es una simulación orientativa generada por {issuer}"
    ));

    let page = format!("Página {number} de {total}");
    let padding = PAGE_WIDTH
        .saturating_sub(issuer.chars().count() + page.chars().count())
        .max(1);
    lines.push(format!("{issuer}{}{page}", " ".repeat(padding)));

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn write_header(
    cursor: &mut Cursor,
    response: &SimulationResponse,
    options: &ReportOptions,
    generated_on: NaiveDate,
) {
    cursor.line("SIMULACIÓN DE PENSIÓN DE JUBILACIÓN");
    cursor.line("España - Sistema de Seguridad Social");
    cursor.gap();
    cursor.line(format!("Fecha del informe: {}", format_date(generated_on)));
    cursor.line(format!("Versión del sistema: {}", response.system_version));

    cursor.section(
        &format!("INFORME GENERADO POR {}", options.issuer.to_uppercase()),
        2,
    );
    cursor.line("Este documento es una simulación orientativa basada en la normativa vigente.");
    cursor.line("Para un asesoramiento personalizado, consulte con un profesional.");
}

fn write_personal_data(
    cursor: &mut Cursor,
    request: &PensionRequest,
    response: &SimulationResponse,
) {
    cursor.section("DATOS PERSONALES", 5);
    cursor.line(format!(
        "Fecha de nacimiento: {}",
        format_date(request.birth_date)
    ));
    cursor.line(format!("Sexo: {}", request.sex.label()));
    cursor.line(format!(
        "Edad en la fecha de jubilación: {:.1} años",
        response.retirement_age_years
    ));
    cursor.line(format!(
        "Fecha de jubilación deseada: {}",
        format_date(request.desired_retirement_date)
    ));
    cursor.line(format!(
        "Tipo de jubilación: {}",
        request.retirement_type.display_name()
    ));
}

fn write_employment_data(
    cursor: &mut Cursor,
    request: &PensionRequest,
) {
    cursor.section("DATOS LABORALES", 3);
    cursor.line(format!(
        "Días cotizados (total): {} días ({} años)",
        request.generic_contribution_days,
        days_as_years(request.generic_contribution_days)
    ));
    cursor.line(format!(
        "Días cotizados (últimos 15 años): {} días ({} años)",
        request.specific_contribution_days,
        days_as_years(request.specific_contribution_days)
    ));
    cursor.line(format!(
        "Base reguladora: {}",
        format_euros(request.regulatory_base)
    ));
    if request.other_annual_income > Decimal::ZERO {
        cursor.line(format!(
            "Otras rentas anuales: {}",
            format_euros(request.other_annual_income)
        ));
    }
}

fn write_validation(
    cursor: &mut Cursor,
    response: &SimulationResponse,
) {
    cursor.section("RESULTADO DE LA VALIDACIÓN", 1);
    if response.validation.is_valid {
        cursor.line("✓ SOLICITUD VÁLIDA - Cumple todos los requisitos");
    } else {
        cursor.line("✗ SOLICITUD INVÁLIDA - No cumple los requisitos");
    }

    if !response.validation.errors.is_empty() {
        cursor.gap();
        cursor.line("Errores encontrados:");
        for error in &response.validation.errors {
            cursor.bullet(2, &error.message);
        }
    }

    if !response.validation.warnings.is_empty() {
        cursor.gap();
        cursor.line("Advertencias:");
        for warning in &response.validation.warnings {
            cursor.bullet(2, warning);
        }
    }
}

fn write_calculation(
    cursor: &mut Cursor,
    response: &SimulationResponse,
) {
    let Some(calculation) = response
        .calculation
        .as_ref()
        .filter(|_| response.validation.is_valid)
    else {
        return;
    };

    cursor.section("CÁLCULO DE LA PENSIÓN", 1);
    cursor.line(format!(
        "PENSIÓN MENSUAL: {}",
        format_euros(calculation.final_pension)
    ));
    cursor.gap();

    cursor.ensure_space(10);
    cursor.line("Detalles del cálculo:");
    cursor.bullet(
        0,
        &format!(
            "PORCENTAJE TOTAL APLICABLE: {}",
            format_percentage(calculation.total_applicable_percentage())
        ),
    );
    cursor.line(format!(
        "  ({} × {})",
        format_percentage(calculation.years_contributed_percentage),
        format_percentage(calculation.early_or_deferred_percentage)
    ));
    cursor.bullet(
        0,
        &format!(
            "Porcentaje por años cotizados: {}",
            format_percentage(calculation.years_contributed_percentage)
        ),
    );
    cursor.bullet(
        0,
        &format!(
            "Porcentaje por anticipación/demora: {}",
            format_percentage(calculation.early_or_deferred_percentage)
        ),
    );
    cursor.bullet(
        0,
        &format!(
            "Pensión antes de topes: {}",
            format_euros(calculation.pension_before_caps)
        ),
    );
    cursor.bullet(
        0,
        &format!(
            "Pensión mínima aplicable: {}",
            format_euros(calculation.applicable_minimum_pension)
        ),
    );
    cursor.bullet(
        0,
        &format!(
            "Pensión máxima aplicable: {}",
            format_euros(calculation.applicable_maximum_pension)
        ),
    );
    if calculation.minimum_top_up > Decimal::ZERO {
        cursor.bullet(
            0,
            &format!(
                "Complemento a mínimos: {}",
                format_euros(calculation.minimum_top_up)
            ),
        );
    }

    let data = &calculation.type_specific_data;
    let mut specific = Vec::new();
    if let Some(lump_sum) = data.lump_sum().filter(|amount| *amount > Decimal::ZERO) {
        specific.push(format!(
            "Tanto alzado (pago único): {}",
            format_euros(lump_sum)
        ));
    }
    if let Some(months) = data.months_of_delay() {
        specific.push(format!("Meses de demora: {months}"));
    }
    if let Some(months) = data.months_of_advance() {
        specific.push(format!("Meses de anticipación: {months}"));
    }

    if !specific.is_empty() {
        cursor.gap();
        cursor.ensure_space(1 + specific.len());
        cursor.line("Información específica:");
        for line in &specific {
            cursor.bullet(2, line);
        }
    }
}
