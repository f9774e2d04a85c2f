// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk lead import from CSV.
//!
//! Preview validates every row without writing anything. Import re-runs the
//! same validation and writes all rows in one transaction, or none.
//! Imported leads start in `pending` like any other submission.

use std::collections::{HashMap, HashSet};

use csv::StringRecord;
use leadhub_audit::{AuditEvent, AuditSubject, Cause};
use leadhub_domain::{Lead, LeadSource, NewLead};
use leadhub_persistence::SqlitePersistence;
use num_traits::ToPrimitive;
use time::OffsetDateTime;
use tracing::info;

use crate::auth::{AuthenticatedActor, AuthorizationService};
use crate::error::ApiError;
use crate::handlers::{operator_event, parse_date, snapshot};
use crate::request_response::{
    CsvImportRequest, CsvImportResponse, CsvPreviewResponse, CsvPreviewRow, CsvRowStatus,
};

const REQUIRED_HEADERS: &[&str] = &[
    "customer_name",
    "customer_email",
    "customer_phone",
    "category",
    "location",
];

/// Largest number of rows accepted in one upload.
const MAX_ROWS: usize = 5_000;

fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase().replace(' ', "_")
}

fn validate_headers(headers: &StringRecord) -> Result<HashMap<String, usize>, ApiError> {
    let header_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| (normalize_header(header), idx))
        .collect();

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|required| !header_map.contains_key(*required))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::InvalidCsvFormat {
            reason: format!("Missing required headers: {}", missing.join(", ")),
        });
    }
    Ok(header_map)
}

/// Converts a dollar amount such as `250` or `1,299.50` to cents.
fn parse_budget(raw: &str) -> Result<i64, String> {
    let cleaned: String = raw.trim().trim_start_matches('$').replace(',', "");
    let dollars: f64 = cleaned
        .parse::<f64>()
        .map_err(|_| format!("budget: '{raw}' is not a dollar amount"))?;
    if !dollars.is_finite() || dollars < 0.0 {
        return Err(format!("budget: '{raw}' must be a non-negative amount"));
    }
    (dollars * 100.0)
        .round()
        .to_i64()
        .ok_or_else(|| format!("budget: '{raw}' is too large"))
}

struct ParsedRow {
    preview: CsvPreviewRow,
    lead: Option<Lead>,
}

fn parse_row(
    row_number: usize,
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    now: OffsetDateTime,
) -> ParsedRow {
    let field = |name: &str| -> Option<String> {
        header_map
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    };

    let mut errors: Vec<String> = Vec::new();
    let mut required = |name: &str| -> String {
        field(name).unwrap_or_else(|| {
            errors.push(format!("{name}: required field is missing or empty"));
            String::new()
        })
    };
    let customer_name: String = required("customer_name");
    let customer_email: String = required("customer_email");
    let customer_phone: String = required("customer_phone");
    let category: String = required("category");
    let location: String = required("location");

    let budget_cents: Option<i64> = field("budget").and_then(|raw| {
        parse_budget(&raw)
            .map_err(|e| errors.push(e))
            .ok()
    });
    let preferred_date = field("preferred_date").and_then(|raw| {
        parse_date("preferred_date", &raw)
            .map_err(|e| errors.push(e.to_string()))
            .ok()
    });

    let mut lead: Option<Lead> = None;
    if errors.is_empty() {
        let input: NewLead = NewLead {
            customer_name: customer_name.clone(),
            customer_email: customer_email.clone(),
            customer_phone,
            category: category.clone(),
            location: location.clone(),
            description: field("description").unwrap_or_default(),
            budget_cents,
            preferred_date,
        };
        match Lead::submit(&input, LeadSource::Import, now) {
            Ok(valid) => lead = Some(valid),
            Err(e) => errors.push(e.to_string()),
        }
    }

    let status: CsvRowStatus = if errors.is_empty() {
        CsvRowStatus::Valid
    } else {
        CsvRowStatus::Invalid
    };
    ParsedRow {
        preview: CsvPreviewRow {
            row_number,
            customer_name: Some(customer_name).filter(|s| !s.is_empty()),
            customer_email: lead
                .as_ref()
                .map(|l| l.customer_email.clone())
                .or_else(|| Some(customer_email).filter(|s| !s.is_empty())),
            category: lead
                .as_ref()
                .map(|l| l.category.as_str().to_string())
                .or_else(|| Some(category).filter(|s| !s.is_empty())),
            location: Some(location).filter(|s| !s.is_empty()),
            budget_cents,
            status,
            errors,
        },
        lead,
    }
}

fn parse_csv(csv_content: &str, now: OffsetDateTime) -> Result<Vec<ParsedRow>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(csv_content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| ApiError::InvalidCsvFormat {
            reason: format!("Failed to read CSV headers: {e}"),
        })?
        .clone();
    let header_map: HashMap<String, usize> = validate_headers(&headers)?;

    let mut rows: Vec<ParsedRow> = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (idx, result) in reader.records().enumerate() {
        let row_number: usize = idx + 1;
        if row_number > MAX_ROWS {
            return Err(ApiError::InvalidCsvFormat {
                reason: format!("At most {MAX_ROWS} rows can be imported at once"),
            });
        }

        let mut row: ParsedRow = match result {
            Ok(record) => parse_row(row_number, &record, &header_map, now),
            Err(e) => ParsedRow {
                preview: CsvPreviewRow {
                    row_number,
                    customer_name: None,
                    customer_email: None,
                    category: None,
                    location: None,
                    budget_cents: None,
                    status: CsvRowStatus::Invalid,
                    errors: vec![format!("CSV parse error: {e}")],
                },
                lead: None,
            },
        };

        if let Some(lead) = &row.lead {
            let key: (String, String) = (
                lead.customer_email.clone(),
                lead.category.as_str().to_string(),
            );
            if !seen.insert(key) {
                row.preview.status = CsvRowStatus::Duplicate;
                row.preview.errors.push(String::from(
                    "Same customer email and category as an earlier row",
                ));
                row.lead = None;
            }
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Validates an upload and reports per-row results. Nothing is written.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the file has no usable
/// header row.
pub fn preview_csv_leads(
    request: &CsvImportRequest,
    actor: &AuthenticatedActor,
    now: OffsetDateTime,
) -> Result<CsvPreviewResponse, ApiError> {
    AuthorizationService::require_admin(actor, "preview lead import")?;
    let rows: Vec<CsvPreviewRow> = parse_csv(&request.csv_content, now)?
        .into_iter()
        .map(|row| row.preview)
        .collect();

    let valid_count: usize = rows
        .iter()
        .filter(|row| row.status == CsvRowStatus::Valid)
        .count();
    Ok(CsvPreviewResponse {
        total_rows: rows.len(),
        valid_count,
        invalid_count: rows.len() - valid_count,
        rows,
    })
}

/// Imports every row of an upload, or nothing if any row is invalid.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the file is empty or
/// malformed, any row fails validation, or the insert fails.
pub fn import_csv_leads(
    persistence: &mut SqlitePersistence,
    request: &CsvImportRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
    now: OffsetDateTime,
) -> Result<CsvImportResponse, ApiError> {
    AuthorizationService::require_admin(actor, "import leads")?;
    let rows: Vec<ParsedRow> = parse_csv(&request.csv_content, now)?;
    if rows.is_empty() {
        return Err(ApiError::InvalidCsvFormat {
            reason: String::from("The file contains no data rows"),
        });
    }

    let failed: Vec<usize> = rows
        .iter()
        .filter(|row| row.lead.is_none())
        .map(|row| row.preview.row_number)
        .collect();
    if !failed.is_empty() {
        let listed: Vec<String> = failed.iter().map(ToString::to_string).collect();
        return Err(ApiError::InvalidCsvFormat {
            reason: format!(
                "{} rows failed validation (rows {}); nothing was imported",
                failed.len(),
                listed.join(", ")
            ),
        });
    }

    let leads: Vec<Lead> = rows.into_iter().filter_map(|row| row.lead).collect();
    let event: AuditEvent = operator_event(
        actor,
        cause,
        "ImportLeads",
        format!("Imported {} leads from CSV", leads.len()),
        snapshot("none"),
        snapshot(format!("imported={}", leads.len())),
        AuditSubject::Global,
    );
    let (lead_ids, event_id) =
        persistence.insert_leads(&leads, &event, Some(actor.operator_id), now)?;

    info!(
        count = lead_ids.len(),
        operator_id = actor.operator_id,
        "Leads imported from CSV"
    );
    Ok(CsvImportResponse {
        imported_count: lead_ids.len(),
        lead_ids,
        event_id,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-04-01 10:00 UTC);

    #[test]
    fn test_budget_parsing() {
        assert_eq!(parse_budget("250"), Ok(25_000));
        assert_eq!(parse_budget("$1,299.50"), Ok(129_950));
        assert!(parse_budget("-5").is_err());
        assert!(parse_budget("lots").is_err());
    }

    #[test]
    fn test_headers_are_case_and_space_insensitive() {
        let csv: &str = "Customer Name,CUSTOMER_EMAIL,customer phone,Category,Location\n\
                         Ana Diaz,ana@example.com,555-010-2000,plumbing,Austin\n";
        let rows: Vec<ParsedRow> = parse_csv(csv, NOW).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].preview.status, CsvRowStatus::Valid);
        assert_eq!(rows[0].lead.as_ref().unwrap().source, LeadSource::Import);
    }

    #[test]
    fn test_missing_headers_rejects_file() {
        let err: ApiError = parse_csv("customer_name,category\nAna,plumbing\n", NOW)
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::InvalidCsvFormat { reason } if reason.contains("customer_email")));
    }

    #[test]
    fn test_duplicates_within_file_are_flagged() {
        let csv: &str = "customer_name,customer_email,customer_phone,category,location\n\
                         Ana Diaz,ana@example.com,555-010-2000,plumbing,Austin\n\
                         Ana D,ANA@example.com,555-010-2001,Plumbing,Austin\n\
                         Ana Diaz,ana@example.com,555-010-2000,roofing,Austin\n";
        let rows: Vec<ParsedRow> = parse_csv(csv, NOW).unwrap();
        let statuses: Vec<CsvRowStatus> = rows.iter().map(|r| r.preview.status).collect();
        assert_eq!(
            statuses,
            vec![
                CsvRowStatus::Valid,
                CsvRowStatus::Duplicate,
                CsvRowStatus::Valid
            ]
        );
    }

    #[test]
    fn test_invalid_row_collects_every_error() {
        let csv: &str = "customer_name,customer_email,customer_phone,category,location,budget,preferred_date\n\
                         ,ana@example.com,555-010-2000,plumbing,Austin,abc,05/01/2026\n";
        let rows: Vec<ParsedRow> = parse_csv(csv, NOW).unwrap();
        let preview: &CsvPreviewRow = &rows[0].preview;
        assert_eq!(preview.status, CsvRowStatus::Invalid);
        assert_eq!(preview.errors.len(), 3);
        assert!(rows[0].lead.is_none());
    }
}
