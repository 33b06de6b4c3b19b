//! # Validation Module
//!
//! Input validation for Parlour.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Browser form checks (out of tree)                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: axum handler                                                  │
//! │  ├── JSON deserialization                                               │
//! │  └── THIS MODULE: field and business rule checks                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite (NOT NULL, UNIQUE, FOREIGN KEY, CHECK)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each input type gets a `validate()` that runs the field validators in
//! order and stops at the first failure.

use crate::error::ValidationError;
use crate::types::{
    CustomerInput, DocumentLineInput, EngineerInput, InventoryItemInput, InvoiceInput, JobInput,
    JobItemInput, PaymentInput, QuoteInput, SettingsInput,
};
use crate::{MAX_LINE_ITEMS, MAX_LINE_QUANTITY_UNITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 4000;
pub const MAX_PART_NUMBER_LEN: usize = 50;
pub const MAX_PREFIX_LEN: usize = 10;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required name-like field.
///
/// ```rust
/// use parlour_core::validation::validate_name;
///
/// assert!(validate_name("name", "Hill Farm").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional free-text field against a length limit.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates an email address.
///
/// ## Rules
/// - One `@` with a non-empty local part
/// - Domain contains a dot that is not at either end
/// - No whitespace
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let invalid = || ValidationError::invalid_format("email", "must look like name@example.com");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a UK postcode (`SA31 1AA`, `SW1A 2AA`, `M1 1AE`).
///
/// Case and inner spacing are not significant.
pub fn validate_postcode(postcode: &str) -> ValidationResult<()> {
    let compact: String = postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    let invalid = || ValidationError::invalid_format("postcode", "must be a UK postcode");

    if !(5..=7).contains(&compact.len()) || !compact.is_ascii() {
        return Err(invalid());
    }

    // Inward code: digit + two letters
    let (outward, inward) = compact.split_at(compact.len() - 3);
    let inward: Vec<char> = inward.chars().collect();
    if !inward[0].is_ascii_digit() || !inward[1].is_ascii_alphabetic() || !inward[2].is_ascii_alphabetic() {
        return Err(invalid());
    }

    // Outward code: starts with a letter, alphanumeric, contains a digit
    let starts_with_letter = outward.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter
        || !outward.chars().all(|c| c.is_ascii_alphanumeric())
        || !outward.chars().any(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a part number.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, numbers, hyphens, underscores, dots and slashes
///
/// ```rust
/// use parlour_core::validation::validate_part_number;
///
/// assert!(validate_part_number("CL-100/A").is_ok());
/// assert!(validate_part_number("has space").is_err());
/// ```
pub fn validate_part_number(part_number: &str) -> ValidationResult<()> {
    let part_number = part_number.trim();

    if part_number.is_empty() {
        return Err(ValidationError::required("partNumber"));
    }

    if part_number.len() > MAX_PART_NUMBER_LEN {
        return Err(ValidationError::TooLong {
            field: "partNumber".to_string(),
            max: MAX_PART_NUMBER_LEN,
        });
    }

    if !part_number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
    {
        return Err(ValidationError::invalid_format(
            "partNumber",
            "must contain only letters, numbers, and - _ . /",
        ));
    }

    Ok(())
}

/// Validates a document number prefix (`INV`, `QUO`, ...).
pub fn validate_prefix(field: &str, prefix: &str) -> ValidationResult<()> {
    let prefix = prefix.trim();

    if prefix.is_empty() {
        return Err(ValidationError::required(field));
    }

    if prefix.len() > MAX_PREFIX_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_PREFIX_LEN,
        });
    }

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::invalid_format(field, "letters, numbers and dashes only"));
    }

    Ok(())
}

/// Validates an outbound webhook URL. Only http and https are accepted.
pub fn validate_webhook_url(raw: &str) -> ValidationResult<()> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| ValidationError::invalid_format("reminderWebhookUrl", e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::NotAllowed {
            field: "reminderWebhookUrl".to_string(),
            allowed: vec!["http".to_string(), "https".to_string()],
        });
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::invalid_format("reminderWebhookUrl", "missing host"));
    }

    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    uuid::Uuid::parse_str(id.trim())
        .map_err(|_| ValidationError::invalid_format(field, "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in pence. Zero is allowed (free of charge lines).
pub fn validate_price_pence(field: &str, pence: i64) -> ValidationResult<()> {
    if pence < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a line quantity in hundredths.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed [`MAX_LINE_QUANTITY_UNITS`] whole units
pub fn validate_quantity_hundredths(hundredths: i64) -> ValidationResult<()> {
    if hundredths <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    let max = MAX_LINE_QUANTITY_UNITS * 100;
    if hundredths > max {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max,
        });
    }

    Ok(())
}

pub fn validate_payment_amount(pence: i64) -> ValidationResult<()> {
    if pence <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a VAT rate in basis points (0% to 100%).
pub fn validate_vat_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "vatRateBps".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 0,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

fn validate_document_lines(lines: &[DocumentLineInput]) -> ValidationResult<()> {
    validate_line_count(lines.len())?;
    for line in lines {
        line.validate()?;
    }
    Ok(())
}

fn validate_optional_email(email: Option<&str>) -> ValidationResult<()> {
    match email.map(str::trim) {
        Some(e) if !e.is_empty() => validate_email(e),
        _ => Ok(()),
    }
}

// =============================================================================
// Input Validation
// =============================================================================

impl CustomerInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_email(self.email.as_deref())?;
        if let Some(postcode) = self.postcode.as_deref().filter(|p| !p.trim().is_empty()) {
            validate_postcode(postcode)?;
        }
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

impl InventoryItemInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_part_number(&self.part_number)?;
        validate_name("name", &self.name)?;
        validate_price_pence("unitPricePence", self.unit_price_pence)?;
        if let Some(cost) = self.cost_price_pence {
            validate_price_pence("costPricePence", cost)?;
        }
        validate_stock_level("quantityInStock", self.quantity_in_stock)?;
        validate_stock_level("reorderLevel", self.reorder_level)
    }
}

impl EngineerInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_email(self.email.as_deref())?;
        validate_price_pence("hourlyRatePence", self.hourly_rate_pence)
    }
}

impl JobInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("customerId", &self.customer_id)?;
        if let Some(engineer_id) = self.engineer_id.as_deref() {
            validate_uuid("engineerId", engineer_id)?;
        }
        validate_name("title", &self.title)?;
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

impl JobItemInput {
    /// Checks the line shape. A part line without `inventory_item_id` must
    /// carry its own description and price.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_quantity_hundredths(self.quantity_hundredths)?;

        match self.inventory_item_id.as_deref() {
            Some(id) => validate_uuid("inventoryItemId", id)?,
            None => {
                let description = self.description.as_deref().unwrap_or_default();
                validate_name("description", description)?;
                if self.unit_price_pence.is_none() {
                    return Err(ValidationError::required("unitPricePence"));
                }
            }
        }

        if let Some(price) = self.unit_price_pence {
            validate_price_pence("unitPricePence", price)?;
        }

        Ok(())
    }
}

impl DocumentLineInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("description", &self.description)?;
        validate_quantity_hundredths(self.quantity_hundredths)?;
        validate_price_pence("unitPricePence", self.unit_price_pence)
    }
}

impl InvoiceInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("customerId", &self.customer_id)?;
        if let Some(job_id) = self.job_id.as_deref() {
            validate_uuid("jobId", job_id)?;
        }
        if let (Some(issue), Some(due)) = (self.issue_date, self.due_date) {
            if due < issue {
                return Err(ValidationError::invalid_format(
                    "dueDate",
                    "must not be before the issue date",
                ));
            }
        }
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        validate_document_lines(&self.items)
    }
}

impl QuoteInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("customerId", &self.customer_id)?;
        if let (Some(issue), Some(until)) = (self.issue_date, self.valid_until) {
            if until < issue {
                return Err(ValidationError::invalid_format(
                    "validUntil",
                    "must not be before the issue date",
                ));
            }
        }
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        validate_document_lines(&self.items)
    }
}

impl PaymentInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_payment_amount(self.amount_pence)?;
        validate_optional_text("reference", self.reference.as_deref(), MAX_NAME_LEN)
    }
}

impl SettingsInput {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("companyName", &self.company_name)?;
        validate_optional_email(self.email.as_deref())?;
        validate_vat_rate_bps(self.vat_rate_bps)?;
        validate_price_pence("defaultLabourRatePence", self.default_labour_rate_pence)?;

        if !(0..=365).contains(&self.payment_terms_days) {
            return Err(ValidationError::OutOfRange {
                field: "paymentTermsDays".to_string(),
                min: 0,
                max: 365,
            });
        }

        validate_prefix("invoicePrefix", &self.invoice_prefix)?;
        validate_prefix("quotePrefix", &self.quote_prefix)?;
        validate_prefix("statementPrefix", &self.statement_prefix)?;

        if let Some(sort_code) = self.sort_code.as_deref().filter(|s| !s.trim().is_empty()) {
            let digits: String = sort_code.chars().filter(|c| c.is_ascii_digit()).collect();
            if digits.len() != 6 {
                return Err(ValidationError::invalid_format("sortCode", "must have 6 digits"));
            }
        }

        match self.reminder_webhook_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => validate_webhook_url(url),
            _ => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("accounts@hillfarm.co.uk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@c.com").is_err());
        assert!(validate_email("a@@c.com").is_err());
    }

    #[test]
    fn test_validate_postcode() {
        for ok in ["SA31 1AA", "sw1a 2aa", "M1 1AE", "B338TH", "EC1A 1BB"] {
            assert!(validate_postcode(ok).is_ok(), "{ok}");
        }
        for bad in ["", "12345", "SA31", "SA31 AAA", "ÅA1 1AA"] {
            assert!(validate_postcode(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_validate_part_number() {
        assert!(validate_part_number("VP-200").is_ok());
        assert!(validate_part_number("").is_err());
        assert!(validate_part_number(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity_hundredths(25).is_ok());
        assert!(validate_quantity_hundredths(0).is_err());
        assert!(validate_quantity_hundredths(-100).is_err());
        assert!(validate_quantity_hundredths(MAX_LINE_QUANTITY_UNITS * 100 + 1).is_err());
    }

    #[test]
    fn test_validate_webhook_url() {
        assert!(validate_webhook_url("https://hooks.example.com/remind").is_ok());
        assert!(validate_webhook_url("ftp://example.com").is_err());
        assert!(validate_webhook_url("not a url").is_err());
    }

    #[test]
    fn test_job_item_input_rules() {
        let free_text = JobItemInput {
            inventory_item_id: None,
            kind: crate::types::LineKind::Labour,
            description: Some("Labour".to_string()),
            quantity_hundredths: 150,
            unit_price_pence: Some(4500),
        };
        assert!(free_text.validate().is_ok());

        let missing_price = JobItemInput {
            unit_price_pence: None,
            ..free_text.clone()
        };
        assert!(missing_price.validate().is_err());

        let from_stock = JobItemInput {
            inventory_item_id: Some(uuid::Uuid::new_v4().to_string()),
            description: None,
            unit_price_pence: None,
            ..free_text
        };
        assert!(from_stock.validate().is_ok());
    }

    #[test]
    fn test_invoice_input_rejects_bad_lines() {
        let input = InvoiceInput {
            customer_id: uuid::Uuid::new_v4().to_string(),
            items: vec![DocumentLineInput {
                description: "Liner".to_string(),
                quantity_hundredths: 0,
                unit_price_pence: 100,
            }],
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_settings_input() {
        let settings = SettingsInput {
            company_name: "Valley Dairy Services".to_string(),
            vat_rate_bps: 2000,
            payment_terms_days: 30,
            invoice_prefix: "INV".to_string(),
            quote_prefix: "QUO".to_string(),
            statement_prefix: "STM".to_string(),
            sort_code: Some("12-34-56".to_string()),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());

        let bad = SettingsInput {
            vat_rate_bps: 12_000,
            ..settings.clone()
        };
        assert!(bad.validate().is_err());

        let bad = SettingsInput {
            invoice_prefix: String::new(),
            ..settings
        };
        assert!(bad.validate().is_err());
    }
}
