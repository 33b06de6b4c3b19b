//! # Document Layouts
//!
//! One public function per document kind. Each lays the document out on
//! a [`PageWriter`] and returns the PDF bytes.
//!
//! ## Page Structure
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │ COMPANY NAME                          INVOICE   │
//! │ address / phone / email / VAT no. INV-2026-0001 │
//! │                                                 │
//! │ Bill to                      Invoice date  ...  │
//! │ Hill Farm                    Due date      ...  │
//! │ address                      Status        ...  │
//! │─────────────────────────────────────────────────│
//! │ Description            Qty   Unit (GBP)  Total  │  ← repeated on
//! │ ...                                             │    every page
//! │─────────────────────────────────────────────────│
//! │                               Subtotal   ...    │
//! │                               VAT (20%)  ...    │
//! │                               Total (GBP) ...   │
//! │ kind-specific block (bank details / validity /  │
//! │ parts-labour-other breakdown), notes            │
//! │ footer                              Page 1 of 1 │
//! └─────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use parlour_core::{Customer, InvoiceStatus, LineKind, Money, Quantity, Settings, VatRate};
use tracing::debug;

use crate::document::{InvoiceDocument, QuoteDocument, StatementDocument};
use crate::error::DocResult;
use crate::layout::{line_height, wrap, PageWriter, Weight, LEFT, RIGHT};

const BODY: f32 = 9.0;
const SMALL: f32 = 8.0;

const COL_KIND: f32 = LEFT;
const COL_QTY_RIGHT: f32 = 130.0;
const COL_UNIT_RIGHT: f32 = 160.0;
const COL_META_LABEL: f32 = 120.0;
const COL_TOTALS_LABEL_RIGHT: f32 = 160.0;

/// Description characters per line, with and without the Type column.
const DESC_CHARS: usize = 58;
const DESC_CHARS_WITH_KIND: usize = 46;

fn date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

fn amount(m: Money) -> String {
    m.to_plain_string()
}

fn kind_label(kind: LineKind) -> &'static str {
    match kind {
        LineKind::Part => "Part",
        LineKind::Labour => "Labour",
        LineKind::Other => "Other",
    }
}

fn status_label(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Draft => "DRAFT",
        InvoiceStatus::Sent => "Awaiting payment",
        InvoiceStatus::PartiallyPaid => "Part paid",
        InvoiceStatus::Paid => "PAID",
        InvoiceStatus::Overdue => "OVERDUE",
        InvoiceStatus::Void => "VOID",
    }
}

fn footer_text(settings: &Settings) -> String {
    match settings.vat_number.as_deref().map(str::trim) {
        Some(vat) if !vat.is_empty() => format!("{}  |  VAT No. {}", settings.company_name, vat),
        _ => settings.company_name.clone(),
    }
}

// =============================================================================
// Shared Blocks
// =============================================================================

/// A row of the line table.
struct TableRow<'a> {
    kind: Option<LineKind>,
    description: &'a str,
    quantity: Quantity,
    unit_price: Money,
    line_total: Money,
}

/// Company block on the left, document title and number on the right.
fn draw_header(w: &mut PageWriter, settings: &Settings, title: &str, number: &str) {
    w.text(LEFT, 16.0, Weight::Bold, &settings.company_name);
    w.text_right(RIGHT, 18.0, Weight::Bold, title);
    w.down(line_height(16.0));

    let mut company_lines: Vec<String> = settings
        .address
        .as_deref()
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if let Some(phone) = settings.phone.as_deref() {
        company_lines.push(format!("Tel: {phone}"));
    }
    if let Some(email) = settings.email.as_deref() {
        company_lines.push(email.to_string());
    }
    if let Some(vat) = settings.vat_number.as_deref() {
        company_lines.push(format!("VAT No. {vat}"));
    }

    w.text_right(RIGHT, 11.0, Weight::Bold, number);
    for line in &company_lines {
        w.text(LEFT, BODY, Weight::Regular, line);
        w.down(line_height(BODY));
    }
    if company_lines.is_empty() {
        w.down(line_height(BODY));
    }
    w.down(6.0);
}

/// Customer block on the left, label/value pairs on the right.
fn draw_parties(w: &mut PageWriter, heading: &str, customer: &Customer, meta: &[(&str, String)]) {
    let top = w.y();

    w.text(LEFT, 10.0, Weight::Bold, heading);
    w.down(line_height(10.0));
    w.text(LEFT, BODY, Weight::Bold, &customer.name);
    w.down(line_height(BODY));
    if let Some(contact) = customer.contact_name.as_deref() {
        w.text(LEFT, BODY, Weight::Regular, &format!("Attn: {contact}"));
        w.down(line_height(BODY));
    }
    for line in customer.address_lines() {
        w.text(LEFT, BODY, Weight::Regular, &line);
        w.down(line_height(BODY));
    }
    let left_bottom = w.y();

    w.set_y(top);
    for (label, value) in meta {
        w.text(COL_META_LABEL, BODY, Weight::Bold, label);
        w.text_right(RIGHT, BODY, Weight::Regular, value);
        w.down(line_height(BODY) + 0.5);
    }

    w.set_y(left_bottom.min(w.y()));
    w.down(6.0);
}

fn draw_table_header(w: &mut PageWriter, with_kind: bool) {
    let desc_x = if with_kind { COL_KIND + 20.0 } else { LEFT };
    if with_kind {
        w.text(COL_KIND, BODY, Weight::Bold, "Type");
    }
    w.text(desc_x, BODY, Weight::Bold, "Description");
    w.text_right(COL_QTY_RIGHT, BODY, Weight::Bold, "Qty");
    w.text_right(COL_UNIT_RIGHT, BODY, Weight::Bold, "Unit (GBP)");
    w.text_right(RIGHT, BODY, Weight::Bold, "Total (GBP)");
    w.rule(LEFT, RIGHT, 0.6);
    w.down(line_height(BODY) + 1.5);
}

/// The line table. Rows never split across pages; the header repeats at
/// the top of each new page.
fn draw_table(w: &mut PageWriter, rows: &[TableRow<'_>], with_kind: bool) {
    let desc_x = if with_kind { COL_KIND + 20.0 } else { LEFT };
    let desc_chars = if with_kind { DESC_CHARS_WITH_KIND } else { DESC_CHARS };
    let lh = line_height(BODY);

    w.ensure_space(lh * 3.0);
    draw_table_header(w, with_kind);

    for row in rows {
        let mut lines = wrap(row.description, desc_chars);
        if lines.is_empty() {
            lines.push(String::new());
        }
        let height = lines.len() as f32 * lh + 1.0;
        if w.ensure_space(height) {
            draw_table_header(w, with_kind);
        }

        if let Some(kind) = row.kind {
            w.text(COL_KIND, BODY, Weight::Regular, kind_label(kind));
        }
        w.text_right(COL_QTY_RIGHT, BODY, Weight::Regular, &row.quantity.to_string());
        w.text_right(COL_UNIT_RIGHT, BODY, Weight::Regular, &amount(row.unit_price));
        w.text_right(RIGHT, BODY, Weight::Regular, &amount(row.line_total));
        for line in &lines {
            w.text(desc_x, BODY, Weight::Regular, line);
            w.down(lh);
        }
        w.down(1.0);
    }

    w.rule(LEFT, RIGHT, 0.6);
    w.down(lh);
}

/// Right-aligned label/value rows. Bold rows get a rule above them.
fn draw_totals(w: &mut PageWriter, rows: &[(String, Money, bool)]) {
    let lh = line_height(10.0) + 0.5;
    w.ensure_space(lh * rows.len() as f32 + 2.0);
    for (label, value, bold) in rows {
        let weight = if *bold { Weight::Bold } else { Weight::Regular };
        if *bold {
            w.down(1.0);
        }
        w.text_right(COL_TOTALS_LABEL_RIGHT, 10.0, weight, label);
        w.text_right(RIGHT, 10.0, weight, &amount(*value));
        w.down(lh);
    }
    w.down(4.0);
}

/// A bold heading followed by wrapped paragraphs.
fn draw_block(w: &mut PageWriter, heading: &str, lines: &[String]) {
    let lh = line_height(BODY);
    let wrapped: Vec<String> = lines.iter().flat_map(|l| wrap(l, 100)).collect();
    if wrapped.is_empty() {
        return;
    }

    w.ensure_space(lh * 2.0);
    w.text(LEFT, 10.0, Weight::Bold, heading);
    w.down(line_height(10.0));
    for line in &wrapped {
        w.ensure_space(lh);
        w.text(LEFT, BODY, Weight::Regular, line);
        w.down(lh);
    }
    w.down(4.0);
}

fn notes_lines(notes: &Option<String>) -> Vec<String> {
    notes
        .as_deref()
        .map(|n| n.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

fn vat_label(bps: u32) -> String {
    format!("VAT ({})", VatRate::from_bps(bps))
}

// =============================================================================
// Invoice
// =============================================================================

fn layout_invoice(doc: &InvoiceDocument) -> DocResult<PageWriter> {
    let invoice = &doc.detail.invoice;
    let mut w = PageWriter::new(
        &format!("Invoice {}", invoice.invoice_number),
        &footer_text(&doc.settings),
    )?;

    draw_header(&mut w, &doc.settings, "INVOICE", &invoice.invoice_number);
    draw_parties(
        &mut w,
        "Bill to",
        &doc.customer,
        &[
            ("Invoice date", date(invoice.issue_date)),
            ("Due date", date(invoice.due_date)),
            ("Status", status_label(doc.status).to_string()),
        ],
    );

    let rows: Vec<TableRow<'_>> = doc
        .detail
        .items
        .iter()
        .map(|item| TableRow {
            kind: None,
            description: &item.description,
            quantity: Quantity::from_hundredths(item.quantity_hundredths),
            unit_price: Money::from_pence(item.unit_price_pence),
            line_total: Money::from_pence(item.line_total_pence),
        })
        .collect();
    draw_table(&mut w, &rows, false);

    let mut totals = vec![
        ("Subtotal".to_string(), Money::from_pence(invoice.subtotal_pence), false),
        (vat_label(invoice.vat_rate_bps), Money::from_pence(invoice.vat_pence), false),
        ("Total (GBP)".to_string(), invoice.total(), true),
    ];
    if invoice.amount_paid().is_positive() {
        totals.push(("Paid".to_string(), invoice.amount_paid(), false));
        totals.push(("Amount due (GBP)".to_string(), doc.amount_due(), true));
    }
    draw_totals(&mut w, &totals);

    if !doc.detail.payments.is_empty() {
        let lines: Vec<String> = doc
            .detail
            .payments
            .iter()
            .map(|p| {
                let reference = p
                    .reference
                    .as_deref()
                    .map(|r| format!(" ({r})"))
                    .unwrap_or_default();
                format!(
                    "{}  {}  {}{}",
                    date(p.paid_on),
                    p.method.as_str().replace('_', " "),
                    amount(Money::from_pence(p.amount_pence)),
                    reference
                )
            })
            .collect();
        draw_block(&mut w, "Payments received", &lines);
    }

    if doc.status != InvoiceStatus::Void && doc.status != InvoiceStatus::Paid {
        let settings = &doc.settings;
        let mut lines = Vec::new();
        if let Some(bank) = settings.bank_name.as_deref() {
            lines.push(format!("Bank: {bank}"));
        }
        if let Some(sort_code) = settings.sort_code.as_deref() {
            lines.push(format!("Sort code: {sort_code}"));
        }
        if let Some(account) = settings.account_number.as_deref() {
            lines.push(format!("Account number: {account}"));
        }
        lines.push(format!(
            "Payment due within {} days, by {}. Please quote {} as your reference.",
            settings.payment_terms_days,
            date(invoice.due_date),
            invoice.invoice_number
        ));
        draw_block(&mut w, "Payment details", &lines);
    }

    draw_block(&mut w, "Notes", &notes_lines(&invoice.notes));
    Ok(w)
}

/// Renders an invoice to PDF bytes.
pub fn render_invoice(doc: &InvoiceDocument) -> DocResult<Vec<u8>> {
    let writer = layout_invoice(doc)?;
    let pages = writer.page_count();
    let bytes = writer.finish()?;
    debug!(
        number = %doc.detail.invoice.invoice_number,
        pages,
        bytes = bytes.len(),
        "Rendered invoice PDF"
    );
    Ok(bytes)
}

// =============================================================================
// Quote
// =============================================================================

fn layout_quote(doc: &QuoteDocument) -> DocResult<PageWriter> {
    let quote = &doc.detail.quote;
    let mut w = PageWriter::new(
        &format!("Quote {}", quote.quote_number),
        &footer_text(&doc.settings),
    )?;

    draw_header(&mut w, &doc.settings, "QUOTATION", &quote.quote_number);
    draw_parties(
        &mut w,
        "Prepared for",
        &doc.customer,
        &[
            ("Quote date", date(quote.issue_date)),
            ("Valid until", date(quote.valid_until)),
        ],
    );

    let rows: Vec<TableRow<'_>> = doc
        .detail
        .items
        .iter()
        .map(|item| TableRow {
            kind: None,
            description: &item.description,
            quantity: Quantity::from_hundredths(item.quantity_hundredths),
            unit_price: Money::from_pence(item.unit_price_pence),
            line_total: Money::from_pence(item.line_total_pence),
        })
        .collect();
    draw_table(&mut w, &rows, false);

    draw_totals(
        &mut w,
        &[
            ("Subtotal".to_string(), Money::from_pence(quote.subtotal_pence), false),
            (vat_label(quote.vat_rate_bps), Money::from_pence(quote.vat_pence), false),
            ("Total (GBP)".to_string(), Money::from_pence(quote.total_pence), true),
        ],
    );

    draw_block(
        &mut w,
        "Validity",
        &[format!(
            "This quotation is valid until {}. Please quote {} when accepting.",
            date(quote.valid_until),
            quote.quote_number
        )],
    );
    draw_block(&mut w, "Notes", &notes_lines(&quote.notes));
    Ok(w)
}

/// Renders a quote to PDF bytes.
pub fn render_quote(doc: &QuoteDocument) -> DocResult<Vec<u8>> {
    let writer = layout_quote(doc)?;
    let pages = writer.page_count();
    let bytes = writer.finish()?;
    debug!(number = %doc.detail.quote.quote_number, pages, "Rendered quote PDF");
    Ok(bytes)
}

// =============================================================================
// Statement
// =============================================================================

fn layout_statement(doc: &StatementDocument) -> DocResult<PageWriter> {
    let statement = &doc.detail.statement;
    let mut w = PageWriter::new(
        &format!("Statement {}", statement.statement_number),
        &footer_text(&doc.settings),
    )?;

    draw_header(&mut w, &doc.settings, "JOB STATEMENT", &statement.statement_number);

    let mut meta = vec![("Statement date", date(statement.issue_date))];
    if let Some(title) = doc.job_title.as_deref() {
        meta.push(("Job", title.to_string()));
    }
    draw_parties(&mut w, "Customer", &doc.customer, &meta);

    let rows: Vec<TableRow<'_>> = doc
        .detail
        .items
        .iter()
        .map(|item| TableRow {
            kind: Some(item.kind),
            description: &item.description,
            quantity: Quantity::from_hundredths(item.quantity_hundredths),
            unit_price: Money::from_pence(item.unit_price_pence),
            line_total: Money::from_pence(item.line_total_pence),
        })
        .collect();
    draw_table(&mut w, &rows, true);

    let mut totals = vec![
        ("Parts".to_string(), Money::from_pence(statement.parts_total_pence), false),
        ("Labour".to_string(), Money::from_pence(statement.labour_total_pence), false),
    ];
    if statement.other_total_pence != 0 {
        totals.push(("Other".to_string(), Money::from_pence(statement.other_total_pence), false));
    }
    totals.extend([
        ("Subtotal".to_string(), Money::from_pence(statement.subtotal_pence), true),
        (vat_label(statement.vat_rate_bps), Money::from_pence(statement.vat_pence), false),
        ("Total (GBP)".to_string(), Money::from_pence(statement.total_pence), true),
    ]);
    draw_totals(&mut w, &totals);

    draw_block(
        &mut w,
        "About this statement",
        &["A record of the parts and labour on this job. It is not a VAT invoice.".to_string()],
    );
    draw_block(&mut w, "Notes", &notes_lines(&statement.notes));
    Ok(w)
}

/// Renders a job statement to PDF bytes.
pub fn render_statement(doc: &StatementDocument) -> DocResult<Vec<u8>> {
    let writer = layout_statement(doc)?;
    let pages = writer.page_count();
    let bytes = writer.finish()?;
    debug!(number = %doc.detail.statement.statement_number, pages, "Rendered statement PDF");
    Ok(bytes)
}

// =============================================================================
// Unit Tests
// =============================================================================
