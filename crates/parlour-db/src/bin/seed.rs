//! # Seed Data Generator
//!
//! Populates a database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./parlour_dev.db
//! cargo run -p parlour-db --bin seed
//!
//! # Specify database path
//! cargo run -p parlour-db --bin seed -- --db ./data/parlour.db
//! ```
//!
//! ## Generated Data
//! - A parts catalogue (liners, clusters, pulsators, filters, ...)
//! - Farms across West Wales with contacts and postcodes
//! - Two engineers
//! - One job per farm, walked along the pipeline, some invoiced and paid
//! - A quote waiting for an answer
//! - An admin login: `admin@parlour.local` / `parlour-admin`

use std::env;

use parlour_core::{
    CustomerInput, DocumentLineInput, EngineerInput, InventoryItemInput, JobInput, JobItemInput,
    JobStatus, LineKind, PaymentInput, PaymentMethod, QuoteInput, UserRole,
};
use parlour_db::{Database, DbConfig};

/// (part number, name, price in pence, stock)
const PARTS: &[(&str, &str, i64, i64)] = &[
    ("LN-SQ-20", "Square liner (set of 4)", 2_450, 40),
    ("LN-RD-22", "Round vented liner (set of 4)", 2_780, 32),
    ("CL-HRZ-01", "Harmony cluster", 18_900, 6),
    ("PL-EL-60", "Electronic pulsator 60/40", 21_500, 4),
    ("PL-PN-50", "Pneumatic pulsator 50/50", 9_850, 3),
    ("VP-OIL-1", "Vacuum pump oil 1L", 1_150, 24),
    ("VP-VANE-4", "Vacuum pump vane set", 6_400, 5),
    ("FS-610", "Filter socks 610mm (box of 100)", 3_600, 12),
    ("MT-HOSE-10", "Milk tube 10m", 4_200, 8),
    ("AC-DET-5", "Acid detergent 5L", 2_250, 15),
    ("AL-DET-5", "Alkaline detergent 5L", 2_150, 15),
    ("RG-VAC-01", "Vacuum regulator", 11_800, 2),
];

/// (farm, contact, town, postcode)
const FARMS: &[(&str, &str, &str, &str)] = &[
    ("Hill Farm", "Rhys Morgan", "Carmarthen", "SA31 1AA"),
    ("Brook Dairy", "Sian Evans", "Llandeilo", "SA19 6BB"),
    ("Ty Mawr", "Dafydd Jones", "Newcastle Emlyn", "SA38 9CC"),
    ("Pant Glas", "Megan Price", "Lampeter", "SA48 7DD"),
    ("Maes Gwyn", "Owain Thomas", "Cardigan", "SA43 1EE"),
    ("Cefn Coed", "Elin Davies", "Whitland", "SA34 0FF"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./parlour_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Parlour Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./parlour_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Parlour Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.customers().list(None).await?.len();
    if existing > 0 {
        println!("⚠ Database already has {} customers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Parts
    let mut parts = Vec::with_capacity(PARTS.len());
    for (part_number, name, price, stock) in PARTS {
        let part = db
            .inventory()
            .create(&InventoryItemInput {
                part_number: part_number.to_string(),
                name: name.to_string(),
                unit_price_pence: *price,
                cost_price_pence: Some(price * 65 / 100),
                quantity_in_stock: *stock,
                reorder_level: 3,
                location: Some("Van stock".to_string()),
                ..Default::default()
            })
            .await?;
        parts.push(part);
    }
    println!("✓ {} parts", parts.len());

    // Engineers
    let mut engineers = Vec::new();
    for (name, rate) in [("Gareth Williams", 4_500), ("Alys Hughes", 4_200)] {
        let engineer = db
            .engineers()
            .create(&EngineerInput {
                name: name.to_string(),
                hourly_rate_pence: rate,
                is_active: true,
                ..Default::default()
            })
            .await?;
        engineers.push(engineer);
    }
    println!("✓ {} engineers", engineers.len());

    // Farms, one job each at a different pipeline stage
    let stages = [
        JobStatus::Pending,
        JobStatus::Scheduled,
        JobStatus::InProgress,
        JobStatus::Completed,
        JobStatus::Completed,
        JobStatus::Completed,
    ];
    let today = chrono::Utc::now().date_naive();
    let mut invoiced = 0;

    for (index, (farm, contact, town, postcode)) in FARMS.iter().enumerate() {
        let customer = db
            .customers()
            .create(&CustomerInput {
                name: farm.to_string(),
                contact_name: Some(contact.to_string()),
                email: Some(format!(
                    "{}@example.com",
                    farm.to_lowercase().replace(' ', "")
                )),
                town: Some(town.to_string()),
                postcode: Some(postcode.to_string()),
                ..Default::default()
            })
            .await?;

        let engineer = &engineers[index % engineers.len()];
        let job = db
            .jobs()
            .create(&JobInput {
                customer_id: customer.id.clone(),
                engineer_id: Some(engineer.id.clone()),
                title: "Annual parlour service".to_string(),
                scheduled_date: Some(today + chrono::Days::new(index as u64)),
                ..Default::default()
            })
            .await?;

        let part = &parts[index % parts.len()];
        db.jobs()
            .add_item(
                &job.id,
                &JobItemInput {
                    inventory_item_id: Some(part.id.clone()),
                    quantity_hundredths: 100,
                    ..Default::default()
                },
            )
            .await?;
        db.jobs()
            .add_item(
                &job.id,
                &JobItemInput {
                    kind: LineKind::Labour,
                    description: Some("Service labour".to_string()),
                    quantity_hundredths: 250,
                    unit_price_pence: Some(engineer.hourly_rate_pence),
                    ..Default::default()
                },
            )
            .await?;

        let stage = stages[index % stages.len()];
        if stage == JobStatus::Pending {
            // Unschedule to show an unbooked job
            db.jobs()
                .update(
                    &job.id,
                    &JobInput {
                        customer_id: customer.id.clone(),
                        title: job.title.clone(),
                        ..Default::default()
                    },
                )
                .await?;
        } else if stage != JobStatus::Scheduled {
            db.jobs().set_status(&job.id, JobStatus::InProgress).await?;
            if stage == JobStatus::Completed {
                db.jobs().set_status(&job.id, JobStatus::Completed).await?;
            }
        }

        // Invoice the last two completed jobs, paying one of them in part
        if stage == JobStatus::Completed && index >= 4 {
            let detail = db.invoices().create_from_job(&job.id).await?;
            let invoice = db.invoices().mark_sent(&detail.invoice.id).await?;
            if index == 5 {
                db.payments()
                    .record(
                        &invoice.id,
                        &PaymentInput {
                            amount_pence: invoice.total_pence / 2,
                            method: PaymentMethod::BankTransfer,
                            paid_on: Some(today),
                            reference: Some("Part payment".to_string()),
                        },
                    )
                    .await?;
            }
            invoiced += 1;
        }
    }
    println!("✓ {} customers with jobs ({} invoiced)", FARMS.len(), invoiced);

    // A quote for the first farm
    let customers = db.customers().list(None).await?;
    if let Some(customer) = customers.first() {
        let quote = db
            .quotes()
            .create(&QuoteInput {
                customer_id: customer.id.clone(),
                notes: Some("Replacement milk line and fittings".to_string()),
                items: vec![
                    DocumentLineInput {
                        description: "Stainless milk line (per metre)".to_string(),
                        quantity_hundredths: 1_200,
                        unit_price_pence: 2_500,
                    },
                    DocumentLineInput {
                        description: "Fitting labour".to_string(),
                        quantity_hundredths: 800,
                        unit_price_pence: 4_500,
                    },
                ],
                ..Default::default()
            })
            .await?;
        println!("✓ Quote {}", quote.quote.quote_number);
    }

    if db.users().count().await? == 0 {
        db.users()
            .create("admin@parlour.local", "Administrator", "parlour-admin", UserRole::Admin)
            .await?;
        println!("✓ Admin user admin@parlour.local");
    }

    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    Ok(())
}
