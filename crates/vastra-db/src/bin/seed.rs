//! # Seed Data Generator
//!
//! Populates the database with a demo clothing catalog for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p vastra-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p vastra-db --bin seed -- --count 2000
//!
//! # Specify database path
//! cargo run -p vastra-db --bin seed -- --db ./data/vastra.db
//! ```
//!
//! ## Generated Products
//! Every garment line is expanded over sizes and colours:
//! - SKU: `{CATEGORY}-{SIZE}-{INDEX}`
//! - Variant: `{SIZE} / {COLOUR}`
//! - Sell price: 80-95% of MRP, GST 5% or 12% depending on price band
//! - Stock: 0 - 40 (some land below the reorder threshold)

use std::env;
use vastra_core::Product;
use vastra_db::{Database, DbConfig};

/// Garment lines: category code, HSN code, base MRP (paise), names.
const CATEGORIES: &[(&str, &str, i64, &[&str])] = &[
    (
        "SHIRT",
        "6205",
        89_900,
        &[
            "Oxford Cotton Shirt",
            "Linen Casual Shirt",
            "Checked Flannel Shirt",
            "Denim Shirt",
            "Mandarin Collar Shirt",
            "Printed Rayon Shirt",
        ],
    ),
    (
        "JEANS",
        "6203",
        149_900,
        &[
            "Slim Fit Jeans",
            "Straight Fit Jeans",
            "Relaxed Fit Jeans",
            "Skinny Stretch Jeans",
            "Bootcut Jeans",
        ],
    ),
    (
        "KURTA",
        "6211",
        119_900,
        &[
            "Cotton Straight Kurta",
            "Chikankari Kurta",
            "Anarkali Kurta",
            "Hand Block Print Kurta",
            "Silk Blend Kurta",
        ],
    ),
    (
        "SAREE",
        "5208",
        249_900,
        &[
            "Banarasi Silk Saree",
            "Cotton Handloom Saree",
            "Chiffon Printed Saree",
            "Kanjivaram Saree",
        ],
    ),
    (
        "TSHIRT",
        "6109",
        49_900,
        &[
            "Crew Neck T-Shirt",
            "Polo T-Shirt",
            "V-Neck T-Shirt",
            "Graphic Print T-Shirt",
            "Henley T-Shirt",
        ],
    ),
];

const BRANDS: &[&str] = &["Vastra", "Kalakriti", "Urban Loom", "Desi Threads"];

/// Size variants with MRP addon in paise.
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 0), ("L", 5_000), ("XL", 10_000)];

const COLOURS: &[&str] = &["Blue", "White", "Black", "Maroon", "Olive"];

/// Garments up to this MRP fall in the 5% GST slab, above it 12%.
const LOW_SLAB_LIMIT_CENTS: i64 = 100_000;

/// Demo loyalty members.
const CUSTOMERS: &[(&str, &str)] = &[
    ("Ananya Sharma", "9876543210"),
    ("Rahul Verma", "9812345678"),
    ("Priya Nair", "9900112233"),
    ("Arjun Mehta", "9988776655"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./vastra_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vastra POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./vastra_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Vastra POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (code, hsn, base_mrp, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                for (colour_idx, colour) in COLOURS.iter().enumerate() {
                    if generated >= count {
                        break 'outer;
                    }

                    let seed = category_idx * 1000 + name_idx * 40 + size_idx * 8 + colour_idx;
                    let product = generate_product(code, hsn, base_mrp + addon, name, size, colour, seed);

                    if let Err(e) = db.products().insert(&product).await {
                        eprintln!("Failed to insert {}: {}", product.sku, e);
                        continue;
                    }

                    generated += 1;
                    if generated % 100 == 0 {
                        println!("  Generated {} products...", generated);
                    }
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let mut members = 0;
    for (name, phone) in CUSTOMERS {
        match db.customers().create(name, phone, "").await {
            Ok(_) => members += 1,
            Err(e) => eprintln!("Failed to add customer {}: {}", phone, e),
        }
    }
    println!("✓ Added {} loyalty members", members);

    println!();
    println!("Verifying search...");
    let results = db.products().search_by_name("kurta").await?;
    println!("  Search 'kurta': {} results", results.len());
    let low = db.products().list_low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single garment deterministically from `seed`.
fn generate_product(
    category: &str,
    hsn: &str,
    mrp_cents: i64,
    name: &str,
    size: &str,
    colour: &str,
    seed: usize,
) -> Product {
    // Sell at 80-95% of MRP, rounded down to whole rupees
    let markdown = 80 + (seed % 16) as i64;
    let sell_price_cents = mrp_cents * markdown / 100 / 100 * 100;

    let mut product = Product::new(name, sell_price_cents);
    product.variant = format!("{} / {}", size, colour);
    product.category = category.to_string();
    product.brand = BRANDS[seed % BRANDS.len()].to_string();
    product.sku = format!("{}-{}-{:05}", category, size, seed);
    // EAN-13 shaped, checksum not computed
    product.barcode = format!("890{:010}", seed);
    product.mrp_cents = mrp_cents;
    product.purchase_price_cents = sell_price_cents * (55 + (seed % 15) as i64) / 100;
    product.gst_percent = if sell_price_cents <= LOW_SLAB_LIMIT_CENTS { 5 } else { 12 };
    product.hsn_code = hsn.to_string();
    product.stock = (seed % 41) as i64;
    product
}
