use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{Days, NaiveDate};
use rand::Rng;
use spend_analyzer::pipeline::generated_csv_path;

const CATEGORIES: [&str; 6] = [
    "groceries",
    "rent",
    "travel",
    "dining",
    "utilities",
    "entertainment",
];

fn main() -> std::io::Result<()> {
    let mut args = std::env::args().skip(1);
    let rows: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(100_000);
    let path = args.next();
    let path = path.as_deref().map_or(generated_csv_path(), Path::new);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "date,category,amount,customer,quantity")?;

    let start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid start date");
    let mut rng = rand::rng();
    for _ in 0..rows {
        let date = start + Days::new(rng.random_range(0..365));
        let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
        let amount = f64::from(rng.random_range(100..50_000_u32)) / 100.0;
        let customer = rng.random_range(1..=200);
        let quantity = rng.random_range(1..10);
        writeln!(
            writer,
            "{},{},{:.2},C{:03},{}",
            date.format("%Y-%m-%d"),
            category,
            amount,
            customer,
            quantity
        )?;
    }
    writer.flush()?;

    println!("Sample CSV generated: {} ({} rows)", path.display(), rows);
    Ok(())
}
