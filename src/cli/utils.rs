use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

use crate::cli::OutputFormat;
use crate::client::{countdown, DiscountStatus, Notice, NoticeLevel};
use crate::database::models::{Discount, DiscountListing, Shop};

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, status: Option<u16>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "message": message
            });

            if let Some(status) = status {
                response["status"] = json!(status);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Print store notices the way the web client shows toasts
pub fn output_notices(output_format: &OutputFormat, notices: &[Notice]) {
    if matches!(output_format, OutputFormat::Json) {
        return;
    }
    for notice in notices {
        match notice.level {
            NoticeLevel::Success => println!("✓ {}", notice.message),
            NoticeLevel::Error => eprintln!("✗ {}", notice.message),
        }
    }
}

pub fn output_data<T: Serialize>(output_format: &OutputFormat, data: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn shop_line(shop: &Shop) -> String {
    format!("#{} {} <{}> - {}", shop.id, shop.shop_name, shop.email, shop.city)
}

pub fn discount_line(discount: &Discount, today: NaiveDate) -> String {
    let status = DiscountStatus::of(discount, today);
    let mut line = format!(
        "[{}] #{} {} - {}% off - {} - {} to {}",
        status,
        discount.id,
        discount.title,
        discount.discount_percentage.normalize(),
        discount.category,
        discount.start_date,
        discount.end_date,
    );
    if let Some(countdown) = countdown(discount, today) {
        line.push_str(&format!(" ({})", countdown));
    }
    line
}

pub fn listing_line(listing: &DiscountListing, today: NaiveDate) -> String {
    format!(
        "{} @ {} ({})",
        discount_line(&listing.discount, today),
        listing.shop_name,
        listing.city
    )
}

pub fn print_listings(listings: &[DiscountListing], empty_message: &str) {
    if listings.is_empty() {
        println!("{}", empty_message);
        return;
    }
    let today = today();
    for listing in listings {
        println!("{}", listing_line(listing, today));
    }
}

/// Use the provided value or read one line from stdin
pub fn value_or_prompt(provided: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(value) = provided {
        return Ok(value);
    }

    print!("{}: ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
