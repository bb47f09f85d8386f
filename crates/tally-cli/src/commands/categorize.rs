//! Single-transaction categorization command

use anyhow::Result;
use tally_core::{CancellationToken, CategorizationRequest, SpendingService};

pub fn cmd_categorize(
    service: &SpendingService,
    description: &str,
    merchant: Option<&str>,
    amount: f64,
    location: Option<&str>,
    json: bool,
) -> Result<()> {
    let mut request = CategorizationRequest::new(description, amount);
    if let Some(merchant) = merchant {
        request = request.with_merchant(merchant);
    }
    if let Some(location) = location {
        request = request.with_location(location);
    }

    let response = service.categorize_transaction(&request, &CancellationToken::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("🏷️  {}", response.category_name);
    println!("   Confidence: {:.0}%", response.confidence * 100.0);
    println!("   Source:     {}", response.source);
    if let Some(pattern) = &response.matched_pattern {
        println!("   Pattern:    {}", pattern);
    }
    if !response.alternative_categories.is_empty() {
        println!("   Alternatives:");
        for alt in &response.alternative_categories {
            println!(
                "     - {} ({:.0}%)",
                alt.category_name,
                alt.confidence * 100.0
            );
        }
    }

    Ok(())
}
