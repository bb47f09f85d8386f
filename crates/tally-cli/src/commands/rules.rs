//! Categorization rule commands

use anyhow::Result;
use tally_core::{
    CancellationToken, Database, PatternType, RuleUpdate, RuleWithCategory, SpendingService,
};

use super::{resolve_category, truncate};

/// Field changes requested by `tally rules update`
#[derive(Debug, Default, Clone)]
pub struct RuleChanges {
    pub category: Option<String>,
    pub pattern: Option<String>,
    pub pattern_type: Option<String>,
    pub priority: Option<i32>,
    pub active: Option<bool>,
}

fn parse_pattern_type(value: &str) -> Result<PatternType> {
    value
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{} (valid types: exact, keyword, regex)", e))
}

pub fn cmd_rules_list(service: &SpendingService, offset: u32, limit: u32, json: bool) -> Result<()> {
    let rules = service.list_categorization_rules(offset, limit, &CancellationToken::new())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rules)?);
        return Ok(());
    }

    if rules.is_empty() {
        println!("No rules defined. Add one with:");
        println!("  tally rules add <category> <pattern> [--type exact|keyword|regex]");
        return Ok(());
    }

    println!();
    println!("📋 Categorization Rules");
    println!("   ──────────────────────────────────────────────────────────────────");
    println!(
        "   {:>4} │ {:>4} │ {:20} │ {:8} │ {:6} │ {}",
        "ID", "Pri", "Category", "Type", "Active", "Pattern"
    );
    println!("   ─────┼──────┼──────────────────────┼──────────┼────────┼────────────");

    for rule in &rules {
        println!(
            "   {:>4} │ {:>4} │ {:20} │ {:8} │ {:6} │ {}",
            rule.rule.id,
            rule.rule.priority,
            truncate(&rule.category_name, 20),
            rule.rule.pattern_type.as_str(),
            if rule.rule.is_active { "yes" } else { "no" },
            truncate(&rule.rule.pattern, 30)
        );
    }

    Ok(())
}

pub fn cmd_rules_show(service: &SpendingService, id: i64) -> Result<()> {
    let rule = service.get_categorization_rule(id, &CancellationToken::new())?;
    print_rule(&rule);
    Ok(())
}

pub fn cmd_rules_add(
    db: &Database,
    service: &SpendingService,
    category: &str,
    pattern: &str,
    pattern_type_str: &str,
    priority: i32,
) -> Result<()> {
    let category = resolve_category(db, category)?;
    let pattern_type = parse_pattern_type(pattern_type_str)?;

    let created = service.create_categorization_rule(
        category.id,
        pattern,
        pattern_type,
        priority,
        &CancellationToken::new(),
    )?;
    println!(
        "✅ Created rule #{} for category '{}': {} ({})",
        created.rule.id, created.category_name, created.rule.pattern, created.rule.pattern_type
    );

    Ok(())
}

pub fn cmd_rules_update(
    db: &Database,
    service: &SpendingService,
    id: i64,
    changes: &RuleChanges,
) -> Result<()> {
    let category_id = match &changes.category {
        Some(value) => Some(resolve_category(db, value)?.id),
        None => None,
    };
    let pattern_type = match &changes.pattern_type {
        Some(value) => Some(parse_pattern_type(value)?),
        None => None,
    };

    let update = RuleUpdate {
        category_id,
        pattern: changes.pattern.clone(),
        pattern_type,
        priority: changes.priority,
        is_active: changes.active,
    };
    if update.is_empty() {
        println!("Nothing to update. Pass --category, --pattern, --type, --priority or --active.");
        return Ok(());
    }

    let updated = service.update_categorization_rule(id, &update, &CancellationToken::new())?;
    println!("✅ Updated rule #{}", updated.rule.id);
    print_rule(&updated);

    Ok(())
}

pub fn cmd_rules_delete(service: &SpendingService, id: i64) -> Result<()> {
    service.delete_categorization_rule(id, &CancellationToken::new())?;
    println!("✅ Deleted rule #{}", id);

    Ok(())
}

fn print_rule(rule: &RuleWithCategory) {
    println!();
    println!("   Rule #{}", rule.rule.id);
    println!("   Category: {} (ID: {})", rule.category_name, rule.rule.category_id);
    println!("   Pattern:  {} ({})", rule.rule.pattern, rule.rule.pattern_type);
    println!("   Priority: {}", rule.rule.priority);
    println!("   Active:   {}", if rule.rule.is_active { "yes" } else { "no" });
    println!("   Created:  {}", rule.rule.created_at.format("%Y-%m-%d %H:%M"));
    println!("   Updated:  {}", rule.rule.updated_at.format("%Y-%m-%d %H:%M"));
}
