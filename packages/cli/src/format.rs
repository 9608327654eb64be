//! Argument parsing and table formatting for the CLI.

use muni_budget_allocation::AllocationSimulator;
use muni_budget_map_data::TopologySource;
use muni_budget_municipality_models::MunicipalityRecord;

/// `http(s)://` arguments are fetched, anything else is read from disk.
#[must_use]
pub fn topology_source(arg: &str) -> TopologySource {
    if arg.starts_with("http://") || arg.starts_with("https://") {
        TopologySource::Url(arg.to_string())
    } else {
        TopologySource::Path(arg.into())
    }
}

/// Parses a `category=percentage` assignment.
///
/// # Errors
///
/// Returns a message if the `=` is missing, the id is empty, or the
/// percentage is not a finite number.
pub fn parse_assignment(arg: &str) -> Result<(String, f64), String> {
    let (id, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <category>=<percentage>, got '{arg}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing category id in '{arg}'"));
    }
    let percentage: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid percentage in '{arg}'"))?;
    if !percentage.is_finite() {
        return Err(format!("invalid percentage in '{arg}'"));
    }
    Ok((id.to_string(), percentage))
}

/// Amount in millions with two decimals, e.g. `1755.97M`.
#[must_use]
pub fn millions(amount: f64) -> String {
    format!("{:.2}M", amount / 1_000_000.0)
}

/// Truncates to at most `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[must_use]
pub fn record_header() -> String {
    format!(
        "{:<16} {:<40} {:<20} {:<20} {:>14}",
        "ID", "NAME", "PROVINCE", "DISTRICT", "BUDGET"
    )
}

#[must_use]
pub fn record_row(record: &MunicipalityRecord) -> String {
    format!(
        "{:<16} {:<40} {:<20} {:<20} {:>14}",
        truncate(&record.id, 16),
        truncate(&record.name, 40),
        truncate(&record.province, 20),
        truncate(&record.district, 20),
        millions(record.budget)
    )
}

/// Multi-line description of one record.
#[must_use]
pub fn record_details(record: &MunicipalityRecord) -> String {
    let mut lines = vec![
        format!("{} ({})", record.name, record.type_label),
        format!("  id:        {}", record.id),
        format!("  province:  {}", record.province),
        format!("  district:  {}", record.district),
        format!("  budget:    {}", millions(record.budget)),
    ];
    if let Some(population) = record.population {
        lines.push(format!("  population: {population}"));
    }
    if let Some(area) = record.area {
        lines.push(format!("  area:      {area:.2} km²"));
    }
    let sources = &record.budget_sources;
    lines.push(format!(
        "  sources:   self {:.2}M / state {:.2}M / subsidies {:.2}M",
        sources.self_collected, sources.state_allocated, sources.subsidies
    ));
    lines.join("\n")
}

/// One line per category plus the total and over-allocation status.
#[must_use]
pub fn allocation_table(simulator: &AllocationSimulator) -> String {
    let mut lines = vec![format!("{:<16} {:>8} {:>14}", "CATEGORY", "%", "AMOUNT")];
    for category in simulator.categories() {
        lines.push(format!(
            "{:<16} {:>8.2} {:>14}",
            category.id,
            category.percentage,
            millions(category.amount)
        ));
    }
    lines.push(format!(
        "{:<16} {:>8.2} {:>14}",
        "TOTAL",
        simulator.total_percentage(),
        millions(simulator.total_percentage() / 100.0 * simulator.total_budget())
    ));
    if simulator.is_over_allocated() {
        lines.push(format!(
            "Over budget by {:.2}%",
            -simulator.remaining_percentage()
        ));
    } else {
        lines.push(format!("{:.2}% unallocated", simulator.remaining_percentage()));
    }
    lines.join("\n")
}
