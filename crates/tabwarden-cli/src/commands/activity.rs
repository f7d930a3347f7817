use clap::Subcommand;
use tabwarden_core::timer::format_span;
use tabwarden_core::{ActivityFilter, TabIntentRecord};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// List recorded intents with time spent and URL history
    List {
        /// all, open or closed
        #[arg(long, default_value = "all")]
        filter: ActivityFilter,
        /// Ids of the tabs currently open (comma separated)
        #[arg(long, value_delimiter = ',')]
        open: Vec<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn secs(value: i64) -> u64 {
    value.max(0) as u64
}

fn print_record(record: &TabIntentRecord, open_ids: &[u32]) {
    let state = if record.is_open(open_ids) { "open" } else { "closed" };
    println!(
        "[{state}] tab {} - {} ({})",
        record.tab_id,
        record.intent,
        format_span(secs(record.time_spent_secs))
    );
    println!("    created {}", record.created_at.format("%Y-%m-%d %H:%M:%S"));
    if let Some(url) = record.display_url() {
        println!("    {url}");
    }
    for visit in &record.url_history {
        println!(
            "    - {} {} ({})",
            visit.visited_at.format("%H:%M:%S"),
            visit.url,
            format_span(secs(visit.time_spent_secs))
        );
    }
}

pub fn run(action: ActivityAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ActivityAction::List { filter, open, json } => {
            let (bg, _) = super::offline_service()?;
            let records = bg.activity().filtered(filter, &open)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No activity recorded yet.");
            } else {
                for record in &records {
                    print_record(record, &open);
                }
            }
        }
    }
    Ok(())
}
