//! Predicted reorders.

use super::{open_store, CliResult, Context};

pub fn run(ctx: &Context, json: bool) -> CliResult {
    let (store, config) = open_store(ctx)?;
    let predictions = store.predictions(config.prediction.max_items);

    if json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
        return Ok(());
    }
    if predictions.is_empty() {
        println!("Nothing due right now.");
        return Ok(());
    }

    let now = store.now();
    println!("Time to buy again:");
    for p in &predictions {
        println!(
            "  {:<24} every ~{} days, last bought {}, {} days overdue",
            p.name,
            p.average_interval().num_days(),
            p.last_purchase.format("%Y-%m-%d"),
            p.overdue_by(now).num_days()
        );
    }
    Ok(())
}
