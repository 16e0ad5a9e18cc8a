//! Pantry commands.

use clap::Subcommand;

use super::{find_list, open_store, runtime, CliResult, Context};

#[derive(Subcommand)]
pub enum PantryAction {
    /// Show pantry items grouped by category with days left
    Ls {
        #[arg(long)]
        json: bool,
    },
    /// Move every checked item of a list into the pantry
    MoveChecked {
        /// List id or name
        list: String,
    },
    /// Remove an item from the pantry
    Delete {
        /// Pantry item id or name
        item: String,
    },
    /// Show or change the lifespan used when no estimate is available
    DefaultLifespan {
        /// New lifespan in days
        days: Option<u32>,
    },
}

pub fn run(ctx: &Context, action: PantryAction) -> CliResult {
    let (mut store, _config) = open_store(ctx)?;

    match action {
        PantryAction::Ls { json } => {
            let report = store.pantry_report();
            if json {
                let entries: Vec<_> = report.into_iter().flat_map(|(_, rows)| rows).collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }
            if report.is_empty() {
                println!("Pantry is empty.");
            }
            for (category, rows) in report {
                println!("{} {}", category.emoji(), category);
                for row in rows {
                    let left = match row.days_remaining {
                        0 => "expired".to_string(),
                        1 => "1 day left".to_string(),
                        n => format!("{n} days left"),
                    };
                    println!("  {:<24} {:<12} [{}]  {}", row.name, left, row.status.as_str(), row.id);
                }
            }
        }
        PantryAction::MoveChecked { list } => {
            let list_id = find_list(store.data(), &list)?.id.clone();
            let moved = runtime()?.block_on(store.move_checked_to_pantry(&list_id))?;
            match moved {
                0 => println!("Nothing checked to move."),
                1 => println!("Moved 1 item to the pantry."),
                n => println!("Moved {n} items to the pantry."),
            }
        }
        PantryAction::Delete { item } => {
            let id = resolve_pantry_item(&store, &item)?;
            store.delete_item_from_pantry(&id)?;
            println!("Pantry item deleted: {id}");
        }
        PantryAction::DefaultLifespan { days } => match days {
            Some(days) => {
                store.set_default_lifespan(days)?;
                println!("Default lifespan: {days} days");
            }
            None => println!("{}", store.data().settings.fallback_lifespan()),
        },
    }
    Ok(())
}

fn resolve_pantry_item(
    store: &super::Store,
    query: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    let data = store.data();
    if let Some(item) = data.pantry_item(query) {
        return Ok(item.id.clone());
    }
    let wanted = query.trim().to_lowercase();
    let matches: Vec<_> = data
        .pantry
        .iter()
        .filter(|p| p.name.to_lowercase() == wanted)
        .collect();
    match matches.as_slice() {
        [item] => Ok(item.id.clone()),
        [] => Err(format!("Pantry item not found: {query}").into()),
        _ => Err(format!("Pantry item name is ambiguous, use the id: {query}").into()),
    }
}
