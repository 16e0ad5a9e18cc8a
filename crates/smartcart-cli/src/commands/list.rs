//! Shopping list commands.

use clap::Subcommand;
use smartcart_core::pantry::group_by_category;

use super::{find_list, open_store, CliResult, Context};

#[derive(Subcommand)]
pub enum ListAction {
    /// Create a new list
    Create {
        /// List name
        name: String,
    },
    /// Delete a list and its items
    Delete {
        /// List id or name
        list: String,
    },
    /// Show all lists
    Ls {
        #[arg(long)]
        json: bool,
    },
    /// Show a list's items grouped by category
    Show {
        /// List id or name
        list: String,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(ctx: &Context, action: ListAction) -> CliResult {
    let (mut store, _config) = open_store(ctx)?;

    match action {
        ListAction::Create { name } => {
            let id = store.add_list(&name)?;
            println!("List created: {id}");
        }
        ListAction::Delete { list } => {
            let id = find_list(store.data(), &list)?.id.clone();
            store.delete_list(&id)?;
            println!("List deleted: {id}");
        }
        ListAction::Ls { json } => {
            let lists = &store.data().lists;
            if json {
                println!("{}", serde_json::to_string_pretty(lists)?);
            } else if lists.is_empty() {
                println!("No lists yet. Create one with `smartcart list create <name>`.");
            } else {
                for list in lists {
                    println!(
                        "{}  {} ({} items, {} checked)",
                        list.id,
                        list.name,
                        list.items.len(),
                        list.checked_count()
                    );
                }
            }
        }
        ListAction::Show { list, json } => {
            let list = find_list(store.data(), &list)?;
            if json {
                println!("{}", serde_json::to_string_pretty(list)?);
                return Ok(());
            }
            println!("{} ({})", list.name, list.id);
            if list.items.is_empty() {
                println!("  (empty)");
            }
            for (category, items) in group_by_category(&list.items) {
                println!("{} {}", category.emoji(), category);
                for item in items {
                    let mark = if item.is_checked { "x" } else { " " };
                    let qty = if item.quantity > 1 {
                        format!(" x{}", item.quantity)
                    } else {
                        String::new()
                    };
                    println!("  [{mark}] {}{qty}  {}", item.name, item.id);
                }
            }
            let checked = list.checked_count();
            if checked > 0 {
                println!("{checked} checked; move them with `smartcart pantry move-checked {}`", list.id);
            }
        }
    }
    Ok(())
}
