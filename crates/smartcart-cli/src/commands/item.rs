//! List item commands.

use clap::Subcommand;
use smartcart_core::ItemUpdate;

use super::{find_item, find_list, open_store, runtime, CliResult, Context};

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add an item; its category is looked up automatically
    Add {
        /// List id or name
        list: String,
        /// Item name
        name: String,
    },
    /// Mark an item as picked up
    Check {
        list: String,
        /// Item id or name
        item: String,
    },
    /// Clear an item's checkmark
    Uncheck { list: String, item: String },
    /// Rename an item
    Rename {
        list: String,
        item: String,
        /// New name
        name: String,
    },
    /// Set an item's quantity
    Quantity {
        list: String,
        item: String,
        quantity: u32,
    },
    /// Remove an item from its list
    Delete { list: String, item: String },
    /// Move a single item into the pantry
    ToPantry { list: String, item: String },
}

pub fn run(ctx: &Context, action: ItemAction) -> CliResult {
    let (mut store, _config) = open_store(ctx)?;

    match action {
        ItemAction::Add { list, name } => {
            let list_id = find_list(store.data(), &list)?.id.clone();
            let id = runtime()?
                .block_on(store.add_item(&list_id, &name))?
                .ok_or_else(|| format!("List not found: {list}"))?;
            let list = find_list(store.data(), &list_id)?;
            let item = find_item(list, &id)?;
            println!("Item added: {} [{}] {}", item.name, item.category, item.id);
        }
        ItemAction::Check { list, item } => {
            let (list_id, item_id) = resolve(&store, &list, &item)?;
            store.set_checked(&list_id, &item_id, true)?;
            println!("Checked: {item_id}");
        }
        ItemAction::Uncheck { list, item } => {
            let (list_id, item_id) = resolve(&store, &list, &item)?;
            store.set_checked(&list_id, &item_id, false)?;
            println!("Unchecked: {item_id}");
        }
        ItemAction::Rename { list, item, name } => {
            let (list_id, item_id) = resolve(&store, &list, &item)?;
            let update = ItemUpdate {
                name: Some(name),
                ..ItemUpdate::default()
            };
            store.update_item_in_list(&list_id, &item_id, &update)?;
            println!("Renamed: {item_id}");
        }
        ItemAction::Quantity {
            list,
            item,
            quantity,
        } => {
            let (list_id, item_id) = resolve(&store, &list, &item)?;
            let update = ItemUpdate {
                quantity: Some(quantity),
                ..ItemUpdate::default()
            };
            store.update_item_in_list(&list_id, &item_id, &update)?;
            println!("Quantity set: {item_id} x{quantity}");
        }
        ItemAction::Delete { list, item } => {
            let (list_id, item_id) = resolve(&store, &list, &item)?;
            store.delete_item_from_list(&list_id, &item_id)?;
            println!("Item deleted: {item_id}");
        }
        ItemAction::ToPantry { list, item } => {
            let list = find_list(store.data(), &list)?;
            let item = find_item(list, &item)?.clone();
            runtime()?.block_on(store.move_item_to_pantry(&item))?;
            let entry = store
                .data()
                .pantry_item(&item.id)
                .ok_or("pantry entry missing after move")?;
            println!(
                "Moved to pantry: {} (about {} days)",
                entry.name, entry.estimated_lifespan_days
            );
        }
    }
    Ok(())
}

fn resolve(
    store: &super::Store,
    list: &str,
    item: &str,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let list = find_list(store.data(), list)?;
    let item = find_item(list, item)?;
    Ok((list.id.clone(), item.id.clone()))
}
