pub mod auth;
pub mod config;
pub mod item;
pub mod list;
pub mod pantry;
pub mod predict;

use smartcart_core::{
    AppData, Config, Database, GeminiOracle, ListItem, OfflineOracle, Oracle, ShoppingList,
    ShoppingStore,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub type Store = ShoppingStore<Database, Box<dyn Oracle>>;

/// Flags shared by every data command.
pub struct Context {
    pub offline: bool,
}

fn oracle_for(ctx: &Context, config: &Config) -> Box<dyn Oracle> {
    if ctx.offline {
        return Box::new(OfflineOracle);
    }
    match GeminiOracle::from_config(&config.oracle) {
        Ok(oracle) => Box::new(oracle),
        Err(e) => {
            tracing::warn!("{e}; categories and lifespans will use defaults");
            Box::new(OfflineOracle)
        }
    }
}

/// Open the store backed by the on-disk database.
pub fn open_store(ctx: &Context) -> Result<(Store, Config), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let oracle = oracle_for(ctx, &config);
    let store = ShoppingStore::open_with_key(Database::open()?, oracle, &config.storage.key)?
        .with_oracle_timeout(config.oracle.timeout());
    Ok((store, config))
}

/// Single-threaded runtime for commands that wait on the oracle.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Resolve a list by exact id, then by case-insensitive name.
pub fn find_list<'a>(
    data: &'a AppData,
    query: &str,
) -> Result<&'a ShoppingList, Box<dyn std::error::Error>> {
    if let Some(list) = data.list(query) {
        return Ok(list);
    }
    let wanted = query.trim().to_lowercase();
    let matches: Vec<_> = data
        .lists
        .iter()
        .filter(|l| l.name.to_lowercase() == wanted)
        .collect();
    match matches.as_slice() {
        [list] => Ok(list),
        [] => Err(format!("List not found: {query}").into()),
        _ => Err(format!("List name is ambiguous, use the id: {query}").into()),
    }
}

/// Resolve an item by exact id, then by case-insensitive name.
pub fn find_item<'a>(
    list: &'a ShoppingList,
    query: &str,
) -> Result<&'a ListItem, Box<dyn std::error::Error>> {
    if let Some(item) = list.item(query) {
        return Ok(item);
    }
    let wanted = query.trim().to_lowercase();
    let matches: Vec<_> = list
        .items
        .iter()
        .filter(|i| i.name.to_lowercase() == wanted)
        .collect();
    match matches.as_slice() {
        [item] => Ok(item),
        [] => Err(format!("Item not found in '{}': {query}", list.name).into()),
        _ => Err(format!("Item name is ambiguous, use the id: {query}").into()),
    }
}
