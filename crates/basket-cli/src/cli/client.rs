use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use basket_core::models::{ClearMode, ItemUpdate, NewItem};
use basket_core::{BulkToggle, Coordinator, CoreConfig, CoreRuntime, HttpApi, Session};
use tracing::debug;

use super::command::{resolve_item, resolve_product, CliCommand};
use super::config::CliConfig;
use super::render;

/// Where settings come from, besides the command itself
#[derive(Debug, Clone)]
pub struct Options {
    pub config_path: PathBuf,
    /// `--base-url`, wins over the config file
    pub base_url: Option<String>,
    /// `--access-key` / `BASKET_ACCESS_KEY`, wins over the config file
    pub access_key: Option<String>,
}

/// `basket config ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    SetKey { key: String },
    ForgetKey,
    SetBaseUrl { url: String },
    Show,
}

/// Run one command against the server and print its output.
///
/// A stored key the server rejects is removed from the config file so the
/// next run starts logged out.
pub async fn run_command(command: CliCommand, options: &Options) -> Result<()> {
    let file = CliConfig::load_or_default(&options.config_path)?;
    let key = options
        .access_key
        .clone()
        .or_else(|| file.stored_key().map(str::to_string))
        .ok_or_else(|| {
            anyhow!("No access key. Run `basket config set-key <key>` or pass --access-key")
        })?;

    let session = Session::with_token(key);
    let core_config = file.core_config(options.base_url.as_deref());

    let result = match command {
        CliCommand::Watch { shopping } => watch(core_config, session.clone(), shopping).await,
        command => {
            let api = HttpApi::new(core_config, session.clone())?;
            let coordinator = Coordinator::new(Arc::new(api));
            let result = execute(&coordinator, command).await;
            coordinator.shutdown();
            result.map(|output| print!("{}", output))
        }
    };

    if !session.is_authenticated() && options.access_key.is_none() && file.stored_key().is_some() {
        let mut file = file;
        file.access_key = None;
        file.save(&options.config_path)?;
        eprintln!("The stored access key was rejected and has been removed.");
    }

    result
}

/// Load the data, run one command, and return what to print.
pub async fn execute(coordinator: &Coordinator, command: CliCommand) -> Result<String> {
    coordinator
        .refresh()
        .await
        .context("Failed to load the shopping list")?;

    let output = match command {
        CliCommand::List => render::plain_list(&coordinator.plain_list()),
        CliCommand::Shop => render::shopping_mode(&coordinator.shopping_mode(), coordinator.progress()),
        CliCommand::Products => render::catalog(&coordinator.catalog()),
        CliCommand::Search { query } => search(coordinator, &query),
        CliCommand::Add {
            product,
            quantity,
            note,
            create,
        } => {
            let product = match resolve_product(coordinator, &product) {
                Ok(product) => product,
                Err(_) if create => coordinator.create_product(&product).await?,
                Err(e) => return Err(e),
            };
            if coordinator.snapshot().entry_for_product(product.id).is_some() {
                bail!("{} is already on the list", product.name);
            }
            let item = coordinator
                .add_item(
                    NewItem::from_product(product.id)
                        .with_quantity(quantity)
                        .with_note(note),
                )
                .await?;
            format!("Added {}\n", render::item_line(&item).trim_start())
        }
        CliCommand::AddCustom {
            name,
            quantity,
            note,
        } => {
            let new_item = NewItem::custom(&name)
                .ok_or_else(|| anyhow!("Name cannot be empty"))?
                .with_quantity(quantity)
                .with_note(note);
            let item = coordinator.add_item(new_item).await?;
            format!("Added {}\n", render::item_line(&item).trim_start())
        }
        CliCommand::Edit {
            item,
            quantity,
            note,
        } => {
            let entry = resolve_item(coordinator, &item)?;
            if quantity.is_none() && note.is_none() {
                bail!("Nothing to change; pass --quantity and/or --note");
            }
            let updated = coordinator
                .update_item(entry.id, ItemUpdate::new(quantity, note))
                .await?;
            format!("Updated {}\n", render::item_line(&updated).trim_start())
        }
        CliCommand::Check { item } => {
            let entry = resolve_item(coordinator, &item)?;
            let updated = coordinator.toggle_checked(entry.id).await?;
            format!("{}\n", render::item_line(&updated).trim_start())
        }
        CliCommand::Remove { item } => {
            let entry = resolve_item(coordinator, &item)?;
            coordinator.delete_item(entry.id).await?;
            format!("Removed {}\n", entry.display_name())
        }
        CliCommand::Clear { keep_unchecked } => {
            let mode = if keep_unchecked {
                ClearMode::KeepUnchecked
            } else {
                ClearMode::All
            };
            coordinator.clear_list(mode).await?;
            match mode {
                ClearMode::All => "List cleared\n".to_string(),
                ClearMode::KeepUnchecked => "Checked entries removed\n".to_string(),
            }
        }
        CliCommand::ProductAdd { name } => {
            if let Some(existing) = coordinator.find_product(&name) {
                bail!("{} already exists", existing.name);
            }
            let product = coordinator.create_product(&name).await?;
            format!("Created {} (id {})\n", product.name, product.id)
        }
        CliCommand::ProductRename { product, name } => {
            let product = resolve_product(coordinator, &product)?;
            let renamed = coordinator.rename_product(product.id, &name).await?;
            format!("Renamed {} to {}\n", product.name, renamed.name)
        }
        CliCommand::ProductDelete { product } => {
            let product = resolve_product(coordinator, &product)?;
            coordinator.delete_product(product.id).await?;
            format!("Deleted {}\n", product.name)
        }
        CliCommand::ProductReorder { products } => {
            let order = products
                .iter()
                .map(|p| resolve_product(coordinator, p).map(|p| p.id))
                .collect::<Result<Vec<_>>>()?;
            let catalog = coordinator.reorder_products(&order).await?;
            render::catalog(&catalog)
        }
        CliCommand::ProductMove { product, position } => {
            let product = resolve_product(coordinator, &product)?;
            let catalog = coordinator
                .move_product(product.id, position.saturating_sub(1))
                .await?;
            render::catalog(&catalog)
        }
        CliCommand::Bulk { product, quantity } => {
            let product = resolve_product(coordinator, &product)?;
            match coordinator.toggle_product_on_list(product.id, quantity).await? {
                BulkToggle::Added(item) => {
                    format!("Added {}\n", render::item_line(&item).trim_start())
                }
                BulkToggle::Removed(_) => format!("Removed {}\n", product.name),
            }
        }
        CliCommand::Watch { .. } => bail!("watch needs the update stream"),
    };

    Ok(output)
}

fn search(coordinator: &Coordinator, query: &str) -> String {
    let found = coordinator.search(query);
    let mut output: String = found
        .iter()
        .map(|p| format!("{:>5}  {}\n", p.id, p.name))
        .collect();

    if found.is_empty() {
        output.push_str("No matching products.\n");
    }
    if !query.trim().is_empty() && coordinator.find_product(query).is_none() {
        output.push_str(&format!(
            "No product called \"{}\"; `basket add --create \"{}\"` adds it.\n",
            query.trim(),
            query.trim()
        ));
    }
    output
}

fn view(coordinator: &Coordinator, shopping: bool) -> String {
    if shopping {
        render::shopping_mode(&coordinator.shopping_mode(), coordinator.progress())
    } else {
        render::plain_list(&coordinator.plain_list())
    }
}

/// Follow the update stream and reprint the list on every change until
/// Ctrl-C or until the key is rejected.
async fn watch(config: CoreConfig, session: Session, shopping: bool) -> Result<()> {
    let mut runtime = CoreRuntime::new(config, session.clone())?;
    runtime
        .start()
        .await
        .context("Failed to load the shopping list")?;

    let coordinator = runtime.coordinator().clone();
    let mut changes = coordinator.subscribe_changes();
    let mut session_rx = session.subscribe();
    print!("{}", view(&coordinator, shopping));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                println!();
                print!("{}", view(&coordinator, shopping));
            }
            changed = session_rx.changed() => {
                if changed.is_err() || !session.is_authenticated() {
                    runtime.shutdown();
                    bail!("Access key rejected");
                }
            }
        }
    }

    runtime.shutdown();
    Ok(())
}

/// Handle `basket config ...`; returns what to print.
pub fn run_config(action: ConfigAction, options: &Options) -> Result<String> {
    let path = &options.config_path;
    let mut config = CliConfig::load_or_default(path)?;

    let output = match action {
        ConfigAction::SetKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                bail!("Access key cannot be empty");
            }
            config.access_key = Some(key.to_string());
            config.save(path)?;
            format!("Access key saved to {}\n", path.display())
        }
        ConfigAction::ForgetKey => {
            if config.access_key.take().is_none() {
                return Ok("No access key stored\n".to_string());
            }
            config.save(path)?;
            "Access key removed\n".to_string()
        }
        ConfigAction::SetBaseUrl { url } => {
            config.base_url = Some(url.trim().trim_end_matches('/').to_string());
            config.save(path)?;
            format!("Server set to {}\n", url.trim())
        }
        ConfigAction::Show => {
            let effective = config.core_config(options.base_url.as_deref());
            let key = if options.access_key.is_some() || config.stored_key().is_some() {
                "set"
            } else {
                "not set"
            };
            format!(
                "config file: {}\nserver: {}\naccess key: {}\nreconnect delay: {} ms\n",
                path.display(),
                effective.base_url,
                key,
                effective.reconnect_delay.as_millis()
            )
        }
    };

    Ok(output)
}
