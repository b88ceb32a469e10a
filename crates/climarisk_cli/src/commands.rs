//! Screen flows: each subcommand reads/writes through the market service
//! and renders the next screen.

use crate::screens::{render_dashboard, render_market_detail, render_not_found, render_saved};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use climarisk_core::{
    Analysis, AssetClass, CreateMarketInput, IdentityProvider, MarketId, MarketPatch,
    MarketRepository, MarketService,
};
use log::info;
use std::io::{BufRead, Write};
use std::thread;
use std::time::Duration;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the dashboard with every market.
    List,
    /// Add a market for analysis.
    Add {
        /// Descriptive name, e.g. "Downtown Chicago Commercial".
        #[arg(long)]
        name: String,
        /// City and state, e.g. "Chicago, IL".
        #[arg(long)]
        location: String,
        #[arg(long, default_value = "commercial")]
        asset_class: AssetClass,
    },
    /// Show one market with the mock analysis preview.
    Show { id: String },
    /// Delete a market after confirmation.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Change name, location or asset class of a market.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        asset_class: Option<AssetClass>,
    },
}

/// Terminal handles plus the post-write delay.
pub struct Console<'a, In: BufRead, Out: Write> {
    pub input: &'a mut In,
    pub output: &'a mut Out,
    pub write_delay: Duration,
}

pub fn run<R, I, In, Out>(
    command: Command,
    service: &MarketService<R, I>,
    console: &mut Console<'_, In, Out>,
) -> Result<()>
where
    R: MarketRepository,
    I: IdentityProvider,
    In: BufRead,
    Out: Write,
{
    match command {
        Command::List => show_dashboard(service, console),
        Command::Add {
            name,
            location,
            asset_class,
        } => {
            let market = service
                .create_market(CreateMarketInput::new(name, location, asset_class))
                .context("failed to add market")?;
            info!("event=screen_add module=cli status=ok market_id={}", market.id);
            console.output.write_all(render_saved(&market).as_bytes())?;
            settle(console);
            show_dashboard(service, console)
        }
        Command::Show { id } => {
            let id = MarketId::new(id);
            let screen = match service.get_market(&id)? {
                Some(market) => render_market_detail(&market, &Analysis::preview(&id, Utc::now())),
                None => render_not_found(&id),
            };
            console.output.write_all(screen.as_bytes())?;
            Ok(())
        }
        Command::Delete { id, yes } => {
            if !yes && !confirm(console, "Are you sure you want to delete this market?")? {
                writeln!(console.output, "Delete cancelled.")?;
                return Ok(());
            }
            let id = MarketId::new(id);
            let removed = service
                .delete_market(&id)
                .context("failed to delete market")?;
            info!("event=screen_delete module=cli status=ok market_id={id} removed={removed}");
            settle(console);
            show_dashboard(service, console)
        }
        Command::Update {
            id,
            name,
            location,
            asset_class,
        } => {
            let patch = MarketPatch {
                market_name: name,
                location,
                asset_class,
            };
            let market = service
                .update_market(&MarketId::new(id), patch)
                .context("failed to update market")?;
            settle(console);
            let preview = Analysis::preview(&market.id, Utc::now());
            console
                .output
                .write_all(render_market_detail(&market, &preview).as_bytes())?;
            Ok(())
        }
    }
}

fn show_dashboard<R, I, In, Out>(
    service: &MarketService<R, I>,
    console: &mut Console<'_, In, Out>,
) -> Result<()>
where
    R: MarketRepository,
    I: IdentityProvider,
    In: BufRead,
    Out: Write,
{
    let listing = service.list_markets().context("failed to load markets")?;
    let screen = render_dashboard(&service.greeting_name(), &listing);
    console.output.write_all(screen.as_bytes())?;
    Ok(())
}

fn confirm<In: BufRead, Out: Write>(
    console: &mut Console<'_, In, Out>,
    question: &str,
) -> Result<bool> {
    write!(console.output, "{question} [y/N] ")?;
    console.output.flush()?;
    let mut answer = String::new();
    console.input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn settle<In: BufRead, Out: Write>(console: &Console<'_, In, Out>) {
    if !console.write_delay.is_zero() {
        thread::sleep(console.write_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::{run, Command, Console};
    use climarisk_core::{
        AssetClass, CreateMarketInput, KvMarketRepository, MarketRepository, MarketService,
        MemoryKvStore,
    };
    use std::io::Cursor;
    use std::time::Duration;

    fn run_with(
        service: &MarketService<KvMarketRepository<&MemoryKvStore>>,
        command: Command,
        stdin: &str,
    ) -> String {
        let mut input = Cursor::new(stdin.as_bytes().to_vec());
        let mut output = Vec::new();
        let mut console = Console {
            input: &mut input,
            output: &mut output,
            write_delay: Duration::ZERO,
        };
        run(command, service, &mut console).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn add_saves_then_renders_dashboard() {
        let store = MemoryKvStore::new();
        let service = MarketService::new(KvMarketRepository::new(&store));

        let screen = run_with(
            &service,
            Command::Add {
                name: "Downtown Chicago Commercial".to_string(),
                location: "Chicago, IL".to_string(),
                asset_class: AssetClass::Commercial,
            },
            "",
        );

        assert!(screen.starts_with("Market saved to your dashboard: market_"));
        assert!(screen.contains("Total markets: 1"));
        assert!(screen.contains("* Downtown Chicago Commercial (commercial)"));
    }

    #[test]
    fn show_unknown_id_renders_not_found() {
        let store = MemoryKvStore::new();
        let service = MarketService::new(KvMarketRepository::new(&store));

        let screen = run_with(
            &service,
            Command::Show {
                id: "market_missing".to_string(),
            },
            "",
        );
        assert!(screen.starts_with("Market Not Found"));
    }

    #[test]
    fn declined_confirmation_keeps_market() {
        let store = MemoryKvStore::new();
        let service = MarketService::new(KvMarketRepository::new(&store));
        let market = service
            .create_market(CreateMarketInput::new("A", "B", AssetClass::Industrial))
            .unwrap();

        let screen = run_with(
            &service,
            Command::Delete {
                id: market.id.to_string(),
                yes: false,
            },
            "n\n",
        );

        assert!(screen.contains("Delete cancelled."));
        assert_eq!(KvMarketRepository::new(&store).list_all().unwrap().len(), 1);
    }

    #[test]
    fn confirmed_delete_removes_market() {
        let store = MemoryKvStore::new();
        let service = MarketService::new(KvMarketRepository::new(&store));
        let market = service
            .create_market(CreateMarketInput::new("A", "B", AssetClass::Multifamily))
            .unwrap();

        let screen = run_with(
            &service,
            Command::Delete {
                id: market.id.to_string(),
                yes: false,
            },
            "yes\n",
        );

        assert!(screen.contains("Total markets: 0"));
        assert!(service.get_market(&market.id).unwrap().is_none());
    }

    #[test]
    fn update_renders_detail_with_new_values() {
        let store = MemoryKvStore::new();
        let service = MarketService::new(KvMarketRepository::new(&store));
        let market = service
            .create_market(CreateMarketInput::new("A", "B", AssetClass::Commercial))
            .unwrap();

        let screen = run_with(
            &service,
            Command::Update {
                id: market.id.to_string(),
                name: None,
                location: Some("Denver, CO".to_string()),
                asset_class: None,
            },
            "",
        );

        assert!(screen.contains("Location: Denver, CO"));
    }
}
