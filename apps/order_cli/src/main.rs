use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use order_client::{
    load_settings, Board, CardMoveController, ClientEvent, FormSchema, HttpOrderApi, MoveOutcome,
    OrderApi, OrderEditor,
};
use shared::{
    domain::{Card, OrderId, Status},
    protocol::OrderFields,
};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    /// Overrides the configured server url.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drag one card from `from` and drop it on `to`.
    Move {
        #[arg(long)]
        order_id: String,
        #[arg(long)]
        from: Status,
        #[arg(long)]
        to: Status,
    },
    /// Delete one order from the board.
    Delete {
        #[arg(long)]
        order_id: String,
        #[arg(long, default_value = "new_order")]
        status: Status,
    },
    /// Check order fields locally without contacting the server.
    Validate {
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    Submit {
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    SaveDraft {
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    Ok((name.trim().to_string(), value.to_string()))
}

fn print_events(rx: &mut broadcast::Receiver<ClientEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            ClientEvent::Notice { level, message } => println!("[{level:?}] {message}"),
            ClientEvent::ReloadRequested => println!("board reload requested"),
            other => println!("{other:?}"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    info!(server_url = %settings.server_url, "using order server");
    let api: Arc<dyn OrderApi> = Arc::new(HttpOrderApi::new(&settings)?);

    match cli.command {
        Command::Move { order_id, from, to } => {
            let order_id: OrderId = order_id.parse()?;
            let board = Board::from_cards([Card::new(order_id.clone(), from)]);
            let controller = CardMoveController::new(api, settings, board);
            let mut events = controller.subscribe_events();

            controller.drag_start(&order_id).await?;
            controller.drag_enter(to).await?;
            let outcome = controller.drop_on(to).await?;
            print_events(&mut events);
            match outcome {
                MoveOutcome::Confirmed { .. } | MoveOutcome::Unchanged => {}
                other => return Err(anyhow!("move did not go through: {other:?}")),
            }
        }
        Command::Delete { order_id, status } => {
            let order_id: OrderId = order_id.parse()?;
            let board = Board::from_cards([Card::new(order_id.clone(), status)]);
            let controller = CardMoveController::new(api, settings, board);
            let mut events = controller.subscribe_events();
            let result = controller.delete(&order_id).await;
            print_events(&mut events);
            result?;
        }
        Command::Validate { fields } => {
            let values: OrderFields = fields.into_iter().collect();
            let report = FormSchema::order_form().validate(&values, Local::now().date_naive());
            for (name, outcome) in &report.outcomes {
                match outcome {
                    Ok(()) => println!("{name}: ok"),
                    Err(err) => println!("{name}: {err}"),
                }
            }
            if let Some((name, _)) = report.first_invalid() {
                return Err(anyhow!("form is invalid; first error in '{name}'"));
            }
        }
        Command::Submit { fields } => {
            let editor = OrderEditor::new(api, settings, fields.into_iter().collect());
            let mut events = editor.subscribe_events();
            let result = editor.submit().await;
            print_events(&mut events);
            let outcome = result?;
            println!("redirect to {} in {:?}", outcome.redirect_to, outcome.after);
        }
        Command::SaveDraft { fields } => {
            let editor = OrderEditor::new(api, settings, fields.into_iter().collect());
            let mut events = editor.subscribe_events();
            let result = editor.save_draft().await;
            print_events(&mut events);
            result?;
        }
    }

    Ok(())
}
