use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client_core::{
    config::normalize_base_url, load_settings, ClientError, ClientEvent, CrmClient, ReminderApi,
};
use shared::{
    domain::{ReminderId, ReminderPriority, ReminderType, SuggestedAction},
    protocol::ReminderFilter,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(name = "reminders", about = "Stale lead and quote reminders for the sales CRM")]
struct Cli {
    /// Backend API base URL (overrides config and environment).
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default, Clone)]
struct FilterArgs {
    #[arg(long)]
    priority: Option<ReminderPriority>,
    #[arg(long = "type")]
    reminder_type: Option<ReminderType>,
}

impl FilterArgs {
    fn to_filter(&self) -> ReminderFilter {
        ReminderFilter {
            priority: self.priority,
            reminder_type: self.reminder_type,
            dismissed: false,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "CRM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    /// Open reminders, most urgent first.
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    Summary,
    Dismiss {
        id: ReminderId,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Mark a reminder handled with the action actually taken.
    Act {
        id: ReminderId,
        #[arg(long)]
        action: SuggestedAction,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Carry out the suggested action: print the record to open and log it.
    Open { id: ReminderId },
    /// Ask the backend to scan for newly stale leads and quotes.
    Generate,
    /// Keep the list on screen, refreshing on an interval.
    Watch {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings()?;
    if let Some(url) = &cli.api_url {
        settings.api_base_url = normalize_base_url(url)?;
    }
    if let Command::Watch {
        interval: Some(seconds),
        ..
    } = &cli.command
    {
        settings.poll_interval_seconds = *seconds;
    }

    let client = CrmClient::connect(settings)?;
    if let Err(err) = run(&client, cli).await {
        match err.downcast_ref::<ClientError>() {
            Some(client_err) if client_err.requires_login() => {
                eprintln!("{}", client_err.notification_text());
                eprintln!("Run `reminders login --username <name>` to sign in.");
            }
            Some(client_err) => eprintln!("{}", client_err.notification_text()),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(client: &CrmClient, cli: Cli) -> Result<()> {
    let json = cli.json;
    let board = &client.board;

    match cli.command {
        Command::Login { username, password } => {
            let user = client.transport.login(&username, &password).await?;
            println!("Signed in as {}", render::user_line(&user));
        }
        Command::Logout => {
            client.transport.logout().await?;
            println!("Signed out.");
        }
        Command::Whoami => {
            let user = client.transport.current_user().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("{}", render::user_line(&user));
            }
        }
        Command::List { filter } => {
            let reminders = board.set_filter(filter.to_filter()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reminders)?);
            } else {
                print!("{}", render::reminder_table(&reminders, &[]));
            }
        }
        Command::Summary => {
            let summary = board.api().stale_summary().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", render::summary_line(&summary));
            }
        }
        Command::Dismiss { id, reason } => {
            board.dismiss(id, reason.as_deref()).await?;
            println!("Dismissed reminder #{id}.");
        }
        Command::Act { id, action, notes } => {
            board.act(id, action, notes.as_deref()).await?;
            println!("Recorded '{}' on reminder #{id}.", action.label());
        }
        Command::Open { id } => {
            board.refresh().await?;
            let outcome = board.dispatch(id).await?;
            match outcome.target {
                Some(target) => {
                    println!("{}", target.url(&client.settings.web_base_url));
                }
                None => println!(
                    "Reminder #{id} has no linked record for '{}'; action recorded.",
                    outcome.action.label()
                ),
            }
        }
        Command::Generate => {
            let response = board.api().generate().await?;
            println!("Generated {} new reminders.", response.created);
        }
        Command::Watch { filter, .. } => watch(client, filter.to_filter(), json).await?,
    }

    Ok(())
}

async fn watch(client: &CrmClient, filter: ReminderFilter, json: bool) -> Result<()> {
    let board = &client.board;
    board.replace_filter(filter).await;
    let mut events = client.events.subscribe();
    let poller = client.watch();
    let mut outcome = Ok(());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ClientEvent::RemindersUpdated { .. }) => {
                    let reminders = board.reminders().await;
                    if json {
                        println!("{}", serde_json::to_string(&reminders)?);
                        continue;
                    }
                    let mut pending = Vec::with_capacity(reminders.len());
                    for reminder in &reminders {
                        pending.push(board.is_pending(reminder.id).await);
                    }
                    print!("{}", render::reminder_table(&reminders, &pending));
                }
                Ok(ClientEvent::SummaryUpdated(summary)) if !json => {
                    println!("{}\n", render::summary_line(&summary));
                }
                Ok(ClientEvent::Notification(message)) => eprintln!("{message}"),
                Ok(ClientEvent::LoginRequired) => {
                    outcome = Err(ClientError::Unauthorized.into());
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "watch fell behind on events"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    poller.stop().await;
    outcome
}
