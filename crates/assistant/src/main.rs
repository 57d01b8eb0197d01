//! `vidchat` -- terminal front end for the video editing assistant.
//!
//! # Environment variables
//!
//! | Variable             | Required | Default | Description                                   |
//! |----------------------|----------|---------|-----------------------------------------------|
//! | `VIDCHAT_USER_ID`    | yes      | --      | Owner of the sessions                         |
//! | `VIDCHAT_VIDEO_URL`  | no       | --      | Start a new session on this video             |
//! | `VIDCHAT_VIDEO_ID`   | no       | --      | Identifier stored with a new session          |
//! | `VIDCHAT_FEATURE_ID` | no       | --      | Feature reference sent with every agent call  |
//! | `VIDCHAT_SESSION_ID` | no       | --      | Resume this session instead of starting one   |
//!
//! Service URLs and timeouts are read by [`GatewayConfig::from_env`].

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidchat_assistant::commands::{self, Command, HELP};
use vidchat_assistant::{render, AcceptOutcome, EditorSession, SessionError};
use vidchat_core::state::TurnReport;
use vidchat_gateway::{ConfigError, GatewayConfig, Gateways, SessionFilter};

/// Used when `RUST_LOG` is unset. Names every workspace crate.
const DEFAULT_LOG_FILTER: &str =
    "vidchat=info,vidchat_assistant=debug,vidchat_core=info,vidchat_gateway=info";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "vidchat exited with an error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), SessionError> {
    let config = GatewayConfig::from_env()?;
    let user_id = env("VIDCHAT_USER_ID").ok_or(ConfigError::Missing {
        var: "VIDCHAT_USER_ID",
    })?;
    let feature_id = env("VIDCHAT_FEATURE_ID");

    tracing::info!(
        api_url = %config.api_url,
        export_url = %config.export_url,
        agent_timeout_secs = config.agent_timeout.as_secs(),
        %user_id,
        "Starting vidchat"
    );

    let session = EditorSession::new(Gateways::from_config(&config), user_id, feature_id);

    if let Some(session_id) = env("VIDCHAT_SESSION_ID") {
        session.load(&session_id).await?;
    } else if let Some(video_url) = env("VIDCHAT_VIDEO_URL") {
        session.open_new(env("VIDCHAT_VIDEO_ID"), &video_url).await?;
    } else {
        return Err(ConfigError::Missing {
            var: "VIDCHAT_VIDEO_URL",
        }
        .into());
    }

    println!("{HELP}\n");
    let mut shown = print_new_items(&session, 0).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let command = match commands::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        let reset = matches!(command, Command::Open(_) | Command::Delete);

        if let Err(e) = execute(&session, command).await {
            println!("! {e}");
        }

        if reset {
            shown = 0;
        }
        shown = print_new_items(&session, shown).await;
        if let Some(banner) = session.persist_error().await {
            println!("! Changes were not saved: {banner} (/dismiss)");
        }
        if session.has_new_edits().await {
            println!("* New edits in the queue (/edits)");
        }
    }
    Ok(())
}

async fn execute(session: &EditorSession, command: Command) -> Result<(), SessionError> {
    match command {
        Command::Say(text) => report(session.submit(&text).await?),
        Command::Accept(id) => match session.accept(&id).await? {
            AcceptOutcome::Applied { video_url } => println!("Accepted: {video_url}"),
            AcceptOutcome::Materialized(outcome) => report(outcome),
        },
        Command::Reject(id) => {
            session.reject(&id).await?;
            println!("Rejected.");
        }
        Command::Undo(id) => {
            if session.undo(&id).await? {
                println!("Undone.");
            } else {
                println!("Only the latest accepted edit can be undone.");
            }
        }
        Command::Recommendations => println!("{}", session.view(render::recommendations).await),
        Command::Back => navigate(session, session.step_back().await).await,
        Command::Forward => navigate(session, session.step_forward().await).await,
        Command::Edits => {
            session.acknowledge_new_edits().await;
            match session.edit_queue().await {
                Some(snapshot) => println!("{}", render::edit_queue(&snapshot)),
                None => println!("Edit queue not loaded."),
            }
        }
        Command::MutateEdit { mutation, edit_id } => {
            report(session.mutate_edit(mutation, &edit_id).await?)
        }
        Command::Sessions => {
            let list = session.list_sessions(&SessionFilter::default()).await?;
            println!("{}", render::sessions(&list, chrono::Utc::now()));
        }
        Command::Open(session_id) => {
            session.load(&session_id).await?;
            println!("{}", session.view(render::timeline).await);
        }
        Command::Rename(name) => {
            session.rename(&name).await?;
            println!("Renamed.");
        }
        Command::Delete => {
            session.delete().await?;
            println!("Session deleted. Use /open to continue with another one.");
        }
        Command::Versions => {
            let versions = session.versions().await?;
            println!("{}", render::versions(&versions, chrono::Utc::now()));
        }
        Command::Export => println!("Published: {}", session.export_current().await?),
        Command::Dismiss => session.dismiss_persist_error().await,
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    Ok(())
}

async fn navigate(session: &EditorSession, moved: bool) {
    if !moved {
        println!("No further versions.");
    }
    println!("{}", session.view(render::timeline).await);
}

fn report(outcome: TurnReport) {
    if let TurnReport::EditMutation {
        edit_id,
        succeeded: false,
    } = outcome
    {
        println!("Edit {edit_id} was not changed.");
    }
}

/// Print transcript items from `shown` on; returns the new count.
async fn print_new_items(session: &EditorSession, shown: usize) -> usize {
    session
        .view(|state| {
            let merged = state.merged();
            for item in merged.iter().skip(shown) {
                if !item.turn.text.is_empty() {
                    println!("{}", render::item(state, item));
                }
            }
            merged.len()
        })
        .await
}

fn env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}
