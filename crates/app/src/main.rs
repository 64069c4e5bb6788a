use std::fmt;
use std::sync::Arc;

use learn_core::model::{ProgressCardView, Tutorial, TutorialId};
use services::config::PROGRESS_API_URL_ENV;
use services::{
    ConfigError, HttpProgressApi, ProgressApiConfig, ProgressStore, StaticIdentity, SyncOutcome,
    TutorialCatalog,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingTutorialId { command: &'static str },
    UnknownArg(String),
    InvalidTutorialId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingTutorialId { command } => {
                write!(f, "{command} requires a tutorial id")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTutorialId { raw } => write!(f, "invalid tutorial id: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug)]
enum RunError {
    ProgressUnavailable,
    NotApplied { command: &'static str },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::ProgressUnavailable => {
                write!(f, "progress could not be loaded (see log output)")
            }
            RunError::NotApplied { command } => {
                write!(f, "{command} was not applied (see log output)")
            }
        }
    }
}

impl std::error::Error for RunError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [status]          [options]");
    eprintln!("  cargo run -p app -- complete <id>     [options]");
    eprintln!("  cargo run -p app -- uncomplete <id>   [options]");
    eprintln!("  cargo run -p app -- reset             [options]");
    eprintln!("  cargo run -p app -- watch             [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --api <url>        progress endpoint");
    eprintln!("  --user <uid>       signed-in user id");
    eprintln!("  --catalog <path>   JSON array of tutorials for the learning path");
    eprintln!("  --json             print the progress card as JSON");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {PROGRESS_API_URL_ENV}, LEARN_USER_ID, LEARN_CATALOG_PATH, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Status,
    Complete(TutorialId),
    Uncomplete(TutorialId),
    Reset,
    Watch,
}

impl Command {
    fn name(self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Complete(_) => "complete",
            Command::Uncomplete(_) => "uncomplete",
            Command::Reset => "reset",
            Command::Watch => "watch",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    api_url: Option<String>,
    user_id: Option<String>,
    catalog_path: Option<String>,
    json: bool,
}

impl Args {
    /// Parse arguments; flags fall back to the environment values passed in.
    fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter().peekable();

        let command = match args.next_if(|arg| !arg.starts_with("--")) {
            None => Command::Status,
            Some(first) => match first.as_str() {
                "status" => Command::Status,
                "reset" => Command::Reset,
                "watch" => Command::Watch,
                "complete" => Command::Complete(parse_tutorial_id(&mut args, "complete")?),
                "uncomplete" => Command::Uncomplete(parse_tutorial_id(&mut args, "uncomplete")?),
                _ => return Err(ArgsError::UnknownArg(first)),
            },
        };

        let mut parsed = Self {
            command,
            api_url: None,
            user_id: env("LEARN_USER_ID"),
            catalog_path: env("LEARN_CATALOG_PATH"),
            json: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => parsed.api_url = Some(require_value(&mut args, "--api")?),
                "--user" => parsed.user_id = Some(require_value(&mut args, "--user")?),
                "--catalog" => parsed.catalog_path = Some(require_value(&mut args, "--catalog")?),
                "--json" => parsed.json = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(parsed))
    }
}

fn parse_tutorial_id(
    args: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<TutorialId, ArgsError> {
    let raw = args.next().ok_or(ArgsError::MissingTutorialId { command })?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidTutorialId { raw: raw.clone() })
}

fn describe(tutorial: Option<&Tutorial>) -> String {
    tutorial.map_or_else(
        || "-".to_string(),
        |t| format!("#{} {} ({})", t.number, t.title, t.id),
    )
}

fn render(view: &ProgressCardView, json: bool) -> Result<String, serde_json::Error> {
    if json {
        return serde_json::to_string_pretty(view);
    }

    let resume = if view.is_path_finished() {
        "learning path finished".to_string()
    } else {
        describe(view.tutorial_to_resume_from.as_ref())
    };
    Ok(format!(
        "progress:       {:.0}%\nlast completed: {}\nresume from:    {}",
        view.progress_percentage,
        describe(view.last_completed_tutorial.as_ref()),
        resume
    ))
}

/// `--api` wins when given; otherwise the environment decides. Blank values
/// mean the default endpoint either way.
fn api_config(flag: Option<&str>) -> Result<ProgressApiConfig, ConfigError> {
    match flag {
        Some(raw) => ProgressApiConfig::from_setting(Some(raw)),
        None => ProgressApiConfig::from_env(),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Some(args) = Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok())
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?
    else {
        print_usage();
        return Ok(());
    };

    let config = api_config(args.api_url.as_deref())?;
    let catalog = match args.catalog_path.as_deref() {
        Some(path) => TutorialCatalog::from_json_file(path)?,
        None => {
            tracing::warn!("no catalog configured, derived views use an empty learning path");
            TutorialCatalog::empty()
        }
    };
    let identity = args
        .user_id
        .clone()
        .map_or_else(StaticIdentity::anonymous, StaticIdentity::signed_in);

    tracing::info!(endpoint = %config.base_url, "loading progress");
    let store = ProgressStore::new(
        Arc::new(HttpProgressApi::new(config)),
        Arc::new(identity),
        catalog,
    );
    tracing::debug!(tutorials = store.catalog().len(), "learning path catalog");
    if store.initialize().await != SyncOutcome::Applied {
        return Err(RunError::ProgressUnavailable.into());
    }

    let outcome = match args.command {
        Command::Status | Command::Watch => SyncOutcome::Skipped,
        Command::Complete(id) => store.mark_completed(id).await,
        Command::Uncomplete(id) => store.mark_not_completed(id).await,
        Command::Reset => store.reset_all().await,
    };
    match outcome {
        SyncOutcome::Failed | SyncOutcome::Superseded => {
            return Err(RunError::NotApplied {
                command: args.command.name(),
            }
            .into());
        }
        SyncOutcome::Skipped if args.command != Command::Status && args.command != Command::Watch => {
            tracing::info!(command = args.command.name(), "nothing to change");
        }
        _ => {}
    }

    let mut cards = store.progress_card_view();
    if args.command != Command::Watch {
        println!("{}", render(&cards.current(), args.json)?);
        return Ok(());
    }

    loop {
        tokio::select! {
            view = cards.next() => match view {
                Some(view) => println!("{}\n", render(&view, args.json)?),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "services=info,app=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(args.iter().map(|a| (*a).to_string()), |_| None)
    }

    #[test]
    fn defaults_to_status() {
        let args = parse(&[]).unwrap().unwrap();
        assert_eq!(args.command, Command::Status);
        assert!(!args.json);
    }

    #[test]
    fn flags_without_subcommand_mean_status() {
        let args = parse(&["--user", "u-1", "--json"]).unwrap().unwrap();
        assert_eq!(args.command, Command::Status);
        assert_eq!(args.user_id.as_deref(), Some("u-1"));
        assert!(args.json);
    }

    #[test]
    fn complete_takes_a_tutorial_id() {
        let args = parse(&["complete", "12", "--catalog", "path.json"]).unwrap().unwrap();
        assert_eq!(args.command, Command::Complete(TutorialId::new(12)));
        assert_eq!(args.catalog_path.as_deref(), Some("path.json"));
    }

    #[test]
    fn rejects_bad_tutorial_id() {
        let err = parse(&["uncomplete", "twelve"]).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidTutorialId { .. }));
        let err = parse(&["complete"]).unwrap_err();
        assert!(matches!(err, ArgsError::MissingTutorialId { command: "complete" }));
    }

    #[test]
    fn environment_is_overridden_by_flags() {
        let args = Args::parse(
            ["--user".to_string(), "flag-user".to_string()],
            |key| match key {
                "LEARN_USER_ID" => Some("env-user".into()),
                "LEARN_CATALOG_PATH" => Some("env.json".into()),
                _ => None,
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(args.user_id.as_deref(), Some("flag-user"));
        assert_eq!(args.catalog_path.as_deref(), Some("env.json"));
    }

    #[test]
    fn api_url_comes_only_from_the_flag() {
        let args = Args::parse(["--api".to_string(), "http://flag".to_string()], |key| {
            (key == PROGRESS_API_URL_ENV).then(|| "http://env".to_string())
        })
        .unwrap()
        .unwrap();
        assert_eq!(args.api_url.as_deref(), Some("http://flag"));

        let args = Args::parse(Vec::new(), |key| {
            (key == PROGRESS_API_URL_ENV).then(|| "http://env".to_string())
        })
        .unwrap()
        .unwrap();
        assert!(args.api_url.is_none());
    }

    #[test]
    fn api_flag_wins_and_blank_means_default() {
        let config = api_config(Some("http://127.0.0.1:9000/api/progress")).unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:9000/api/progress");

        assert_eq!(api_config(Some("  ")).unwrap(), ProgressApiConfig::default());
    }

    #[test]
    fn without_flag_the_environment_setting_is_used() {
        let raw = std::env::var(PROGRESS_API_URL_ENV).ok();
        assert_eq!(
            api_config(None).ok(),
            ProgressApiConfig::from_setting(raw.as_deref()).ok()
        );
    }

    #[test]
    fn help_returns_none() {
        assert!(parse(&["reset", "--help"]).unwrap().is_none());
    }

    #[test]
    fn missing_flag_value_is_reported() {
        let err = parse(&["--user"]).unwrap_err();
        assert_eq!(err.to_string(), "--user requires a value");
    }

    #[test]
    fn renders_finished_path() {
        let view = ProgressCardView {
            progress_percentage: 100.0,
            last_completed_tutorial: Some(Tutorial::titled(3, 3, "Wrap-up")),
            tutorial_to_resume_from: None,
        };
        let text = render(&view, false).unwrap();
        assert!(text.contains("100%"));
        assert!(text.contains("#3 Wrap-up (3)"));
        assert!(text.contains("learning path finished"));
    }
}
