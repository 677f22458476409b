//! `phishguard` driver binary

use clap::{value_parser, Arg, ArgAction, Command};
use phishguard_engine::sim::{run_simulation, SimulationConfig};
use phishguard_engine::EngineConfig;
use phishguard_platform::Platform;
use phishguard_relay::JsonFileStore;
use phishguard_render::{render_from_store, report_scaffold};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("PhishGuard injection engine driver")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run a scripted webmail session")
                .arg(
                    Arg::new("platform")
                        .long("platform")
                        .default_value("gmail")
                        .help("Host platform: gmail or outlook"),
                )
                .arg(
                    Arg::new("tick-ms")
                        .long("tick-ms")
                        .default_value("100")
                        .value_parser(value_parser!(u64))
                        .help("Safety-net tick period in milliseconds"),
                )
                .arg(
                    Arg::new("api-url")
                        .long("api-url")
                        .help("Call a live classification service at this base URL"),
                )
                .arg(
                    Arg::new("fail-backend")
                        .long("fail-backend")
                        .action(ArgAction::SetTrue)
                        .help("Script the backend to refuse every request"),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Render the persisted report payload as text")
                .arg(
                    Arg::new("store")
                        .long("store")
                        .default_value("phishguard_report.json")
                        .help("Path of the report store file"),
                ),
        );

    match cli.get_matches().subcommand() {
        Some(("simulate", args)) => {
            let platform = parse_platform(args.get_one::<String>("platform").map(String::as_str))?;
            let tick_ms = *args
                .get_one::<u64>("tick-ms")
                .ok_or_else(|| anyhow::anyhow!("missing tick period"))?;

            let mut engine = EngineConfig::new()
                .with_check_interval(Duration::from_millis(tick_ms.max(10)));
            let api_url = args.get_one::<String>("api-url");
            if let Some(url) = api_url {
                engine = engine.with_api_base_url(url);
            }
            let config = SimulationConfig {
                platform,
                fail_backend: args.get_flag("fail-backend"),
                live_backend: api_url.is_some(),
                engine,
            };

            println!("Running scripted session on {platform}...");
            println!();
            let report = run_simulation(config).await;
            println!("{}", report.generate_text());
            std::process::exit(i32::from(!report.passed()));
        }
        Some(("report", args)) => {
            let path = args
                .get_one::<String>("store")
                .ok_or_else(|| anyhow::anyhow!("missing store path"))?;
            let config = EngineConfig::new().with_store_path(path);
            let store = JsonFileStore::new(&config.store_path);
            let mut doc = report_scaffold();
            if render_from_store(&store, &mut doc).await? {
                println!("{}", doc.text_content(doc.root()));
            } else {
                println!(
                    "No report data persisted at {}.",
                    config.store_path.display()
                );
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_platform(raw: Option<&str>) -> anyhow::Result<Platform> {
    match raw {
        Some("gmail") => Ok(Platform::Gmail),
        Some("outlook") => Ok(Platform::Outlook),
        other => anyhow::bail!(
            "unsupported platform {:?}; expected gmail or outlook",
            other.unwrap_or("")
        ),
    }
}
