use clap::Parser;
use log::{error, info, warn};
use srs_admin::frequency::format_frequency;
use srs_admin::{AdminConsole, CommandDispatcher, FrequencyForm, FrequencyListDraft, SyncConfig};
use srs_server::{AdminServer, AdminState, EnvelopeStyle, ServerConfig};
use srs_shared::{ClientState, Coalition, FrequencyKind, Notification, RemoteFacade};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Interval of the periodic pull in milliseconds
    #[arg(short = 'p', long, default_value = "3000", value_parser = clap::value_parser!(u64).range(1..))]
    poll_interval_ms: u64,

    /// Lifetime of a notification in milliseconds
    #[arg(short = 't', long, default_value = "8000")]
    notification_ttl_ms: u64,

    /// Simulate latency of the admin service in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_latency_ms: u64,

    /// Push payload shape: raw, data or array
    #[arg(short = 'e', long, default_value = "raw")]
    envelope: EnvelopeStyle,

    /// Maximum number of voice clients
    #[arg(long, default_value = "64")]
    max_clients: usize,

    /// Stop after this many seconds
    #[arg(short = 'd', long, default_value = "30")]
    duration_secs: u64,

    /// Run a scripted sequence of admin commands
    #[arg(long)]
    demo: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = SyncConfig::default()
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
        .with_notification_ttl(Duration::from_millis(args.notification_ttl_ms));

    info!("Starting admin console...");
    if args.fake_latency_ms > 0 {
        info!("Simulating {}ms latency", args.fake_latency_ms);
    }

    let server = Arc::new(AdminServer::with_state(
        AdminState::seeded(args.max_clients),
        ServerConfig {
            max_clients: args.max_clients,
            fake_latency: Duration::from_millis(args.fake_latency_ms),
            envelope: args.envelope,
        },
    ));
    let pilots = seed_clients(&server).await;

    let facade: Arc<dyn RemoteFacade> = server.clone();
    let mut console = AdminConsole::mount(facade, &config)?;

    if args.demo {
        let server = Arc::clone(&server);
        let commands = console.commands.clone();
        let poll_interval = config.poll_interval;
        tokio::spawn(async move {
            run_demo(server, commands, pilots, poll_interval).await;
        });
    }

    let deadline = sleep(Duration::from_secs(args.duration_secs));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Run time elapsed");
                break;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for ctrl-c: {}", e);
                }
                break;
            }
            Ok(()) = console.status.changed() => {
                if let Some(status) = console.status.current() {
                    info!(
                        "Status: http={} voice={} control={}",
                        status.http.is_running, status.voice.is_running, status.control.is_running
                    );
                    for (service, message) in status.errors() {
                        warn!("{} error: {}", service, message);
                    }
                }
            }
            Ok(()) = console.settings.changed() => {
                if let Some(settings) = console.settings.current() {
                    let global: Vec<String> = settings
                        .frequencies
                        .global_frequencies
                        .iter()
                        .map(|f| format_frequency(*f))
                        .collect();
                    info!(
                        "Settings: http port {}, global frequencies [{}]",
                        settings.servers.http.port,
                        global.join(", ")
                    );
                }
            }
            Ok(()) = console.roster.changed() => {
                if let Some(roster) = console.roster.current() {
                    info!("Roster: {} client(s)", roster.len());
                    for (id, client) in &roster {
                        info!("  [{}] {} ({}){}", id, client.name, client.coalition, if client.muted { " muted" } else { "" });
                    }
                }
            }
            Ok(()) = console.coalitions.changed() => {
                if let Some(coalitions) = console.coalitions.current() {
                    let names: Vec<&str> = coalitions.iter().map(|c| c.name.as_str()).collect();
                    info!("Coalitions: {}", names.join(", "));
                }
            }
            Ok(()) = console.bans.changed() => {
                if let Some(bans) = console.bans.current() {
                    info!("Bans: {}", bans.len());
                }
            }
            Ok(()) = console.notifications.changed() => {
                for entry in console.notifications.current() {
                    let n = &entry.notification;
                    info!("Notification [{:?}] {}: {}", n.level, n.title, n.message);
                }
            }
        }
    }

    console.unmount().await;
    info!("Admin console stopped");

    Ok(())
}

async fn seed_clients(server: &AdminServer) -> Vec<String> {
    let mut ids = Vec::new();
    for (name, unit, coalition) in [
        ("Viper 1-1", "F-16C", "Blue"),
        ("Hornet 2-1", "F/A-18C", "Blue"),
        ("Flanker 1", "Su-27", "Red"),
    ] {
        let client = ClientState {
            name: name.to_string(),
            unit_id: unit.to_string(),
            coalition: coalition.to_string(),
            muted: false,
        };
        match server.connect_client(client).await {
            Some(id) => ids.push(id),
            None => warn!("Server full, could not seed {}", name),
        }
    }
    ids
}

async fn run_demo(
    server: Arc<AdminServer>,
    commands: CommandDispatcher,
    pilots: Vec<String>,
    poll_interval: Duration,
) {
    let step = Duration::from_secs(2);
    info!("Demo: starting");

    commands.start_server();
    sleep(step).await;

    if let Some(first) = pilots.first() {
        commands.mute(first);
        sleep(step).await;
    }

    if let Some(second) = pilots.get(1) {
        commands.kick(second, "Demo kick");
        sleep(step).await;
    }

    if let Some(third) = pilots.get(2) {
        commands.ban(third, "Demo ban");
        sleep(step).await;
    }

    // Unknown client, answered with an error notification
    commands.ban("404", "Demo ban");
    sleep(step).await;

    commands.add_coalition(Coalition {
        name: "Green".to_string(),
        description: "Neutral coalition".to_string(),
        color: "#00ff00".to_string(),
        password: "green".to_string(),
    });
    sleep(step).await;

    let current = server.inspect(|state| state.settings.frequencies.clone()).await;
    let mut draft = FrequencyListDraft::from_settings(&current);
    let mut form = FrequencyForm::new(FrequencyKind::Global);
    form.editor.type_str("251000");
    match form.submit().and_then(|submission| draft.add(submission)) {
        Ok(()) => {
            commands.save_frequencies(draft.to_settings());
        }
        Err(e) => warn!("Demo: frequency rejected: {}", e),
    }
    sleep(step).await;

    info!("Demo: admin service going away");
    server.set_available(false);
    sleep(poll_interval * 2).await;
    server.set_available(true);
    info!("Demo: admin service back");

    commands.notify(Notification::info("Demo", "Demo sequence complete"));
    sleep(step).await;
    commands.stop_server();
}
