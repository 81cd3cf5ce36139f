//! Interactive harness for the plugin crate. Stands in for the host engine:
//! reads command lines from stdin, routes them through the plugin set, and
//! fakes the host services (fonts, counters, stats, message window) with
//! console-backed implementations.

mod save_file;
mod services;

use std::io::{self, BufRead, Write};
use std::path::Path;

use plugins::{
    currency, CommonEventId, EquipEventConfig, EquipEventPlugin, HostContext, ItemId,
    JournalConfig, JournalPlugin, PluginSet, ProficienciesConfig, ProficienciesPlugin,
    RandomTextPlugin,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const JOURNAL_TITLE_ENV_VAR: &str = "SANDBOX_JOURNAL_TITLE";
const TEXT_WIDTH_ENV_VAR: &str = "SANDBOX_TEXT_WIDTH_PX";
const EQUIP_EVENT_ENV_VAR: &str = "SANDBOX_EQUIP_EVENT";
const UNEQUIP_EVENT_ENV_VAR: &str = "SANDBOX_UNEQUIP_EVENT";

const DEFAULT_TEXT_WIDTH_PX: u32 = 500;
const FONT_PX_PER_CHAR: u32 = 10;

/// The harness's side of the world: every service the plugins borrow during
/// a dispatch, plus the wallet the currency demo formats.
struct Sandbox {
    metrics: services::FixedAdvanceMetrics,
    variables: services::InMemoryVariables,
    stats: services::LoggingStats,
    events: services::ConsoleEvents,
    stage: services::ConsoleStage,
    wallet_cents: i64,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            metrics: services::FixedAdvanceMetrics {
                px_per_char: FONT_PX_PER_CHAR,
            },
            variables: services::InMemoryVariables::default(),
            stats: services::LoggingStats::default(),
            events: services::ConsoleEvents::default(),
            stage: services::ConsoleStage::default(),
            wallet_cents: 0,
        }
    }

    fn context(&mut self) -> HostContext<'_> {
        HostContext {
            metrics: &self.metrics,
            variables: &mut self.variables,
            stats: &mut self.stats,
            events: &mut self.events,
            stage: &mut self.stage,
        }
    }
}

fn main() {
    init_tracing();
    info!("=== Plugin Sandbox Startup ===");

    let mut plugins = PluginSet::new();
    if let Err(err) = register_plugins(&mut plugins) {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
    plugins.on_new_game();

    let mut sandbox = Sandbox::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("sandbox> ");
        let _ = stdout.flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "stdin read failed");
                break;
            }
        }
        if !run_line(&mut plugins, &mut sandbox, line.trim()) {
            break;
        }
    }
    info!("sandbox shutting down");
}

/// Executes one line; returns false when the session should end.
fn run_line(plugins: &mut PluginSet, sandbox: &mut Sandbox, line: &str) -> bool {
    let mut parts = line.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();

    match head {
        "" => {}
        "quit" | "exit" => return false,
        "help" => print_help(),
        "new_game" => {
            plugins.on_new_game();
            sandbox.variables.replace(Default::default());
            println!("new game started");
        }
        "save" => match build_and_write_save(plugins, sandbox, rest) {
            Ok(path) => println!("saved to {path}"),
            Err(err) => warn!(error = %err, "save failed"),
        },
        "load" => match read_and_apply_save(plugins, sandbox, rest) {
            Ok(path) => println!("loaded from {path}"),
            Err(err) => warn!(error = %err, "load failed"),
        },
        "equip" | "unequip" => run_equip(plugins, sandbox, head == "equip", rest),
        "wallet" => println!("wallet: {}", currency::format_decimal(sandbox.wallet_cents)),
        "earn" => match rest.parse::<i64>() {
            Ok(cents) => {
                sandbox.wallet_cents += cents;
                println!("wallet: {}", currency::format_decimal(sandbox.wallet_cents));
            }
            Err(_) => warn!(amount = rest, "earn expects a whole number of cents"),
        },
        _ => {
            plugins.dispatch_line(&mut sandbox.context(), line);
        }
    }
    true
}

fn run_equip(plugins: &mut PluginSet, sandbox: &mut Sandbox, equipping: bool, rest: &str) {
    let mut args = rest.split_whitespace();
    let Some(slot) = args.next().and_then(|raw| raw.parse::<u32>().ok()) else {
        warn!("usage: equip <slot> [item-id] / unequip <slot>");
        return;
    };
    let item = if equipping {
        args.next()
            .and_then(|raw| raw.parse::<u32>().ok())
            .map(ItemId)
            .or(Some(ItemId(1)))
    } else {
        None
    };
    plugins.notify_equip_change(&mut sandbox.context(), slot, item);
}

fn build_and_write_save(
    plugins: &PluginSet,
    sandbox: &Sandbox,
    path: &str,
) -> Result<String, String> {
    if path.is_empty() {
        return Err("usage: save <path>".to_string());
    }
    let blob = plugins
        .build_save()
        .map_err(|err| format!("collect plugin state: {err}"))?;
    let save = save_file::SaveFile::new(&sandbox.variables.export(), blob);
    save_file::write_save(Path::new(path), &save)?;
    Ok(path.to_string())
}

fn read_and_apply_save(
    plugins: &mut PluginSet,
    sandbox: &mut Sandbox,
    path: &str,
) -> Result<String, String> {
    if path.is_empty() {
        return Err("usage: load <path>".to_string());
    }
    let save = save_file::read_save(Path::new(path))?;
    plugins
        .apply_save(&save.plugins)
        .map_err(|err| format!("restore plugin state: {err}"))?;
    sandbox.variables.replace(save.variables());
    Ok(path.to_string())
}

fn register_plugins(plugins: &mut PluginSet) -> Result<(), plugins::RegisterError> {
    plugins.register(Box::new(JournalPlugin::new(journal_config_from_env())))?;
    plugins.register(Box::new(ProficienciesPlugin::new(
        proficiencies_config_from_env(),
    )))?;
    plugins.register(Box::new(RandomTextPlugin::default()))?;
    plugins.register(Box::new(EquipEventPlugin::new(equip_config_from_env())))?;
    Ok(())
}

fn journal_config_from_env() -> JournalConfig {
    let mut config = JournalConfig::default();
    if let Ok(title) = std::env::var(JOURNAL_TITLE_ENV_VAR) {
        if !title.trim().is_empty() {
            config.title = title;
        }
    }
    config.text_area_width_px = text_width_from_env();
    config
}

fn proficiencies_config_from_env() -> ProficienciesConfig {
    ProficienciesConfig {
        text_area_width_px: text_width_from_env(),
        ..ProficienciesConfig::default()
    }
}

fn equip_config_from_env() -> EquipEventConfig {
    EquipEventConfig {
        on_equip: event_id_from_env(EQUIP_EVENT_ENV_VAR),
        on_unequip: event_id_from_env(UNEQUIP_EVENT_ENV_VAR),
    }
}

fn text_width_from_env() -> u32 {
    std::env::var(TEXT_WIDTH_ENV_VAR)
        .ok()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_TEXT_WIDTH_PX)
}

fn event_id_from_env(var: &str) -> Option<CommonEventId> {
    std::env::var(var)
        .ok()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .map(CommonEventId)
}

fn print_help() {
    println!("builtins:");
    println!("  new_game            reset all plugin state");
    println!("  save <path>         write the save file");
    println!("  load <path>         restore from a save file");
    println!("  equip <slot> [item] fire an equip change");
    println!("  unequip <slot>      fire an unequip change");
    println!("  earn <cents>        add to the wallet");
    println!("  wallet              show the formatted balance");
    println!("  quit                leave");
    println!("plugin commands: journal, proficiencies, randomtext, equipevent");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
