use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::host::{
    ActorId, CommandOutcome, HostContext, Plugin, ScreenView, StatSink, TextMetrics, VariableKey,
    VariableStore,
};
use crate::ledger::{Category, Entry};
use crate::save::{self, SaveError};
use crate::text;

mod spend;

pub use spend::SpendSession;

const SAVE_VERSION: u32 = 1;
const SAVE_KEY: &str = "proficiencies";
const DEFAULT_PRICE_TABLE_LEN: u32 = 10;

#[derive(Debug, Clone)]
pub struct ProficienciesConfig {
    pub title: String,
    pub text_area_width_px: u32,
}

impl Default for ProficienciesConfig {
    fn default() -> Self {
        Self {
            title: "Proficiencies".to_string(),
            text_area_width_px: 500,
        }
    }
}

/// One actor's proficiency categories plus the unspent points balance they
/// draw on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorTable {
    points: u32,
    categories: Vec<Category>,
}

impl ActorTable {
    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    fn ensure_category(&mut self, name: &str) -> &mut Category {
        let index = match self.categories.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.categories.push(Category::new(name));
                self.categories.len() - 1
            }
        };
        &mut self.categories[index]
    }

    fn find_entry(&self, category: &str, id: &str) -> Option<&Entry> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .and_then(|c| c.find_by_id(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSession {
    actor: ActorId,
    category: String,
    entry_id: String,
    spend: SpendSession,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SavedActorTable {
    actor: ActorId,
    #[serde(flatten)]
    table: ActorTable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SavedProficiencies {
    save_version: u32,
    actors: Vec<SavedActorTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProficiencyEntryView {
    pub id: String,
    pub title: String,
    pub level: u32,
    pub max_level: u32,
    pub pending_levels: u32,
    pub body_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProficiencyCategoryView {
    pub name: String,
    pub entries: Vec<ProficiencyEntryView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProficiencyActorView {
    pub actor: ActorId,
    pub points: u32,
    pub pending_points: u32,
    pub categories: Vec<ProficiencyCategoryView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProficienciesView {
    pub title: String,
    pub actors: Vec<ProficiencyActorView>,
}

/// Skill-point allocation: per-actor point balances, title-sorted proficiency
/// categories, and a transient spend session while one entry is being
/// adjusted. Navigating away abandons the session.
pub struct ProficienciesPlugin {
    config: ProficienciesConfig,
    ledger: BTreeMap<ActorId, ActorTable>,
    session: Option<ActiveSession>,
}

impl ProficienciesPlugin {
    pub fn new(config: ProficienciesConfig) -> Self {
        Self {
            config,
            ledger: BTreeMap::new(),
            session: None,
        }
    }

    pub fn actor_table(&self, actor: ActorId) -> Option<&ActorTable> {
        self.ledger.get(&actor)
    }

    pub fn session(&self) -> Option<&SpendSession> {
        self.session.as_ref().map(|s| &s.spend)
    }

    pub fn add_points(&mut self, actor: ActorId, amount: u32) {
        let table = self.ledger.entry(actor).or_default();
        table.points = table.points.saturating_add(amount);
    }

    /// Removes points, clamping at zero rather than going negative.
    pub fn sub_points(&mut self, actor: ActorId, amount: u32) {
        if let Some(table) = self.ledger.get_mut(&actor) {
            table.points = table.points.saturating_sub(amount);
        }
    }

    pub fn add_entry(&mut self, actor: ActorId, category: &str, entry: Entry) {
        self.ledger
            .entry(actor)
            .or_default()
            .ensure_category(category)
            .add(entry);
    }

    /// Opens an entry for adjustment, replacing any previous session. Returns
    /// false (and goes idle) when the entry does not exist.
    pub fn open_entry(&mut self, actor: ActorId, category: &str, id: &str) -> bool {
        let exists = self
            .ledger
            .get(&actor)
            .and_then(|table| table.find_entry(category, id))
            .is_some();
        self.session = exists.then(|| ActiveSession {
            actor,
            category: category.to_string(),
            entry_id: id.to_string(),
            spend: SpendSession::default(),
        });
        exists
    }

    pub fn increment(&mut self, variables: &dyn VariableStore) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(table) = self.ledger.get(&session.actor) else {
            return false;
        };
        let Some(entry) = table.find_entry(&session.category, &session.entry_id) else {
            return false;
        };
        let current_level = current_level(entry, variables);
        session.spend.increment(entry, current_level, table.points)
    }

    pub fn decrement(&mut self, variables: &dyn VariableStore) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(table) = self.ledger.get(&session.actor) else {
            return false;
        };
        let Some(entry) = table.find_entry(&session.category, &session.entry_id) else {
            return false;
        };
        session.spend.decrement(entry, current_level(entry, variables))
    }

    /// Commits the staged allocation to the entry's level counter and the
    /// actor's balance. The session stays open for further adjustment.
    pub fn confirm(&mut self, variables: &mut dyn VariableStore, stats: &mut dyn StatSink) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(table) = self.ledger.get_mut(&session.actor) else {
            return false;
        };
        let ActorTable { points, categories } = table;
        let Some(entry) = categories
            .iter()
            .find(|c| c.name == session.category)
            .and_then(|c| c.find_by_id(&session.entry_id))
        else {
            return false;
        };
        session
            .spend
            .commit(entry, session.actor, points, variables, stats)
    }

    /// Backs out of the adjustment without applying, keeping the entry open.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.spend.cancel();
        }
    }

    /// Abandons the session entirely, as when the ledger view closes.
    pub fn close(&mut self) {
        self.session = None;
    }

    pub fn show(&self, host: &mut HostContext<'_>) {
        let view = self.build_view(host.metrics, &*host.variables);
        host.stage.present(ScreenView::Proficiencies(view));
    }

    fn build_view(
        &self,
        metrics: &dyn TextMetrics,
        variables: &dyn VariableStore,
    ) -> ProficienciesView {
        let mut actors = Vec::with_capacity(self.ledger.len());
        for (actor, table) in &self.ledger {
            let session = self
                .session
                .as_ref()
                .filter(|session| session.actor == *actor);
            let categories = table
                .categories
                .iter()
                .map(|category| ProficiencyCategoryView {
                    name: category.name.clone(),
                    entries: category
                        .entries()
                        .iter()
                        .map(|entry| {
                            let pending = session
                                .filter(|s| s.category == category.name && s.entry_id == entry.id)
                                .map(|s| s.spend.pending_levels())
                                .unwrap_or(0);
                            ProficiencyEntryView {
                                id: entry.id.clone(),
                                title: entry.title.clone(),
                                level: current_level(entry, variables),
                                max_level: entry.max_level,
                                pending_levels: pending,
                                body_lines: text::wrap(
                                    &entry.body,
                                    self.config.text_area_width_px,
                                    metrics,
                                )
                                .split('\n')
                                .map(ToString::to_string)
                                .collect(),
                            }
                        })
                        .collect(),
                })
                .collect();
            actors.push(ProficiencyActorView {
                actor: *actor,
                points: table.points,
                pending_points: session.map(|s| s.spend.pending_points()).unwrap_or(0),
                categories,
            });
        }
        ProficienciesView {
            title: self.config.title.clone(),
            actors,
        }
    }

    fn command_add(&mut self, args: &[String]) -> CommandOutcome {
        const USAGE: &str =
            "proficiencies add <actor> <category> <id> <level_var> <max> <title> <desc...>";
        if args.len() < 7 {
            return CommandOutcome::rejected("expected at least 7 arguments", USAGE);
        }
        let Some(actor) = parse_actor(&args[0]) else {
            return CommandOutcome::rejected(format!("invalid actor id '{}'", args[0]), USAGE);
        };
        let category = args[1].as_str();
        let id = args[2].as_str();
        let Ok(level_var) = args[3].parse::<u32>() else {
            return CommandOutcome::rejected(format!("invalid level variable '{}'", args[3]), USAGE);
        };
        let Ok(max_level) = args[4].parse::<u32>() else {
            return CommandOutcome::rejected(format!("invalid max level '{}'", args[4]), USAGE);
        };
        let title = text::decode_markup(&args[5]);
        let body = args[6..]
            .iter()
            .map(|part| text::decode_markup(part))
            .collect::<Vec<_>>()
            .join(" ");

        let mut entry = Entry::note(id, title, body);
        entry.max_level = max_level;
        entry.level_key = Some(VariableKey(level_var));
        entry.price_table = (1..=DEFAULT_PRICE_TABLE_LEN).collect();
        self.add_entry(actor, category, entry);
        CommandOutcome::Handled
    }

    fn command_spend(
        &mut self,
        host: &mut HostContext<'_>,
        args: &[String],
    ) -> CommandOutcome {
        const USAGE: &str = "proficiencies spend <actor> <category> <id> <levels>";
        if args.len() != 4 {
            return CommandOutcome::rejected("expected exactly 4 arguments", USAGE);
        }
        let Some(actor) = parse_actor(&args[0]) else {
            return CommandOutcome::rejected(format!("invalid actor id '{}'", args[0]), USAGE);
        };
        let Ok(levels) = args[3].parse::<u32>() else {
            return CommandOutcome::rejected(format!("invalid level count '{}'", args[3]), USAGE);
        };
        if !self.open_entry(actor, &args[1], &args[2]) {
            return CommandOutcome::rejected(
                format!("no entry '{}' in category '{}'", args[2], args[1]),
                USAGE,
            );
        }
        let mut staged = 0;
        for _ in 0..levels {
            if !self.increment(&*host.variables) {
                break;
            }
            staged += 1;
        }
        if staged < levels {
            debug!(requested = levels, staged, "scripted spend hit a guard");
        }
        self.confirm(host.variables, host.stats);
        self.close();
        CommandOutcome::Handled
    }
}

impl Plugin for ProficienciesPlugin {
    fn command_name(&self) -> &'static str {
        "proficiencies"
    }

    fn save_key(&self) -> Option<&'static str> {
        Some(SAVE_KEY)
    }

    fn on_new_game(&mut self) {
        self.ledger.clear();
        self.session = None;
    }

    fn on_save(&self) -> Result<Option<serde_json::Value>, SaveError> {
        let saved = SavedProficiencies {
            save_version: SAVE_VERSION,
            actors: self
                .ledger
                .iter()
                .map(|(actor, table)| SavedActorTable {
                    actor: *actor,
                    table: table.clone(),
                })
                .collect(),
        };
        save::encode_state(SAVE_KEY, &saved).map(Some)
    }

    fn on_load(&mut self, value: &serde_json::Value) -> Result<(), SaveError> {
        let saved: SavedProficiencies = save::decode_state(SAVE_KEY, value)?;
        save::check_version(SAVE_KEY, SAVE_VERSION, saved.save_version)?;
        self.ledger = saved
            .actors
            .into_iter()
            .map(|saved| (saved.actor, saved.table))
            .collect();
        self.session = None;
        Ok(())
    }

    fn on_command(&mut self, host: &mut HostContext<'_>, args: &[String]) -> CommandOutcome {
        let Some(subcommand) = args.first() else {
            return CommandOutcome::Ignored;
        };
        match subcommand.as_str() {
            "show" => {
                self.show(host);
                CommandOutcome::Handled
            }
            "addpoints" | "subpoints" => {
                const USAGE: &str = "proficiencies addpoints|subpoints <actor> <amount>";
                if args.len() != 3 {
                    return CommandOutcome::rejected("expected exactly 2 arguments", USAGE);
                }
                let Some(actor) = parse_actor(&args[1]) else {
                    return CommandOutcome::rejected(
                        format!("invalid actor id '{}'", args[1]),
                        USAGE,
                    );
                };
                let Ok(amount) = args[2].parse::<u32>() else {
                    return CommandOutcome::rejected(format!("invalid amount '{}'", args[2]), USAGE);
                };
                if subcommand == "addpoints" {
                    self.add_points(actor, amount);
                } else {
                    self.sub_points(actor, amount);
                }
                CommandOutcome::Handled
            }
            "add" => self.command_add(&args[1..]),
            "spend" => self.command_spend(host, &args[1..]),
            other => {
                warn!(subcommand = other, "unknown proficiencies subcommand");
                CommandOutcome::Ignored
            }
        }
    }
}

fn current_level(entry: &Entry, variables: &dyn VariableStore) -> u32 {
    entry
        .level_key
        .map(|key| variables.value(key).max(0) as u32)
        .unwrap_or(0)
}

fn parse_actor(token: &str) -> Option<ActorId> {
    token.parse::<u32>().ok().map(ActorId)
}
