use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::{CommandOutcome, HostContext, Plugin, ScreenView, TextMetrics};
use crate::ledger::{Category, Entry, EntryField};
use crate::save::{self, SaveError};
use crate::text;

const SAVE_VERSION: u32 = 1;
const SAVE_KEY: &str = "journal";

#[derive(Debug, Clone)]
pub struct JournalConfig {
    pub title: String,
    pub text_area_width_px: u32,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            title: "Captain's Log".to_string(),
            text_area_width_px: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SavedJournal {
    save_version: u32,
    categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntryView {
    pub id: String,
    pub title: String,
    pub read: bool,
    pub body_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalCategoryView {
    pub name: String,
    pub entries: Vec<JournalEntryView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalView {
    pub title: String,
    pub categories: Vec<JournalCategoryView>,
}

/// Multi-category journal driven entirely by scripted commands; the host's
/// menu opens it through [`JournalPlugin::show`].
pub struct JournalPlugin {
    config: JournalConfig,
    categories: Vec<Category>,
}

impl JournalPlugin {
    pub fn new(config: JournalConfig) -> Self {
        Self {
            config,
            categories: Vec::new(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn add_entry(&mut self, category: &str, entry: Entry) {
        let index = match self.categories.iter().position(|c| c.name == category) {
            Some(index) => index,
            None => {
                self.categories.push(Category::new(category));
                self.categories.len() - 1
            }
        };
        self.categories[index].add(entry);
    }

    /// Marks an entry read, as the presentation layer does when the player
    /// selects it.
    pub fn select(&mut self, category: &str, id: &str) -> bool {
        self.categories
            .iter_mut()
            .find(|c| c.name == category)
            .map(|c| c.mark_read(id))
            .unwrap_or(false)
    }

    pub fn show(&self, host: &mut HostContext<'_>) {
        let view = self.build_view(host.metrics);
        host.stage.present(ScreenView::Journal(view));
    }

    fn build_view(&self, metrics: &dyn TextMetrics) -> JournalView {
        JournalView {
            title: self.config.title.clone(),
            categories: self
                .categories
                .iter()
                .map(|category| JournalCategoryView {
                    name: category.name.clone(),
                    entries: category
                        .entries()
                        .iter()
                        .map(|entry| JournalEntryView {
                            id: entry.id.clone(),
                            title: entry.title.clone(),
                            read: entry.read,
                            body_lines: wrap_paragraphs(
                                &entry.body,
                                self.config.text_area_width_px,
                                metrics,
                            ),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    fn command_add(&mut self, args: &[String]) -> CommandOutcome {
        const USAGE: &str = "journal add <category> <id> <title> <body...>";
        if args.len() < 4 {
            return CommandOutcome::rejected("expected at least 4 arguments", USAGE);
        }
        let title = text::decode_markup(&args[2]);
        let body = args[3..]
            .iter()
            .map(|part| text::decode_markup(part))
            .collect::<Vec<_>>()
            .join(" ");
        self.add_entry(&args[0], Entry::note(&args[1], title, body));
        CommandOutcome::Handled
    }

    fn command_edit(&mut self, args: &[String], append: bool) -> CommandOutcome {
        const UPDATE_USAGE: &str = "journal update <category> <id> <title|body> <value...>";
        const APPEND_USAGE: &str = "journal append <category> <id> <title|body> <value...>";
        let usage = if append { APPEND_USAGE } else { UPDATE_USAGE };
        if args.len() < 4 {
            return CommandOutcome::rejected("expected at least 4 arguments", usage);
        }
        let Some(field) = EntryField::parse(&args[2]) else {
            return CommandOutcome::rejected(format!("unknown field '{}'", args[2]), usage);
        };
        let value = args[3..]
            .iter()
            .map(|part| text::decode_markup(part))
            .collect::<Vec<_>>()
            .join(" ");
        let Some(category) = self.categories.iter_mut().find(|c| c.name == args[0]) else {
            return CommandOutcome::rejected(format!("unknown category '{}'", args[0]), usage);
        };
        let found = if append {
            category.append(&args[1], field, &value)
        } else {
            category.update(&args[1], field, &value)
        };
        if !found {
            // Lookup misses are quiet no-ops, matching the rest of the
            // command surface.
            warn!(id = %args[1], category = %args[0], "journal edit matched no entry");
        }
        CommandOutcome::Handled
    }

    fn command_delete(&mut self, args: &[String]) -> CommandOutcome {
        const USAGE: &str = "journal delete <category> <id>";
        if args.len() != 2 {
            return CommandOutcome::rejected("expected exactly 2 arguments", USAGE);
        }
        let Some(category) = self.categories.iter_mut().find(|c| c.name == args[0]) else {
            return CommandOutcome::rejected(format!("unknown category '{}'", args[0]), USAGE);
        };
        if !category.delete(&args[1]) {
            warn!(id = %args[1], category = %args[0], "journal delete matched no entry");
        }
        CommandOutcome::Handled
    }
}

impl Plugin for JournalPlugin {
    fn command_name(&self) -> &'static str {
        "journal"
    }

    fn save_key(&self) -> Option<&'static str> {
        Some(SAVE_KEY)
    }

    fn on_new_game(&mut self) {
        self.categories.clear();
    }

    fn on_save(&self) -> Result<Option<serde_json::Value>, SaveError> {
        let saved = SavedJournal {
            save_version: SAVE_VERSION,
            categories: self.categories.clone(),
        };
        save::encode_state(SAVE_KEY, &saved).map(Some)
    }

    fn on_load(&mut self, value: &serde_json::Value) -> Result<(), SaveError> {
        let saved: SavedJournal = save::decode_state(SAVE_KEY, value)?;
        save::check_version(SAVE_KEY, SAVE_VERSION, saved.save_version)?;
        self.categories = saved.categories;
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
            "add" | "entry" => self.command_add(&args[1..]),
            "update" => self.command_edit(&args[1..], false),
            "append" => self.command_edit(&args[1..], true),
            "delete" => self.command_delete(&args[1..]),
            other => {
                warn!(subcommand = other, "unknown journal subcommand");
                CommandOutcome::Ignored
            }
        }
    }
}

/// Wraps each paragraph separately so scripted `[n]` breaks survive layout.
fn wrap_paragraphs(body: &str, budget_px: u32, metrics: &dyn TextMetrics) -> Vec<String> {
    body.split('\n')
        .flat_map(|paragraph| {
            if paragraph.trim().is_empty() {
                vec![String::new()]
            } else {
                text::wrap(paragraph, budget_px, metrics)
                    .split('\n')
                    .map(ToString::to_string)
                    .collect()
            }
        })
        .collect()
}
