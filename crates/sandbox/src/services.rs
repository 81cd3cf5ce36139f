use std::collections::HashMap;

use plugins::{
    ActorId, CommonEventId, EventSink, MessageView, ScreenView, Stage, StatId, StatSink,
    TextMetrics, VariableKey, VariableStore,
};
use tracing::info;

/// Fixed-advance font model: every glyph is the same width. Close enough to
/// the host font for a harness.
pub(crate) struct FixedAdvanceMetrics {
    pub(crate) px_per_char: u32,
}

impl TextMetrics for FixedAdvanceMetrics {
    fn measure(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.px_per_char
    }
}

#[derive(Default)]
pub(crate) struct InMemoryVariables {
    values: HashMap<VariableKey, i32>,
}

impl VariableStore for InMemoryVariables {
    fn value(&self, key: VariableKey) -> i32 {
        self.values.get(&key).copied().unwrap_or(0)
    }

    fn set_value(&mut self, key: VariableKey, value: i32) {
        self.values.insert(key, value);
    }
}

impl InMemoryVariables {
    pub(crate) fn export(&self) -> HashMap<VariableKey, i32> {
        self.values.clone()
    }

    pub(crate) fn replace(&mut self, values: HashMap<VariableKey, i32>) {
        self.values = values;
    }
}

#[derive(Default)]
pub(crate) struct LoggingStats {
    totals: HashMap<(ActorId, StatId), i32>,
}

impl StatSink for LoggingStats {
    fn grant_stat(&mut self, actor: ActorId, stat: StatId, amount: i32) {
        let total = self.totals.entry((actor, stat)).or_insert(0);
        *total += amount;
        info!(actor = actor.0, stat = stat.0, amount, total = *total, "stat granted");
    }
}

/// Prints presented screens and messages to stdout in place of the host's
/// window stack.
#[derive(Default)]
pub(crate) struct ConsoleStage;

impl Stage for ConsoleStage {
    fn present(&mut self, screen: ScreenView) {
        match screen {
            ScreenView::Journal(view) => {
                println!("=== {} ===", view.title);
                for category in &view.categories {
                    println!("[{}]", category.name);
                    for entry in &category.entries {
                        let marker = if entry.read { " " } else { "*" };
                        println!("{marker} {} ({})", entry.title, entry.id);
                        for line in &entry.body_lines {
                            println!("    {line}");
                        }
                    }
                }
            }
            ScreenView::Proficiencies(view) => {
                println!("=== {} ===", view.title);
                for actor in &view.actors {
                    println!(
                        "actor {} - points: {}",
                        actor.actor.0,
                        actor.points - actor.pending_points
                    );
                    for category in &actor.categories {
                        println!("[{}]", category.name);
                        for entry in &category.entries {
                            let pending = if entry.pending_levels > 0 {
                                format!(" (+{})", entry.pending_levels)
                            } else {
                                String::new()
                            };
                            println!(
                                "  {}: {}{} / {}",
                                entry.title, entry.level, pending, entry.max_level
                            );
                            for line in &entry.body_lines {
                                println!("    {line}");
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Stand-in for the host's event interpreter and message window.
#[derive(Default)]
pub(crate) struct ConsoleEvents;

impl EventSink for ConsoleEvents {
    fn reserve_common_event(&mut self, event: CommonEventId) {
        info!(event = event.0, "common event reserved");
    }

    fn show_message(&mut self, message: MessageView) {
        if let Some(face) = &message.face {
            println!("[{} #{}]", face.sheet, face.slot);
        }
        for line in message.text.lines() {
            println!("> {line}");
        }
    }
}
