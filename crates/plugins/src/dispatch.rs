use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::host::{CommandOutcome, HostContext, ItemId, Plugin};
use crate::save::SaveError;

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("plugin command name cannot be empty")]
    EmptyName,
    #[error("duplicate plugin registration: {name}")]
    Duplicate { name: String },
}

/// Owns the registered plugins and routes host lifecycle hooks and scripted
/// command lines to them. The first token of a line selects the plugin
/// (case-insensitive); the rest are its arguments.
#[derive(Default)]
pub struct PluginSet {
    plugins: Vec<Box<dyn Plugin>>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl PluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), RegisterError> {
        let name = plugin.command_name();
        if name.trim().is_empty() {
            return Err(RegisterError::EmptyName);
        }
        let lower = name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(RegisterError::Duplicate {
                name: name.to_string(),
            });
        }
        self.plugins.push(plugin);
        self.lookup_by_lower_name
            .insert(lower, self.plugins.len() - 1);
        Ok(())
    }

    /// Tokenizes and dispatches one scripted command line. Malformed lines
    /// and unknown commands are no-ops for the player; the outcome tells the
    /// host what happened.
    pub fn dispatch_line(&mut self, host: &mut HostContext<'_>, line: &str) -> CommandOutcome {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return CommandOutcome::Ignored;
        }
        let tokens = match tokenize_line(trimmed) {
            Ok(tokens) => tokens,
            Err(reason) => {
                warn!(%reason, "unparseable command line");
                return CommandOutcome::rejected(reason, "<plugin> <subcommand> [args...]");
            }
        };
        let Some((name, args)) = tokens.split_first() else {
            return CommandOutcome::Ignored;
        };
        self.dispatch(host, name, args)
    }

    pub fn dispatch(
        &mut self,
        host: &mut HostContext<'_>,
        name: &str,
        args: &[String],
    ) -> CommandOutcome {
        let lower = name.to_ascii_lowercase();
        let Some(index) = self.lookup_by_lower_name.get(&lower) else {
            debug!(command = name, "command matched no plugin");
            return CommandOutcome::Ignored;
        };
        let outcome = self.plugins[*index].on_command(host, args);
        if let CommandOutcome::Rejected { reason, usage } = &outcome {
            warn!(command = name, %reason, usage, "command rejected");
        }
        outcome
    }

    pub fn on_new_game(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_new_game();
        }
    }

    /// Collects every stateful plugin's envelope into the flat map the host
    /// embeds in its save blob.
    pub fn build_save(&self) -> Result<serde_json::Map<String, serde_json::Value>, SaveError> {
        let mut saved = serde_json::Map::new();
        for plugin in &self.plugins {
            let Some(key) = plugin.save_key() else {
                continue;
            };
            if let Some(value) = plugin.on_save()? {
                saved.insert(key.to_string(), value);
            }
        }
        Ok(saved)
    }

    /// Replaces plugin state wholesale from a save blob. A plugin missing
    /// from the blob is reset to its new-game state, so older saves load
    /// cleanly after a plugin is added.
    pub fn apply_save(
        &mut self,
        saved: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), SaveError> {
        for plugin in &mut self.plugins {
            let Some(key) = plugin.save_key() else {
                continue;
            };
            match saved.get(key) {
                Some(value) => plugin.on_load(value)?,
                None => {
                    debug!(key, "save blob has no state for plugin, resetting");
                    plugin.on_new_game();
                }
            }
        }
        Ok(())
    }

    pub fn notify_equip_change(
        &mut self,
        host: &mut HostContext<'_>,
        slot: u32,
        item: Option<ItemId>,
    ) {
        for plugin in &mut self.plugins {
            plugin.on_equip_change(host, slot, item);
        }
    }
}

/// Splits on whitespace outside double quotes; quotes group spaces into one
/// token and an empty `""` is a real (empty) token.
fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut token_open = false;

    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
            token_open = true;
        } else if ch.is_whitespace() && !in_quotes {
            if token_open {
                tokens.push(std::mem::take(&mut current));
                token_open = false;
            }
        } else {
            current.push(ch);
            token_open = true;
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if token_open {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::TestHost;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records what it was asked to do; the test keeps a handle to the state.
    #[derive(Debug, Default)]
    struct ProbeState {
        commands_seen: Vec<Vec<String>>,
        new_games: u32,
        note: String,
    }

    struct ProbePlugin {
        name: &'static str,
        state: Rc<RefCell<ProbeState>>,
    }

    fn probe(name: &'static str) -> (Box<ProbePlugin>, Rc<RefCell<ProbeState>>) {
        let state = Rc::new(RefCell::new(ProbeState::default()));
        (
            Box::new(ProbePlugin {
                name,
                state: Rc::clone(&state),
            }),
            state,
        )
    }

    impl Plugin for ProbePlugin {
        fn command_name(&self) -> &'static str {
            self.name
        }

        fn save_key(&self) -> Option<&'static str> {
            Some(self.name)
        }

        fn on_new_game(&mut self) {
            let mut state = self.state.borrow_mut();
            state.new_games += 1;
            state.note.clear();
        }

        fn on_save(&self) -> Result<Option<serde_json::Value>, SaveError> {
            Ok(Some(json!({ "note": self.state.borrow().note })))
        }

        fn on_load(&mut self, value: &serde_json::Value) -> Result<(), SaveError> {
            self.state.borrow_mut().note =
                value["note"].as_str().unwrap_or_default().to_string();
            Ok(())
        }

        fn on_command(&mut self, _host: &mut HostContext<'_>, args: &[String]) -> CommandOutcome {
            self.state.borrow_mut().commands_seen.push(args.to_vec());
            CommandOutcome::Handled
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut set = PluginSet::new();
        set.register(probe("journal").0).expect("first");
        let error = set.register(probe("journal").0).unwrap_err();
        assert!(matches!(error, RegisterError::Duplicate { .. }));
    }

    #[test]
    fn dispatch_routes_by_case_insensitive_first_token() {
        let mut set = PluginSet::new();
        let (plugin, state) = probe("journal");
        set.register(plugin).expect("register");
        let mut host = TestHost::default();
        let outcome = set.dispatch_line(&mut host.context(), "Journal add quests intro");
        assert_eq!(outcome, CommandOutcome::Handled);
        assert_eq!(
            state.borrow().commands_seen,
            vec![vec![
                "add".to_string(),
                "quests".to_string(),
                "intro".to_string()
            ]]
        );
    }

    #[test]
    fn unknown_command_is_ignored() {
        let mut set = PluginSet::new();
        let mut host = TestHost::default();
        assert_eq!(
            set.dispatch_line(&mut host.context(), "nothing here"),
            CommandOutcome::Ignored
        );
    }

    #[test]
    fn quoted_arguments_keep_their_spaces() {
        let mut set = PluginSet::new();
        let (plugin, state) = probe("journal");
        set.register(plugin).expect("register");
        let mut host = TestHost::default();
        set.dispatch_line(&mut host.context(), "journal add quests \"the long road\"");
        assert_eq!(
            state.borrow().commands_seen[0],
            vec![
                "add".to_string(),
                "quests".to_string(),
                "the long road".to_string()
            ]
        );
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let mut set = PluginSet::new();
        set.register(probe("journal").0).expect("register");
        let mut host = TestHost::default();
        assert!(matches!(
            set.dispatch_line(&mut host.context(), "journal add \"oops"),
            CommandOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn new_game_fans_out_to_every_plugin() {
        let mut set = PluginSet::new();
        let (plugin_a, state_a) = probe("a");
        let (plugin_b, state_b) = probe("b");
        set.register(plugin_a).expect("register");
        set.register(plugin_b).expect("register");
        set.on_new_game();
        assert_eq!(state_a.borrow().new_games, 1);
        assert_eq!(state_b.borrow().new_games, 1);
    }

    #[test]
    fn save_blob_is_keyed_per_plugin_and_missing_keys_reset() {
        let mut set = PluginSet::new();
        let (plugin_a, state_a) = probe("a");
        let (plugin_b, state_b) = probe("b");
        set.register(plugin_a).expect("register");
        set.register(plugin_b).expect("register");

        let mut blob = set.build_save().expect("save");
        assert!(blob.contains_key("a") && blob.contains_key("b"));

        // Drop one plugin's state, as an older save would lack it.
        blob.remove("b");
        blob.insert("a".to_string(), json!({ "note": "kept" }));
        set.apply_save(&blob).expect("load");
        assert_eq!(state_a.borrow().note, "kept");
        assert_eq!(state_b.borrow().new_games, 1);
    }
}
