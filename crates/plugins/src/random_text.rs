use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::warn;

use crate::host::{
    CommandOutcome, FaceImage, HostContext, MessageBackground, MessagePosition, MessageView, Plugin,
};
use crate::text;

/// Sentinel face name meaning "no portrait" on the scripted command channel.
const NO_FACE_TOKEN: &str = ":";

/// Builds a list of candidate messages from scripted commands and shows one
/// of them at random. The list is transient: it is cleared after every
/// display and never saved.
pub struct RandomTextPlugin {
    messages: Vec<MessageView>,
    rng: SmallRng,
}

impl Default for RandomTextPlugin {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            rng: SmallRng::from_entropy(),
        }
    }
}

impl RandomTextPlugin {
    /// Deterministic picks for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            messages: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn pending_messages(&self) -> &[MessageView] {
        &self.messages
    }

    fn command_new(&mut self, args: &[String]) -> CommandOutcome {
        const USAGE: &str = "randomtext new <face|:> <slot> <background> <position> <text...>";
        if args.len() < 5 {
            return CommandOutcome::rejected("expected at least 5 arguments", USAGE);
        }
        let face = if args[0] == NO_FACE_TOKEN {
            None
        } else {
            let Ok(slot) = args[1].parse::<u8>() else {
                return CommandOutcome::rejected(format!("invalid face slot '{}'", args[1]), USAGE);
            };
            Some(FaceImage {
                sheet: args[0].clone(),
                slot,
            })
        };
        let Some(background) = args[2]
            .parse::<u32>()
            .ok()
            .and_then(MessageBackground::from_index)
        else {
            return CommandOutcome::rejected(format!("invalid background '{}'", args[2]), USAGE);
        };
        let Some(position) = args[3]
            .parse::<u32>()
            .ok()
            .and_then(MessagePosition::from_index)
        else {
            return CommandOutcome::rejected(format!("invalid position '{}'", args[3]), USAGE);
        };
        let text = args[4..]
            .iter()
            .map(|part| text::decode_markup(part))
            .collect::<Vec<_>>()
            .join(" ");
        self.messages.push(MessageView {
            face,
            background,
            position,
            text,
        });
        CommandOutcome::Handled
    }

    fn command_append(&mut self, args: &[String]) -> CommandOutcome {
        const USAGE: &str = "randomtext append <text...>";
        if args.is_empty() {
            return CommandOutcome::rejected("expected text to append", USAGE);
        }
        let Some(last) = self.messages.last_mut() else {
            return CommandOutcome::rejected("no message to append to", USAGE);
        };
        let extra = args
            .iter()
            .map(|part| text::decode_markup(part))
            .collect::<Vec<_>>()
            .join(" ");
        last.text.push_str(&extra);
        CommandOutcome::Handled
    }

    fn command_display(&mut self, host: &mut HostContext<'_>) -> CommandOutcome {
        if self.messages.is_empty() {
            warn!("randomtext display with an empty message list");
            return CommandOutcome::Handled;
        }
        let index = self.rng.gen_range(0..self.messages.len());
        let chosen = self.messages.swap_remove(index);
        host.events.show_message(chosen);
        self.messages.clear();
        CommandOutcome::Handled
    }
}

impl Plugin for RandomTextPlugin {
    fn command_name(&self) -> &'static str {
        "randomtext"
    }

    fn on_new_game(&mut self) {
        self.messages.clear();
    }

    fn on_command(&mut self, host: &mut HostContext<'_>, args: &[String]) -> CommandOutcome {
        let Some(subcommand) = args.first() else {
            return CommandOutcome::Ignored;
        };
        match subcommand.as_str() {
            "clear" => {
                self.messages.clear();
                CommandOutcome::Handled
            }
            "new" => self.command_new(&args[1..]),
            "append" => self.command_append(&args[1..]),
            "display" => self.command_display(host),
            other => {
                warn!(subcommand = other, "unknown randomtext subcommand");
                CommandOutcome::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::TestHost;

    fn run(plugin: &mut RandomTextPlugin, host: &mut TestHost, parts: &[&str]) -> CommandOutcome {
        let args: Vec<String> = parts.iter().map(ToString::to_string).collect();
        plugin.on_command(&mut host.context(), &args)
    }

    #[test]
    fn new_parses_face_and_placement() {
        let mut plugin = RandomTextPlugin::with_seed(0);
        let mut host = TestHost::default();
        let outcome = run(
            &mut plugin,
            &mut host,
            &["new", "Actor1", "1", "0", "2", "Hi,_I'm_Elise!"],
        );
        assert_eq!(outcome, CommandOutcome::Handled);
        let message = &plugin.pending_messages()[0];
        assert_eq!(
            message.face,
            Some(FaceImage {
                sheet: "Actor1".to_string(),
                slot: 1
            })
        );
        assert_eq!(message.background, MessageBackground::Transparent);
        assert_eq!(message.position, MessagePosition::Bottom);
        assert_eq!(message.text, "Hi, I'm Elise!");
    }

    #[test]
    fn colon_face_token_means_no_portrait() {
        let mut plugin = RandomTextPlugin::with_seed(0);
        let mut host = TestHost::default();
        run(&mut plugin, &mut host, &["new", ":", "0", "1", "1", "Text"]);
        assert_eq!(plugin.pending_messages()[0].face, None);
    }

    #[test]
    fn append_extends_the_last_message_only() {
        let mut plugin = RandomTextPlugin::with_seed(0);
        let mut host = TestHost::default();
        run(&mut plugin, &mut host, &["new", ":", "0", "0", "0", "First"]);
        run(&mut plugin, &mut host, &["new", ":", "0", "0", "0", "Second"]);
        run(&mut plugin, &mut host, &["append", "[n]more"]);
        assert_eq!(plugin.pending_messages()[0].text, "First");
        assert_eq!(plugin.pending_messages()[1].text, "Second\nmore");
    }

    #[test]
    fn append_with_no_messages_is_rejected() {
        let mut plugin = RandomTextPlugin::with_seed(0);
        let mut host = TestHost::default();
        assert!(matches!(
            run(&mut plugin, &mut host, &["append", "text"]),
            CommandOutcome::Rejected { .. }
        ));
    }

    #[test]
    fn display_shows_one_candidate_and_clears_the_list() {
        let mut plugin = RandomTextPlugin::with_seed(7);
        let mut host = TestHost::default();
        run(&mut plugin, &mut host, &["new", ":", "0", "0", "0", "A"]);
        run(&mut plugin, &mut host, &["new", ":", "0", "0", "0", "B"]);
        run(&mut plugin, &mut host, &["display"]);

        assert_eq!(host.events.messages.len(), 1);
        let shown = &host.events.messages[0].text;
        assert!(shown == "A" || shown == "B");
        assert!(plugin.pending_messages().is_empty());
    }

    #[test]
    fn same_seed_picks_the_same_message() {
        let shown_with = |seed: u64| {
            let mut plugin = RandomTextPlugin::with_seed(seed);
            let mut host = TestHost::default();
            for text in ["A", "B", "C", "D"] {
                run(&mut plugin, &mut host, &["new", ":", "0", "0", "0", text]);
            }
            run(&mut plugin, &mut host, &["display"]);
            host.events.messages[0].text.clone()
        };
        assert_eq!(shown_with(42), shown_with(42));
    }

    #[test]
    fn display_on_empty_list_is_a_quiet_no_op() {
        let mut plugin = RandomTextPlugin::with_seed(0);
        let mut host = TestHost::default();
        assert_eq!(
            run(&mut plugin, &mut host, &["display"]),
            CommandOutcome::Handled
        );
        assert!(host.events.messages.is_empty());
    }

    #[test]
    fn clear_empties_pending_candidates() {
        let mut plugin = RandomTextPlugin::with_seed(0);
        let mut host = TestHost::default();
        run(&mut plugin, &mut host, &["new", ":", "0", "0", "0", "A"]);
        run(&mut plugin, &mut host, &["clear"]);
        assert!(plugin.pending_messages().is_empty());
    }
}
