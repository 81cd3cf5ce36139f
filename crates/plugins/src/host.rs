use serde::{Deserialize, Serialize};

use crate::journal::JournalView;
use crate::proficiencies::ProficienciesView;
use crate::save::SaveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Key into the host's numeric counter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariableKey(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommonEventId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceImage {
    pub sheet: String,
    pub slot: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBackground {
    #[default]
    Transparent,
    Dim,
    Solid,
}

impl MessageBackground {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Transparent),
            1 => Some(Self::Dim),
            2 => Some(Self::Solid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessagePosition {
    Top,
    Middle,
    #[default]
    Bottom,
}

impl MessagePosition {
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Top),
            1 => Some(Self::Middle),
            2 => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// One message handed to the host's message window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub face: Option<FaceImage>,
    pub background: MessageBackground,
    pub position: MessagePosition,
    pub text: String,
}

/// A fully laid-out screen, ready for the host's presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenView {
    Journal(JournalView),
    Proficiencies(ProficienciesView),
}

/// String width under the host's current font, in pixels.
pub trait TextMetrics {
    fn measure(&self, text: &str) -> u32;
}

/// The host's per-key numeric counter store. Entry levels live here, not in
/// the plugin state, so the host can read and script against them directly.
pub trait VariableStore {
    fn value(&self, key: VariableKey) -> i32;
    fn set_value(&mut self, key: VariableKey, value: i32);
}

pub trait StatSink {
    fn grant_stat(&mut self, actor: ActorId, stat: StatId, amount: i32);
}

pub trait EventSink {
    fn reserve_common_event(&mut self, event: CommonEventId);
    fn show_message(&mut self, message: MessageView);
}

pub trait Stage {
    fn present(&mut self, screen: ScreenView);
}

/// Borrowed host services for one dispatched action.
pub struct HostContext<'a> {
    pub metrics: &'a dyn TextMetrics,
    pub variables: &'a mut dyn VariableStore,
    pub stats: &'a mut dyn StatSink,
    pub events: &'a mut dyn EventSink,
    pub stage: &'a mut dyn Stage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The plugin consumed the command.
    Handled,
    /// The subcommand is not one of the plugin's; another handler may claim it.
    Ignored,
    /// The command was recognized but its arguments were unusable. The action
    /// is a no-op; nothing is surfaced to the player.
    Rejected {
        reason: String,
        usage: &'static str,
    },
}

impl CommandOutcome {
    pub fn rejected(reason: impl Into<String>, usage: &'static str) -> Self {
        Self::Rejected {
            reason: reason.into(),
            usage,
        }
    }
}

/// Lifecycle surface the host calls into. The plugin never reaches into host
/// internals; everything it needs arrives through [`HostContext`].
pub trait Plugin {
    /// First token of command lines routed to this plugin, e.g. "journal".
    fn command_name(&self) -> &'static str;

    /// Key under which this plugin's state lands in the host save blob.
    /// `None` for stateless plugins.
    fn save_key(&self) -> Option<&'static str> {
        None
    }

    fn on_new_game(&mut self) {}

    fn on_save(&self) -> Result<Option<serde_json::Value>, SaveError> {
        Ok(None)
    }

    fn on_load(&mut self, value: &serde_json::Value) -> Result<(), SaveError> {
        let _ = value;
        Ok(())
    }

    fn on_command(&mut self, host: &mut HostContext<'_>, args: &[String]) -> CommandOutcome;

    fn on_equip_change(&mut self, host: &mut HostContext<'_>, slot: u32, item: Option<ItemId>) {
        let _ = (host, slot, item);
    }
}
