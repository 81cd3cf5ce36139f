//! Gameplay plugins for a host-driven RPG runtime: an in-game journal, a
//! skill-point proficiencies ledger, a random message picker, a decimal
//! currency formatter, and an equip-change event trigger. The host owns
//! rendering, input, and the save file; it drives this crate through the
//! [`Plugin`] lifecycle hooks and the [`PluginSet`] command surface.

pub mod currency;
pub mod dispatch;
pub mod equip;
pub mod host;
pub mod journal;
pub mod ledger;
pub mod proficiencies;
pub mod random_text;
pub mod save;
pub mod text;

pub use dispatch::{PluginSet, RegisterError};
pub use equip::{EquipEventConfig, EquipEventPlugin};
pub use host::{
    ActorId, CommandOutcome, CommonEventId, EventSink, FaceImage, HostContext, ItemId,
    MessageBackground, MessagePosition, MessageView, Plugin, ScreenView, Stage, StatId, StatSink,
    TextMetrics, VariableKey, VariableStore,
};
pub use journal::{JournalConfig, JournalPlugin, JournalView};
pub use ledger::{Category, Entry, EntryField, StatGrant};
pub use proficiencies::{
    ProficienciesConfig, ProficienciesPlugin, ProficienciesView, SpendSession,
};
pub use random_text::RandomTextPlugin;
pub use save::SaveError;
pub use text::{decode_markup, wrap, WRAP_MARGIN_PX};
