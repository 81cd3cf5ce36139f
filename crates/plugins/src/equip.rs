use tracing::debug;

use crate::host::{CommandOutcome, CommonEventId, HostContext, ItemId, Plugin};

/// Fires a host common event whenever an equipment slot changes. Stateless;
/// both event ids are optional and an unconfigured direction triggers
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EquipEventConfig {
    pub on_equip: Option<CommonEventId>,
    pub on_unequip: Option<CommonEventId>,
}

pub struct EquipEventPlugin {
    config: EquipEventConfig,
}

impl EquipEventPlugin {
    pub fn new(config: EquipEventConfig) -> Self {
        Self { config }
    }
}

impl Plugin for EquipEventPlugin {
    fn command_name(&self) -> &'static str {
        "equipevent"
    }

    fn on_command(&mut self, _host: &mut HostContext<'_>, _args: &[String]) -> CommandOutcome {
        CommandOutcome::Ignored
    }

    fn on_equip_change(&mut self, host: &mut HostContext<'_>, slot: u32, item: Option<ItemId>) {
        let event = match item {
            Some(_) => self.config.on_equip,
            None => self.config.on_unequip,
        };
        let Some(event) = event else {
            return;
        };
        debug!(slot, equipped = item.is_some(), event = event.0, "equip change event");
        host.events.reserve_common_event(event);
    }
}
