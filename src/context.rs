use crate::events::{Broadcast, EntityCreated};
use crate::scene::EntityKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    ViewModel,
    EditModel,
    #[default]
    EditArModule,
    ViewArModule,
}

impl AppMode {
    pub fn label(self) -> &'static str {
        match self {
            AppMode::ViewModel => "View model",
            AppMode::EditModel => "Edit model",
            AppMode::EditArModule => "Edit AR module",
            AppMode::ViewArModule => "View AR module",
        }
    }

    /// Scene picking is only accepted while editing.
    pub fn accepts_picking(self) -> bool {
        matches!(self, AppMode::EditModel | AppMode::EditArModule)
    }

    /// In the model modes the playback bar is pinned to the first model ever created.
    pub fn pins_first_model(self) -> bool {
        matches!(self, AppMode::ViewModel | AppMode::EditModel)
    }
}

/// Process-scoped authoring state handed to entity factories: per-kind default
/// name counters, the application mode and the entity-created broadcast.
/// Counters only ever grow; nothing resets them for the life of the context.
#[derive(Debug, Default)]
pub struct AuthoringContext {
    name_counters: [u32; EntityKind::COUNT],
    mode: AppMode,
    mode_revision: u64,
    created: Broadcast<EntityCreated>,
}

impl AuthoringContext {
    pub fn new(mode: AppMode) -> Self {
        Self { mode, ..Self::default() }
    }

    /// Returns `"<Kind> <n>"` and bumps the counter for `kind`.
    pub fn next_default_name(&mut self, kind: EntityKind) -> String {
        let counter = &mut self.name_counters[kind.index()];
        *counter += 1;
        format!("{} {}", kind.label(), counter)
    }

    pub fn names_issued(&self, kind: EntityKind) -> u32 {
        self.name_counters[kind.index()]
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// Returns true when the mode actually changed.
    pub fn set_mode(&mut self, mode: AppMode) -> bool {
        if self.mode == mode {
            return false;
        }
        log::info!("[context] mode {} -> {}", self.mode.label(), mode.label());
        self.mode = mode;
        self.mode_revision = self.mode_revision.wrapping_add(1);
        true
    }

    pub fn mode_revision(&self) -> u64 {
        self.mode_revision
    }

    pub fn created(&self) -> &Broadcast<EntityCreated> {
        &self.created
    }

    pub fn publish_created(&mut self, event: EntityCreated) {
        log::debug!("[context] {event}");
        self.created.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_count_per_kind() {
        let mut ctx = AuthoringContext::default();
        assert_eq!(ctx.next_default_name(EntityKind::Model), "Model 1");
        assert_eq!(ctx.next_default_name(EntityKind::Model), "Model 2");
        assert_eq!(ctx.next_default_name(EntityKind::Note), "Note 1");
        assert_eq!(ctx.names_issued(EntityKind::Model), 2);
        assert_eq!(ctx.names_issued(EntityKind::Image), 0);
    }

    #[test]
    fn set_mode_reports_changes_only() {
        let mut ctx = AuthoringContext::new(AppMode::EditModel);
        assert!(!ctx.set_mode(AppMode::EditModel));
        assert!(ctx.set_mode(AppMode::ViewArModule));
        assert_eq!(ctx.mode_revision(), 1);
        assert!(!ctx.mode().accepts_picking());
        assert!(!ctx.mode().pins_first_model());
    }
}
