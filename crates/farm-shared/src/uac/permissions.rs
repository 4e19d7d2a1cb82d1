use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::OnceLock,
};

use crate::const_config::{action::*, section::*};

use super::Role;

/// What a user may see and do.
///
/// `dashboard_sections` controls which areas show up at all while
/// `allowed_actions` grants individual operations inside a section. The two are
/// independent, a section can have actions without being listed as visible.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    pub dashboard_sections: BTreeSet<String>,
    pub allowed_actions: BTreeMap<String, BTreeSet<String>>,
}

/// Declarative permissions keyed by role. A role without an entry is not
/// restricted
pub type PermissionTable = HashMap<Role, Permissions>;

static PERMISSION_TABLE: OnceLock<PermissionTable> = OnceLock::new();

impl Permissions {
    pub fn with_sections(mut self, sections: &[&str]) -> Self {
        self.dashboard_sections
            .extend(sections.iter().map(|x| x.to_string()));
        self
    }

    pub fn with_actions(mut self, section: &str, actions: &[&str]) -> Self {
        self.allowed_actions
            .entry(section.to_string())
            .or_default()
            .extend(actions.iter().map(|x| x.to_string()));
        self
    }

    pub fn includes_section(&self, section: &str) -> bool {
        self.dashboard_sections.contains(section)
    }

    pub fn allows(&self, section: &str, action: &str) -> bool {
        self.allowed_actions
            .get(section)
            .is_some_and(|actions| actions.contains(action))
    }
}

pub fn default_permission_table() -> PermissionTable {
    const CRUD: &[&str] = &[ACTION_VIEW, ACTION_CREATE, ACTION_UPDATE, ACTION_DELETE];
    let admin = Permissions::default()
        .with_sections(&[
            SECTION_DASHBOARD,
            SECTION_LIVESTOCK,
            SECTION_BREEDING,
            SECTION_FEEDING,
            SECTION_FINANCES,
            SECTION_REPORTS,
            SECTION_SETTINGS,
            SECTION_USERS,
        ])
        .with_actions(SECTION_LIVESTOCK, CRUD)
        .with_actions(SECTION_BREEDING, CRUD)
        .with_actions(SECTION_FEEDING, CRUD)
        .with_actions(SECTION_FINANCES, CRUD)
        .with_actions(SECTION_REPORTS, CRUD)
        .with_actions(SECTION_REPORTS, &[ACTION_GENERATE, ACTION_EXPORT])
        .with_actions(SECTION_USERS, CRUD)
        .with_actions(SECTION_SETTINGS, &[ACTION_VIEW, ACTION_UPDATE]);

    let standard = Permissions::default()
        .with_sections(&[
            SECTION_DASHBOARD,
            SECTION_LIVESTOCK,
            SECTION_BREEDING,
            SECTION_FEEDING,
        ])
        .with_actions(SECTION_LIVESTOCK, &[ACTION_VIEW])
        .with_actions(SECTION_BREEDING, &[ACTION_VIEW])
        .with_actions(SECTION_FEEDING, &[ACTION_VIEW])
        .with_actions(SECTION_FINANCES, &[ACTION_VIEW])
        .with_actions(SECTION_REPORTS, &[ACTION_VIEW]);

    let mut result = PermissionTable::new();
    result.insert(Role::Admin, admin);
    result.insert(Role::Standard, standard);
    result
}

/// Only sets the table if it hasn't already been set (or read)
pub fn try_set_permission_table(value: PermissionTable) -> Result<(), PermissionTable> {
    PERMISSION_TABLE.set(value)
}

/// Initializes the table, may be run more than once without issue (will only
/// have an effect the first time)
pub fn init_permission_table_to_defaults() {
    let _ = try_set_permission_table(default_permission_table());
}

/// Returns the active table, falling back to the defaults if none was set
pub fn permission_table() -> &'static PermissionTable {
    PERMISSION_TABLE.get_or_init(default_permission_table)
}

#[tracing::instrument(ret)]
pub fn permissions_for_role(role: Role) -> Option<&'static Permissions> {
    permission_table().get(&role)
}
