//! Per-locale action planning.
//!
//! Pure decision functions: given the target locale and whatever already
//! exists remotely, pick create, update, or skip. The engine executes the
//! plan; these functions never touch the network.

use lingosync_connect::{LocalizedAppInfo, LocalizedVersionContent};

/// Which metadata category a plan applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// App name and subtitle.
    AppInfo,
    /// Description, keywords, and URLs on an App Store version.
    VersionContent,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::AppInfo => write!(f, "app info"),
            Category::VersionContent => write!(f, "version content"),
        }
    }
}

/// What to do for one locale within one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// No existing record was found; create one.
    Create,
    /// Update the record with this remote id.
    Update(String),
    /// Leave the locale alone.
    Skip,
}

/// A decided action together with the reason it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationPlan {
    pub action: PlanAction,
    pub category: Category,
    pub reason: &'static str,
}

/// Decides the version-content action for a target locale.
pub fn plan_version_content(
    locale: &str,
    source_locale: &str,
    existing: Option<&LocalizedVersionContent>,
) -> ReconciliationPlan {
    plan(
        Category::VersionContent,
        locale,
        source_locale,
        existing.and_then(|record| record.remote_id.clone()),
    )
}

/// Decides the app-info action for a target locale.
pub fn plan_app_info(
    locale: &str,
    source_locale: &str,
    existing: Option<&LocalizedAppInfo>,
) -> ReconciliationPlan {
    plan(
        Category::AppInfo,
        locale,
        source_locale,
        existing.and_then(|record| record.remote_id.clone()),
    )
}

fn plan(
    category: Category,
    locale: &str,
    source_locale: &str,
    remote_id: Option<String>,
) -> ReconciliationPlan {
    if locale == source_locale {
        return ReconciliationPlan {
            action: PlanAction::Skip,
            category,
            reason: "source locale",
        };
    }

    match remote_id {
        Some(id) => ReconciliationPlan {
            action: PlanAction::Update(id),
            category,
            reason: "existing localization found",
        },
        None => ReconciliationPlan {
            action: PlanAction::Create,
            category,
            reason: "no existing localization",
        },
    }
}
