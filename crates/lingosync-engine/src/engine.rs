//! The per-locale reconciliation engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use lingosync_connect::{
    AppInfoResource, AppInfoText, ConnectError, LocalizedAppInfo, LocalizedVersionContent,
    MetadataStore, VersionContentDraft, VersionContentUpdate,
};
use lingosync_translate::{truncate_app_info_text, TargetLocale, Translator, APP_INFO_TEXT_LIMIT};

use crate::error::{EngineError, Result};
use crate::plan::{plan_app_info, plan_version_content, Category, PlanAction};

/// Pause inserted after each locale to stay friendly to API rate limits.
const LOCALE_DELAY: Duration = Duration::from_secs(1);

/// Cooperative cancellation flag shared with the signal handler.
///
/// The engine checks it at locale and track boundaries; once raised, no
/// further locale is processed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which tracks a run processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tracks {
    pub app_info: bool,
    pub version_content: bool,
}

impl Default for Tracks {
    fn default() -> Self {
        Self {
            app_info: true,
            version_content: true,
        }
    }
}

/// Configuration for one reconciliation run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub app_id: String,
    pub source_locale: String,
    pub tracks: Tracks,
    /// Pause between locales.
    pub locale_delay: Duration,
}

impl RunOptions {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            source_locale: "en-US".to_string(),
            tracks: Tracks::default(),
            locale_delay: LOCALE_DELAY,
        }
    }
}

/// Tally of what a run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// True when the run stopped early on a user interrupt.
    pub interrupted: bool,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed",
            self.created, self.updated, self.skipped, self.failed
        )
    }
}

/// What one track did for one locale.
enum TrackOutcome {
    Created,
    Updated,
    Skipped,
}

/// Version-content state carried across the locale loop.
struct VersionState {
    version_id: String,
    source: LocalizedVersionContent,
    /// Existing localizations by locale; refreshed after conflicting writes.
    existing: HashMap<String, LocalizedVersionContent>,
}

/// App-info state carried across the locale loop.
struct AppInfoState {
    /// The editable app-info resource, the only valid create target.
    primary_id: String,
    resources: Vec<AppInfoResource>,
    source_name: String,
    source_subtitle: Option<String>,
    /// app-info id → locale → localization; fetched lazily per resource.
    locs: HashMap<String, HashMap<String, LocalizedAppInfo>>,
}

struct RunState {
    version: Option<VersionState>,
    app_info: Option<AppInfoState>,
}

/// Ordered fallbacks after an app-info create conflict.
#[derive(Debug, Clone, Copy)]
enum AppInfoRecovery {
    /// Retry the create against another editable app-info resource.
    CreateOnAlternate,
    /// Re-scan every resource for a localization that appeared meanwhile.
    RescanAndUpdate,
}

const APP_INFO_RECOVERY: [AppInfoRecovery; 2] = [
    AppInfoRecovery::CreateOnAlternate,
    AppInfoRecovery::RescanAndUpdate,
];

/// Reconciles translated metadata into the store, one locale at a time.
///
/// Remote state is fetched once up front and cached for the run; caches are
/// refreshed only after writes that could have invalidated them.
pub struct Reconciler<S, T> {
    store: S,
    translator: T,
    catalog: Vec<TargetLocale>,
    options: RunOptions,
}

impl<S: MetadataStore, T: Translator> Reconciler<S, T> {
    pub fn new(store: S, translator: T, catalog: Vec<TargetLocale>, options: RunOptions) -> Self {
        Self {
            store,
            translator,
            catalog,
            options,
        }
    }

    /// Runs the full reconciliation pass over the catalog.
    ///
    /// Only two things end a run early: a failure while fetching the initial
    /// state, and the cancel flag. Per-locale failures are tallied and the
    /// loop moves on.
    pub async fn run(&self, cancel: &CancelFlag) -> Result<RunSummary> {
        let mut state = self.fetch_state().await?;
        let mut summary = RunSummary::default();

        info!(
            "reconciling {} locales for app {}",
            self.catalog.len(),
            self.options.app_id
        );

        for target in &self.catalog {
            if cancel.is_cancelled() {
                info!("interrupt received, stopping before {}", target.code);
                summary.interrupted = true;
                break;
            }

            info!("processing {} ({})", target.display_name, target.code);

            if let Some(app_info) = state.app_info.as_mut() {
                let result = self.sync_app_info(app_info, target).await;
                record(&mut summary, result, target, Category::AppInfo);
            }

            if cancel.is_cancelled() {
                info!("interrupt received, stopping during {}", target.code);
                summary.interrupted = true;
                break;
            }

            if let Some(version) = state.version.as_mut() {
                let result = self.sync_version_content(version, target).await;
                record(&mut summary, result, target, Category::VersionContent);
            }

            tokio::time::sleep(self.options.locale_delay).await;
        }

        Ok(summary)
    }

    /// Fetches everything the locale loop needs, once, before any
    /// translation begins.
    async fn fetch_state(&self) -> Result<RunState> {
        let app_id = &self.options.app_id;
        let source_locale = &self.options.source_locale;

        let version = if self.options.tracks.version_content {
            let version_id = self.store.latest_version_id(app_id).await?;
            let mut existing = HashMap::new();
            for loc in self.store.version_localizations(&version_id).await? {
                existing.insert(loc.locale.clone(), loc);
            }
            debug!(
                "version {} has {} existing localizations",
                version_id,
                existing.len()
            );

            let source = existing
                .get(source_locale)
                .cloned()
                .ok_or_else(|| EngineError::MissingSource(source_locale.clone()))?;

            Some(VersionState {
                version_id,
                source,
                existing,
            })
        } else {
            None
        };

        let app_info = if self.options.tracks.app_info {
            let resources = self.store.app_infos(app_id).await?;
            let primary_id = resources
                .iter()
                .find(|resource| resource.is_editable())
                .or_else(|| resources.first())
                .map(|resource| resource.id.clone())
                .ok_or_else(|| {
                    ConnectError::NotFound(format!("no app infos for app {app_id}"))
                })?;

            let mut state = AppInfoState {
                primary_id,
                resources,
                source_name: String::new(),
                source_subtitle: None,
                locs: HashMap::new(),
            };

            let source = self
                .find_app_info_localization(&mut state, source_locale)
                .await?
                .ok_or_else(|| EngineError::MissingSource(source_locale.clone()))?;
            state.source_name = source.name.unwrap_or_default();
            state.source_subtitle = source.subtitle;

            Some(state)
        } else {
            None
        };

        Ok(RunState { version, app_info })
    }

    // ------------------------------------------------------------------
    // App-info track
    // ------------------------------------------------------------------

    /// One locale through the app-info track.
    async fn sync_app_info(
        &self,
        state: &mut AppInfoState,
        target: &TargetLocale,
    ) -> Result<TrackOutcome> {
        // The source locale never reconciles onto itself; bail out before
        // spending provider calls.
        if target.code == self.options.source_locale {
            return Ok(TrackOutcome::Skipped);
        }

        // Names are always re-translated; existing name text is overwritten.
        let name = truncate_app_info_text(
            &self
                .translator
                .translate(&state.source_name, target.display_name)
                .await,
            APP_INFO_TEXT_LIMIT,
        );
        let subtitle = match &state.source_subtitle {
            Some(subtitle) => truncate_app_info_text(
                &self.translator.translate(subtitle, target.display_name).await,
                APP_INFO_TEXT_LIMIT,
            ),
            None => String::new(),
        };
        let text = AppInfoText {
            name: non_empty(name),
            subtitle: non_empty(subtitle),
        };

        let existing = self.find_app_info_localization(state, target.code).await?;
        let plan = plan_app_info(target.code, &self.options.source_locale, existing.as_ref());
        debug!("app info plan for {}: {}", target.code, plan.reason);

        match plan.action {
            PlanAction::Update(id) => {
                self.store.update_app_info_localization(&id, &text).await?;
                Ok(TrackOutcome::Updated)
            }
            PlanAction::Create => {
                let create = self
                    .store
                    .create_app_info_localization(&state.primary_id, target.code, &text)
                    .await;
                match create {
                    Ok(created) => {
                        state
                            .locs
                            .entry(state.primary_id.clone())
                            .or_default()
                            .insert(target.code.to_string(), created);
                        Ok(TrackOutcome::Created)
                    }
                    Err(err) if err.is_conflict() => {
                        self.recover_app_info_conflict(state, target, &text, err).await
                    }
                    Err(err) => Err(err.into()),
                }
            }
            PlanAction::Skip => Ok(TrackOutcome::Skipped),
        }
    }

    /// Looks a locale up across every known app-info resource, primary
    /// first. Localization lists are fetched once per resource and cached.
    async fn find_app_info_localization(
        &self,
        state: &mut AppInfoState,
        locale: &str,
    ) -> Result<Option<LocalizedAppInfo>> {
        let mut ids = Vec::with_capacity(state.resources.len());
        ids.push(state.primary_id.clone());
        ids.extend(
            state
                .resources
                .iter()
                .filter(|resource| resource.id != state.primary_id)
                .map(|resource| resource.id.clone()),
        );

        for id in ids {
            if !state.locs.contains_key(&id) {
                let fetched = self.store.app_info_localizations(&id).await?;
                state.locs.insert(id.clone(), by_locale(fetched));
            }
            if let Some(found) = state.locs[&id].get(locale) {
                return Ok(Some(found.clone()));
            }
        }

        Ok(None)
    }

    /// Bounded recovery after a create conflict: try the alternate editable
    /// resource, then re-scan for a record another writer got in first.
    async fn recover_app_info_conflict(
        &self,
        state: &mut AppInfoState,
        target: &TargetLocale,
        text: &AppInfoText,
        conflict: ConnectError,
    ) -> Result<TrackOutcome> {
        warn!(
            "create conflict on app info for {}, attempting recovery",
            target.code
        );

        for strategy in APP_INFO_RECOVERY {
            match strategy {
                AppInfoRecovery::CreateOnAlternate => {
                    let alternate = state
                        .resources
                        .iter()
                        .find(|resource| resource.id != state.primary_id && resource.is_editable())
                        .map(|resource| resource.id.clone());
                    let Some(alternate) = alternate else { continue };

                    match self
                        .store
                        .create_app_info_localization(&alternate, target.code, text)
                        .await
                    {
                        Ok(created) => {
                            state
                                .locs
                                .entry(alternate)
                                .or_default()
                                .insert(target.code.to_string(), created);
                            return Ok(TrackOutcome::Created);
                        }
                        Err(err) => {
                            warn!(
                                "create on alternate app info failed for {}: {}",
                                target.code, err
                            );
                        }
                    }
                }
                AppInfoRecovery::RescanAndUpdate => {
                    // The conflicting writer may have created the record on
                    // any resource; drop the caches and look again.
                    state.locs.clear();
                    if let Some(found) =
                        self.find_app_info_localization(state, target.code).await?
                    {
                        if let Some(id) = found.remote_id {
                            self.store.update_app_info_localization(&id, text).await?;
                            return Ok(TrackOutcome::Updated);
                        }
                    }
                }
            }
        }

        Err(conflict.into())
    }

    // ------------------------------------------------------------------
    // Version-content track
    // ------------------------------------------------------------------

    /// One locale through the version-content track.
    async fn sync_version_content(
        &self,
        state: &mut VersionState,
        target: &TargetLocale,
    ) -> Result<TrackOutcome> {
        let existing = state.existing.get(target.code).cloned();
        let plan = plan_version_content(target.code, &self.options.source_locale, existing.as_ref());
        debug!("version content plan for {}: {}", target.code, plan.reason);

        if plan.action == PlanAction::Skip {
            return Ok(TrackOutcome::Skipped);
        }

        // Existing copy wins; translation only fills the gaps.
        let description = match existing
            .as_ref()
            .and_then(|record| record.description.clone())
            .filter(|description| !description.is_empty())
        {
            Some(description) => description,
            None => {
                self.translator
                    .translate(
                        state.source.description.as_deref().unwrap_or_default(),
                        target.display_name,
                    )
                    .await
            }
        };
        let keywords = match existing
            .as_ref()
            .and_then(|record| record.keywords.clone())
            .filter(|keywords| !keywords.is_empty())
        {
            Some(keywords) => keywords,
            None => {
                self.translator
                    .translate_keywords(
                        state.source.keywords.as_deref().unwrap_or_default(),
                        target.display_name,
                        target.keyword_limit,
                    )
                    .await
            }
        };

        // URLs carry over from the source locale, falling back to whatever
        // the locale already has.
        let marketing_url = state
            .source
            .marketing_url
            .clone()
            .or_else(|| existing.as_ref().and_then(|record| record.marketing_url.clone()));
        let support_url = state
            .source
            .support_url
            .clone()
            .or_else(|| existing.as_ref().and_then(|record| record.support_url.clone()));

        let update = VersionContentUpdate {
            description: non_empty(description),
            keywords: non_empty(keywords),
            marketing_url,
            support_url,
            ..VersionContentUpdate::default()
        };

        match plan.action {
            PlanAction::Update(id) => {
                self.store.update_version_localization(&id, &update).await?;
                Ok(TrackOutcome::Updated)
            }
            PlanAction::Create => {
                let draft = VersionContentDraft::from_update(target.code, update.clone());
                let create = self
                    .store
                    .create_version_localization(&state.version_id, &draft)
                    .await;
                match create {
                    Ok(created) => {
                        state.existing.insert(target.code.to_string(), created);
                        Ok(TrackOutcome::Created)
                    }
                    Err(err) if err.is_conflict() => {
                        self.recover_version_conflict(state, target, &update, err).await
                    }
                    Err(err) => Err(err.into()),
                }
            }
            PlanAction::Skip => Ok(TrackOutcome::Skipped),
        }
    }

    /// Bounded recovery after a version-content create conflict: re-fetch
    /// the localization list and update the record that beat us to it.
    async fn recover_version_conflict(
        &self,
        state: &mut VersionState,
        target: &TargetLocale,
        update: &VersionContentUpdate,
        conflict: ConnectError,
    ) -> Result<TrackOutcome> {
        warn!(
            "create conflict on version content for {}, re-checking the store",
            target.code
        );

        let mut refreshed = HashMap::new();
        for loc in self.store.version_localizations(&state.version_id).await? {
            refreshed.insert(loc.locale.clone(), loc);
        }
        state.existing = refreshed;

        let found_id = state
            .existing
            .get(target.code)
            .and_then(|record| record.remote_id.clone());
        let Some(found_id) = found_id else {
            return Err(conflict.into());
        };

        self.store.update_version_localization(&found_id, update).await?;
        Ok(TrackOutcome::Updated)
    }
}

/// Folds one track result into the run summary, containing failures.
fn record(
    summary: &mut RunSummary,
    result: Result<TrackOutcome>,
    target: &TargetLocale,
    category: Category,
) {
    match result {
        Ok(TrackOutcome::Created) => summary.created += 1,
        Ok(TrackOutcome::Updated) => summary.updated += 1,
        Ok(TrackOutcome::Skipped) => {
            debug!("skipped {category} for {}", target.code);
            summary.skipped += 1;
        }
        Err(EngineError::Store(err)) if err.is_unsupported_locale() => {
            info!(
                "{} is not listed for localization on this app, skipping {category}",
                target.code
            );
            summary.skipped += 1;
        }
        Err(err) => {
            warn!("{category} sync failed for {}: {err}", target.code);
            summary.failed += 1;
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn by_locale(locs: Vec<LocalizedAppInfo>) -> HashMap<String, LocalizedAppInfo> {
    locs.into_iter()
        .map(|loc| (loc.locale.clone(), loc))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use lingosync_connect::Result as ConnectResult;
    use lingosync_translate::truncate_keywords;

    // ------------------------------------------------------------------
    // Fakes
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct FakeInner {
        version_locs: Vec<LocalizedVersionContent>,
        app_infos: Vec<AppInfoResource>,
        app_info_locs: HashMap<String, Vec<LocalizedAppInfo>>,
        /// Locales whose version-content create loses a race: the record
        /// appears (created by the concurrent writer) and the call returns
        /// a conflict.
        conflict_version_locales: HashSet<String>,
        /// App-info resources that reject creates with a conflict.
        conflict_app_info_resources: HashSet<String>,
        /// Whether a conflicting app-info create also materializes the
        /// record, as a concurrent writer would.
        materialize_on_conflict: bool,
        unsupported_locales: HashSet<String>,
        next_id: usize,
        version_creates: usize,
        version_updates: Vec<(String, VersionContentUpdate)>,
        app_info_creates: Vec<(String, String)>,
        app_info_updates: Vec<(String, AppInfoText)>,
    }

    #[derive(Clone, Default)]
    struct FakeStore {
        inner: Arc<Mutex<FakeInner>>,
    }

    impl FakeStore {
        fn conflict_error() -> ConnectError {
            ConnectError::Api {
                status: 409,
                body: "STATE_ERROR: resource already exists".into(),
            }
        }

        fn unsupported_error() -> ConnectError {
            ConnectError::Api {
                status: 422,
                body: "The language specified is not listed for localization.".into(),
            }
        }

        fn next_id(inner: &mut FakeInner, prefix: &str) -> String {
            inner.next_id += 1;
            format!("{prefix}-{}", inner.next_id)
        }
    }

    #[async_trait]
    impl MetadataStore for FakeStore {
        async fn latest_version_id(&self, _app_id: &str) -> ConnectResult<String> {
            Ok("ver-1".to_string())
        }

        async fn version_localizations(
            &self,
            _version_id: &str,
        ) -> ConnectResult<Vec<LocalizedVersionContent>> {
            Ok(self.inner.lock().unwrap().version_locs.clone())
        }

        async fn create_version_localization(
            &self,
            _version_id: &str,
            draft: &VersionContentDraft,
        ) -> ConnectResult<LocalizedVersionContent> {
            let mut inner = self.inner.lock().unwrap();

            if inner.unsupported_locales.contains(&draft.locale) {
                return Err(Self::unsupported_error());
            }
            if inner.conflict_version_locales.remove(&draft.locale) {
                // The concurrent writer wins the race.
                let id = Self::next_id(&mut inner, "loc");
                inner.version_locs.push(LocalizedVersionContent {
                    remote_id: Some(id),
                    locale: draft.locale.clone(),
                    description: Some("concurrent description".into()),
                    ..LocalizedVersionContent::default()
                });
                return Err(Self::conflict_error());
            }
            if inner.version_locs.iter().any(|loc| loc.locale == draft.locale) {
                return Err(Self::conflict_error());
            }

            let id = Self::next_id(&mut inner, "loc");
            let created = LocalizedVersionContent {
                remote_id: Some(id),
                locale: draft.locale.clone(),
                description: draft.description.clone(),
                keywords: draft.keywords.clone(),
                promotional_text: draft.promotional_text.clone(),
                marketing_url: draft.marketing_url.clone(),
                support_url: draft.support_url.clone(),
                whats_new: draft.whats_new.clone(),
            };
            inner.version_locs.push(created.clone());
            inner.version_creates += 1;
            Ok(created)
        }

        async fn update_version_localization(
            &self,
            localization_id: &str,
            update: &VersionContentUpdate,
        ) -> ConnectResult<()> {
            let mut inner = self.inner.lock().unwrap();
            let record = inner
                .version_locs
                .iter_mut()
                .find(|loc| loc.remote_id.as_deref() == Some(localization_id))
                .ok_or_else(|| ConnectError::NotFound(localization_id.to_string()))?;

            if let Some(description) = &update.description {
                record.description = Some(description.clone());
            }
            if let Some(keywords) = &update.keywords {
                record.keywords = Some(keywords.clone());
            }
            if let Some(marketing_url) = &update.marketing_url {
                record.marketing_url = Some(marketing_url.clone());
            }
            if let Some(support_url) = &update.support_url {
                record.support_url = Some(support_url.clone());
            }

            inner
                .version_updates
                .push((localization_id.to_string(), update.clone()));
            Ok(())
        }

        async fn app_infos(&self, _app_id: &str) -> ConnectResult<Vec<AppInfoResource>> {
            Ok(self.inner.lock().unwrap().app_infos.clone())
        }

        async fn app_info_localizations(
            &self,
            app_info_id: &str,
        ) -> ConnectResult<Vec<LocalizedAppInfo>> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .app_info_locs
                .get(app_info_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn create_app_info_localization(
            &self,
            app_info_id: &str,
            locale: &str,
            text: &AppInfoText,
        ) -> ConnectResult<LocalizedAppInfo> {
            let mut inner = self.inner.lock().unwrap();

            if inner.unsupported_locales.contains(locale) {
                return Err(Self::unsupported_error());
            }
            if inner.conflict_app_info_resources.contains(app_info_id) {
                if inner.materialize_on_conflict {
                    let id = Self::next_id(&mut inner, "ail");
                    let record = LocalizedAppInfo {
                        remote_id: Some(id),
                        locale: locale.to_string(),
                        name: Some("concurrent name".into()),
                        subtitle: None,
                        parent_app_info_id: app_info_id.to_string(),
                    };
                    inner
                        .app_info_locs
                        .entry(app_info_id.to_string())
                        .or_default()
                        .push(record);
                }
                return Err(Self::conflict_error());
            }
            let exists = inner
                .app_info_locs
                .get(app_info_id)
                .is_some_and(|locs| locs.iter().any(|loc| loc.locale == locale));
            if exists {
                return Err(Self::conflict_error());
            }

            let id = Self::next_id(&mut inner, "ail");
            let created = LocalizedAppInfo {
                remote_id: Some(id),
                locale: locale.to_string(),
                name: text.name.clone(),
                subtitle: text.subtitle.clone(),
                parent_app_info_id: app_info_id.to_string(),
            };
            inner
                .app_info_locs
                .entry(app_info_id.to_string())
                .or_default()
                .push(created.clone());
            inner
                .app_info_creates
                .push((app_info_id.to_string(), locale.to_string()));
            Ok(created)
        }

        async fn update_app_info_localization(
            &self,
            localization_id: &str,
            text: &AppInfoText,
        ) -> ConnectResult<()> {
            let mut inner = self.inner.lock().unwrap();
            let record = inner
                .app_info_locs
                .values_mut()
                .flatten()
                .find(|loc| loc.remote_id.as_deref() == Some(localization_id))
                .ok_or_else(|| ConnectError::NotFound(localization_id.to_string()))?;

            if let Some(name) = &text.name {
                record.name = Some(name.clone());
            }
            if let Some(subtitle) = &text.subtitle {
                record.subtitle = Some(subtitle.clone());
            }

            inner
                .app_info_updates
                .push((localization_id.to_string(), text.clone()));
            Ok(())
        }
    }

    /// Marks translations so tests can tell translated text from reused
    /// text.
    struct FakeTranslator;

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(&self, text: &str, target: &str) -> String {
            if text.is_empty() {
                return String::new();
            }
            format!("[{target}] {text}")
        }

        async fn translate_keywords(&self, text: &str, target: &str, max_length: usize) -> String {
            if text.is_empty() {
                return String::new();
            }
            truncate_keywords(&format!("[{target}] {text}"), max_length)
        }
    }

    /// Raises the cancel flag from inside the first translation call, as a
    /// user interrupt would mid-locale.
    struct CancellingTranslator {
        flag: CancelFlag,
    }

    #[async_trait]
    impl Translator for CancellingTranslator {
        async fn translate(&self, text: &str, target: &str) -> String {
            self.flag.cancel();
            FakeTranslator.translate(text, target).await
        }

        async fn translate_keywords(&self, text: &str, target: &str, max_length: usize) -> String {
            self.flag.cancel();
            FakeTranslator.translate_keywords(text, target, max_length).await
        }
    }

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    fn source_version_loc() -> LocalizedVersionContent {
        LocalizedVersionContent {
            remote_id: Some("loc-src".into()),
            locale: "en-US".into(),
            description: Some("Track every expense".into()),
            keywords: Some("budget, money, expenses".into()),
            marketing_url: Some("https://example.com".into()),
            ..LocalizedVersionContent::default()
        }
    }

    fn source_app_info_loc(parent: &str) -> LocalizedAppInfo {
        LocalizedAppInfo {
            remote_id: Some("ail-src".into()),
            locale: "en-US".into(),
            name: Some("Save Smart".into()),
            subtitle: Some("Budget better".into()),
            parent_app_info_id: parent.to_string(),
        }
    }

    fn populated_store() -> FakeStore {
        let store = FakeStore::default();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.version_locs.push(source_version_loc());
            inner.app_infos.push(AppInfoResource {
                id: "ai-1".into(),
                state: Some(lingosync_connect::EDITABLE_STATE.into()),
            });
            inner
                .app_info_locs
                .insert("ai-1".into(), vec![source_app_info_loc("ai-1")]);
        }
        store
    }

    fn catalog(codes: &[(&'static str, &'static str)]) -> Vec<TargetLocale> {
        codes
            .iter()
            .map(|&(code, display_name)| TargetLocale {
                code,
                display_name,
                keyword_limit: 100,
            })
            .collect()
    }

    fn options() -> RunOptions {
        let mut options = RunOptions::new("app-1");
        options.locale_delay = Duration::ZERO;
        options
    }

    fn reconciler(
        store: FakeStore,
        catalog: Vec<TargetLocale>,
        options: RunOptions,
    ) -> Reconciler<FakeStore, FakeTranslator> {
        Reconciler::new(store, FakeTranslator, catalog, options)
    }

    // ------------------------------------------------------------------
    // Tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn creates_missing_locales_on_both_tracks() {
        let store = populated_store();
        let engine = reconciler(
            store.clone(),
            catalog(&[("fr-FR", "French"), ("de-DE", "German")]),
            options(),
        );

        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        assert_eq!(summary.created, 4);
        assert_eq!(summary.failed, 0);
        assert!(!summary.interrupted);

        let inner = store.inner.lock().unwrap();
        let fr = inner
            .version_locs
            .iter()
            .find(|loc| loc.locale == "fr-FR")
            .unwrap();
        assert_eq!(fr.description.as_deref(), Some("[French] Track every expense"));
        assert_eq!(fr.keywords.as_deref(), Some("[French] budget, money, expenses"));
        // Marketing URL carried over from the source locale.
        assert_eq!(fr.marketing_url.as_deref(), Some("https://example.com"));

        let fr_info = inner.app_info_locs["ai-1"]
            .iter()
            .find(|loc| loc.locale == "fr-FR")
            .unwrap();
        assert_eq!(fr_info.name.as_deref(), Some("[French] Save Smart"));
        assert_eq!(fr_info.subtitle.as_deref(), Some("[French] Budget better"));
    }

    #[tokio::test]
    async fn second_run_updates_and_never_duplicates() {
        let store = populated_store();
        let locales = catalog(&[("fr-FR", "French"), ("de-DE", "German")]);

        let first = reconciler(store.clone(), locales.clone(), options())
            .run(&CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(first.created, 4);

        let second = reconciler(store.clone(), locales, options())
            .run(&CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 4);
        assert_eq!(second.failed, 0);

        let inner = store.inner.lock().unwrap();
        // Still exactly one record per locale on each track.
        assert_eq!(
            inner.version_locs.iter().filter(|l| l.locale == "fr-FR").count(),
            1
        );
        assert_eq!(
            inner.app_info_locs["ai-1"].iter().filter(|l| l.locale == "fr-FR").count(),
            1
        );
        assert_eq!(inner.version_creates, 2);
    }

    #[tokio::test]
    async fn version_create_conflict_recovers_into_an_update() {
        let store = populated_store();
        store
            .inner
            .lock()
            .unwrap()
            .conflict_version_locales
            .insert("fr-FR".into());

        let mut options = options();
        options.tracks = Tracks { app_info: false, version_content: true };
        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options);

        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        // The locale ends in success, not a logged failure.
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.created, 0);
        assert_eq!(summary.updated, 1);

        let inner = store.inner.lock().unwrap();
        let fr = inner
            .version_locs
            .iter()
            .find(|loc| loc.locale == "fr-FR")
            .unwrap();
        // The follow-up update overwrote the concurrent writer's copy.
        assert_eq!(fr.description.as_deref(), Some("[French] Track every expense"));
        assert_eq!(inner.version_updates.len(), 1);
    }

    #[tokio::test]
    async fn app_info_conflict_retries_on_alternate_editable_resource() {
        let store = populated_store();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.app_infos.push(AppInfoResource {
                id: "ai-2".into(),
                state: Some(lingosync_connect::EDITABLE_STATE.into()),
            });
            inner.conflict_app_info_resources.insert("ai-1".into());
        }

        let mut options = options();
        options.tracks = Tracks { app_info: true, version_content: false };
        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options);

        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 0);

        let inner = store.inner.lock().unwrap();
        assert_eq!(
            inner.app_info_creates,
            vec![("ai-2".to_string(), "fr-FR".to_string())]
        );
    }

    #[tokio::test]
    async fn app_info_conflict_rescans_and_updates_without_an_alternate() {
        let store = populated_store();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.conflict_app_info_resources.insert("ai-1".into());
            inner.materialize_on_conflict = true;
        }

        let mut options = options();
        options.tracks = Tracks { app_info: true, version_content: false };
        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options);

        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.failed, 0);

        let inner = store.inner.lock().unwrap();
        assert_eq!(inner.app_info_updates.len(), 1);
        let fr = inner.app_info_locs["ai-1"]
            .iter()
            .find(|loc| loc.locale == "fr-FR")
            .unwrap();
        assert_eq!(fr.name.as_deref(), Some("[French] Save Smart"));
    }

    #[tokio::test]
    async fn unsupported_locale_counts_as_a_skip() {
        let store = populated_store();
        store
            .inner
            .lock()
            .unwrap()
            .unsupported_locales
            .insert("fr-FR".into());

        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options());
        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn one_failing_track_does_not_block_the_other() {
        let store = populated_store();
        // App-info creates conflict with no alternate and no materialized
        // record: recovery is exhausted and the track fails.
        store
            .inner
            .lock()
            .unwrap()
            .conflict_app_info_resources
            .insert("ai-1".into());

        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options());
        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        assert_eq!(summary.failed, 1);
        // Version content still landed.
        assert_eq!(summary.created, 1);
        let inner = store.inner.lock().unwrap();
        assert!(inner.version_locs.iter().any(|loc| loc.locale == "fr-FR"));
    }

    #[tokio::test]
    async fn reuses_existing_content_and_fills_gaps() {
        let store = populated_store();
        store.inner.lock().unwrap().version_locs.push(LocalizedVersionContent {
            remote_id: Some("loc-fr".into()),
            locale: "fr-FR".into(),
            description: Some("Déjà traduit".into()),
            keywords: None,
            ..LocalizedVersionContent::default()
        });

        let mut options = options();
        options.tracks = Tracks { app_info: false, version_content: true };
        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options);

        let summary = engine.run(&CancelFlag::new()).await.unwrap();
        assert_eq!(summary.updated, 1);

        let inner = store.inner.lock().unwrap();
        let (id, update) = &inner.version_updates[0];
        assert_eq!(id, "loc-fr");
        // Existing description reused verbatim, missing keywords translated.
        assert_eq!(update.description.as_deref(), Some("Déjà traduit"));
        assert_eq!(
            update.keywords.as_deref(),
            Some("[French] budget, money, expenses")
        );
    }

    #[tokio::test]
    async fn finds_existing_app_info_on_non_primary_resources() {
        let store = populated_store();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.app_infos.push(AppInfoResource {
                id: "ai-0".into(),
                state: Some("READY_FOR_SALE".into()),
            });
            inner.app_info_locs.insert(
                "ai-0".into(),
                vec![LocalizedAppInfo {
                    remote_id: Some("ail-old".into()),
                    locale: "fr-FR".into(),
                    name: Some("Ancien nom".into()),
                    subtitle: None,
                    parent_app_info_id: "ai-0".into(),
                }],
            );
        }

        let mut options = options();
        options.tracks = Tracks { app_info: true, version_content: false };
        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options);

        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.created, 0);

        let inner = store.inner.lock().unwrap();
        assert!(inner.app_info_creates.is_empty());
        assert_eq!(inner.app_info_updates[0].0, "ail-old");
    }

    #[tokio::test]
    async fn source_locale_in_the_catalog_is_skipped() {
        let store = populated_store();
        let engine = reconciler(
            store.clone(),
            catalog(&[("en-US", "English"), ("fr-FR", "French")]),
            options(),
        );

        let summary = engine.run(&CancelFlag::new()).await.unwrap();

        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.created, 2);
        let inner = store.inner.lock().unwrap();
        // The source record was neither duplicated nor rewritten.
        assert_eq!(inner.version_updates.len(), 0);
        assert_eq!(
            inner.version_locs.iter().filter(|l| l.locale == "en-US").count(),
            1
        );
    }

    #[tokio::test]
    async fn interrupt_mid_locale_stops_remaining_work() {
        let store = populated_store();
        let flag = CancelFlag::new();
        let engine = Reconciler::new(
            store.clone(),
            CancellingTranslator { flag: flag.clone() },
            catalog(&[("fr-FR", "French"), ("de-DE", "German")]),
            options(),
        );

        let summary = engine.run(&flag).await.unwrap();

        assert!(summary.interrupted);
        let inner = store.inner.lock().unwrap();
        // The app-info track of the first locale completed; nothing after
        // the interrupt ran.
        assert!(inner.app_info_locs["ai-1"].iter().any(|l| l.locale == "fr-FR"));
        assert!(!inner.version_locs.iter().any(|l| l.locale == "fr-FR"));
        assert!(!inner.app_info_locs["ai-1"].iter().any(|l| l.locale == "de-DE"));
    }

    #[tokio::test]
    async fn pre_raised_interrupt_processes_nothing() {
        let store = populated_store();
        let flag = CancelFlag::new();
        flag.cancel();

        let engine = reconciler(store.clone(), catalog(&[("fr-FR", "French")]), options());
        let summary = engine.run(&flag).await.unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.created + summary.updated + summary.failed, 0);
    }

    #[tokio::test]
    async fn missing_source_localization_fails_before_the_loop() {
        let store = FakeStore::default();
        {
            let mut inner = store.inner.lock().unwrap();
            inner.app_infos.push(AppInfoResource {
                id: "ai-1".into(),
                state: Some(lingosync_connect::EDITABLE_STATE.into()),
            });
        }

        let engine = reconciler(store, catalog(&[("fr-FR", "French")]), options());
        let result = engine.run(&CancelFlag::new()).await;

        assert!(matches!(result, Err(EngineError::MissingSource(_))));
    }
}
