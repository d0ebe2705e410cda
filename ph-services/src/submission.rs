//! Story submission entry point.
//!
//! Validation runs first and touches nothing. A valid form becomes a Story
//! with a client-generated id, then takes one of three paths depending on
//! connectivity at that instant and the configured mode:
//!
//! - online, local mode: published straight into the store and state;
//! - online, remote mode: POSTed; on failure it is queued as `pending`;
//! - offline: queued as `offline` and stored, with a background sync
//!   registered.

use std::sync::Arc;

use base64::Engine;
use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use ph_api::StoryDelivery;
use ph_core::config::{SubmissionConfig, SubmissionMode};
use ph_core::constants::{MAX_PHOTO_BYTES, MIN_STORY_YEAR, SYNC_STORIES_TAG};
use ph_core::error::{PhError, PhResult};
use ph_models::{LocalStore, RecordId, Story, StoryStatus};

use crate::background::BackgroundSync;
use crate::draft::DraftService;
use crate::event_bus::{AppEvent, EventBus};
use crate::queue::PendingQueue;
use crate::state::SharedState;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Raw form input, as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryForm {
    pub author: String,
    #[serde(default)]
    pub email: Option<String>,
    pub kindergarten: String,
    /// Year as entered; blank means not given.
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub role: String,
    pub text: String,
    /// `data:image/...;base64,` URI.
    #[serde(default)]
    pub photo: Option<String>,
    /// Consent to publish.
    #[serde(default)]
    pub privacy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingAuthor,
    MissingKindergarten,
    MissingText,
    ConsentRequired,
    YearNotANumber(String),
    YearOutOfRange { year: i32, min: i32, max: i32 },
    InvalidEmail(String),
    InvalidPhoto(String),
    PhotoTooLarge { bytes: usize, max: usize },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingAuthor => write!(f, "author name is required"),
            Self::MissingKindergarten => write!(f, "kindergarten is required"),
            Self::MissingText => write!(f, "story text is required"),
            Self::ConsentRequired => write!(f, "consent to publish is required"),
            Self::YearNotANumber(raw) => write!(f, "year {raw:?} is not a number"),
            Self::YearOutOfRange { min, max, .. } => {
                write!(f, "year must be between {min} and {max}")
            }
            Self::InvalidEmail(email) => write!(f, "{email:?} is not an email address"),
            Self::InvalidPhoto(reason) => write!(f, "photo rejected: {reason}"),
            Self::PhotoTooLarge { bytes, max } => {
                write!(f, "photo is {bytes} bytes, the limit is {max}")
            }
        }
    }
}

/// Limits applied by `validate_with`.
#[derive(Debug, Clone, Copy)]
pub struct ValidationRules {
    pub min_year: i32,
    pub max_photo_bytes: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_year: MIN_STORY_YEAR,
            max_photo_bytes: MAX_PHOTO_BYTES,
        }
    }
}

impl From<&SubmissionConfig> for ValidationRules {
    fn from(config: &SubmissionConfig) -> Self {
        Self {
            min_year: config.min_year,
            max_photo_bytes: config.max_photo_bytes,
        }
    }
}

/// Validate with the default limits.
pub fn validate(form: &StoryForm, current_year: i32) -> Result<(), Vec<ValidationIssue>> {
    validate_with(form, &ValidationRules::default(), current_year)
}

/// Collect every problem with the form. `Ok` means it may be submitted.
pub fn validate_with(
    form: &StoryForm,
    rules: &ValidationRules,
    current_year: i32,
) -> Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if form.author.trim().is_empty() {
        issues.push(ValidationIssue::MissingAuthor);
    }
    if form.kindergarten.trim().is_empty() {
        issues.push(ValidationIssue::MissingKindergarten);
    }
    if form.text.trim().is_empty() {
        issues.push(ValidationIssue::MissingText);
    }
    if !form.privacy {
        issues.push(ValidationIssue::ConsentRequired);
    }

    if let Some(raw) = non_blank(&form.year) {
        match raw.parse::<i32>() {
            Ok(year) if year < rules.min_year || year > current_year => {
                issues.push(ValidationIssue::YearOutOfRange {
                    year,
                    min: rules.min_year,
                    max: current_year,
                });
            }
            Ok(_) => {}
            Err(_) => issues.push(ValidationIssue::YearNotANumber(raw.to_string())),
        }
    }

    if let Some(email) = non_blank(&form.email) {
        if !EMAIL_RE.is_match(email) {
            issues.push(ValidationIssue::InvalidEmail(email.to_string()));
        }
    }

    if let Some(photo) = non_blank(&form.photo) {
        if let Err(issue) = check_photo(photo, rules.max_photo_bytes) {
            issues.push(issue);
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn check_photo(uri: &str, max_bytes: usize) -> Result<(), ValidationIssue> {
    let invalid = |reason: &str| ValidationIssue::InvalidPhoto(reason.to_string());

    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| invalid("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| invalid("missing data"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| invalid("not base64 encoded"))?;
    if !mime.starts_with("image/") {
        return Err(invalid("not an image"));
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| invalid("corrupt base64 data"))?;
    if bytes.len() > max_bytes {
        return Err(ValidationIssue::PhotoTooLarge {
            bytes: bytes.len(),
            max: max_bytes,
        });
    }
    Ok(())
}

/// Time-based story id: `<prefix>_<unix millis>_<9 base36 chars>`.
pub fn generate_story_id(prefix: &str) -> RecordId {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    RecordId::new(format!(
        "{prefix}_{}_{suffix}",
        Utc::now().timestamp_millis()
    ))
}

fn build_story(form: StoryForm, id: RecordId, status: StoryStatus) -> Story {
    let clean = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    Story {
        id,
        author: form.author.trim().to_string(),
        email: clean(form.email),
        kindergarten: form.kindergarten.trim().to_string(),
        year: clean(form.year).and_then(|y| y.parse().ok()),
        role: form.role.trim().to_string(),
        text: form.text.trim().to_string(),
        photo: clean(form.photo),
        date: Utc::now().to_rfc3339(),
        status,
        privacy: form.privacy,
        extra: serde_json::Map::new(),
    }
}

/// What happened to a submitted story.
#[derive(Debug, Clone)]
pub enum SubmissionOutcome {
    Published(Story),
    Queued { story: Story, queue_len: usize },
}

impl SubmissionOutcome {
    pub fn story(&self) -> &Story {
        match self {
            Self::Published(story) => story,
            Self::Queued { story, .. } => story,
        }
    }
}

pub struct SubmissionService {
    config: SubmissionConfig,
    store: LocalStore,
    queue: PendingQueue,
    delivery: Arc<dyn StoryDelivery>,
    background: BackgroundSync,
    drafts: DraftService,
    state: SharedState,
    event_bus: EventBus,
    online: watch::Receiver<bool>,
}

impl SubmissionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SubmissionConfig,
        store: LocalStore,
        queue: PendingQueue,
        delivery: Arc<dyn StoryDelivery>,
        background: BackgroundSync,
        drafts: DraftService,
        state: SharedState,
        event_bus: EventBus,
        online: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            store,
            queue,
            delivery,
            background,
            drafts,
            state,
            event_bus,
            online,
        }
    }

    /// Validate and submit a story form.
    pub async fn submit(&self, form: StoryForm) -> PhResult<SubmissionOutcome> {
        let rules = ValidationRules::from(&self.config);
        validate_with(&form, &rules, Utc::now().year()).map_err(|issues| {
            PhError::Validation(issues.iter().map(ToString::to_string).collect())
        })?;

        let online = *self.online.borrow();
        let outcome = if !online {
            let story = build_story(form, generate_story_id("offline"), StoryStatus::Offline);
            self.queue_story(story).await?
        } else {
            let story = build_story(form, generate_story_id("story"), StoryStatus::Pending);
            match self.config.mode {
                SubmissionMode::Local => self.publish(story).await,
                SubmissionMode::Remote => match self.delivery.deliver(&story).await {
                    Ok(()) => self.publish(story).await,
                    Err(e) => {
                        warn!("submission of story {} failed, queueing it: {e}", story.id);
                        self.queue_story(story).await?
                    }
                },
            }
        };

        let story = outcome.story();
        self.event_bus.emit(AppEvent::StorySubmitted {
            story_id: story.id.to_string(),
            status: story.status,
        });
        if let Err(e) = self.drafts.clear() {
            warn!("could not clear story draft: {e}");
        }
        Ok(outcome)
    }

    async fn publish(&self, mut story: Story) -> SubmissionOutcome {
        story.status = StoryStatus::Published;
        if let Err(e) = self.store.put(&story) {
            warn!("could not store story {}: {e}", story.id);
        }
        self.state.write().await.upsert_story(story.clone());
        info!("story {} published", story.id);
        SubmissionOutcome::Published(story)
    }

    async fn queue_story(&self, story: Story) -> PhResult<SubmissionOutcome> {
        let queue_len = self.queue.enqueue(story.clone()).await?;
        if let Err(e) = self.store.put(&story) {
            warn!("could not store queued story {}: {e}", story.id);
        }
        self.event_bus.emit(AppEvent::StoryQueued {
            story_id: story.id.to_string(),
            queue_len,
        });
        if let Err(e) = self.background.register(SYNC_STORIES_TAG).await {
            warn!("could not register background sync: {e}");
        }
        Ok(SubmissionOutcome::Queued { story, queue_len })
    }
}
