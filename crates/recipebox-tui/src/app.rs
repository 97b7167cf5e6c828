//! Application state management for recipebox.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, the loaded recipes, the session and background task coordination.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use recipebox_core::api::{ApiClient, ApiError};
use recipebox_core::auth::SessionManager;
use recipebox_core::config::Config;
use recipebox_core::models::{Cuisine, Recipe, User, COOKING_TIME_PRESETS};
use recipebox_core::recipes::{
    filter_recipes, recipes_owned_by, unique_cuisines, ImageSource, RecipeDraft, RecipeError,
    RecipeRepository,
};
use recipebox_core::ImageHost;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

const MAX_SEARCH_LENGTH: usize = 100;
const MAX_TITLE_LENGTH: usize = 120;
const MAX_IMAGE_LENGTH: usize = 1024;
const MAX_TEXT_LENGTH: usize = 4000;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// How long a notification stays in the status bar
const NOTIFICATION_TTL: Duration = Duration::from_secs(4);

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Waiting for the startup session check
    Loading,
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    EditingRecipe,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// Field focused in the add/edit recipe form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Ingredients,
    Instructions,
    Type,
    CookingTime,
    Image,
    Submit,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Title,
        FormField::Ingredients,
        FormField::Instructions,
        FormField::Type,
        FormField::CookingTime,
        FormField::Image,
        FormField::Submit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Title => "Title",
            FormField::Ingredients => "Ingredients",
            FormField::Instructions => "Instructions",
            FormField::Type => "Type",
            FormField::CookingTime => "Cooking Time",
            FormField::Image => "Image",
            FormField::Submit => "Save",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        let idx = Self::ALL.iter().position(|f| f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Free-text fields accept typed characters
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            FormField::Title | FormField::Ingredients | FormField::Instructions | FormField::Image
        )
    }
}

/// Contents of the add/edit overlay
#[derive(Debug, Clone)]
pub struct RecipeForm {
    /// Recipe being edited; `None` when adding
    pub editing: Option<String>,
    pub title: String,
    pub ingredients: String,
    pub instructions: String,
    pub cuisine: Option<Cuisine>,
    pub cooking_time: Option<u32>,
    /// Image URL or local path, as typed
    pub image: String,
    pub focus: FormField,
    pub error: Option<String>,
    pub saving: bool,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self {
            editing: None,
            title: String::new(),
            ingredients: String::new(),
            instructions: String::new(),
            cuisine: None,
            cooking_time: None,
            image: String::new(),
            focus: FormField::Title,
            error: None,
            saving: false,
        }
    }
}

impl RecipeForm {
    pub fn for_recipe(recipe: &Recipe) -> Self {
        let draft = RecipeDraft::from_recipe(recipe);
        Self {
            editing: Some(recipe.id.clone()),
            title: draft.title,
            ingredients: draft.ingredients,
            instructions: draft.instructions,
            cuisine: draft.cuisine,
            cooking_time: draft.cooking_time,
            image: draft.image.map(|i| i.display()).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn to_draft(&self) -> RecipeDraft {
        RecipeDraft {
            title: self.title.clone(),
            ingredients: self.ingredients.clone(),
            instructions: self.instructions.clone(),
            cuisine: self.cuisine,
            cooking_time: self.cooking_time,
            image: ImageSource::parse(&expand_home(&self.image)),
        }
    }

    /// Text buffer behind the focused field, if it is a text field
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Title => Some(&mut self.title),
            FormField::Ingredients => Some(&mut self.ingredients),
            FormField::Instructions => Some(&mut self.instructions),
            FormField::Image => Some(&mut self.image),
            _ => None,
        }
    }

    /// Step the focused choice field (type or cooking time)
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.focus {
            FormField::Type => {
                self.cuisine = Some(if forward {
                    Cuisine::cycle(self.cuisine)
                } else {
                    previous_cuisine(self.cuisine)
                });
            }
            FormField::CookingTime => {
                self.cooking_time = Some(cycle_cooking_time(self.cooking_time, forward));
            }
            _ => {}
        }
    }
}

fn previous_cuisine(current: Option<Cuisine>) -> Cuisine {
    let last = Cuisine::ALL.len() - 1;
    match current.and_then(|c| Cuisine::ALL.iter().position(|x| *x == c)) {
        Some(0) | None => Cuisine::ALL[last],
        Some(idx) => Cuisine::ALL[idx - 1],
    }
}

/// Next cooking-time preset. Values off the preset list snap to the nearest
/// preset in the direction of travel.
pub fn cycle_cooking_time(current: Option<u32>, forward: bool) -> u32 {
    let first = COOKING_TIME_PRESETS[0];
    let last = COOKING_TIME_PRESETS[COOKING_TIME_PRESETS.len() - 1];
    match (current, forward) {
        (None, true) => first,
        (None, false) => last,
        (Some(t), true) => COOKING_TIME_PRESETS
            .iter()
            .copied()
            .find(|&p| p > t)
            .unwrap_or(first),
        (Some(t), false) => COOKING_TIME_PRESETS
            .iter()
            .rev()
            .copied()
            .find(|&p| p < t)
            .unwrap_or(last),
    }
}

/// Expand a leading `~/` in a typed image path
fn expand_home(input: &str) -> String {
    let trimmed = input.trim();
    match (trimmed.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).display().to_string(),
        _ => trimmed.to_string(),
    }
}

/// Recipe awaiting delete confirmation
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Error,
}

/// Transient message shown in the status bar
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    shown_at: Instant,
}

impl Notification {
    fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= NOTIFICATION_TTL
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned recipe operations.
#[derive(Debug)]
enum TaskResult {
    /// Recipe list fetched (or failed)
    Recipes(Result<Vec<Recipe>, RecipeError>),
    /// Create or update finished
    Saved {
        created: bool,
        result: Result<Option<Recipe>, RecipeError>,
    },
    /// Delete finished
    Deleted {
        id: String,
        result: Result<String, RecipeError>,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Build the session manager and recipe repository described by `config`
pub fn build_services(config: &Config) -> Result<(SessionManager, RecipeRepository)> {
    let api = ApiClient::new(&config.api_base_url, config.request_timeout())
        .context("Failed to create HTTP client")?;
    let images = ImageHost::new(
        api.http().clone(),
        config.image_upload_url.clone(),
        config.image_upload_key.clone(),
    );
    let store = config.token_store()?;
    Ok((SessionManager::new(api.clone(), store), RecipeRepository::new(api, images)))
}

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub auth: SessionManager,
    repository: RecipeRepository,

    // Data
    pub recipes: Vec<Recipe>,
    pub recipes_loading: bool,

    // UI State
    pub state: AppState,
    pub search_query: String,
    pub selection: usize,
    pub my_recipes_only: bool,

    // Login form
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Recipe form and delete confirmation
    pub form: RecipeForm,
    pub pending_delete: Option<PendingDelete>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,

    pub notification: Option<Notification>,
}

impl App {
    /// Create a new application instance from the loaded configuration
    pub fn new(config: Config) -> Result<Self> {
        let (auth, repository) = build_services(&config)?;
        Ok(Self::with_services(config, auth, repository))
    }

    pub fn with_services(config: Config, auth: SessionManager, repository: RecipeRepository) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Pre-fill credentials from env vars or config
        let login_email = config.login_email().unwrap_or_default();
        let login_password =
            std::env::var(recipebox_core::config::ENV_PASSWORD).unwrap_or_default();

        Self {
            config,
            auth,
            repository,

            recipes: Vec::new(),
            recipes_loading: false,

            state: AppState::Loading,
            search_query: String::new(),
            selection: 0,
            my_recipes_only: false,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,

            form: RecipeForm::default(),
            pending_delete: None,

            task_rx: rx,
            task_tx: tx,

            notification: None,
        }
    }

    /// Revalidate the stored session, then start loading recipes
    pub async fn initialize(&mut self) {
        let logged_in = self.auth.check_session().await.is_logged_in();
        debug!(logged_in, "Startup session check finished");
        self.state = AppState::Normal;
        self.refresh_recipes();
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn current_user(&self) -> Option<&User> {
        self.auth.session().user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.session().is_logged_in()
    }

    /// Repository carrying the session's current token
    fn authorized_repository(&self) -> RecipeRepository {
        self.repository.with_client(self.auth.authorized_client())
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let email = self.login_email.trim().to_string();
        if email.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }

        self.login_error = None;
        let password = self.login_password.clone();

        match self.auth.login(&email, &password).await {
            Ok(user) => {
                if let Err(e) = self.config.remember_email(&email) {
                    warn!(error = %e, "Failed to save config");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!(user_id = %user.id, "Login successful");
                self.notify(
                    NotificationKind::Success,
                    format!("Logged in as {}", user.display_name()),
                );
                self.refresh_recipes();
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(e.user_message());
            }
        }
    }

    pub async fn logout(&mut self) {
        self.auth.logout().await;
        self.my_recipes_only = false;
        self.clamp_selection();
        self.notify(NotificationKind::Info, "Logged out");
    }

    // =========================================================================
    // Recipe list
    // =========================================================================

    /// Recipes after the search term and the "my recipes" toggle
    pub fn visible_recipes(&self) -> Vec<&Recipe> {
        let filtered = filter_recipes(&self.recipes, &self.search_query);
        if self.my_recipes_only {
            recipes_owned_by(&filtered, self.current_user())
        } else {
            filtered
        }
    }

    pub fn selected_recipe(&self) -> Option<&Recipe> {
        self.visible_recipes().get(self.selection).copied()
    }

    /// Cuisine tags for the tag row, in first-seen order
    pub fn cuisine_tags(&self) -> Vec<Cuisine> {
        unique_cuisines(&self.recipes)
    }

    /// Tag whose name is the current search term, if any
    pub fn active_tag(&self) -> Option<Cuisine> {
        self.search_query.parse().ok()
    }

    /// Select the next cuisine tag as the search term. Past the last tag the
    /// search is cleared.
    pub fn cycle_cuisine_tag(&mut self) {
        let tags = self.cuisine_tags();
        let next = match self.active_tag() {
            Some(active) => tags
                .iter()
                .position(|t| *t == active)
                .and_then(|idx| tags.get(idx + 1))
                .copied(),
            None => tags.first().copied(),
        };
        self.search_query = next.map(|c| c.display_name().to_string()).unwrap_or_default();
        self.selection = 0;
    }

    pub fn toggle_my_recipes(&mut self) {
        if !self.is_logged_in() {
            self.notify(NotificationKind::Info, "Log in to see your recipes");
            return;
        }
        self.my_recipes_only = !self.my_recipes_only;
        self.selection = 0;
    }

    pub fn select_next(&mut self, step: usize) {
        let len = self.visible_recipes().len();
        if len > 0 {
            self.selection = (self.selection + step).min(len - 1);
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selection = self.selection.saturating_sub(step);
    }

    pub fn select_last(&mut self) {
        self.selection = self.visible_recipes().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_recipes().len();
        if self.selection >= len {
            self.selection = len.saturating_sub(1);
        }
    }

    // =========================================================================
    // Background operations
    // =========================================================================

    /// Fetch the recipe list in the background
    pub fn refresh_recipes(&mut self) {
        let repo = self.authorized_repository();
        let tx = self.task_tx.clone();
        self.recipes_loading = true;

        tokio::spawn(async move {
            let result = repo.list().await;
            Self::send_result(&tx, TaskResult::Recipes(result)).await;
        });
    }

    /// Open the form for a new recipe
    pub fn start_add(&mut self) {
        if !self.is_logged_in() {
            self.start_login();
            self.login_error = Some("Log in to add recipes".to_string());
            return;
        }
        self.form = RecipeForm::default();
        self.state = AppState::EditingRecipe;
    }

    /// Open the form pre-filled with the selected recipe (owner only)
    pub fn start_edit(&mut self) {
        let Some(recipe) = self.selected_recipe() else {
            return;
        };
        if !recipe.is_owned_by(self.current_user()) {
            self.notify(NotificationKind::Info, "You can only edit your own recipes");
            return;
        }
        let form = RecipeForm::for_recipe(recipe);
        self.form = form;
        self.state = AppState::EditingRecipe;
    }

    /// Validate the form and, if complete, save it in the background
    pub fn submit_form(&mut self) {
        if self.form.saving {
            return;
        }

        let draft = self.form.to_draft();
        if let Err(e) = draft.validate() {
            self.form.error = Some(e.to_string());
            return;
        }

        self.form.error = None;
        self.form.saving = true;

        let repo = self.authorized_repository();
        let tx = self.task_tx.clone();
        let editing = self.form.editing.clone();

        tokio::spawn(async move {
            let (created, result) = match editing {
                Some(id) => (false, repo.update(&id, &draft).await),
                None => (true, repo.create(&draft).await),
            };
            Self::send_result(&tx, TaskResult::Saved { created, result }).await;
        });
    }

    pub fn cancel_form(&mut self) {
        self.form = RecipeForm::default();
        self.state = AppState::Normal;
    }

    /// Ask for confirmation before deleting the selected recipe (owner only)
    pub fn start_delete(&mut self) {
        let Some(recipe) = self.selected_recipe() else {
            return;
        };
        if !recipe.is_owned_by(self.current_user()) {
            self.notify(NotificationKind::Info, "You can only delete your own recipes");
            return;
        }
        let pending = PendingDelete {
            id: recipe.id.clone(),
            title: recipe.title.clone(),
        };
        self.pending_delete = Some(pending);
        self.state = AppState::ConfirmingDelete;
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };

        let repo = self.authorized_repository();
        let tx = self.task_tx.clone();
        self.notify(NotificationKind::Info, format!("Deleting {}...", pending.title));

        tokio::spawn(async move {
            let result = repo.delete(&pending.id).await;
            Self::send_result(&tx, TaskResult::Deleted { id: pending.id, result }).await;
        });
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            debug!("App closed before background task finished");
        }
    }

    /// Check for completed background tasks and expire old notifications
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }

        if self.notification.as_ref().is_some_and(Notification::is_expired) {
            self.notification = None;
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Recipes(Ok(recipes)) => {
                debug!(count = recipes.len(), "Recipes loaded");
                self.recipes = recipes;
                self.recipes_loading = false;
                self.clamp_selection();
            }
            TaskResult::Recipes(Err(e)) => {
                error!(error = %e, "Failed to load recipes");
                self.recipes_loading = false;
                self.check_session_rejected(&e);
                self.notify(NotificationKind::Error, e.user_message());
            }
            TaskResult::Saved { created, result: Ok(_) } => {
                let message = if created {
                    "Recipe added successfully"
                } else {
                    "Recipe updated successfully"
                };
                self.form = RecipeForm::default();
                if self.state == AppState::EditingRecipe {
                    self.state = AppState::Normal;
                }
                self.notify(NotificationKind::Success, message);
                self.refresh_recipes();
            }
            TaskResult::Saved { result: Err(e), .. } => {
                error!(error = %e, "Failed to save recipe");
                self.check_session_rejected(&e);
                let message = e.user_message();
                self.form.saving = false;
                self.form.error = Some(message.clone());
                self.notify(NotificationKind::Error, message);
            }
            TaskResult::Deleted { id, result: Ok(message) } => {
                info!(id = %id, "Recipe deleted");
                self.notify(NotificationKind::Success, message);
                self.refresh_recipes();
            }
            TaskResult::Deleted { id, result: Err(e) } => {
                error!(id = %id, error = %e, "Failed to delete recipe");
                self.check_session_rejected(&e);
                self.notify(NotificationKind::Error, e.user_message());
            }
        }
    }

    /// A 401 on a recipe call means the stored token is no longer valid
    fn check_session_rejected(&mut self, err: &RecipeError) {
        if !matches!(err, RecipeError::Api(ApiError::Unauthorized)) {
            return;
        }
        warn!("Recipe call rejected the session token, logging out");
        self.auth.invalidate();
        self.my_recipes_only = false;
        self.clamp_selection();
    }

    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notification = Some(Notification::new(kind, message));
    }

    /// Log file location shown in the help overlay
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.config.cache_dir().ok().map(|d| d.join("logs"))
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_search_char(current_len: usize, c: char) -> bool {
    current_len < MAX_SEARCH_LENGTH && is_valid_input_char(c)
}

/// Check if a character should be accepted by a recipe form field
pub fn can_add_form_char(field: FormField, current_len: usize, c: char) -> bool {
    let max = match field {
        FormField::Title => MAX_TITLE_LENGTH,
        FormField::Image => MAX_IMAGE_LENGTH,
        FormField::Ingredients | FormField::Instructions => MAX_TEXT_LENGTH,
        FormField::Type | FormField::CookingTime | FormField::Submit => return false,
    };
    current_len < max && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Server, ServerGuard};
    use recipebox_core::auth::{MemoryTokenStore, TokenStore};

    fn recipe(id: &str, title: &str, cuisine: &str, owner: &str) -> Recipe {
        serde_json::from_value(serde_json::json!({
            "_id": id,
            "title": title,
            "type": cuisine,
            "cookingTime": 30,
            "ingredients": "rice",
            "instructions": "cook",
            "image": "https://img.example.com/x.jpg",
            "createdBy": {"_id": owner, "name": owner}
        }))
        .expect("Failed to build recipe")
    }

    fn app_for(server_url: &str, store: MemoryTokenStore) -> App {
        let api = ApiClient::new(server_url, Duration::from_secs(5)).expect("client");
        let images = ImageHost::new(api.http().clone(), format!("{}/upload", server_url), None);
        let auth = SessionManager::new(api.clone(), Box::new(store));
        let config = Config {
            api_base_url: server_url.to_string(),
            ..Config::default()
        };
        App::with_services(config, auth, RecipeRepository::new(api, images))
    }

    async fn logged_in_app(server: &mut ServerGuard) -> App {
        server
            .mock("GET", "/users/getUser")
            .with_status(200)
            .with_body(r#"{"data":{"_id":"u1","name":"Ana","email":"ana@example.com"}}"#)
            .create_async()
            .await;
        let mut app = app_for(&server.url(), MemoryTokenStore::with_token("abc123"));
        app.auth.check_session().await;
        app.state = AppState::Normal;
        app
    }

    fn sample_recipes() -> Vec<Recipe> {
        vec![
            recipe("1", "Green Curry", "THAI", "u1"),
            recipe("2", "Lasagna", "ITALIAN", "u2"),
            recipe("3", "Tom Yum", "THAI", "u2"),
            recipe("4", "Burger", "AMERICAN", "u1"),
        ]
    }

    // -------------------------------------------------------------------------
    // List state
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_visible_recipes_search_and_mine() {
        let mut server = Server::new_async().await;
        let mut app = logged_in_app(&mut server).await;
        app.recipes = sample_recipes();

        app.search_query = "thai".to_string();
        let ids: Vec<&str> = app.visible_recipes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        app.toggle_my_recipes();
        let ids: Vec<&str> = app.visible_recipes().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[tokio::test]
    async fn test_my_recipes_requires_login() {
        let mut app = app_for("http://127.0.0.1:1", MemoryTokenStore::new());
        app.toggle_my_recipes();
        assert!(!app.my_recipes_only);
        assert!(app.notification.is_some());
    }

    #[tokio::test]
    async fn test_cycle_cuisine_tag() {
        let mut app = app_for("http://127.0.0.1:1", MemoryTokenStore::new());
        app.recipes = sample_recipes();

        app.cycle_cuisine_tag();
        assert_eq!(app.search_query, "Thai");
        app.cycle_cuisine_tag();
        assert_eq!(app.search_query, "Italian");
        app.cycle_cuisine_tag();
        assert_eq!(app.search_query, "American");
        app.cycle_cuisine_tag();
        assert_eq!(app.search_query, "");
    }

    #[tokio::test]
    async fn test_selection_stays_in_bounds() {
        let mut app = app_for("http://127.0.0.1:1", MemoryTokenStore::new());
        app.recipes = sample_recipes();

        app.select_next(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 3);
        app.select_prev(1);
        assert_eq!(app.selection, 2);

        app.search_query = "lasagna".to_string();
        app.clamp_selection();
        assert_eq!(app.selected_recipe().map(|r| r.id.as_str()), Some("2"));
    }

    // -------------------------------------------------------------------------
    // Owner-only actions
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_edit_and_delete_only_for_owner() {
        let mut server = Server::new_async().await;
        let mut app = logged_in_app(&mut server).await;
        app.recipes = sample_recipes();

        // Lasagna belongs to u2
        app.selection = 1;
        app.start_edit();
        assert_eq!(app.state, AppState::Normal);
        app.start_delete();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.pending_delete.is_none());

        // Green Curry belongs to u1
        app.selection = 0;
        app.start_edit();
        assert_eq!(app.state, AppState::EditingRecipe);
        assert_eq!(app.form.editing.as_deref(), Some("1"));
        assert_eq!(app.form.title, "Green Curry");

        app.cancel_form();
        app.start_delete();
        assert_eq!(app.state, AppState::ConfirmingDelete);
        assert_eq!(app.pending_delete.as_ref().map(|p| p.id.as_str()), Some("1"));
    }

    #[tokio::test]
    async fn test_add_requires_login() {
        let mut app = app_for("http://127.0.0.1:1", MemoryTokenStore::new());
        app.state = AppState::Normal;
        app.start_add();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.login_error.is_some());
    }

    // -------------------------------------------------------------------------
    // Background results
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_refresh_loads_recipes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/Recipes/getAllRecipes")
            .with_status(200)
            .with_body(r#"{"data":[{"_id":"r1","title":"Pho","type":"ASIAN","cookingTime":60}]}"#)
            .create_async()
            .await;

        let mut app = app_for(&server.url(), MemoryTokenStore::new());
        app.refresh_recipes();
        assert!(app.recipes_loading);

        let result = app.task_rx.recv().await.expect("task result");
        app.process_task_result(result);

        assert!(!app.recipes_loading);
        assert_eq!(app.recipes.len(), 1);
        assert_eq!(app.recipes[0].title, "Pho");
    }

    #[tokio::test]
    async fn test_incomplete_form_is_not_sent() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/Recipes")
            .expect(0)
            .create_async()
            .await;
        let mut app = logged_in_app(&mut server).await;

        app.start_add();
        app.form.title = "Soup".to_string();
        app.submit_form();

        create.assert_async().await;
        assert!(!app.form.saving);
        assert_eq!(
            app.form.error.as_deref(),
            Some("Please fill in: Ingredients, Type, Instructions, Cooking Time, Image")
        );
    }

    #[tokio::test]
    async fn test_upload_failure_shows_error_and_skips_create() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/upload")
            .with_status(500)
            .with_body(r#"{"message":"upload broken"}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/Recipes")
            .expect(0)
            .create_async()
            .await;
        let mut app = logged_in_app(&mut server).await;

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let image = dir.path().join("soup.jpg");
        std::fs::write(&image, [1, 2, 3]).expect("write image");

        app.start_add();
        app.form.title = "Soup".to_string();
        app.form.ingredients = "water".to_string();
        app.form.instructions = "boil".to_string();
        app.form.cuisine = Some(Cuisine::French);
        app.form.cooking_time = Some(20);
        app.form.image = image.display().to_string();
        app.submit_form();
        assert!(app.form.saving);

        let result = app.task_rx.recv().await.expect("task result");
        app.process_task_result(result);

        create.assert_async().await;
        assert_eq!(app.state, AppState::EditingRecipe);
        assert!(!app.form.saving);
        let notification = app.notification.as_ref().expect("notification");
        assert_eq!(notification.kind, NotificationKind::Error);
        assert_eq!(notification.message, "Image upload failed: upload broken");
    }

    #[tokio::test]
    async fn test_delete_confirmed_refreshes_list() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/Recipes/delete/1")
            .match_header("authorization", "Bearer abc123")
            .with_status(200)
            .with_body(r#"{"message":"Recipe deleted successfully"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/Recipes/getAllRecipes")
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;
        let mut app = logged_in_app(&mut server).await;
        app.recipes = sample_recipes();

        app.start_delete();
        app.confirm_delete();
        let result = app.task_rx.recv().await.expect("delete result");
        app.process_task_result(result);

        delete.assert_async().await;
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some("Recipe deleted successfully")
        );
        assert!(app.recipes_loading, "list refresh should be in flight");

        let result = app.task_rx.recv().await.expect("list result");
        app.process_task_result(result);
        assert!(app.recipes.is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_list_logs_out() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/getUser")
            .with_status(200)
            .with_body(r#"{"data":{"_id":"u1","name":"Ana","email":"ana@example.com"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/Recipes/getAllRecipes")
            .with_status(401)
            .with_body(r#"{"message":"jwt expired"}"#)
            .create_async()
            .await;

        let store = MemoryTokenStore::with_token("abc123");
        let mut app = app_for(&server.url(), store.clone());
        app.auth.check_session().await;
        app.state = AppState::Normal;
        app.my_recipes_only = true;
        assert!(app.is_logged_in());

        app.refresh_recipes();
        let result = app.task_rx.recv().await.expect("list result");
        app.process_task_result(result);

        assert!(!app.is_logged_in());
        assert!(!app.my_recipes_only);
        assert_eq!(store.load().expect("load"), None);
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some("Your session has expired. Please log in again.")
        );
    }

    #[tokio::test]
    async fn test_unauthorized_delete_logs_out() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/Recipes/delete/1")
            .with_status(401)
            .create_async()
            .await;
        let mut app = logged_in_app(&mut server).await;
        app.recipes = sample_recipes();

        app.start_delete();
        app.confirm_delete();
        let result = app.task_rx.recv().await.expect("delete result");
        app.process_task_result(result);

        assert!(!app.is_logged_in());
        assert!(app.current_user().is_none());
        assert_eq!(
            app.notification.as_ref().map(|n| n.kind),
            Some(NotificationKind::Error)
        );
    }

    #[tokio::test]
    async fn test_forbidden_delete_keeps_session() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/Recipes/delete/1")
            .with_status(403)
            .with_body(r#"{"message":"Not your recipe"}"#)
            .create_async()
            .await;
        let mut app = logged_in_app(&mut server).await;
        app.recipes = sample_recipes();

        app.start_delete();
        app.confirm_delete();
        let result = app.task_rx.recv().await.expect("delete result");
        app.process_task_result(result);

        assert!(app.is_logged_in());
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some("Not your recipe")
        );
    }

    // -------------------------------------------------------------------------
    // Login
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_login_rejected_shows_server_message() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/users/login")
            .with_status(401)
            .with_body(r#"{"message":"Invalid email or password"}"#)
            .create_async()
            .await;
        let mut app = app_for(&server.url(), MemoryTokenStore::new());

        app.start_login();
        app.login_email = "ana@example.com".to_string();
        app.login_password = "nope".to_string();
        app.attempt_login().await;

        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_error.as_deref(), Some("Invalid email or password"));
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let mut app = app_for("http://127.0.0.1:1", MemoryTokenStore::new());
        app.login_email.clear();
        app.login_password = "secret".to_string();
        app.attempt_login().await;
        assert_eq!(app.login_error.as_deref(), Some("Email and password required"));
    }

    // -------------------------------------------------------------------------
    // Form helpers
    // -------------------------------------------------------------------------

    #[test]
    fn test_cycle_cooking_time() {
        assert_eq!(cycle_cooking_time(None, true), 15);
        assert_eq!(cycle_cooking_time(Some(15), true), 20);
        assert_eq!(cycle_cooking_time(Some(60), true), 15);
        assert_eq!(cycle_cooking_time(Some(25), true), 30);
        assert_eq!(cycle_cooking_time(None, false), 60);
        assert_eq!(cycle_cooking_time(Some(15), false), 60);
        assert_eq!(cycle_cooking_time(Some(25), false), 20);
    }

    #[test]
    fn test_form_field_navigation_wraps() {
        assert_eq!(FormField::Title.next(), FormField::Ingredients);
        assert_eq!(FormField::Submit.next(), FormField::Title);
        assert_eq!(FormField::Title.prev(), FormField::Submit);
        assert!(FormField::Image.is_text());
        assert!(!FormField::Type.is_text());
    }

    #[test]
    fn test_form_choice_cycling() {
        let mut form = RecipeForm {
            focus: FormField::Type,
            ..RecipeForm::default()
        };
        form.cycle_choice(true);
        assert_eq!(form.cuisine, Some(Cuisine::American));
        form.cycle_choice(false);
        assert_eq!(form.cuisine, Some(Cuisine::Japanese));

        form.focus = FormField::CookingTime;
        form.cycle_choice(true);
        assert_eq!(form.cooking_time, Some(15));
    }

    #[test]
    fn test_form_image_input_parsing() {
        let mut form = RecipeForm::default();
        form.image = "https://img.example.com/a.png".to_string();
        assert_eq!(
            form.to_draft().image,
            Some(ImageSource::Url("https://img.example.com/a.png".to_string()))
        );
        form.image = "   ".to_string();
        assert_eq!(form.to_draft().image, None);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(253, '@'));
        assert!(!can_add_email_char(254, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_can_add_form_char() {
        assert!(can_add_form_char(FormField::Title, 0, 'P'));
        assert!(!can_add_form_char(FormField::Title, MAX_TITLE_LENGTH, 'P'));
        assert!(can_add_form_char(FormField::Ingredients, 500, ' '));
        assert!(!can_add_form_char(FormField::Type, 0, 'a'));
        assert!(!can_add_form_char(FormField::Image, 0, '\t'));
    }
}
