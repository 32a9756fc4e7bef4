//! Navigation for Risum
//!
//! The app uses a single stack navigator. Which stack root is shown depends
//! on the session: signed-in users land on the feed, everyone else on the
//! welcome screen.

use app_state::SessionState;
use serde::{Deserialize, Serialize};

// =============================================================================
// Route Definitions
// =============================================================================

/// All screens in the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", content = "params")]
pub enum Route {
    // Unauthenticated
    /// Landing screen with sign-in options
    Welcome,
    /// Email sign-in
    Login,
    /// Registration step 1: email and username
    RegisterStage1,
    /// Registration step 2: public username and avatar
    RegisterStage2,
    /// Registration step 3: confirmation
    RegisterStage3,

    // Authenticated
    /// Meme feed
    Feed,
    /// Profile view
    Profile {
        /// Uid of a foreign profile; `None` shows the viewer's own
        #[serde(skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    /// App settings
    Settings,
    /// Memes saved by the user
    SavedMemes,
}

impl Route {
    /// The viewer's own profile
    pub fn own_profile() -> Self {
        Route::Profile { user_id: None }
    }

    /// Someone else's profile
    pub fn profile(user_id: impl Into<String>) -> Self {
        Route::Profile { user_id: Some(user_id.into()) }
    }

    /// Stack root for the given session
    pub fn initial(session: &SessionState) -> Self {
        if session.is_signed() {
            Route::Feed
        } else {
            Route::Welcome
        }
    }

    /// Whether the route needs a signed-in session
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Route::Welcome
                | Route::Login
                | Route::RegisterStage1
                | Route::RegisterStage2
                | Route::RegisterStage3
        )
    }

    /// Header title
    pub fn title(&self) -> &'static str {
        match self {
            Route::Welcome => "Risum",
            Route::Login => "Entrar",
            Route::RegisterStage1 | Route::RegisterStage2 | Route::RegisterStage3 => "Cadastro",
            Route::Feed => "Risum",
            Route::Profile { .. } => "Perfil",
            Route::Settings => "Configurações",
            Route::SavedMemes => "Memes Salvos",
        }
    }

    /// Path used for deep links
    pub fn to_path(&self) -> String {
        match self {
            Route::Welcome => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::RegisterStage1 => "/register/1".to_string(),
            Route::RegisterStage2 => "/register/2".to_string(),
            Route::RegisterStage3 => "/register/3".to_string(),
            Route::Feed => "/feed".to_string(),
            Route::Profile { user_id: None } => "/profile".to_string(),
            Route::Profile { user_id: Some(id) } => format!("/profile/{}", id),
            Route::Settings => "/settings".to_string(),
            Route::SavedMemes => "/saved".to_string(),
        }
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// Stack of visited screens
///
/// The root can never be popped, so there is always a current route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStack {
    root: Route,
    pushed: Vec<Route>,
}

impl NavigationStack {
    /// Create a stack with a root route
    pub fn new(root: Route) -> Self {
        Self { root, pushed: Vec::new() }
    }

    /// Create a stack rooted at the screen matching the session
    pub fn for_session(session: &SessionState) -> Self {
        Self::new(Route::initial(session))
    }

    /// Push a route
    pub fn push(&mut self, route: Route) {
        tracing::trace!(path = %route.to_path(), "push");
        self.pushed.push(route);
    }

    /// Pop the top route (returns false when already at the root)
    pub fn go_back(&mut self) -> bool {
        self.pushed.pop().is_some()
    }

    /// Replace the whole stack with a single root
    pub fn reset_to(&mut self, route: Route) {
        tracing::debug!(path = %route.to_path(), "reset navigation");
        self.root = route;
        self.pushed.clear();
    }

    /// The route on top
    pub fn current(&self) -> &Route {
        self.pushed.last().unwrap_or(&self.root)
    }

    /// Whether there is anything to go back to
    pub fn can_go_back(&self) -> bool {
        !self.pushed.is_empty()
    }

    /// Number of routes on the stack, root included
    pub fn depth(&self) -> usize {
        self.pushed.len() + 1
    }
}

// =============================================================================
// Tests
// =============================================================================
