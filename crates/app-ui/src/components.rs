//! UI component state for Risum
//!
//! Components here hold the interactive state of a widget and expose the
//! events the frontend forwards to them. Rendering is left to the frontend;
//! each component serializes to the props it needs.
//!
//! # Available Components
//!
//! - [`TopBar`] - Title bar with search field and avatar menu
//! - [`CommentCard`] - A comment with a like toggle
//! - [`ProfileTabs`] - Tab selector on the profile screen

use crate::navigation::Route;
use app_core::Comment;
use serde::{Deserialize, Serialize};

// =============================================================================
// Top Bar Component
// =============================================================================

/// Entries of the avatar menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MenuItem {
    /// Own profile
    Profile,
    /// App settings
    Settings,
    /// Saved memes
    SavedMemes,
}

impl MenuItem {
    /// Menu entries in display order
    pub fn all() -> [MenuItem; 3] {
        [MenuItem::Profile, MenuItem::Settings, MenuItem::SavedMemes]
    }

    /// Label shown in the menu
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Profile => "Perfil",
            MenuItem::Settings => "Configurações",
            MenuItem::SavedMemes => "Memes Salvos",
        }
    }

    /// Where the entry leads
    pub fn route(&self) -> Route {
        match self {
            MenuItem::Profile => Route::own_profile(),
            MenuItem::Settings => Route::Settings,
            MenuItem::SavedMemes => Route::SavedMemes,
        }
    }
}

/// Title bar shown above the feed
///
/// The title is replaced by a search field while search is open. A long press
/// on the avatar opens the menu; a short press goes to the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBar {
    /// Screen title
    pub title: String,
    /// Whether the search field replaces the title
    pub search_open: bool,
    /// Current search text
    pub query: String,
    /// Whether the avatar menu is shown
    pub menu_visible: bool,
}

impl TopBar {
    /// Create a top bar with a title
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), search_open: false, query: String::new(), menu_visible: false }
    }

    /// Show or hide the search field (hiding it clears the query)
    pub fn toggle_search(&mut self) {
        self.search_open = !self.search_open;
        if !self.search_open {
            self.query.clear();
        }
    }

    /// Update the search text
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Whether the title is visible
    pub fn shows_title(&self) -> bool {
        !self.search_open
    }

    /// Long press on the avatar
    pub fn open_menu(&mut self) {
        self.menu_visible = true;
    }

    /// Dismiss the avatar menu
    pub fn close_menu(&mut self) {
        self.menu_visible = false;
    }

    /// Pick a menu entry; the menu closes
    pub fn select(&mut self, item: MenuItem) -> Route {
        self.menu_visible = false;
        item.route()
    }

    /// Short press on the avatar
    pub fn press_avatar(&self) -> Route {
        Route::own_profile()
    }
}

// =============================================================================
// Comment Card Component
// =============================================================================

/// A comment with a local like toggle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCard {
    /// The comment shown
    pub comment: Comment,
    /// Whether the viewer liked it
    pub liked: bool,
}

impl CommentCard {
    /// Wrap a comment (not liked)
    pub fn new(comment: Comment) -> Self {
        Self { comment, liked: false }
    }

    /// Icon name for the like button
    pub fn like_icon(&self) -> &'static str {
        if self.liked {
            "like1"
        } else {
            "like2"
        }
    }

    /// Flip the like and adjust the count
    ///
    /// Returns the new like count.
    pub fn toggle_like(&mut self) -> u32 {
        self.liked = !self.liked;
        self.comment.likes = if self.liked {
            self.comment.likes.saturating_add(1)
        } else {
            self.comment.likes.saturating_sub(1)
        };
        self.comment.likes
    }
}

// =============================================================================
// Profile Tabs Component
// =============================================================================

/// Tabs on the profile screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProfileTab {
    /// Memes posted by the user
    #[default]
    Memes,
    /// Text posts
    Posts,
    /// Comments
    Comments,
    /// Profile information
    Info,
}

impl ProfileTab {
    /// Tabs in display order
    pub fn all() -> [ProfileTab; 4] {
        [ProfileTab::Memes, ProfileTab::Posts, ProfileTab::Comments, ProfileTab::Info]
    }

    /// Tab label
    pub fn label(&self) -> &'static str {
        match self {
            ProfileTab::Memes => "Memes",
            ProfileTab::Posts => "Posts",
            ProfileTab::Comments => "Comentários",
            ProfileTab::Info => "Info",
        }
    }
}

/// Tab selector; exactly one tab is selected at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileTabs {
    selected: ProfileTab,
}

impl ProfileTabs {
    /// Selected tab
    pub fn selected(&self) -> ProfileTab {
        self.selected
    }

    /// Select a tab
    pub fn select(&mut self, tab: ProfileTab) {
        self.selected = tab;
    }

    /// Whether `tab` is the selected one
    pub fn is_selected(&self, tab: ProfileTab) -> bool {
        self.selected == tab
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(likes: u32) -> Comment {
        Comment {
            id: 1,
            post_id: 1,
            author_id: "bob".to_string(),
            content: "kkkk".to_string(),
            likes,
        }
    }

    #[test]
    fn test_top_bar_search() {
        let mut bar = TopBar::new("Risum");
        assert!(bar.shows_title());

        bar.toggle_search();
        bar.set_query("gato");
        assert!(!bar.shows_title());
        assert_eq!(bar.query, "gato");

        bar.toggle_search();
        assert!(bar.shows_title());
        assert!(bar.query.is_empty());
    }

    #[test]
    fn test_top_bar_menu() {
        let mut bar = TopBar::new("Risum");
        bar.open_menu();
        assert!(bar.menu_visible);

        assert_eq!(bar.select(MenuItem::SavedMemes), Route::SavedMemes);
        assert!(!bar.menu_visible);

        bar.open_menu();
        bar.close_menu();
        assert!(!bar.menu_visible);
    }

    #[test]
    fn test_menu_routes() {
        let routes: Vec<Route> = MenuItem::all().iter().map(MenuItem::route).collect();
        assert_eq!(routes, vec![Route::own_profile(), Route::Settings, Route::SavedMemes]);
        assert_eq!(MenuItem::Settings.label(), "Configurações");
        assert_eq!(TopBar::new("x").press_avatar(), Route::own_profile());
    }

    #[test]
    fn test_comment_like_toggle() {
        let mut card = CommentCard::new(comment(3));
        assert_eq!(card.like_icon(), "like2");

        assert_eq!(card.toggle_like(), 4);
        assert_eq!(card.like_icon(), "like1");
        assert_eq!(card.toggle_like(), 3);
    }

    #[test]
    fn test_comment_like_never_negative() {
        let mut card = CommentCard { comment: comment(0), liked: true };
        assert_eq!(card.toggle_like(), 0);
        assert!(!card.liked);
    }

    #[test]
    fn test_profile_tabs() {
        let mut tabs = ProfileTabs::default();
        assert_eq!(tabs.selected(), ProfileTab::Memes);

        tabs.select(ProfileTab::Info);
        let selected: Vec<ProfileTab> =
            ProfileTab::all().into_iter().filter(|t| tabs.is_selected(*t)).collect();
        assert_eq!(selected, vec![ProfileTab::Info]);
    }
}
