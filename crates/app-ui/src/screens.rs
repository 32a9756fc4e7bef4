//! Screen state
//!
//! A screen bundles the component state it renders with the loaders and
//! services it drives.

use crate::components::{ProfileTabs, TopBar};
use app_core::{FollowedUsers, Post, ProfileError, ProfileService, ProfileView, StaticContent};
use app_state::{FeedConfig, FeedLoader, LoadOutcome, SessionManager};
use std::sync::Arc;

/// The meme feed
pub struct FeedScreen {
    /// Title bar
    pub top_bar: TopBar,
    loader: FeedLoader<Arc<StaticContent>>,
}

impl FeedScreen {
    /// Mount the feed over `content`
    pub fn new(content: Arc<StaticContent>, config: FeedConfig) -> Self {
        Self { top_bar: TopBar::new("Risum"), loader: FeedLoader::with_config(content, config) }
    }

    /// Pagination state
    pub fn loader(&self) -> &FeedLoader<Arc<StaticContent>> {
        &self.loader
    }

    /// The list scrolled near its end
    pub fn on_end_reached(&mut self) -> LoadOutcome {
        self.loader.load_next()
    }

    /// Pull-to-refresh
    pub fn on_refresh(&mut self) -> LoadOutcome {
        self.loader.refresh()
    }

    /// Posts in feed order
    pub fn posts(&self) -> &[Post] {
        self.loader.source().posts()
    }
}

/// A user's profile
pub struct ProfileScreen {
    view: ProfileView,
    following: FollowedUsers,
    /// Tab selector
    pub tabs: ProfileTabs,
    loader: FeedLoader<Arc<StaticContent>>,
}

impl ProfileScreen {
    /// Load the profile to show
    ///
    /// # Arguments
    ///
    /// * `session` - Provides the viewer
    /// * `profiles` - Profile lookups
    /// * `target` - Uid of a foreign profile, `None` for the viewer's own
    /// * `content` - Posts shown under the memes tab
    pub async fn open(
        session: &SessionManager,
        profiles: &ProfileService,
        target: Option<&str>,
        content: Arc<StaticContent>,
    ) -> Result<Self, ProfileError> {
        let viewer = session.current_user();
        let view = profiles.load(viewer.as_ref(), target).await?;

        let following = match &viewer {
            Some(viewer) => profiles.fetch_following(&viewer.uid).await?,
            None => FollowedUsers::new(),
        };

        Ok(Self {
            view,
            following,
            tabs: ProfileTabs::default(),
            loader: FeedLoader::new(content),
        })
    }

    /// The profile being shown
    pub fn view(&self) -> &ProfileView {
        &self.view
    }

    /// Users the viewer follows
    pub fn following(&self) -> &FollowedUsers {
        &self.following
    }

    /// Whether the follow button is shown
    pub fn can_follow(&self) -> bool {
        self.view.is_foreign
    }

    /// Whether the viewer already follows this profile
    pub fn is_following(&self) -> bool {
        self.following.contains(&self.view.uid)
    }

    /// Follow the profile being shown
    ///
    /// # Errors
    ///
    /// - `ProfileError::NoViewer` - nobody is signed in with a registered account
    /// - anything [`ProfileService::follow`] returns
    pub async fn follow(
        &mut self,
        session: &SessionManager,
        profiles: &ProfileService,
    ) -> Result<bool, ProfileError> {
        let viewer = session.current_user().ok_or(ProfileError::NoViewer)?;
        profiles.follow(&viewer.uid, &self.view.uid, &mut self.following).await
    }

    /// Posts by the profile owner
    pub fn posts(&self) -> Vec<&Post> {
        self.loader.source().posts_by(&self.view.uid).collect()
    }

    /// The list scrolled near its end
    pub fn on_end_reached(&mut self) -> LoadOutcome {
        self.loader.load_next()
    }
}
