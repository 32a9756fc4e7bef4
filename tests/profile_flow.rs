//! Profile and follow integration tests

use risum::app_core::{ProfileError, ProfileService, ProfileSetup, RegistrationServices, StaticContent};
use risum::app_state::{SessionManager, SessionServices};
use risum::app_ui::{MenuItem, NavigationStack, ProfileScreen, ProfileTab, Route, TopBar};
use risum::backend_client::{Credential, DocumentStore, GoogleAuthConfig, MemoryBackend, Uid};
use risum::storage::{KvStore, LocalStore};
use std::sync::Arc;

struct World {
    backend: Arc<MemoryBackend>,
    profiles: ProfileService,
}

impl World {
    fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let profiles = ProfileService::new(Arc::clone(&backend) as Arc<dyn DocumentStore>);
        Self { backend, profiles }
    }

    fn session(&self) -> SessionManager {
        let local: Arc<dyn LocalStore> = Arc::new(KvStore::in_memory().unwrap());
        SessionManager::new(
            SessionServices::from_backend(Arc::clone(&self.backend), local),
            GoogleAuthConfig::default(),
        )
    }

    async fn register(&self, uid: &str, user_name: &str) -> SessionManager {
        let session = self.session();
        self.backend.set_current_user(Some(Credential::registered(Uid::new(uid).unwrap())));
        ProfileSetup::new(user_name)
            .complete(&RegistrationServices::from_backend(Arc::clone(&self.backend)), &session)
            .await
            .unwrap();
        session
    }
}

fn no_content() -> Arc<StaticContent> {
    Arc::new(StaticContent::default())
}

#[tokio::test]
async fn test_follow_from_profile_screen() {
    let world = World::new();
    let _bob = world.register("bob", "bob").await;
    let alice = world.register("alice", "alice").await;

    let mut screen = ProfileScreen::open(&alice, &world.profiles, Some("bob"), no_content())
        .await
        .unwrap();
    assert_eq!(screen.view().user_name, "bob");
    assert!(screen.view().is_foreign);
    assert!(!screen.is_following());

    assert!(screen.follow(&alice, &world.profiles).await.unwrap());
    assert!(!screen.follow(&alice, &world.profiles).await.unwrap());

    let following = world
        .profiles
        .fetch_following(&Uid::new("alice").unwrap())
        .await
        .unwrap();
    assert_eq!(following.iter().collect::<Vec<_>>(), vec!["bob"]);

    // Re-opening reads the persisted set
    let screen = ProfileScreen::open(&alice, &world.profiles, Some("bob"), no_content())
        .await
        .unwrap();
    assert!(screen.is_following());
}

#[tokio::test]
async fn test_own_profile_via_top_bar() {
    let world = World::new();
    let alice = world.register("alice", "alice").await;
    let reads = world.backend.total_reads();

    let mut bar = TopBar::new("Risum");
    bar.open_menu();
    let route = bar.select(MenuItem::Profile);
    let mut nav = NavigationStack::for_session(&alice.snapshot());
    nav.push(route.clone());
    assert_eq!(nav.current(), &Route::own_profile());

    let Route::Profile { user_id } = route else {
        panic!("expected a profile route");
    };
    let mut screen = ProfileScreen::open(&alice, &world.profiles, user_id.as_deref(), no_content())
        .await
        .unwrap();

    assert!(!screen.can_follow());
    assert_eq!(screen.view().tag.len(), 4);
    // Only the following list is read; the profile itself comes from the session
    assert_eq!(world.backend.total_reads(), reads + 1);

    screen.tabs.select(ProfileTab::Comments);
    assert!(screen.tabs.is_selected(ProfileTab::Comments));
}

#[tokio::test]
async fn test_guest_cannot_follow() {
    let world = World::new();
    let _bob = world.register("bob", "bob").await;
    let guest = world.session();
    guest.login_anonymously().await.unwrap();

    let mut screen = ProfileScreen::open(&guest, &world.profiles, Some("bob"), no_content())
        .await
        .unwrap();

    let err = screen.follow(&guest, &world.profiles).await.unwrap_err();
    assert!(matches!(err, ProfileError::NoViewer));
}

#[tokio::test]
async fn test_missing_foreign_profile() {
    let world = World::new();
    let alice = world.register("alice", "alice").await;

    let result = ProfileScreen::open(&alice, &world.profiles, Some("ghost"), no_content()).await;
    assert!(matches!(result, Err(ProfileError::NotFound(_))));
}

#[tokio::test]
async fn test_unfollow_is_unsupported() {
    let world = World::new();
    let _bob = world.register("bob", "bob").await;
    let _alice = world.register("alice", "alice").await;
    let alice_uid = Uid::new("alice").unwrap();

    let mut following = world.profiles.fetch_following(&alice_uid).await.unwrap();
    world.profiles.follow(&alice_uid, "bob", &mut following).await.unwrap();

    let err = world.profiles.unfollow(&alice_uid, "bob", &mut following).await.unwrap_err();
    assert!(matches!(err, ProfileError::Unsupported(_)));
    assert!(following.contains("bob"));
}
