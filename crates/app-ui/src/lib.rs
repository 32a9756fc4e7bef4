//! User interface state for Risum
//!
//! This crate holds the state behind the screens: navigation, the
//! components the screens are built from, and the screens themselves.
//! Rendering is done by the frontend.
//!
//! # Modules
//!
//! - [`components`] - Top bar, comment card and profile tabs
//! - [`screens`] - Feed and profile screens
//! - [`navigation`] - Routes and the navigation stack

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
pub mod navigation;
pub mod screens;

pub use components::{CommentCard, MenuItem, ProfileTab, ProfileTabs, TopBar};
pub use navigation::{NavigationStack, Route};
pub use screens::{FeedScreen, ProfileScreen};
