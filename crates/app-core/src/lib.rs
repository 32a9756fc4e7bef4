//! Core application logic for Risum
//!
//! This crate contains the business logic behind the screens: the meme
//! content shown in feeds, account registration, and user profiles.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod content;
pub mod profiles;
pub mod registration;

pub use content::{Comment, ContentError, Post, StaticContent};
pub use profiles::{FollowedUsers, ProfileError, ProfileService, ProfileView};
pub use registration::{
    generate_tag, AccountDraft, AvatarImage, ProfileSetup, RegistrationError,
    RegistrationServices, MAX_USER_NAME_LEN,
};
