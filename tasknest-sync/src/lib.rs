//! # TaskNest Sync
//!
//! The live collection sync core: every screen is a view over owner-filtered
//! live queries, and every user action is forwarded to the backend.
//!
//! ## Architecture
//!
//! ```text
//! IdentityContext ──gates──> CollectionSubscription ──snapshots──> ViewState
//!        ▲                                                        │
//!        │                                                        ▼
//!   AccountScreen                      ListScreen ──actions──> MutationGateway
//!                                                                 │
//!                       backend push (same live query) <──────────┘
//! ```
//!
//! The only shortcut around the push loop is the image optimistic merge on
//! task screens.
//!
//! ## Module Organization
//!
//! - `context`: Process-wide context (backend handles, identity, config)
//! - `identity`: Current principal, auth-change listeners, account flows
//! - `subscription`: Owner-filtered live query delivering full snapshots
//! - `gateway`: Create/update/delete and image attach/detach
//! - `view_state`: Per-screen snapshot cache, draft and image overrides
//! - `screen`: List screens for projects, columns and tasks, account screen
//! - `navigation`: Routes and the navigator owning open screens
//! - `notice`: User-facing notifications
//! - `image`: Local image sources

pub mod context;
pub mod gateway;
pub mod identity;
pub mod image;
pub mod navigation;
pub mod notice;
pub mod screen;
pub mod subscription;
pub mod view_state;

pub use context::AppContext;
pub use gateway::MutationGateway;
pub use identity::{AuthSubscription, IdentityContext};
pub use navigation::{Navigator, Route, ScreenId};
pub use notice::{Notice, NoticeLevel, NoticeSink};
pub use screen::{AccountScreen, BoardScreen, ListScreen, ProjectListScreen, TaskScreen};
pub use subscription::CollectionSubscription;
pub use view_state::{Draft, Submission, ViewState};

/// Current version of the TaskNest sync core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
