/// Navigation between screens
///
/// Routes carry the parent ids a screen needs. The [`Navigator`] keeps the
/// open screens as a stack keyed by [`ScreenId`]; each pushed route gets an
/// independent screen with its own live query, and popping a route closes it.
///
/// The navigator also follows the auth state: signing out closes every open
/// screen, signing in makes the project list the root.

use crate::context::AppContext;
use crate::notice::NoticeSink;
use crate::screen::{BoardScreen, ProjectListScreen, TaskScreen};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use tasknest_shared::models::{Principal, TaskScope};
use tasknest_shared::paths::CollectionPath;
use tasknest_shared::SyncResult;

/// Where a screen points
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Route {
    ProjectList,
    Board {
        project_id: String,
    },
    Tasks {
        project_id: String,
        column_id: String,
    },
}

impl Route {
    /// Collection the routed screen lists
    pub fn collection_path(&self) -> CollectionPath {
        match self {
            Route::ProjectList => CollectionPath::projects(),
            Route::Board { project_id } => CollectionPath::columns(project_id),
            Route::Tasks {
                project_id,
                column_id,
            } => CollectionPath::tasks(project_id, column_id),
        }
    }
}

/// Key of an open screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(u64);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "screen-{}", self.0)
    }
}

/// A screen owned by the navigator
#[derive(Debug)]
pub enum OpenScreen {
    Projects(ProjectListScreen),
    Board(BoardScreen),
    Tasks(TaskScreen),
}

impl OpenScreen {
    fn open(ctx: &AppContext, route: &Route, notices: NoticeSink) -> SyncResult<Self> {
        Ok(match route {
            Route::ProjectList => OpenScreen::Projects(ProjectListScreen::open(ctx, (), notices)?),
            Route::Board { project_id } => {
                OpenScreen::Board(BoardScreen::open(ctx, project_id.clone(), notices)?)
            }
            Route::Tasks {
                project_id,
                column_id,
            } => OpenScreen::Tasks(TaskScreen::open(
                ctx,
                TaskScope::new(project_id.clone(), column_id.clone()),
                notices,
            )?),
        })
    }

    /// Route the screen currently shows
    pub fn route(&self) -> Route {
        match self {
            OpenScreen::Projects(_) => Route::ProjectList,
            OpenScreen::Board(screen) => Route::Board {
                project_id: screen.scope().clone(),
            },
            OpenScreen::Tasks(screen) => Route::Tasks {
                project_id: screen.scope().project_id.clone(),
                column_id: screen.scope().column_id.clone(),
            },
        }
    }

    pub fn as_projects(&self) -> Option<&ProjectListScreen> {
        match self {
            OpenScreen::Projects(screen) => Some(screen),
            _ => None,
        }
    }

    pub fn as_board(&self) -> Option<&BoardScreen> {
        match self {
            OpenScreen::Board(screen) => Some(screen),
            _ => None,
        }
    }

    pub fn as_tasks(&self) -> Option<&TaskScreen> {
        match self {
            OpenScreen::Tasks(screen) => Some(screen),
            _ => None,
        }
    }

    async fn close(self) {
        match self {
            OpenScreen::Projects(screen) => screen.close().await,
            OpenScreen::Board(screen) => screen.close().await,
            OpenScreen::Tasks(screen) => screen.close().await,
        }
    }
}

/// Stack of open screens
pub struct Navigator {
    ctx: AppContext,
    notices: NoticeSink,
    stack: Vec<(ScreenId, OpenScreen)>,
    next_id: u64,
}

impl Navigator {
    /// Creates an empty navigator; screens report on `notices`
    pub fn new(ctx: &AppContext, notices: NoticeSink) -> Self {
        Navigator {
            ctx: ctx.clone(),
            notices,
            stack: Vec::new(),
            next_id: 1,
        }
    }

    /// Opens a screen for `route` on top of the stack
    ///
    /// # Errors
    ///
    /// The screen's open error (`Unauthenticated`, `Backend`); the stack is
    /// left unchanged.
    pub fn push(&mut self, route: Route) -> SyncResult<ScreenId> {
        let screen = OpenScreen::open(&self.ctx, &route, self.notices.clone())?;

        let id = ScreenId(self.next_id);
        self.next_id += 1;
        self.stack.push((id, screen));

        tracing::debug!(screen = %id, route = ?route, depth = self.stack.len(), "Pushed screen");

        Ok(id)
    }

    /// Closes the top screen and returns its route
    pub async fn pop(&mut self) -> Option<Route> {
        let (id, screen) = self.stack.pop()?;
        let route = screen.route();
        screen.close().await;

        tracing::debug!(screen = %id, route = ?route, "Popped screen");

        Some(route)
    }

    /// Closes every open screen
    pub async fn reset(&mut self) {
        if self.stack.is_empty() {
            return;
        }

        let closing = self.stack.len();
        join_all(self.stack.drain(..).map(|(_, screen)| screen.close())).await;

        tracing::debug!(closed = closing, "Closed all screens");
    }

    /// Switches the stack on an auth transition
    ///
    /// Signing out closes every screen. Signing in closes whatever was open
    /// and starts over at the project list.
    pub async fn handle_auth_change(&mut self, principal: Option<&Principal>) -> SyncResult<()> {
        self.reset().await;

        match principal {
            Some(principal) => {
                tracing::info!(principal = %principal.id, "Opening project list");
                self.push(Route::ProjectList)?;
            }
            None => {
                tracing::info!("Signed out, no screen open");
            }
        }

        Ok(())
    }

    pub fn top(&self) -> Option<&OpenScreen> {
        self.stack.last().map(|(_, screen)| screen)
    }

    pub fn top_id(&self) -> Option<ScreenId> {
        self.stack.last().map(|(id, _)| *id)
    }

    pub fn get(&self, id: ScreenId) -> Option<&OpenScreen> {
        self.stack
            .iter()
            .find(|(open, _)| *open == id)
            .map(|(_, screen)| screen)
    }

    pub fn get_mut(&mut self, id: ScreenId) -> Option<&mut OpenScreen> {
        self.stack
            .iter_mut()
            .find(|(open, _)| *open == id)
            .map(|(_, screen)| screen)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Routes of the open screens, bottom first
    pub fn routes(&self) -> Vec<Route> {
        self.stack.iter().map(|(_, screen)| screen.route()).collect()
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("stack", &self.stack)
            .field("next_id", &self.next_id)
            .finish()
    }
}
