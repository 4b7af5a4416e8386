//! Route handlers
//!
//! Permission checks happen at the top of each handler, before a session is opened.

mod admin;
mod attendance;
mod auth;
mod dues;
mod forms;
mod health;
mod members;
mod referrals;
mod reports;
mod tenant;

pub use admin::*;
pub use attendance::*;
pub use auth::*;
pub use dues::*;
pub use forms::*;
pub use health::*;
pub use members::*;
pub use referrals::*;
pub use reports::*;
pub use tenant::*;

use roster_tenant::TenantSession;

use crate::{ApiResult, AppState, TenantContext};

/// Open a session on the request's tenant; it is released when dropped
pub(crate) async fn open_session(state: &AppState, ctx: &TenantContext) -> ApiResult<TenantSession> {
    Ok(state.sessions.acquire(&ctx.tenant, ctx.scope).await?)
}
