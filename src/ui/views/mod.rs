mod analysis;
mod bookmarks;
mod books;
mod dashboard;
mod dsa;
mod internships;
mod login;
mod optimizer;
mod roadmap;

pub use analysis::AnalysisView;
pub use bookmarks::BookmarksView;
pub use books::BooksView;
pub use dashboard::DashboardView;
pub use dsa::DsaView;
pub use internships::InternshipsView;
pub use login::LoginView;
pub use optimizer::OptimizerView;
pub use roadmap::RoadmapView;

use crate::api::types::{Bookmark, NewBookmark};
use crate::api::CareerQuery;
use crate::app::Context;
use crate::db::flags::ANALYSIS_COMPLETED;
use crate::query::{Mutation, PendingMutation};
use crate::ui::view::{Toast, View, ViewAction};

/// Root view after login: the dashboard once the analysis is done
pub fn home_view(ctx: &Context) -> Box<dyn View> {
  if ctx.flag(ANALYSIS_COMPLETED) {
    Box::new(DashboardView::new(ctx.clone()))
  } else {
    Box::new(AnalysisView::new(ctx.clone()))
  }
}

/// Root view for a `:` command
pub fn for_command(name: &str, ctx: &Context) -> Option<Box<dyn View>> {
  let ctx = ctx.clone();
  let view: Box<dyn View> = match name {
    "dashboard" => Box::new(DashboardView::new(ctx)),
    "analysis" => Box::new(AnalysisView::new(ctx)),
    "internships" => Box::new(InternshipsView::new(ctx)),
    "books" => Box::new(BooksView::new(ctx)),
    "dsa" => Box::new(DsaView::new(ctx)),
    "optimize" => Box::new(OptimizerView::new(ctx)),
    "bookmarks" => Box::new(BookmarksView::new(ctx)),
    _ => return None,
  };
  Some(view)
}

/// Save an item to the bookmark list
fn spawn_bookmark(ctx: &Context, bookmark: NewBookmark) -> PendingMutation<Bookmark> {
  let api = ctx.api.clone();
  let mutation = Mutation::new(format!("bookmark {}", bookmark.kind))
    .invalidates(CareerQuery::Bookmarks.category_pattern());
  ctx
    .store
    .spawn_mutation(mutation, async move { api.add_bookmark(&bookmark).await })
}

/// Toast for a finished bookmark write
fn poll_bookmark(pending: &mut Option<PendingMutation<Bookmark>>) -> ViewAction {
  let Some(result) = pending.as_mut().and_then(PendingMutation::poll) else {
    return ViewAction::None;
  };
  *pending = None;
  match result {
    Ok(bookmark) => ViewAction::Toast(Toast::info(format!("Bookmarked {}", bookmark.title))),
    Err(e) => ViewAction::Toast(Toast::error(e.to_string())),
  }
}

#[cfg(test)]
pub(crate) use tests::test_context;
