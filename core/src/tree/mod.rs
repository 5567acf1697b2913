pub mod node;
pub mod view;
pub mod auto_refresh;

#[cfg(test)]
pub(crate) mod testing;

pub use node::{Collapsible, TreeItem, TreeNode};
pub use view::{
    NodeChanged, RefreshNodeArgs, RefreshReason, Root, RootChanged, TreeView, ViewChanged, ViewContext,
    ViewEvents, ViewKind,
};
pub use auto_refresh::{AutoRefresh, AutoRefreshToggled};
