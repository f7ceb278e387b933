//! Reusable widget components.

pub mod crumbs;
pub mod detail;
pub mod layout;
pub mod menu;
pub mod statusbar;
pub mod timeline;
pub mod tree;

pub use crumbs::Crumbs;
pub use detail::{parse_details, DetailPanel};
pub use layout::{centered_rect, two_column};
pub use menu::MenuBar;
pub use statusbar::{StatsBar, WorkflowStats};
pub use timeline::TimelineWidget;
pub use tree::{visible_nodes, EventTreeWidget};
