//! Ordering engine: orderable nodes, the constraint graph, and member ranking.

pub mod graph;
pub mod orderable;
pub mod ranking;

pub use graph::{sort_orderables, sort_orderables_with_report, BrokenConstraint, Graph, GraphOrder};
pub use orderable::Orderable;
pub use ranking::{resolve_member_order, Hierarchy, MemberKey, MemberRanking, Resolution};
