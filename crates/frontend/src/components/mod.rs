pub mod dashboard_panels;
pub mod pin_marker;
pub mod plan_viewer;
pub mod sidebar;
pub mod stats_cards;
pub mod work_item_modal;
