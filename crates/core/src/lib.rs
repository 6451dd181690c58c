mod apply;
mod collision;
mod config;
mod log;
mod planner;
mod selector;
mod template;
mod undo;

pub use apply::{execute_plan, execute_plan_with_options, ApplyOptions, RenameError};
pub use collision::{validate_plan, CollisionError};
pub use config::{app_paths, load_config, save_config, AppConfig, AppPaths, DEFAULT_TEMPLATE};
pub use log::{load_log, save_log, RenameLog, RenamePair};
pub use planner::{build_plan, collect_image_files, PlanEntry, PlanError, RenamePlan, ScanStats};
pub use selector::{
    contains_cjk, is_messy_name, match_any_prefix, parse_prefixes, select_candidates,
    SelectionRule,
};
pub use template::{
    has_shared_segment, per_run_starts, render, tokenize, Segment, TemplateError,
};
pub use undo::{undo_from_log, UndoError, UndoReport};
