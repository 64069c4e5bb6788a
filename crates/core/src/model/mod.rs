mod ids;
mod snapshot;
mod tutorial;
mod view;

pub use ids::{ModuleId, ParseIdError, TutorialId, UserId};
pub use snapshot::ProgressSnapshot;
pub use tutorial::Tutorial;
pub use view::ProgressCardView;
