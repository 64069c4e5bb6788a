#![forbid(unsafe_code)]

pub mod model;
pub mod progress;

pub use model::{
    ModuleId, ParseIdError, ProgressCardView, ProgressSnapshot, Tutorial, TutorialId, UserId,
};
