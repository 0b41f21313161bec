//! Engagement resumes and rankings over xAPI-style interaction logs.
//!
//! Raw events are normalized ([`normalize`]), aggregated per actor, course or
//! institution ([`aggregate`]), scored ([`score`]) and ranked ([`rank`]);
//! [`resume::ResumeBuilder`] ties the steps together for one report request.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod normalize;
pub mod rank;
pub mod report;
pub mod resume;
pub mod score;
pub mod telemetry;

pub use error::{EngagementError, Result};
pub use models::{
    ActionCount, ActorId, ActorResume, AssessmentKind, CourseHeadcount, Event, GroupKind,
    GroupResume, Place, Resume, ScoreRow, ScoreTable, Selector, SuccessfulCounts,
};
pub use resume::{resume_actor, resume_group, ResumeBuilder};
