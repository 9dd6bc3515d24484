//! # spritereel-studio
//!
//! Interactive side of spritereel: which sprite is shown, how controls map
//! onto it, and the controlled recording that captures the preview.

pub mod clock;
pub mod controls;
pub mod driver;
pub mod navigator;
pub mod session;
pub mod studio;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controls::{Control, ControlOutcome, Key};
pub use driver::{run_recording, RecordingPlan, RecordingReport};
pub use navigator::Navigator;
pub use session::{still_file_name, Artifact, RecordingSession, RecordingState, Still};
pub use studio::{Studio, StudioStatus, Thumbnail};
