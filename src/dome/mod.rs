//! Dome construction and decomposition into bricks.
//!
//! Stages run in order, each handing owned solids to the next:
//! [`PlanAngles`] → [`BuildShell`] → [`Decompose`] → [`Classify`] → [`Hollow`].
//! [`BuildDome`] runs the whole chain.

mod classify;
mod config;
mod decompose;
mod hollow;
mod pipeline;
mod plan;
mod select;
mod shell;

pub use classify::{order_pieces, Classify, Piece, PieceRole};
pub use config::{BatchPolicy, DomeConfig, HollowParams};
pub use decompose::{spurious_faces, Decompose, Decomposition};
pub use hollow::{BatchOutcome, Hollow, HollowAll, PieceFailure};
pub use pipeline::{BuildDome, Dome};
pub use plan::{plan, AngularPlan, PlanAngles};
pub use select::{select_open_faces, FaceSelection};
pub use shell::BuildShell;
