mod animation;
mod entity;
mod progress;
mod surfaces;

pub use animation::AnimationPresenter;
pub use entity::{EntityPresenter, SurfaceOutcome};
pub use progress::ProgressPresenter;
pub use surfaces::{
    BarAction, BarEvent, EditorSurface, HeadlessPlaybackBar, HeadlessProgressBar, HeadlessSurface, LogProgressBar,
    PlaybackBar, ProgressBar, SurfaceEvent, SurfaceTable,
};
