// Library surface for the game binary, headless runs and integration tests.
pub mod app;
pub mod app_dirs;
pub mod bands;
pub mod config;
pub mod error;
pub mod history;
pub mod runtime;
pub mod scorer;
pub mod session;
pub mod smoothing;
pub mod source;
pub mod timer;
pub mod ui;
pub mod util;

pub use bands::{Band, BandSample, Bands};
pub use error::NeuroError;
pub use session::{Analysis, Session};
