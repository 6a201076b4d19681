mod payload;
mod renderer;
mod report;
pub mod style;

pub use payload::{DisplayMode, DisplayPayload};
pub use renderer::render;
pub use report::describe;
pub use style::{profile_for, DeviceIdentity, DeviceStyleProfile};

/// Host surface receiving rendered payloads.
pub trait DisplaySink: Send + Sync {
    fn show(&self, payload: &DisplayPayload);
}
