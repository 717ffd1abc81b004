mod recording;
mod recording_catalog;

pub use {
    recording::{Recording, RecordingId},
    recording_catalog::RecordingCatalog,
};
