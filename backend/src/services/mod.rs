//! Business logic services for the AgriGoo farm pipeline

pub mod data_processing;
pub mod realtime;
mod scan;

pub use data_processing::{
    BatchOutcome, DataProcessingService, FarmInitialized, FarmStatus, FarmStopped, FarmStream,
    ImageSubmission, IngestReceipt, ScanAccepted, ThresholdsUpdated, TreatmentAccepted,
};
pub use realtime::{
    events, farm_room, region_room, ClientEvent, NotificationSink, RealtimeHub, RoomMessage,
    Subscription,
};
