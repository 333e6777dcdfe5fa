pub mod fakes;

pub mod http;

#[allow(unused_imports)]
pub use fakes::{DeliveryCall, FakeStore, RecordingDeliverer, reading_at, utc};
