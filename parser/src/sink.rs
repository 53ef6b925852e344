use crate::EventMetadata;

/// Source tag this feeder announces to the platform
pub const SOURCE_TAG: &str = "ail_feeder_matrix";

/// Outbound collaborator that receives every normalized event.
///
/// Implementations own their connection; the pipeline only hands them
/// fully built metadata (id included) and the raw payload.
pub trait EventSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn submit(
        &mut self,
        payload: &[u8],
        metadata: &EventMetadata,
        source: &str,
        source_uuid: &str,
    ) -> Result<(), Self::Error>;
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    type Error = S::Error;

    fn submit(
        &mut self,
        payload: &[u8],
        metadata: &EventMetadata,
        source: &str,
        source_uuid: &str,
    ) -> Result<(), Self::Error> {
        (**self).submit(payload, metadata, source, source_uuid)
    }
}
