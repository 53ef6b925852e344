use crate::extractor::extract;
use crate::sink::{EventSink, SOURCE_TAG};
use crate::splitter::records;
use crate::{NormalizedEvent, ParseError};
use tracing::{error, info, warn};

/// What to do when one record of a batch is malformed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first malformed record and return its error
    #[default]
    Abort,
    /// Log the malformed record, keep it in the report and continue
    Skip,
}

#[derive(Debug, Default)]
pub struct FeedReport {
    pub submitted: usize,
    pub skipped: Vec<ParseError>,
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Delivery of record #{index} ({message_id}) failed: {source}")]
    Delivery {
        index: usize,
        message_id: String,
        #[source]
        source: E,
    },
}

/// Splits and extracts a whole dump without delivering anything
pub fn prepare(
    dump: &[u8],
    policy: ErrorPolicy,
) -> Result<(Vec<NormalizedEvent>, Vec<ParseError>), ParseError> {
    let mut events = Vec::new();
    let mut skipped = Vec::new();

    for result in records(dump).map(|record| record.and_then(extract)) {
        match result {
            Ok(event) => events.push(event),
            Err(e) => apply_policy(policy, e, &mut skipped)?,
        }
    }

    info!("Prepared {} events, skipped {}", events.len(), skipped.len());
    Ok((events, skipped))
}

fn apply_policy(
    policy: ErrorPolicy,
    err: ParseError,
    skipped: &mut Vec<ParseError>,
) -> Result<(), ParseError> {
    match policy {
        ErrorPolicy::Abort => {
            error!("Aborting batch: {}", err);
            Err(err)
        }
        ErrorPolicy::Skip => {
            warn!("Skipping record: {}", err);
            skipped.push(err);
            Ok(())
        }
    }
}

/// Runs dumps through split, extract and submit, one record at a time in file order
pub struct Pipeline<S: EventSink> {
    sink: S,
    source_uuid: String,
    policy: ErrorPolicy,
}

impl<S: EventSink> Pipeline<S> {
    pub fn new(sink: S, source_uuid: impl Into<String>, policy: ErrorPolicy) -> Self {
        Self {
            sink,
            source_uuid: source_uuid.into(),
            policy,
        }
    }

    pub fn feed_event(&mut self, event: &NormalizedEvent) -> Result<(), FeedError<S::Error>> {
        let metadata = event.metadata();
        match serde_json::to_string(&metadata) {
            Ok(json) => info!("Record #{}: {}", event.index, json),
            Err(e) => warn!("Record #{}: metadata not printable: {}", event.index, e),
        }

        self.sink
            .submit(&event.payload, &metadata, SOURCE_TAG, &self.source_uuid)
            .map_err(|source| {
                error!("Delivery failed for record #{}: {}", event.index, source);
                FeedError::Delivery {
                    index: event.index,
                    message_id: event.message_id.clone(),
                    source,
                }
            })
    }

    /// Feeds every record of `dump`; delivery failures always abort
    pub fn feed_dump(&mut self, dump: &[u8]) -> Result<FeedReport, FeedError<S::Error>> {
        info!("Feeding dump of {} bytes", dump.len());
        let mut report = FeedReport::default();

        for result in records(dump).map(|record| record.and_then(extract)) {
            match result {
                Ok(event) => {
                    self.feed_event(&event)?;
                    report.submitted += 1;
                }
                Err(e) => apply_policy(self.policy, e, &mut report.skipped)?,
            }
        }

        info!(
            "Feed complete: {} submitted, {} skipped",
            report.submitted,
            report.skipped.len()
        );
        Ok(report)
    }
}
