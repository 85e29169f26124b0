//! Asynchronous CSV reader with batch interface
//!
//! Reads operation records from any `futures::io::AsyncRead` in batches,
//! for the concurrent replay pipeline.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` operations
    ///
    /// Rows that fail to parse or convert are logged and skipped.
    /// Returns an empty vector once the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => {
                        self.skipped += 1;
                        tracing::warn!("Record conversion error: {}", e);
                    }
                },
                Some(Err(e)) => {
                    self.skipped += 1;
                    tracing::warn!("CSV parse error: {}", e);
                }
                None => break,
            }
        }

        batch
    }

    /// Rows skipped so far because they could not be parsed
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_async_reader_multiple_batches() {
        let csv_content = "type,account,to,amount,user,name\n\
            deposit,A,,1,,\n\
            deposit,A,,2,,\n\
            deposit,A,,3,,\n";
        let mut reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let first = reader.read_batch(2).await;
        assert_eq!(first.len(), 2);

        let second = reader.read_batch(2).await;
        assert_eq!(
            second,
            vec![Operation::Deposit {
                account_number: "A".to_string(),
                amount: 3
            }]
        );

        assert!(reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut reader = AsyncReader::new(Cursor::new(
            "type,account,to,amount,user,name\n".as_bytes(),
        ));
        assert!(reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_records() {
        let csv_content = "type,account,to,amount,user,name\n\
            refund,A,,1,,\n\
            withdraw,A,,abc,,\n\
            transfer,A,B,4,,\n";
        let mut reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = reader.read_batch(10).await;

        assert_eq!(batch.len(), 1);
        assert_eq!(reader.skipped(), 2);
    }
}
