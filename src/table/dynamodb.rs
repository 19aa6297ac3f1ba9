//! DynamoDB-backed record table.

use super::RecordTable;
use crate::model::AnalysisRecord;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use std::collections::HashMap;

/// Writes records with `PutItem`, which replaces an existing item with the same key.
pub struct DynamoTable {
    client: Client,
    table_name: String,
}

impl DynamoTable {
    pub fn new(sdk_config: &SdkConfig, table_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(sdk_config),
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl RecordTable for DynamoTable {
    async fn put_record(&self, record: &AnalysisRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .with_context(|| {
                format!("PutItem failed for {} in table {}", record.filename, self.table_name)
            })?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.table_name
    }
}

/// Convert a record to its item layout.
///
/// `branch` is left out when the record has none.
pub fn record_to_item(record: &AnalysisRecord) -> HashMap<String, AttributeValue> {
    let labels = record
        .labels
        .iter()
        .map(|label| {
            AttributeValue::M(HashMap::from([
                ("Name".to_string(), AttributeValue::S(label.name.clone())),
                ("Confidence".to_string(), AttributeValue::N(label.confidence.to_string())),
            ]))
        })
        .collect();

    let mut item = HashMap::from([
        ("filename".to_string(), AttributeValue::S(record.filename.clone())),
        ("labels".to_string(), AttributeValue::L(labels)),
        ("timestamp".to_string(), AttributeValue::S(record.timestamp.clone())),
    ]);

    if let Some(branch) = &record.branch {
        item.insert("branch".to_string(), AttributeValue::S(branch.clone()));
    }

    item
}
