//! Enriched software view served to read paths
//!
//! Clusters are recomputed from the compiled set on every build and never
//! persisted.

use crate::compilation::domain::{CompiledRecord, SoftwareReference};
use crate::compilation::services::SimilarityClustering;
use serde::Serialize;
use std::collections::HashMap;

/// A compiled record together with the software similar to it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSoftware {
    pub compiled: CompiledRecord,
    /// The record's similarity cluster, without the record itself
    pub similar: Vec<SoftwareReference>,
}

impl EnrichedSoftware {
    pub fn name(&self) -> &str {
        self.compiled.name()
    }
}

/// Builder for constructing EnrichedSoftware views from a compiled set
pub struct EnrichedSoftwareBuilder;

impl EnrichedSoftwareBuilder {
    /// Builds one view per compiled record, in stored order
    pub fn build(records: &[CompiledRecord]) -> Vec<EnrichedSoftware> {
        let clusters = SimilarityClustering::partition(records);

        let mut cluster_of: HashMap<&str, usize> = HashMap::new();
        for (index, cluster) in clusters.iter().enumerate() {
            for member in cluster.members() {
                if let SoftwareReference::Catalog { name, .. } = member {
                    cluster_of.insert(name.as_str(), index);
                }
            }
        }

        records
            .iter()
            .map(|record| EnrichedSoftware {
                compiled: record.clone(),
                similar: cluster_of
                    .get(record.name())
                    .map(|&index| clusters[index].without(record.name()))
                    .unwrap_or_default(),
            })
            .collect()
    }

    /// Builds the view of a single record, looked up by name
    pub fn build_one(records: &[CompiledRecord], software_name: &str) -> Option<EnrichedSoftware> {
        let record = records.iter().find(|r| r.name() == software_name)?;
        Some(EnrichedSoftware {
            compiled: record.clone(),
            similar: SimilarityClustering::similar_to(records, software_name),
        })
    }
}
