use crate::compilation::domain::{
    CompiledRecord, ExternalId, ReferenceKey, SimilaritySet, SoftwareReference, SoftwareSummary,
};
use std::collections::{HashMap, HashSet};

/// Lookup tables over a compiled record set
struct ClusterIndex<'a> {
    /// Several catalog records may carry the same external id
    by_external_id: HashMap<&'a ExternalId, Vec<&'a CompiledRecord>>,
    by_name: HashMap<&'a str, &'a CompiledRecord>,
    /// Records listing a given external id as similar, in stored order
    listed_by: HashMap<&'a ExternalId, Vec<&'a CompiledRecord>>,
}

impl<'a> ClusterIndex<'a> {
    fn new(records: &'a [CompiledRecord]) -> Self {
        let mut by_external_id: HashMap<&ExternalId, Vec<&CompiledRecord>> = HashMap::new();
        let mut by_name = HashMap::new();
        let mut listed_by: HashMap<&ExternalId, Vec<&CompiledRecord>> = HashMap::new();

        for record in records {
            if let Some(external_id) = record.external_id() {
                by_external_id.entry(external_id).or_default().push(record);
            }
            by_name.entry(record.name()).or_insert(record);
            for similar in &record.similar_software {
                let listers = listed_by.entry(&similar.external_id).or_default();
                if !listers.iter().any(|r| r.id() == record.id()) {
                    listers.push(record);
                }
            }
        }

        Self {
            by_external_id,
            by_name,
            listed_by,
        }
    }

    /// Maps a similar-software summary back to every catalog entry carrying its id
    fn resolve(&self, summary: &SoftwareSummary) -> Vec<SoftwareReference> {
        match self.by_external_id.get(&summary.external_id) {
            Some(records) => records
                .iter()
                .map(|record| SoftwareReference::catalog(record))
                .collect(),
            None => vec![SoftwareReference::External(summary.clone())],
        }
    }

    fn listers(&self, external_id: &ExternalId) -> impl Iterator<Item = &'a CompiledRecord> + '_ {
        self.listed_by
            .get(external_id)
            .into_iter()
            .flat_map(|records| records.iter().copied())
    }

    /// Undirected neighbours: declared similar list first, then reverse references
    fn neighbours(&self, reference: &SoftwareReference) -> Vec<SoftwareReference> {
        match reference {
            SoftwareReference::Catalog { name, .. } => {
                let Some(record) = self.by_name.get(name.as_str()) else {
                    return Vec::new();
                };
                let mut neighbours: Vec<SoftwareReference> = record
                    .similar_software
                    .iter()
                    .flat_map(|summary| self.resolve(summary))
                    .collect();
                if let Some(external_id) = record.external_id() {
                    neighbours.extend(
                        self.listers(external_id)
                            .filter(|other| other.name() != record.name())
                            .map(SoftwareReference::catalog),
                    );
                }
                neighbours
            }
            SoftwareReference::External(summary) => self
                .listers(&summary.external_id)
                .map(SoftwareReference::catalog)
                .collect(),
        }
    }
}

/// SimilarityClustering partitions software into "similar software" clusters
///
/// Similarity edges are declared on catalog records and point at external
/// ids; they are treated as undirected. Each cluster is a connected
/// component mixing catalog entries and external-only software.
///
/// This is a pure algorithm with no I/O operations.
pub struct SimilarityClustering;

impl SimilarityClustering {
    /// Partitions the compiled set into disjoint clusters
    ///
    /// Every record ends up in exactly one cluster (records without any
    /// similarity edge form a singleton). Output order follows the stored
    /// record order, so it is reproducible for a fixed input.
    pub fn partition(records: &[CompiledRecord]) -> Vec<SimilaritySet> {
        let index = ClusterIndex::new(records);
        let mut visited: HashSet<ReferenceKey> = HashSet::new();
        let mut clusters = Vec::new();

        for record in records {
            let start = SoftwareReference::catalog(record);
            if visited.contains(&start.key()) {
                continue;
            }
            let (members, still_visited) = Self::collect_cluster(start, &index, visited);
            visited = still_visited;
            clusters.push(SimilaritySet::new(members));
        }

        clusters
    }

    /// The cluster containing the named catalog entry, minus that entry
    pub fn similar_to(records: &[CompiledRecord], software_name: &str) -> Vec<SoftwareReference> {
        Self::partition(records)
            .into_iter()
            .find(|cluster| cluster.contains_catalog_entry(software_name))
            .map(|cluster| cluster.without(software_name))
            .unwrap_or_default()
    }

    /// Depth-first traversal from `start`
    ///
    /// Takes ownership of the visited set and hands it back, so callers see
    /// exactly which references were consumed by this cluster.
    fn collect_cluster(
        start: SoftwareReference,
        index: &ClusterIndex<'_>,
        mut visited: HashSet<ReferenceKey>,
    ) -> (Vec<SoftwareReference>, HashSet<ReferenceKey>) {
        let mut members = Vec::new();
        let mut stack = vec![start];

        while let Some(reference) = stack.pop() {
            if !visited.insert(reference.key()) {
                continue;
            }
            let neighbours = index.neighbours(&reference);
            members.push(reference);

            // Reversed so the first declared neighbour is explored first
            for neighbour in neighbours.into_iter().rev() {
                if !visited.contains(&neighbour.key()) {
                    stack.push(neighbour);
                }
            }
        }

        (members, visited)
    }
}
