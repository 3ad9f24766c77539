use crate::compilation::domain::{
    CompiledRecord, DirectoryEntry, ExternalFragment, ExternalId, InstanceId, LatestVersion,
    SoftwareSummary,
};

/// ReusePolicy decides which derived fields of a previous compilation are still valid
///
/// Each enrichable field group is keyed by the upstream identity it was
/// resolved from. A previous value is reused only when that identity is
/// unchanged; otherwise (or when no previous value exists) the field has to
/// be fetched again.
///
/// Field groups:
/// 1. external fragment - keyed by the record's external id
/// 2. parent summary - keyed by the parent external id
/// 3. similar / other-software summaries - keyed per external id
/// 4. latest version - keyed by the resolved repository URL
/// 5. directory entry - keyed by the service-provider id
pub struct ReusePolicy;

impl ReusePolicy {
    /// Previous fragment, if it was fetched for the same external id
    pub fn reusable_fragment<'a>(
        previous: Option<&'a CompiledRecord>,
        current_id: Option<&ExternalId>,
    ) -> Option<&'a ExternalFragment> {
        let current_id = current_id?;
        previous?
            .external_fragment
            .as_ref()
            .filter(|fragment| &fragment.external_id == current_id)
    }

    /// Previous parent summary, if it describes the current parent
    pub fn reusable_parent<'a>(
        previous: Option<&'a CompiledRecord>,
        current_parent_id: Option<&ExternalId>,
    ) -> Option<&'a SoftwareSummary> {
        let current_parent_id = current_parent_id?;
        previous?
            .parent_software
            .as_ref()
            .filter(|parent| &parent.external_id == current_parent_id)
    }

    /// Looks an external id up in a previously resolved summary list
    pub fn reusable_summary<'a>(
        previous: &'a [SoftwareSummary],
        external_id: &ExternalId,
    ) -> Option<&'a SoftwareSummary> {
        previous.iter().find(|s| &s.external_id == external_id)
    }

    /// Previously resolved similar software of a record
    pub fn previous_similar(previous: Option<&CompiledRecord>) -> &[SoftwareSummary] {
        previous
            .map(|p| p.similar_software.as_slice())
            .unwrap_or_default()
    }

    /// Previously resolved "other software" of one instance
    pub fn previous_instance_software(
        previous: Option<&CompiledRecord>,
        instance_id: InstanceId,
    ) -> &[SoftwareSummary] {
        previous
            .and_then(|p| p.instance(instance_id))
            .map(|i| i.other_software.as_slice())
            .unwrap_or_default()
    }

    /// Previous latest-version lookup, if it was made with the same repository URL
    ///
    /// The outer `Option` tells whether the previous result applies; the inner
    /// one is the (possibly absent) version itself. An absent version found for
    /// an unchanged URL is kept until the next full run.
    pub fn reusable_latest_version<'a>(
        previous: Option<&'a CompiledRecord>,
        current_url: &str,
    ) -> Option<Option<&'a LatestVersion>> {
        let previous = previous?;
        if previous.repository_url.as_deref() != Some(current_url) {
            return None;
        }
        Some(previous.latest_version.as_ref())
    }

    /// Previous directory entry, if it was fetched for the same service-provider id
    pub fn reusable_directory_entry(
        previous: Option<&CompiledRecord>,
        current_id: Option<u64>,
    ) -> Option<&DirectoryEntry> {
        let current_id = current_id?;
        previous?
            .directory_entry
            .as_ref()
            .filter(|entry| entry.id == current_id)
    }

    /// Repository URL used for the latest-version lookup
    ///
    /// Priority order:
    /// 1. source URL published by the knowledge base
    /// 2. source URL stored on the catalog record
    pub fn repository_url<'a>(
        fragment: Option<&'a ExternalFragment>,
        catalog_source_url: Option<&'a str>,
    ) -> Option<&'a str> {
        fragment
            .and_then(|f| f.source_url.as_deref())
            .filter(|url| !url.trim().is_empty())
            .or_else(|| catalog_source_url.filter(|url| !url.trim().is_empty()))
    }
}
