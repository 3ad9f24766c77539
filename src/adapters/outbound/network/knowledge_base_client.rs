use super::http_client::JsonHttpClient;
use crate::compilation::domain::{ExternalFragment, ExternalId, SourceKind};
use crate::ports::outbound::SourceGateway;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

pub const DEFAULT_KNOWLEDGE_BASE_URL: &str = "https://www.wikidata.org";

/// Maximum number of ids per label request (API limit)
const MAX_IDS_PER_LABEL_REQUEST: usize = 50;

const PROP_INSTANCE_OF: &str = "P31";
const PROP_LOGO: &str = "P154";
const PROP_DEVELOPER: &str = "P178";
const PROP_LICENSE: &str = "P275";
const PROP_WEBSITE: &str = "P856";
const PROP_SOURCE_REPOSITORY: &str = "P1324";
const PROP_DOCUMENTATION: &str = "P2078";

/// Classes marking an entity as free/open-source software
const LIBRE_SOFTWARE_CLASSES: [&str; 2] = ["Q341", "Q1130645"];

#[derive(Debug, Deserialize)]
struct EntityDocument {
    #[serde(default)]
    entities: HashMap<String, Entity>,
}

#[derive(Debug, Default, Deserialize)]
struct Entity {
    #[serde(default)]
    labels: HashMap<String, LocalizedText>,
    #[serde(default)]
    descriptions: HashMap<String, LocalizedText>,
    #[serde(default)]
    claims: HashMap<String, Vec<Claim>>,
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    value: String,
}

#[derive(Debug, Deserialize)]
struct Claim {
    mainsnak: Snak,
    #[serde(default)]
    rank: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snak {
    #[serde(default)]
    datavalue: Option<DataValue>,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    value: serde_json::Value,
}

impl Entity {
    fn claim_values(&self, property: &str) -> impl Iterator<Item = &serde_json::Value> {
        self.claims
            .get(property)
            .into_iter()
            .flatten()
            .filter(|claim| claim.rank.as_deref() != Some("deprecated"))
            .filter_map(|claim| claim.mainsnak.datavalue.as_ref())
            .map(|datavalue| &datavalue.value)
    }

    fn first_string(&self, property: &str) -> Option<String> {
        self.claim_values(property)
            .find_map(|value| value.as_str())
            .map(str::to_string)
    }

    fn entity_ids(&self, property: &str) -> Vec<String> {
        self.claim_values(property)
            .filter_map(|value| value.get("id").and_then(|id| id.as_str()))
            .map(str::to_string)
            .collect()
    }

    fn localized(texts: &HashMap<String, LocalizedText>, languages: &[String]) -> Option<String> {
        languages
            .iter()
            .find_map(|language| texts.get(language))
            .or_else(|| texts.values().next())
            .map(|text| text.value.clone())
    }
}

/// KnowledgeBaseClient adapter for a Wikidata-style structured-data knowledge base
///
/// Resolves an entity id to an external fragment using the entity JSON
/// export. Developers and licenses are entity references; their labels
/// are resolved with one additional request per fragment.
pub struct KnowledgeBaseClient {
    http: JsonHttpClient,
    base_url: String,
    languages: Vec<String>,
}

impl KnowledgeBaseClient {
    /// Creates a client for the knowledge base at `base_url`
    ///
    /// # Arguments
    /// * `languages` - Preferred label languages, most preferred first
    pub fn new(http: JsonHttpClient, base_url: &str, languages: Vec<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            languages,
        }
    }

    async fn fetch_entity(&self, external_id: &ExternalId) -> Result<Option<Entity>> {
        JsonHttpClient::validate_url_component(external_id.as_str(), "Entity id")?;
        let url = format!(
            "{}/wiki/Special:EntityData/{}.json",
            self.base_url,
            urlencoding::encode(external_id.as_str())
        );

        let Some(mut document) = self.http.get_json::<EntityDocument>(&url).await? else {
            return Ok(None);
        };

        // Redirected entities come back under their new id
        let entity = match document.entities.remove(external_id.as_str()) {
            Some(entity) => Some(entity),
            None => document.entities.into_values().next(),
        };
        Ok(entity)
    }

    /// Labels of referenced entities; ids without a label map to themselves
    async fn fetch_labels(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        let mut labels = HashMap::new();

        for chunk in ids.chunks(MAX_IDS_PER_LABEL_REQUEST) {
            let url = format!(
                "{}/w/api.php?action=wbgetentities&format=json&props=labels&ids={}&languages={}",
                self.base_url,
                urlencoding::encode(&chunk.join("|")),
                urlencoding::encode(&self.languages.join("|"))
            );
            if let Some(document) = self.http.get_json::<EntityDocument>(&url).await? {
                for (id, entity) in document.entities {
                    if let Some(label) = Entity::localized(&entity.labels, &self.languages) {
                        labels.insert(id, label);
                    }
                }
            }
        }

        Ok(labels)
    }

    fn build_fragment(
        &self,
        external_id: &ExternalId,
        entity: &Entity,
        labels: &HashMap<String, String>,
    ) -> ExternalFragment {
        let label_of = |id: &String| labels.get(id).cloned().unwrap_or_else(|| id.clone());

        let is_libre = entity
            .entity_ids(PROP_INSTANCE_OF)
            .iter()
            .any(|class| LIBRE_SOFTWARE_CLASSES.contains(&class.as_str()));

        ExternalFragment {
            source: SourceKind::KnowledgeBase,
            external_id: external_id.clone(),
            label: Entity::localized(&entity.labels, &self.languages)
                .unwrap_or_else(|| external_id.to_string()),
            description: Entity::localized(&entity.descriptions, &self.languages)
                .unwrap_or_default(),
            website_url: entity.first_string(PROP_WEBSITE),
            source_url: entity.first_string(PROP_SOURCE_REPOSITORY),
            documentation_url: entity.first_string(PROP_DOCUMENTATION),
            developers: entity
                .entity_ids(PROP_DEVELOPER)
                .iter()
                .map(label_of)
                .collect(),
            license: entity.entity_ids(PROP_LICENSE).first().map(label_of),
            logo_url: entity.first_string(PROP_LOGO).map(|file| {
                format!(
                    "https://commons.wikimedia.org/wiki/Special:FilePath/{}",
                    urlencoding::encode(&file)
                )
            }),
            is_libre,
        }
    }
}

#[async_trait]
impl SourceGateway for KnowledgeBaseClient {
    type Key = ExternalId;
    type Data = ExternalFragment;

    async fn fetch(&self, external_id: &ExternalId) -> Result<Option<ExternalFragment>> {
        let Some(entity) = self.fetch_entity(external_id).await? else {
            return Ok(None);
        };

        let mut referenced = entity.entity_ids(PROP_DEVELOPER);
        referenced.extend(entity.entity_ids(PROP_LICENSE));
        referenced.sort();
        referenced.dedup();

        let labels = if referenced.is_empty() {
            HashMap::new()
        } else {
            self.fetch_labels(&referenced).await.unwrap_or_else(|e| {
                tracing::warn!(%external_id, error = %e, "label lookup failed, keeping raw ids");
                HashMap::new()
            })
        };

        Ok(Some(self.build_fragment(external_id, &entity, &labels)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::network::http_client::DEFAULT_TIMEOUT;

    const ENTITY_JSON: &str = r#"{
        "entities": {
            "Q171477": {
                "labels": {
                    "en": {"language": "en", "value": "LibreOffice"},
                    "fr": {"language": "fr", "value": "LibreOffice (fr)"}
                },
                "descriptions": {
                    "en": {"language": "en", "value": "office suite"}
                },
                "claims": {
                    "P31": [
                        {"mainsnak": {"datavalue": {"value": {"id": "Q341"}, "type": "wikibase-entityid"}}, "rank": "normal"}
                    ],
                    "P856": [
                        {"mainsnak": {"datavalue": {"value": "https://old.example", "type": "string"}}, "rank": "deprecated"},
                        {"mainsnak": {"datavalue": {"value": "https://www.libreoffice.org", "type": "string"}}, "rank": "preferred"}
                    ],
                    "P1324": [
                        {"mainsnak": {"datavalue": {"value": "https://github.com/LibreOffice/core", "type": "string"}}}
                    ],
                    "P178": [
                        {"mainsnak": {"datavalue": {"value": {"id": "Q1"}, "type": "wikibase-entityid"}}},
                        {"mainsnak": {"datavalue": {"value": {"id": "Q2"}, "type": "wikibase-entityid"}}}
                    ],
                    "P275": [
                        {"mainsnak": {"datavalue": {"value": {"id": "Q308915"}, "type": "wikibase-entityid"}}}
                    ],
                    "P154": [
                        {"mainsnak": {"datavalue": {"value": "LibreOffice logo.svg", "type": "string"}}}
                    ],
                    "P2078": [
                        {"mainsnak": {"snaktype": "novalue"}}
                    ]
                }
            }
        }
    }"#;

    fn client(languages: &[&str]) -> KnowledgeBaseClient {
        KnowledgeBaseClient::new(
            JsonHttpClient::new(DEFAULT_TIMEOUT).unwrap(),
            DEFAULT_KNOWLEDGE_BASE_URL,
            languages.iter().map(|l| l.to_string()).collect(),
        )
    }

    fn entity() -> Entity {
        let mut document: EntityDocument = serde_json::from_str(ENTITY_JSON).unwrap();
        document.entities.remove("Q171477").unwrap()
    }

    #[test]
    fn test_build_fragment_reads_claims() {
        let external_id = ExternalId::new("Q171477".to_string()).unwrap();
        let mut labels = HashMap::new();
        labels.insert("Q1".to_string(), "The Document Foundation".to_string());
        labels.insert("Q308915".to_string(), "MPL-2.0".to_string());

        let fragment = client(&["en"]).build_fragment(&external_id, &entity(), &labels);

        assert_eq!(fragment.label, "LibreOffice");
        assert_eq!(fragment.description, "office suite");
        assert_eq!(fragment.website_url.as_deref(), Some("https://www.libreoffice.org"));
        assert_eq!(
            fragment.source_url.as_deref(),
            Some("https://github.com/LibreOffice/core")
        );
        assert_eq!(fragment.documentation_url, None);
        assert_eq!(fragment.developers, vec!["The Document Foundation", "Q2"]);
        assert_eq!(fragment.license.as_deref(), Some("MPL-2.0"));
        assert_eq!(
            fragment.logo_url.as_deref(),
            Some("https://commons.wikimedia.org/wiki/Special:FilePath/LibreOffice%20logo.svg")
        );
        assert!(fragment.is_libre);
        assert_eq!(fragment.summary().external_id, external_id);
    }

    #[test]
    fn test_label_language_preference() {
        let external_id = ExternalId::new("Q171477".to_string()).unwrap();
        let fragment = client(&["fr", "en"]).build_fragment(&external_id, &entity(), &HashMap::new());

        assert_eq!(fragment.label, "LibreOffice (fr)");
        // No French description: next preferred language is used
        assert_eq!(fragment.description, "office suite");
    }

    #[test]
    fn test_entity_without_claims() {
        let external_id = ExternalId::new("Q5".to_string()).unwrap();
        let fragment = client(&["en"]).build_fragment(&external_id, &Entity::default(), &HashMap::new());

        assert_eq!(fragment.label, "Q5");
        assert!(fragment.developers.is_empty());
        assert!(!fragment.is_libre);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = KnowledgeBaseClient::new(
            JsonHttpClient::new(DEFAULT_TIMEOUT).unwrap(),
            "https://kb.example/",
            vec![],
        );
        assert_eq!(client.base_url, "https://kb.example");
    }
}
