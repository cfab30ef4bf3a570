use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtopicSummary {
  pub id: i64,
  #[serde(alias = "name")]
  pub title: String,
}

/// A unit: ordered sub-units plus its gating test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
  pub id: i64,
  #[serde(alias = "name")]
  pub title: String,
  #[serde(default)]
  pub subtopics: Vec<SubtopicSummary>,
}

/// Answer of the `next-subtopic` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSubtopic {
  #[serde(default)]
  pub next_subtopic_id: Option<i64>,
  pub topic_id: i64,
}
