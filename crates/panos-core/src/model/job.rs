use panos_api::XmlNode;
use serde::Serialize;

/// A job from `show jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: String,
    pub status: String,
    pub result: String,
    pub progress: String,
    pub enqueued: String,
    pub finished: String,
    pub description: String,
}

impl JobInfo {
    fn from_node(job: &XmlNode) -> Self {
        let field = |tag: &str| job.text_at(tag).unwrap_or_default().trim().to_owned();
        Self {
            id: field("id"),
            job_type: field("type"),
            status: field("status"),
            result: field("result"),
            progress: field("progress"),
            enqueued: field("tenq"),
            finished: field("tfin"),
            description: field("description"),
        }
    }

    /// Every `result/job` entry of a `show jobs` reply.
    pub fn list_from_reply(reply: &XmlNode) -> Vec<Self> {
        reply
            .find_all("result/job")
            .into_iter()
            .map(Self::from_node)
            .collect()
    }

    pub fn is_finished(&self) -> bool {
        self.status == "FIN"
    }
}
