use serde::Serialize;
use serde_json::Value;

use crate::error::CoreError;

/// One virtual system on a firewall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VsysInfo {
    /// Internal name, e.g. `vsys1`.
    pub name: String,
    pub display_name: String,
    /// Panorama tags assigned to this vsys. Empty for directly connected
    /// gateways.
    pub panorama_tags: Vec<String>,
}

impl VsysInfo {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            panorama_tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.panorama_tags = tags;
        self
    }

    /// Decode a REST `Device/VirtualSystems` reply.
    ///
    /// `display-name` comes either as a plain string or as `{"text": ...}`;
    /// an entry without one falls back to its internal name.
    pub fn from_rest_listing(reply: &Value, device: &str) -> Result<Vec<Self>, CoreError> {
        let entries = match reply.pointer("/result/entry") {
            Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
            Some(single @ Value::Object(_)) => vec![single],
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(CoreError::unexpected(device, "malformed vsys listing")),
        };

        entries
            .into_iter()
            .map(|entry| {
                let name = entry
                    .get("@name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CoreError::unexpected(device, "vsys entry without @name"))?;
                let display_name = match entry.get("display-name") {
                    Some(Value::String(s)) => s.as_str(),
                    Some(Value::Object(o)) => o.get("text").and_then(Value::as_str).unwrap_or(name),
                    _ => name,
                };
                Ok(Self::new(name, display_name))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_both_display_name_shapes() {
        let reply = json!({
            "@status": "success",
            "result": { "entry": [
                { "@name": "vsys1", "display-name": "Corp" },
                { "@name": "vsys2", "display-name": { "text": "Lab" } },
                { "@name": "vsys3" }
            ]}
        });
        let vsys = VsysInfo::from_rest_listing(&reply, "fw").unwrap();
        let names: Vec<_> = vsys.iter().map(|v| v.display_name.as_str()).collect();
        assert_eq!(names, ["Corp", "Lab", "vsys3"]);
        assert!(vsys[0].panorama_tags.is_empty());
    }

    #[test]
    fn single_entry_object() {
        let reply = json!({ "result": { "entry": { "@name": "vsys1", "display-name": "vsys1" } } });
        assert_eq!(VsysInfo::from_rest_listing(&reply, "fw").unwrap().len(), 1);
    }

    #[test]
    fn entry_without_name_is_rejected() {
        let reply = json!({ "result": { "entry": [{ "display-name": "x" }] } });
        assert!(VsysInfo::from_rest_listing(&reply, "fw").is_err());
    }
}
