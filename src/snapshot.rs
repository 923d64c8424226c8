use serde::{Deserialize, Serialize};

/// What a tab looked like the moment it finished loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Document title
    pub title: String,

    /// Rendered text of the page body
    pub text: String,

    /// Fully resolved location of the page
    pub url: String,
}

impl PageSnapshot {
    /// Create a new page snapshot
    pub fn new(title: impl Into<String>, text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            url: url.into(),
        }
    }

    /// Decode a value returned by the page snapshot content script
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Encode as the message object posted on the bus
    pub fn to_message(&self) -> serde_json::Value {
        serde_json::json!({
            "title": self.title,
            "text": self.text,
            "url": self.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_shape() {
        let snapshot = PageSnapshot::new("A", "hello", "https://a");
        assert_eq!(
            snapshot.to_message(),
            json!({"title": "A", "text": "hello", "url": "https://a"})
        );
    }

    #[test]
    fn test_from_script_result() {
        let value = json!({"title": "", "text": "Line 1\nLine 2", "url": "https://a/b?c"});
        let snapshot = PageSnapshot::from_value(value).unwrap();
        assert_eq!(snapshot.title, "");
        assert_eq!(snapshot.text, "Line 1\nLine 2");
        assert_eq!(snapshot.url, "https://a/b?c");

        // Script returned null, e.g. the page replaced our return value
        assert!(PageSnapshot::from_value(serde_json::Value::Null).is_err());
        assert!(PageSnapshot::from_value(json!({"title": "A", "url": "https://a"})).is_err());
    }
}
