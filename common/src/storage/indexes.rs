use serde_json::{json, Value};

/// Analyzer, mappings and bulk-load settings for the corpus index.
///
/// The index is created with no replicas, a slow refresh and async translog so
/// that bulk loading is cheap; [`serving_settings`] restores steady-state values.
pub fn corpus_index_schema() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0,
            "refresh_interval": "30s",
            "translog": {
                "durability": "async"
            },
            "analysis": {
                "char_filter": {
                    "remove_standalone_slash": {
                        "type": "pattern_replace",
                        "pattern": "(^/|/$)",
                        "replacement": ""
                    }
                },
                "tokenizer": {
                    "custom_slash_tokenizer": {
                        "type": "pattern",
                        "pattern": "(?<!\\w)/|/(?!\\w)",
                        "group": -1
                    }
                },
                "analyzer": {
                    "custom_baseline_analyzer": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", "asciifolding", "stop"]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "docid": { "type": "keyword" },
                "title": {
                    "type": "text",
                    "analyzer": "custom_baseline_analyzer"
                },
                "body": {
                    "type": "text",
                    "analyzer": "custom_baseline_analyzer"
                }
            }
        }
    })
}

/// Settings applied once bulk loading is over.
pub fn serving_settings() -> Value {
    json!({
        "index": {
            "refresh_interval": "1s",
            "number_of_replicas": 1
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_and_serving_settings_differ() {
        let schema = corpus_index_schema();
        assert_eq!(schema["settings"]["number_of_replicas"], 0);
        assert_eq!(schema["settings"]["refresh_interval"], "30s");
        assert_eq!(schema["mappings"]["properties"]["docid"]["type"], "keyword");

        let serving = serving_settings();
        assert_eq!(serving["index"]["number_of_replicas"], 1);
        assert_eq!(serving["index"]["refresh_interval"], "1s");
    }
}
