use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Config pointing at `base_url` with no stored token
#[allow(dead_code)]
pub fn config_for_server(base_url: &str) -> String {
    format!("api:\n  base_url: {}\n  timeout_ms: 5000\n", base_url)
}

/// History body in the backend's wire format
#[allow(dead_code)]
pub fn history_body() -> serde_json::Value {
    serde_json::json!({
        "messages": [
            {
                "id": 1,
                "session_id": "interview",
                "user_message": "How should I prepare for a system design interview?",
                "ai_response": "Start with the fundamentals.",
                "created_at": "2025-01-01T10:00:00Z"
            },
            {
                "id": 2,
                "session_id": "resume",
                "user_message": "Can you review my resume?",
                "ai_response": "Sure, paste it here.",
                "created_at": "2025-01-02T09:00:00Z"
            },
            {
                "id": 3,
                "session_id": "interview",
                "user_message": "What about caching?",
                "ai_response": "Think about invalidation first.",
                "created_at": "2025-01-03T08:00:00Z"
            }
        ]
    })
}
